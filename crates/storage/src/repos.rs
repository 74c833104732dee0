use sqlx::{Executor, Postgres};

use crate::models::*;

// Columns are cast explicitly so the decoded Rust types do not depend on
// whether the scraper created them as integer, numeric or float columns.

// ─── Fetch Rounds ───────────────────────────────────────────────────────────

/// Get the most recent fetch round, if the scraper has recorded any.
pub async fn get_latest_fetch<'e, E>(executor: E) -> Result<Option<FetchRound>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, FetchRound>(
        r#"
        SELECT id::bigint AS id, time::timestamptz AS time, height::bigint AS height
        FROM pool_fetches
        ORDER BY time DESC
        LIMIT 1
        "#,
    )
    .fetch_optional(executor)
    .await
}

// ─── Pool Stats ─────────────────────────────────────────────────────────────

/// Get the stats of every enabled pool scraped in `fetch_id`.
pub async fn get_fetch_pools<'e, E>(
    executor: E,
    fetch_id: i64,
) -> Result<Vec<PoolRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, PoolRecord>(
        r#"
        SELECT p.id::bigint AS id, p.name, p.url, p.blocks_url, p.location,
               s.height::bigint AS height,
               s.blocks_found::bigint AS blocks_found,
               s.hashrate::float8 AS hashrate,
               s.effort::float8 AS effort,
               s.miners::bigint AS miners,
               s.miners_paid::bigint AS miners_paid,
               s.payments::bigint AS payments,
               s.fee::float8 AS fee,
               s.threshold::float8 AS threshold,
               s.error,
               a.hashrate_1d::float8 AS hr1,
               a.hashrate_7d::float8 AS hr7
        FROM pools p
        JOIN pool_stats s ON s.pool = p.id
        JOIN pool_agg_stats a ON a.pool = p.id
        WHERE s.pool_fetch = $1 AND p.enabled
        ORDER BY p.id
        "#,
    )
    .bind(fetch_id)
    .fetch_all(executor)
    .await
}

// ─── Hashrate Chart ─────────────────────────────────────────────────────────

/// Get the hourly hashrate samples of enabled pools, oldest hour first.
pub async fn get_hashrate_chart<'e, E>(executor: E) -> Result<Vec<HourlySample>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, HourlySample>(
        r#"
        SELECT c.pool::bigint AS pool, c.hour::timestamptz AS hour, c.hashrate::float8 AS hashrate
        FROM pool_hashrate_chart c
        JOIN pools p ON p.id = c.pool
        WHERE p.enabled
        ORDER BY c.hour, c.pool
        "#,
    )
    .fetch_all(executor)
    .await
}

// ─── Blocks ─────────────────────────────────────────────────────────────────

/// Get every stored block whose hash is in `hashes`, with its finder's name.
pub async fn get_blocks_by_hash<'e, E>(
    executor: E,
    hashes: &[String],
) -> Result<Vec<BlockRecord>, sqlx::Error>
where
    E: Executor<'e, Database = Postgres>,
{
    sqlx::query_as::<_, BlockRecord>(
        r#"
        SELECT b.hash, p.id::bigint AS pool, p.name, p.blocks_url, b.height::bigint AS height
        FROM pool_blocks b
        JOIN pools p ON p.id = b.pool
        WHERE b.hash = ANY($1)
        ORDER BY b.hash, p.id
        "#,
    )
    .bind(hashes)
    .fetch_all(executor)
    .await
}
