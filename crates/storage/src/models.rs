use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// ─── FetchRound ─────────────────────────────────────────────────────────────

/// One scrape of every monitored pool, taken against a single local node height.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FetchRound {
    pub id: i64,
    pub time: DateTime<Utc>,
    /// Chain height of the trusted local node when the round was taken.
    pub height: i64,
}

// ─── PoolRecord ─────────────────────────────────────────────────────────────

/// Stats an enabled pool reported in one fetch round, joined with its
/// rolling aggregates.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PoolRecord {
    #[serde(skip_serializing)]
    pub id: i64,
    pub name: String,
    pub url: String,
    pub blocks_url: Option<String>,
    pub location: Option<String>,
    pub height: Option<i64>,
    pub blocks_found: Option<i64>,
    pub hashrate: Option<f64>,
    pub effort: Option<f64>,
    pub miners: Option<i64>,
    pub miners_paid: Option<i64>,
    pub payments: Option<i64>,
    pub fee: Option<f64>,
    pub threshold: Option<f64>,
    pub error: Option<String>,
    pub hr1: Option<f64>,
    pub hr7: Option<f64>,
}

// ─── HourlySample ───────────────────────────────────────────────────────────

/// A pool's hashrate for one hour bucket. `hashrate` is `None` when the pool
/// was scraped but reported nothing usable for that hour.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct HourlySample {
    pub pool: i64,
    pub hour: DateTime<Utc>,
    pub hashrate: Option<f64>,
}

// ─── BlockRecord ────────────────────────────────────────────────────────────

/// A block a pool claims to have found, joined with the pool's display fields.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct BlockRecord {
    pub hash: String,
    pub pool: i64,
    pub name: String,
    pub blocks_url: Option<String>,
    pub height: i64,
}

// ─── Snapshot ───────────────────────────────────────────────────────────────

/// Everything the stats endpoint needs, read inside one transaction.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub round: FetchRound,
    /// Pools of `round`, in the order the store returned them.
    pub pools: Vec<PoolRecord>,
    /// Hourly samples in ascending hour order.
    pub samples: Vec<HourlySample>,
}
