pub mod models;
pub mod repos;

use async_trait::async_trait;
use poolwatch_core::AppError;
use sqlx::postgres::{PgConnectOptions, PgConnection};
use sqlx::{Connection, Postgres, Transaction};
use std::str::FromStr;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::models::{BlockRecord, Snapshot};

/// Read access to the snapshot store written by the pool scraper.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Read the latest fetch round with its pools and the hourly chart samples.
    /// `None` when no round has been recorded yet.
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>, AppError>;

    /// Read every block record matching one of `hashes`.
    async fn blocks_by_hash(&self, hashes: &[String]) -> Result<Vec<BlockRecord>, AppError>;
}

/// PostgreSQL-backed snapshot store.
///
/// Connections are opened on first use and parked after each request for
/// reuse. A parked connection is pinged before it is handed out again. Every
/// connect is a single attempt; when one fails, exactly one more is made
/// before the request fails with [`AppError::StoreUnavailable`].
pub struct PgStore {
    options: PgConnectOptions,
    connect_timeout: Duration,
    max_idle: usize,
    idle: Mutex<Vec<PgConnection>>,
}

impl PgStore {
    /// Build a store handle without connecting.
    pub fn connect_lazy(
        database_url: &str,
        max_idle: usize,
        connect_timeout: Duration,
    ) -> Result<Self, AppError> {
        let options = PgConnectOptions::from_str(database_url)
            .map_err(|e| AppError::Config(e.to_string()))?;
        Ok(Self {
            options,
            connect_timeout,
            max_idle,
            idle: Mutex::new(Vec::new()),
        })
    }

    /// One connection attempt, bounded by `connect_timeout`.
    async fn connect(&self) -> Result<PgConnection, String> {
        let attempt = PgConnection::connect_with(&self.options);
        match tokio::time::timeout(self.connect_timeout, attempt).await {
            Ok(result) => result.map_err(|e| e.to_string()),
            Err(_) => Err(format!("connect timed out after {:?}", self.connect_timeout)),
        }
    }

    /// Reuse a parked connection that still answers a ping, or open a new one.
    async fn checkout(&self) -> Result<PgConnection, AppError> {
        let parked = self.idle.lock().await.pop();

        if let Some(mut conn) = parked {
            match conn.ping().await {
                Ok(()) => return Ok(conn),
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        "Parked snapshot store connection is dead, reconnecting"
                    );
                    return self.connect().await.map_err(AppError::StoreUnavailable);
                }
            }
        }

        match self.connect().await {
            Ok(conn) => Ok(conn),
            Err(e) => {
                tracing::warn!(error = %e, "Snapshot store connection failed, reconnecting");
                self.connect().await.map_err(AppError::StoreUnavailable)
            }
        }
    }

    /// Park a connection whose request completed cleanly.
    async fn checkin(&self, conn: PgConnection) {
        let mut idle = self.idle.lock().await;
        if idle.len() < self.max_idle {
            idle.push(conn);
        }
    }
}

/// Open a read-only transaction on `conn`.
async fn begin_read(conn: &mut PgConnection) -> Result<Transaction<'_, Postgres>, AppError> {
    let mut tx = conn.begin().await.map_err(db_err)?;
    sqlx::query("SET TRANSACTION READ ONLY")
        .execute(&mut *tx)
        .await
        .map_err(db_err)?;
    Ok(tx)
}

#[async_trait]
impl SnapshotStore for PgStore {
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>, AppError> {
        let mut conn = self.checkout().await?;
        let mut tx = begin_read(&mut conn).await?;

        let snapshot = match repos::get_latest_fetch(&mut *tx).await.map_err(db_err)? {
            Some(round) => {
                let pools = repos::get_fetch_pools(&mut *tx, round.id)
                    .await
                    .map_err(db_err)?;
                let samples = repos::get_hashrate_chart(&mut *tx).await.map_err(db_err)?;
                Some(Snapshot {
                    round,
                    pools,
                    samples,
                })
            }
            None => None,
        };

        tx.commit().await.map_err(db_err)?;
        self.checkin(conn).await;
        Ok(snapshot)
    }

    async fn blocks_by_hash(&self, hashes: &[String]) -> Result<Vec<BlockRecord>, AppError> {
        let mut conn = self.checkout().await?;
        let mut tx = begin_read(&mut conn).await?;

        let blocks = repos::get_blocks_by_hash(&mut *tx, hashes)
            .await
            .map_err(db_err)?;

        tx.commit().await.map_err(db_err)?;
        self.checkin(conn).await;
        Ok(blocks)
    }
}

fn db_err(e: sqlx::Error) -> AppError {
    AppError::Database(e.to_string())
}
