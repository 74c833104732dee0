//! In-memory snapshot store for engine tests.

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use poolwatch_core::AppError;
use poolwatch_storage::SnapshotStore;
use poolwatch_storage::models::{BlockRecord, FetchRound, PoolRecord, Snapshot};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Default)]
pub struct MemoryStore {
    pub snapshot: Option<Snapshot>,
    pub blocks: Vec<BlockRecord>,
    pub queries: AtomicUsize,
}

impl MemoryStore {
    pub fn queries(&self) -> usize {
        self.queries.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SnapshotStore for MemoryStore {
    async fn latest_snapshot(&self) -> Result<Option<Snapshot>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self.snapshot.clone())
    }

    async fn blocks_by_hash(&self, hashes: &[String]) -> Result<Vec<BlockRecord>, AppError> {
        self.queries.fetch_add(1, Ordering::SeqCst);
        Ok(self
            .blocks
            .iter()
            .filter(|b| hashes.contains(&b.hash))
            .cloned()
            .collect())
    }
}

pub fn round(id: i64, height: i64) -> FetchRound {
    FetchRound {
        id,
        time: Utc.timestamp_opt(1_700_000_000, 250_123_456).unwrap(),
        height,
    }
}

pub fn pool(
    id: i64,
    height: Option<i64>,
    hashrate: Option<f64>,
    error: Option<&str>,
) -> PoolRecord {
    PoolRecord {
        id,
        name: format!("pool-{id}"),
        url: format!("https://pool{id}.example"),
        blocks_url: Some(format!("https://pool{id}.example/blocks")),
        location: None,
        height,
        blocks_found: Some(id * 10),
        hashrate,
        effort: None,
        miners: Some(12),
        miners_paid: None,
        payments: None,
        fee: Some(0.9),
        threshold: Some(0.1),
        error: error.map(str::to_string),
        hr1: None,
        hr7: None,
    }
}

pub fn block(hash: &str, pool: i64, height: i64) -> BlockRecord {
    BlockRecord {
        hash: hash.to_string(),
        pool,
        name: format!("pool-{pool}"),
        blocks_url: Some(format!("https://pool{pool}.example/blocks")),
        height,
    }
}
