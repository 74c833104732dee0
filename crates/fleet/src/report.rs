use poolwatch_core::AppError;
use poolwatch_storage::SnapshotStore;
use poolwatch_storage::models::{PoolRecord, Snapshot};
use serde::Serialize;

use crate::chart::{ChartPoint, PoolIndex, build_chart};
use crate::hashrate::HashrateTotals;
use crate::sync::{SyncStatus, classify_pool};

/// A pool as published by the stats endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    #[serde(flatten)]
    pub pool: PoolRecord,
    pub desync: bool,
}

/// Dashboard view of the most recent fetch round.
#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub id: i64,
    /// Epoch seconds, keeping the scrape's microseconds.
    pub time: f64,
    /// Local node height the round was compared against.
    pub height: i64,
    pub hashrate_synced: f64,
    pub hashrate_desynced: f64,
    pub pools: Vec<PoolStatus>,
    pub hr_chart: Vec<ChartPoint>,
}

pub fn build_report(snapshot: Snapshot) -> StatsReport {
    let Snapshot {
        round,
        pools,
        samples,
    } = snapshot;

    let index: PoolIndex = pools.iter().map(|pool| pool.id).collect();

    let classified: Vec<(PoolRecord, SyncStatus)> = pools
        .into_iter()
        .map(|pool| {
            let status = classify_pool(round.height, &pool);
            (pool, status)
        })
        .collect();

    let totals: HashrateTotals = classified
        .iter()
        .map(|(pool, status)| (pool.hashrate, *status))
        .collect();

    let pools: Vec<PoolStatus> = classified
        .into_iter()
        .map(|(pool, status)| PoolStatus {
            desync: status.is_desync(),
            pool,
        })
        .collect();

    let hr_chart = build_chart(&index, &samples);

    StatsReport {
        id: round.id,
        time: round.time.timestamp_micros() as f64 / 1e6,
        height: round.height,
        hashrate_synced: totals.synced,
        hashrate_desynced: totals.desynced,
        pools,
        hr_chart,
    }
}

/// Build the stats report from the store's latest fetch round.
///
/// Fails with [`AppError::NoRecentFetch`] until the scraper has run once.
pub async fn stats(store: &dyn SnapshotStore) -> Result<StatsReport, AppError> {
    let snapshot = store
        .latest_snapshot()
        .await?
        .ok_or(AppError::NoRecentFetch)?;

    let report = build_report(snapshot);
    tracing::debug!(
        fetch = report.id,
        pools = report.pools.len(),
        chart_points = report.hr_chart.len(),
        "Built stats report"
    );
    Ok(report)
}
