//! Aggregation over one pool fetch round: sync classification, hashrate
//! totals, the hourly multi-pool chart and block ownership lookup.

pub mod blocks;
pub mod chart;
pub mod hashrate;
pub mod report;
pub mod sync;

#[cfg(test)]
pub(crate) mod testing;

pub use blocks::{BlockLookup, FoundBlock, find, resolve_blocks};
pub use chart::{ChartPoint, PoolIndex, build_chart, round_kh};
pub use hashrate::HashrateTotals;
pub use report::{PoolStatus, StatsReport, build_report, stats};
pub use sync::{HEIGHT_TOLERANCE, SyncStatus, classify, classify_pool};
