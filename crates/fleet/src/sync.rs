use poolwatch_storage::models::PoolRecord;

/// Largest height difference from the local node still counted as in sync.
///
/// Scrapes race block announcements, so pools a block or two away are normal.
pub const HEIGHT_TOLERANCE: u64 = 3;

/// Whether a pool agrees with the local node about the chain tip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncStatus {
    /// Reported height is within tolerance of the local node.
    Synced,
    /// No height reported and no scrape error. Some pools never expose
    /// their height, so a clean scrape is taken as good enough.
    AssumedSynced,
    /// Height is out of tolerance, or missing after a failed scrape.
    Desynced,
}

impl SyncStatus {
    pub fn is_desync(self) -> bool {
        matches!(self, SyncStatus::Desynced)
    }
}

/// Classify a pool against the local node height.
pub fn classify(
    local_height: i64,
    reported_height: Option<i64>,
    error: Option<&str>,
) -> SyncStatus {
    match (reported_height, error) {
        (Some(height), _) if local_height.abs_diff(height) > HEIGHT_TOLERANCE => {
            SyncStatus::Desynced
        }
        (Some(_), _) => SyncStatus::Synced,
        (None, None) => SyncStatus::AssumedSynced,
        (None, Some(_)) => SyncStatus::Desynced,
    }
}

pub fn classify_pool(local_height: i64, pool: &PoolRecord) -> SyncStatus {
    classify(local_height, pool.height, pool.error.as_deref())
}
