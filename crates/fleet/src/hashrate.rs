use crate::sync::SyncStatus;

/// Network hashrate split by whether the contributing pool is in sync.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HashrateTotals {
    pub synced: f64,
    pub desynced: f64,
}

impl HashrateTotals {
    /// Add one pool's hashrate. Pools that reported none are skipped rather
    /// than counted as zero.
    pub fn add(&mut self, hashrate: Option<f64>, status: SyncStatus) {
        let Some(hashrate) = hashrate else {
            return;
        };
        if status.is_desync() {
            self.desynced += hashrate;
        } else {
            self.synced += hashrate;
        }
    }
}

impl FromIterator<(Option<f64>, SyncStatus)> for HashrateTotals {
    fn from_iter<I: IntoIterator<Item = (Option<f64>, SyncStatus)>>(iter: I) -> Self {
        let mut totals = Self::default();
        for (hashrate, status) in iter {
            totals.add(hashrate, status);
        }
        totals
    }
}
