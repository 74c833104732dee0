use poolwatch_core::AppError;
use poolwatch_storage::SnapshotStore;
use poolwatch_storage::models::BlockRecord;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, hash_map::Entry};

/// The pool credited with a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FoundBlock {
    pub pool: String,
    pub height: i64,
    pub blocks_url: Option<String>,
}

impl From<BlockRecord> for FoundBlock {
    fn from(record: BlockRecord) -> Self {
        Self {
            pool: record.name,
            height: record.height,
            blocks_url: record.blocks_url,
        }
    }
}

/// Requested hash → finder, `None` for hashes no pool claims.
pub type BlockLookup = BTreeMap<String, Option<FoundBlock>>;

/// Map every requested hash to the pool that reported it.
///
/// If several rows share a hash, the one with the lowest pool id (then the
/// lowest height) wins, whatever order the rows arrived in.
pub fn resolve_blocks(requested: &[String], records: Vec<BlockRecord>) -> BlockLookup {
    let mut claims: HashMap<String, BlockRecord> = HashMap::new();
    for record in records {
        match claims.entry(record.hash.clone()) {
            Entry::Occupied(mut current) => {
                if (record.pool, record.height) < (current.get().pool, current.get().height) {
                    current.insert(record);
                }
            }
            Entry::Vacant(slot) => {
                slot.insert(record);
            }
        }
    }

    requested
        .iter()
        .map(|hash| {
            let found = claims.get(hash).cloned().map(FoundBlock::from);
            (hash.clone(), found)
        })
        .collect()
}

/// Look up which pools found `hashes`. An empty request never reaches the store.
pub async fn find(store: &dyn SnapshotStore, hashes: &[String]) -> Result<BlockLookup, AppError> {
    if hashes.is_empty() {
        return Ok(BlockLookup::new());
    }

    let records = store.blocks_by_hash(hashes).await?;
    let lookup = resolve_blocks(hashes, records);

    tracing::debug!(
        requested = hashes.len(),
        resolved = lookup.values().filter(|found| found.is_some()).count(),
        "Resolved block hashes"
    );
    Ok(lookup)
}
