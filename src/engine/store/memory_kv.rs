use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing::trace;

pub type Bucket = BTreeMap<Vec<u8>, Vec<u8>>;

type Buckets = BTreeMap<String, Bucket>;

/// In-memory bucketed key-value store with single-writer transactions.
///
/// A transaction works on a private copy of the store. `commit` publishes the
/// copy; dropping the transaction without committing discards it. Concurrent
/// writers are not reconciled: the last commit wins, so callers serialize
/// write transactions the way the raft apply loop does.
#[derive(Debug, Clone, Default)]
pub struct MemoryKv {
    data: Arc<RwLock<Buckets>>,
}

impl MemoryKv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> KvTx {
        KvTx {
            buckets: self.data.read().clone(),
            db: Arc::clone(&self.data),
        }
    }

    /// Number of keys in the committed state of the bucket.
    pub fn bucket_len(&self, name: &str) -> Option<usize> {
        self.data.read().get(name).map(BTreeMap::len)
    }
}

pub struct KvTx {
    buckets: Buckets,
    db: Arc<RwLock<Buckets>>,
}

impl KvTx {
    pub fn create_bucket_if_not_exists(&mut self, name: &str) {
        self.buckets.entry(name.to_string()).or_default();
    }

    pub fn bucket(&self, name: &str) -> Option<&Bucket> {
        self.buckets.get(name)
    }

    pub fn bucket_mut(&mut self, name: &str) -> Option<&mut Bucket> {
        self.buckets.get_mut(name)
    }

    pub fn commit(self) {
        trace!(
            target: "compaction::store",
            buckets = self.buckets.len(),
            "Committing transaction"
        );
        *self.db.write() = self.buckets;
    }
}
