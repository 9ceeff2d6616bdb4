pub mod block_queue_store;
pub mod entry_codec;
pub mod memory_kv;

use crate::engine::compaction::BlockEntry;
use crate::engine::errors::StoreError;

pub use block_queue_store::{BLOCK_QUEUE_BUCKET, KvBlockQueueStore};
pub use memory_kv::{KvTx, MemoryKv};

/// Durable log of the blocks admitted into compaction, written inside the
/// raft apply transaction.
///
/// Entries are listed in `(index, id)` order, which is the order they were
/// admitted in.
pub trait BlockQueueStore {
    type Tx;

    fn create_buckets(&self, tx: &mut Self::Tx) -> Result<(), StoreError>;

    fn store_entry(&self, tx: &mut Self::Tx, entry: &BlockEntry) -> Result<(), StoreError>;

    /// Deleting an entry that is not stored is not an error.
    fn delete_entry(&self, tx: &mut Self::Tx, index: u64, id: &str) -> Result<(), StoreError>;

    fn list_entries<'a>(
        &'a self,
        tx: &'a Self::Tx,
    ) -> Box<dyn Iterator<Item = Result<BlockEntry, StoreError>> + 'a>;
}
