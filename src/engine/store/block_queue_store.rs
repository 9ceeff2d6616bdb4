use tracing::{debug, trace};

use super::BlockQueueStore;
use super::entry_codec::{decode_entry, encode_key, encode_value};
use super::memory_kv::KvTx;
use crate::engine::compaction::BlockEntry;
use crate::engine::errors::StoreError;

pub const BLOCK_QUEUE_BUCKET: &str = "compaction_job_block_queue";

/// Block queue kept in a single bucket of the key-value store.
#[derive(Debug, Default, Clone, Copy)]
pub struct KvBlockQueueStore;

impl KvBlockQueueStore {
    pub fn new() -> Self {
        Self
    }
}

impl BlockQueueStore for KvBlockQueueStore {
    type Tx = KvTx;

    fn create_buckets(&self, tx: &mut KvTx) -> Result<(), StoreError> {
        tx.create_bucket_if_not_exists(BLOCK_QUEUE_BUCKET);
        debug!(target: "compaction::store", bucket = BLOCK_QUEUE_BUCKET, "Bucket ready");
        Ok(())
    }

    fn store_entry(&self, tx: &mut KvTx, entry: &BlockEntry) -> Result<(), StoreError> {
        let value = encode_value(entry)?;
        let bucket = tx
            .bucket_mut(BLOCK_QUEUE_BUCKET)
            .ok_or(StoreError::BucketNotFound(BLOCK_QUEUE_BUCKET))?;
        bucket.insert(encode_key(entry.index, &entry.id), value);
        trace!(
            target: "compaction::store",
            index = entry.index,
            block = %entry.id,
            "Stored block queue entry"
        );
        Ok(())
    }

    fn delete_entry(&self, tx: &mut KvTx, index: u64, id: &str) -> Result<(), StoreError> {
        let bucket = tx
            .bucket_mut(BLOCK_QUEUE_BUCKET)
            .ok_or(StoreError::BucketNotFound(BLOCK_QUEUE_BUCKET))?;
        bucket.remove(&encode_key(index, id));
        Ok(())
    }

    fn list_entries<'a>(
        &'a self,
        tx: &'a KvTx,
    ) -> Box<dyn Iterator<Item = Result<BlockEntry, StoreError>> + 'a> {
        match tx.bucket(BLOCK_QUEUE_BUCKET) {
            Some(bucket) => Box::new(bucket.iter().map(|(k, v)| decode_entry(k, v))),
            None => Box::new(std::iter::once(Err(StoreError::BucketNotFound(
                BLOCK_QUEUE_BUCKET,
            )))),
        }
    }
}
