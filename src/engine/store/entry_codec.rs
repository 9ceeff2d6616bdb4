use serde::{Deserialize, Serialize};

use crate::engine::compaction::BlockEntry;
use crate::engine::errors::StoreError;

const INDEX_LEN: usize = 8;

/// Value part of a stored entry. The raft index and the block id live in the
/// key, so that keys sort in admission order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct StoredBlock {
    appended_at: i64,
    tenant: String,
    shard: u32,
    level: u32,
}

/// `index` as big-endian u64 followed by the block id bytes.
pub fn encode_key(index: u64, id: &str) -> Vec<u8> {
    let mut key = Vec::with_capacity(INDEX_LEN + id.len());
    key.extend_from_slice(&index.to_be_bytes());
    key.extend_from_slice(id.as_bytes());
    key
}

pub fn decode_key(key: &[u8]) -> Result<(u64, String), StoreError> {
    if key.len() < INDEX_LEN {
        return Err(StoreError::MalformedKey(key.len()));
    }
    let (index, id) = key.split_at(INDEX_LEN);
    let mut buf = [0u8; INDEX_LEN];
    buf.copy_from_slice(index);
    let id = String::from_utf8(id.to_vec())?;
    Ok((u64::from_be_bytes(buf), id))
}

pub fn encode_value(entry: &BlockEntry) -> Result<Vec<u8>, StoreError> {
    let value = StoredBlock {
        appended_at: entry.appended_at,
        tenant: entry.tenant.clone(),
        shard: entry.shard,
        level: entry.level,
    };
    Ok(bincode::serialize(&value)?)
}

pub fn decode_entry(key: &[u8], value: &[u8]) -> Result<BlockEntry, StoreError> {
    let (index, id) = decode_key(key)?;
    let stored: StoredBlock = bincode::deserialize(value)?;
    Ok(BlockEntry {
        index,
        appended_at: stored.appended_at,
        id,
        tenant: stored.tenant,
        shard: stored.shard,
        level: stored.level,
    })
}
