use std::fmt;

use serde::{Deserialize, Serialize};

/// A block admitted into compaction by the replicated state machine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockEntry {
    /// Raft log index of the command that added the block.
    pub index: u64,
    /// Raft log append timestamp, nanoseconds.
    pub appended_at: i64,
    /// Block ULID.
    pub id: String,
    pub tenant: String,
    pub shard: u32,
    pub level: u32,
}

impl BlockEntry {
    pub fn compaction_key(&self) -> CompactionKey {
        CompactionKey::new(self.tenant.clone(), self.shard, self.level)
    }
}

/// Independent compaction lane. Blocks are only ever compacted together with
/// blocks sharing the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct CompactionKey {
    pub tenant: String,
    pub shard: u32,
    pub level: u32,
}

impl CompactionKey {
    pub fn new(tenant: impl Into<String>, shard: u32, level: u32) -> Self {
        Self {
            tenant: tenant.into(),
            shard,
            level,
        }
    }
}

impl fmt::Display for CompactionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "T{}-S{}-L{}", self.tenant, self.shard, self.level)
    }
}

/// Block reference kept inside a batch. Tenant, shard and level are implied
/// by the owning staged queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct QueuedBlock {
    pub(crate) id: String,
    pub(crate) index: u64,
}

impl From<&BlockEntry> for QueuedBlock {
    fn from(entry: &BlockEntry) -> Self {
        Self {
            id: entry.id.clone(),
            index: entry.index,
        }
    }
}
