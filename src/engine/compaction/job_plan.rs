use ulid::Ulid;
use xxhash_rust::xxh64::Xxh64;

use super::block_entry::CompactionKey;
use crate::engine::tombstones::Tombstone;
use crate::engine::types::raft_log::CompactionJobPlan;
use crate::shared::config::LevelConfig;

/// Job under construction while planning.
#[derive(Debug, Clone)]
pub(crate) struct JobPlan {
    pub(crate) key: CompactionKey,
    pub(crate) blocks: Vec<String>,
    pub(crate) tombstones: Vec<Tombstone>,
    /// Time range of the blocks that carry a timestamp, ns.
    span: Option<(i64, i64)>,
}

impl JobPlan {
    pub(crate) fn new(key: CompactionKey) -> Self {
        Self {
            key,
            blocks: Vec::new(),
            tombstones: Vec::new(),
            span: None,
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub(crate) fn is_complete(&self, limits: &LevelConfig) -> bool {
        self.blocks.len() as u64 >= limits.max_blocks as u64
    }

    /// Adds the block unless its timestamp lies too far from the blocks
    /// already in the job. Backlogs are split into time-bounded cohorts this
    /// way instead of producing one job spanning hours of data.
    pub(crate) fn try_add(&mut self, block: &str, limits: &LevelConfig) -> bool {
        if let Some(t) = block_time(block) {
            self.span = match self.span {
                None => Some((t, t)),
                Some((min_t, max_t)) => {
                    let max_age = limits.max_age_nanos();
                    if max_age > 0
                        && (t.saturating_sub(min_t) > max_age || max_t.saturating_sub(t) > max_age)
                    {
                        return false;
                    }
                    Some((min_t.min(t), max_t.max(t)))
                }
            };
        }
        self.blocks.push(block.to_string());
        true
    }

    pub(crate) fn finalize(self) -> CompactionJobPlan {
        CompactionJobPlan {
            name: job_name(&self.key, &self.blocks),
            tenant: self.key.tenant,
            shard: self.key.shard,
            compaction_level: self.key.level,
            source_blocks: self.blocks,
            tombstones: self.tombstones,
        }
    }
}

/// Block creation time encoded in the ULID, ns. Ids that are not ULIDs have
/// no timestamp.
pub(crate) fn block_time(id: &str) -> Option<i64> {
    let ulid = Ulid::from_string(id).ok()?;
    Some((ulid.timestamp_ms() as i64).saturating_mul(1_000_000))
}

/// `{xxhash64 of the concatenated block ids, lowercase hex}-T{tenant}-S{shard}-L{level}`.
/// Every replica derives the same name for the same set of blocks.
pub(crate) fn job_name(key: &CompactionKey, blocks: &[String]) -> String {
    let mut hasher = Xxh64::new(0);
    for block in blocks {
        hasher.update(block.as_bytes());
    }
    format!(
        "{:x}-T{}-S{}-L{}",
        hasher.digest(),
        key.tenant,
        key.shard,
        key.level
    )
}
