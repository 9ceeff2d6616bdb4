use serde::{Deserialize, Serialize};

use crate::engine::compaction::CompactionKey;
use crate::engine::tombstones::Tombstone;

/// Raft command currently being applied: its log position and the leader's
/// append timestamp in nanoseconds. The timestamp is the only clock the
/// planner is allowed to look at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaftLogEntry {
    pub index: u64,
    pub appended_at: i64,
}

/// Proposed compaction job, replicated through consensus before it takes effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionJobPlan {
    /// Deterministic name, used as a tiebreaker in the raft log.
    pub name: String,
    pub tenant: String,
    pub shard: u32,
    pub compaction_level: u32,
    pub source_blocks: Vec<String>,
    #[serde(default)]
    pub tombstones: Vec<Tombstone>,
}

impl CompactionJobPlan {
    pub fn compaction_key(&self) -> CompactionKey {
        CompactionKey::new(self.tenant.clone(), self.shard, self.compaction_level)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCompactionJob {
    pub plan: CompactionJobPlan,
}

/// Committed planning decision applied on every replica.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompactionPlanUpdate {
    pub new_jobs: Vec<NewCompactionJob>,
}

impl CompactionPlanUpdate {
    pub fn from_plans(plans: impl IntoIterator<Item = CompactionJobPlan>) -> Self {
        Self {
            new_jobs: plans
                .into_iter()
                .map(|plan| NewCompactionJob { plan })
                .collect(),
        }
    }
}
