use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Serialize;

use super::block_entry::CompactionKey;
use super::staged_blocks::QueueStats;
use crate::shared::config::CompactionConfig;

/// Per level aggregate counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LevelStats {
    pub blocks: u32,
    pub batches: u32,
    /// Compaction keys with at least one queued block.
    pub queues: u32,
}

/// Receives queue statistics as the apply loop changes the queue.
///
/// Implementations run inside the apply loop and must be cheap; anything that
/// reads the values from another thread keeps its own synchronized copy.
pub trait QueueObserver: Send + Sync {
    fn queue_updated(&self, key: &CompactionKey, stats: &QueueStats);
    fn queue_removed(&self, key: &CompactionKey);
    fn level_updated(&self, level: u32, stats: &LevelStats);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopObserver;

impl QueueObserver for NoopObserver {
    fn queue_updated(&self, _key: &CompactionKey, _stats: &QueueStats) {}
    fn queue_removed(&self, _key: &CompactionKey) {}
    fn level_updated(&self, _level: u32, _stats: &LevelStats) {}
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueueSample {
    pub tenant: String,
    pub shard: u32,
    pub level: u32,
    pub blocks: u32,
    pub batches: u32,
    pub rejected: u32,
    pub missed: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LevelSample {
    pub level: u32,
    pub blocks_current: u32,
    pub queues_current: u32,
    /// Jobs the queued blocks would make if they were all complete.
    pub backlog_jobs_current: f64,
}

/// Point-in-time copy of the compaction queue metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    pub queues: Vec<QueueSample>,
    pub levels: Vec<LevelSample>,
}

impl MetricsSnapshot {
    pub fn queue(&self, key: &CompactionKey) -> Option<&QueueSample> {
        self.queues
            .iter()
            .find(|q| q.tenant == key.tenant && q.shard == key.shard && q.level == key.level)
    }

    pub fn level(&self, level: u32) -> Option<&LevelSample> {
        self.levels.iter().find(|l| l.level == level)
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Default)]
struct MetricsState {
    queues: BTreeMap<CompactionKey, QueueStats>,
    levels: BTreeMap<u32, LevelStats>,
}

/// Observer that mirrors the queue counters for a scraper. `collect` only
/// touches the mirrored copy, so it is safe to call from any thread while
/// the apply loop keeps mutating the queue.
#[derive(Debug)]
pub struct QueueMetrics {
    max_blocks: Vec<u32>,
    state: Mutex<MetricsState>,
}

impl QueueMetrics {
    pub fn new(config: &CompactionConfig) -> Arc<Self> {
        Arc::new(Self {
            max_blocks: config.levels.iter().map(|l| l.max_blocks).collect(),
            state: Mutex::new(MetricsState::default()),
        })
    }

    pub fn collect(&self) -> MetricsSnapshot {
        let state = self.state.lock();
        let queues = state
            .queues
            .iter()
            .map(|(key, stats)| QueueSample {
                tenant: key.tenant.clone(),
                shard: key.shard,
                level: key.level,
                blocks: stats.blocks,
                batches: stats.batches,
                rejected: stats.rejected,
                missed: stats.missed,
            })
            .collect();
        let levels = state
            .levels
            .iter()
            .map(|(&level, stats)| LevelSample {
                level,
                blocks_current: stats.blocks,
                queues_current: stats.queues,
                backlog_jobs_current: self.backlog(level, stats.blocks),
            })
            .collect();
        MetricsSnapshot { queues, levels }
    }

    fn backlog(&self, level: u32, blocks: u32) -> f64 {
        match self.max_blocks.get(level as usize) {
            Some(&max_blocks) if max_blocks > 0 => blocks as f64 / max_blocks as f64,
            _ => 0.0,
        }
    }
}

impl QueueObserver for QueueMetrics {
    fn queue_updated(&self, key: &CompactionKey, stats: &QueueStats) {
        let mut state = self.state.lock();
        match state.queues.get_mut(key) {
            Some(current) => *current = *stats,
            None => {
                state.queues.insert(key.clone(), *stats);
            }
        }
    }

    fn queue_removed(&self, key: &CompactionKey) {
        self.state.lock().queues.remove(key);
    }

    fn level_updated(&self, level: u32, stats: &LevelStats) {
        self.state.lock().levels.insert(level, *stats);
    }
}
