use std::sync::Arc;

use tracing::{debug, warn};

use super::block_entry::{BlockEntry, CompactionKey, QueuedBlock};
use super::block_queue::BlockQueue;
use super::metrics::{NoopObserver, QueueObserver};
use crate::shared::config::{CompactionConfig, LevelConfig};

/// In-memory cache of pending compaction work, one block queue per level.
/// Everything in here can be rebuilt from the durable block queue store.
pub struct CompactionQueue {
    config: Arc<CompactionConfig>,
    observer: Arc<dyn QueueObserver>,
    levels: Vec<Option<BlockQueue>>,
}

impl CompactionQueue {
    pub fn new(config: Arc<CompactionConfig>) -> Self {
        Self::with_observer(config, Arc::new(NoopObserver))
    }

    pub fn with_observer(config: Arc<CompactionConfig>, observer: Arc<dyn QueueObserver>) -> Self {
        Self {
            config,
            observer,
            levels: Vec::new(),
        }
    }

    /// Number of level slots, including levels that never received a block.
    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub(crate) fn level(&self, level: usize) -> Option<&BlockQueue> {
        self.levels.get(level).and_then(Option::as_ref)
    }

    pub(crate) fn level_mut(&mut self, level: usize) -> Option<&mut BlockQueue> {
        self.levels.get_mut(level).and_then(Option::as_mut)
    }

    /// Number of blocks queued across all levels.
    pub fn blocks(&self) -> u64 {
        self.levels
            .iter()
            .flatten()
            .map(|level| level.stats().blocks as u64)
            .sum()
    }

    /// Returns false if the block is already queued or its level is not
    /// subject to compaction.
    pub fn push(&mut self, entry: &BlockEntry) -> bool {
        let Some(&limits) = self.config.level(entry.level) else {
            warn!(
                target: "compaction::queue",
                block = %entry.id,
                level = entry.level,
                "Block level has no compaction config; not queued"
            );
            return false;
        };
        let key = entry.compaction_key();
        self.block_queue(entry.level, limits)
            .push(&key, QueuedBlock::from(entry), entry.appended_at)
    }

    pub(crate) fn get(&self, key: &CompactionKey, block: &str) -> Option<&QueuedBlock> {
        self.level(key.level as usize)?.get(key, block)
    }

    /// Returns the removed block, or `None` if it was not queued.
    pub(crate) fn delete(&mut self, key: &CompactionKey, block: &str) -> Option<QueuedBlock> {
        self.level_mut(key.level as usize)?.delete(key, block)
    }

    /// Drops all queued state ahead of a full restore.
    pub fn reset(&mut self) {
        for level in self.levels.iter_mut().flatten() {
            level.clear();
        }
        self.levels.clear();
        debug!(target: "compaction::queue", "Compaction queue reset");
    }

    fn block_queue(&mut self, level: u32, limits: LevelConfig) -> &mut BlockQueue {
        let slot = level as usize;
        if slot >= self.levels.len() {
            self.levels.resize_with(slot + 1, || None);
        }
        let observer = &self.observer;
        self.levels[slot]
            .get_or_insert_with(|| BlockQueue::new(level, limits, Arc::clone(observer)))
    }
}
