use std::collections::HashMap;

use serde::Serialize;

use super::batch::{BatchId, Batches, Detach, ListEnds};
use super::block_entry::{CompactionKey, QueuedBlock};
use crate::shared::config::LevelConfig;

/// Stable identity of a staged queue within its level. Ids are allocated in
/// creation order and never reused by the level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct StagedId(pub(crate) u64);

/// Per compaction key counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    /// Blocks currently queued.
    pub blocks: u32,
    /// Flushed batches currently queued.
    pub batches: u32,
    /// Pushes rejected as duplicates.
    pub rejected: u32,
    /// Deletes of blocks that were not queued.
    pub missed: u32,
}

#[derive(Debug, Clone, Copy)]
struct BlockRef {
    batch: BatchId,
    slot: usize,
}

/// Blocks sharing one compaction key: the open batch being filled, the
/// key-local list of flushed batches and an index of every queued block.
#[derive(Debug)]
pub(crate) struct StagedBlocks {
    pub(crate) id: StagedId,
    pub(crate) key: CompactionKey,
    pub(crate) local: ListEnds,
    /// Never linked into any list until flushed.
    pub(crate) open: BatchId,
    refs: HashMap<String, BlockRef>,
    pub(crate) stats: QueueStats,
}

impl StagedBlocks {
    pub(crate) fn new(id: StagedId, key: CompactionKey, batches: &mut Batches) -> Self {
        Self {
            id,
            key,
            local: ListEnds::default(),
            open: batches.open(id),
            refs: HashMap::new(),
            stats: QueueStats::default(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, block: &str) -> bool {
        self.refs.contains_key(block)
    }

    /// Looks the block up without removing it.
    pub(crate) fn get<'a>(&self, block: &str, batches: &'a Batches) -> Option<&'a QueuedBlock> {
        let r = self.refs.get(block)?;
        batches.get(r.batch).blocks[r.slot].as_ref()
    }

    /// Adds the block to the open batch, flushing it once it is full or too
    /// old. Returns false if the block is already queued.
    pub(crate) fn push(
        &mut self,
        block: QueuedBlock,
        now: i64,
        limits: &LevelConfig,
        batches: &mut Batches,
    ) -> bool {
        if self.refs.contains_key(&block.id) {
            self.stats.rejected += 1;
            return false;
        }

        let batch = batches.get_mut(self.open);
        if batch.size == 0 {
            batch.created_at = now;
        }
        self.refs.insert(
            block.id.clone(),
            BlockRef {
                batch: self.open,
                slot: batch.blocks.len(),
            },
        );
        batch.blocks.push(Some(block));
        batch.size += 1;
        self.stats.blocks += 1;

        if limits.exceeds_max_size(batch.size) || limits.exceeds_max_age(batch.created_at, now) {
            self.flush(batches);
        }
        true
    }

    /// Moves the open batch to the queue and starts a new one.
    pub(crate) fn flush(&mut self, batches: &mut Batches) {
        batches.link(self.open, &mut self.local);
        self.stats.batches += 1;
        self.open = batches.open(self.id);
    }

    /// Removes the block, detaching its batch once the batch is drained.
    /// Unknown blocks are counted as missed.
    pub(crate) fn delete(&mut self, block: &str, batches: &mut Batches) -> Option<QueuedBlock> {
        let Some(r) = self.refs.remove(block) else {
            self.stats.missed += 1;
            return None;
        };

        // Slots are emptied in place: sibling refs keep pointing at their slots.
        let batch = batches.get_mut(r.batch);
        let removed = batch.blocks[r.slot].take();
        batch.size -= 1;
        self.stats.blocks -= 1;

        // The open batch is not in any list yet and stays open even when drained.
        if batch.size == 0 && r.batch != self.open {
            match batches.detach(r.batch, &mut self.local) {
                Detach::Detached => {
                    batches.release(r.batch);
                    self.stats.batches -= 1;
                }
                Detach::NotLinked => {
                    panic!("bug: attempt to remove a batch that is not in the compaction queue")
                }
            }
        }
        removed
    }

    /// Frees the open batch. Only valid once every block is gone.
    pub(crate) fn release(self, batches: &mut Batches) {
        debug_assert!(self.refs.is_empty());
        batches.release(self.open);
    }
}
