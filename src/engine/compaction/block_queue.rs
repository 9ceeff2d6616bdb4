use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, trace};

use super::batch::{Batch, BatchId, Batches};
use super::block_entry::{CompactionKey, QueuedBlock};
use super::metrics::{LevelStats, QueueObserver};
use super::staged_blocks::{StagedBlocks, StagedId};
use super::update_heap::UpdateHeap;
use crate::shared::config::LevelConfig;

/// Blocks of one compaction level.
///
/// Blocks are staged per compaction key. Once the open batch of a key is
/// full or old enough it is flushed: appended to the level-wide list (arrival
/// order across keys) and to the key-local list. Readers walk the global list
/// to find the oldest batch and the local list to collect blocks of the same
/// key.
///
/// There is no pop: blocks leave the queue only through explicit deletion.
pub(crate) struct BlockQueue {
    level: u32,
    limits: LevelConfig,
    staged: HashMap<StagedId, StagedBlocks>,
    keys: HashMap<CompactionKey, StagedId>,
    batches: Batches,
    /// Staged queues by last update: incomplete batches are flushed once
    /// their key stops receiving blocks.
    updates: UpdateHeap,
    blocks: u32,
    next_staged_id: u64,
    observer: Arc<dyn QueueObserver>,
}

impl BlockQueue {
    pub(crate) fn new(level: u32, limits: LevelConfig, observer: Arc<dyn QueueObserver>) -> Self {
        Self {
            level,
            limits,
            staged: HashMap::new(),
            keys: HashMap::new(),
            batches: Batches::new(),
            updates: UpdateHeap::new(),
            blocks: 0,
            next_staged_id: 0,
            observer,
        }
    }

    #[cfg(test)]
    pub(crate) fn level(&self) -> u32 {
        self.level
    }

    pub(crate) fn limits(&self) -> &LevelConfig {
        &self.limits
    }

    pub(crate) fn stats(&self) -> LevelStats {
        LevelStats {
            blocks: self.blocks,
            batches: self.batches.linked() as u32,
            queues: self.staged.len() as u32,
        }
    }

    pub(crate) fn head(&self) -> Option<BatchId> {
        self.batches.head()
    }

    #[cfg(test)]
    pub(crate) fn tail(&self) -> Option<BatchId> {
        self.batches.tail()
    }

    pub(crate) fn batch(&self, id: BatchId) -> &Batch {
        self.batches.get(id)
    }

    /// Key of the queue that owns the batch.
    pub(crate) fn batch_key(&self, id: BatchId) -> &CompactionKey {
        let owner = self.batches.get(id).owner;
        &self
            .staged
            .get(&owner)
            .unwrap_or_else(|| panic!("bug: batch {id:?} has no staged queue"))
            .key
    }

    pub(crate) fn staged(&self, key: &CompactionKey) -> Option<&StagedBlocks> {
        self.keys.get(key).and_then(|id| self.staged.get(id))
    }

    #[cfg(test)]
    pub(crate) fn staged_keys(&self) -> impl Iterator<Item = &CompactionKey> {
        self.keys.keys()
    }

    #[cfg(test)]
    pub(crate) fn updates(&self) -> &UpdateHeap {
        &self.updates
    }

    /// Compaction keys in heap order with their last update time.
    #[cfg(test)]
    pub(crate) fn update_order(&self) -> Vec<(CompactionKey, i64)> {
        self.updates
            .ordered()
            .into_iter()
            .map(|(id, updated_at)| (self.staged[&id].key.clone(), updated_at))
            .collect()
    }

    /// Flushed batches in arrival order.
    #[cfg(test)]
    pub(crate) fn batches(&self) -> impl Iterator<Item = (BatchId, &Batch)> {
        std::iter::successors(self.head(), |&id| self.batches.get(id).next_global())
            .map(|id| (id, self.batches.get(id)))
    }

    /// Key and block ids of every flushed batch, in arrival order.
    #[cfg(test)]
    pub(crate) fn batch_contents(&self) -> Vec<(CompactionKey, Vec<String>)> {
        self.batches()
            .map(|(id, batch)| {
                (
                    self.batch_key(id).clone(),
                    batch.block_ids().map(str::to_string).collect(),
                )
            })
            .collect()
    }

    /// Block ids of the open batch of every key, sorted by key.
    #[cfg(test)]
    pub(crate) fn staged_contents(&self) -> Vec<(CompactionKey, Vec<String>)> {
        let mut contents: Vec<_> = self
            .staged
            .values()
            .map(|staged| {
                (
                    staged.key.clone(),
                    self.batches
                        .get(staged.open)
                        .block_ids()
                        .map(str::to_string)
                        .collect(),
                )
            })
            .collect();
        contents.sort();
        contents
    }

    pub(crate) fn push(&mut self, key: &CompactionKey, block: QueuedBlock, now: i64) -> bool {
        let id = self.staged_blocks(key, now);
        self.updates.upsert(id, now);

        let staged = self
            .staged
            .get_mut(&id)
            .unwrap_or_else(|| panic!("bug: staged queue {id:?} is not registered"));
        let block_id = block.id.clone();
        let pushed = staged.push(block, now, &self.limits, &mut self.batches);
        if pushed {
            self.blocks += 1;
        } else {
            debug!(
                target: "compaction::queue",
                key = %key,
                block = %block_id,
                "Rejected duplicate block"
            );
        }

        self.flush_oldest(now);
        self.publish(key);
        pushed
    }

    pub(crate) fn get(&self, key: &CompactionKey, block: &str) -> Option<&QueuedBlock> {
        self.staged(key)?.get(block, &self.batches)
    }

    pub(crate) fn delete(&mut self, key: &CompactionKey, block: &str) -> Option<QueuedBlock> {
        let Some(&id) = self.keys.get(key) else {
            trace!(
                target: "compaction::queue",
                key = %key,
                block,
                "Delete for a compaction key with no queued blocks"
            );
            return None;
        };
        let staged = self
            .staged
            .get_mut(&id)
            .unwrap_or_else(|| panic!("bug: staged queue {id:?} is not registered"));
        let removed = staged.delete(block, &mut self.batches);
        if removed.is_some() {
            self.blocks -= 1;
        }
        if staged.is_empty() {
            // The last block of the key is gone; none of its batches is in
            // the queue anymore and there is nothing left to flush.
            self.remove_staged(id);
        } else {
            self.publish(key);
        }
        removed
    }

    /// Returns the staged queue of the key, creating it if needed.
    fn staged_blocks(&mut self, key: &CompactionKey, now: i64) -> StagedId {
        if let Some(&id) = self.keys.get(key) {
            return id;
        }
        let id = StagedId(self.next_staged_id);
        self.next_staged_id += 1;
        let staged = StagedBlocks::new(id, key.clone(), &mut self.batches);
        self.staged.insert(id, staged);
        self.keys.insert(key.clone(), id);
        self.updates.upsert(id, now);
        debug!(target: "compaction::queue", key = %key, "Created compaction queue");
        id
    }

    fn remove_staged(&mut self, id: StagedId) {
        let Some(staged) = self.staged.remove(&id) else {
            panic!("bug: attempt to remove an unknown compaction queue {id:?}");
        };
        self.keys.remove(&staged.key);
        if self.updates.remove(id).is_none() {
            panic!("bug: attempt to delete compaction queue with an invalid priority index");
        }
        debug!(target: "compaction::queue", key = %staged.key, "Removed compaction queue");
        self.observer.queue_removed(&staged.key);
        self.observer.level_updated(self.level, &self.stats());
        staged.release(&mut self.batches);
    }

    /// Flushes the least recently updated staged batch if it is older than
    /// the level allows.
    pub(crate) fn flush_oldest(&mut self, now: i64) {
        let Some((id, _)) = self.updates.peek() else {
            panic!("bug: compaction queue has empty priority queue");
        };
        let staged = self
            .staged
            .get_mut(&id)
            .unwrap_or_else(|| panic!("bug: staged queue {id:?} is not registered"));
        let open = self.batches.get(staged.open);
        if !self.limits.exceeds_max_age(open.created_at, now) {
            return;
        }
        // An empty open batch only gets its timestamp refreshed: the queue
        // stays around while its flushed batches still hold blocks, and it
        // must not sink to the root of the heap forever.
        if open.size > 0 {
            trace!(
                target: "compaction::queue",
                key = %staged.key,
                blocks = open.size,
                "Flushing batch by age"
            );
            staged.flush(&mut self.batches);
            let key = staged.key.clone();
            self.publish(&key);
        }
        self.updates.upsert(id, now);
    }

    fn publish(&self, key: &CompactionKey) {
        if let Some(staged) = self.staged(key) {
            self.observer.queue_updated(key, &staged.stats);
        }
        self.observer.level_updated(self.level, &self.stats());
    }

    /// Drops every staged queue, reporting each as removed.
    pub(crate) fn clear(&mut self) {
        for key in self.keys.keys() {
            self.observer.queue_removed(key);
        }
        self.staged.clear();
        self.keys.clear();
        self.batches = Batches::new();
        self.updates.clear();
        self.blocks = 0;
        self.observer.level_updated(self.level, &self.stats());
    }
}
