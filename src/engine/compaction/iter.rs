use std::collections::HashSet;

use super::batch::BatchId;
use super::block_queue::BlockQueue;

/// Cursor over the flushed batches of a level in arrival order.
#[derive(Debug, Clone, Copy)]
pub(crate) struct BatchIter {
    next: Option<BatchId>,
}

impl BatchIter {
    pub(crate) fn new(queue: &BlockQueue) -> Self {
        Self { next: queue.head() }
    }

    pub(crate) fn next(&mut self, queue: &BlockQueue) -> Option<BatchId> {
        let id = self.next?;
        self.next = queue.batch(id).next_global();
        Some(id)
    }
}

/// Cursor over the blocks of a batch and of the batches that follow it
/// within the same compaction key.
///
/// A block is yielded at most once per iterator, however many times the
/// cursor is moved back to an earlier batch. Block ids are ULIDs and are
/// assumed to be globally unique, so visited blocks are tracked by id.
#[derive(Debug, Default)]
pub(crate) struct BlockIter {
    visited: HashSet<String>,
    batch: Option<BatchId>,
    slot: usize,
}

impl BlockIter {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn set_batch(&mut self, batch: Option<BatchId>) {
        self.batch = batch;
        self.slot = 0;
    }

    /// Next unvisited block, without consuming it.
    pub(crate) fn peek<'q>(&mut self, queue: &'q BlockQueue) -> Option<&'q str> {
        while let Some(id) = self.batch {
            let batch = queue.batch(id);
            let Some(slot) = batch.blocks.get(self.slot) else {
                self.set_batch(batch.next_local());
                continue;
            };
            match slot {
                Some(block) if !self.visited.contains(&block.id) => return Some(block.id.as_str()),
                _ => self.slot += 1,
            }
        }
        None
    }

    /// Marks the block returned by the last `peek` as visited.
    pub(crate) fn advance(&mut self, queue: &BlockQueue) {
        let Some(id) = self.batch else {
            return;
        };
        if let Some(Some(block)) = queue.batch(id).blocks.get(self.slot) {
            self.visited.insert(block.id.clone());
        }
        self.slot += 1;
    }
}
