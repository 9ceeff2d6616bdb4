use std::sync::Arc;

use tracing::{debug, info};

use super::block_entry::BlockEntry;
use super::compaction_queue::CompactionQueue;
use super::metrics::QueueObserver;
use super::plan::{Plan, QueuePlan};
use crate::engine::errors::CompactionError;
use crate::engine::store::BlockQueueStore;
use crate::engine::tombstones::Tombstones;
use crate::engine::types::raft_log::{CompactionPlanUpdate, RaftLogEntry};
use crate::shared::config::CompactionConfig;

/// Admits new blocks into compaction.
pub trait BlockCompactor<Tx> {
    /// Called once per block from the raft apply loop, inside the apply
    /// transaction.
    fn compact(&mut self, tx: &mut Tx, entry: BlockEntry) -> Result<(), CompactionError>;
}

/// Proposes compaction jobs and applies committed decisions.
pub trait Planner<Tx> {
    /// Starts a read-only planning pass as of the given raft command.
    fn new_plan(&self, cmd: &RaftLogEntry) -> Box<dyn Plan + '_>;

    /// Applies a committed plan. Re-applying the same update is a no-op.
    fn update_plan(
        &mut self,
        tx: &mut Tx,
        update: &CompactionPlanUpdate,
    ) -> Result<(), CompactionError>;
}

/// Binds the in-memory compaction queue to the durable block queue store.
///
/// The store is written before the queue is, so after a crash the store
/// always holds at least what the queue held and [`Compactor::restore`]
/// rebuilds the queue faithfully.
pub struct Compactor<S> {
    config: Arc<CompactionConfig>,
    queue: CompactionQueue,
    store: S,
    tombstones: Arc<dyn Tombstones>,
}

impl<S: BlockQueueStore> Compactor<S> {
    pub fn new(config: CompactionConfig, store: S, tombstones: Arc<dyn Tombstones>) -> Self {
        let config = Arc::new(config);
        Self {
            queue: CompactionQueue::new(Arc::clone(&config)),
            config,
            store,
            tombstones,
        }
    }

    /// Reports queue statistics to the observer. Must be set up before any
    /// block is enqueued.
    pub fn with_observer(mut self, observer: Arc<dyn QueueObserver>) -> Self {
        self.queue = CompactionQueue::with_observer(Arc::clone(&self.config), observer);
        self
    }

    pub fn config(&self) -> &CompactionConfig {
        &self.config
    }

    pub fn queue(&self) -> &CompactionQueue {
        &self.queue
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Creates the store buckets.
    pub fn init(&self, tx: &mut S::Tx) -> Result<(), CompactionError> {
        self.store.create_buckets(tx)?;
        Ok(())
    }

    /// Rebuilds the queue from the store, in the order entries were stored.
    pub fn restore(&mut self, tx: &S::Tx) -> Result<(), CompactionError> {
        self.queue.reset();
        let mut restored = 0usize;
        for entry in self.store.list_entries(tx) {
            let entry = entry?;
            self.queue.push(&entry);
            restored += 1;
        }
        info!(
            target: "compaction::compactor",
            entries = restored,
            blocks = self.queue.blocks(),
            "Restored compaction queue"
        );
        Ok(())
    }

    pub fn plan(&self, cmd: &RaftLogEntry) -> QueuePlan<'_> {
        QueuePlan::new(&self.queue, &self.config, self.tombstones.as_ref(), cmd)
    }

    pub(crate) fn enqueue(&mut self, entry: &BlockEntry) -> bool {
        self.queue.push(entry)
    }
}

impl<S: BlockQueueStore> BlockCompactor<S::Tx> for Compactor<S> {
    fn compact(&mut self, tx: &mut S::Tx, entry: BlockEntry) -> Result<(), CompactionError> {
        if self.config.level(entry.level).is_none() {
            // Top level output is never compacted again.
            debug!(
                target: "compaction::compactor",
                block = %entry.id,
                level = entry.level,
                "Block is not subject to compaction"
            );
            return Ok(());
        }
        self.store
            .store_entry(tx, &entry)
            .map_err(CompactionError::from)
            .inspect_err(CompactionError::log_error)?;
        self.enqueue(&entry);
        Ok(())
    }
}

impl<S: BlockQueueStore> Planner<S::Tx> for Compactor<S> {
    fn new_plan(&self, cmd: &RaftLogEntry) -> Box<dyn Plan + '_> {
        Box::new(self.plan(cmd))
    }

    fn update_plan(
        &mut self,
        tx: &mut S::Tx,
        update: &CompactionPlanUpdate,
    ) -> Result<(), CompactionError> {
        for job in &update.new_jobs {
            let key = job.plan.compaction_key();
            let mut removed = 0usize;
            for block in &job.plan.source_blocks {
                // Absent blocks were removed by an earlier application of the
                // same update.
                let Some(index) = self.queue.get(&key, block).map(|b| b.index) else {
                    continue;
                };
                // The queue only drops the block once the store has: a failed
                // delete leaves both untouched for the retry.
                self.store
                    .delete_entry(tx, index, block)
                    .map_err(CompactionError::from)
                    .inspect_err(CompactionError::log_error)?;
                self.queue.delete(&key, block);
                removed += 1;
            }
            debug!(
                target: "compaction::compactor",
                job = %job.plan.name,
                key = %key,
                removed,
                "Applied compaction job"
            );
        }
        Ok(())
    }
}
