use tracing::{debug, trace};

use super::compaction_queue::CompactionQueue;
use super::iter::{BatchIter, BlockIter};
use super::job_plan::JobPlan;
use crate::engine::tombstones::{Tombstone, Tombstones};
use crate::engine::types::raft_log::{CompactionJobPlan, RaftLogEntry};
use crate::shared::config::CompactionConfig;

/// Read-only planning pass over the compaction queue.
pub trait Plan {
    /// Next job to propose, or `None` when nothing is ready. A fresh plan over
    /// an unchanged queue yields the same sequence of jobs.
    fn create_job(&mut self) -> Option<CompactionJobPlan>;
}

/// Walks levels from the lowest, and batches of a level from the oldest,
/// gathering blocks of the batch's compaction key into jobs.
///
/// A job is emitted when it is complete (reached the level's max blocks) or
/// when its oldest batch exceeded the level's max age. A plan never modifies
/// the queue; jobs take effect once the committed plan update is applied.
pub struct QueuePlan<'a> {
    queue: &'a CompactionQueue,
    config: &'a CompactionConfig,
    tombstones: Box<dyn Iterator<Item = Tombstone> + 'a>,
    /// Raft time of the planning command, ns.
    now: i64,
    level: usize,
    batches: Option<BatchIter>,
    blocks: BlockIter,
}

impl<'a> QueuePlan<'a> {
    pub(crate) fn new(
        queue: &'a CompactionQueue,
        config: &'a CompactionConfig,
        tombstones: &'a dyn Tombstones,
        cmd: &RaftLogEntry,
    ) -> Self {
        let before = cmd.appended_at.saturating_sub(config.cleanup_delay_nanos());
        Self {
            queue,
            config,
            tombstones: tombstones.list_tombstones(before),
            now: cmd.appended_at,
            level: 0,
            batches: None,
            blocks: BlockIter::new(),
        }
    }

    pub(crate) fn next_job(&mut self) -> Option<JobPlan> {
        let queue = self.queue;
        while self.level < queue.level_count() {
            let Some(level) = queue.level(self.level) else {
                self.level += 1;
                continue;
            };
            let batches = self.batches.get_or_insert_with(|| BatchIter::new(level));
            let Some(batch_id) = batches.next(level) else {
                // No more batches in the level.
                self.batches = None;
                self.level += 1;
                continue;
            };

            // Oldest batch not yet considered: the job collects blocks of its
            // key, continuing through later batches of the same key, which
            // are not necessarily the next ones in arrival order.
            let limits = level.limits();
            let mut job = JobPlan::new(level.batch_key(batch_id).clone());
            self.blocks.set_batch(Some(batch_id));
            while let Some(block) = self.blocks.peek(level) {
                if !job.try_add(block, limits) {
                    break;
                }
                self.blocks.advance(level);
                if job.is_complete(limits) {
                    break;
                }
            }

            let created_at = level.batch(batch_id).created_at;
            if !job.is_empty()
                && (job.is_complete(limits) || limits.exceeds_max_age(created_at, self.now))
            {
                self.attach_tombstones(&mut job);
                return Some(job);
            }
            trace!(
                target: "compaction::plan",
                key = %job.key,
                blocks = job.blocks.len(),
                "Job is not ready"
            );
        }
        None
    }

    fn attach_tombstones(&mut self, job: &mut JobPlan) {
        if !self.config.cleanup_applies_to(self.level as u32) {
            return;
        }
        let limit = self.config.cleanup_batch_size as usize;
        job.tombstones
            .extend(self.tombstones.by_ref().take(limit));
    }
}

impl Plan for QueuePlan<'_> {
    fn create_job(&mut self) -> Option<CompactionJobPlan> {
        let job = self.next_job()?.finalize();
        debug!(
            target: "compaction::plan",
            job = %job.name,
            blocks = job.source_blocks.len(),
            tombstones = job.tombstones.len(),
            "Planned compaction job"
        );
        Some(job)
    }
}

impl Iterator for QueuePlan<'_> {
    type Item = CompactionJobPlan;

    fn next(&mut self) -> Option<Self::Item> {
        self.create_job()
    }
}
