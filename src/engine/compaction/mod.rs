pub mod batch;
pub mod block_entry;
pub mod block_queue;
pub mod compaction_queue;
pub mod compactor;
pub mod iter;
pub mod job_plan;
pub mod metrics;
pub mod plan;
pub mod staged_blocks;
pub mod update_heap;

pub use block_entry::{BlockEntry, CompactionKey};
pub use compaction_queue::CompactionQueue;
pub use compactor::{BlockCompactor, Compactor, Planner};
pub use metrics::{
    LevelSample, LevelStats, MetricsSnapshot, NoopObserver, QueueMetrics, QueueObserver,
    QueueSample,
};
pub use plan::{Plan, QueuePlan};
pub use staged_blocks::QueueStats;

#[cfg(test)]
mod batch_test;
#[cfg(test)]
mod block_queue_test;
