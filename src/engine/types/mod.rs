pub mod raft_log;

pub use raft_log::{CompactionJobPlan, CompactionPlanUpdate, NewCompactionJob, RaftLogEntry};
