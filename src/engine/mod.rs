pub mod compaction;
pub mod errors;
pub mod store;
pub mod tombstones;
pub mod types;

pub use errors::*;
