pub mod block_entry_factory;
pub mod block_id_factory;
pub mod compaction_config_factory;
pub mod tombstone_factory;

pub use block_entry_factory::BlockEntryFactory;
pub use block_id_factory::BlockIdFactory;
pub use compaction_config_factory::CompactionConfigFactory;
pub use tombstone_factory::TombstoneFactory;
