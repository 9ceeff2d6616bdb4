pub use super::factories::{
    BlockEntryFactory, BlockIdFactory, CompactionConfigFactory, TombstoneFactory,
};

pub struct Factory;

impl Factory {
    pub fn block_entry() -> BlockEntryFactory {
        BlockEntryFactory::new()
    }

    pub fn compaction_config() -> CompactionConfigFactory {
        CompactionConfigFactory::new()
    }

    pub fn tombstone() -> TombstoneFactory {
        TombstoneFactory::new()
    }
}
