use crate::engine::compaction::BlockEntry;

pub struct BlockEntryFactory {
    entry: BlockEntry,
}

impl BlockEntryFactory {
    pub fn new() -> Self {
        Self {
            entry: BlockEntry {
                index: 0,
                appended_at: 0,
                id: "0".to_string(),
                tenant: "A".to_string(),
                shard: 1,
                level: 0,
            },
        }
    }

    pub fn index(mut self, index: u64) -> Self {
        self.entry.index = index;
        self
    }

    pub fn appended_at(mut self, appended_at: i64) -> Self {
        self.entry.appended_at = appended_at;
        self
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.entry.id = id.into();
        self
    }

    pub fn tenant(mut self, tenant: impl Into<String>) -> Self {
        self.entry.tenant = tenant.into();
        self
    }

    pub fn shard(mut self, shard: u32) -> Self {
        self.entry.shard = shard;
        self
    }

    pub fn level(mut self, level: u32) -> Self {
        self.entry.level = level;
        self
    }

    /// Tenant, shard and level in one go.
    pub fn key(self, tenant: &str, shard: u32, level: u32) -> Self {
        self.tenant(tenant).shard(shard).level(level)
    }

    pub fn create(self) -> BlockEntry {
        self.entry
    }

    /// Entries with consecutive indexes starting at the configured one, each
    /// id being its index.
    pub fn create_list(self, count: usize) -> Vec<BlockEntry> {
        let start = self.entry.index;
        (0..count as u64)
            .map(|i| BlockEntry {
                index: start + i,
                id: (start + i).to_string(),
                ..self.entry.clone()
            })
            .collect()
    }

    /// One entry per `(tenant, shard, level)`, numbered from zero in the given
    /// order: index `i` gets id `"i"`.
    pub fn sequence(keys: &[(&str, u32, u32)]) -> Vec<BlockEntry> {
        Self::sequence_from(0, keys)
    }

    pub fn sequence_from(start: u64, keys: &[(&str, u32, u32)]) -> Vec<BlockEntry> {
        keys.iter()
            .zip(start..)
            .map(|(&(tenant, shard, level), i)| {
                Self::new()
                    .index(i)
                    .id(i.to_string())
                    .key(tenant, shard, level)
                    .create()
            })
            .collect()
    }
}
