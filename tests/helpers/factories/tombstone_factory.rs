use crate::engine::tombstones::Tombstone;

pub struct TombstoneFactory {
    tombstone: Tombstone,
}

impl TombstoneFactory {
    pub fn new() -> Self {
        Self {
            tombstone: Tombstone {
                name: "tombstone-0".to_string(),
                tenant: "A".to_string(),
                shard: 1,
                compaction_level: 0,
                blocks: vec!["a".to_string(), "b".to_string()],
            },
        }
    }

    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.tombstone.name = name.into();
        self
    }

    pub fn blocks(mut self, blocks: &[&str]) -> Self {
        self.tombstone.blocks = blocks.iter().map(|b| b.to_string()).collect();
        self
    }

    pub fn create(self) -> Tombstone {
        self.tombstone
    }

    pub fn create_list(self, count: usize) -> Vec<Tombstone> {
        (0..count)
            .map(|i| Tombstone {
                name: format!("tombstone-{i}"),
                ..self.tombstone.clone()
            })
            .collect()
    }
}
