use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Deletion marker for blocks that have been replaced by compaction output.
/// Markers are attached to compaction jobs so the worker removes the
/// physical objects once they are no longer referenced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tombstone {
    pub name: String,
    pub tenant: String,
    pub shard: u32,
    pub compaction_level: u32,
    pub blocks: Vec<String>,
}

/// Supplier of pending tombstones.
pub trait Tombstones: Send + Sync {
    /// Tombstones created strictly before `before` (raft time, ns), oldest first.
    /// The order must be identical on every replica.
    fn list_tombstones(&self, before: i64) -> Box<dyn Iterator<Item = Tombstone> + '_>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoTombstones;

impl Tombstones for NoTombstones {
    fn list_tombstones(&self, _before: i64) -> Box<dyn Iterator<Item = Tombstone> + '_> {
        Box::new(std::iter::empty())
    }
}

/// In-memory tombstone queue ordered by creation time, then name.
#[derive(Debug, Default)]
pub struct MemoryTombstones {
    entries: BTreeMap<(i64, String), Tombstone>,
}

impl MemoryTombstones {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, created_at: i64, tombstone: Tombstone) {
        self.entries
            .insert((created_at, tombstone.name.clone()), tombstone);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Tombstones for MemoryTombstones {
    fn list_tombstones(&self, before: i64) -> Box<dyn Iterator<Item = Tombstone> + '_> {
        Box::new(
            self.entries
                .range(..(before, String::new()))
                .map(|(_, tombstone)| tombstone.clone()),
        )
    }
}
