use std::collections::HashMap;

use super::staged_blocks::StagedId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct HeapEntry {
    id: StagedId,
    updated_at: i64,
}

impl HeapEntry {
    /// Ties on the timestamp are broken by id, i.e. by staged queue creation
    /// order within the level.
    fn key(&self) -> (i64, StagedId) {
        (self.updated_at, self.id)
    }
}

/// Min-heap of staged queues ordered by their last update time. Positions
/// are tracked in a side map keyed by the staged id, so arbitrary entries
/// can be updated or removed in O(log n).
#[derive(Debug, Default)]
pub(crate) struct UpdateHeap {
    entries: Vec<HeapEntry>,
    positions: HashMap<StagedId, usize>,
}

impl UpdateHeap {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[cfg(test)]
    pub(crate) fn contains(&self, id: StagedId) -> bool {
        self.positions.contains_key(&id)
    }

    /// The least recently updated queue.
    pub(crate) fn peek(&self) -> Option<(StagedId, i64)> {
        self.entries.first().map(|e| (e.id, e.updated_at))
    }

    #[cfg(test)]
    pub(crate) fn updated_at(&self, id: StagedId) -> Option<i64> {
        self.positions.get(&id).map(|&pos| self.entries[pos].updated_at)
    }

    /// Inserts the id, or moves it if it is already present.
    pub(crate) fn upsert(&mut self, id: StagedId, updated_at: i64) {
        match self.positions.get(&id) {
            Some(&pos) => {
                self.entries[pos].updated_at = updated_at;
                self.fix(pos);
            }
            None => {
                let pos = self.entries.len();
                self.entries.push(HeapEntry { id, updated_at });
                self.positions.insert(id, pos);
                self.sift_up(pos);
            }
        }
    }

    /// Returns the last update time of the removed entry, or `None` if the
    /// id is not in the heap.
    pub(crate) fn remove(&mut self, id: StagedId) -> Option<i64> {
        let pos = self.positions.remove(&id)?;
        let last = self.entries.len() - 1;
        if pos != last {
            self.entries.swap(pos, last);
            self.positions.insert(self.entries[pos].id, pos);
        }
        let removed = self.entries.pop()?;
        if pos < self.entries.len() {
            self.fix(pos);
        }
        Some(removed.updated_at)
    }

    /// Ids in heap order, least recently updated first.
    #[cfg(test)]
    pub(crate) fn ordered(&self) -> Vec<(StagedId, i64)> {
        let mut entries: Vec<_> = self.entries.iter().map(|e| (e.id, e.updated_at)).collect();
        entries.sort_by_key(|&(id, updated_at)| (updated_at, id));
        entries
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
        self.positions.clear();
    }

    fn fix(&mut self, pos: usize) {
        if !self.sift_down(pos) {
            self.sift_up(pos);
        }
    }

    fn sift_up(&mut self, mut pos: usize) {
        while pos > 0 {
            let parent = (pos - 1) / 2;
            if self.entries[pos].key() >= self.entries[parent].key() {
                break;
            }
            self.swap(pos, parent);
            pos = parent;
        }
    }

    /// Returns true if the entry moved.
    fn sift_down(&mut self, start: usize) -> bool {
        let len = self.entries.len();
        let mut pos = start;
        loop {
            let left = 2 * pos + 1;
            if left >= len {
                break;
            }
            let right = left + 1;
            let mut child = left;
            if right < len && self.entries[right].key() < self.entries[left].key() {
                child = right;
            }
            if self.entries[child].key() >= self.entries[pos].key() {
                break;
            }
            self.swap(pos, child);
            pos = child;
        }
        pos != start
    }

    fn swap(&mut self, a: usize, b: usize) {
        self.entries.swap(a, b);
        self.positions.insert(self.entries[a].id, a);
        self.positions.insert(self.entries[b].id, b);
    }
}
