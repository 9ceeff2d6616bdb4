use super::block_entry::QueuedBlock;
use super::staged_blocks::StagedId;

/// Initial slot capacity of a batch. Batches grow past it if the level allows
/// more blocks per batch.
pub(crate) const DEFAULT_BLOCK_BATCH_SIZE: usize = 20;

/// Stable handle of a batch within a level's arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct BatchId(u32);

/// Where a batch is in its lifecycle. Only `Linked` batches are reachable
/// from the global and local lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Membership {
    /// Open batch still accepting blocks.
    Staging,
    Linked,
    Detached,
}

/// Result of taking a batch out of the lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use]
pub(crate) enum Detach {
    Detached,
    /// The batch was never flushed (or has already been detached).
    NotLinked,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Links {
    prev: Option<BatchId>,
    next: Option<BatchId>,
}

/// Head and tail of a doubly linked batch list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct ListEnds {
    pub(crate) head: Option<BatchId>,
    pub(crate) tail: Option<BatchId>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    /// All batches of the level, in arrival order.
    Global,
    /// Batches sharing one compaction key, in arrival order.
    Local,
}

#[derive(Debug)]
pub(crate) struct Batch {
    pub(crate) owner: StagedId,
    /// Deleted blocks leave an empty slot behind so that references to the
    /// remaining slots stay valid.
    pub(crate) blocks: Vec<Option<QueuedBlock>>,
    /// Number of occupied slots.
    pub(crate) size: u32,
    /// Raft time of the first block, ns.
    pub(crate) created_at: i64,
    membership: Membership,
    global: Links,
    local: Links,
}

impl Batch {
    fn new(owner: StagedId) -> Self {
        Self {
            owner,
            blocks: Vec::with_capacity(DEFAULT_BLOCK_BATCH_SIZE),
            size: 0,
            created_at: 0,
            membership: Membership::Staging,
            global: Links::default(),
            local: Links::default(),
        }
    }

    #[cfg(test)]
    pub(crate) fn membership(&self) -> Membership {
        self.membership
    }

    pub(crate) fn next_global(&self) -> Option<BatchId> {
        self.global.next
    }

    pub(crate) fn next_local(&self) -> Option<BatchId> {
        self.local.next
    }

    #[cfg(test)]
    pub(crate) fn block_ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.iter().flatten().map(|b| b.id.as_str())
    }

    fn links(&self, chain: Chain) -> &Links {
        match chain {
            Chain::Global => &self.global,
            Chain::Local => &self.local,
        }
    }

    fn links_mut(&mut self, chain: Chain) -> &mut Links {
        match chain {
            Chain::Global => &mut self.global,
            Chain::Local => &mut self.local,
        }
    }
}

/// Arena of the batches of one level plus the level's global list.
#[derive(Debug, Default)]
pub(crate) struct Batches {
    slots: Vec<Option<Batch>>,
    free: Vec<u32>,
    global: ListEnds,
    linked: usize,
}

impl Batches {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Allocates an empty open batch.
    pub(crate) fn open(&mut self, owner: StagedId) -> BatchId {
        let batch = Batch::new(owner);
        match self.free.pop() {
            Some(slot) => {
                self.slots[slot as usize] = Some(batch);
                BatchId(slot)
            }
            None => {
                self.slots.push(Some(batch));
                BatchId((self.slots.len() - 1) as u32)
            }
        }
    }

    /// Frees the slot of a batch that is no longer referenced.
    pub(crate) fn release(&mut self, id: BatchId) {
        let batch = self.slots[id.0 as usize]
            .take()
            .unwrap_or_else(|| panic!("bug: release of a dangling batch handle {id:?}"));
        assert!(
            batch.membership != Membership::Linked,
            "bug: attempt to release a batch that is still in the compaction queue"
        );
        self.free.push(id.0);
    }

    pub(crate) fn get(&self, id: BatchId) -> &Batch {
        self.slots
            .get(id.0 as usize)
            .and_then(Option::as_ref)
            .unwrap_or_else(|| panic!("bug: dangling batch handle {id:?}"))
    }

    pub(crate) fn get_mut(&mut self, id: BatchId) -> &mut Batch {
        self.slots
            .get_mut(id.0 as usize)
            .and_then(Option::as_mut)
            .unwrap_or_else(|| panic!("bug: dangling batch handle {id:?}"))
    }

    pub(crate) fn head(&self) -> Option<BatchId> {
        self.global.head
    }

    #[cfg(test)]
    pub(crate) fn tail(&self) -> Option<BatchId> {
        self.global.tail
    }

    /// Number of batches reachable from the global list.
    pub(crate) fn linked(&self) -> usize {
        self.linked
    }

    /// Appends an open batch to the global list and to the key's local list.
    /// A batch can be linked only once.
    pub(crate) fn link(&mut self, id: BatchId, local: &mut ListEnds) {
        let batch = self.get_mut(id);
        if batch.membership != Membership::Staging {
            panic!("bug: attempt to flush a compaction queue batch twice");
        }
        batch.membership = Membership::Linked;

        let mut global = self.global;
        self.append(id, Chain::Global, &mut global);
        self.global = global;
        self.append(id, Chain::Local, local);
        self.linked += 1;
    }

    /// Takes a batch out of both lists. Membership is decided by the batch
    /// state, never by the absence of neighbours: an open batch has no
    /// neighbours either, and must not be mistaken for a list head.
    pub(crate) fn detach(&mut self, id: BatchId, local: &mut ListEnds) -> Detach {
        let batch = self.get_mut(id);
        if batch.membership != Membership::Linked {
            return Detach::NotLinked;
        }
        batch.membership = Membership::Detached;

        let mut global = self.global;
        self.unlink(id, Chain::Global, &mut global);
        self.global = global;
        self.unlink(id, Chain::Local, local);
        self.linked -= 1;
        Detach::Detached
    }

    fn append(&mut self, id: BatchId, chain: Chain, ends: &mut ListEnds) {
        match ends.tail {
            Some(tail) => {
                self.get_mut(tail).links_mut(chain).next = Some(id);
                self.get_mut(id).links_mut(chain).prev = Some(tail);
            }
            None => {
                assert!(
                    ends.head.is_none(),
                    "bug: compaction queue has a head but no tail"
                );
                ends.head = Some(id);
            }
        }
        ends.tail = Some(id);
    }

    fn unlink(&mut self, id: BatchId, chain: Chain, ends: &mut ListEnds) {
        let Links { prev, next } = *self.get(id).links(chain);
        match prev {
            Some(prev) => self.get_mut(prev).links_mut(chain).next = next,
            None => {
                assert_eq!(
                    ends.head,
                    Some(id),
                    "bug: attempt to detach a batch that is not the compaction queue head"
                );
                ends.head = next;
            }
        }
        match next {
            Some(next) => self.get_mut(next).links_mut(chain).prev = prev,
            None => {
                assert_eq!(
                    ends.tail,
                    Some(id),
                    "bug: attempt to detach a batch that is not the compaction queue tail"
                );
                ends.tail = prev;
            }
        }
        *self.get_mut(id).links_mut(chain) = Links::default();
    }
}
