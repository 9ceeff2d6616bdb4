use crate::engine::compaction::batch::{BatchId, Batches, Detach, ListEnds, Membership};
use crate::engine::compaction::block_entry::QueuedBlock;
use crate::engine::compaction::staged_blocks::StagedId;

fn global_order(batches: &Batches) -> Vec<BatchId> {
    std::iter::successors(batches.head(), |&id| batches.get(id).next_global()).collect()
}

fn local_order(batches: &Batches, local: &ListEnds) -> Vec<BatchId> {
    std::iter::successors(local.head, |&id| batches.get(id).next_local()).collect()
}

#[test]
fn open_batch_is_not_linked() {
    let mut batches = Batches::new();
    let id = batches.open(StagedId(0));

    assert_eq!(batches.get(id).membership(), Membership::Staging);
    assert_eq!(batches.head(), None);
    assert_eq!(batches.linked(), 0);
}

#[test]
fn link_appends_to_global_and_local_lists() {
    let mut batches = Batches::new();
    let mut a = ListEnds::default();
    let mut b = ListEnds::default();

    let a1 = batches.open(StagedId(0));
    let b1 = batches.open(StagedId(1));
    let a2 = batches.open(StagedId(0));
    batches.link(a1, &mut a);
    batches.link(b1, &mut b);
    batches.link(a2, &mut a);

    assert_eq!(global_order(&batches), vec![a1, b1, a2]);
    assert_eq!(local_order(&batches, &a), vec![a1, a2]);
    assert_eq!(local_order(&batches, &b), vec![b1]);
    assert_eq!(batches.tail(), Some(a2));
    assert_eq!(batches.linked(), 3);
}

#[test]
fn detach_from_the_middle_keeps_both_lists_intact() {
    let mut batches = Batches::new();
    let mut a = ListEnds::default();
    let mut b = ListEnds::default();

    let a1 = batches.open(StagedId(0));
    let b1 = batches.open(StagedId(1));
    let a2 = batches.open(StagedId(0));
    let a3 = batches.open(StagedId(0));
    batches.link(a1, &mut a);
    batches.link(b1, &mut b);
    batches.link(a2, &mut a);
    batches.link(a3, &mut a);

    assert_eq!(batches.detach(a2, &mut a), Detach::Detached);
    assert_eq!(global_order(&batches), vec![a1, b1, a3]);
    assert_eq!(local_order(&batches, &a), vec![a1, a3]);
    assert_eq!(batches.get(a2).membership(), Membership::Detached);

    assert_eq!(batches.detach(a1, &mut a), Detach::Detached);
    assert_eq!(batches.detach(b1, &mut b), Detach::Detached);
    assert_eq!(global_order(&batches), vec![a3]);
    assert_eq!(b, ListEnds::default());
    assert_eq!(batches.linked(), 1);
}

#[test]
fn detach_reports_batches_that_were_never_linked() {
    let mut batches = Batches::new();
    let mut a = ListEnds::default();
    let flushed = batches.open(StagedId(0));
    batches.link(flushed, &mut a);
    let open = batches.open(StagedId(0));

    // The open batch has no neighbours, like a single-element list head, but
    // must not be mistaken for one.
    assert_eq!(batches.detach(open, &mut a), Detach::NotLinked);
    assert_eq!(global_order(&batches), vec![flushed]);
    assert_eq!(local_order(&batches, &a), vec![flushed]);

    assert_eq!(batches.detach(flushed, &mut a), Detach::Detached);
    assert_eq!(batches.detach(flushed, &mut a), Detach::NotLinked);
}

#[test]
#[should_panic(expected = "flush a compaction queue batch twice")]
fn linking_twice_is_a_bug() {
    let mut batches = Batches::new();
    let mut a = ListEnds::default();
    let id = batches.open(StagedId(0));
    batches.link(id, &mut a);
    batches.link(id, &mut a);
}

#[test]
#[should_panic(expected = "still in the compaction queue")]
fn releasing_a_linked_batch_is_a_bug() {
    let mut batches = Batches::new();
    let mut a = ListEnds::default();
    let id = batches.open(StagedId(0));
    batches.link(id, &mut a);
    batches.release(id);
}

#[test]
fn released_slots_are_reused() {
    let mut batches = Batches::new();
    let mut a = ListEnds::default();
    let first = batches.open(StagedId(0));
    batches.get_mut(first).blocks.push(Some(QueuedBlock {
        id: "x".to_string(),
        index: 1,
    }));
    batches.get_mut(first).size = 1;
    batches.link(first, &mut a);
    assert_eq!(batches.detach(first, &mut a), Detach::Detached);
    batches.release(first);

    let second = batches.open(StagedId(3));
    assert_eq!(second, first);
    let batch = batches.get(second);
    assert_eq!(batch.owner, StagedId(3));
    assert_eq!(batch.size, 0);
    assert_eq!(batch.block_ids().count(), 0);
    assert_eq!(batch.membership(), Membership::Staging);
}
