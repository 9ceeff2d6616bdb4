use std::sync::Arc;
use std::time::Duration;

use crate::engine::compaction::block_entry::{CompactionKey, QueuedBlock};
use crate::engine::compaction::block_queue::BlockQueue;
use crate::engine::compaction::metrics::NoopObserver;
use crate::shared::config::LevelConfig;

const MS: i64 = 1_000_000;

fn block(id: &str) -> QueuedBlock {
    QueuedBlock {
        id: id.to_string(),
        index: id.parse().unwrap_or(0),
    }
}

fn queue(max_blocks: u32, max_age: Duration) -> BlockQueue {
    BlockQueue::new(0, LevelConfig::new(max_blocks, max_age), Arc::new(NoopObserver))
}

#[test]
fn batches_are_ordered_by_arrival_across_keys() {
    let mut queue = queue(2, Duration::ZERO);
    let a = CompactionKey::new("A", 1, 0);
    let b = CompactionKey::new("B", 2, 0);

    for (key, id) in [(&a, "0"), (&b, "1"), (&b, "2"), (&a, "3"), (&a, "4")] {
        assert!(queue.push(key, block(id), 0));
    }

    assert_eq!(
        queue.batch_contents(),
        vec![
            (b.clone(), vec!["1".to_string(), "2".to_string()]),
            (a.clone(), vec!["0".to_string(), "3".to_string()]),
        ]
    );
    let stats = queue.stats();
    assert_eq!(stats.blocks, 5);
    assert_eq!(stats.batches, 2);
    assert_eq!(stats.queues, 2);
    assert_eq!(queue.staged(&a).map(|s| s.stats.blocks), Some(3));
    assert_eq!(queue.level(), 0);
    assert_eq!(queue.limits().max_blocks, 2);
}

#[test]
fn duplicate_push_is_rejected() {
    let mut queue = queue(3, Duration::ZERO);
    let a = CompactionKey::new("A", 1, 0);

    assert!(queue.push(&a, block("0"), 0));
    assert!(!queue.push(&a, block("0"), 0));

    assert_eq!(queue.stats().blocks, 1);
    assert_eq!(queue.staged(&a).map(|s| s.stats.rejected), Some(1));
}

#[test]
fn idle_key_is_flushed_by_pushes_to_other_keys() {
    let mut queue = queue(5, Duration::from_millis(5));
    let a = CompactionKey::new("A", 1, 0);
    let b = CompactionKey::new("B", 0, 0);

    assert!(queue.push(&a, block("1"), 10 * MS));
    assert!(queue.push(&b, block("2"), 20 * MS));
    assert_eq!(queue.batch_contents(), vec![(a.clone(), vec!["1".to_string()])]);

    assert!(queue.push(&a, block("3"), 30 * MS));
    assert_eq!(
        queue.batch_contents(),
        vec![
            (a.clone(), vec!["1".to_string()]),
            (b.clone(), vec!["2".to_string()]),
        ]
    );
    // Only one staged batch is flushed per push.
    assert_eq!(queue.staged(&a).map(|s| s.stats.batches), Some(1));
}

#[test]
fn empty_open_batch_only_refreshes_its_timestamp() {
    let mut queue = queue(1, Duration::from_millis(5));
    let a = CompactionKey::new("A", 1, 0);
    let b = CompactionKey::new("B", 0, 0);

    // Full on the first block: the open batch of A is empty from here on.
    assert!(queue.push(&a, block("1"), 10 * MS));
    assert!(queue.push(&b, block("2"), 20 * MS));

    assert_eq!(queue.stats().batches, 2);
    assert_eq!(
        queue.update_order(),
        vec![(a.clone(), 20 * MS), (b.clone(), 20 * MS)]
    );
    assert_eq!(queue.updates().len(), 2);
}

#[test]
fn deleting_last_block_removes_the_staged_queue() {
    let mut queue = queue(2, Duration::ZERO);
    let a = CompactionKey::new("A", 1, 0);
    let b = CompactionKey::new("B", 2, 0);
    for (key, id) in [(&a, "0"), (&a, "1"), (&b, "2")] {
        assert!(queue.push(key, block(id), 0));
    }

    assert_eq!(queue.delete(&a, "0"), Some(block("0")));
    assert!(queue.staged(&a).is_some());
    assert_eq!(queue.delete(&a, "1"), Some(block("1")));

    assert!(queue.staged(&a).is_none());
    assert_eq!(queue.head(), None);
    assert_eq!(queue.tail(), None);
    assert_eq!(queue.staged_keys().collect::<Vec<_>>(), vec![&b]);
    assert_eq!(queue.update_order(), vec![(b.clone(), 0)]);
    assert_eq!(queue.stats().blocks, 1);
    assert_eq!(queue.stats().queues, 1);
}

#[test]
fn deleting_from_unknown_key_is_a_no_op() {
    let mut queue = queue(2, Duration::ZERO);
    let a = CompactionKey::new("A", 1, 0);
    assert!(queue.push(&a, block("0"), 0));

    assert_eq!(queue.delete(&CompactionKey::new("Z", 1, 0), "0"), None);
    assert_eq!(queue.delete(&a, "9"), None);

    assert_eq!(queue.stats().blocks, 1);
    assert_eq!(queue.staged(&a).map(|s| s.stats.missed), Some(1));
}

#[test]
fn deleted_key_can_be_queued_again() {
    let mut queue = queue(2, Duration::ZERO);
    let a = CompactionKey::new("A", 1, 0);
    assert!(queue.push(&a, block("0"), 0));
    assert!(queue.delete(&a, "0").is_some());
    assert!(queue.staged(&a).is_none());

    assert!(queue.push(&a, block("0"), 1));
    assert!(queue.push(&a, block("1"), 2));
    assert_eq!(
        queue.batch_contents(),
        vec![(a.clone(), vec!["0".to_string(), "1".to_string()])]
    );
}

#[test]
fn clear_drops_everything() {
    let mut queue = queue(2, Duration::ZERO);
    let a = CompactionKey::new("A", 1, 0);
    for id in ["0", "1", "2"] {
        assert!(queue.push(&a, block(id), 0));
    }

    queue.clear();

    assert_eq!(queue.head(), None);
    assert!(queue.staged(&a).is_none());
    assert!(queue.updates().is_empty());
    assert_eq!(queue.stats().blocks, 0);
}

#[test]
fn random_pushes_and_deletes_keep_lists_consistent() {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::collections::{BTreeSet, HashMap};

    let mut rng = StdRng::seed_from_u64(42);
    let mut queue = queue(4, Duration::from_millis(50));
    let keys: Vec<_> = (0..5).map(|i| CompactionKey::new(format!("T{i}"), i, 0)).collect();
    let mut queued: HashMap<CompactionKey, BTreeSet<String>> = HashMap::new();
    let mut next_id = 0u64;
    let mut now = 0i64;

    for _ in 0..3_000 {
        now += rng.gen_range(0..5) * MS;
        let key = &keys[rng.gen_range(0..keys.len())];
        let blocks = queued.entry(key.clone()).or_default();
        if blocks.is_empty() || rng.gen_bool(0.6) {
            let id = next_id.to_string();
            next_id += 1;
            assert!(queue.push(key, block(&id), now));
            blocks.insert(id);
        } else {
            let victim = blocks.iter().nth(rng.gen_range(0..blocks.len())).cloned().unwrap();
            assert_eq!(queue.delete(key, &victim).map(|b| b.id), Some(victim.clone()));
            blocks.remove(&victim);
        }

        let expected: usize = queued.values().map(BTreeSet::len).sum();
        assert_eq!(queue.stats().blocks as usize, expected);
        assert_eq!(
            queue.stats().queues as usize,
            queued.values().filter(|b| !b.is_empty()).count()
        );
        // Every linked batch holds at least one block and belongs to a live key.
        for (id, batch) in queue.batches() {
            assert!(batch.size > 0);
            let key = queue.batch_key(id);
            for block in batch.block_ids() {
                assert!(queued[key].contains(block));
            }
        }
    }
}

#[test]
fn drained_key_leaves_the_level_to_the_next_batch() {
    let mut queue = queue(2, Duration::ZERO);
    let x = CompactionKey::new("X", 1, 0);
    let y = CompactionKey::new("Y", 1, 0);

    assert!(queue.push(&x, block("0"), 0));
    assert!(queue.push(&x, block("1"), 0));
    assert!(queue.head().is_some());
    assert!(queue.delete(&x, "0").is_some());
    assert!(queue.delete(&x, "1").is_some());
    assert_eq!(queue.head(), None);
    assert_eq!(queue.tail(), None);

    assert!(queue.push(&y, block("2"), 0));
    assert!(queue.push(&y, block("3"), 0));

    let (only, _) = queue.batches().next().unwrap();
    assert_eq!(queue.head(), Some(only));
    assert_eq!(queue.tail(), Some(only));
    assert_eq!(queue.batch_key(only), &y);
    assert_eq!(
        queue.batch_contents(),
        vec![(y.clone(), vec!["2".to_string(), "3".to_string()])]
    );
    assert!(queue.staged(&x).is_none());
    assert_eq!(queue.get(&y, "3").map(|b| b.index), Some(3));
    assert!(queue.get(&x, "0").is_none());
}
