//! Tests for the multi-policy priority queue.

use tunemetrics::queue::{DequeuePolicy, PolicyQueue};

fn sample() -> PolicyQueue<&'static str> {
    let mut queue = PolicyQueue::new();
    queue.enqueue_at("p3", 3, 30);
    queue.enqueue_at("p1a", 1, 10);
    queue.enqueue_at("p4", 4, 50);
    queue.enqueue_at("p1b", 1, 20);
    queue.enqueue_at("p5", 5, 40);
    queue
}

#[test]
fn highest_priority_drains_descending() {
    let mut queue = sample();
    let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue_highest_priority()).collect();
    assert_eq!(drained, vec!["p5", "p4", "p3", "p1a", "p1b"]);
    assert!(queue.is_empty());
}

#[test]
fn each_dequeue_removes_exactly_one_entry() {
    let mut queue = PolicyQueue::new();
    for priority in [3, 1, 4, 1, 5] {
        queue.enqueue(priority, priority);
    }
    assert_eq!(queue.len(), 5);

    assert_eq!(queue.dequeue_highest_priority(), Some(5));
    assert_eq!(queue.len(), 4);
    assert_eq!(queue.dequeue_lowest_priority(), Some(1));
    assert_eq!(queue.len(), 3);
    assert_eq!(queue.dequeue_highest_priority(), Some(4));
    assert_eq!(queue.len(), 2);
    assert_eq!(queue.dequeue_lowest_priority(), Some(1));
    assert_eq!(queue.len(), 1);
}

#[test]
fn lowest_priority_drains_ascending() {
    let mut queue = sample();
    let drained: Vec<_> = std::iter::from_fn(|| queue.dequeue_lowest_priority()).collect();
    assert_eq!(drained, vec!["p1a", "p1b", "p3", "p4", "p5"]);
}

#[test]
fn oldest_and_newest_follow_timestamps() {
    let mut queue = sample();
    assert_eq!(queue.dequeue_oldest(), Some("p1a"));
    assert_eq!(queue.dequeue_newest(), Some("p4"));
    assert_eq!(queue.dequeue_oldest(), Some("p1b"));
    assert_eq!(queue.dequeue_newest(), Some("p5"));
    assert_eq!(queue.dequeue_oldest(), Some("p3"));
    assert_eq!(queue.dequeue_newest(), None);
}

#[test]
fn policies_share_one_entry_set() {
    let mut queue = sample();
    assert_eq!(queue.dequeue(DequeuePolicy::Highest), Some("p5"));
    assert_eq!(queue.dequeue(DequeuePolicy::Newest), Some("p4"));
    assert_eq!(queue.dequeue(DequeuePolicy::Lowest), Some("p1a"));
    assert_eq!(queue.dequeue(DequeuePolicy::Oldest), Some("p1b"));
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.dequeue(DequeuePolicy::Highest), Some("p3"));
}

#[test]
fn empty_queue_yields_none_for_every_policy() {
    let mut queue: PolicyQueue<u8> = PolicyQueue::default();
    for policy in DequeuePolicy::ALL {
        assert_eq!(queue.dequeue(policy), None);
    }
    assert_eq!(queue.len(), 0);
}

#[test]
fn negative_priorities_and_timestamps_are_ordered() {
    let mut queue = PolicyQueue::new();
    queue.enqueue_at('a', -10, -5);
    queue.enqueue_at('b', 0, 0);
    queue.enqueue_at('c', -20, 5);

    assert_eq!(queue.dequeue_lowest_priority(), Some('c'));
    assert_eq!(queue.dequeue_oldest(), Some('a'));
    assert_eq!(queue.dequeue_highest_priority(), Some('b'));
}

#[test]
fn drain_returns_remaining_in_insertion_order() {
    let mut queue = sample();
    queue.dequeue_highest_priority();
    let rest: Vec<_> = queue.drain().collect();
    assert_eq!(rest, vec!["p3", "p1a", "p4", "p1b"]);
    assert!(queue.is_empty());
}
