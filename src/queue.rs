//! Multi-policy priority queue.
//!
//! [`PolicyQueue`] is an unordered multiset of `(item, priority, timestamp)`
//! entries that can be drained by four different orderings over the *same*
//! backing set:
//!
//! | policy                      | removes                  |
//! |-----------------------------|--------------------------|
//! | [`DequeuePolicy::Highest`]  | maximal priority         |
//! | [`DequeuePolicy::Lowest`]   | minimal priority         |
//! | [`DequeuePolicy::Oldest`]   | minimal timestamp        |
//! | [`DequeuePolicy::Newest`]   | maximal timestamp        |
//!
//! Removing an entry through one policy removes it from consideration by the
//! others. Every dequeue is an O(n) scan; the queue only ever holds the
//! candidate pool of a single round, so n stays small.
//!
//! Ties resolve to the first matching entry in insertion order, which keeps
//! results stable for identical inputs.
//!
//! ```rust
//! use tunemetrics::queue::PolicyQueue;
//!
//! let mut queue = PolicyQueue::new();
//! queue.enqueue_at("b-side", 12, 1_000);
//! queue.enqueue_at("single", 80, 2_000);
//!
//! assert_eq!(queue.dequeue_highest_priority(), Some("single"));
//! assert_eq!(queue.dequeue_newest(), Some("b-side"));
//! assert_eq!(queue.dequeue_oldest(), None);
//! ```

use std::cmp::Ordering;

/// One of the four removal orderings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DequeuePolicy {
    Highest,
    Lowest,
    Oldest,
    Newest,
}

impl DequeuePolicy {
    /// All policies, in declaration order.
    pub const ALL: [DequeuePolicy; 4] = [
        DequeuePolicy::Highest,
        DequeuePolicy::Lowest,
        DequeuePolicy::Oldest,
        DequeuePolicy::Newest,
    ];
}

#[derive(Debug, Clone)]
struct QueueEntry<T> {
    item: T,
    priority: i64,
    timestamp: i64,
}

/// Priority queue supporting four removal policies over one entry set.
#[derive(Debug, Clone)]
pub struct PolicyQueue<T> {
    entries: Vec<QueueEntry<T>>,
}

impl<T> PolicyQueue<T> {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Add an item stamped with the current time (Unix millis).
    pub fn enqueue(&mut self, item: T, priority: i64) {
        self.enqueue_at(item, priority, chrono::Utc::now().timestamp_millis());
    }

    /// Add an item with an explicit timestamp.
    pub fn enqueue_at(&mut self, item: T, priority: i64, timestamp: i64) {
        self.entries.push(QueueEntry {
            item,
            priority,
            timestamp,
        });
    }

    pub fn dequeue_highest_priority(&mut self) -> Option<T> {
        self.take_extreme(|e| e.priority, Ordering::Greater)
    }

    pub fn dequeue_lowest_priority(&mut self) -> Option<T> {
        self.take_extreme(|e| e.priority, Ordering::Less)
    }

    pub fn dequeue_oldest(&mut self) -> Option<T> {
        self.take_extreme(|e| e.timestamp, Ordering::Less)
    }

    pub fn dequeue_newest(&mut self) -> Option<T> {
        self.take_extreme(|e| e.timestamp, Ordering::Greater)
    }

    /// Remove one item according to `policy`.
    pub fn dequeue(&mut self, policy: DequeuePolicy) -> Option<T> {
        match policy {
            DequeuePolicy::Highest => self.dequeue_highest_priority(),
            DequeuePolicy::Lowest => self.dequeue_lowest_priority(),
            DequeuePolicy::Oldest => self.dequeue_oldest(),
            DequeuePolicy::Newest => self.dequeue_newest(),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drain the remaining items in insertion order.
    pub fn drain(&mut self) -> impl Iterator<Item = T> + '_ {
        self.entries.drain(..).map(|e| e.item)
    }

    /// Remove the first entry whose key beats every other entry in the
    /// `wanted` direction. Only a strictly better key replaces the current
    /// pick, so ties stay with the earliest entry.
    fn take_extreme<F>(&mut self, key: F, wanted: Ordering) -> Option<T>
    where
        F: Fn(&QueueEntry<T>) -> i64,
    {
        let mut best: Option<(usize, i64)> = None;
        for (idx, entry) in self.entries.iter().enumerate() {
            let k = key(entry);
            match best {
                Some((_, best_key)) if k.cmp(&best_key) != wanted => {}
                _ => best = Some((idx, k)),
            }
        }
        best.map(|(idx, _)| self.entries.remove(idx).item)
    }
}

impl<T> Default for PolicyQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Extend<(T, i64, i64)> for PolicyQueue<T> {
    fn extend<I: IntoIterator<Item = (T, i64, i64)>>(&mut self, iter: I) {
        for (item, priority, timestamp) in iter {
            self.enqueue_at(item, priority, timestamp);
        }
    }
}
