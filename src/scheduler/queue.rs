//! Shared in-memory queue of pending job indices.
//!
//! The queue is populated once at startup with every index in the batch
//! range and drained concurrently by the workers. The one correctness-
//! critical operation is [`TaskQueue::take_next`]: the empty check and the
//! removal happen under a single lock, so each index is handed to exactly
//! one caller and none is ever lost.

use std::ops::RangeInclusive;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Shared pool of not-yet-claimed job indices.
///
/// Safe to drain from any number of workers concurrently. Exhaustion is a
/// normal outcome, reported as `None` rather than an error, and repeats
/// immediately on every subsequent call.
pub struct TaskQueue {
    pending: Mutex<Vec<u32>>,
}

impl TaskQueue {
    /// Creates a queue holding every index in the inclusive range.
    ///
    /// The queue is never refilled; it only shrinks as workers claim
    /// entries.
    pub fn new(range: RangeInclusive<u32>) -> Self {
        Self {
            pending: Mutex::new(range.collect()),
        }
    }

    /// Atomically claims one pending index, or `None` once the queue is
    /// exhausted.
    ///
    /// Removal order is unspecified. The implementation pops from the back,
    /// so indices tend to come out high-to-low under low contention, but
    /// callers must not rely on that.
    pub fn take_next(&self) -> Option<u32> {
        self.lock().pop()
    }

    /// Number of indices still unclaimed.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// Whether every index has been claimed.
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    // The guarded data is plain integers, so a lock poisoned by a panicking
    // worker leaves nothing inconsistent; recover the inner value.
    fn lock(&self) -> MutexGuard<'_, Vec<u32>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    use super::*;

    #[test]
    fn test_new_queue_holds_full_range() {
        let queue = TaskQueue::new(1..=19);
        assert_eq!(queue.len(), 19);
        assert!(!queue.is_empty());
    }

    #[test]
    fn test_take_next_delivers_each_index_once() {
        let queue = TaskQueue::new(1..=19);

        let mut seen = HashSet::new();
        while let Some(index) = queue.take_next() {
            assert!(seen.insert(index), "index {} delivered twice", index);
        }

        assert_eq!(seen.len(), 19);
        for i in 1..=19 {
            assert!(seen.contains(&i), "index {} never delivered", i);
        }
    }

    #[test]
    fn test_exhausted_queue_repeats_none_without_blocking() {
        let queue = TaskQueue::new(1..=3);
        while queue.take_next().is_some() {}

        assert!(queue.is_empty());
        assert_eq!(queue.take_next(), None);
        assert_eq!(queue.take_next(), None);
    }

    #[test]
    fn test_pops_from_back_under_no_contention() {
        // Not a contract, but the single-consumer order is observable and
        // worth pinning so accidental changes are noticed.
        let queue = TaskQueue::new(1..=5);
        assert_eq!(queue.take_next(), Some(5));
        assert_eq!(queue.take_next(), Some(4));
    }

    #[test]
    fn test_empty_range_starts_exhausted() {
        #[allow(clippy::reversed_empty_ranges)]
        let queue = TaskQueue::new(5..=4);
        assert!(queue.is_empty());
        assert_eq!(queue.take_next(), None);
    }

    #[test]
    fn test_concurrent_takes_are_exactly_once() {
        let queue = Arc::new(TaskQueue::new(1..=1000));

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut claimed = Vec::new();
                    while let Some(index) = queue.take_next() {
                        claimed.push(index);
                    }
                    claimed
                })
            })
            .collect();

        let mut all: Vec<u32> = handles
            .into_iter()
            .flat_map(|h| h.join().expect("worker thread panicked"))
            .collect();
        all.sort_unstable();

        assert_eq!(all, (1..=1000).collect::<Vec<u32>>());
        assert!(queue.is_empty());
    }
}
