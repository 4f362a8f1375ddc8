//! BlockingPriorityQueue - thread-safe priority queue with blocking pop.
//!
//! Demonstrates the monitor pattern:
//! - `Mutex<T>` for exclusive access to the heap and the closed flag
//! - `Condvar` so `pop` can sleep until a push or a close wakes it
//! - Loop-and-recheck around every wait (spurious and broadcast wakeups)

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, trace};

use crate::error::{QueueError, Result};
use crate::heap::PriorityHeap;
use crate::item::{Item, ItemKey};

/// Internal state of the queue, guarded by one mutex.
#[derive(Debug)]
struct QueueState<T> {
    heap: PriorityHeap<T>,
    closed: bool,
}

impl<T> QueueState<T> {
    fn new() -> Self {
        Self {
            heap: PriorityHeap::new(),
            closed: false,
        }
    }

    fn must_wait(&self) -> bool {
        self.heap.is_empty() && !self.closed
    }
}

/// Thread-safe priority queue whose `pop` blocks while the queue is empty.
///
/// # Lifecycle
///
/// Created open. `close` flips it to closed for good: pushes fail with
/// `QueueError::Closed`, pops keep draining what is left and then return
/// `QueueError::Closed` instead of blocking.
///
/// # Locking
///
/// The lock is held only for O(log n) heap work. `push` wakes one waiter,
/// `close` wakes all of them.
///
/// # Example
///
/// ```
/// use priq_core::{BlockingPriorityQueue, Item};
///
/// let queue = BlockingPriorityQueue::new();
/// queue.push(Item::new("low", 1)).unwrap();
/// queue.push(Item::new("high", 5)).unwrap();
/// queue.push(Item::new("mid", 3)).unwrap();
///
/// assert_eq!(queue.pop().unwrap().value, "high");
/// queue.push(Item::new("urgent", 9)).unwrap();
///
/// queue.close();
/// let rest: Vec<_> = std::iter::from_fn(|| queue.pop().ok()).map(|i| i.value).collect();
/// assert_eq!(rest, vec!["urgent", "mid", "low"]);
/// ```
#[derive(Debug)]
pub struct BlockingPriorityQueue<T> {
    state: Mutex<QueueState<T>>,
    available: Condvar,
}

impl<T> Default for BlockingPriorityQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> BlockingPriorityQueue<T> {
    /// Creates a new, open queue.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(QueueState::new()),
            available: Condvar::new(),
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, QueueState<T>>> {
        self.state
            .lock()
            .map_err(|e| QueueError::LockPoisoned(e.to_string()))
    }

    /// Adds an item and wakes one blocked `pop`.
    ///
    /// Fails with `QueueError::Closed`, leaving the queue untouched, once
    /// the queue has been closed.
    pub fn push(&self, item: Item<T>) -> Result<ItemKey> {
        let mut state = self.lock()?;
        if state.closed {
            return Err(QueueError::Closed);
        }

        let priority = item.priority;
        let key = state.heap.push(item);
        let len = state.heap.len();
        drop(state);

        self.available.notify_one();
        trace!(priority, len, "pushed item");

        Ok(key)
    }

    /// Removes and returns the highest-priority item, blocking while the
    /// queue is empty and open.
    ///
    /// Returns `QueueError::Closed` once the queue is closed and drained.
    pub fn pop(&self) -> Result<Item<T>> {
        let mut state = self.lock()?;

        while state.must_wait() {
            state = self
                .available
                .wait(state)
                .map_err(|e| QueueError::LockPoisoned(e.to_string()))?;
        }

        match state.heap.pop() {
            Some(item) => {
                trace!(priority = item.priority, remaining = state.heap.len(), "popped item");
                Ok(item)
            }
            None => {
                debug!("pop on closed and drained queue");
                Err(QueueError::Closed)
            }
        }
    }

    /// Like `pop`, but gives up after `timeout`.
    ///
    /// Returns `Ok(None)` if nothing arrived in time.
    pub fn pop_timeout(&self, timeout: Duration) -> Result<Option<Item<T>>> {
        let state = self.lock()?;
        let (mut state, _) = self
            .available
            .wait_timeout_while(state, timeout, |s| s.must_wait())
            .map_err(|e| QueueError::LockPoisoned(e.to_string()))?;

        match state.heap.pop() {
            Some(item) => Ok(Some(item)),
            None if state.closed => Err(QueueError::Closed),
            None => Ok(None),
        }
    }

    /// Removes the highest-priority item without blocking.
    ///
    /// Returns `Ok(None)` if the queue is empty but still open.
    pub fn try_pop(&self) -> Result<Option<Item<T>>> {
        let mut state = self.lock()?;
        match state.heap.pop() {
            Some(item) => Ok(Some(item)),
            None if state.closed => Err(QueueError::Closed),
            None => Ok(None),
        }
    }

    /// Changes the priority of a queued item.
    ///
    /// Returns the previous priority, or `QueueError::NotFound` if the item
    /// has already been popped.
    pub fn update(&self, key: ItemKey, priority: i64) -> Result<i64> {
        let mut state = self.lock()?;
        state
            .heap
            .update(key, priority)
            .ok_or(QueueError::NotFound)
    }

    /// Removes a queued item before it is popped.
    pub fn remove(&self, key: ItemKey) -> Result<Item<T>> {
        let mut state = self.lock()?;
        state.heap.remove(key).ok_or(QueueError::NotFound)
    }

    /// Closes the queue and wakes every blocked `pop`.
    ///
    /// Idempotent. A poisoned lock does not stop the close, so waiters
    /// always get released.
    pub fn close(&self) {
        let mut state = match self.state.lock() {
            Ok(state) => state,
            Err(poisoned) => poisoned.into_inner(),
        };

        if state.closed {
            return;
        }
        state.closed = true;
        let remaining = state.heap.len();
        drop(state);

        self.available.notify_all();
        debug!(remaining, "blocking priority queue closed");
    }

    /// Number of queued items (a snapshot under concurrent use).
    pub fn len(&self) -> usize {
        match self.state.lock() {
            Ok(state) => state.heap.len(),
            Err(poisoned) => poisoned.into_inner().heap.len(),
        }
    }

    /// Returns true if no items are queued.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns true once `close` has been called.
    pub fn is_closed(&self) -> bool {
        match self.state.lock() {
            Ok(state) => state.closed,
            Err(poisoned) => poisoned.into_inner().closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::mpsc;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    fn drain<T>(queue: &BlockingPriorityQueue<T>) -> Vec<Item<T>> {
        let mut out = Vec::new();
        while let Ok(Some(item)) = queue.try_pop() {
            out.push(item);
        }
        out
    }

    #[test]
    fn test_push_and_pop_priority_order() {
        let queue = BlockingPriorityQueue::new();
        for p in [3, 7, 1, 10, 5, 6, 2, 9, 8, 4] {
            queue.push(Item::new(p, p)).unwrap();
        }
        assert_eq!(queue.len(), 10);

        let order: Vec<i64> = drain(&queue).into_iter().map(|i| i.priority).collect();
        assert_eq!(order, (1..=10).rev().collect::<Vec<_>>());
        assert!(queue.is_empty());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let queue = BlockingPriorityQueue::new();
        queue.push(Item::new("low", 1)).unwrap();
        queue.push(Item::new("high", 5)).unwrap();
        queue.push(Item::new("mid", 3)).unwrap();

        assert_eq!(queue.pop().unwrap(), Item::new("high", 5));
        queue.push(Item::new("urgent", 9)).unwrap();

        assert_eq!(queue.pop().unwrap(), Item::new("urgent", 9));
        assert_eq!(queue.pop().unwrap(), Item::new("mid", 3));
        assert_eq!(queue.pop().unwrap(), Item::new("low", 1));
    }

    #[test]
    fn test_close_idempotent() {
        let queue: BlockingPriorityQueue<u32> = BlockingPriorityQueue::new();
        queue.close();
        queue.close();
        queue.close();

        assert!(queue.is_closed());
        assert_eq!(queue.pop(), Err(QueueError::Closed));
    }

    #[test]
    fn test_pop_after_empty_close_does_not_block() {
        let queue: BlockingPriorityQueue<u32> = BlockingPriorityQueue::new();
        queue.close();

        let started = Instant::now();
        assert_eq!(queue.pop(), Err(QueueError::Closed));
        assert!(started.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_push_after_close_fails_without_mutation() {
        let queue = BlockingPriorityQueue::new();
        queue.push(Item::new("kept", 1)).unwrap();
        queue.close();

        let result = queue.push(Item::new("rejected", 9));
        assert!(matches!(result, Err(QueueError::Closed)));
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn test_close_drains_remaining_items() {
        let queue = BlockingPriorityQueue::new();
        queue.push(Item::new("a", 1)).unwrap();
        queue.push(Item::new("b", 2)).unwrap();
        queue.close();

        assert_eq!(queue.pop().unwrap().value, "b");
        assert_eq!(queue.pop().unwrap().value, "a");
        assert!(queue.pop().unwrap_err().is_closed());
    }

    #[test]
    fn test_pop_blocks_until_push() {
        let queue: Arc<BlockingPriorityQueue<&str>> = Arc::new(BlockingPriorityQueue::new());
        let (tx, rx) = mpsc::channel();

        let q = queue.clone();
        let handle = thread::spawn(move || {
            tx.send(q.pop()).unwrap();
        });

        // Nothing queued yet, so the waiter must still be blocked.
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        queue.push(Item::new("wake", 1)).unwrap();
        let popped = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(popped.unwrap().value, "wake");
        handle.join().unwrap();
    }

    #[test]
    fn test_push_wakes_exactly_one_waiter_and_close_wakes_all() {
        let queue: Arc<BlockingPriorityQueue<i32>> = Arc::new(BlockingPriorityQueue::new());
        let (tx, rx) = mpsc::channel();

        let mut handles = Vec::new();
        for _ in 0..3 {
            let q = queue.clone();
            let tx = tx.clone();
            handles.push(thread::spawn(move || {
                tx.send(q.pop()).unwrap();
            }));
        }
        drop(tx);

        thread::sleep(Duration::from_millis(50));
        queue.push(Item::new(42, 1)).unwrap();

        let first = rx.recv_timeout(Duration::from_secs(5)).unwrap();
        assert_eq!(first.unwrap().value, 42);
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        queue.close();
        for _ in 0..2 {
            let result = rx.recv_timeout(Duration::from_secs(5)).unwrap();
            assert_eq!(result, Err(QueueError::Closed));
        }

        for handle in handles {
            handle.join().unwrap();
        }
    }

    #[test]
    fn test_pop_timeout() {
        let queue: BlockingPriorityQueue<u8> = BlockingPriorityQueue::new();
        assert_eq!(queue.pop_timeout(Duration::from_millis(20)), Ok(None));

        queue.push(Item::new(1, 1)).unwrap();
        assert_eq!(
            queue.pop_timeout(Duration::from_millis(20)),
            Ok(Some(Item::new(1, 1)))
        );

        queue.close();
        assert_eq!(
            queue.pop_timeout(Duration::from_millis(20)),
            Err(QueueError::Closed)
        );
    }

    #[test]
    fn test_try_pop_states() {
        let queue = BlockingPriorityQueue::new();
        assert_eq!(queue.try_pop(), Ok(None));

        queue.push(Item::new("x", 0)).unwrap();
        queue.close();
        assert_eq!(queue.try_pop(), Ok(Some(Item::new("x", 0))));
        assert_eq!(queue.try_pop(), Err(QueueError::Closed));
    }

    #[test]
    fn test_update_and_remove() {
        let queue = BlockingPriorityQueue::new();
        let low = queue.push(Item::new("low", 1)).unwrap();
        let doomed = queue.push(Item::new("doomed", 3)).unwrap();
        queue.push(Item::new("high", 5)).unwrap();

        assert_eq!(queue.update(low, 10), Ok(1));
        assert_eq!(queue.remove(doomed).unwrap().value, "doomed");
        assert_eq!(queue.remove(doomed), Err(QueueError::NotFound));

        assert_eq!(queue.pop().unwrap().value, "low");
        assert_eq!(queue.update(low, 0), Err(QueueError::NotFound));
        assert_eq!(queue.pop().unwrap().value, "high");
    }

    #[test]
    fn test_len_survives_poisoned_lock() {
        let queue: Arc<BlockingPriorityQueue<u8>> = Arc::new(BlockingPriorityQueue::new());
        queue.push(Item::new(1, 1)).unwrap();
        queue.push(Item::new(2, 2)).unwrap();

        let q = queue.clone();
        let _ = thread::spawn(move || {
            let _guard = q.state.lock().unwrap();
            panic!("poison the queue lock");
        })
        .join();

        assert_eq!(queue.len(), 2);
        assert!(!queue.is_empty());
        assert!(matches!(
            queue.push(Item::new(3, 3)),
            Err(QueueError::LockPoisoned(_))
        ));

        queue.close();
        assert!(queue.is_closed());
    }

    #[test]
    fn test_concurrent_producers_and_consumers_exactly_once() {
        let queue: Arc<BlockingPriorityQueue<u32>> = Arc::new(BlockingPriorityQueue::new());

        let producers: Vec<_> = (0..4)
            .map(|p| {
                let q = queue.clone();
                thread::spawn(move || {
                    for i in 0..250 {
                        let id = p * 1000 + i;
                        q.push(Item::new(id, (id % 17) as i64)).unwrap();
                    }
                })
            })
            .collect();

        let consumers: Vec<_> = (0..4)
            .map(|_| {
                let q = queue.clone();
                thread::spawn(move || {
                    let mut seen = Vec::new();
                    while let Ok(item) = q.pop() {
                        seen.push(item.value);
                    }
                    seen
                })
            })
            .collect();

        for producer in producers {
            producer.join().unwrap();
        }
        queue.close();

        let mut all = HashSet::new();
        let mut total = 0;
        for consumer in consumers {
            for value in consumer.join().unwrap() {
                assert!(all.insert(value), "duplicate delivery of {}", value);
                total += 1;
            }
        }
        assert_eq!(total, 1000);
        assert_eq!(all.len(), 1000);
    }
}
