//! Priority heap and blocking priority queue for priq.
//!
//! This crate provides the two lower layers of the priq pipeline:
//! - `PriorityHeap` - array-backed binary max-heap over a slot table
//! - `BlockingPriorityQueue` - thread-safe wrapper using `Mutex` + `Condvar`
//!   whose `pop` blocks until an item arrives or the queue is closed
//!
//! # Example
//!
//! ```
//! use priq_core::{BlockingPriorityQueue, Item, QueueError};
//! use std::sync::Arc;
//! use std::thread;
//!
//! let queue = Arc::new(BlockingPriorityQueue::new());
//!
//! let q = queue.clone();
//! let consumer = thread::spawn(move || {
//!     let mut seen = Vec::new();
//!     while let Ok(item) = q.pop() {
//!         seen.push(item.value);
//!     }
//!     seen
//! });
//!
//! queue.push(Item::new("low", 1)).unwrap();
//! queue.push(Item::new("high", 5)).unwrap();
//! queue.close();
//!
//! assert_eq!(queue.push(Item::new("late", 9)), Err(QueueError::Closed));
//! assert_eq!(consumer.join().unwrap().len(), 2);
//! ```

pub mod blocking;
pub mod error;
pub mod heap;
pub mod item;

pub use blocking::BlockingPriorityQueue;
pub use error::{QueueError, Result};
pub use heap::PriorityHeap;
pub use item::{Item, ItemKey};
