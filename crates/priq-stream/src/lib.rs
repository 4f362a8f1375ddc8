//! Channel-style streaming adapter for priq.
//!
//! This crate wraps `priq_core::BlockingPriorityQueue` in the "send into a
//! stream, receive from a stream" shape a pipeline expects:
//! - `Ingress` - cloneable send-only endpoint for producers
//! - `Egress` - cloneable receive-only endpoint shared by consumers
//! - `ChannelizedQueue` - owns the queue and the two forwarder tasks
//!
//! # Key Concepts
//!
//! ## Forwarders
//!
//! The ingress forwarder is an async task moving items from the ingress
//! channel into the queue. The egress forwarder runs on a blocking thread,
//! popping the highest-priority item whenever egress has room.
//!
//! ## Shutdown
//!
//! `ChannelizedQueue::close` stops ingress. The ingress forwarder flushes
//! what was already buffered and closes the queue; the egress forwarder
//! drains the queue and then closes egress. `join` waits for both, so a
//! pipeline can tell for certain that every item has been handed out.

pub mod adapter;
pub mod config;
pub mod endpoint;
pub mod error;
mod forwarder;

pub use adapter::{ChannelizedQueue, StreamState};
pub use config::StreamConfig;
pub use endpoint::{Egress, Ingress};
pub use error::{Result, StreamError};
pub use priq_core::Item;
