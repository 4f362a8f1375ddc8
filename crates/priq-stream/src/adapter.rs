//! ChannelizedQueue - channel-style front end for the blocking priority queue.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use priq_core::BlockingPriorityQueue;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch, Mutex};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::endpoint::{Egress, Ingress};
use crate::error::{Result, StreamError};
use crate::forwarder::{forward_egress, forward_ingress};

/// Lifecycle of a `ChannelizedQueue`. Transitions only move forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamState {
    /// Accepting items, forwarders running.
    Open,
    /// Closed to new items; buffered items are still being delivered.
    Draining,
    /// Everything delivered and egress closed.
    Closed,
}

/// Join handles of the two forwarder tasks.
struct Forwarders {
    ingress: Option<JoinHandle<()>>,
    egress: Option<JoinHandle<()>>,
}

/// Priority queue exposed as an ingress stream and an egress stream.
///
/// Producers send into `ingress_endpoint()`, consumers receive from
/// `egress_endpoint()`. In between, items wait in a `BlockingPriorityQueue`
/// and leave it highest priority first.
///
/// # Shutdown
///
/// `close` stops ingress. Everything sent before it is still delivered,
/// exactly once, before egress reports `None`. `join` waits for both
/// forwarders, which requires consumers to keep draining egress.
///
/// # Example
///
/// ```no_run
/// use priq_stream::ChannelizedQueue;
///
/// #[tokio::main]
/// async fn main() {
///     let cpq = ChannelizedQueue::new();
///     let ingress = cpq.ingress_endpoint();
///     let egress = cpq.egress_endpoint();
///
///     let consumer = tokio::spawn(async move {
///         while let Some(item) = egress.recv().await {
///             println!("{} (priority {})", item.value, item.priority);
///         }
///     });
///
///     for path in ["a", "bb", "ccc"] {
///         ingress.send_value(path.to_string(), path.len() as i64).await.unwrap();
///     }
///
///     cpq.close();
///     consumer.await.unwrap();
///     cpq.join().await.unwrap();
/// }
/// ```
pub struct ChannelizedQueue<T> {
    queue: Arc<BlockingPriorityQueue<T>>,
    ingress: Ingress<T>,
    egress: Egress<T>,
    shutdown_tx: watch::Sender<bool>,
    drained: Arc<AtomicBool>,
    forwarders: Mutex<Forwarders>,
}

impl<T: Send + 'static> ChannelizedQueue<T> {
    /// Creates an adapter with default channel sizes and starts its
    /// forwarders.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn new() -> Self {
        Self::with_config(StreamConfig::default())
    }

    /// Creates an adapter with the given channel sizes.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn with_config(config: StreamConfig) -> Self {
        let queue = Arc::new(BlockingPriorityQueue::new());
        let (in_tx, in_rx) = mpsc::channel(config.ingress_capacity.max(1));
        let (out_tx, out_rx) = mpsc::channel(config.egress_capacity.max(1));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let drained = Arc::new(AtomicBool::new(false));

        let ingress = tokio::spawn(forward_ingress(Arc::clone(&queue), in_rx, shutdown_rx));

        let egress = {
            let queue = Arc::clone(&queue);
            let drained = Arc::clone(&drained);
            let runtime = Handle::current();
            tokio::task::spawn_blocking(move || forward_egress(queue, out_tx, drained, runtime))
        };

        debug!(
            ingress_capacity = config.ingress_capacity,
            egress_capacity = config.egress_capacity,
            "channelized queue started"
        );

        Self {
            queue,
            ingress: Ingress::new(in_tx, shutdown_tx.subscribe()),
            egress: Egress::new(out_rx),
            shutdown_tx,
            drained,
            forwarders: Mutex::new(Forwarders {
                ingress: Some(ingress),
                egress: Some(egress),
            }),
        }
    }
}

impl<T> ChannelizedQueue<T> {
    /// Handle for submitting items.
    pub fn ingress_endpoint(&self) -> Ingress<T> {
        self.ingress.clone()
    }

    /// Handle for taking items, highest priority first among those queued.
    pub fn egress_endpoint(&self) -> Egress<T> {
        self.egress.clone()
    }

    /// Stops accepting new items. Idempotent.
    ///
    /// Items already accepted keep flowing to egress; egress reports `None`
    /// after the last of them.
    pub fn close(&self) {
        let already_closed = self.shutdown_tx.send_replace(true);
        if !already_closed {
            info!(queued = self.queue.len(), "closing channelized queue");
        }
    }

    /// Waits for both forwarders to finish.
    ///
    /// Returns once every accepted item has been handed to egress and
    /// egress is closed. Only completes after `close`, and only while
    /// consumers keep draining egress. Safe to call more than once.
    pub async fn join(&self) -> Result<()> {
        let mut forwarders = self.forwarders.lock().await;

        if let Some(handle) = forwarders.ingress.take() {
            debug!("waiting for ingress forwarder");
            handle
                .await
                .map_err(|e| StreamError::TaskFailed(format!("ingress forwarder: {}", e)))?;
        }

        if let Some(handle) = forwarders.egress.take() {
            debug!("waiting for egress forwarder");
            handle
                .await
                .map_err(|e| StreamError::TaskFailed(format!("egress forwarder: {}", e)))?;
        }

        debug!("channelized queue forwarders joined");
        Ok(())
    }

    /// `close` followed by `join`.
    pub async fn shutdown(&self) -> Result<()> {
        self.close();
        self.join().await
    }

    /// Number of items waiting in the priority queue.
    ///
    /// Items still in the ingress buffer or already handed to egress are
    /// not counted.
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns true if the priority queue holds no items.
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Current lifecycle state.
    pub fn state(&self) -> StreamState {
        if self.drained.load(Ordering::SeqCst) {
            StreamState::Closed
        } else if *self.shutdown_tx.borrow() || self.queue.is_closed() {
            StreamState::Draining
        } else {
            StreamState::Open
        }
    }
}

impl<T> fmt::Debug for ChannelizedQueue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelizedQueue")
            .field("state", &self.state())
            .field("queued", &self.queue.len())
            .finish()
    }
}

impl<T: Send + 'static> Default for ChannelizedQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Drop for ChannelizedQueue<T> {
    fn drop(&mut self) {
        // Let the forwarders wind down; handed-out endpoints stay usable
        // until the buffered items are gone.
        self.shutdown_tx.send_replace(true);
    }
}
