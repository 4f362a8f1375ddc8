//! Send-only and receive-only handles onto a `ChannelizedQueue`.

use std::fmt;
use std::sync::Arc;

use priq_core::Item;
use tokio::sync::{mpsc, watch, Mutex};

use crate::error::{Result, StreamError};

/// Send-only handle producers use to submit items.
///
/// Cheap to clone; every clone feeds the same adapter. Once the adapter is
/// closed, sends fail with `StreamError::Closed`.
pub struct Ingress<T> {
    tx: mpsc::Sender<Item<T>>,
    /// Shutdown flag of the owning adapter; set by `close`.
    closed: watch::Receiver<bool>,
}

impl<T> Clone for Ingress<T> {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
            closed: self.closed.clone(),
        }
    }
}

impl<T> fmt::Debug for Ingress<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Ingress")
            .field("closed", &self.is_closed())
            .field("capacity", &self.tx.capacity())
            .finish()
    }
}

impl<T> Ingress<T> {
    pub(crate) fn new(tx: mpsc::Sender<Item<T>>, closed: watch::Receiver<bool>) -> Self {
        Self { tx, closed }
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(StreamError::Closed);
        }
        Ok(())
    }

    /// Submits an item, waiting for buffer space if the ingress is full.
    ///
    /// Fails once `close` has been called, even before the ingress
    /// forwarder has reacted to it.
    pub async fn send(&self, item: Item<T>) -> Result<()> {
        self.ensure_open()?;
        self.tx.send(item).await.map_err(|_| StreamError::Closed)
    }

    /// Shorthand for `send(Item::new(value, priority))`.
    pub async fn send_value(&self, value: T, priority: i64) -> Result<()> {
        self.send(Item::new(value, priority)).await
    }

    /// Submits an item from synchronous code.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context; use `send`
    /// there instead.
    pub fn blocking_send(&self, item: Item<T>) -> Result<()> {
        self.ensure_open()?;
        self.tx.blocking_send(item).map_err(|_| StreamError::Closed)
    }

    /// Returns true once the adapter stopped accepting items.
    pub fn is_closed(&self) -> bool {
        *self.closed.borrow() || self.tx.is_closed()
    }
}

/// Receive-only handle consumers use to take items.
///
/// Clones share one underlying receiver, so any number of consumers can
/// drain it concurrently; each item goes to exactly one of them.
pub struct Egress<T> {
    rx: Arc<Mutex<mpsc::Receiver<Item<T>>>>,
}

impl<T> Clone for Egress<T> {
    fn clone(&self) -> Self {
        Self {
            rx: Arc::clone(&self.rx),
        }
    }
}

impl<T> fmt::Debug for Egress<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Egress")
            .field("handles", &Arc::strong_count(&self.rx))
            .finish()
    }
}

impl<T> Egress<T> {
    pub(crate) fn new(rx: mpsc::Receiver<Item<T>>) -> Self {
        Self {
            rx: Arc::new(Mutex::new(rx)),
        }
    }

    /// Takes the next item.
    ///
    /// Returns `None` once the adapter is closed and fully drained.
    pub async fn recv(&self) -> Option<Item<T>> {
        self.rx.lock().await.recv().await
    }

    /// Takes the next item from synchronous code.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async execution context.
    pub fn blocking_recv(&self) -> Option<Item<T>> {
        self.rx.blocking_lock().blocking_recv()
    }
}
