//! Background tasks moving items between the endpoints and the queue.

use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use priq_core::{BlockingPriorityQueue, Item, QueueError};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tracing::{debug, trace, warn};

/// Closes the queue when dropped.
///
/// Held by the ingress forwarder so the queue gets closed even if the task
/// is cancelled or never polled.
struct CloseOnDrop<T>(Arc<BlockingPriorityQueue<T>>);

impl<T> Drop for CloseOnDrop<T> {
    fn drop(&mut self) {
        self.0.close();
    }
}

/// Moves items from the ingress channel into the queue.
///
/// Runs until the shutdown signal fires (or every ingress sender is gone).
/// It then stops accepting sends, forwards whatever was already buffered,
/// and closes the queue.
///
/// The close guard is created before the returned future is first polled,
/// so dropping the task unpolled still closes the queue.
pub(crate) fn forward_ingress<T>(
    queue: Arc<BlockingPriorityQueue<T>>,
    mut rx: mpsc::Receiver<Item<T>>,
    mut shutdown: watch::Receiver<bool>,
) -> impl Future<Output = ()> {
    let close = CloseOnDrop(Arc::clone(&queue));

    async move {
        let _close = close;
        let mut forwarded = 0usize;

        debug!("ingress forwarder started");

        loop {
            tokio::select! {
                received = rx.recv() => match received {
                    Some(item) => {
                        if !push(&queue, item) {
                            break;
                        }
                        forwarded += 1;
                    }
                    None => {
                        debug!("all ingress senders dropped");
                        break;
                    }
                },
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("ingress forwarder received shutdown signal");
                        break;
                    }
                }
            }
        }

        // Sends fail from here on; anything already buffered is still ours.
        rx.close();
        while let Some(item) = rx.recv().await {
            if !push(&queue, item) {
                break;
            }
            forwarded += 1;
        }

        debug!(forwarded, "ingress forwarder stopped, closing queue");
    }
}

fn push<T>(queue: &BlockingPriorityQueue<T>, item: Item<T>) -> bool {
    let priority = item.priority;
    match queue.push(item) {
        Ok(_) => {
            trace!(priority, "forwarded item into queue");
            true
        }
        Err(e) => {
            warn!(error = %e, priority, "dropping item, queue rejected push");
            false
        }
    }
}

/// Moves items from the queue to the egress channel.
///
/// Blocks on `pop`, so it must run on a blocking thread. Egress capacity is
/// reserved before popping, so no popped item waits outside the queue while
/// egress is full. Dropping `tx` on return is what closes the egress side.
pub(crate) fn forward_egress<T>(
    queue: Arc<BlockingPriorityQueue<T>>,
    tx: mpsc::Sender<Item<T>>,
    drained: Arc<AtomicBool>,
    runtime: Handle,
) {
    let mut forwarded = 0usize;

    debug!("egress forwarder started");

    loop {
        let permit = match runtime.block_on(tx.reserve()) {
            Ok(permit) => permit,
            Err(_) => {
                warn!(
                    undelivered = queue.len(),
                    "all egress handles dropped, stopping egress forwarder"
                );
                break;
            }
        };

        match queue.pop() {
            Ok(item) => {
                trace!(priority = item.priority, "forwarded item to egress");
                permit.send(item);
                forwarded += 1;
            }
            Err(QueueError::Closed) => {
                debug!(forwarded, "queue closed and drained, closing egress");
                break;
            }
            Err(e) => {
                warn!(error = %e, "egress forwarder stopped on queue error");
                break;
            }
        }
    }

    drained.store(true, Ordering::SeqCst);
}
