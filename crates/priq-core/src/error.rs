//! Error types for queue operations.

use thiserror::Error;

/// Errors that can occur during queue operations.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum QueueError {
    /// Queue is closed (and, for pops, drained).
    ///
    /// This is the normal end-of-stream signal, not a fault.
    #[error("queue is closed")]
    Closed,

    /// Item key no longer refers to a queued item.
    #[error("item not found in queue")]
    NotFound,

    /// Lock poisoned (thread panicked while holding lock).
    #[error("lock poisoned: {0}")]
    LockPoisoned(String),
}

impl QueueError {
    /// Returns true for the ordinary closed-queue signal.
    pub fn is_closed(&self) -> bool {
        matches!(self, QueueError::Closed)
    }
}

/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, QueueError>;
