//! Error types for the streaming adapter.

use thiserror::Error;

/// Errors that can occur in the streaming adapter.
#[derive(Debug, Error)]
pub enum StreamError {
    /// Ingress is closed; the item was not accepted.
    #[error("stream is closed")]
    Closed,

    /// A forwarder task panicked or was cancelled.
    #[error("forwarder task failed: {0}")]
    TaskFailed(String),
}

/// Result type for streaming adapter operations.
pub type Result<T> = std::result::Result<T, StreamError>;
