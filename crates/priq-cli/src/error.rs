//! Error types for the priq CLI.

use std::path::PathBuf;

use priq_stream::StreamError;
use thiserror::Error;

/// Errors that can occur while running a CLI command.
#[derive(Debug, Error)]
pub enum CliError {
    /// Walk root does not exist.
    #[error("path not found: {0}")]
    PathNotFound(PathBuf),

    /// Walk root is not a directory.
    #[error("not a directory: {0}")]
    NotADirectory(PathBuf),

    /// `verify` found files that do not match the manifest.
    #[error("{0} files differ from the manifest")]
    Mismatch(usize),

    /// Streaming adapter failure.
    #[error("stream error: {0}")]
    Stream(#[from] StreamError),

    /// A pipeline task panicked or was cancelled.
    #[error("task failed: {0}")]
    Task(String),

    /// Manifest serialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<tokio::task::JoinError> for CliError {
    fn from(e: tokio::task::JoinError) -> Self {
        CliError::Task(e.to_string())
    }
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;
