//! Error types for the relay
//!
//! Provides unified error handling using thiserror.

use thiserror::Error;

// == Relay Error Enum ==
/// Unified error type for the relay.
#[derive(Error, Debug)]
pub enum RelayError {
    /// No live cache entry with the requested id
    #[error("No cached item with id: {0}")]
    NotFound(String),

    /// Request named an operation the server does not recognize
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// A request deadline elapsed before the operation finished
    #[error("Operation timed out")]
    Timeout,

    /// A worker task was cancelled before producing a result
    #[error("Operation interrupted")]
    Interrupted,

    /// A worker task failed while running
    #[error("Execution failed: {0}")]
    ExecutionFailed(String),

    /// The content source has no page with the given title
    #[error("No page with title: {0}")]
    PageMissing(String),

    /// Content source transport failure
    #[error("Content source error: {0}")]
    Source(#[from] reqwest::Error),

    /// Snapshot file I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot or wire (de)serialization failure
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// == Result Type Alias ==
/// Convenience Result type for the relay.
pub type Result<T> = std::result::Result<T, RelayError>;
