//! Error types for Janitor operations

use thiserror::Error;

/// Errors that can occur during Janitor operations
///
/// A pass skipped because another holder owns the lease is not an error.
#[derive(Error, Debug)]
pub enum JanitorError {
    /// Storage layer error
    #[error("Storage error: {0}")]
    Store(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Worker error (tokio runtime issues)
    #[error("Worker error: {0}")]
    Worker(String),
}
