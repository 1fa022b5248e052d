//! Gatekeeper error types

use thiserror::Error;

/// Errors that can occur during gatekeeper operations
#[derive(Error, Debug)]
pub enum GatekeeperError {
    /// Store error during deduplication
    #[error("Store error: {0}")]
    Store(String),

    /// Configuration error (bad pattern, unreadable TOML)
    #[error("Configuration error: {0}")]
    Config(String),

    /// A pool worker panicked or was cancelled
    #[error("Worker failed: {0}")]
    Worker(String),
}
