//! Resolver error types

use thiserror::Error;

/// Errors that can occur while configuring or feeding the read-path resolvers
///
/// Uncertain answers are not errors: they come back as `AskUser`,
/// `Verdict::Unknown` or `MergeDecision::Abstain`.
#[derive(Error, Debug, PartialEq)]
pub enum ResolverError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid policy
    #[error("Invalid policy: {0}")]
    InvalidPolicy(String),

    /// Store error while reading claims or axes
    #[error("Store error: {0}")]
    Store(String),
}
