//! Construction-time validation failures
//!
//! Malformed input is rejected when a value is built, never coerced.

use thiserror::Error;

/// Errors raised while constructing domain values
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Claim text is empty after trimming
    #[error("claim text is empty")]
    EmptyText,

    /// Claim text exceeds the maximum length
    #[error("claim text is {chars} chars (max: {max})")]
    TextTooLong {
        /// Actual length in chars
        chars: usize,
        /// Allowed maximum
        max: usize,
    },

    /// The verbatim source excerpt is missing
    #[error("verbatim quote is required")]
    MissingVerbatimQuote,

    /// A claim without evidence unit references
    #[error("claim has no evidence unit ids")]
    MissingEvidence,

    /// Confidence outside [0, 1] or NaN
    #[error("confidence {0} is outside [0.0, 1.0]")]
    ConfidenceOutOfRange(f64),

    /// A required string field is empty
    #[error("{0} must not be empty")]
    EmptyField(&'static str),

    /// Axis value submitted without an evidence reference
    #[error("axis value for '{axis_key}' has no evidence reference")]
    MissingAxisEvidence {
        /// Axis the value was submitted for
        axis_key: String,
    },

    /// Range whose bounds are empty
    #[error("invalid range [{low}, {high}]")]
    InvalidRange {
        /// Lower bound
        low: String,
        /// Upper bound
        high: String,
    },

    /// SET axis value with no members
    #[error("set axis value has no members")]
    EmptySet,

    /// An order was supplied while ordering confidence is UNKNOWN
    #[error("axis '{0}' has UNKNOWN ordering confidence and cannot carry a value order")]
    OrderWithoutConfidence(String),

    /// Declared value order is empty or contains duplicates
    #[error("invalid value order for axis '{axis_key}': {issue}")]
    InvalidValueOrder {
        /// Axis the order was declared for
        axis_key: String,
        /// Description of the issue
        issue: String,
    },

    /// A string did not name a known variant
    #[error("unknown {kind}: '{value}'")]
    UnknownVariant {
        /// Name of the enumeration
        kind: &'static str,
        /// Offending input
        value: String,
    },
}
