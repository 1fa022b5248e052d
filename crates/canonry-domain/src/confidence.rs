//! Confidence score in [0, 1]

use crate::ValidationError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A validated confidence score
///
/// The inner value is always finite and within `[0.0, 1.0]`.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(try_from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    /// Full confidence
    pub const CERTAIN: Confidence = Confidence(1.0);

    /// No confidence
    pub const ZERO: Confidence = Confidence(0.0);

    /// Create a confidence score
    ///
    /// # Errors
    /// Returns [`ValidationError::ConfidenceOutOfRange`] for NaN or values outside `[0, 1]`.
    pub fn new(value: f64) -> Result<Self, ValidationError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(ValidationError::ConfidenceOutOfRange(value));
        }
        Ok(Self(value))
    }

    /// Create a confidence score, clamping into range (NaN becomes 0)
    pub fn saturating(value: f64) -> Self {
        if value.is_nan() {
            return Self::ZERO;
        }
        Self(value.clamp(0.0, 1.0))
    }

    /// Get the raw value
    pub fn value(&self) -> f64 {
        self.0
    }

    /// Multiply by a factor, clamped into range
    pub fn scaled(&self, factor: f64) -> Self {
        Self::saturating(self.0 * factor)
    }
}

impl TryFrom<f64> for Confidence {
    type Error = ValidationError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(c: Confidence) -> Self {
        c.0
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}
