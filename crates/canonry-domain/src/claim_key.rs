//! ClaimKey - deterministic identity of "which fact" a claim is about

use serde::{Deserialize, Serialize};
use std::fmt;

/// Deterministic identity assigned by the ingestion gate
///
/// Two claims with the same key (and scope) are statements about the same
/// fact and can be compared against each other.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimKey {
    /// Domain of the fact (e.g. "security")
    pub domain: String,

    /// Key within the domain (e.g. "tls_min_version")
    pub key: String,
}

impl ClaimKey {
    /// Create a new claim key
    pub fn new(domain: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            domain: domain.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ClaimKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.domain, self.key)
    }
}

/// Kind of value a keyed claim carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueKind {
    /// Protocol or product version
    Version,
    /// Percentage (SLA, uptime)
    Percentage,
    /// Yes/no capability
    Boolean,
    /// Recurrence (daily, weekly…)
    Frequency,
    /// Time span (retention, RTO)
    Duration,
    /// Country or region name
    Location,
    /// Responsible party
    Party,
    /// Size or quantity threshold
    Size,
    /// Free text
    Text,
}
