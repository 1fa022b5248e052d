//! Authority module - how trustworthy a claim's source is

use crate::ValidationError;
use serde::{Deserialize, Serialize};

/// Authority of a source document
///
/// Ranked `Official > Verified > Community > Unknown`. `Unknown` is the only
/// level that does not count as "authority known".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthorityLevel {
    /// Published by the vendor / owner
    Official,

    /// Reviewed by a trusted party
    Verified,

    /// Community-contributed
    Community,

    /// Provenance not established
    Unknown,
}

impl AuthorityLevel {
    /// All levels, highest first
    pub const RANKED: [AuthorityLevel; 4] = [
        AuthorityLevel::Official,
        AuthorityLevel::Verified,
        AuthorityLevel::Community,
        AuthorityLevel::Unknown,
    ];

    /// Get the level name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityLevel::Official => "official",
            AuthorityLevel::Verified => "verified",
            AuthorityLevel::Community => "community",
            AuthorityLevel::Unknown => "unknown",
        }
    }

    /// Parse a level from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "official" => Some(AuthorityLevel::Official),
            "verified" => Some(AuthorityLevel::Verified),
            "community" => Some(AuthorityLevel::Community),
            "unknown" => Some(AuthorityLevel::Unknown),
            _ => None,
        }
    }

    /// Default rank (higher is more authoritative)
    pub fn rank(&self) -> u8 {
        match self {
            AuthorityLevel::Official => 3,
            AuthorityLevel::Verified => 2,
            AuthorityLevel::Community => 1,
            AuthorityLevel::Unknown => 0,
        }
    }

    /// Whether the authority of the source is established
    pub fn is_known(&self) -> bool {
        !matches!(self, AuthorityLevel::Unknown)
    }

    /// Coarse tier used by the verification aggregator
    pub fn tier(&self) -> AuthorityTier {
        match self {
            AuthorityLevel::Official => AuthorityTier::High,
            AuthorityLevel::Verified => AuthorityTier::Medium,
            AuthorityLevel::Community | AuthorityLevel::Unknown => AuthorityTier::Low,
        }
    }

    /// The more authoritative of two levels
    pub fn max(self, other: AuthorityLevel) -> AuthorityLevel {
        if other.rank() > self.rank() {
            other
        } else {
            self
        }
    }
}

impl std::str::FromStr for AuthorityLevel {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::UnknownVariant {
            kind: "authority level",
            value: s.to_string(),
        })
    }
}

/// Coarse authority tier (HIGH / MEDIUM / LOW)
///
/// Derives `Ord` with `Low < Medium < High`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AuthorityTier {
    /// Community or unknown sources
    Low,
    /// Verified sources
    Medium,
    /// Official sources
    High,
}

impl AuthorityTier {
    /// Get the tier name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthorityTier::Low => "LOW",
            AuthorityTier::Medium => "MEDIUM",
            AuthorityTier::High => "HIGH",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_authority_ranking() {
        assert!(AuthorityLevel::Official.rank() > AuthorityLevel::Verified.rank());
        assert!(AuthorityLevel::Verified.rank() > AuthorityLevel::Community.rank());
        assert!(AuthorityLevel::Community.rank() > AuthorityLevel::Unknown.rank());
    }

    #[test]
    fn test_known_authority() {
        assert!(AuthorityLevel::Community.is_known());
        assert!(!AuthorityLevel::Unknown.is_known());
    }

    #[test]
    fn test_tier_mapping() {
        assert_eq!(AuthorityLevel::Official.tier(), AuthorityTier::High);
        assert_eq!(AuthorityLevel::Verified.tier(), AuthorityTier::Medium);
        assert_eq!(AuthorityLevel::Community.tier(), AuthorityTier::Low);
        assert_eq!(AuthorityLevel::Unknown.tier(), AuthorityTier::Low);
        assert!(AuthorityTier::High > AuthorityTier::Medium);
    }

    #[test]
    fn test_parse() {
        assert_eq!("OFFICIAL".parse::<AuthorityLevel>(), Ok(AuthorityLevel::Official));
        assert!("vendor".parse::<AuthorityLevel>().is_err());
        assert_eq!(
            AuthorityLevel::Community.max(AuthorityLevel::Verified),
            AuthorityLevel::Verified
        );
    }
}
