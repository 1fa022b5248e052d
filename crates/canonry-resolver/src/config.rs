//! Resolver configuration
//!
//! Every constant the aggregator, intent resolver and entity merger use is
//! configuration. Defaults are the production values.

use crate::ResolverError;
use canonry_domain::AuthorityTier;
use serde::{Deserialize, Serialize};

/// Confidence blending for the verification aggregator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregatorConfig {
    /// Boost per additional comparison agreeing with the top verdict
    pub boost_step: f64,

    /// Maximum total boost
    pub boost_cap: f64,

    /// Multiplier when every comparison comes from LOW authority
    pub low_authority_penalty: f64,

    /// Multiplier for a HIGH authority top comparison
    pub high_multiplier: f64,

    /// Multiplier for a MEDIUM authority top comparison
    pub medium_multiplier: f64,

    /// Multiplier for a LOW authority top comparison
    pub low_multiplier: f64,

    /// Factor applied to the fallback comparison when nothing is informative
    pub insufficient_evidence_factor: f64,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        Self {
            boost_step: 0.05,
            boost_cap: 0.20,
            low_authority_penalty: 0.7,
            high_multiplier: 1.0,
            medium_multiplier: 0.9,
            low_multiplier: 0.8,
            insufficient_evidence_factor: 0.5,
        }
    }
}

impl AggregatorConfig {
    /// Multiplier for an authority tier
    pub fn multiplier(&self, tier: AuthorityTier) -> f64 {
        match tier {
            AuthorityTier::High => self.high_multiplier,
            AuthorityTier::Medium => self.medium_multiplier,
            AuthorityTier::Low => self.low_multiplier,
        }
    }
}

/// Intent resolver limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IntentConfig {
    /// Most options offered for disambiguation (at least 2)
    pub max_options: usize,
}

impl Default for IntentConfig {
    fn default() -> Self {
        Self { max_options: 5 }
    }
}

/// Weights and thresholds for structural entity similarity
///
/// Weights should sum to 1.0 so that identical names score 1.0.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityConfig {
    /// Weight of the acronym signal ("AWS" / "Amazon Web Services")
    pub acronym_weight: f64,

    /// Weight of token (component) Jaccard overlap
    pub component_weight: f64,

    /// Weight of equality after typography normalization
    pub typography_weight: f64,

    /// Scores at or above merge without arbitration
    pub auto_merge_threshold: f64,

    /// Scores at or below are kept apart without arbitration
    pub auto_reject_threshold: f64,
}

impl Default for SimilarityConfig {
    fn default() -> Self {
        Self {
            acronym_weight: 0.4,
            component_weight: 0.4,
            typography_weight: 0.2,
            auto_merge_threshold: 0.85,
            auto_reject_threshold: 0.3,
        }
    }
}

impl SimilarityConfig {
    /// Everything between the extremes goes to the arbiter
    pub fn cautious() -> Self {
        Self {
            auto_merge_threshold: 0.95,
            auto_reject_threshold: 0.1,
            ..Self::default()
        }
    }
}

/// All resolver settings in one TOML document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResolverConfig {
    /// Aggregator settings
    #[serde(default)]
    pub aggregator: AggregatorConfig,

    /// Intent resolver settings
    #[serde(default)]
    pub intent: IntentConfig,

    /// Entity similarity settings
    #[serde(default)]
    pub similarity: SimilarityConfig,
}

impl ResolverConfig {
    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ResolverError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| ResolverError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ResolverError> {
        toml::to_string_pretty(self)
            .map_err(|e| ResolverError::Config(format!("Failed to serialize to TOML: {}", e)))
    }

    /// Check ranges and thresholds
    pub fn validate(&self) -> Result<(), ResolverError> {
        if self.intent.max_options < 2 {
            return Err(ResolverError::Config(format!(
                "intent.max_options must be at least 2, got {}",
                self.intent.max_options
            )));
        }
        let s = &self.similarity;
        if s.auto_reject_threshold >= s.auto_merge_threshold {
            return Err(ResolverError::Config(format!(
                "similarity thresholds overlap: reject {} >= merge {}",
                s.auto_reject_threshold, s.auto_merge_threshold
            )));
        }
        Ok(())
    }
}
