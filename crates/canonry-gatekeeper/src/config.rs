//! Gatekeeper configuration

use crate::tagging::{default_identity_patterns, IdentityPattern};
use crate::GatekeeperError;
use serde::{Deserialize, Serialize};

/// Configuration for the ingestion gate
///
/// The identity pattern table is ranked: the first pattern that fires wins.
/// Loading a TOML file with an `identity_patterns` array replaces the built-in
/// table entirely.
///
/// # Examples
///
/// ```
/// use canonry_gatekeeper::GateConfig;
///
/// let config = GateConfig::default();
/// assert_eq!(config.min_text_length, 12);
///
/// let strict = GateConfig::strict();
/// assert!(strict.min_text_length > config.min_text_length);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GateConfig {
    /// Candidates with fewer characters (after trimming) are rejected
    pub min_text_length: usize,

    /// Case-insensitive regexes for meta/boilerplate statements
    #[serde(default = "default_meta_patterns")]
    pub meta_patterns: Vec<String>,

    /// Ranked identity tagging table
    #[serde(default = "default_identity_patterns")]
    pub identity_patterns: Vec<IdentityPattern>,
}

/// Built-in meta/boilerplate patterns
pub fn default_meta_patterns() -> Vec<String> {
    [
        r"^\s*(?:see|refer to)\b",
        r"\btable of contents\b",
        r"^\s*(?:page|figure|table)\s+\d+\b",
        r"\bthis (?:document|section|chapter|appendix) (?:describes|covers|provides|outlines|contains)\b",
        r"\ball rights reserved\b|\bcopyright\b|©",
        r"\bfor more information\b",
        r"\b(?:intentionally left blank)\b",
        r"^\s*(?:introduction|overview|summary|conclusion)\s*:?\s*$",
    ]
    .iter()
    .map(|p| p.to_string())
    .collect()
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            min_text_length: 12,
            meta_patterns: default_meta_patterns(),
            identity_patterns: default_identity_patterns(),
        }
    }
}

impl GateConfig {
    /// Strict configuration: longer minimum text
    pub fn strict() -> Self {
        Self {
            min_text_length: 25,
            ..Self::default()
        }
    }

    /// Lenient configuration: short statements pass, no meta filter
    pub fn lenient() -> Self {
        Self {
            min_text_length: 4,
            meta_patterns: Vec::new(),
            identity_patterns: default_identity_patterns(),
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, GatekeeperError> {
        toml::from_str(toml_str)
            .map_err(|e| GatekeeperError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, GatekeeperError> {
        toml::to_string_pretty(self)
            .map_err(|e| GatekeeperError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

/// Configuration for per-document deduplication
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DedupConfig {
    /// Documents processed at once by the worker pool
    pub concurrency: usize,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self { concurrency: 4 }
    }
}

impl DedupConfig {
    /// Single worker, for debugging
    pub fn sequential() -> Self {
        Self { concurrency: 1 }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, GatekeeperError> {
        toml::from_str(toml_str)
            .map_err(|e| GatekeeperError::Config(format!("Failed to parse TOML: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = GateConfig::default();
        assert_eq!(config.min_text_length, 12);
        assert!(!config.meta_patterns.is_empty());
        assert!(!config.identity_patterns.is_empty());
    }

    #[test]
    fn test_presets() {
        assert!(GateConfig::strict().min_text_length > GateConfig::default().min_text_length);
        assert!(GateConfig::lenient().meta_patterns.is_empty());
        assert_eq!(DedupConfig::sequential().concurrency, 1);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = GateConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = GateConfig::from_toml(&text).unwrap();
        assert_eq!(parsed.min_text_length, config.min_text_length);
        assert_eq!(parsed.identity_patterns, config.identity_patterns);
    }

    #[test]
    fn test_toml_replaces_identity_table() {
        let toml = r#"
            min_text_length = 8

            [[identity_patterns]]
            name = "cookie_lifetime"
            pattern = 'cookies? expire after (?P<value>\d+ days)'
            domain = "privacy"
            key = "cookie_lifetime"
            value_kind = "duration"
            canonical_question = "How long do cookies live?"
        "#;
        let config = GateConfig::from_toml(toml).unwrap();
        assert_eq!(config.min_text_length, 8);
        assert_eq!(config.identity_patterns.len(), 1);
        assert_eq!(config.identity_patterns[0].key, "cookie_lifetime");
        // Omitted meta patterns fall back to the built-in list
        assert_eq!(config.meta_patterns, default_meta_patterns());
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            GateConfig::from_toml("min_text_length = \"x\""),
            Err(GatekeeperError::Config(_))
        ));
    }
}
