//! Scope module - contextual qualifiers of a claim

use crate::fingerprint::short_digest;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Scope key of a claim with no qualifiers
pub const GLOBAL_SCOPE_KEY: &str = "global";

/// Contextual qualifiers under which a claim holds
///
/// Reduced to an order-independent [`Scope::scope_key`]: qualifiers are
/// normalized and sorted before hashing, so insertion order never matters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scope {
    /// Product or protocol version
    #[serde(default)]
    pub version: Option<String>,

    /// Region or jurisdiction
    #[serde(default)]
    pub region: Option<String>,

    /// Edition or plan
    #[serde(default)]
    pub edition: Option<String>,

    /// Free-form conditions
    #[serde(default)]
    pub conditions: BTreeMap<String, String>,
}

impl Scope {
    /// Unqualified scope
    pub fn global() -> Self {
        Self::default()
    }

    /// Set the version qualifier
    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Set the region qualifier
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Set the edition qualifier
    pub fn with_edition(mut self, edition: impl Into<String>) -> Self {
        self.edition = Some(edition.into());
        self
    }

    /// Add a free-form condition
    pub fn with_condition(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.conditions.insert(key.into(), value.into());
        self
    }

    /// Normalized qualifiers, sorted by key; blank values are dropped
    pub fn qualifiers(&self) -> BTreeMap<String, String> {
        let mut out = BTreeMap::new();
        let named = [
            ("version", &self.version),
            ("region", &self.region),
            ("edition", &self.edition),
        ];
        for (name, value) in named {
            if let Some(v) = value {
                insert_normalized(&mut out, name, v);
            }
        }
        for (k, v) in &self.conditions {
            insert_normalized(&mut out, k, v);
        }
        out
    }

    /// Normalized value of one qualifier, which doubles as its axis key
    pub fn qualifier(&self, axis_key: &str) -> Option<String> {
        self.qualifiers().remove(&axis_key.trim().to_lowercase())
    }

    /// Whether the scope carries no qualifiers
    pub fn is_global(&self) -> bool {
        self.qualifiers().is_empty()
    }

    /// Order-independent key of the scope
    pub fn scope_key(&self) -> String {
        let qualifiers = self.qualifiers();
        if qualifiers.is_empty() {
            return GLOBAL_SCOPE_KEY.to_string();
        }
        let canonical = qualifiers
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join(";");
        short_digest(&canonical)
    }
}

fn insert_normalized(out: &mut BTreeMap<String, String>, key: &str, value: &str) {
    let key = key.trim().to_lowercase();
    let value = value.trim().to_lowercase();
    if !key.is_empty() && !value.is_empty() {
        out.insert(key, value);
    }
}
