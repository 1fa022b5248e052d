//! Configuration for Janitor operations
//!
//! Defines the sweep interval, the canonicalization lease and the tenants
//! the background worker consolidates.

use crate::JanitorError;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Name of the lease every canonicalization pass runs under
pub const CANONICALIZATION_LEASE: &str = "canonicalization";

/// Configuration for the Janitor service
///
/// # Examples
///
/// ```
/// use canonry_janitor::JanitorConfig;
///
/// // Default configuration (hourly)
/// let config = JanitorConfig::default();
/// assert_eq!(config.sweep_interval_minutes, 60);
///
/// // Frequent consolidation
/// let config = JanitorConfig::aggressive();
/// assert_eq!(config.sweep_interval_minutes, 15);
///
/// // Infrequent consolidation
/// let config = JanitorConfig::lenient();
/// assert_eq!(config.sweep_interval_minutes, 240);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JanitorConfig {
    /// How often the worker runs a pass (in minutes)
    pub sweep_interval_minutes: u64,

    /// Lease the pass runs under
    #[serde(default = "default_lease_name")]
    pub lease_name: String,

    /// How long a lease stays valid without release (in seconds)
    pub lease_ttl_secs: u64,

    /// Identity recorded as the lease holder
    #[serde(default = "default_holder")]
    pub holder: String,

    /// Tenants the background worker consolidates
    #[serde(default)]
    pub tenants: Vec<String>,

    /// Dry-run mode: compute and log what would be written without writing
    /// Default: false
    #[serde(default)]
    pub dry_run: bool,
}

fn default_lease_name() -> String {
    CANONICALIZATION_LEASE.to_string()
}

fn default_holder() -> String {
    format!("janitor-{}", std::process::id())
}

impl Default for JanitorConfig {
    /// Hourly passes, ten-minute lease
    fn default() -> Self {
        Self {
            sweep_interval_minutes: 60,
            lease_name: default_lease_name(),
            lease_ttl_secs: 600,
            holder: default_holder(),
            tenants: Vec::new(),
            dry_run: false,
        }
    }
}

impl JanitorConfig {
    /// Frequent passes with a short lease
    ///
    /// Suitable when documents arrive continuously.
    pub fn aggressive() -> Self {
        Self {
            sweep_interval_minutes: 15,
            lease_ttl_secs: 300,
            ..Self::default()
        }
    }

    /// Infrequent passes with a long lease
    ///
    /// Suitable for large tenants where a pass takes a while.
    pub fn lenient() -> Self {
        Self {
            sweep_interval_minutes: 240,
            lease_ttl_secs: 1800,
            ..Self::default()
        }
    }

    /// Consolidate these tenants
    pub fn with_tenants<I, T>(mut self, tenants: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.tenants = tenants.into_iter().map(Into::into).collect();
        self
    }

    /// Get sweep interval as Duration
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_minutes * 60)
    }

    /// Get lease TTL as Duration
    pub fn lease_ttl(&self) -> Duration {
        Duration::from_secs(self.lease_ttl_secs)
    }

    /// Check that intervals are non-zero and names non-empty
    pub fn validate(&self) -> Result<(), JanitorError> {
        if self.sweep_interval_minutes == 0 {
            return Err(JanitorError::Config("sweep_interval_minutes must be positive".to_string()));
        }
        if self.lease_ttl_secs == 0 {
            return Err(JanitorError::Config("lease_ttl_secs must be positive".to_string()));
        }
        if self.lease_name.trim().is_empty() || self.holder.trim().is_empty() {
            return Err(JanitorError::Config("lease name and holder must be non-empty".to_string()));
        }
        Ok(())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, JanitorError> {
        let config: Self = toml::from_str(toml_str)
            .map_err(|e| JanitorError::Config(format!("Failed to parse TOML: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, JanitorError> {
        toml::to_string_pretty(self)
            .map_err(|e| JanitorError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}
