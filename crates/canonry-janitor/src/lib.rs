//! Canonry Janitor
//!
//! Background consolidation of document-level claims into canonical claims.
//!
//! # Overview
//!
//! The Janitor is responsible for:
//! - **Canonicalization**: one canonical claim per content fingerprint, with a
//!   SUPPORTS edge from every claim behind it
//! - **Supersession**: a value restated by a strictly newer revision of the same
//!   document family replaces the old one; the old canonical claim and its
//!   claims are retired
//! - **Conflict detection**: any other disagreement on the same claim key and
//!   scope becomes a CONFLICTS_WITH edge
//! - **Axis observation**: scope qualifiers of active claims become evidenced
//!   applicability axis values; undeclared orderings are re-inferred
//! - **Metrics collection**: counts per pass for monitoring
//!
//! Every pass runs under the `canonicalization` lease. When the lease is held
//! elsewhere the pass is skipped, not failed.
//!
//! # Usage
//!
//! ## One-time Pass
//!
//! ```no_run
//! use canonry_janitor::{Canonicalizer, PassOutcome};
//! use canonry_store::SqliteStore;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let store = SqliteStore::new("canonry.db")?;
//! let mut canonicalizer = Canonicalizer::default_config();
//!
//! if let PassOutcome::Completed(report) = canonicalizer.run_pass(&store, "acme")? {
//!     println!("{} conflicts", report.conflicts);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Background Worker
//!
//! See [`JanitorWorker`].
//!
//! # Configuration
//!
//! The Janitor can be configured via TOML:
//!
//! ```toml
//! sweep_interval_minutes = 60
//! lease_name = "canonicalization"
//! lease_ttl_secs = 600
//! tenants = ["acme"]
//! dry_run = false
//! ```

#![warn(missing_docs)]

mod axes;
mod canonicalizer;
mod config;
mod error;
mod metrics;
mod worker;

pub use canonicalizer::{Canonicalizer, PassOutcome, PassReport};
pub use config::{JanitorConfig, CANONICALIZATION_LEASE};
pub use error::JanitorError;
pub use metrics::JanitorMetrics;
pub use worker::JanitorWorker;
