//! Canonry Gatekeeper
//!
//! Controls what enters the governed claim set.
//!
//! The Gatekeeper provides:
//! - Identity tagging (ranked regex table → `ClaimKey`)
//! - The promotion policy (linked / unlinked / rejected)
//! - Per-document deduplication (exact text, then triplet)
//! - A bounded worker pool running per-document work in parallel
//!
//! # Examples
//!
//! ```
//! use canonry_gatekeeper::{GateCandidate, GateConfig, IngestionGate, RhetoricalRole};
//! use canonry_domain::ClaimType;
//!
//! let gate = IngestionGate::new(GateConfig::default()).unwrap();
//! let decision = gate.evaluate(&GateCandidate::new(
//!     "Customer data is stored in Germany",
//!     ClaimType::Factual,
//!     RhetoricalRole::Fact,
//! ));
//! assert_eq!(decision.claim_key.unwrap().key, "residency_germany");
//! ```

#![warn(missing_docs)]

mod config;
mod dedup;
mod error;
mod gate;
mod policy;
mod pool;
mod tagging;

pub use config::{default_meta_patterns, DedupConfig, GateConfig};
pub use dedup::{dedup_claims, DedupOutcome, DedupStats, DocumentDeduplicator};
pub use error::GatekeeperError;
pub use gate::{GateCandidate, GateDecision, GateStats, IngestionGate};
pub use policy::{PolicyVerdict, Promotion, PromotionPolicy, RhetoricalRole};
pub use pool::{DocumentPool, DocumentResult};
pub use tagging::{default_identity_patterns, normalize_placeholder, ClaimKeyTagger, IdentityPattern, IdentityTag};
