//! Canonry Domain Layer
//!
//! The data model and trait seams of the claim governance engine. Every other
//! crate in the workspace depends on this one; it depends only on a handful of
//! primitive crates (identifiers, hashing, serde) and holds no I/O.
//!
//! ## Key Concepts
//!
//! - **Claim**: one precise, evidence-backed statement from exactly one source document
//! - **CanonicalClaim**: the cross-document aggregation that many claims support
//! - **ClaimKey**: deterministic identity (domain + key) assigned by the ingestion gate
//! - **Scope**: contextual qualifiers, reduced to an order-independent scope key
//! - **ApplicabilityAxis**: a contextual dimension whose values may or may not be orderable
//! - **AuthorityLevel**: how trustworthy a source document is
//!
//! ## Uncertainty
//!
//! Outcomes that can be "unknown" are modelled as explicit enum variants
//! ([`AxisOrder::Unknown`], [`LatestValue::Unknown`], [`MergeDecision::Abstain`])
//! so that every call site must handle them.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod authority;
pub mod axis;
pub mod canonical;
pub mod claim;
pub mod claim_key;
pub mod confidence;
pub mod document;
pub mod error;
pub mod evidence;
pub mod fingerprint;
pub mod scope;
pub mod traits;

// Re-exports for convenience
pub use authority::{AuthorityLevel, AuthorityTier};
pub use axis::{
    ApplicabilityAxis, AxisOrder, AxisParts, AxisValue, AxisValueKind, LatestValue, OrderType,
    OrderingConfidence,
};
pub use canonical::{CanonicalClaim, CanonicalEdge, CanonicalId, CanonicalStatus};
pub use claim::{Claim, ClaimDraft, ClaimId, ClaimStatus, ClaimType, StructuredForm};
pub use claim_key::{ClaimKey, ValueKind};
pub use confidence::Confidence;
pub use document::{DocumentId, SourceDocument};
pub use error::ValidationError;
pub use evidence::{EvidencePassage, EvidenceRef, PassageId};
pub use scope::Scope;
pub use traits::{AbstainReason, EntityPair, MergeArbiter, MergeDecision};

/// Current timestamp in seconds since Unix epoch
pub fn current_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
