//! Trait definitions for external interactions
//!
//! These traits are the boundaries between the governance logic and its
//! collaborators. Implementations live in other crates.

use crate::{
    ApplicabilityAxis, AxisValue, CanonicalClaim, CanonicalEdge, CanonicalId, Claim, ClaimId,
    ClaimStatus, DocumentId, EvidencePassage, SourceDocument,
};
use std::time::Duration;

/// Filter for fetching claims of one tenant
#[derive(Debug, Clone, Default)]
pub struct ClaimFilter {
    /// Only claims of this document
    pub document_id: Option<DocumentId>,

    /// Only claims in this status
    pub status: Option<ClaimStatus>,

    /// Maximum results to return
    pub limit: Option<usize>,
}

impl ClaimFilter {
    /// Claims of a single document
    pub fn document(document_id: DocumentId) -> Self {
        Self {
            document_id: Some(document_id),
            ..Default::default()
        }
    }

    /// Active claims only
    pub fn active() -> Self {
        Self {
            status: Some(ClaimStatus::Active),
            ..Default::default()
        }
    }
}

/// Persistence contract for claims, canonical claims, axes and leases
///
/// Methods take `&self`: implementations are shared across worker tasks and
/// synchronize internally. `upsert_canonical` must be an idempotent merge
/// keyed by the canonical id and atomic per id, so concurrent promotion of two
/// claims into the same canonical identity loses no update.
pub trait GovernanceStore {
    /// Error type for store operations
    type Error;

    /// Record (or replace) a source document
    fn put_document(&self, document: &SourceDocument) -> Result<(), Self::Error>;

    /// Get a source document
    fn get_document(&self, id: &DocumentId) -> Result<Option<SourceDocument>, Self::Error>;

    /// Record (or replace) an evidence passage
    fn put_passage(&self, passage: &EvidencePassage) -> Result<(), Self::Error>;

    /// Number of passages stored for a document
    fn count_passages(&self, document_id: &DocumentId) -> Result<usize, Self::Error>;

    /// Insert or replace a claim by id
    fn save_claim(&self, claim: &Claim) -> Result<(), Self::Error>;

    /// Get a claim by id
    fn get_claim(&self, id: ClaimId) -> Result<Option<Claim>, Self::Error>;

    /// Fetch claims of a tenant
    fn fetch_claims(&self, tenant: &str, filter: &ClaimFilter) -> Result<Vec<Claim>, Self::Error>;

    /// Delete a claim, cascading to evidence passages no longer referenced by
    /// any claim; returns the number of passages removed
    fn delete_claim(&self, id: ClaimId) -> Result<usize, Self::Error>;

    /// Idempotently merge a canonical claim by id; returns the merged state
    fn upsert_canonical(&self, canonical: &CanonicalClaim) -> Result<CanonicalClaim, Self::Error>;

    /// Get a canonical claim
    fn get_canonical(&self, id: CanonicalId) -> Result<Option<CanonicalClaim>, Self::Error>;

    /// Fetch all canonical claims of a tenant
    fn fetch_canonicals(&self, tenant: &str) -> Result<Vec<CanonicalClaim>, Self::Error>;

    /// Record an edge; recording the same edge twice is a no-op
    fn add_edge(&self, tenant: &str, edge: &CanonicalEdge) -> Result<(), Self::Error>;

    /// Edges touching a canonical claim
    fn edges_for(&self, id: CanonicalId) -> Result<Vec<CanonicalEdge>, Self::Error>;

    /// Retire a canonical claim
    fn mark_superseded(&self, id: CanonicalId) -> Result<(), Self::Error>;

    /// Fetch an axis with its values
    fn fetch_axis(&self, tenant: &str, axis_key: &str) -> Result<Option<ApplicabilityAxis>, Self::Error>;

    /// Append an observed value to an axis (creating the axis if needed)
    fn upsert_axis_value(
        &self,
        tenant: &str,
        axis_key: &str,
        value: &AxisValue,
    ) -> Result<ApplicabilityAxis, Self::Error>;

    /// Persist an axis' label and ordering
    fn save_axis_ordering(&self, axis: &ApplicabilityAxis) -> Result<(), Self::Error>;

    /// Try to take the named lease for `ttl`; false if someone else holds it
    fn try_acquire_lease(&self, name: &str, holder: &str, ttl: Duration) -> Result<bool, Self::Error>;

    /// Release the named lease if `holder` owns it
    fn release_lease(&self, name: &str, holder: &str) -> Result<(), Self::Error>;
}

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (canonry-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate text completion
    fn generate(&self, prompt: &str) -> Result<String, Self::Error>;

    /// Generate with structured output (if supported)
    fn generate_structured(&self, prompt: &str, schema: &str) -> Result<String, Self::Error>;
}

/// Two entity names whose identity is in question
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityPair {
    /// First name
    pub left: String,
    /// Second name
    pub right: String,
    /// Snippets where the names occur
    pub context: Vec<String>,
}

impl EntityPair {
    /// Create a pair without context
    pub fn new(left: impl Into<String>, right: impl Into<String>) -> Self {
        Self {
            left: left.into(),
            right: right.into(),
            context: Vec::new(),
        }
    }

    /// Attach a context snippet
    pub fn with_context(mut self, snippet: impl Into<String>) -> Self {
        self.context.push(snippet.into());
        self
    }
}

/// Why an arbiter declined to decide
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AbstainReason {
    /// The model itself was unsure
    ModelUncertain,
    /// The collaborator could not be reached
    CollaboratorUnavailable,
    /// The collaborator answered with something unparsable
    UnparsableResponse,
    /// The answer did not cover this pair
    MissingDecision,
}

impl AbstainReason {
    /// Reason code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            AbstainReason::ModelUncertain => "model_uncertain",
            AbstainReason::CollaboratorUnavailable => "collaborator_unavailable",
            AbstainReason::UnparsableResponse => "unparsable_response",
            AbstainReason::MissingDecision => "missing_decision",
        }
    }
}

/// Decision on whether two entity names denote the same entity
///
/// Failures are never mapped to `Same` or `Different`: an outage and an
/// unparsable answer both become `Abstain`, the same variant used for genuine
/// uncertainty, so downstream code has one path for "no decision".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeDecision {
    /// Same entity
    Same,
    /// Different entities
    Different,
    /// No decision
    Abstain(AbstainReason),
}

impl MergeDecision {
    /// Whether a decision was reached
    pub fn is_decided(&self) -> bool {
        !matches!(self, MergeDecision::Abstain(_))
    }
}

/// Capability that decides entity-merge questions in batches
pub trait MergeArbiter {
    /// Decide every pair; the result has exactly one decision per pair, in order
    fn arbitrate(&self, pairs: &[EntityPair]) -> Vec<MergeDecision>;
}
