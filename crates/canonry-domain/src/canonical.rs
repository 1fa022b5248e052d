//! Canonical claims and the edges between them
//!
//! A [`CanonicalClaim`] aggregates matching claims across documents. Claims
//! SUPPORT a canonical claim; canonical claims may CONFLICT_WITH or SUPERSEDE
//! one another. Only pairwise edges are modelled.

use crate::fingerprint::digest_u128;
use crate::{AuthorityLevel, ClaimId, ClaimKey, DocumentId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Stable identifier of a canonical claim
///
/// Derived from tenant + content fingerprint, so re-running consolidation
/// targets the same canonical id and upserts stay idempotent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CanonicalId(u128);

impl CanonicalId {
    /// Derive the id for a content fingerprint within a tenant
    pub fn derive(tenant: &str, content_fingerprint: &str) -> Self {
        Self(digest_u128(&[tenant, content_fingerprint]))
    }

    /// Create from a raw value (storage deserialization)
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl fmt::Display for CanonicalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Lifecycle status of a canonical claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CanonicalStatus {
    /// Current
    Active,
    /// Replaced by a newer canonical claim
    Superseded,
}

impl CanonicalStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            CanonicalStatus::Active => "active",
            CanonicalStatus::Superseded => "superseded",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "active" => Some(CanonicalStatus::Active),
            "superseded" => Some(CanonicalStatus::Superseded),
            _ => None,
        }
    }
}

/// Cross-document aggregation of matching claims
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalClaim {
    /// Stable identifier
    pub id: CanonicalId,

    /// Owning tenant
    pub tenant: String,

    /// Representative statement text
    pub text: String,

    /// Shared content fingerprint of the supporting claims
    pub content_fingerprint: String,

    /// Shared scope key
    pub scope_key: String,

    /// Identity key, if any supporting claim was tagged
    pub claim_key: Option<ClaimKey>,

    /// Value parsed by identity tagging
    pub value: Option<String>,

    /// Highest authority among supporting documents
    pub authority: AuthorityLevel,

    /// Lifecycle status
    pub status: CanonicalStatus,

    /// Claims supporting this canonical claim
    pub supporting_claims: BTreeSet<ClaimId>,

    /// Documents those claims come from
    pub documents: BTreeSet<DocumentId>,

    /// Last merge timestamp
    pub updated_at: u64,
}

impl CanonicalClaim {
    /// Create a canonical claim with no supporters yet
    pub fn new(
        tenant: impl Into<String>,
        text: impl Into<String>,
        content_fingerprint: impl Into<String>,
        scope_key: impl Into<String>,
    ) -> Self {
        let tenant = tenant.into();
        let content_fingerprint = content_fingerprint.into();
        Self {
            id: CanonicalId::derive(&tenant, &content_fingerprint),
            tenant,
            text: text.into(),
            content_fingerprint,
            scope_key: scope_key.into(),
            claim_key: None,
            value: None,
            authority: AuthorityLevel::Unknown,
            status: CanonicalStatus::Active,
            supporting_claims: BTreeSet::new(),
            documents: BTreeSet::new(),
            updated_at: crate::current_timestamp(),
        }
    }

    /// Merge another snapshot of the same canonical claim into this one
    ///
    /// Additive and idempotent: supporters and documents are unioned,
    /// authority takes the maximum, a missing key/value is filled in, and a
    /// superseded status is never reverted.
    pub fn merge(&mut self, other: &CanonicalClaim) {
        debug_assert_eq!(self.id, other.id);
        self.supporting_claims
            .extend(other.supporting_claims.iter().copied());
        self.documents.extend(other.documents.iter().cloned());
        self.authority = self.authority.max(other.authority);
        if self.claim_key.is_none() {
            self.claim_key = other.claim_key.clone();
        }
        if self.value.is_none() {
            self.value = other.value.clone();
        }
        if other.status == CanonicalStatus::Superseded {
            self.status = CanonicalStatus::Superseded;
        }
        self.updated_at = self.updated_at.max(other.updated_at);
    }

    /// Number of supporting claims
    pub fn support_count(&self) -> usize {
        self.supporting_claims.len()
    }

    /// Whether the canonical claim is still current
    pub fn is_active(&self) -> bool {
        self.status == CanonicalStatus::Active
    }
}

/// A pairwise edge in the canonical graph
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CanonicalEdge {
    /// A document-level claim supports a canonical claim
    Supports {
        /// Supporting claim
        claim: ClaimId,
        /// Supported canonical claim
        canonical: CanonicalId,
    },

    /// Two canonical claims state incompatible values for the same fact
    ConflictsWith {
        /// One side
        a: CanonicalId,
        /// Other side
        b: CanonicalId,
    },

    /// A newer canonical claim replaces an older one
    Supersedes {
        /// Replacing claim
        newer: CanonicalId,
        /// Replaced claim
        older: CanonicalId,
    },
}

impl CanonicalEdge {
    /// A conflict edge with its endpoints in canonical (sorted) order
    ///
    /// Conflicts are symmetric; sorting makes `(a, b)` and `(b, a)` the same edge.
    pub fn conflict(x: CanonicalId, y: CanonicalId) -> Self {
        let (a, b) = if x <= y { (x, y) } else { (y, x) };
        CanonicalEdge::ConflictsWith { a, b }
    }

    /// Edge kind as a string
    pub fn kind_str(&self) -> &'static str {
        match self {
            CanonicalEdge::Supports { .. } => "supports",
            CanonicalEdge::ConflictsWith { .. } => "conflicts_with",
            CanonicalEdge::Supersedes { .. } => "supersedes",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(fp: &str) -> CanonicalClaim {
        CanonicalClaim::new("acme", "uptime is 99.9%", fp, "global")
    }

    #[test]
    fn test_id_is_deterministic() {
        assert_eq!(canonical("fp1").id, canonical("fp1").id);
        assert_ne!(canonical("fp1").id, canonical("fp2").id);
        assert_ne!(
            CanonicalId::derive("acme", "fp1"),
            CanonicalId::derive("globex", "fp1")
        );
    }

    #[test]
    fn test_merge_is_additive_and_idempotent() {
        let mut base = canonical("fp");
        base.supporting_claims.insert(ClaimId::from_value(1));

        let mut incoming = canonical("fp");
        incoming.supporting_claims.insert(ClaimId::from_value(2));
        incoming.authority = AuthorityLevel::Official;
        incoming.claim_key = Some(ClaimKey::new("reliability", "sla_uptime"));

        base.merge(&incoming);
        let once = base.clone();
        base.merge(&incoming);

        assert_eq!(base, once);
        assert_eq!(base.support_count(), 2);
        assert_eq!(base.authority, AuthorityLevel::Official);
        assert!(base.claim_key.is_some());
    }

    #[test]
    fn test_superseded_is_sticky() {
        let mut base = canonical("fp");
        let mut retired = canonical("fp");
        retired.status = CanonicalStatus::Superseded;

        base.merge(&retired);
        assert!(!base.is_active());

        base.merge(&canonical("fp"));
        assert!(!base.is_active());
    }

    #[test]
    fn test_conflict_edge_is_symmetric() {
        let x = CanonicalId::from_value(5);
        let y = CanonicalId::from_value(9);
        assert_eq!(CanonicalEdge::conflict(x, y), CanonicalEdge::conflict(y, x));
    }
}
