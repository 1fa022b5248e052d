//! Claim module - one evidence-backed statement from one source document

use crate::fingerprint::{claim_fingerprint, content_fingerprint, normalize_text};
use crate::{ClaimKey, Confidence, DocumentId, PassageId, Scope, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum claim text length, in chars
pub const MAX_CLAIM_TEXT_CHARS: usize = 500;

/// Unique identifier for a claim based on UUIDv7
///
/// UUIDv7 keeps identifiers chronologically sortable, which dedup relies on
/// for a stable tie-break between equally confident claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClaimId(u128);

impl ClaimId {
    /// Generate a new UUIDv7-based ClaimId
    ///
    /// # Examples
    ///
    /// ```
    /// use canonry_domain::ClaimId;
    ///
    /// let id = ClaimId::new();
    /// assert!(id.value() > 0);
    /// ```
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a ClaimId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a ClaimId from a UUID string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid UUIDv7 string: {}", e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }
}

impl Default for ClaimId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ClaimId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

/// Rhetorical kind of statement a claim makes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ClaimType {
    /// States how things are
    Factual,
    /// States what must be done
    Prescriptive,
    /// Defines a term
    Definitional,
    /// Holds only under a condition
    Conditional,
    /// States what is allowed
    Permissive,
    /// Describes steps
    Procedural,
}

impl ClaimType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimType::Factual => "FACTUAL",
            ClaimType::Prescriptive => "PRESCRIPTIVE",
            ClaimType::Definitional => "DEFINITIONAL",
            ClaimType::Conditional => "CONDITIONAL",
            ClaimType::Permissive => "PERMISSIVE",
            ClaimType::Procedural => "PROCEDURAL",
        }
    }

    /// Parse a claim type from a string (case-insensitive)
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "FACTUAL" => Some(ClaimType::Factual),
            "PRESCRIPTIVE" => Some(ClaimType::Prescriptive),
            "DEFINITIONAL" => Some(ClaimType::Definitional),
            "CONDITIONAL" => Some(ClaimType::Conditional),
            "PERMISSIVE" => Some(ClaimType::Permissive),
            "PROCEDURAL" => Some(ClaimType::Procedural),
            _ => None,
        }
    }
}

impl std::str::FromStr for ClaimType {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| ValidationError::UnknownVariant {
            kind: "claim type",
            value: s.to_string(),
        })
    }
}

/// Lifecycle status of a claim
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClaimStatus {
    /// Current
    Active,
    /// Retired by a newer claim
    Superseded,
}

impl ClaimStatus {
    /// Get the status name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ClaimStatus::Active => "active",
            ClaimStatus::Superseded => "superseded",
        }
    }

    /// Parse a status from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "active" => Some(ClaimStatus::Active),
            "superseded" => Some(ClaimStatus::Superseded),
            _ => None,
        }
    }
}

/// Subject / predicate / object form for deterministic comparison
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredForm {
    /// Subject of the statement
    pub subject: String,
    /// Predicate / relationship
    pub predicate: String,
    /// Object or value
    pub object: String,
}

impl StructuredForm {
    /// Create a structured form; all three parts are required
    pub fn new(
        subject: impl Into<String>,
        predicate: impl Into<String>,
        object: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let form = Self {
            subject: subject.into(),
            predicate: predicate.into(),
            object: object.into(),
        };
        if form.subject.trim().is_empty() {
            return Err(ValidationError::EmptyField("subject"));
        }
        if form.predicate.trim().is_empty() {
            return Err(ValidationError::EmptyField("predicate"));
        }
        if form.object.trim().is_empty() {
            return Err(ValidationError::EmptyField("object"));
        }
        Ok(form)
    }

    /// Lower-cased, trimmed triplet used for grouping
    pub fn normalized(&self) -> (String, String, String) {
        (
            normalize_text(&self.subject),
            normalize_text(&self.predicate),
            normalize_text(&self.object),
        )
    }
}

/// A claim - one precise statement scoped to a single source document
///
/// Claims are only ever extended (new evidence, a claim key, a content
/// fingerprint) and never silently rewritten. Cross-document aggregation
/// lives one level up, in [`crate::CanonicalClaim`].
#[derive(Debug, Clone, PartialEq)]
pub struct Claim {
    /// Unique identifier
    pub id: ClaimId,

    /// Owning tenant
    pub tenant: String,

    /// The one source document this claim belongs to
    pub document_id: DocumentId,

    /// The statement (non-empty, at most 500 chars)
    pub text: String,

    /// Kind of statement
    pub claim_type: ClaimType,

    /// Contextual qualifiers
    pub scope: Scope,

    /// Verbatim source excerpt
    pub verbatim_quote: String,

    /// Evidence passages proving the claim
    pub unit_ids: Vec<PassageId>,

    /// Extraction confidence
    pub confidence: Confidence,

    /// Optional subject/predicate/object form
    pub structured_form: Option<StructuredForm>,

    /// Identity assigned by the ingestion gate, if any
    pub claim_key: Option<ClaimKey>,

    /// Value parsed by identity tagging (e.g. "1.2" for a TLS version)
    pub value: Option<String>,

    /// Lifecycle status
    pub status: ClaimStatus,

    /// Hash of document + text + scope
    pub fingerprint: String,

    /// Hash of text + scope, set once dedup has fixed the survivors
    pub content_fingerprint: Option<String>,

    /// When this claim was created (seconds since epoch)
    pub created_at: u64,
}

impl Claim {
    /// Order-independent key of the claim's scope
    pub fn scope_key(&self) -> String {
        self.scope.scope_key()
    }

    /// Normalized text used for exact-text grouping
    pub fn normalized_text(&self) -> String {
        normalize_text(&self.text)
    }

    /// Compute (without storing) the document-independent fingerprint
    pub fn compute_content_fingerprint(&self) -> String {
        content_fingerprint(&self.text, &self.scope_key())
    }

    /// Whether the claim is still current
    pub fn is_active(&self) -> bool {
        self.status == ClaimStatus::Active
    }
}

/// Builder for [`Claim`], validated on [`ClaimDraft::build`]
///
/// # Examples
///
/// ```
/// use canonry_domain::{ClaimDraft, ClaimType, DocumentId, PassageId};
///
/// let claim = ClaimDraft::new(
///     "acme",
///     DocumentId::new("whitepaper-v2").unwrap(),
///     "TLS 1.2 is supported",
///     ClaimType::Factual,
///     "All endpoints support TLS 1.2.",
/// )
/// .with_unit(PassageId::new("p-17").unwrap())
/// .with_confidence(0.9)
/// .build()
/// .unwrap();
///
/// assert_eq!(claim.scope_key(), "global");
/// ```
#[derive(Debug, Clone)]
pub struct ClaimDraft {
    /// Owning tenant
    pub tenant: String,
    /// Source document
    pub document_id: DocumentId,
    /// The statement
    pub text: String,
    /// Kind of statement
    pub claim_type: ClaimType,
    /// Contextual qualifiers
    pub scope: Scope,
    /// Verbatim source excerpt
    pub verbatim_quote: String,
    /// Evidence passages
    pub unit_ids: Vec<PassageId>,
    /// Raw confidence, validated on build
    pub confidence: f64,
    /// Optional subject/predicate/object form
    pub structured_form: Option<StructuredForm>,
}

impl ClaimDraft {
    /// Start a draft with the mandatory fields
    pub fn new(
        tenant: impl Into<String>,
        document_id: DocumentId,
        text: impl Into<String>,
        claim_type: ClaimType,
        verbatim_quote: impl Into<String>,
    ) -> Self {
        Self {
            tenant: tenant.into(),
            document_id,
            text: text.into(),
            claim_type,
            scope: Scope::global(),
            verbatim_quote: verbatim_quote.into(),
            unit_ids: Vec::new(),
            confidence: 1.0,
            structured_form: None,
        }
    }

    /// Set the scope
    pub fn with_scope(mut self, scope: Scope) -> Self {
        self.scope = scope;
        self
    }

    /// Add an evidence passage reference
    pub fn with_unit(mut self, unit: PassageId) -> Self {
        self.unit_ids.push(unit);
        self
    }

    /// Set the extraction confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = confidence;
        self
    }

    /// Set the structured form
    pub fn with_structured_form(mut self, form: StructuredForm) -> Self {
        self.structured_form = Some(form);
        self
    }

    /// Validate and build the claim
    ///
    /// # Errors
    ///
    /// - [`ValidationError::EmptyText`] / [`ValidationError::TextTooLong`]
    /// - [`ValidationError::MissingVerbatimQuote`]
    /// - [`ValidationError::MissingEvidence`] when `unit_ids` is empty
    /// - [`ValidationError::ConfidenceOutOfRange`]
    pub fn build(self) -> Result<Claim, ValidationError> {
        if self.tenant.trim().is_empty() {
            return Err(ValidationError::EmptyField("tenant"));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::EmptyText);
        }
        let chars = self.text.chars().count();
        if chars > MAX_CLAIM_TEXT_CHARS {
            return Err(ValidationError::TextTooLong {
                chars,
                max: MAX_CLAIM_TEXT_CHARS,
            });
        }
        if self.verbatim_quote.trim().is_empty() {
            return Err(ValidationError::MissingVerbatimQuote);
        }
        if self.unit_ids.is_empty() {
            return Err(ValidationError::MissingEvidence);
        }
        let confidence = Confidence::new(self.confidence)?;
        let fingerprint = claim_fingerprint(&self.document_id, &self.text, &self.scope.scope_key());

        Ok(Claim {
            id: ClaimId::new(),
            tenant: self.tenant,
            document_id: self.document_id,
            text: self.text,
            claim_type: self.claim_type,
            scope: self.scope,
            verbatim_quote: self.verbatim_quote,
            unit_ids: self.unit_ids,
            confidence,
            structured_form: self.structured_form,
            claim_key: None,
            value: None,
            status: ClaimStatus::Active,
            fingerprint,
            content_fingerprint: None,
            created_at: crate::current_timestamp(),
        })
    }
}
