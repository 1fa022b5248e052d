//! Source documents and their revisions

use crate::{AuthorityLevel, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a source document
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DocumentId(String);

impl DocumentId {
    /// Create a document id
    ///
    /// # Errors
    /// Returns error if the id is empty
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField("document id"));
        }
        Ok(Self(value))
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DocumentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A source document known to the store
///
/// Revisions of the same document share a `family`; a higher `revision`
/// number is a newer edition of that family.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    /// Document identifier
    pub id: DocumentId,

    /// Owning tenant
    pub tenant: String,

    /// Revision family (e.g. "security-whitepaper")
    pub family: String,

    /// Revision number within the family
    pub revision: u32,

    /// How trustworthy the document is
    pub authority: AuthorityLevel,
}

impl SourceDocument {
    /// Create a new source document record
    pub fn new(
        id: DocumentId,
        tenant: impl Into<String>,
        family: impl Into<String>,
        revision: u32,
        authority: AuthorityLevel,
    ) -> Self {
        Self {
            id,
            tenant: tenant.into(),
            family: family.into(),
            revision,
            authority,
        }
    }

    /// Whether `self` is a strictly newer revision of the same family as `other`
    pub fn is_newer_revision_of(&self, other: &SourceDocument) -> bool {
        self.family == other.family && self.revision > other.revision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn doc(id: &str, family: &str, revision: u32) -> SourceDocument {
        SourceDocument::new(
            DocumentId::new(id).unwrap(),
            "acme",
            family,
            revision,
            AuthorityLevel::Official,
        )
    }

    #[test]
    fn test_revision_ordering() {
        let v1 = doc("d1", "whitepaper", 1);
        let v2 = doc("d2", "whitepaper", 2);
        let other = doc("d3", "faq", 5);

        assert!(v2.is_newer_revision_of(&v1));
        assert!(!v1.is_newer_revision_of(&v2));
        assert!(!other.is_newer_revision_of(&v1));
    }
}
