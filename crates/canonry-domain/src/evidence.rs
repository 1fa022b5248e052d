//! Evidence passages and references
//!
//! A claim's `unit_ids` point at evidence passages: they are the proof. A passage
//! linked for navigation only is never counted as evidence.

use crate::{DocumentId, ValidationError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of an evidence passage (assigned by the document parser)
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PassageId(String);

impl PassageId {
    /// Create a passage id
    ///
    /// # Errors
    /// Returns error if the id is empty
    pub fn new(value: impl Into<String>) -> Result<Self, ValidationError> {
        let value = value.into();
        if value.trim().is_empty() {
            return Err(ValidationError::EmptyField("passage id"));
        }
        Ok(Self(value))
    }

    /// Get the id as a string
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PassageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A passage of source text that claims cite as proof
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvidencePassage {
    /// Passage identifier
    pub id: PassageId,

    /// Document the passage was cut from
    pub document_id: DocumentId,

    /// Passage text
    pub text: String,
}

impl EvidencePassage {
    /// Create a new passage
    pub fn new(id: PassageId, document_id: DocumentId, text: impl Into<String>) -> Self {
        Self {
            id,
            document_id,
            text: text.into(),
        }
    }
}

/// Where an observed value was seen
///
/// Either a stored passage or a textual locator (e.g. `"page 4, table 2"`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EvidenceRef {
    /// Reference to a stored evidence passage
    Passage {
        /// The passage id
        id: PassageId,
    },

    /// Textual snippet locator
    Snippet {
        /// Human-readable location of the snippet
        locator: String,
    },
}

impl EvidenceRef {
    /// Reference a stored passage
    pub fn passage(id: PassageId) -> Self {
        EvidenceRef::Passage { id }
    }

    /// Reference a snippet by locator
    ///
    /// # Errors
    /// Returns error if the locator is empty
    pub fn snippet(locator: impl Into<String>) -> Result<Self, ValidationError> {
        let locator = locator.into();
        if locator.trim().is_empty() {
            return Err(ValidationError::EmptyField("snippet locator"));
        }
        Ok(EvidenceRef::Snippet { locator })
    }

    /// Whether the reference points at something
    ///
    /// Deserialized references bypass the constructors, so this is re-checked
    /// wherever evidence is mandatory.
    pub fn is_present(&self) -> bool {
        match self {
            EvidenceRef::Passage { id } => !id.as_str().trim().is_empty(),
            EvidenceRef::Snippet { locator } => !locator.trim().is_empty(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_passage_id_rejected() {
        assert!(PassageId::new("").is_err());
        assert!(PassageId::new("   ").is_err());
        assert_eq!(PassageId::new("p-1").unwrap().as_str(), "p-1");
    }

    #[test]
    fn test_snippet_requires_locator() {
        assert!(EvidenceRef::snippet("").is_err());
        let ev = EvidenceRef::snippet("page 3").unwrap();
        assert!(ev.is_present());
    }
}
