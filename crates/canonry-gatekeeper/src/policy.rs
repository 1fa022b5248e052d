//! Promotion policy
//!
//! Decides whether a candidate statement becomes a governed claim, and
//! whether it is linked into the identity graph.

use crate::GatekeeperError;
use canonry_domain::ClaimType;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

/// Discourse role a statement plays in its document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RhetoricalRole {
    /// States a fact
    Fact,
    /// Defines a term
    Definition,
    /// Tells the reader what to do
    Instruction,
    /// Illustrates
    Example,
    /// Expresses a view
    Opinion,
    /// Talks about the document itself
    Meta,
    /// Anything else
    Other,
}

impl RhetoricalRole {
    /// Role name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            RhetoricalRole::Fact => "fact",
            RhetoricalRole::Definition => "definition",
            RhetoricalRole::Instruction => "instruction",
            RhetoricalRole::Example => "example",
            RhetoricalRole::Opinion => "opinion",
            RhetoricalRole::Meta => "meta",
            RhetoricalRole::Other => "other",
        }
    }

    fn links(&self) -> bool {
        matches!(
            self,
            RhetoricalRole::Fact | RhetoricalRole::Definition | RhetoricalRole::Instruction
        )
    }
}

/// Outcome of the promotion policy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Promotion {
    /// Governed and linked into the identity graph
    PromotedLinked,
    /// Governed, but explicitly lacking an identity key
    PromotedUnlinked,
    /// Not governed
    Rejected,
}

impl Promotion {
    /// Outcome name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Promotion::PromotedLinked => "PROMOTED_LINKED",
            Promotion::PromotedUnlinked => "PROMOTED_UNLINKED",
            Promotion::Rejected => "REJECTED",
        }
    }

    /// Whether the candidate becomes a governed claim
    pub fn is_promoted(&self) -> bool {
        !matches!(self, Promotion::Rejected)
    }

    /// Promoted without an identity key
    pub fn lacks_identity_key(&self) -> bool {
        matches!(self, Promotion::PromotedUnlinked)
    }
}

/// Promotion outcome with its justification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyVerdict {
    /// The outcome
    pub promotion: Promotion,
    /// Short human-readable reason
    pub justification: String,
}

/// The promotion rule set
///
/// Reject checks run first: a boilerplate statement is rejected even when it
/// carries a parsed value.
pub struct PromotionPolicy {
    min_text_length: usize,
    meta: Vec<Regex>,
}

impl PromotionPolicy {
    /// Compile a policy
    pub fn new(min_text_length: usize, meta_patterns: &[String]) -> Result<Self, GatekeeperError> {
        let meta = meta_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| GatekeeperError::Config(format!("meta pattern '{}': {}", p, e)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            min_text_length,
            meta,
        })
    }

    /// Decide one candidate
    pub fn decide(
        &self,
        claim_type: ClaimType,
        role: RhetoricalRole,
        has_value: bool,
        text: &str,
    ) -> PolicyVerdict {
        let trimmed = text.trim();
        let length = trimmed.chars().count();
        if length < self.min_text_length {
            return PolicyVerdict {
                promotion: Promotion::Rejected,
                justification: format!(
                    "text too short ({} < {} chars)",
                    length, self.min_text_length
                ),
            };
        }
        if let Some(pattern) = self.meta.iter().find(|re| re.is_match(trimmed)) {
            return PolicyVerdict {
                promotion: Promotion::Rejected,
                justification: format!("meta/boilerplate statement (matches '{}')", pattern.as_str()),
            };
        }

        if matches!(claim_type, ClaimType::Prescriptive | ClaimType::Definitional) {
            return PolicyVerdict {
                promotion: Promotion::PromotedLinked,
                justification: format!("{} statement", claim_type.as_str().to_lowercase()),
            };
        }
        if role.links() {
            return PolicyVerdict {
                promotion: Promotion::PromotedLinked,
                justification: format!("rhetorical role '{}'", role.as_str()),
            };
        }
        if has_value {
            return PolicyVerdict {
                promotion: Promotion::PromotedLinked,
                justification: "carries a parsed value".to_string(),
            };
        }

        PolicyVerdict {
            promotion: Promotion::PromotedUnlinked,
            justification: format!(
                "no identity key: {} statement with role '{}' and no parsed value",
                claim_type.as_str().to_lowercase(),
                role.as_str()
            ),
        }
    }
}
