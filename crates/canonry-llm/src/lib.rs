//! Canonry LLM Provider Layer
//!
//! The language model is an external collaborator reached only through the
//! `LlmProvider` trait from `canonry-domain`. This crate holds what sits on
//! our side of that seam.
//!
//! # Contents
//!
//! - `MockProvider`: scripted collaborator for tests, including outages
//! - `LlmMergeArbiter`: Batched entity-merge arbitration returning
//!   decision-or-abstain
//!
//! # Examples
//!
//! ```
//! use canonry_domain::traits::{AbstainReason, EntityPair, MergeArbiter, MergeDecision};
//! use canonry_llm::{LlmMergeArbiter, MockProvider};
//!
//! let provider = MockProvider::new(r#"[{"pair": 0, "decision": "same"}]"#);
//! let arbiter = LlmMergeArbiter::new(provider);
//!
//! let decisions = arbiter.arbitrate(&[EntityPair::new("AWS", "Amazon Web Services")]);
//! assert_eq!(decisions, vec![MergeDecision::Same]);
//!
//! let offline = LlmMergeArbiter::new(MockProvider::unavailable());
//! let decisions = offline.arbitrate(&[EntityPair::new("AWS", "Amazon Web Services")]);
//! assert_eq!(decisions, vec![MergeDecision::Abstain(AbstainReason::CollaboratorUnavailable)]);
//! ```

#![warn(missing_docs)]

pub mod arbiter;

use canonry_domain::traits::LlmProvider;
use std::sync::{Arc, Mutex};
use thiserror::Error;

pub use arbiter::LlmMergeArbiter;

/// Failures of the language-model collaborator
///
/// Callers in this workspace never surface these; the arbiter turns every one
/// of them into an abstain.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LlmError {
    /// The collaborator could not be reached
    #[error("Collaborator unavailable: {0}")]
    Unavailable(String),

    /// The collaborator refused or failed the request
    #[error("Request rejected: {0}")]
    Rejected(String),
}

#[derive(Debug, Clone)]
enum Script {
    Reply(String),
    Fail(String),
}

/// Scripted language model for deterministic tests
///
/// Replies are chosen by the first rule whose needle occurs in the prompt,
/// falling back to the default reply. Prompts are recorded so tests can
/// assert on batching. Clones share the recording.
///
/// # Examples
///
/// ```
/// use canonry_domain::traits::LlmProvider;
/// use canonry_llm::MockProvider;
///
/// let provider = MockProvider::new("[]")
///     .respond_when("\"GCP\"", r#"[{"pair": 0, "decision": "different"}]"#)
///     .fail_when("\"Azure\"");
///
/// assert!(provider.generate("0: \"GCP\" vs \"Google\"").unwrap().contains("different"));
/// assert!(provider.generate("0: \"Azure\" vs \"AWS\"").is_err());
/// assert_eq!(provider.generate("anything else").unwrap(), "[]");
/// assert_eq!(provider.call_count(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct MockProvider {
    default_reply: String,
    rules: Vec<(String, Script)>,
    offline: bool,
    prompts: Arc<Mutex<Vec<String>>>,
}

impl MockProvider {
    /// Provider answering every prompt with `reply`
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            default_reply: reply.into(),
            rules: Vec::new(),
            offline: false,
            prompts: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// A provider whose every call fails as unreachable
    pub fn unavailable() -> Self {
        Self {
            offline: true,
            ..Self::default()
        }
    }

    /// Answer `reply` to prompts containing `needle`
    pub fn respond_when(mut self, needle: impl Into<String>, reply: impl Into<String>) -> Self {
        self.rules.push((needle.into(), Script::Reply(reply.into())));
        self
    }

    /// Reject prompts containing `needle`
    pub fn fail_when(mut self, needle: impl Into<String>) -> Self {
        let needle = needle.into();
        let reason = format!("scripted failure on {:?}", needle);
        self.rules.push((needle, Script::Fail(reason)));
        self
    }

    /// Number of prompts received
    pub fn call_count(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }

    /// Prompts received so far, oldest first
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }

    /// Forget recorded prompts
    pub fn reset(&self) {
        self.prompts.lock().unwrap().clear();
    }
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::new("[]")
    }
}

impl LlmProvider for MockProvider {
    type Error = LlmError;

    fn generate(&self, prompt: &str) -> Result<String, Self::Error> {
        self.prompts.lock().unwrap().push(prompt.to_string());

        if self.offline {
            return Err(LlmError::Unavailable("mock provider is offline".to_string()));
        }

        let script = self
            .rules
            .iter()
            .find(|(needle, _)| prompt.contains(needle.as_str()))
            .map(|(_, script)| script);

        match script {
            Some(Script::Reply(reply)) => Ok(reply.clone()),
            Some(Script::Fail(reason)) => Err(LlmError::Rejected(reason.clone())),
            None => Ok(self.default_reply.clone()),
        }
    }

    fn generate_structured(&self, prompt: &str, _schema: &str) -> Result<String, Self::Error> {
        self.generate(prompt)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_reply() {
        let provider = MockProvider::default();
        assert_eq!(provider.generate("pairs").unwrap(), "[]");
    }

    #[test]
    fn test_first_matching_rule_wins() {
        let provider = MockProvider::new("fallback")
            .respond_when("AWS", "first")
            .respond_when("Amazon", "second");

        assert_eq!(provider.generate("AWS vs Amazon").unwrap(), "first");
        assert_eq!(provider.generate("Amazon only").unwrap(), "second");
        assert_eq!(provider.generate("GCP").unwrap(), "fallback");
    }

    #[test]
    fn test_scripted_failure() {
        let provider = MockProvider::default().fail_when("Azure");
        assert!(matches!(
            provider.generate("Azure vs Microsoft"),
            Err(LlmError::Rejected(_))
        ));
    }

    #[test]
    fn test_unavailable_still_records() {
        let provider = MockProvider::unavailable();
        assert!(matches!(
            provider.generate_structured("anything", "{}"),
            Err(LlmError::Unavailable(_))
        ));
        assert_eq!(provider.prompts(), vec!["anything"]);
    }

    #[test]
    fn test_clones_share_recording() {
        let provider = MockProvider::default();
        let observer = provider.clone();

        provider.generate("one").unwrap();
        provider.generate("two").unwrap();
        assert_eq!(observer.call_count(), 2);

        observer.reset();
        assert_eq!(provider.call_count(), 0);
    }
}
