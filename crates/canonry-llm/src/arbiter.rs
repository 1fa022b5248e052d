//! Entity-merge arbitration through a language model
//!
//! One prompt carries every undecided pair of a batch. The model answers with
//! a JSON array of `{"pair": <index>, "decision": "same" | "different" |
//! "abstain"}`. Anything short of a clean answer becomes an abstain with a
//! reason code; the arbiter never guesses.

use canonry_domain::traits::{AbstainReason, EntityPair, LlmProvider, MergeArbiter, MergeDecision};
use serde::Deserialize;
use std::fmt::Display;
use tracing::{debug, warn};

/// JSON schema handed to providers that support structured output
pub const DECISION_SCHEMA: &str = r#"{"type":"array","items":{"type":"object","required":["pair","decision"],"properties":{"pair":{"type":"integer"},"decision":{"enum":["same","different","abstain"]}}}}"#;

#[derive(Debug, Deserialize)]
struct PairVerdict {
    pair: usize,
    decision: String,
}

/// [`MergeArbiter`] backed by any [`LlmProvider`]
pub struct LlmMergeArbiter<P> {
    provider: P,
}

impl<P> LlmMergeArbiter<P>
where
    P: LlmProvider,
    P::Error: Display,
{
    /// Wrap a provider
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Access the wrapped provider
    pub fn provider(&self) -> &P {
        &self.provider
    }

    fn build_prompt(pairs: &[EntityPair]) -> String {
        let mut prompt = String::from(
            "For each numbered pair below, decide whether the two names refer to the same real-world entity.\n\
             Answer only with a JSON array of objects {\"pair\": <number>, \"decision\": \"same\" | \"different\" | \"abstain\"}.\n\
             Use \"abstain\" when the context does not settle the question.\n\n",
        );
        for (index, pair) in pairs.iter().enumerate() {
            prompt.push_str(&format!("{}: \"{}\" vs \"{}\"\n", index, pair.left, pair.right));
            for snippet in &pair.context {
                prompt.push_str(&format!("   context: {}\n", snippet));
            }
        }
        prompt
    }

    /// Pull the JSON array out of a reply that may wrap it in prose or fences
    fn parse_reply(reply: &str) -> Option<Vec<PairVerdict>> {
        let start = reply.find('[')?;
        let end = reply.rfind(']')?;
        if end < start {
            return None;
        }
        serde_json::from_str(&reply[start..=end]).ok()
    }

    fn to_decision(raw: &str) -> MergeDecision {
        match raw.trim().to_lowercase().as_str() {
            "same" => MergeDecision::Same,
            "different" => MergeDecision::Different,
            "abstain" => MergeDecision::Abstain(AbstainReason::ModelUncertain),
            _ => MergeDecision::Abstain(AbstainReason::UnparsableResponse),
        }
    }
}

impl<P> MergeArbiter for LlmMergeArbiter<P>
where
    P: LlmProvider,
    P::Error: Display,
{
    fn arbitrate(&self, pairs: &[EntityPair]) -> Vec<MergeDecision> {
        if pairs.is_empty() {
            return Vec::new();
        }

        let prompt = Self::build_prompt(pairs);
        let reply = match self.provider.generate_structured(&prompt, DECISION_SCHEMA) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(pairs = pairs.len(), error = %e, "Merge arbiter unavailable, abstaining");
                return vec![MergeDecision::Abstain(AbstainReason::CollaboratorUnavailable); pairs.len()];
            }
        };

        let Some(verdicts) = Self::parse_reply(&reply) else {
            warn!(pairs = pairs.len(), "Merge arbiter reply unparsable, abstaining");
            return vec![MergeDecision::Abstain(AbstainReason::UnparsableResponse); pairs.len()];
        };

        let mut decisions = vec![MergeDecision::Abstain(AbstainReason::MissingDecision); pairs.len()];
        for verdict in verdicts {
            // First answer for a pair wins; out-of-range indexes are ignored
            if let Some(slot) = decisions.get_mut(verdict.pair) {
                if *slot == MergeDecision::Abstain(AbstainReason::MissingDecision) {
                    *slot = Self::to_decision(&verdict.decision);
                }
            }
        }

        debug!(
            pairs = pairs.len(),
            decided = decisions.iter().filter(|d| d.is_decided()).count(),
            "Merge arbitration complete"
        );
        decisions
    }
}
