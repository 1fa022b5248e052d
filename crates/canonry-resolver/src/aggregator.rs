//! Verification comparison aggregator
//!
//! Folds many per-evidence comparisons into one verdict. Conflicting evidence
//! of equal authority is surfaced as [`Verdict::Unknown`] with both sides
//! attached rather than being decided by count or confidence.

use crate::AggregatorConfig;
use canonry_domain::{AuthorityTier, StructuredForm};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Outcome of comparing a statement against evidence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    /// Evidence supports the statement
    Supports,
    /// Evidence contradicts the statement
    Contradicts,
    /// Evidence supports part of it
    Partial,
    /// Evidence holds only under a scope the statement lacks
    NeedsScope,
    /// Nothing can be said
    Unknown,
}

impl Verdict {
    /// Get the verdict name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            Verdict::Supports => "SUPPORTS",
            Verdict::Contradicts => "CONTRADICTS",
            Verdict::Partial => "PARTIAL",
            Verdict::NeedsScope => "NEEDS_SCOPE",
            Verdict::Unknown => "UNKNOWN",
        }
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One comparison against one piece of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Comparison {
    /// Verdict for this evidence
    pub verdict: Verdict,
    /// Short reason from the comparer
    pub reason: String,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Authority tier of the evidence source
    pub authority: AuthorityTier,
    /// How well the evidence scope matches the statement, in [0, 1]
    pub scope_match: f64,
}

impl Comparison {
    /// Create a comparison with a full scope match; confidence is clamped to [0, 1]
    pub fn new(verdict: Verdict, confidence: f64, authority: AuthorityTier) -> Self {
        Self {
            verdict,
            reason: String::new(),
            confidence: confidence.clamp(0.0, 1.0),
            authority,
            scope_match: 1.0,
        }
    }

    /// Set the scope-match score (clamped to [0, 1])
    pub fn with_scope_match(mut self, scope_match: f64) -> Self {
        self.scope_match = scope_match.clamp(0.0, 1.0);
        self
    }

    /// Set the reason
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = reason.into();
        self
    }

    /// Ordering used for ranking: authority, then scope match, then confidence, all descending
    fn rank_cmp(&self, other: &Self) -> Ordering {
        other
            .authority
            .cmp(&self.authority)
            .then_with(|| other.scope_match.total_cmp(&self.scope_match))
            .then_with(|| other.confidence.total_cmp(&self.confidence))
    }
}

/// Reason code of an aggregate verdict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReasonCode {
    /// Highest-ranked informative comparison decided
    TopVerdict,
    /// SUPPORTS and CONTRADICTS in the same authority tier
    ConflictingEvidence,
    /// Only LOW authority evidence was available
    LowAuthorityOnly,
    /// Every comparison was UNKNOWN
    InsufficientEvidence,
    /// Nothing to aggregate
    NoComparisons,
    /// The assertion has no structured form to compare
    NoStructuredForm,
}

impl ReasonCode {
    /// Reason code as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            ReasonCode::TopVerdict => "top_verdict",
            ReasonCode::ConflictingEvidence => "conflicting_evidence",
            ReasonCode::LowAuthorityOnly => "low_authority_only",
            ReasonCode::InsufficientEvidence => "insufficient_evidence",
            ReasonCode::NoComparisons => "no_comparisons",
            ReasonCode::NoStructuredForm => "no_structured_form",
        }
    }
}

/// Aggregated verdict
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateVerdict {
    /// Final verdict
    pub verdict: Verdict,
    /// Why this verdict
    pub reason: ReasonCode,
    /// Confidence in [0, 1]
    pub confidence: f64,
    /// Human-readable justification
    pub justification: String,
    /// Comparisons the verdict rests on; both sides for a conflict
    pub evidence: Vec<Comparison>,
}

impl AggregateVerdict {
    /// Whether conflicting evidence was found
    pub fn is_conflict(&self) -> bool {
        self.reason == ReasonCode::ConflictingEvidence
    }
}

/// Verification aggregator
#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    config: AggregatorConfig,
}

impl Aggregator {
    /// Create an aggregator with the given blending constants
    pub fn new(config: AggregatorConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &AggregatorConfig {
        &self.config
    }

    /// Verify an assertion against its per-claim comparisons
    ///
    /// Without a structured form nothing was comparable, so the result is
    /// UNKNOWN whatever the comparisons say. Otherwise this is
    /// [`Aggregator::aggregate`] with the assertion named in the
    /// justification.
    pub fn verify(
        &self,
        assertion: Option<&StructuredForm>,
        comparisons: &[Comparison],
    ) -> AggregateVerdict {
        let Some(form) = assertion else {
            return AggregateVerdict {
                verdict: Verdict::Unknown,
                reason: ReasonCode::NoStructuredForm,
                confidence: 0.0,
                justification: "assertion has no parseable structured form".to_string(),
                evidence: Vec::new(),
            };
        };

        let mut result = self.aggregate(comparisons);
        result.justification = format!(
            "'{} {} {}': {}",
            form.subject, form.predicate, form.object, result.justification
        );
        result
    }

    /// Aggregate comparisons into one verdict
    pub fn aggregate(&self, comparisons: &[Comparison]) -> AggregateVerdict {
        if comparisons.is_empty() {
            return AggregateVerdict {
                verdict: Verdict::Unknown,
                reason: ReasonCode::NoComparisons,
                confidence: 0.0,
                justification: "no comparisons to aggregate".to_string(),
                evidence: Vec::new(),
            };
        }

        let mut informative: Vec<&Comparison> = comparisons
            .iter()
            .filter(|c| c.verdict != Verdict::Unknown)
            .collect();

        if informative.is_empty() {
            let best = comparisons
                .iter()
                .max_by(|a, b| a.confidence.total_cmp(&b.confidence))
                .cloned();
            let confidence = best
                .as_ref()
                .map_or(0.0, |c| c.confidence * self.config.insufficient_evidence_factor);
            return AggregateVerdict {
                verdict: Verdict::Unknown,
                reason: ReasonCode::InsufficientEvidence,
                confidence,
                justification: format!(
                    "all {} comparisons were inconclusive",
                    comparisons.len()
                ),
                evidence: best.into_iter().collect(),
            };
        }

        informative.sort_by(|a, b| a.rank_cmp(b));

        for tier in [AuthorityTier::High, AuthorityTier::Medium, AuthorityTier::Low] {
            let support = informative
                .iter()
                .find(|c| c.authority == tier && c.verdict == Verdict::Supports);
            let contradict = informative
                .iter()
                .find(|c| c.authority == tier && c.verdict == Verdict::Contradicts);
            if let (Some(&support), Some(&contradict)) = (support, contradict) {
                return AggregateVerdict {
                    verdict: Verdict::Unknown,
                    reason: ReasonCode::ConflictingEvidence,
                    confidence: support.confidence.min(contradict.confidence),
                    justification: format!(
                        "{} authority evidence both supports and contradicts",
                        tier.as_str()
                    ),
                    evidence: vec![support.clone(), contradict.clone()],
                };
            }
        }

        let top = informative[0];

        if informative.iter().all(|c| c.authority == AuthorityTier::Low) {
            return AggregateVerdict {
                verdict: top.verdict,
                reason: ReasonCode::LowAuthorityOnly,
                confidence: top.confidence * self.config.low_authority_penalty,
                justification: format!(
                    "{} from LOW authority evidence only ({} comparisons)",
                    top.verdict,
                    informative.len()
                ),
                evidence: vec![top.clone()],
            };
        }

        let agreeing = informative[1..]
            .iter()
            .filter(|c| c.verdict == top.verdict)
            .count();
        let boost = (self.config.boost_step * agreeing as f64).min(self.config.boost_cap);
        let confidence =
            ((top.confidence + boost) * self.config.multiplier(top.authority)).min(1.0);

        AggregateVerdict {
            verdict: top.verdict,
            reason: ReasonCode::TopVerdict,
            confidence,
            justification: format!(
                "{} from {} authority evidence, {} agreeing",
                top.verdict,
                top.authority.as_str(),
                agreeing
            ),
            evidence: vec![top.clone()],
        }
    }
}
