//! The ingestion gate: identity tagging plus promotion policy

use crate::policy::{Promotion, PromotionPolicy, RhetoricalRole};
use crate::tagging::{ClaimKeyTagger, IdentityTag};
use crate::{GateConfig, GatekeeperError};
use canonry_domain::{Claim, ClaimKey, ClaimType};
use std::collections::HashMap;
use tracing::{debug, info};

/// A statement presented to the gate
#[derive(Debug, Clone)]
pub struct GateCandidate {
    /// Statement text
    pub text: String,
    /// Kind of statement
    pub claim_type: ClaimType,
    /// Discourse role
    pub role: RhetoricalRole,
    /// Local context for placeholder resolution (e.g. `product`, `theme`)
    pub context: HashMap<String, String>,
}

impl GateCandidate {
    /// Create a candidate with an empty context
    pub fn new(text: impl Into<String>, claim_type: ClaimType, role: RhetoricalRole) -> Self {
        Self {
            text: text.into(),
            claim_type,
            role,
            context: HashMap::new(),
        }
    }

    /// Candidate for an already-built claim
    pub fn from_claim(claim: &Claim, role: RhetoricalRole) -> Self {
        Self::new(claim.text.clone(), claim.claim_type, role)
    }

    /// Add a context entry
    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }
}

/// What the gate decided for one candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GateDecision {
    /// Identity key, if tagging fired
    pub claim_key: Option<ClaimKey>,
    /// Full tag, if tagging fired
    pub tag: Option<IdentityTag>,
    /// Promotion outcome
    pub promotion: Promotion,
    /// Short human-readable reason
    pub justification: String,
}

impl GateDecision {
    /// Record identity and value on a claim
    ///
    /// Claims only gain information: an existing key is never overwritten.
    pub fn apply_to(&self, claim: &mut Claim) {
        if claim.claim_key.is_none() {
            claim.claim_key = self.claim_key.clone();
        }
        if claim.value.is_none() {
            claim.value = self.tag.as_ref().and_then(|t| t.value.clone());
        }
    }
}

/// Gate outcome counts for a batch
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GateStats {
    /// Candidates evaluated
    pub evaluated: usize,
    /// Candidates with an identity key
    pub tagged: usize,
    /// Promoted and linked
    pub linked: usize,
    /// Promoted without an identity key
    pub unlinked: usize,
    /// Rejected
    pub rejected: usize,
}

impl GateStats {
    fn record(&mut self, decision: &GateDecision) {
        self.evaluated += 1;
        if decision.claim_key.is_some() {
            self.tagged += 1;
        }
        match decision.promotion {
            Promotion::PromotedLinked => self.linked += 1,
            Promotion::PromotedUnlinked => self.unlinked += 1,
            Promotion::Rejected => self.rejected += 1,
        }
    }
}

/// The ingestion gate
///
/// # Examples
///
/// ```
/// use canonry_gatekeeper::{GateCandidate, GateConfig, IngestionGate, Promotion, RhetoricalRole};
/// use canonry_domain::ClaimType;
///
/// let gate = IngestionGate::new(GateConfig::default()).unwrap();
/// let decision = gate.evaluate(&GateCandidate::new(
///     "TLS 1.2 is supported",
///     ClaimType::Factual,
///     RhetoricalRole::Fact,
/// ));
/// assert_eq!(decision.promotion, Promotion::PromotedLinked);
/// assert_eq!(decision.claim_key.unwrap().key, "tls_min_version");
/// ```
pub struct IngestionGate {
    tagger: ClaimKeyTagger,
    policy: PromotionPolicy,
}

impl IngestionGate {
    /// Compile a gate from configuration
    pub fn new(config: GateConfig) -> Result<Self, GatekeeperError> {
        Ok(Self {
            tagger: ClaimKeyTagger::new(&config.identity_patterns)?,
            policy: PromotionPolicy::new(config.min_text_length, &config.meta_patterns)?,
        })
    }

    /// The identity tagger
    pub fn tagger(&self) -> &ClaimKeyTagger {
        &self.tagger
    }

    /// Tag and decide one candidate
    pub fn evaluate(&self, candidate: &GateCandidate) -> GateDecision {
        let tag = self.tagger.tag(&candidate.text, &candidate.context);
        let has_value = tag.as_ref().is_some_and(IdentityTag::has_value);
        let verdict = self
            .policy
            .decide(candidate.claim_type, candidate.role, has_value, &candidate.text);

        let decision = GateDecision {
            claim_key: tag.as_ref().map(|t| t.claim_key.clone()),
            tag,
            promotion: verdict.promotion,
            justification: verdict.justification,
        };

        if decision.promotion == Promotion::Rejected {
            debug!(text = %candidate.text, reason = %decision.justification, "Gate rejected candidate");
        }
        decision
    }

    /// Evaluate a batch, in order
    pub fn evaluate_batch(&self, candidates: &[GateCandidate]) -> (Vec<GateDecision>, GateStats) {
        let mut stats = GateStats::default();
        let decisions: Vec<GateDecision> = candidates
            .iter()
            .map(|c| {
                let decision = self.evaluate(c);
                stats.record(&decision);
                decision
            })
            .collect();

        info!(
            evaluated = stats.evaluated,
            tagged = stats.tagged,
            linked = stats.linked,
            unlinked = stats.unlinked,
            rejected = stats.rejected,
            "Gate batch complete"
        );
        (decisions, stats)
    }
}
