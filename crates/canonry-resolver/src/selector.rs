//! Latest-Truth Selector
//!
//! Picks "what is currently true" among competing candidates. Source
//! authority decides first, a CERTAIN axis ordering second; when neither is
//! conclusive the answer is an explicit [`SelectionOutcome::AskUser`], never a
//! guess.

use crate::ResolverError;
use canonry_domain::{
    ApplicabilityAxis, AuthorityLevel, AxisOrder, ClaimId, ClaimStatus, ClaimType, LatestValue,
    OrderingConfidence,
};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// What to do when candidates are still tied after authority and axis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TieBreak {
    /// Hand the tie to the user
    #[default]
    AskUser,
    /// Pick the single most confident candidate, if there is one
    HighestConfidence,
}

/// Selection policy
///
/// Serializable so that policies can be stored alongside tenant settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPolicy {
    /// Axis used for recency (e.g. "version"); any axis is accepted when unset
    #[serde(default)]
    pub primary_axis: Option<String>,

    /// Authority levels, most trusted first; unlisted levels rank last
    #[serde(default = "default_ranking")]
    pub authority_ranking: Vec<AuthorityLevel>,

    /// Only candidates in this status compete
    #[serde(default = "default_status")]
    pub required_status: Option<ClaimStatus>,

    /// Candidate types that never compete
    #[serde(default)]
    pub excluded_types: Vec<ClaimType>,

    /// Strategy for residual ties
    #[serde(default)]
    pub tie_break: TieBreak,

    /// Use axis-only ordering when too few candidates have a known authority
    #[serde(default = "default_true")]
    pub allow_axis_fallback: bool,

    /// Share of candidates with a known authority needed to rank by authority
    #[serde(default = "default_ratio")]
    pub min_authority_known_ratio: f64,
}

fn default_ranking() -> Vec<AuthorityLevel> {
    AuthorityLevel::RANKED.to_vec()
}

fn default_status() -> Option<ClaimStatus> {
    Some(ClaimStatus::Active)
}

fn default_true() -> bool {
    true
}

fn default_ratio() -> f64 {
    0.5
}

impl Default for SelectionPolicy {
    fn default() -> Self {
        Self {
            primary_axis: None,
            authority_ranking: default_ranking(),
            required_status: default_status(),
            excluded_types: Vec::new(),
            tie_break: TieBreak::default(),
            allow_axis_fallback: true,
            min_authority_known_ratio: default_ratio(),
        }
    }
}

impl SelectionPolicy {
    /// Never fall back to axis-only ordering
    pub fn authority_only() -> Self {
        Self {
            allow_axis_fallback: false,
            ..Self::default()
        }
    }

    /// Rank along `axis` when authority is missing
    pub fn with_primary_axis(mut self, axis: impl Into<String>) -> Self {
        self.primary_axis = Some(axis.into());
        self
    }

    /// Check the policy's ranges
    pub fn validate(&self) -> Result<(), ResolverError> {
        if !(0.0..=1.0).contains(&self.min_authority_known_ratio) {
            return Err(ResolverError::InvalidPolicy(format!(
                "min_authority_known_ratio {} outside [0, 1]",
                self.min_authority_known_ratio
            )));
        }
        if self.authority_ranking.is_empty() {
            return Err(ResolverError::InvalidPolicy("empty authority ranking".to_string()));
        }
        Ok(())
    }

    fn rank_of(&self, level: AuthorityLevel) -> usize {
        self.authority_ranking
            .iter()
            .position(|l| *l == level)
            .unwrap_or(self.authority_ranking.len())
    }
}

/// One competing answer
#[derive(Debug, Clone, PartialEq)]
pub struct SelectionCandidate {
    /// Claim the answer comes from
    pub claim_id: ClaimId,
    /// The answer (e.g. "99.9%")
    pub value: String,
    /// Axis this candidate is placed on
    pub axis_key: Option<String>,
    /// Its value on that axis (e.g. "v2")
    pub context_value: Option<String>,
    /// Authority of the source document
    pub authority: AuthorityLevel,
    /// Claim status
    pub status: ClaimStatus,
    /// Claim type
    pub claim_type: ClaimType,
    /// Extraction confidence, used by [`TieBreak::HighestConfidence`]
    pub confidence: Option<f64>,
}

impl SelectionCandidate {
    /// Active factual candidate with no axis placement
    pub fn new(claim_id: ClaimId, value: impl Into<String>, authority: AuthorityLevel) -> Self {
        Self {
            claim_id,
            value: value.into(),
            axis_key: None,
            context_value: None,
            authority,
            status: ClaimStatus::Active,
            claim_type: ClaimType::Factual,
            confidence: None,
        }
    }

    /// Place the candidate on an axis
    pub fn on_axis(mut self, axis_key: impl Into<String>, value: impl Into<String>) -> Self {
        self.axis_key = Some(axis_key.into());
        self.context_value = Some(value.into());
        self
    }

    /// Set the confidence
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(confidence);
        self
    }
}

/// How a selection was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectionBasis {
    /// Single highest-authority candidate
    Authority,
    /// Authority tie broken by a CERTAIN axis ordering
    AuthorityThenAxis,
    /// Authority too sparse; CERTAIN axis ordering alone
    AxisOnly,
    /// Tied candidates state the same value
    Agreement,
    /// Tie broken by confidence
    Confidence,
}

/// Result of a selection
#[derive(Debug, Clone, PartialEq)]
pub enum SelectionOutcome {
    /// One candidate is the current truth
    Selected {
        /// The winner
        candidate: SelectionCandidate,
        /// How it won
        basis: SelectionBasis,
        /// Why
        justification: String,
    },
    /// The question cannot be settled without the user
    AskUser {
        /// Candidates the user should choose among
        candidates: Vec<SelectionCandidate>,
        /// Why
        justification: String,
    },
}

impl SelectionOutcome {
    /// Whether the user must decide
    pub fn ask_user_needed(&self) -> bool {
        matches!(self, SelectionOutcome::AskUser { .. })
    }

    /// The selected candidate, if any
    pub fn selected(&self) -> Option<&SelectionCandidate> {
        match self {
            SelectionOutcome::Selected { candidate, .. } => Some(candidate),
            SelectionOutcome::AskUser { .. } => None,
        }
    }

    /// Human-readable justification (never empty)
    pub fn justification(&self) -> &str {
        match self {
            SelectionOutcome::Selected { justification, .. } => justification,
            SelectionOutcome::AskUser { justification, .. } => justification,
        }
    }
}

fn ask(candidates: Vec<SelectionCandidate>, justification: String) -> SelectionOutcome {
    SelectionOutcome::AskUser {
        candidates,
        justification,
    }
}

fn selected(candidate: SelectionCandidate, basis: SelectionBasis, justification: String) -> SelectionOutcome {
    SelectionOutcome::Selected {
        candidate,
        basis,
        justification,
    }
}

/// Select the current truth among `candidates`
///
/// `axis` is only consulted when its ordering confidence is CERTAIN and, if
/// the policy names a primary axis, when it is that axis.
pub fn select(
    policy: &SelectionPolicy,
    candidates: &[SelectionCandidate],
    axis: Option<&ApplicabilityAxis>,
) -> SelectionOutcome {
    let eligible: Vec<SelectionCandidate> = candidates
        .iter()
        .filter(|c| policy.required_status.map_or(true, |s| c.status == s))
        .filter(|c| !policy.excluded_types.contains(&c.claim_type))
        .cloned()
        .collect();

    if eligible.is_empty() {
        return ask(
            Vec::new(),
            format!(
                "no eligible candidates ({} filtered out by status or type)",
                candidates.len()
            ),
        );
    }

    let certain_axis = axis.filter(|a| {
        a.ordering_confidence() == OrderingConfidence::Certain
            && policy
                .primary_axis
                .as_deref()
                .map_or(true, |key| key == a.axis_key())
    });

    let known = eligible.iter().filter(|c| c.authority.is_known()).count();
    let ratio = known as f64 / eligible.len() as f64;

    if ratio >= policy.min_authority_known_ratio && known > 0 {
        let best_rank = eligible
            .iter()
            .map(|c| policy.rank_of(c.authority))
            .min()
            .unwrap_or(usize::MAX);
        let (top, rest): (Vec<_>, Vec<_>) = eligible
            .into_iter()
            .partition(|c| policy.rank_of(c.authority) == best_rank);

        if let [winner] = top.as_slice() {
            let justification = match rest.iter().map(|c| policy.rank_of(c.authority)).min() {
                Some(next) => format!(
                    "{} source outranks {} by authority",
                    winner.authority.as_str().to_uppercase(),
                    policy
                        .authority_ranking
                        .get(next)
                        .map(|l| l.as_str().to_uppercase())
                        .unwrap_or_else(|| "unranked".to_string())
                ),
                None => format!(
                    "only candidate, from a {} source by authority",
                    winner.authority.as_str().to_uppercase()
                ),
            };
            return selected(winner.clone(), SelectionBasis::Authority, justification);
        }

        let context = format!(
            "{} candidates tie on authority {}",
            top.len(),
            top[0].authority.as_str().to_uppercase()
        );
        return resolve_tie(
            policy,
            top,
            certain_axis,
            SelectionBasis::AuthorityThenAxis,
            &context,
        );
    }

    if policy.allow_axis_fallback && certain_axis.is_some() {
        return resolve_tie(
            policy,
            eligible,
            certain_axis,
            SelectionBasis::AxisOnly,
            &format!("authority known for {:.0}% of candidates", ratio * 100.0),
        );
    }

    let reason = if !policy.allow_axis_fallback {
        "axis fallback disabled"
    } else if axis.is_none() {
        "no applicability axis"
    } else {
        "axis ordering is not CERTAIN"
    };
    ask(
        eligible,
        format!(
            "authority known for {:.0}% of candidates (need {:.0}%) and {}",
            ratio * 100.0,
            policy.min_authority_known_ratio * 100.0,
            reason
        ),
    )
}

/// Where a candidate sits on `axis`; candidates placed on another axis are unplaced
fn placement<'c>(candidate: &'c SelectionCandidate, axis: &ApplicabilityAxis) -> Option<&'c str> {
    if candidate.axis_key.as_deref() == Some(axis.axis_key()) {
        candidate.context_value.as_deref()
    } else {
        None
    }
}

/// Keep only the candidates at the latest value, if the axis can order all of them
fn narrow_to_latest(remaining: &mut Vec<SelectionCandidate>, axis: &ApplicabilityAxis) -> Option<String> {
    let placed: Vec<&str> = remaining.iter().filter_map(|c| placement(c, axis)).collect();
    if placed.len() != remaining.len() {
        return None;
    }
    let LatestValue::Known(latest) = axis.latest_of(&placed) else {
        return None;
    };
    remaining.retain(|c| {
        placement(c, axis).is_some_and(|v| axis.compare(v, &latest) == AxisOrder::Known(Ordering::Equal))
    });
    Some(latest)
}

fn values_agree(candidates: &[SelectionCandidate]) -> bool {
    let first = candidates[0].value.trim().to_lowercase();
    candidates.iter().all(|c| c.value.trim().to_lowercase() == first)
}

/// Break a tie with the axis, agreement, then the tie-break strategy
///
/// With [`SelectionBasis::AxisOnly`] the axis is the only admissible
/// evidence: unless it places every candidate and the latest ones agree,
/// the user decides.
fn resolve_tie(
    policy: &SelectionPolicy,
    tied: Vec<SelectionCandidate>,
    axis: Option<&ApplicabilityAxis>,
    axis_basis: SelectionBasis,
    context: &str,
) -> SelectionOutcome {
    let mut remaining = tied;
    let latest = axis.and_then(|a| narrow_to_latest(&mut remaining, a).map(|latest| (a, latest)));

    if let Some((axis, latest)) = &latest {
        if remaining.len() == 1 {
            let justification = format!(
                "{}; {} is latest on CERTAIN axis '{}'",
                context,
                latest,
                axis.axis_key()
            );
            return selected(remaining.remove(0), axis_basis, justification);
        }
    }

    if axis_basis == SelectionBasis::AxisOnly {
        return match latest {
            Some((axis, latest)) if values_agree(&remaining) => {
                let justification = format!(
                    "{}; all {} candidates at latest {} on CERTAIN axis '{}' agree",
                    context,
                    remaining.len(),
                    latest,
                    axis.axis_key()
                );
                selected(remaining.remove(0), axis_basis, justification)
            }
            Some((axis, latest)) => {
                let justification = format!(
                    "{}; {} candidates share latest {} on axis '{}' but disagree",
                    context,
                    remaining.len(),
                    latest,
                    axis.axis_key()
                );
                ask(remaining, justification)
            }
            None => {
                let justification = format!(
                    "{}; axis ordering cannot place every candidate",
                    context
                );
                ask(remaining, justification)
            }
        };
    }

    if values_agree(&remaining) {
        let justification = format!("{}; all {} tied candidates agree", context, remaining.len());
        return selected(remaining.remove(0), SelectionBasis::Agreement, justification);
    }

    if policy.tie_break == TieBreak::HighestConfidence {
        let mut scored: Vec<(usize, f64)> = remaining
            .iter()
            .enumerate()
            .filter_map(|(i, c)| c.confidence.map(|conf| (i, conf)))
            .collect();
        scored.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
        let unique_top = match scored.as_slice() {
            [(i, _)] => Some(*i),
            [(i, top), (_, next), ..] if top > next => Some(*i),
            _ => None,
        };
        if let Some(index) = unique_top {
            let justification = format!("{}; highest confidence breaks the tie", context);
            return selected(remaining.remove(index), SelectionBasis::Confidence, justification);
        }
    }

    let justification = format!(
        "{}; {} candidates disagree and no CERTAIN ordering separates them",
        context,
        remaining.len()
    );
    ask(remaining, justification)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonry_domain::{AxisValue, DocumentId, EvidenceRef, OrderType};

    fn id(n: u128) -> ClaimId {
        ClaimId::from_value(n)
    }

    fn version_axis(certain: bool) -> ApplicabilityAxis {
        let mut axis = ApplicabilityAxis::new("acme", "version").unwrap();
        for (doc, v) in [("d1", "v1"), ("d2", "v2")] {
            axis.add_value(
                AxisValue::scalar(
                    "version",
                    v,
                    EvidenceRef::snippet("release notes").unwrap(),
                    DocumentId::new(doc).unwrap(),
                )
                .unwrap(),
            );
        }
        if certain {
            axis.declare_order(vec!["v1".into(), "v2".into()], OrderType::Total)
                .unwrap();
        }
        axis
    }

    #[test]
    fn test_official_beats_community() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "99.5%", AuthorityLevel::Community),
            SelectionCandidate::new(id(2), "99.9%", AuthorityLevel::Official),
        ];
        let outcome = select(&SelectionPolicy::default(), &candidates, None);

        assert_eq!(outcome.selected().unwrap().value, "99.9%");
        assert!(outcome.justification().contains("authority"));
        assert!(outcome.justification().contains("OFFICIAL"));
        assert!(matches!(
            outcome,
            SelectionOutcome::Selected { basis: SelectionBasis::Authority, .. }
        ));
    }

    #[test]
    fn test_authority_tie_broken_by_certain_axis() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "TLS 1.0", AuthorityLevel::Official).on_axis("version", "v1"),
            SelectionCandidate::new(id(2), "TLS 1.2", AuthorityLevel::Official).on_axis("version", "v2"),
        ];
        let axis = version_axis(true);
        let outcome = select(&SelectionPolicy::default(), &candidates, Some(&axis));
        assert_eq!(outcome.selected().unwrap().claim_id, id(2));
        assert!(outcome.justification().contains("latest"));
    }

    #[test]
    fn test_authority_tie_without_certain_axis_asks() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "TLS 1.0", AuthorityLevel::Official).on_axis("version", "v1"),
            SelectionCandidate::new(id(2), "TLS 1.2", AuthorityLevel::Official).on_axis("version", "v2"),
        ];
        let axis = version_axis(false);
        let outcome = select(&SelectionPolicy::default(), &candidates, Some(&axis));
        assert!(outcome.ask_user_needed());
        assert!(!outcome.justification().is_empty());
    }

    #[test]
    fn test_axis_fallback_when_authority_unknown() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "30 days", AuthorityLevel::Unknown).on_axis("version", "v2"),
            SelectionCandidate::new(id(2), "90 days", AuthorityLevel::Unknown).on_axis("version", "v1"),
        ];
        let axis = version_axis(true);
        let policy = SelectionPolicy::default().with_primary_axis("version");
        let outcome = select(&policy, &candidates, Some(&axis));
        assert_eq!(outcome.selected().unwrap().claim_id, id(1));
        assert!(matches!(
            outcome,
            SelectionOutcome::Selected { basis: SelectionBasis::AxisOnly, .. }
        ));
    }

    #[test]
    fn test_axis_only_never_falls_back_to_confidence() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "30 days", AuthorityLevel::Unknown)
                .on_axis("version", "v9")
                .with_confidence(0.9),
            SelectionCandidate::new(id(2), "90 days", AuthorityLevel::Unknown).with_confidence(0.4),
        ];
        let axis = version_axis(true);
        let policy = SelectionPolicy {
            tie_break: TieBreak::HighestConfidence,
            ..SelectionPolicy::default().with_primary_axis("version")
        };
        let outcome = select(&policy, &candidates, Some(&axis));
        assert!(outcome.ask_user_needed());
        assert!(outcome.justification().contains("cannot place"));
    }

    #[test]
    fn test_axis_only_agreement_needs_axis_placement() {
        let unplaced = vec![
            SelectionCandidate::new(id(1), "30 days", AuthorityLevel::Unknown),
            SelectionCandidate::new(id(2), "30 days", AuthorityLevel::Unknown),
        ];
        let axis = version_axis(true);
        let policy = SelectionPolicy::default().with_primary_axis("version");
        assert!(select(&policy, &unplaced, Some(&axis)).ask_user_needed());

        let placed = vec![
            SelectionCandidate::new(id(1), "30 days", AuthorityLevel::Unknown).on_axis("version", "v2"),
            SelectionCandidate::new(id(2), "30 Days", AuthorityLevel::Unknown).on_axis("version", "v2"),
            SelectionCandidate::new(id(3), "90 days", AuthorityLevel::Unknown).on_axis("version", "v1"),
        ];
        let outcome = select(&policy, &placed, Some(&axis));
        assert!(matches!(
            outcome,
            SelectionOutcome::Selected { basis: SelectionBasis::AxisOnly, .. }
        ));
        assert_eq!(outcome.selected().unwrap().value, "30 days");
    }

    #[test]
    fn test_candidates_on_another_axis_are_unplaced() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "eu-west", AuthorityLevel::Official).on_axis("region", "v1"),
            SelectionCandidate::new(id(2), "us-east", AuthorityLevel::Official).on_axis("region", "v2"),
        ];
        let axis = version_axis(true);
        let outcome = select(&SelectionPolicy::default(), &candidates, Some(&axis));
        assert!(outcome.ask_user_needed());
        assert!(!outcome.justification().contains("latest"));
    }

    #[test]
    fn test_wrong_primary_axis_is_ignored() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "a", AuthorityLevel::Unknown).on_axis("version", "v2"),
            SelectionCandidate::new(id(2), "b", AuthorityLevel::Unknown).on_axis("version", "v1"),
        ];
        let axis = version_axis(true);
        let policy = SelectionPolicy::default().with_primary_axis("region");
        assert!(select(&policy, &candidates, Some(&axis)).ask_user_needed());
    }

    #[test]
    fn test_fallback_disabled_asks() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "a", AuthorityLevel::Unknown).on_axis("version", "v2"),
            SelectionCandidate::new(id(2), "b", AuthorityLevel::Unknown).on_axis("version", "v1"),
        ];
        let axis = version_axis(true);
        let outcome = select(&SelectionPolicy::authority_only(), &candidates, Some(&axis));
        assert!(outcome.ask_user_needed());
        assert!(outcome.justification().contains("fallback disabled"));
    }

    #[test]
    fn test_filters_status_and_type() {
        let mut retired = SelectionCandidate::new(id(1), "old", AuthorityLevel::Official);
        retired.status = ClaimStatus::Superseded;
        let mut procedural = SelectionCandidate::new(id(2), "steps", AuthorityLevel::Official);
        procedural.claim_type = ClaimType::Procedural;
        let live = SelectionCandidate::new(id(3), "current", AuthorityLevel::Verified);

        let policy = SelectionPolicy {
            excluded_types: vec![ClaimType::Procedural],
            ..SelectionPolicy::default()
        };
        let outcome = select(&policy, &[retired.clone(), procedural.clone(), live], None);
        assert_eq!(outcome.selected().unwrap().claim_id, id(3));

        let outcome = select(&policy, &[retired, procedural], None);
        assert!(outcome.ask_user_needed());
        assert!(outcome.justification().contains("no eligible"));
    }

    #[test]
    fn test_agreeing_tie_is_selected() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "99.9%", AuthorityLevel::Verified),
            SelectionCandidate::new(id(2), " 99.9% ", AuthorityLevel::Verified),
        ];
        let outcome = select(&SelectionPolicy::default(), &candidates, None);
        assert!(matches!(
            outcome,
            SelectionOutcome::Selected { basis: SelectionBasis::Agreement, .. }
        ));
    }

    #[test]
    fn test_confidence_tie_break() {
        let candidates = vec![
            SelectionCandidate::new(id(1), "a", AuthorityLevel::Verified).with_confidence(0.6),
            SelectionCandidate::new(id(2), "b", AuthorityLevel::Verified).with_confidence(0.9),
        ];
        assert!(select(&SelectionPolicy::default(), &candidates, None).ask_user_needed());

        let policy = SelectionPolicy {
            tie_break: TieBreak::HighestConfidence,
            ..SelectionPolicy::default()
        };
        assert_eq!(select(&policy, &candidates, None).selected().unwrap().claim_id, id(2));
    }

    #[test]
    fn test_policy_validation_and_serde() {
        let mut policy = SelectionPolicy::default().with_primary_axis("version");
        assert!(policy.validate().is_ok());

        let json = serde_json::to_string(&policy).unwrap();
        let parsed: SelectionPolicy = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, policy);

        let minimal: SelectionPolicy = serde_json::from_str("{}").unwrap();
        assert_eq!(minimal, SelectionPolicy::default());

        policy.min_authority_known_ratio = 1.5;
        assert!(matches!(policy.validate(), Err(ResolverError::InvalidPolicy(_))));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use canonry_domain::{AxisValue, DocumentId, EvidenceRef};
    use proptest::prelude::*;

    fn arb_candidates() -> impl Strategy<Value = Vec<SelectionCandidate>> {
        prop::collection::vec(
            (
                prop::sample::select(vec!["v1", "v2", "v3"]),
                prop::sample::select(vec!["x", "y", "z"]),
                prop::sample::select(AuthorityLevel::RANKED.to_vec()),
            ),
            1..8,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .enumerate()
                .map(|(i, (ctx, value, authority))| {
                    SelectionCandidate::new(ClaimId::from_value(i as u128), value, authority)
                        .on_axis("version", ctx)
                })
                .collect()
        })
    }

    fn uncertain_axis() -> ApplicabilityAxis {
        let mut axis = ApplicabilityAxis::new("acme", "version").unwrap();
        for (doc, v) in [("d1", "v1"), ("d2", "v2"), ("d3", "v3")] {
            axis.add_value(
                AxisValue::scalar("version", v, EvidenceRef::snippet("s").unwrap(), DocumentId::new(doc).unwrap())
                    .unwrap(),
            );
        }
        axis
    }

    proptest! {
        #[test]
        fn low_authority_ratio_without_certain_axis_never_selects(candidates in arb_candidates()) {
            let policy = SelectionPolicy { min_authority_known_ratio: 1.0, ..SelectionPolicy::default() };
            let known = candidates.iter().filter(|c| c.authority.is_known()).count();
            prop_assume!(known < candidates.len());

            let axis = uncertain_axis();
            let outcome = select(&policy, &candidates, Some(&axis));
            prop_assert!(outcome.ask_user_needed());
            prop_assert!(!outcome.justification().is_empty());

            let outcome = select(&SelectionPolicy { allow_axis_fallback: false, ..policy }, &candidates, None);
            prop_assert!(outcome.ask_user_needed());
        }

        #[test]
        fn every_outcome_is_justified(candidates in arb_candidates()) {
            let outcome = select(&SelectionPolicy::default(), &candidates, None);
            prop_assert!(!outcome.justification().is_empty());
        }
    }
}
