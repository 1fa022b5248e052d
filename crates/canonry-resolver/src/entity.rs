//! Entity-merge similarity and arbitration
//!
//! Structural similarity settles the clear cases on either end. Everything in
//! between goes to a [`MergeArbiter`] in one batch, and whatever the arbiter
//! cannot decide stays an abstain.

use crate::SimilarityConfig;
use canonry_domain::traits::{AbstainReason, EntityPair, MergeArbiter, MergeDecision};
use std::collections::BTreeSet;
use tracing::{debug, warn};

fn compact(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(char::to_lowercase)
        .collect()
}

fn tokens(name: &str) -> Vec<String> {
    name.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn initials(name: &str) -> String {
    tokens(name).iter().filter_map(|t| t.chars().next()).collect()
}

/// Structural similarity between two entity names
#[derive(Debug, Clone, Default)]
pub struct EntitySimilarity {
    config: SimilarityConfig,
}

impl EntitySimilarity {
    /// Create a scorer
    pub fn new(config: SimilarityConfig) -> Self {
        Self { config }
    }

    /// Configuration in use
    pub fn config(&self) -> &SimilarityConfig {
        &self.config
    }

    /// Whether one name is the acronym of the other ("AWS" / "Amazon Web Services")
    pub fn is_acronym(a: &str, b: &str) -> bool {
        let check = |long: &str, short: &str| {
            let short = compact(short);
            tokens(long).len() >= 2 && short.len() >= 2 && initials(long) == short
        };
        check(a, b) || check(b, a)
    }

    /// Jaccard overlap of the names' tokens
    pub fn component_overlap(a: &str, b: &str) -> f64 {
        let left: BTreeSet<String> = tokens(a).into_iter().collect();
        let right: BTreeSet<String> = tokens(b).into_iter().collect();
        let union = left.union(&right).count();
        if union == 0 {
            return 0.0;
        }
        left.intersection(&right).count() as f64 / union as f64
    }

    /// Equality after dropping case, spacing and punctuation
    pub fn same_typography(a: &str, b: &str) -> bool {
        let left = compact(a);
        !left.is_empty() && left == compact(b)
    }

    /// Blended score in [0, 1]
    ///
    /// Typographically equal names count as an acronym match too, so equal
    /// names score the sum of the weights.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        let same = Self::same_typography(a, b);
        let acronym = if same || Self::is_acronym(a, b) { 1.0 } else { 0.0 };
        let typography = if same { 1.0 } else { 0.0 };
        let score = self.config.acronym_weight * acronym
            + self.config.component_weight * Self::component_overlap(a, b)
            + self.config.typography_weight * typography;
        score.clamp(0.0, 1.0)
    }
}

/// How a merge decision was reached
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeBasis {
    /// Score at or above the merge threshold
    AutoMerge,
    /// Score at or below the reject threshold
    AutoReject,
    /// Decided (or abstained on) by the arbiter
    Arbitrated,
}

/// Decision for one pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MergeResolution {
    /// The decision
    pub decision: MergeDecision,
    /// Structural score
    pub score: f64,
    /// How the decision was reached
    pub basis: MergeBasis,
}

/// Decides entity merges: similarity first, arbiter for the uncertain middle
pub struct EntityMerger<A> {
    similarity: EntitySimilarity,
    arbiter: A,
}

impl<A: MergeArbiter> EntityMerger<A> {
    /// Create a merger
    pub fn new(similarity: EntitySimilarity, arbiter: A) -> Self {
        Self { similarity, arbiter }
    }

    /// The arbiter
    pub fn arbiter(&self) -> &A {
        &self.arbiter
    }

    /// Resolve every pair; the result is in input order
    ///
    /// The arbiter is called at most once, with only the undecided pairs.
    pub fn resolve(&self, pairs: &[EntityPair]) -> Vec<MergeResolution> {
        let config = self.similarity.config();
        let mut resolutions = Vec::with_capacity(pairs.len());
        let mut undecided = Vec::new();

        for (index, pair) in pairs.iter().enumerate() {
            let score = self.similarity.score(&pair.left, &pair.right);
            let (decision, basis) = if score >= config.auto_merge_threshold {
                (MergeDecision::Same, MergeBasis::AutoMerge)
            } else if score <= config.auto_reject_threshold {
                (MergeDecision::Different, MergeBasis::AutoReject)
            } else {
                undecided.push(index);
                (
                    MergeDecision::Abstain(AbstainReason::MissingDecision),
                    MergeBasis::Arbitrated,
                )
            };
            resolutions.push(MergeResolution {
                decision,
                score,
                basis,
            });
        }

        if undecided.is_empty() {
            return resolutions;
        }

        let batch: Vec<EntityPair> = undecided.iter().map(|&i| pairs[i].clone()).collect();
        let decisions = self.arbiter.arbitrate(&batch);
        if decisions.len() != batch.len() {
            warn!(
                expected = batch.len(),
                got = decisions.len(),
                "Arbiter returned a mismatched batch"
            );
        }
        for (position, &index) in undecided.iter().enumerate() {
            if let Some(decision) = decisions.get(position) {
                resolutions[index].decision = *decision;
            }
        }

        debug!(
            pairs = pairs.len(),
            arbitrated = undecided.len(),
            abstained = resolutions.iter().filter(|r| !r.decision.is_decided()).count(),
            "Entity merge resolution complete"
        );
        resolutions
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct ScriptedArbiter {
        answer: MergeDecision,
        batches: RefCell<Vec<usize>>,
    }

    impl MergeArbiter for ScriptedArbiter {
        fn arbitrate(&self, pairs: &[EntityPair]) -> Vec<MergeDecision> {
            self.batches.borrow_mut().push(pairs.len());
            vec![self.answer; pairs.len()]
        }
    }

    fn scripted(answer: MergeDecision) -> ScriptedArbiter {
        ScriptedArbiter {
            answer,
            batches: RefCell::new(Vec::new()),
        }
    }

    #[test]
    fn test_signals() {
        assert!(EntitySimilarity::is_acronym("AWS", "Amazon Web Services"));
        assert!(EntitySimilarity::is_acronym("Google Cloud Platform", "G.C.P."));
        assert!(!EntitySimilarity::is_acronym("A", "Amazon"));
        assert!(EntitySimilarity::same_typography("Post-greSQL", "postgresql"));
        assert_eq!(EntitySimilarity::component_overlap("Azure Blob", "Azure Files"), 1.0 / 3.0);
    }

    #[test]
    fn test_scores() {
        let sim = EntitySimilarity::default();
        assert!((sim.score("Amazon Web Services", "amazon-web-services") - 1.0).abs() < 1e-9);
        assert!((sim.score("AWS", "Amazon Web Services") - 0.4).abs() < 1e-9);
        assert_eq!(sim.score("Microsoft Azure", "Google Cloud"), 0.0);
    }

    #[test]
    fn test_clear_cases_skip_arbiter() {
        let merger = EntityMerger::new(EntitySimilarity::default(), scripted(MergeDecision::Same));
        let resolutions = merger.resolve(&[
            EntityPair::new("Amazon Web Services", "amazon web services"),
            EntityPair::new("Microsoft Azure", "Google Cloud"),
        ]);
        assert_eq!(resolutions[0].decision, MergeDecision::Same);
        assert_eq!(resolutions[0].basis, MergeBasis::AutoMerge);
        assert_eq!(resolutions[1].decision, MergeDecision::Different);
        assert_eq!(resolutions[1].basis, MergeBasis::AutoReject);
        assert!(merger.arbiter().batches.borrow().is_empty());
    }

    #[test]
    fn test_middle_band_batched_once() {
        let merger = EntityMerger::new(EntitySimilarity::default(), scripted(MergeDecision::Same));
        let resolutions = merger.resolve(&[
            EntityPair::new("AWS", "Amazon Web Services"),
            EntityPair::new("Microsoft Azure", "Google Cloud"),
            EntityPair::new("GCP", "Google Cloud Platform"),
        ]);
        assert_eq!(*merger.arbiter().batches.borrow(), vec![2]);
        assert_eq!(resolutions[0].basis, MergeBasis::Arbitrated);
        assert_eq!(resolutions[0].decision, MergeDecision::Same);
        assert_eq!(resolutions[1].decision, MergeDecision::Different);
        assert_eq!(resolutions[2].decision, MergeDecision::Same);
    }

    #[test]
    fn test_short_arbiter_answer_stays_abstain() {
        struct Silent;
        impl MergeArbiter for Silent {
            fn arbitrate(&self, _pairs: &[EntityPair]) -> Vec<MergeDecision> {
                Vec::new()
            }
        }
        let merger = EntityMerger::new(EntitySimilarity::default(), Silent);
        let resolutions = merger.resolve(&[EntityPair::new("AWS", "Amazon Web Services")]);
        assert_eq!(
            resolutions[0].decision,
            MergeDecision::Abstain(AbstainReason::MissingDecision)
        );
    }
}
