//! Per-document claim deduplication
//!
//! Two passes over the claims of one document:
//!
//! 1. Exact text: group by `lowercase(trim(text))`, keep the most confident.
//! 2. Triplet: among survivors with a structured form, group by lower-cased
//!    `(subject, predicate, object)`, keep the most confident. Claims without
//!    a structured form pass through.
//!
//! Survivors then get their content fingerprint. Running the passes again on
//! their own output changes nothing.

use crate::tagging::ClaimKeyTagger;
use crate::GatekeeperError;
use canonry_domain::traits::{ClaimFilter, GovernanceStore};
use canonry_domain::{Claim, ClaimId, DocumentId};
use std::collections::HashMap;
use std::fmt::Display;
use std::hash::Hash;
use std::sync::Arc;
use tracing::{debug, info};

/// Per-document deduplication statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupStats {
    /// Claims before deduplication
    pub initial: usize,
    /// Removed by the exact-text pass
    pub removed_by_text: usize,
    /// Removed by the triplet pass
    pub removed_by_triplet: usize,
    /// Survivors
    pub kept: usize,
}

impl DedupStats {
    /// Total claims removed
    pub fn removed(&self) -> usize {
        self.removed_by_text + self.removed_by_triplet
    }
}

/// Result of deduplicating one claim set
#[derive(Debug, Clone)]
pub struct DedupOutcome {
    /// Surviving claims, in input order, with content fingerprints set
    pub survivors: Vec<Claim>,
    /// Claims that lost to a survivor
    pub removed: Vec<ClaimId>,
    /// Counts
    pub stats: DedupStats,
}

/// Whether `a` beats `b` as the representative of a group
///
/// Highest confidence wins; equal confidence keeps the smaller (older) id so
/// the choice does not depend on input order.
fn beats(a: &Claim, b: &Claim) -> bool {
    match a.confidence.value().partial_cmp(&b.confidence.value()) {
        Some(std::cmp::Ordering::Greater) => true,
        Some(std::cmp::Ordering::Less) => false,
        _ => a.id < b.id,
    }
}

/// Keep one winner per key; claims with no key pass through
fn collapse<K, F>(claims: Vec<Claim>, key_of: F) -> (Vec<Claim>, Vec<ClaimId>)
where
    K: Eq + Hash,
    F: Fn(&Claim) -> Option<K>,
{
    let mut winners: HashMap<K, usize> = HashMap::new();
    let mut keep = vec![true; claims.len()];
    let mut removed = Vec::new();

    for (index, claim) in claims.iter().enumerate() {
        let Some(key) = key_of(claim) else {
            continue;
        };
        match winners.get(&key).copied() {
            None => {
                winners.insert(key, index);
            }
            Some(current) => {
                if beats(claim, &claims[current]) {
                    keep[current] = false;
                    removed.push(claims[current].id);
                    winners.insert(key, index);
                } else {
                    keep[index] = false;
                    removed.push(claim.id);
                }
            }
        }
    }

    let survivors = claims
        .into_iter()
        .zip(keep)
        .filter_map(|(claim, kept)| kept.then_some(claim))
        .collect();
    (survivors, removed)
}

/// Deduplicate the claims of a single document
pub fn dedup_claims(claims: Vec<Claim>) -> DedupOutcome {
    let initial = claims.len();

    let (after_text, mut removed) = collapse(claims, |c| Some(c.normalized_text()));
    let removed_by_text = removed.len();

    let (mut survivors, removed_triplet) =
        collapse(after_text, |c| c.structured_form.as_ref().map(|f| f.normalized()));
    let removed_by_triplet = removed_triplet.len();
    removed.extend(removed_triplet);

    for claim in &mut survivors {
        claim.content_fingerprint = Some(claim.compute_content_fingerprint());
    }

    let stats = DedupStats {
        initial,
        removed_by_text,
        removed_by_triplet,
        kept: survivors.len(),
    };
    DedupOutcome {
        survivors,
        removed,
        stats,
    }
}

/// Runs deduplication for one document against a store
///
/// Untagged claims are first given an identity key (when a tagger is set),
/// then removed claims are deleted (cascading to orphaned evidence passages)
/// and survivors are saved with their content fingerprints.
///
/// Placeholders such as `{context}` or `{topic}` resolve from the shared
/// tagging context, overlaid with the document's own context when one is set.
pub struct DocumentDeduplicator<S> {
    store: Arc<S>,
    tagger: Option<Arc<ClaimKeyTagger>>,
    context: Arc<HashMap<String, String>>,
    document_contexts: Arc<HashMap<DocumentId, HashMap<String, String>>>,
}

impl<S> Clone for DocumentDeduplicator<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            tagger: self.tagger.clone(),
            context: Arc::clone(&self.context),
            document_contexts: Arc::clone(&self.document_contexts),
        }
    }
}

impl<S> DocumentDeduplicator<S>
where
    S: GovernanceStore,
    S::Error: Display,
{
    /// Create a deduplicator over a store
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            tagger: None,
            context: Arc::new(HashMap::new()),
            document_contexts: Arc::new(HashMap::new()),
        }
    }

    /// Tag untagged claims before deduplicating
    pub fn with_tagger(mut self, tagger: Arc<ClaimKeyTagger>) -> Self {
        self.tagger = Some(tagger);
        self
    }

    /// Tagging context shared by every document (e.g. `product`, `theme`)
    pub fn with_context(mut self, context: HashMap<String, String>) -> Self {
        self.context = Arc::new(context);
        self
    }

    /// Tagging context for one document, overriding shared keys
    pub fn with_document_context(
        mut self,
        document_id: DocumentId,
        context: HashMap<String, String>,
    ) -> Self {
        Arc::make_mut(&mut self.document_contexts).insert(document_id, context);
        self
    }

    fn context_for(&self, document_id: &DocumentId) -> HashMap<String, String> {
        let mut context = (*self.context).clone();
        if let Some(own) = self.document_contexts.get(document_id) {
            context.extend(own.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        context
    }

    /// Deduplicate one document's claims
    pub fn dedup_document(
        &self,
        tenant: &str,
        document_id: &DocumentId,
    ) -> Result<DedupStats, GatekeeperError> {
        let mut claims = self
            .store
            .fetch_claims(tenant, &ClaimFilter::document(document_id.clone()))
            .map_err(|e| GatekeeperError::Store(e.to_string()))?;

        if let Some(tagger) = &self.tagger {
            let context = self.context_for(document_id);
            let mut tagged = 0;
            for claim in claims.iter_mut().filter(|c| c.claim_key.is_none()) {
                if let Some(tag) = tagger.tag(&claim.text, &context) {
                    claim.claim_key = Some(tag.claim_key);
                    if claim.value.is_none() {
                        claim.value = tag.value;
                    }
                    tagged += 1;
                }
            }
            debug!(document = %document_id, tagged, "Tagged claims before dedup");
        }

        let outcome = dedup_claims(claims);

        let mut orphaned = 0;
        for id in &outcome.removed {
            orphaned += self
                .store
                .delete_claim(*id)
                .map_err(|e| GatekeeperError::Store(e.to_string()))?;
        }
        for claim in &outcome.survivors {
            self.store
                .save_claim(claim)
                .map_err(|e| GatekeeperError::Store(e.to_string()))?;
        }

        if orphaned > 0 {
            debug!(document = %document_id, orphaned, "Removed orphaned evidence passages");
        }
        info!(
            document = %document_id,
            initial = outcome.stats.initial,
            removed_by_text = outcome.stats.removed_by_text,
            removed_by_triplet = outcome.stats.removed_by_triplet,
            kept = outcome.stats.kept,
            "Deduplicated document"
        );
        Ok(outcome.stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonry_domain::{ClaimDraft, ClaimType, PassageId, Scope, StructuredForm};

    fn claim(text: &str, confidence: f64) -> Claim {
        ClaimDraft::new("acme", DocumentId::new("d1").unwrap(), text, ClaimType::Factual, text)
            .with_unit(PassageId::new("p1").unwrap())
            .with_confidence(confidence)
            .build()
            .unwrap()
    }

    fn with_triplet(mut c: Claim, s: &str, p: &str, o: &str) -> Claim {
        c.structured_form = Some(StructuredForm::new(s, p, o).unwrap());
        c
    }

    #[test]
    fn test_tls_scenario_keeps_more_confident() {
        let low = claim("TLS 1.2 is supported", 0.7);
        let high = claim("tls 1.2 is supported ", 0.9);
        let outcome = dedup_claims(vec![low.clone(), high.clone()]);

        assert_eq!(outcome.survivors.len(), 1);
        assert_eq!(outcome.survivors[0].id, high.id);
        assert_eq!(outcome.removed, vec![low.id]);
        assert_eq!(
            outcome.stats,
            DedupStats {
                initial: 2,
                removed_by_text: 1,
                removed_by_triplet: 0,
                kept: 1,
            }
        );
        assert!(outcome.survivors[0].content_fingerprint.is_some());
    }

    #[test]
    fn test_triplet_pass() {
        let a = with_triplet(claim("The vendor encrypts data", 0.6), "Vendor", "encrypts", "data");
        let b = with_triplet(claim("Data is encrypted by the vendor", 0.8), "vendor", "ENCRYPTS", "Data");
        let c = claim("No structured form here", 0.1);
        let outcome = dedup_claims(vec![a.clone(), b.clone(), c.clone()]);

        let ids: Vec<_> = outcome.survivors.iter().map(|c| c.id).collect();
        assert_eq!(ids, vec![b.id, c.id]);
        assert_eq!(outcome.stats.removed_by_triplet, 1);
        assert_eq!(outcome.stats.removed(), 1);
    }

    #[test]
    fn test_equal_confidence_keeps_older_id() {
        let first = claim("Uptime is 99.9%", 0.5);
        let second = claim("uptime is 99.9%", 0.5);
        let forward = dedup_claims(vec![first.clone(), second.clone()]);
        let backward = dedup_claims(vec![second, first.clone()]);
        assert_eq!(forward.survivors[0].id, first.id);
        assert_eq!(backward.survivors[0].id, first.id);
    }

    #[test]
    fn test_survivor_fingerprint_matches_scope() {
        let mut scoped = claim("Backups run daily", 0.5);
        scoped.scope = Scope::global().with_region("EU");
        let outcome = dedup_claims(vec![scoped.clone()]);
        assert_eq!(
            outcome.survivors[0].content_fingerprint,
            Some(scoped.compute_content_fingerprint())
        );
    }

    #[test]
    fn test_empty_input() {
        let outcome = dedup_claims(Vec::new());
        assert!(outcome.survivors.is_empty());
        assert_eq!(outcome.stats, DedupStats::default());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use canonry_domain::{ClaimDraft, ClaimType, PassageId, StructuredForm};
    use proptest::prelude::*;

    fn arb_triplet() -> impl Strategy<Value = Option<(&'static str, &'static str, &'static str)>> {
        prop::option::of((
            prop::sample::select(vec!["Vendor", "vendor", "Customer"]),
            prop::sample::select(vec!["encrypts", "ENCRYPTS", "backs up"]),
            prop::sample::select(vec!["data", "Data", "logs"]),
        ))
    }

    fn arb_claims() -> impl Strategy<Value = Vec<Claim>> {
        prop::collection::vec(
            (
                prop::sample::select(vec![
                    "TLS 1.2",
                    "tls 1.2 ",
                    "Uptime 99.9%",
                    "uptime 99.9%",
                    "RTO 4 hours",
                    "The vendor encrypts data",
                    "Data is encrypted by the vendor",
                ]),
                0.0f64..=1.0,
                arb_triplet(),
            ),
            0..12,
        )
        .prop_map(|items| {
            items
                .into_iter()
                .map(|(text, confidence, triplet)| {
                    let mut claim =
                        ClaimDraft::new("acme", DocumentId::new("d").unwrap(), text, ClaimType::Factual, text)
                            .with_unit(PassageId::new("p").unwrap())
                            .with_confidence(confidence)
                            .build()
                            .unwrap();
                    claim.structured_form =
                        triplet.map(|(s, p, o)| StructuredForm::new(s, p, o).unwrap());
                    claim
                })
                .collect()
        })
    }

    proptest! {
        #[test]
        fn dedup_is_idempotent(claims in arb_claims()) {
            let once = dedup_claims(claims);
            let twice = dedup_claims(once.survivors.clone());
            prop_assert_eq!(&twice.survivors, &once.survivors);
            prop_assert_eq!(twice.stats.removed(), 0);
        }

        #[test]
        fn survivors_have_distinct_normalized_text(claims in arb_claims()) {
            let outcome = dedup_claims(claims.clone());
            let mut seen = std::collections::HashSet::new();
            for c in &outcome.survivors {
                prop_assert!(seen.insert(c.normalized_text()));
            }
            prop_assert_eq!(outcome.stats.kept + outcome.stats.removed(), claims.len());
        }

        #[test]
        fn survivors_have_distinct_triplets(claims in arb_claims()) {
            let outcome = dedup_claims(claims);
            let mut seen = std::collections::HashSet::new();
            for form in outcome.survivors.iter().filter_map(|c| c.structured_form.as_ref()) {
                prop_assert!(seen.insert(form.normalized()));
            }
        }
    }
}
