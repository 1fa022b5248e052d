//! Canonicalization pass
//!
//! Consolidates a tenant's active claims into canonical claims and records
//! how those canonical claims relate: SUPPORTS from each claim, then
//! SUPERSEDES or CONFLICTS_WITH between canonical claims that answer the same
//! question differently. Scope qualifiers are recorded as applicability axis
//! observations along the way.

use crate::axes::record_axis_observations;
use crate::{JanitorConfig, JanitorError, JanitorMetrics};
use canonry_domain::traits::{ClaimFilter, GovernanceStore};
use canonry_domain::{
    AuthorityLevel, CanonicalClaim, CanonicalEdge, Claim, ClaimKey, ClaimStatus, DocumentId,
    SourceDocument,
};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Display;
use std::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// What one pass did (or, in dry-run mode, would have done)
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PassReport {
    /// Tenant consolidated
    pub tenant: String,
    /// Canonical claims created or merged
    pub canonicals_upserted: usize,
    /// SUPPORTS edges recorded
    pub support_edges: usize,
    /// CONFLICTS_WITH edges recorded
    pub conflicts: usize,
    /// SUPERSEDES edges recorded
    pub supersessions: usize,
    /// Claims retired by supersession
    pub claims_retired: usize,
    /// Scope qualifiers recorded as axis values
    pub axis_values: usize,
    /// Axes whose inferred ordering changed
    pub axis_orderings: usize,
    /// Whether nothing was written
    pub dry_run: bool,
}

/// Outcome of [`Canonicalizer::run_pass`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PassOutcome {
    /// The pass ran
    Completed(PassReport),
    /// Another holder owns the lease
    SkippedLocked,
}

/// Holds a named lease and releases it when dropped
///
/// Every acquisition records its own token (`<holder>:<uuid>`), so two
/// canonicalizers sharing a configured holder still exclude each other and
/// one cannot release the other's lease.
struct LeaseGuard<'a, S>
where
    S: GovernanceStore,
    S::Error: Display,
{
    store: &'a S,
    name: &'a str,
    token: String,
}

impl<'a, S> LeaseGuard<'a, S>
where
    S: GovernanceStore,
    S::Error: Display,
{
    fn acquire(store: &'a S, config: &'a JanitorConfig) -> Result<Option<Self>, JanitorError> {
        let token = format!("{}:{}", config.holder, Uuid::now_v7());
        let acquired = store
            .try_acquire_lease(&config.lease_name, &token, config.lease_ttl())
            .map_err(|e| JanitorError::Store(e.to_string()))?;
        if !acquired {
            return Ok(None);
        }
        debug!(lease = %config.lease_name, holder = %token, "Lease acquired");
        Ok(Some(Self {
            store,
            name: &config.lease_name,
            token,
        }))
    }
}

impl<S> Drop for LeaseGuard<'_, S>
where
    S: GovernanceStore,
    S::Error: Display,
{
    fn drop(&mut self) {
        match self.store.release_lease(self.name, &self.token) {
            Ok(()) => debug!(lease = %self.name, "Lease released"),
            // The TTL still bounds how long the lease can outlive us
            Err(e) => warn!(lease = %self.name, error = %e, "Failed to release lease"),
        }
    }
}

/// Runs canonicalization passes under the configured lease
///
/// # Examples
///
/// ```no_run
/// use canonry_janitor::{Canonicalizer, JanitorConfig};
/// use canonry_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let store = SqliteStore::new("canonry.db")?;
/// let mut canonicalizer = Canonicalizer::new(JanitorConfig::default());
///
/// let outcome = canonicalizer.run_pass(&store, "acme")?;
/// println!("{:?}\n{}", outcome, canonicalizer.metrics().summary());
/// # Ok(())
/// # }
/// ```
pub struct Canonicalizer {
    config: JanitorConfig,
    metrics: JanitorMetrics,
}

impl Canonicalizer {
    /// Create a canonicalizer with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        Self {
            config,
            metrics: JanitorMetrics::new(),
        }
    }

    /// Create a canonicalizer with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// Configuration in use
    pub fn config(&self) -> &JanitorConfig {
        &self.config
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Run one pass for `tenant`
    ///
    /// Returns [`PassOutcome::SkippedLocked`] without touching anything when
    /// the lease is held elsewhere. The lease is released on every exit path,
    /// including errors.
    pub fn run_pass<S>(&mut self, store: &S, tenant: &str) -> Result<PassOutcome, JanitorError>
    where
        S: GovernanceStore,
        S::Error: Display,
    {
        let Some(_lease) = LeaseGuard::acquire(store, &self.config)? else {
            info!(tenant, lease = %self.config.lease_name, "Lease held elsewhere, skipping pass");
            self.metrics.record_skipped();
            return Ok(PassOutcome::SkippedLocked);
        };

        let start = Instant::now();
        let report = self.consolidate(store, tenant)?;
        self.metrics.record_pass(&report);
        self.metrics.total_runtime_ms += start.elapsed().as_millis() as u64;

        info!(
            tenant,
            canonicals = report.canonicals_upserted,
            supports = report.support_edges,
            conflicts = report.conflicts,
            supersessions = report.supersessions,
            dry_run = report.dry_run,
            "Canonicalization pass complete"
        );
        Ok(PassOutcome::Completed(report))
    }

    fn consolidate<S>(&self, store: &S, tenant: &str) -> Result<PassReport, JanitorError>
    where
        S: GovernanceStore,
        S::Error: Display,
    {
        let dry_run = self.config.dry_run;
        let mut report = PassReport {
            tenant: tenant.to_string(),
            dry_run,
            ..PassReport::default()
        };

        let claims = store
            .fetch_claims(tenant, &ClaimFilter::active())
            .map_err(|e| JanitorError::Store(e.to_string()))?;
        let documents = load_documents(store, &claims)?;

        let axes = record_axis_observations(store, tenant, &claims, dry_run)?;
        report.axis_values = axes.values;
        report.axis_orderings = axes.orderings;

        // Step 1: one canonical claim per content fingerprint
        let mut groups: BTreeMap<String, Vec<&Claim>> = BTreeMap::new();
        for claim in &claims {
            let fingerprint = claim
                .content_fingerprint
                .clone()
                .unwrap_or_else(|| claim.compute_content_fingerprint());
            groups.entry(fingerprint).or_default().push(claim);
        }

        let mut canonicals = Vec::with_capacity(groups.len());
        for (fingerprint, members) in &groups {
            let candidate = build_canonical(tenant, fingerprint, members, &documents);
            let merged = if dry_run {
                candidate
            } else {
                let merged = store
                    .upsert_canonical(&candidate)
                    .map_err(|e| JanitorError::Store(e.to_string()))?;
                for claim in members {
                    store
                        .add_edge(
                            tenant,
                            &CanonicalEdge::Supports {
                                claim: claim.id,
                                canonical: merged.id,
                            },
                        )
                        .map_err(|e| JanitorError::Store(e.to_string()))?;
                }
                merged
            };
            report.canonicals_upserted += 1;
            report.support_edges += members.len();
            canonicals.push(merged);
        }

        // Step 2: relate canonical claims answering the same question
        let mut by_identity: BTreeMap<(ClaimKey, String), Vec<&CanonicalClaim>> = BTreeMap::new();
        for canonical in canonicals.iter().filter(|c| c.is_active()) {
            if let (Some(key), Some(_)) = (&canonical.claim_key, &canonical.value) {
                by_identity
                    .entry((key.clone(), canonical.scope_key.clone()))
                    .or_default()
                    .push(canonical);
            }
        }

        let claims_by_id: HashMap<_, _> = claims.iter().map(|c| (c.id, c)).collect();
        let mut retired = BTreeSet::new();

        for ((key, scope_key), group) in &by_identity {
            for (i, x) in group.iter().enumerate() {
                for y in &group[i + 1..] {
                    if normalized_value(x) == normalized_value(y) {
                        continue;
                    }
                    let edge = if is_newer(x, y, &documents) {
                        Some((*x, *y))
                    } else if is_newer(y, x, &documents) {
                        Some((*y, *x))
                    } else {
                        None
                    };

                    match edge {
                        Some((newer, older)) => {
                            debug!(%key, scope_key, newer = %newer.id, older = %older.id, "Supersession");
                            if !dry_run {
                                store
                                    .add_edge(
                                        tenant,
                                        &CanonicalEdge::Supersedes {
                                            newer: newer.id,
                                            older: older.id,
                                        },
                                    )
                                    .map_err(|e| JanitorError::Store(e.to_string()))?;
                                store
                                    .mark_superseded(older.id)
                                    .map_err(|e| JanitorError::Store(e.to_string()))?;
                            }
                            retired.extend(older.supporting_claims.iter().copied());
                            report.supersessions += 1;
                        }
                        None => {
                            debug!(%key, scope_key, a = %x.id, b = %y.id, "Conflict");
                            if !dry_run {
                                store
                                    .add_edge(tenant, &CanonicalEdge::conflict(x.id, y.id))
                                    .map_err(|e| JanitorError::Store(e.to_string()))?;
                            }
                            report.conflicts += 1;
                        }
                    }
                }
            }
        }

        for id in retired {
            let Some(claim) = claims_by_id.get(&id) else {
                continue;
            };
            if !dry_run {
                let mut claim = (*claim).clone();
                claim.status = ClaimStatus::Superseded;
                store
                    .save_claim(&claim)
                    .map_err(|e| JanitorError::Store(e.to_string()))?;
            }
            report.claims_retired += 1;
        }

        Ok(report)
    }
}

fn load_documents<S>(
    store: &S,
    claims: &[Claim],
) -> Result<HashMap<DocumentId, SourceDocument>, JanitorError>
where
    S: GovernanceStore,
    S::Error: Display,
{
    let ids: BTreeSet<&DocumentId> = claims.iter().map(|c| &c.document_id).collect();
    let mut documents = HashMap::with_capacity(ids.len());
    for id in ids {
        if let Some(document) = store
            .get_document(id)
            .map_err(|e| JanitorError::Store(e.to_string()))?
        {
            documents.insert(id.clone(), document);
        }
    }
    Ok(documents)
}

fn build_canonical(
    tenant: &str,
    fingerprint: &str,
    members: &[&Claim],
    documents: &HashMap<DocumentId, SourceDocument>,
) -> CanonicalClaim {
    // Representative: most confident, then oldest id
    let representative = members.iter().copied().max_by(|a, b| {
        a.confidence
            .value()
            .total_cmp(&b.confidence.value())
            .then_with(|| b.id.cmp(&a.id))
    });
    let (text, scope_key) = representative
        .map(|c| (c.text.clone(), c.scope_key()))
        .unwrap_or_default();

    let mut canonical = CanonicalClaim::new(tenant, text, fingerprint, scope_key);
    for claim in members {
        canonical.supporting_claims.insert(claim.id);
        canonical.documents.insert(claim.document_id.clone());
        let authority = documents
            .get(&claim.document_id)
            .map_or(AuthorityLevel::Unknown, |d| d.authority);
        canonical.authority = canonical.authority.max(authority);
        if canonical.claim_key.is_none() && claim.claim_key.is_some() {
            canonical.claim_key = claim.claim_key.clone();
            canonical.value = claim.value.clone();
        }
    }
    canonical
}

fn normalized_value(canonical: &CanonicalClaim) -> Option<String> {
    canonical.value.as_ref().map(|v| v.trim().to_lowercase())
}

/// Every document behind `newer` is a strictly newer revision, in the same
/// family, than every document behind `older`
fn is_newer(
    newer: &CanonicalClaim,
    older: &CanonicalClaim,
    documents: &HashMap<DocumentId, SourceDocument>,
) -> bool {
    if newer.documents.is_empty() || older.documents.is_empty() {
        return false;
    }
    newer.documents.iter().all(|n| {
        older.documents.iter().all(|o| match (documents.get(n), documents.get(o)) {
            (Some(n), Some(o)) => n.is_newer_revision_of(o),
            _ => false,
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use canonry_domain::{ClaimDraft, ClaimType, PassageId};

    fn doc(id: &str, family: &str, revision: u32) -> SourceDocument {
        SourceDocument::new(
            DocumentId::new(id).unwrap(),
            "acme",
            family,
            revision,
            AuthorityLevel::Official,
        )
    }

    fn claim(document: &str, text: &str, confidence: f64) -> Claim {
        ClaimDraft::new("acme", DocumentId::new(document).unwrap(), text, ClaimType::Factual, text)
            .with_unit(PassageId::new(format!("{}-p", document)).unwrap())
            .with_confidence(confidence)
            .build()
            .unwrap()
    }

    fn documents(docs: &[SourceDocument]) -> HashMap<DocumentId, SourceDocument> {
        docs.iter().map(|d| (d.id.clone(), d.clone())).collect()
    }

    #[test]
    fn test_build_canonical_picks_confident_representative() {
        let a = claim("d1", "Uptime is 99.9%", 0.4);
        let b = claim("d2", "uptime is 99.9%", 0.9);
        let docs = documents(&[doc("d1", "sla", 1)]);

        let canonical = build_canonical("acme", "fp", &[&a, &b], &docs);
        assert_eq!(canonical.text, "uptime is 99.9%");
        assert_eq!(canonical.support_count(), 2);
        assert_eq!(canonical.documents.len(), 2);
        // d2 has no document record; the known one still lifts authority
        assert_eq!(canonical.authority, AuthorityLevel::Official);
    }

    #[test]
    fn test_is_newer_requires_every_document() {
        let docs = documents(&[
            doc("v1", "whitepaper", 1),
            doc("v2", "whitepaper", 2),
            doc("faq", "faq", 9),
        ]);
        let mut older = CanonicalClaim::new("acme", "t", "fp-old", "global");
        older.documents.insert(DocumentId::new("v1").unwrap());
        let mut newer = CanonicalClaim::new("acme", "t", "fp-new", "global");
        newer.documents.insert(DocumentId::new("v2").unwrap());

        assert!(is_newer(&newer, &older, &docs));
        assert!(!is_newer(&older, &newer, &docs));

        newer.documents.insert(DocumentId::new("faq").unwrap());
        assert!(!is_newer(&newer, &older, &docs));
    }

    #[test]
    fn test_unknown_documents_never_supersede() {
        let docs = documents(&[doc("v1", "whitepaper", 1)]);
        let mut older = CanonicalClaim::new("acme", "t", "fp-old", "global");
        older.documents.insert(DocumentId::new("v1").unwrap());
        let mut newer = CanonicalClaim::new("acme", "t", "fp-new", "global");
        newer.documents.insert(DocumentId::new("unregistered").unwrap());
        assert!(!is_newer(&newer, &older, &docs));
    }
}
