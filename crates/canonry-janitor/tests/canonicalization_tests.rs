//! Integration tests: canonicalization passes over SqliteStore

use canonry_domain::traits::{ClaimFilter, GovernanceStore};
use canonry_domain::{
    AuthorityLevel, CanonicalEdge, CanonicalStatus, Claim, ClaimDraft, ClaimKey, ClaimStatus,
    ClaimType, DocumentId, PassageId, SourceDocument,
};
use canonry_janitor::{
    Canonicalizer, JanitorConfig, JanitorWorker, PassOutcome, CANONICALIZATION_LEASE,
};
use canonry_store::SqliteStore;
use std::sync::Arc;
use std::time::Duration;

fn doc(id: &str) -> DocumentId {
    DocumentId::new(id).unwrap()
}

fn register(store: &SqliteStore, id: &str, family: &str, revision: u32, authority: AuthorityLevel) {
    store
        .put_document(&SourceDocument::new(doc(id), "acme", family, revision, authority))
        .unwrap();
}

fn keyed(document: &str, text: &str, key: Option<(&str, &str, &str)>) -> Claim {
    let mut claim = ClaimDraft::new("acme", doc(document), text, ClaimType::Factual, text)
        .with_unit(PassageId::new(format!("{}:{}", document, text)).unwrap())
        .with_confidence(0.8)
        .build()
        .unwrap();
    if let Some((domain, name, value)) = key {
        claim.claim_key = Some(ClaimKey::new(domain, name));
        claim.value = Some(value.to_string());
    }
    claim.content_fingerprint = Some(claim.compute_content_fingerprint());
    claim
}

struct Fixture {
    store: SqliteStore,
    tls_old: Claim,
    tls_new: Claim,
    uptime_faq: Claim,
    uptime_wp: Claim,
    backups: [Claim; 2],
}

fn fixture() -> Fixture {
    let store = SqliteStore::new(":memory:").unwrap();
    register(&store, "wp-v1", "whitepaper", 1, AuthorityLevel::Official);
    register(&store, "wp-v2", "whitepaper", 2, AuthorityLevel::Official);
    register(&store, "faq", "faq", 1, AuthorityLevel::Community);

    let tls_old = keyed("wp-v1", "TLS 1.0 is supported", Some(("security", "tls_min_version", "1.0")));
    let tls_new = keyed("wp-v2", "TLS 1.2 is supported", Some(("security", "tls_min_version", "1.2")));
    let uptime_faq = keyed("faq", "Uptime is 99.5%", Some(("sla", "uptime", "99.5%")));
    let uptime_wp = keyed("wp-v2", "Uptime is 99.9%", Some(("sla", "uptime", "99.9%")));
    let backups = [
        keyed("faq", "Backups run daily", None),
        keyed("wp-v2", "backups run daily", None),
    ];

    for claim in [&tls_old, &tls_new, &uptime_faq, &uptime_wp, &backups[0], &backups[1]] {
        store.save_claim(claim).unwrap();
    }

    Fixture {
        store,
        tls_old,
        tls_new,
        uptime_faq,
        uptime_wp,
        backups,
    }
}

fn canonical_of(store: &SqliteStore, claim: &Claim) -> canonry_domain::CanonicalClaim {
    store
        .fetch_canonicals("acme")
        .unwrap()
        .into_iter()
        .find(|c| c.supporting_claims.contains(&claim.id))
        .unwrap()
}

#[test]
fn test_pass_builds_graph() {
    let f = fixture();
    let mut canonicalizer = Canonicalizer::new(JanitorConfig::default());

    let PassOutcome::Completed(report) = canonicalizer.run_pass(&f.store, "acme").unwrap() else {
        panic!("pass should run");
    };
    assert_eq!(report.canonicals_upserted, 5);
    assert_eq!(report.support_edges, 6);
    assert_eq!(report.supersessions, 1);
    assert_eq!(report.conflicts, 1);
    assert_eq!(report.claims_retired, 1);

    // Same content on two documents: one canonical, authority of the best source
    let backups = canonical_of(&f.store, &f.backups[0]);
    assert_eq!(backups.support_count(), 2);
    assert_eq!(backups.authority, AuthorityLevel::Official);
    assert!(backups.supporting_claims.contains(&f.backups[1].id));

    // A newer revision of the same family supersedes
    let old = canonical_of(&f.store, &f.tls_old);
    let new = canonical_of(&f.store, &f.tls_new);
    assert_eq!(old.status, CanonicalStatus::Superseded);
    assert!(new.is_active());
    assert!(f
        .store
        .edges_for(old.id)
        .unwrap()
        .contains(&CanonicalEdge::Supersedes {
            newer: new.id,
            older: old.id
        }));
    let retired = f.store.get_claim(f.tls_old.id).unwrap().unwrap();
    assert_eq!(retired.status, ClaimStatus::Superseded);

    // Different families disagreeing is a conflict, and nothing is retired
    let faq = canonical_of(&f.store, &f.uptime_faq);
    let wp = canonical_of(&f.store, &f.uptime_wp);
    assert!(f
        .store
        .edges_for(faq.id)
        .unwrap()
        .contains(&CanonicalEdge::conflict(faq.id, wp.id)));
    assert!(faq.is_active() && wp.is_active());
}

#[test]
fn test_second_pass_is_stable() {
    let f = fixture();
    let mut canonicalizer = Canonicalizer::default_config();
    canonicalizer.run_pass(&f.store, "acme").unwrap();
    let before = f.store.fetch_canonicals("acme").unwrap();

    let PassOutcome::Completed(report) = canonicalizer.run_pass(&f.store, "acme").unwrap() else {
        panic!("pass should run");
    };
    // The retired claim no longer participates
    assert_eq!(report.canonicals_upserted, 4);
    assert_eq!(report.supersessions, 0);
    assert_eq!(report.conflicts, 1);

    let after = f.store.fetch_canonicals("acme").unwrap();
    assert_eq!(before.len(), after.len());
    for canonical in &after {
        let earlier = before.iter().find(|c| c.id == canonical.id).unwrap();
        assert_eq!(earlier.supporting_claims, canonical.supporting_claims);
        assert_eq!(earlier.status, canonical.status);
    }
    assert_eq!(canonicalizer.metrics().passes, 2);
}

#[test]
fn test_dry_run_writes_nothing() {
    let f = fixture();
    let config = JanitorConfig {
        dry_run: true,
        ..JanitorConfig::default()
    };
    let mut canonicalizer = Canonicalizer::new(config);

    let PassOutcome::Completed(report) = canonicalizer.run_pass(&f.store, "acme").unwrap() else {
        panic!("pass should run");
    };
    assert!(report.dry_run);
    assert_eq!(report.supersessions, 1);
    assert!(f.store.fetch_canonicals("acme").unwrap().is_empty());
    assert_eq!(
        f.store.fetch_claims("acme", &ClaimFilter::active()).unwrap().len(),
        6
    );
}

#[test]
fn test_held_lease_skips_pass() {
    let f = fixture();
    assert!(f
        .store
        .try_acquire_lease(CANONICALIZATION_LEASE, "someone-else", Duration::from_secs(60))
        .unwrap());

    let mut canonicalizer = Canonicalizer::default_config();
    assert_eq!(
        canonicalizer.run_pass(&f.store, "acme").unwrap(),
        PassOutcome::SkippedLocked
    );
    assert_eq!(canonicalizer.metrics().skipped_locked, 1);
    assert!(f.store.fetch_canonicals("acme").unwrap().is_empty());

    // Our failed attempt must not have released someone else's lease
    assert!(!f
        .store
        .try_acquire_lease(CANONICALIZATION_LEASE, "third-party", Duration::from_secs(60))
        .unwrap());
}

#[test]
fn test_same_configured_holder_cannot_overlap() {
    let f = fixture();
    let config = JanitorConfig::default();

    // A pass in flight elsewhere in this process, under the shared holder name
    assert!(f
        .store
        .try_acquire_lease(CANONICALIZATION_LEASE, &config.holder, Duration::from_secs(60))
        .unwrap());

    let mut second = Canonicalizer::new(config.clone());
    assert_eq!(
        second.run_pass(&f.store, "acme").unwrap(),
        PassOutcome::SkippedLocked
    );

    // The in-flight lease survives the skipped attempt
    assert!(!f
        .store
        .try_acquire_lease(CANONICALIZATION_LEASE, "other-process", Duration::from_secs(60))
        .unwrap());
    f.store.release_lease(CANONICALIZATION_LEASE, &config.holder).unwrap();

    // Two canonicalizers built from one config take distinct leases in turn
    let mut first = Canonicalizer::new(config.clone());
    let mut again = Canonicalizer::new(config);
    assert!(matches!(first.run_pass(&f.store, "acme").unwrap(), PassOutcome::Completed(_)));
    assert!(matches!(again.run_pass(&f.store, "acme").unwrap(), PassOutcome::Completed(_)));
}

#[test]
fn test_lease_released_after_pass() {
    let f = fixture();
    let mut canonicalizer = Canonicalizer::default_config();
    canonicalizer.run_pass(&f.store, "acme").unwrap();

    assert!(f
        .store
        .try_acquire_lease(CANONICALIZATION_LEASE, "next-holder", Duration::from_secs(60))
        .unwrap());
}

#[tokio::test(start_paused = true)]
async fn test_worker_over_shared_store() {
    let _ = tracing_subscriber::fmt().with_test_writer().try_init();

    let f = fixture();
    let store = Arc::new(f.store);
    let config = JanitorConfig {
        sweep_interval_minutes: 1,
        ..JanitorConfig::default()
    }
    .with_tenants(["acme", "empty-tenant"]);

    let mut worker = JanitorWorker::new(config);
    worker.run_cycles(Arc::clone(&store), 2).await.unwrap();

    assert_eq!(worker.metrics().passes, 4);
    assert_eq!(worker.metrics().supersessions, 1);
    assert_eq!(store.fetch_canonicals("acme").unwrap().len(), 5);
}
