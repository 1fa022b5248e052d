//! Integration tests: resolvers driven by configuration, a mocked language
//! model and a SqliteStore

use canonry_domain::traits::{AbstainReason, EntityPair, GovernanceStore, MergeDecision};
use canonry_domain::{
    AuthorityLevel, AuthorityTier, AxisValue, Claim, ClaimDraft, ClaimId, ClaimKey, ClaimStatus,
    ClaimType, DocumentId, EvidenceRef, OrderType, PassageId, Scope, SourceDocument,
};
use canonry_llm::{LlmMergeArbiter, MockProvider};
use canonry_resolver::{
    select, select_current, Aggregator, ClusterCandidate, Comparison, EntityMerger, EntitySimilarity,
    IntentResolution, IntentResolver, MergeBasis, ResolverConfig, SelectionCandidate,
    SelectionPolicy, Verdict,
};
use canonry_store::SqliteStore;

#[test]
fn test_uptime_scenario() {
    let candidates = vec![
        SelectionCandidate::new(ClaimId::from_value(10), "99.9%", AuthorityLevel::Official),
        SelectionCandidate::new(ClaimId::from_value(11), "99.5%", AuthorityLevel::Community),
    ];
    let outcome = select(&SelectionPolicy::default(), &candidates, None);

    assert!(!outcome.ask_user_needed());
    assert_eq!(outcome.selected().unwrap().value, "99.9%");
    assert!(outcome.justification().contains("authority"));
}

#[test]
fn test_stored_policy_roundtrip() {
    let json = r#"{
        "primary_axis": "version",
        "authority_ranking": ["verified", "official", "community", "unknown"],
        "tie_break": "highest_confidence"
    }"#;
    let policy: SelectionPolicy = serde_json::from_str(json).unwrap();
    policy.validate().unwrap();

    // Custom ranking puts VERIFIED above OFFICIAL
    let candidates = vec![
        SelectionCandidate::new(ClaimId::from_value(1), "a", AuthorityLevel::Official),
        SelectionCandidate::new(ClaimId::from_value(2), "b", AuthorityLevel::Verified),
    ];
    assert_eq!(
        select(&policy, &candidates, None).selected().unwrap().claim_id,
        ClaimId::from_value(2)
    );
}

#[test]
fn test_configured_aggregator() {
    let config = ResolverConfig::from_toml(
        r#"
        [aggregator]
        boost_step = 0.1
        boost_cap = 0.1
        low_authority_penalty = 0.5
        high_multiplier = 1.0
        medium_multiplier = 0.5
        low_multiplier = 0.8
        insufficient_evidence_factor = 0.5
        "#,
    )
    .unwrap();
    let aggregator = Aggregator::new(config.aggregator);

    let result = aggregator.aggregate(&[
        Comparison::new(Verdict::Supports, 0.6, AuthorityTier::Medium),
        Comparison::new(Verdict::Supports, 0.5, AuthorityTier::Medium),
        Comparison::new(Verdict::Supports, 0.5, AuthorityTier::Low),
    ]);
    assert_eq!(result.verdict, Verdict::Supports);
    assert!((result.confidence - 0.35).abs() < 1e-9);
}

#[test]
fn test_intent_with_config() {
    let config = ResolverConfig::from_toml("[intent]\nmax_options = 2\n").unwrap();
    let resolver = IntentResolver::new(config.intent);
    let candidates = vec![
        ClusterCandidate::new("Retention", 0.9),
        ClusterCandidate::new("Residency", 0.5),
        ClusterCandidate::new("Backups", 0.1),
    ];

    let result = resolver.resolve("how long do you keep logs", &candidates);
    assert!(matches!(result, IntentResolution::Disambiguate { .. }));
    assert_eq!(result.options().len(), 2);

    let result = resolver.resolve("Retention of logs", &candidates);
    assert!(matches!(result, IntentResolution::Resolved { .. }));
}

#[test]
fn test_entity_merger_with_language_model() {
    let provider = MockProvider::new(
        r#"Here you go:
        [{"pair": 0, "decision": "same"}, {"pair": 1, "decision": "abstain"}]"#,
    );
    let merger = EntityMerger::new(EntitySimilarity::default(), LlmMergeArbiter::new(provider));

    let resolutions = merger.resolve(&[
        EntityPair::new("AWS", "Amazon Web Services").with_context("AWS (Amazon Web Services) hosts..."),
        EntityPair::new("Amazon Web Services", "amazon-web-services"),
        EntityPair::new("GCP", "Google Cloud Platform"),
    ]);

    assert_eq!(resolutions[0].decision, MergeDecision::Same);
    assert_eq!(resolutions[0].basis, MergeBasis::Arbitrated);
    assert_eq!(resolutions[1].basis, MergeBasis::AutoMerge);
    assert_eq!(
        resolutions[2].decision,
        MergeDecision::Abstain(AbstainReason::ModelUncertain)
    );
    assert_eq!(merger.arbiter().provider().call_count(), 1);
}

#[test]
fn test_entity_merger_outage_abstains() {
    let merger = EntityMerger::new(
        EntitySimilarity::default(),
        LlmMergeArbiter::new(MockProvider::unavailable()),
    );
    let resolutions = merger.resolve(&[EntityPair::new("AWS", "Amazon Web Services")]);
    assert_eq!(
        resolutions[0].decision,
        MergeDecision::Abstain(AbstainReason::CollaboratorUnavailable)
    );
}

fn tls_claim(store: &SqliteStore, document: &str, version: &str, value: &str) -> Claim {
    let document_id = DocumentId::new(document).unwrap();
    let text = format!("TLS {} is the minimum", value);
    let mut claim = ClaimDraft::new("acme", document_id, &text, ClaimType::Factual, &text)
        .with_scope(Scope::global().with_version(version))
        .with_unit(PassageId::new(format!("{}:tls", document)).unwrap())
        .with_confidence(0.8)
        .build()
        .unwrap();
    claim.claim_key = Some(ClaimKey::new("security", "tls_min_version"));
    claim.value = Some(value.to_string());
    store.save_claim(&claim).unwrap();
    claim
}

fn official(store: &SqliteStore, id: &str, revision: u32) {
    store
        .put_document(&SourceDocument::new(
            DocumentId::new(id).unwrap(),
            "acme",
            "guide",
            revision,
            AuthorityLevel::Official,
        ))
        .unwrap();
}

fn declare_versions(store: &SqliteStore, order: &[&str]) {
    for version in order {
        let observation = AxisValue::scalar(
            "version",
            *version,
            EvidenceRef::snippet("release notes").unwrap(),
            DocumentId::new(format!("guide-{}", version)).unwrap(),
        )
        .unwrap();
        store.upsert_axis_value("acme", "version", &observation).unwrap();
    }
    let mut axis = store.fetch_axis("acme", "version").unwrap().unwrap();
    axis.declare_order(order.iter().map(|v| v.to_string()).collect(), OrderType::Total)
        .unwrap();
    store.save_axis_ordering(&axis).unwrap();
}

#[test]
fn test_select_current_uses_stored_axis() {
    let store = SqliteStore::new(":memory:").unwrap();
    official(&store, "guide-v1", 1);
    official(&store, "guide-v2", 2);
    tls_claim(&store, "guide-v1", "v1", "1.0");
    let newest = tls_claim(&store, "guide-v2", "v2", "1.2");

    let key = ClaimKey::new("security", "tls_min_version");
    let policy = SelectionPolicy::default().with_primary_axis("version");

    // Equal authority and no axis yet
    let outcome = select_current(&store, "acme", &key, &policy).unwrap();
    assert!(outcome.ask_user_needed());

    declare_versions(&store, &["v1", "v2"]);
    let outcome = select_current(&store, "acme", &key, &policy).unwrap();
    let winner = outcome.selected().unwrap();
    assert_eq!(winner.claim_id, newest.id);
    assert_eq!(winner.value, "1.2");
    assert_eq!(winner.context_value.as_deref(), Some("v2"));
}

#[test]
fn test_select_current_reads_only_the_key_and_status() {
    let store = SqliteStore::new(":memory:").unwrap();
    official(&store, "guide-v1", 1);
    official(&store, "guide-v2", 2);
    let kept = tls_claim(&store, "guide-v1", "v1", "1.0");
    let mut retired = tls_claim(&store, "guide-v2", "v2", "1.2");
    retired.status = ClaimStatus::Superseded;
    store.save_claim(&retired).unwrap();

    let mut other = tls_claim(&store, "guide-v2", "v2", "99.9%");
    other.claim_key = Some(ClaimKey::new("sla", "uptime"));
    store.save_claim(&other).unwrap();

    let key = ClaimKey::new("security", "tls_min_version");
    let outcome = select_current(&store, "acme", &key, &SelectionPolicy::default()).unwrap();
    assert_eq!(outcome.selected().unwrap().claim_id, kept.id);
}

#[test]
fn test_select_current_unregistered_document_has_unknown_authority() {
    let store = SqliteStore::new(":memory:").unwrap();
    official(&store, "guide-v1", 1);
    let vendor = tls_claim(&store, "guide-v1", "v1", "1.2");
    tls_claim(&store, "forum-post", "v1", "1.0");

    let key = ClaimKey::new("security", "tls_min_version");
    let outcome = select_current(&store, "acme", &key, &SelectionPolicy::default()).unwrap();
    let winner = outcome.selected().unwrap();
    assert_eq!(winner.claim_id, vendor.id);
    assert_eq!(winner.authority, AuthorityLevel::Official);
}
