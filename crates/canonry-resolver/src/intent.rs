//! Intent resolver
//!
//! Maps a free-text query onto candidate claim clusters. A single cluster is
//! only ever returned on its own when the query names it (or one of its
//! entities) literally; otherwise the caller gets at least two options to
//! choose from, however lopsided the scores are.

use crate::IntentConfig;
use serde::{Deserialize, Serialize};

/// A cluster of claims the query might be about
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClusterCandidate {
    /// Display label (e.g. "Data residency")
    pub label: String,
    /// Retrieval score; higher is better
    pub score: f64,
    /// Entity names in the cluster
    #[serde(default)]
    pub entities: Vec<String>,
    /// Facet names in the cluster
    #[serde(default)]
    pub facets: Vec<String>,
    /// Sample evidence text
    #[serde(default)]
    pub sample_evidence: Vec<String>,
    /// Number of documents behind the cluster
    #[serde(default)]
    pub document_count: usize,
}

impl ClusterCandidate {
    /// Create a candidate with no entities, facets or evidence
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
            entities: Vec::new(),
            facets: Vec::new(),
            sample_evidence: Vec::new(),
            document_count: 0,
        }
    }

    /// Add an entity name
    pub fn with_entity(mut self, entity: impl Into<String>) -> Self {
        self.entities.push(entity.into());
        self
    }

    /// Add a facet name
    pub fn with_facet(mut self, facet: impl Into<String>) -> Self {
        self.facets.push(facet.into());
        self
    }

    /// Add sample evidence
    pub fn with_evidence(mut self, text: impl Into<String>) -> Self {
        self.sample_evidence.push(text.into());
        self
    }

    /// Set the document count
    pub fn with_document_count(mut self, count: usize) -> Self {
        self.document_count = count;
        self
    }

    /// The label or entity named literally in `query`, if any
    pub fn lexical_match(&self, query: &str) -> Option<&str> {
        std::iter::once(self.label.as_str())
            .chain(self.entities.iter().map(String::as_str))
            .find(|term| contains_term(query, term))
    }
}

/// One option presented for disambiguation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisambiguationOption {
    /// Cluster label
    pub label: String,
    /// A sample claim text, if the cluster has evidence
    pub sample_claim: Option<String>,
    /// Facet names
    pub facets: Vec<String>,
    /// Entity names
    pub entities: Vec<String>,
    /// Documents behind the cluster
    pub document_count: usize,
}

impl From<&ClusterCandidate> for DisambiguationOption {
    fn from(candidate: &ClusterCandidate) -> Self {
        Self {
            label: candidate.label.clone(),
            sample_claim: candidate.sample_evidence.first().cloned(),
            facets: candidate.facets.clone(),
            entities: candidate.entities.clone(),
            document_count: candidate.document_count,
        }
    }
}

/// Result of intent resolution
#[derive(Debug, Clone, PartialEq)]
pub enum IntentResolution {
    /// The query names exactly one cluster
    Resolved {
        /// The cluster
        option: DisambiguationOption,
        /// Term found in the query
        matched: String,
        /// Why
        justification: String,
    },
    /// The user should choose
    Disambiguate {
        /// Options, best first
        options: Vec<DisambiguationOption>,
        /// Set when only one candidate exists but the query does not name it
        needs_confirmation: bool,
        /// Why
        justification: String,
    },
    /// Nothing to offer
    NoCandidates {
        /// Why
        justification: String,
    },
}

impl IntentResolution {
    /// Options in presentation order
    pub fn options(&self) -> Vec<&DisambiguationOption> {
        match self {
            IntentResolution::Resolved { option, .. } => vec![option],
            IntentResolution::Disambiguate { options, .. } => options.iter().collect(),
            IntentResolution::NoCandidates { .. } => Vec::new(),
        }
    }

    /// Human-readable justification
    pub fn justification(&self) -> &str {
        match self {
            IntentResolution::Resolved { justification, .. }
            | IntentResolution::Disambiguate { justification, .. }
            | IntentResolution::NoCandidates { justification } => justification,
        }
    }
}

/// Intent resolver
#[derive(Debug, Clone, Default)]
pub struct IntentResolver {
    config: IntentConfig,
}

impl IntentResolver {
    /// Create a resolver; `max_options` below two is raised to two
    pub fn new(config: IntentConfig) -> Self {
        Self {
            config: IntentConfig {
                max_options: config.max_options.max(2),
            },
        }
    }

    /// Resolve `query` against `candidates`
    pub fn resolve(&self, query: &str, candidates: &[ClusterCandidate]) -> IntentResolution {
        if candidates.is_empty() {
            return IntentResolution::NoCandidates {
                justification: "no candidate clusters".to_string(),
            };
        }

        let mut ranked: Vec<&ClusterCandidate> = candidates.iter().collect();
        ranked.sort_by(|a, b| b.score.total_cmp(&a.score));

        let matched: Vec<(&ClusterCandidate, &str)> = ranked
            .iter()
            .filter_map(|c| c.lexical_match(query).map(|term| (*c, term)))
            .collect();

        if let [(candidate, term)] = matched.as_slice() {
            return IntentResolution::Resolved {
                option: DisambiguationOption::from(*candidate),
                matched: term.to_string(),
                justification: format!("query names '{}'", term),
            };
        }

        if matched.len() > 1 {
            let options = matched
                .iter()
                .take(self.config.max_options)
                .map(|(c, _)| DisambiguationOption::from(*c))
                .collect();
            return IntentResolution::Disambiguate {
                options,
                needs_confirmation: false,
                justification: format!("query names {} clusters", matched.len()),
            };
        }

        let needs_confirmation = ranked.len() == 1;
        let options = ranked
            .iter()
            .take(self.config.max_options)
            .map(|c| DisambiguationOption::from(*c))
            .collect();
        let justification = if needs_confirmation {
            "single candidate not named in the query; confirm before use".to_string()
        } else {
            format!(
                "no cluster named in the query; offering top {} of {}",
                ranked.len().min(self.config.max_options),
                ranked.len()
            )
        };
        IntentResolution::Disambiguate {
            options,
            needs_confirmation,
            justification,
        }
    }
}

/// Case-insensitive whole-term match: the neighbors of a hit must not be alphanumeric
fn contains_term(haystack: &str, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return false;
    }
    let haystack = haystack.to_lowercase();
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(&term) {
        let begin = start + pos;
        let end = begin + term.len();
        let before = haystack[..begin].chars().next_back();
        let after = haystack[end..].chars().next();
        if !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric) {
            return true;
        }
        start = begin + haystack[begin..].chars().next().map_or(1, char::len_utf8);
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    fn clusters() -> Vec<ClusterCandidate> {
        vec![
            ClusterCandidate::new("Data residency", 0.92)
                .with_entity("EU region")
                .with_facet("country")
                .with_evidence("Customer data is stored in Germany")
                .with_document_count(4),
            ClusterCandidate::new("Backups", 0.31).with_entity("S3"),
            ClusterCandidate::new("Encryption", 0.12),
        ]
    }

    #[test]
    fn test_label_match_resolves() {
        let result = IntentResolver::default().resolve("where is data residency defined?", &clusters());
        match result {
            IntentResolution::Resolved { option, matched, .. } => {
                assert_eq!(option.label, "Data residency");
                assert_eq!(matched, "Data residency");
                assert_eq!(option.sample_claim.as_deref(), Some("Customer data is stored in Germany"));
                assert_eq!(option.document_count, 4);
            }
            other => panic!("expected resolution, got {:?}", other),
        }
    }

    #[test]
    fn test_entity_match_resolves() {
        let result = IntentResolver::default().resolve("are s3 buckets replicated", &clusters());
        assert_eq!(result.options()[0].label, "Backups");
        assert!(matches!(result, IntentResolution::Resolved { .. }));
    }

    #[test]
    fn test_partial_word_is_not_a_match() {
        // "encryptions" must not match "Encryption"; "s3x" must not match "S3"
        let result = IntentResolver::default().resolve("encryptions on s3x", &clusters());
        assert!(matches!(result, IntentResolution::Disambiguate { .. }));
    }

    #[test]
    fn test_score_gap_does_not_resolve() {
        let result = IntentResolver::default().resolve("where is my stuff", &clusters());
        let labels: Vec<_> = result.options().iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, vec!["Data residency", "Backups", "Encryption"]);
        assert!(!result.justification().is_empty());
    }

    #[test]
    fn test_several_matches_disambiguate() {
        let result = IntentResolver::default().resolve("backups and encryption", &clusters());
        let labels: Vec<_> = result.options().iter().map(|o| o.label.clone()).collect();
        assert_eq!(labels, vec!["Backups", "Encryption"]);
    }

    #[test]
    fn test_cap_on_options() {
        let many: Vec<_> = (0..10)
            .map(|i| ClusterCandidate::new(format!("topic {}", i), i as f64))
            .collect();
        let result = IntentResolver::new(IntentConfig { max_options: 3 }).resolve("anything", &many);
        assert_eq!(result.options().len(), 3);
        assert_eq!(result.options()[0].label, "topic 9");
    }

    #[test]
    fn test_single_unnamed_candidate_needs_confirmation() {
        let single = vec![ClusterCandidate::new("Backups", 0.99)];
        match IntentResolver::default().resolve("how often", &single) {
            IntentResolution::Disambiguate {
                options,
                needs_confirmation,
                ..
            } => {
                assert_eq!(options.len(), 1);
                assert!(needs_confirmation);
            }
            other => panic!("expected disambiguation, got {:?}", other),
        }
    }

    #[test]
    fn test_no_candidates() {
        let result = IntentResolver::default().resolve("anything", &[]);
        assert!(matches!(result, IntentResolution::NoCandidates { .. }));
    }
}
