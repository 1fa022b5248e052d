//! Deterministic identity tagging
//!
//! A ranked table of regex patterns maps statement text to a [`ClaimKey`].
//! Keys and questions may contain `{placeholder}`s which are filled from a
//! named capture of the same name, then from the caller's context map. A
//! placeholder that cannot be filled means the pattern does not fire.

use crate::GatekeeperError;
use canonry_domain::{ClaimKey, ValueKind};
use regex::{Captures, Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::debug;

/// One row of the identity table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityPattern {
    /// Row name, reported in tags
    pub name: String,
    /// Case-insensitive regex; an optional `value` capture carries the parsed value
    pub pattern: String,
    /// Domain template
    pub domain: String,
    /// Key template
    pub key: String,
    /// Kind of value the fact carries
    pub value_kind: ValueKind,
    /// Question the fact answers (template)
    pub canonical_question: String,
}

impl IdentityPattern {
    /// Create a table row
    pub fn new(
        name: &str,
        pattern: &str,
        domain: &str,
        key: &str,
        value_kind: ValueKind,
        canonical_question: &str,
    ) -> Self {
        Self {
            name: name.to_string(),
            pattern: pattern.to_string(),
            domain: domain.to_string(),
            key: key.to_string(),
            value_kind,
            canonical_question: canonical_question.to_string(),
        }
    }
}

/// Identity assigned to a statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityTag {
    /// Name of the pattern that fired
    pub pattern: String,
    /// Resolved identity key
    pub claim_key: ClaimKey,
    /// Kind of value
    pub value_kind: ValueKind,
    /// Parsed value, when the pattern captures one
    pub value: Option<String>,
    /// Resolved canonical question
    pub canonical_question: String,
}

impl IdentityTag {
    /// Whether a value was parsed out of the text
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }
}

/// Built-in identity table, highest rank first
pub fn default_identity_patterns() -> Vec<IdentityPattern> {
    use ValueKind::*;
    vec![
        IdentityPattern::new(
            "tls_version",
            r"\b(?:tls|ssl)\s*(?:v|version\s*)?(?P<value>\d(?:\.\d)?)\b",
            "security",
            "tls_min_version",
            Version,
            "What is the minimum supported TLS version?",
        ),
        IdentityPattern::new(
            "sla_uptime",
            r"\b(?:uptime|availability|sla)\b[^.%]{0,40}?(?P<value>\d{2,3}(?:\.\d+)?)\s*%",
            "reliability",
            "sla_uptime",
            Percentage,
            "What uptime does the SLA guarantee?",
        ),
        IdentityPattern::new(
            "sla_uptime_trailing",
            r"(?P<value>\d{2,3}(?:\.\d+)?)\s*%\s*(?:uptime|availability)\b",
            "reliability",
            "sla_uptime",
            Percentage,
            "What uptime does the SLA guarantee?",
        ),
        IdentityPattern::new(
            "encryption_at_rest",
            r"\bencrypt(?:ed|ion|s)?\b.{0,40}?\bat rest\b|\bat rest\b.{0,40}?\bencrypt",
            "security",
            "encryption_at_rest",
            Boolean,
            "Is data encrypted at rest?",
        ),
        IdentityPattern::new(
            "encryption_in_transit",
            r"\bencrypt(?:ed|ion|s)?\b.{0,40}?\bin transit\b|\bin transit\b.{0,40}?\bencrypt",
            "security",
            "encryption_in_transit",
            Boolean,
            "Is data encrypted in transit?",
        ),
        IdentityPattern::new(
            "backup_frequency",
            r"\bbackups?\b.{0,40}?\b(?P<value>hourly|daily|weekly|monthly|every \d+ (?:minutes|hours|days))\b",
            "operations",
            "backup_frequency",
            Frequency,
            "How often are backups taken?",
        ),
        IdentityPattern::new(
            "backup_frequency_leading",
            r"\b(?P<value>hourly|daily|weekly|monthly)\s+backups?\b",
            "operations",
            "backup_frequency",
            Frequency,
            "How often are backups taken?",
        ),
        IdentityPattern::new(
            "patch_frequency",
            r"\bpatch(?:es|ed|ing)?\b.{0,40}?\b(?P<value>daily|weekly|monthly|quarterly|within \d+ (?:hours|days))\b",
            "operations",
            "patch_frequency",
            Frequency,
            "How quickly are patches applied?",
        ),
        IdentityPattern::new(
            "retention_period",
            r"\b(?:retain(?:ed|s)?|retention|kept|stored)\b.{0,40}?\b(?:for|of)\s+(?P<value>\d+\s*(?:days?|weeks?|months?|years?))\b",
            "data",
            "retention_period",
            Duration,
            "How long is data retained?",
        ),
        IdentityPattern::new(
            "data_residency",
            r"\b(?:stored|hosted|processed|resides?|located|residency)\b.{0,30}?\bin\s+(?:the\s+)?(?-i:(?P<country>[A-Z][a-zA-Z]+(?:\s[A-Z][a-zA-Z]+)?))",
            "data",
            "residency_{country}",
            Location,
            "Is data kept in {country}?",
        ),
        IdentityPattern::new(
            "responsibility",
            r"\b(?P<value>customer|provider|vendor|client|subscriber)s?\s+(?:is|are|remains?)\s+(?:solely\s+)?responsible\s+for\b",
            "governance",
            "responsibility_{topic}",
            Party,
            "Who is responsible for {topic}?",
        ),
        IdentityPattern::new(
            "min_version",
            r"\b(?:requires|minimum|at least)\b.{0,30}?\bversion\s*(?P<value>\d+(?:\.\d+)*)",
            "compatibility",
            "{context}_min_version",
            Version,
            "What is the minimum supported version of {context}?",
        ),
        IdentityPattern::new(
            "min_version_trailing",
            r"\bversion\s*(?P<value>\d+(?:\.\d+)*)\s+(?:or later|or higher|and above)\b",
            "compatibility",
            "{context}_min_version",
            Version,
            "What is the minimum supported version of {context}?",
        ),
        IdentityPattern::new(
            "rto",
            r"\b(?:rto|recovery time objective)\b.{0,30}?(?P<value>\d+\s*(?:minutes?|hours?|days?))",
            "continuity",
            "rto",
            Duration,
            "What is the recovery time objective?",
        ),
        IdentityPattern::new(
            "rpo",
            r"\b(?:rpo|recovery point objective)\b.{0,30}?(?P<value>\d+\s*(?:minutes?|hours?|days?))",
            "continuity",
            "rpo",
            Duration,
            "What is the recovery point objective?",
        ),
        IdentityPattern::new(
            "size_limit",
            r"\b(?:max(?:imum)?|up to|limit(?:ed)?\s+(?:of|to)|no (?:larger|more) than)\s*(?:size\s*(?:of\s*)?)?(?P<value>\d+(?:\.\d+)?\s*(?:kb|mb|gb|tb))\b",
            "limits",
            "{topic}_max_size",
            Size,
            "What is the maximum {topic} size?",
        ),
    ]
}

struct CompiledPattern {
    row: IdentityPattern,
    regex: Regex,
}

/// Applies a ranked identity table to statement text
pub struct ClaimKeyTagger {
    patterns: Vec<CompiledPattern>,
    placeholder: Regex,
}

impl ClaimKeyTagger {
    /// Compile a table
    ///
    /// # Errors
    /// Returns [`GatekeeperError::Config`] naming the first row whose regex
    /// does not compile.
    pub fn new(table: &[IdentityPattern]) -> Result<Self, GatekeeperError> {
        let patterns = table
            .iter()
            .map(|row| {
                RegexBuilder::new(&row.pattern)
                    .case_insensitive(true)
                    .build()
                    .map(|regex| CompiledPattern {
                        row: row.clone(),
                        regex,
                    })
                    .map_err(|e| {
                        GatekeeperError::Config(format!("identity pattern '{}': {}", row.name, e))
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let placeholder = Regex::new(r"\{(\w+)\}")
            .map_err(|e| GatekeeperError::Config(e.to_string()))?;

        Ok(Self {
            patterns,
            placeholder,
        })
    }

    /// Tagger over the built-in table
    pub fn with_defaults() -> Result<Self, GatekeeperError> {
        Self::new(&default_identity_patterns())
    }

    /// Number of rows in the table
    pub fn len(&self) -> usize {
        self.patterns.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }

    /// Tag `text`; the first row that matches and resolves wins
    pub fn tag(&self, text: &str, context: &HashMap<String, String>) -> Option<IdentityTag> {
        for compiled in &self.patterns {
            let Some(caps) = compiled.regex.captures(text) else {
                continue;
            };

            let row = &compiled.row;
            let resolved = (|| {
                Some((
                    self.fill(&row.domain, &caps, context, true)?,
                    self.fill(&row.key, &caps, context, true)?,
                    self.fill(&row.canonical_question, &caps, context, false)?,
                ))
            })();

            let Some((domain, key, question)) = resolved else {
                debug!(pattern = %row.name, "Identity pattern matched but a placeholder is unresolved");
                continue;
            };

            let value = caps
                .name("value")
                .map(|m| m.as_str().trim().to_lowercase())
                .filter(|v| !v.is_empty());

            return Some(IdentityTag {
                pattern: row.name.clone(),
                claim_key: ClaimKey::new(domain, key),
                value_kind: row.value_kind,
                value,
                canonical_question: question,
            });
        }
        None
    }

    /// Substitute every `{name}` in `template`; `None` if any is unresolved
    fn fill(
        &self,
        template: &str,
        caps: &Captures<'_>,
        context: &HashMap<String, String>,
        normalize: bool,
    ) -> Option<String> {
        let mut out = String::with_capacity(template.len());
        let mut last = 0;
        for placeholder in self.placeholder.captures_iter(template) {
            let whole = placeholder.get(0)?;
            let name = placeholder.get(1)?.as_str();
            let raw = resolve_placeholder(name, caps, context)?;
            let value = if normalize {
                normalize_placeholder(&raw)
            } else {
                raw.trim().to_string()
            };
            if value.is_empty() {
                return None;
            }
            out.push_str(&template[last..whole.start()]);
            out.push_str(&value);
            last = whole.end();
        }
        out.push_str(&template[last..]);
        Some(out)
    }
}

/// Look a placeholder up in the match, then in the context map
fn resolve_placeholder(name: &str, caps: &Captures<'_>, context: &HashMap<String, String>) -> Option<String> {
    if let Some(m) = caps.name(name) {
        if !m.as_str().trim().is_empty() {
            return Some(m.as_str().to_string());
        }
    }
    let alias = match name {
        "context" => Some("product"),
        "topic" => Some("theme"),
        _ => None,
    };
    std::iter::once(name)
        .chain(alias)
        .filter_map(|k| context.get(k))
        .find(|v| !v.trim().is_empty())
        .cloned()
}

/// Lower-case and strip everything that is not alphanumeric
pub fn normalize_placeholder(raw: &str) -> String {
    raw.chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}
