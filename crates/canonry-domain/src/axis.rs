//! Applicability axes - contextual dimensions along which claims vary
//!
//! An axis (version, year, region…) records the values observed in the
//! corpus and how confident we are that those values can be ordered. The
//! model never invents an order: with [`OrderingConfidence::Unknown`] there is
//! no `value_order`, and every comparison answers [`AxisOrder::Unknown`].

use crate::{DocumentId, EvidenceRef, ValidationError};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::BTreeSet;

/// Documents an axis must be observed on before it can act as an identity key
pub const MIN_DOCUMENTS_FOR_CLAIMKEY: usize = 2;

/// Distinct values an axis must show before it can act as an identity key
pub const MIN_VALUES_FOR_CLAIMKEY: usize = 2;

/// How sure we are that an axis' values are orderable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum OrderingConfidence {
    /// Order declared explicitly
    Certain,
    /// Order inferred from the shape of the values
    Inferred,
    /// No trustworthy order
    Unknown,
}

impl OrderingConfidence {
    /// Get the confidence name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderingConfidence::Certain => "CERTAIN",
            OrderingConfidence::Inferred => "INFERRED",
            OrderingConfidence::Unknown => "UNKNOWN",
        }
    }

    /// Parse from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "CERTAIN" => Some(OrderingConfidence::Certain),
            "INFERRED" => Some(OrderingConfidence::Inferred),
            "UNKNOWN" => Some(OrderingConfidence::Unknown),
            _ => None,
        }
    }
}

/// Shape of an axis' order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Every pair of values is comparable
    Total,
    /// Only the listed chain is comparable
    Partial,
    /// Values are not comparable
    None,
}

impl OrderType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderType::Total => "total",
            OrderType::Partial => "partial",
            OrderType::None => "none",
        }
    }

    /// Parse from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "total" => Some(OrderType::Total),
            "partial" => Some(OrderType::Partial),
            "none" => Some(OrderType::None),
            _ => None,
        }
    }
}

/// The observed value itself
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "UPPERCASE")]
pub enum AxisValueKind {
    /// A single value ("2.1", "2024", "EU")
    Scalar {
        /// The value
        value: String,
    },
    /// An inclusive range ("2.0" to "2.4")
    Range {
        /// Lower bound
        low: String,
        /// Upper bound
        high: String,
    },
    /// An unordered set of values
    Set {
        /// Members
        members: BTreeSet<String>,
    },
}

impl AxisValueKind {
    /// Canonical textual token of the value
    pub fn token(&self) -> String {
        match self {
            AxisValueKind::Scalar { value } => value.trim().to_string(),
            AxisValueKind::Range { low, high } => format!("{}..{}", low.trim(), high.trim()),
            AxisValueKind::Set { members } => format!(
                "{{{}}}",
                members
                    .iter()
                    .map(|m| m.trim())
                    .collect::<Vec<_>>()
                    .join(",")
            ),
        }
    }

    /// The scalar value, if this is a scalar
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            AxisValueKind::Scalar { value } => Some(value.trim()),
            _ => None,
        }
    }
}

/// One observed value of an axis, always with evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AxisValue {
    /// The value
    pub kind: AxisValueKind,
    /// Where the value was seen
    pub evidence: EvidenceRef,
    /// Document the value was observed on
    pub document_id: DocumentId,
}

impl AxisValue {
    /// Create an axis value
    ///
    /// # Errors
    /// - [`ValidationError::MissingAxisEvidence`] when `evidence` is absent or empty
    /// - [`ValidationError::EmptyField`], [`ValidationError::InvalidRange`],
    ///   [`ValidationError::EmptySet`] for malformed values
    pub fn new(
        axis_key: &str,
        kind: AxisValueKind,
        evidence: Option<EvidenceRef>,
        document_id: DocumentId,
    ) -> Result<Self, ValidationError> {
        let evidence = match evidence {
            Some(ev) if ev.is_present() => ev,
            _ => {
                return Err(ValidationError::MissingAxisEvidence {
                    axis_key: axis_key.to_string(),
                })
            }
        };
        match &kind {
            AxisValueKind::Scalar { value } if value.trim().is_empty() => {
                return Err(ValidationError::EmptyField("axis value"));
            }
            AxisValueKind::Range { low, high }
                if low.trim().is_empty() || high.trim().is_empty() =>
            {
                return Err(ValidationError::InvalidRange {
                    low: low.clone(),
                    high: high.clone(),
                });
            }
            AxisValueKind::Set { members } if members.iter().all(|m| m.trim().is_empty()) => {
                return Err(ValidationError::EmptySet);
            }
            _ => {}
        }
        Ok(Self {
            kind,
            evidence,
            document_id,
        })
    }

    /// Convenience constructor for a scalar value
    pub fn scalar(
        axis_key: &str,
        value: impl Into<String>,
        evidence: EvidenceRef,
        document_id: DocumentId,
    ) -> Result<Self, ValidationError> {
        Self::new(
            axis_key,
            AxisValueKind::Scalar {
                value: value.into(),
            },
            Some(evidence),
            document_id,
        )
    }
}

/// Result of comparing two axis values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisOrder {
    /// Both values are placed in a trusted order
    Known(Ordering),
    /// No trustworthy answer; not the same as `Equal`
    Unknown,
}

impl AxisOrder {
    /// The ordering as -1 / 0 / 1, if known
    pub fn as_sign(&self) -> Option<i8> {
        match self {
            AxisOrder::Known(Ordering::Less) => Some(-1),
            AxisOrder::Known(Ordering::Equal) => Some(0),
            AxisOrder::Known(Ordering::Greater) => Some(1),
            AxisOrder::Unknown => None,
        }
    }
}

/// Result of asking an axis for its latest value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LatestValue {
    /// The latest value
    Known(String),
    /// Latest value cannot be determined
    Unknown,
}

/// Persisted parts of an axis, validated on [`ApplicabilityAxis::restore`]
#[derive(Debug, Clone)]
pub struct AxisParts {
    /// Owning tenant
    pub tenant: String,
    /// Axis key
    pub axis_key: String,
    /// Label seen in the corpus
    pub label: Option<String>,
    /// Order shape
    pub order_type: OrderType,
    /// Ordering confidence
    pub ordering_confidence: OrderingConfidence,
    /// Value order, lowest first
    pub value_order: Option<Vec<String>>,
    /// Observed values
    pub values: Vec<AxisValue>,
}

/// A named contextual dimension and the values observed for it
#[derive(Debug, Clone, PartialEq)]
pub struct ApplicabilityAxis {
    tenant: String,
    axis_key: String,
    label: Option<String>,
    order_type: OrderType,
    ordering_confidence: OrderingConfidence,
    value_order: Option<Vec<String>>,
    values: Vec<AxisValue>,
    observed_documents: usize,
}

impl ApplicabilityAxis {
    /// Create an axis with no values and no order
    pub fn new(tenant: impl Into<String>, axis_key: impl Into<String>) -> Result<Self, ValidationError> {
        let tenant = tenant.into();
        let axis_key = axis_key.into();
        if tenant.trim().is_empty() {
            return Err(ValidationError::EmptyField("tenant"));
        }
        if axis_key.trim().is_empty() {
            return Err(ValidationError::EmptyField("axis key"));
        }
        Ok(Self {
            tenant,
            axis_key,
            label: None,
            order_type: OrderType::None,
            ordering_confidence: OrderingConfidence::Unknown,
            value_order: None,
            values: Vec::new(),
            observed_documents: 0,
        })
    }

    /// Rebuild an axis from storage, enforcing the ordering invariant
    ///
    /// # Errors
    /// Returns [`ValidationError::OrderWithoutConfidence`] when the stored
    /// confidence is UNKNOWN but an order is present.
    pub fn restore(parts: AxisParts) -> Result<Self, ValidationError> {
        let mut axis = Self::new(parts.tenant, parts.axis_key)?;
        axis.label = parts.label;
        match (parts.ordering_confidence, parts.value_order) {
            (OrderingConfidence::Unknown, Some(_)) => {
                return Err(ValidationError::OrderWithoutConfidence(axis.axis_key));
            }
            (OrderingConfidence::Unknown, None) => {}
            (confidence, Some(order)) => {
                axis.check_order(&order, parts.order_type)?;
                axis.ordering_confidence = confidence;
                axis.order_type = parts.order_type;
                axis.value_order = Some(order);
            }
            (_, None) => {
                return Err(ValidationError::InvalidValueOrder {
                    axis_key: axis.axis_key,
                    issue: "ordered axis without a value order".to_string(),
                });
            }
        }
        for value in parts.values {
            axis.add_value(value);
        }
        Ok(axis)
    }

    /// Set the human label seen in the corpus
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Owning tenant
    pub fn tenant(&self) -> &str {
        &self.tenant
    }

    /// Axis key
    pub fn axis_key(&self) -> &str {
        &self.axis_key
    }

    /// Human label, if one was seen
    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }

    /// Order shape
    pub fn order_type(&self) -> OrderType {
        self.order_type
    }

    /// Ordering confidence
    pub fn ordering_confidence(&self) -> OrderingConfidence {
        self.ordering_confidence
    }

    /// Value order, lowest first; always `None` when confidence is UNKNOWN
    pub fn value_order(&self) -> Option<&[String]> {
        self.value_order.as_deref()
    }

    /// Observed values, in arrival order
    pub fn values(&self) -> &[AxisValue] {
        &self.values
    }

    /// Number of distinct documents the axis was observed on
    pub fn observed_document_count(&self) -> usize {
        self.observed_documents
    }

    /// Whether values can currently be ordered
    pub fn is_orderable(&self) -> bool {
        self.ordering_confidence != OrderingConfidence::Unknown
            && self.order_type != OrderType::None
            && self.value_order.is_some()
    }

    /// Append an observed value and recompute the observed-document count
    pub fn add_value(&mut self, value: AxisValue) {
        self.values.push(value);
        self.observed_documents = self
            .values
            .iter()
            .map(|v| &v.document_id)
            .collect::<BTreeSet<_>>()
            .len();
    }

    /// Distinct value tokens observed so far
    pub fn distinct_values(&self) -> BTreeSet<String> {
        self.values.iter().map(|v| v.kind.token()).collect()
    }

    /// Declare an explicit order (lowest first); confidence becomes CERTAIN
    ///
    /// # Errors
    /// Returns [`ValidationError::InvalidValueOrder`] for an empty order,
    /// duplicate entries, or an order type of `None`.
    pub fn declare_order(
        &mut self,
        order: Vec<String>,
        order_type: OrderType,
    ) -> Result<(), ValidationError> {
        self.check_order(&order, order_type)?;
        self.value_order = Some(order);
        self.order_type = order_type;
        self.ordering_confidence = OrderingConfidence::Certain;
        Ok(())
    }

    /// Infer an order from version-shaped values ("1.2", "v2.0.1", "2024")
    ///
    /// Only applies when every observed value is a scalar that parses as a
    /// dotted number and there are at least two distinct values. Never
    /// downgrades a CERTAIN order. Returns whether an order was inferred.
    pub fn infer_ordering(&mut self) -> bool {
        if self.ordering_confidence == OrderingConfidence::Certain {
            return false;
        }
        let mut parsed = Vec::new();
        let mut seen = BTreeSet::new();
        for value in &self.values {
            let Some(scalar) = value.kind.as_scalar() else {
                return false;
            };
            let Some(version) = parse_version(scalar) else {
                return false;
            };
            if seen.insert(version.clone()) {
                parsed.push((version, scalar.to_string()));
            }
        }
        if parsed.len() < 2 {
            return false;
        }
        parsed.sort_by(|a, b| a.0.cmp(&b.0));
        self.value_order = Some(parsed.into_iter().map(|(_, s)| s).collect());
        self.order_type = OrderType::Total;
        self.ordering_confidence = OrderingConfidence::Inferred;
        true
    }

    /// Drop any order; confidence becomes UNKNOWN
    pub fn clear_ordering(&mut self) {
        self.value_order = None;
        self.order_type = OrderType::None;
        self.ordering_confidence = OrderingConfidence::Unknown;
    }

    /// Compare two values along the axis
    ///
    /// Answers [`AxisOrder::Known`] only when the axis is orderable and both
    /// values appear in its order; otherwise [`AxisOrder::Unknown`].
    pub fn compare(&self, a: &str, b: &str) -> AxisOrder {
        match (self.position(a), self.position(b)) {
            (Some(pa), Some(pb)) => AxisOrder::Known(pa.cmp(&pb)),
            _ => AxisOrder::Unknown,
        }
    }

    /// Latest among the given values, or Unknown if any cannot be placed
    pub fn latest_of(&self, candidates: &[&str]) -> LatestValue {
        if candidates.is_empty() {
            return LatestValue::Unknown;
        }
        let mut best: Option<(usize, &str)> = None;
        for &candidate in candidates {
            let Some(pos) = self.position(candidate) else {
                return LatestValue::Unknown;
            };
            if best.map_or(true, |(p, _)| pos > p) {
                best = Some((pos, candidate));
            }
        }
        match best {
            Some((_, value)) => LatestValue::Known(value.trim().to_string()),
            None => LatestValue::Unknown,
        }
    }

    /// Latest of the observed values
    ///
    /// Unknown when the axis is not orderable, has no values, or holds a
    /// value (range, set, unlisted scalar) that cannot be placed.
    pub fn get_latest_value(&self) -> LatestValue {
        let mut scalars = Vec::new();
        for value in &self.values {
            match value.kind.as_scalar() {
                Some(s) => scalars.push(s),
                None => return LatestValue::Unknown,
            }
        }
        self.latest_of(&scalars)
    }

    /// Whether the axis may be promoted to a validated identity key
    ///
    /// Requires observations on at least two documents with at least two
    /// distinct values.
    pub fn is_validated_claimkey(&self) -> bool {
        self.observed_documents >= MIN_DOCUMENTS_FOR_CLAIMKEY
            && self.distinct_values().len() >= MIN_VALUES_FOR_CLAIMKEY
    }

    fn position(&self, value: &str) -> Option<usize> {
        if !self.is_orderable() {
            return None;
        }
        let needle = value.trim().to_lowercase();
        self.value_order
            .as_ref()?
            .iter()
            .position(|v| v.trim().to_lowercase() == needle)
    }

    fn check_order(&self, order: &[String], order_type: OrderType) -> Result<(), ValidationError> {
        let invalid = |issue: &str| ValidationError::InvalidValueOrder {
            axis_key: self.axis_key.clone(),
            issue: issue.to_string(),
        };
        if order_type == OrderType::None {
            return Err(invalid("order type 'none' cannot carry an order"));
        }
        if order.is_empty() {
            return Err(invalid("order is empty"));
        }
        let mut seen = BTreeSet::new();
        for v in order {
            let norm = v.trim().to_lowercase();
            if norm.is_empty() {
                return Err(invalid("order contains an empty value"));
            }
            if !seen.insert(norm) {
                return Err(invalid(&format!("duplicate value '{}'", v)));
            }
        }
        Ok(())
    }
}

/// Parse "1.2", "v2.0.1" or "2024" into numeric components
fn parse_version(s: &str) -> Option<Vec<u64>> {
    let s = s.trim();
    let s = s
        .strip_prefix('v')
        .or_else(|| s.strip_prefix('V'))
        .unwrap_or(s);
    if s.is_empty() {
        return None;
    }
    s.split('.').map(|part| part.parse::<u64>().ok()).collect()
}
