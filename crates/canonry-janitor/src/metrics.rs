//! Metrics collection for canonicalization passes

use crate::canonicalizer::PassReport;

/// Metrics collected across canonicalization passes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JanitorMetrics {
    /// Canonical claims created or merged
    pub canonicals_upserted: usize,

    /// SUPPORTS edges recorded
    pub support_edges: usize,

    /// CONFLICTS_WITH edges recorded
    pub conflicts: usize,

    /// SUPERSEDES edges recorded
    pub supersessions: usize,

    /// Claims retired because their canonical claim was superseded
    pub claims_retired: usize,

    /// Scope qualifiers recorded as axis values
    pub axis_values: usize,

    /// Axis orderings re-inferred or cleared
    pub axis_orderings: usize,

    /// Completed passes
    pub passes: usize,

    /// Passes skipped because another holder owned the lease
    pub skipped_locked: usize,

    /// Total runtime in milliseconds
    pub total_runtime_ms: u64,
}

impl JanitorMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed pass
    pub fn record_pass(&mut self, report: &PassReport) {
        self.canonicals_upserted += report.canonicals_upserted;
        self.support_edges += report.support_edges;
        self.conflicts += report.conflicts;
        self.supersessions += report.supersessions;
        self.claims_retired += report.claims_retired;
        self.axis_values += report.axis_values;
        self.axis_orderings += report.axis_orderings;
        self.passes += 1;
    }

    /// Record a pass skipped on a held lease
    pub fn record_skipped(&mut self) {
        self.skipped_locked += 1;
    }

    /// Edges of every kind recorded
    pub fn total_edges(&self) -> usize {
        self.support_edges + self.conflicts + self.supersessions
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Janitor Metrics Summary".to_string(),
            "=======================".to_string(),
            format!("Passes: {} ({} skipped, lease held)", self.passes, self.skipped_locked),
            format!("Total runtime: {}ms", self.total_runtime_ms),
            String::new(),
            format!("Canonical claims upserted: {}", self.canonicals_upserted),
            format!("Support edges: {}", self.support_edges),
            format!("Conflicts: {}", self.conflicts),
            format!("Supersessions: {}", self.supersessions),
            format!("Claims retired: {}", self.claims_retired),
            format!("Axis values: {} ({} orderings updated)", self.axis_values, self.axis_orderings),
        ]
        .join("\n")
    }
}
