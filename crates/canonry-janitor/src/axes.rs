//! Applicability axes observed on claim scopes
//!
//! Every scope qualifier of an active claim (version, region, edition, free
//! conditions) is an observation on the axis of the same name, with the
//! claim's first evidence unit as proof. Orderings that were not declared are
//! re-inferred from the values seen so far; a declared (CERTAIN) order is
//! never touched.

use crate::JanitorError;
use canonry_domain::traits::GovernanceStore;
use canonry_domain::{AxisValue, Claim, EvidenceRef, OrderingConfidence};
use std::collections::BTreeSet;
use std::fmt::Display;
use tracing::{debug, warn};

/// Axis work done by one pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) struct AxisReport {
    pub values: usize,
    pub orderings: usize,
}

pub(crate) fn record_axis_observations<S>(
    store: &S,
    tenant: &str,
    claims: &[Claim],
    dry_run: bool,
) -> Result<AxisReport, JanitorError>
where
    S: GovernanceStore,
    S::Error: Display,
{
    let mut report = AxisReport::default();
    let mut touched = BTreeSet::new();

    for claim in claims {
        let Some(unit) = claim.unit_ids.first() else {
            continue;
        };
        for (axis_key, value) in claim.scope.qualifiers() {
            let observation = match AxisValue::scalar(
                &axis_key,
                value,
                EvidenceRef::passage(unit.clone()),
                claim.document_id.clone(),
            ) {
                Ok(observation) => observation,
                Err(e) => {
                    warn!(claim = %claim.id, axis = %axis_key, error = %e, "Skipping axis observation");
                    continue;
                }
            };
            if !dry_run {
                store
                    .upsert_axis_value(tenant, &axis_key, &observation)
                    .map_err(|e| JanitorError::Store(e.to_string()))?;
            }
            report.values += 1;
            touched.insert(axis_key);
        }
    }

    if dry_run {
        return Ok(report);
    }

    for axis_key in &touched {
        let Some(mut axis) = store
            .fetch_axis(tenant, axis_key)
            .map_err(|e| JanitorError::Store(e.to_string()))?
        else {
            continue;
        };
        if axis.ordering_confidence() == OrderingConfidence::Certain {
            continue;
        }

        let before = (axis.ordering_confidence(), axis.value_order().map(<[String]>::to_vec));
        if !axis.infer_ordering() {
            axis.clear_ordering();
        }
        if before == (axis.ordering_confidence(), axis.value_order().map(<[String]>::to_vec)) {
            continue;
        }

        debug!(
            axis = %axis_key,
            confidence = axis.ordering_confidence().as_str(),
            "Axis ordering updated"
        );
        store
            .save_axis_ordering(&axis)
            .map_err(|e| JanitorError::Store(e.to_string()))?;
        report.orderings += 1;
    }

    Ok(report)
}
