//! Latest truth over stored claims
//!
//! Builds selector candidates from the governed claims answering one
//! [`ClaimKey`], with source authority from their documents and placement
//! from the scope qualifier named by the policy's primary axis, then selects
//! against the stored axis.

use crate::{select, ResolverError, SelectionCandidate, SelectionOutcome, SelectionPolicy};
use canonry_domain::traits::{ClaimFilter, GovernanceStore};
use canonry_domain::{ApplicabilityAxis, AuthorityLevel, Claim, ClaimKey, DocumentId};
use std::collections::HashMap;
use std::fmt::Display;
use tracing::debug;

/// Select the current answer to `claim_key` from the store
///
/// Claims of every status are read so the policy's status filter decides.
/// Without a primary axis no axis is consulted.
///
/// # Errors
///
/// Returns [`ResolverError::Store`] when the store cannot be read. An
/// undecidable question is not an error; it comes back as `AskUser`.
pub fn select_current<S>(
    store: &S,
    tenant: &str,
    claim_key: &ClaimKey,
    policy: &SelectionPolicy,
) -> Result<SelectionOutcome, ResolverError>
where
    S: GovernanceStore,
    S::Error: Display,
{
    let claims: Vec<Claim> = store
        .fetch_claims(tenant, &ClaimFilter::default())
        .map_err(|e| ResolverError::Store(e.to_string()))?
        .into_iter()
        .filter(|c| c.claim_key.as_ref() == Some(claim_key))
        .collect();

    let mut authorities: HashMap<DocumentId, AuthorityLevel> = HashMap::new();
    let mut candidates = Vec::with_capacity(claims.len());
    for claim in claims {
        let authority = match authorities.get(&claim.document_id) {
            Some(level) => *level,
            None => {
                let level = store
                    .get_document(&claim.document_id)
                    .map_err(|e| ResolverError::Store(e.to_string()))?
                    .map_or(AuthorityLevel::Unknown, |d| d.authority);
                authorities.insert(claim.document_id.clone(), level);
                level
            }
        };
        candidates.push(candidate_of(claim, authority, policy.primary_axis.as_deref()));
    }

    let axis: Option<ApplicabilityAxis> = match policy.primary_axis.as_deref() {
        Some(axis_key) => store
            .fetch_axis(tenant, axis_key)
            .map_err(|e| ResolverError::Store(e.to_string()))?,
        None => None,
    };

    debug!(
        %claim_key,
        candidates = candidates.len(),
        axis = axis.as_ref().map(|a| a.ordering_confidence().as_str()),
        "Selecting current value"
    );
    Ok(select(policy, &candidates, axis.as_ref()))
}

fn candidate_of(claim: Claim, authority: AuthorityLevel, axis_key: Option<&str>) -> SelectionCandidate {
    let placement = axis_key.and_then(|key| claim.scope.qualifier(key).map(|value| (key, value)));
    let value = claim.value.clone().unwrap_or_else(|| claim.text.clone());

    let mut candidate = SelectionCandidate::new(claim.id, value, authority)
        .with_confidence(claim.confidence.value());
    candidate.status = claim.status;
    candidate.claim_type = claim.claim_type;
    match placement {
        Some((key, value)) => candidate.on_axis(key, value),
        None => candidate,
    }
}
