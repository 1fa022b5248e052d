//! Bounded worker pool over documents
//!
//! Each document is handed to exactly one blocking task, so a document's
//! claim set is only ever touched by one worker at a time. A semaphore caps
//! how many tasks run at once.

use crate::dedup::{DedupStats, DocumentDeduplicator};
use crate::{DedupConfig, GatekeeperError};
use canonry_domain::traits::GovernanceStore;
use canonry_domain::DocumentId;
use std::collections::HashSet;
use std::fmt::Display;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tracing::{info, warn};

/// Result for one document
pub type DocumentResult<T> = (DocumentId, Result<T, GatekeeperError>);

/// Runs per-document work with bounded concurrency
#[derive(Debug, Clone)]
pub struct DocumentPool {
    concurrency: usize,
}

impl DocumentPool {
    /// Create a pool; a concurrency of zero is treated as one
    pub fn new(config: &DedupConfig) -> Self {
        Self {
            concurrency: config.concurrency.max(1),
        }
    }

    /// Configured concurrency
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Run `work` once per distinct document
    ///
    /// Results come back in input order. Duplicate document ids are processed
    /// once. A worker that panics yields [`GatekeeperError::Worker`] for its
    /// document without affecting the others.
    pub async fn run<T, F>(&self, documents: Vec<DocumentId>, work: F) -> Vec<DocumentResult<T>>
    where
        T: Send + 'static,
        F: Fn(&DocumentId) -> Result<T, GatekeeperError> + Send + Sync + 'static,
    {
        let mut seen = HashSet::new();
        let documents: Vec<DocumentId> = documents
            .into_iter()
            .filter(|d| seen.insert(d.clone()))
            .collect();

        let work = Arc::new(work);
        let semaphore = Arc::new(Semaphore::new(self.concurrency));
        let mut tasks = JoinSet::new();

        for (index, document) in documents.iter().cloned().enumerate() {
            let permit = match Arc::clone(&semaphore).acquire_owned().await {
                Ok(permit) => permit,
                Err(e) => {
                    warn!(error = %e, "Worker pool semaphore closed");
                    break;
                }
            };
            let work = Arc::clone(&work);
            tasks.spawn_blocking(move || {
                let _permit = permit;
                (index, work(&document))
            });
        }

        let mut slots: Vec<Option<Result<T, GatekeeperError>>> =
            (0..documents.len()).map(|_| None).collect();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, result)) => slots[index] = Some(result),
                Err(e) => warn!(error = %e, "Document worker failed"),
            }
        }

        documents
            .into_iter()
            .zip(slots)
            .map(|(document, slot)| {
                let result = slot.unwrap_or_else(|| {
                    Err(GatekeeperError::Worker(format!("no result for document {}", document)))
                });
                (document, result)
            })
            .collect()
    }

    /// Deduplicate many documents of one tenant
    pub async fn dedup_documents<S>(
        &self,
        deduplicator: DocumentDeduplicator<S>,
        tenant: &str,
        documents: Vec<DocumentId>,
    ) -> Vec<DocumentResult<DedupStats>>
    where
        S: GovernanceStore + Send + Sync + 'static,
        S::Error: Display,
    {
        let tenant = tenant.to_string();
        let results = self
            .run(documents, move |document| deduplicator.dedup_document(&tenant, document))
            .await;

        let (ok, failed): (Vec<_>, Vec<_>) = results.iter().partition(|(_, r)| r.is_ok());
        let removed: usize = ok
            .iter()
            .filter_map(|(_, r)| r.as_ref().ok())
            .map(DedupStats::removed)
            .sum();
        info!(
            documents = results.len(),
            failed = failed.len(),
            removed,
            "Deduplication batch complete"
        );
        results
    }
}
