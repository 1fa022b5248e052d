//! Background worker for continuous canonicalization

use crate::{Canonicalizer, JanitorConfig, JanitorError, JanitorMetrics, PassOutcome};
use canonry_domain::traits::GovernanceStore;
use std::fmt::Display;
use std::sync::Arc;
use tokio::time::{interval, Duration, MissedTickBehavior};

/// Background worker that runs canonicalization passes on a schedule
///
/// Every tick runs one pass per configured tenant. The store is shared, so
/// the gate and deduplication can keep writing to it meanwhile.
///
/// # Examples
///
/// ```no_run
/// use canonry_janitor::{JanitorWorker, JanitorConfig};
/// use canonry_store::SqliteStore;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteStore::new("canonry.db")?;
///     let config = JanitorConfig::default().with_tenants(["acme"]);
///     let mut worker = JanitorWorker::new(config);
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run(Arc::new(store)).await?;
///     Ok(())
/// }
/// ```
pub struct JanitorWorker {
    canonicalizer: Canonicalizer,
    interval: Duration,
    tenants: Vec<String>,
}

impl JanitorWorker {
    /// Create a new background worker with the given configuration
    pub fn new(config: JanitorConfig) -> Self {
        let interval = config.sweep_interval();
        let tenants = config.tenants.clone();
        Self {
            canonicalizer: Canonicalizer::new(config),
            interval,
            tenants,
        }
    }

    /// Create a worker with default configuration
    pub fn default_config() -> Self {
        Self::new(JanitorConfig::default())
    }

    /// One pass per tenant; the first store error aborts the cycle
    fn cycle<S>(&mut self, store: &S) -> Result<(usize, usize), JanitorError>
    where
        S: GovernanceStore,
        S::Error: Display,
    {
        let (mut completed, mut skipped) = (0, 0);
        for tenant in &self.tenants {
            match self.canonicalizer.run_pass(store, tenant)? {
                PassOutcome::Completed(_) => completed += 1,
                PassOutcome::SkippedLocked => skipped += 1,
            }
        }
        Ok((completed, skipped))
    }

    /// Run the worker indefinitely
    ///
    /// Runs a cycle at the configured interval until a shutdown signal
    /// (Ctrl+C) is received. A failed cycle is logged and retried on the next
    /// tick.
    ///
    /// # Errors
    ///
    /// Returns an error if the shutdown signal cannot be installed.
    pub async fn run<S>(&mut self, store: Arc<S>) -> Result<(), JanitorError>
    where
        S: GovernanceStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        tracing::info!(
            tenants = self.tenants.len(),
            "Janitor worker started (interval: {:?})",
            self.interval
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting canonicalization cycle");

                    match self.cycle(store.as_ref()) {
                        Ok((completed, skipped)) => {
                            tracing::info!(completed, skipped, "Canonicalization cycle finished");
                        }
                        Err(e) => {
                            tracing::error!("Canonicalization cycle failed: {}", e);
                        }
                    }
                }
                signal = tokio::signal::ctrl_c() => {
                    signal.map_err(|e| JanitorError::Worker(e.to_string()))?;
                    tracing::info!("Shutdown signal received, stopping janitor");
                    break;
                }
            }
        }

        tracing::info!("Janitor stopped. Final metrics:\n{}", self.metrics().summary());
        Ok(())
    }

    /// Run for a specific number of cycles (useful for testing)
    ///
    /// Unlike [`JanitorWorker::run`], a failed cycle stops the worker and is
    /// returned.
    pub async fn run_cycles<S>(&mut self, store: Arc<S>, cycles: usize) -> Result<(), JanitorError>
    where
        S: GovernanceStore,
        S::Error: Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Janitor worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting canonicalization cycle {}/{}", cycle + 1, cycles);

            if let Err(e) = self.cycle(store.as_ref()) {
                tracing::error!("Cycle {}/{} failed: {}", cycle + 1, cycles, e);
                return Err(e);
            }
        }

        tracing::info!(
            "Janitor finished {} cycles. Final metrics:\n{}",
            cycles,
            self.metrics().summary()
        );
        Ok(())
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &JanitorMetrics {
        self.canonicalizer.metrics()
    }

    /// Reset the metrics counters
    pub fn reset_metrics(&mut self) {
        self.canonicalizer.reset_metrics();
    }
}
