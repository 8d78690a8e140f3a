//! Background worker for continuous sweep operation

use crate::{EngineConfig, EngineError, SweepMetrics, Sweeper};
use pulse_detect::DetectorSet;
use pulse_domain::clock::{Clock, SystemClock};
use pulse_domain::traits::IssueStore;
use tokio::time::{interval, Duration};

/// Background worker that runs the maintenance sweep on a schedule
///
/// # Examples
///
/// ```no_run
/// use pulse_engine::{EngineConfig, SweepWorker};
/// use pulse_detect::default_detectors;
/// use pulse_store::SqliteStore;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let store = SqliteStore::new("pulse.db")?;
///     let config = EngineConfig::default();
///     let detectors = default_detectors(config.unanswered_threshold_days);
///     let mut worker = SweepWorker::new(config);
///
///     // Run indefinitely (until Ctrl+C)
///     worker.run(store, detectors).await?;
///     Ok(())
/// }
/// ```
pub struct SweepWorker {
    sweeper: Sweeper,
    interval: Duration,
}

impl SweepWorker {
    /// Create a new background worker with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        let interval = config.sweep_interval();
        Self {
            sweeper: Sweeper::new(config),
            interval,
        }
    }

    /// Override the sweep interval (sub-minute intervals for tests)
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Run the worker indefinitely
    ///
    /// Runs the sweep cycle at the configured interval until a shutdown
    /// signal (Ctrl+C) is received.
    pub async fn run<S>(&mut self, mut store: S, detectors: DetectorSet) -> Result<(), EngineError>
    where
        S: IssueStore,
        S::Error: std::fmt::Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!("Sweep worker started (interval: {:?})", self.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    tracing::debug!("Starting sweep cycle");

                    match self.sweeper.sweep(&mut store, &detectors, &SystemClock) {
                        Ok(metrics) => {
                            tracing::info!(
                                "Sweep completed: {} created, {} merged, {} woken, {} rescored",
                                metrics.candidates_created,
                                metrics.candidates_merged,
                                metrics.snoozes_woken,
                                metrics.entities_rescored,
                            );
                        }
                        Err(e) => {
                            tracing::error!("Sweep failed: {}", e);
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Shutdown signal received, stopping sweep worker");
                    break;
                }
            }
        }

        tracing::info!("Sweep worker stopped. Final metrics:\n{}", self.sweeper.metrics().summary());

        Ok(())
    }

    /// Run for a specific number of cycles (useful for testing)
    pub async fn run_cycles<S>(
        &mut self,
        mut store: S,
        detectors: DetectorSet,
        cycles: usize,
        clock: &dyn Clock,
    ) -> Result<(), EngineError>
    where
        S: IssueStore,
        S::Error: std::fmt::Display,
    {
        let mut ticker = interval(self.interval);

        tracing::info!(
            "Sweep worker started for {} cycles (interval: {:?})",
            cycles,
            self.interval
        );

        for cycle in 0..cycles {
            ticker.tick().await;

            tracing::debug!("Starting sweep cycle {}/{}", cycle + 1, cycles);

            match self.sweeper.sweep(&mut store, &detectors, clock) {
                Ok(metrics) => {
                    tracing::info!(
                        "Sweep {}/{} completed: {} created, {} rescored",
                        cycle + 1,
                        cycles,
                        metrics.candidates_created,
                        metrics.entities_rescored,
                    );
                }
                Err(e) => {
                    tracing::error!("Sweep {}/{} failed: {}", cycle + 1, cycles, e);
                    return Err(e);
                }
            }
        }

        Ok(())
    }

    /// Get a reference to the sweeper's current metrics
    pub fn metrics(&self) -> &SweepMetrics {
        self.sweeper.metrics()
    }

    /// Reset the sweeper's metrics counters
    pub fn reset_metrics(&mut self) {
        self.sweeper.reset_metrics();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_detect::default_detectors;
    use pulse_domain::clock::FixedClock;
    use pulse_domain::{Entity, Invoice};
    use pulse_store::SqliteStore;

    const NOW: &str = "2026-02-08T11:00:00.000Z";

    fn seeded_store() -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.put_entity(Entity::new("client-1", "Acme")).unwrap();
        store
            .put_invoice(Invoice {
                record_id: "rec_9f3".to_string(),
                number: "INV-0042".to_string(),
                entity_id: "client-1".to_string(),
                due_at: Some("2026-02-01T00:00:00.000Z".to_string()),
                paid: false,
            })
            .unwrap();
        store
    }

    #[tokio::test]
    async fn test_worker_creation() {
        let worker = SweepWorker::new(EngineConfig::default());
        assert_eq!(worker.metrics().sweep_count, 0);
    }

    #[tokio::test]
    async fn test_run_cycles() {
        let store = seeded_store();
        let config = EngineConfig::default();
        let detectors = default_detectors(config.unanswered_threshold_days);
        let mut worker = SweepWorker::new(config).with_interval(Duration::from_millis(10));
        let clock = FixedClock::at(NOW).unwrap();

        worker.run_cycles(store, detectors, 2, &clock).await.unwrap();

        assert_eq!(worker.metrics().sweep_count, 2);
        // First cycle creates, second merges
        assert_eq!(worker.metrics().candidates_created, 1);
        assert_eq!(worker.metrics().candidates_merged, 1);
    }

    #[tokio::test]
    async fn test_reset_metrics() {
        let store = seeded_store();
        let config = EngineConfig::default();
        let detectors = default_detectors(config.unanswered_threshold_days);
        let mut worker = SweepWorker::new(config).with_interval(Duration::from_millis(10));
        let clock = FixedClock::at(NOW).unwrap();

        worker.run_cycles(store, detectors, 1, &clock).await.unwrap();
        assert_eq!(worker.metrics().sweep_count, 1);

        worker.reset_metrics();
        assert_eq!(worker.metrics().sweep_count, 0);
    }
}
