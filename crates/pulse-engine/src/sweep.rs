//! Maintenance sweep over the inbox
//!
//! One sweep cycle: run the detector pass through the gate, wake expired
//! problem snoozes, clear elapsed reminder horizons, auto-resolve cleared
//! conditions under the `auto` governance mode, and rescore entities.

use crate::{gate, scoring, EngineConfig, EngineError, SweepMetrics};
use pulse_detect::Detector;
use pulse_domain::clock::Clock;
use pulse_domain::traits::{IssueStore, StateGuard};
use pulse_domain::{Evidence, GovernanceMode, IssueKey, IssueState, SourceSystem};
use serde_json::json;
use std::collections::HashSet;
use std::time::SystemTime;

/// Runs sweep cycles and collects metrics
///
/// # Examples
///
/// ```no_run
/// use pulse_engine::{EngineConfig, Sweeper};
/// use pulse_domain::clock::SystemClock;
/// use pulse_detect::default_detectors;
/// use pulse_store::SqliteStore;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let mut store = SqliteStore::new("pulse.db")?;
/// let config = EngineConfig::default();
/// let detectors = default_detectors(config.unanswered_threshold_days);
/// let mut sweeper = Sweeper::new(config);
///
/// let metrics = sweeper.sweep(&mut store, &detectors, &SystemClock)?;
/// println!("{}", metrics.summary());
/// # Ok(())
/// # }
/// ```
pub struct Sweeper {
    config: EngineConfig,
    metrics: SweepMetrics,
}

impl Sweeper {
    /// Create a new Sweeper with the given configuration
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            metrics: SweepMetrics::new(),
        }
    }

    /// Create a Sweeper with default configuration
    pub fn default_config() -> Self {
        Self::new(EngineConfig::default())
    }

    /// Get a reference to the current metrics
    pub fn metrics(&self) -> &SweepMetrics {
        &self.metrics
    }

    /// Reset metrics counters
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Perform a complete sweep cycle
    pub fn sweep<S>(
        &mut self,
        store: &mut S,
        detectors: &[Box<dyn Detector + Send + Sync>],
        clock: &dyn Clock,
    ) -> Result<SweepMetrics, EngineError>
    where
        S: IssueStore,
        S::Error: std::fmt::Display,
    {
        let start = SystemTime::now();
        let now = clock.now_canonical();

        let report = gate::run_pass_all(store, detectors, &self.config, &now)?;
        self.metrics.candidates_created += report.created;
        self.metrics.candidates_merged += report.merged;
        self.metrics.candidates_rejected += report.rejected;
        self.metrics.identity_conflicts += report.conflicts;

        self.wake_due_snoozes(store, &now)?;
        self.clear_elapsed_reminders(store, &now)?;

        if self.config.mode == GovernanceMode::Auto {
            let kinds: HashSet<&str> = detectors.iter().map(|d| d.kind()).collect();
            self.auto_resolve(store, &kinds, &report.keys, &now)?;
        }

        let scored = scoring::recompute_all(store, &self.config, clock)?;
        self.metrics.entities_rescored += scored;

        self.metrics.record_sweep();
        if let Ok(elapsed) = start.elapsed() {
            self.metrics.total_runtime_secs += elapsed.as_secs();
        }

        Ok(self.metrics.clone())
    }

    /// Wake problem snoozes whose horizon has elapsed
    ///
    /// Snooze expiry is a time-driven transition, not a user action, so it
    /// applies regardless of the suppression flag.
    fn wake_due_snoozes<S>(&mut self, store: &mut S, now: &str) -> Result<usize, EngineError>
    where
        S: IssueStore,
        S::Error: std::fmt::Display,
    {
        let due = store.due_snoozes(now).map_err(EngineError::store)?;
        let mut woken = 0usize;

        for record in due {
            if self.config.dry_run {
                tracing::info!(record = %record.id, "DRY RUN: would wake snoozed record");
                continue;
            }

            let guard = StateGuard::of(&record);
            let mut updated = record;
            updated.state = updated.snooze_return_state.unwrap_or(IssueState::Proposed);
            updated.snoozed_until = None;
            updated.snooze_return_state = None;
            updated.updated_at = now.to_string();

            store.update_record(&updated, guard).map_err(EngineError::store)?;
            tracing::info!(record = %updated.id, state = %updated.state, "snooze expired, record woken");
            woken += 1;
            self.metrics.snoozes_woken += 1;
        }

        Ok(woken)
    }

    /// Clear reminder horizons that have elapsed
    fn clear_elapsed_reminders<S>(&mut self, store: &mut S, now: &str) -> Result<usize, EngineError>
    where
        S: IssueStore,
        S::Error: std::fmt::Display,
    {
        let elapsed = store.elapsed_reminders(now).map_err(EngineError::store)?;
        let mut cleared = 0usize;

        for record in elapsed {
            if self.config.dry_run {
                tracing::info!(record = %record.id, "DRY RUN: would clear reminder");
                continue;
            }

            let guard = StateGuard::of(&record);
            let mut updated = record;
            updated.remind_after = None;
            updated.updated_at = now.to_string();

            store.update_record(&updated, guard).map_err(EngineError::store)?;
            cleared += 1;
            self.metrics.reminders_cleared += 1;
        }

        Ok(cleared)
    }

    /// Resolve records whose underlying condition no longer reproduces
    ///
    /// Only considers records produced by a detector kind that actually
    /// ran this pass; absence from `seen_keys` then means the condition
    /// cleared. The resolution is stamped with `internal` evidence and no
    /// `actioned_at` - it is not a user action.
    fn auto_resolve<S>(
        &mut self,
        store: &mut S,
        run_kinds: &HashSet<&str>,
        seen_keys: &HashSet<IssueKey>,
        now: &str,
    ) -> Result<usize, EngineError>
    where
        S: IssueStore,
        S::Error: std::fmt::Display,
    {
        let records = store.active_records().map_err(EngineError::store)?;
        let mut resolved = 0usize;

        for record in records {
            if record.suppressed {
                continue;
            }
            if !matches!(record.state, IssueState::Proposed | IssueState::Addressing) {
                continue;
            }
            let key = record.underlying_issue_id.as_str();
            if !run_kinds
                .iter()
                .any(|kind| key.starts_with(&format!("{}:", kind)))
            {
                continue;
            }
            if seen_keys.contains(&record.underlying_issue_id) {
                continue;
            }

            if self.config.dry_run {
                tracing::info!(record = %record.id, "DRY RUN: would auto-resolve");
                continue;
            }

            let guard = StateGuard::of(&record);
            let mut updated = record;
            updated.state = IssueState::RegressionWatch;
            updated.resolved_at = Some(now.to_string());
            updated.updated_at = now.to_string();

            store.update_record(&updated, guard).map_err(EngineError::store)?;
            store
                .append_evidence(
                    updated.id,
                    &Evidence::new(SourceSystem::Internal, "auto_resolve", now)
                        .with_detail(json!({"reason": "condition no longer reproduces"})),
                    now,
                )
                .map_err(EngineError::store)?;

            tracing::info!(record = %updated.id, "auto-resolved, watching for regression");
            resolved += 1;
            self.metrics.auto_resolved += 1;
        }

        Ok(resolved)
    }
}
