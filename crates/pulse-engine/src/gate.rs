//! Dedupe/upsert gate driver
//!
//! Runs the detector set over entity snapshots and feeds each candidate
//! through the store's atomic conditional upsert. Rejections and identity
//! conflicts are local: the candidate is refused and the pass continues.

use crate::{EngineConfig, EngineError};
use pulse_detect::{validate_candidate, Detector, EntitySnapshot};
use pulse_domain::traits::{IssueStore, UpsertOutcome};
use pulse_domain::{Entity, GovernanceMode, IssueKey};
use std::collections::HashSet;

/// Outcome tallies of a gate pass
#[derive(Debug, Clone, Default)]
pub struct GateReport {
    /// New records created in `proposed`
    pub created: usize,

    /// Candidates merged into an existing active record
    pub merged: usize,

    /// Candidates refused by evidence validation
    pub rejected: usize,

    /// Candidates refused by identity conflict
    pub conflicts: usize,

    /// Candidates evaluated under observe mode (nothing written)
    pub observed: usize,

    /// Underlying issue keys seen this pass; the auto-resolution sweep
    /// treats absence from this set as "condition no longer reproduces"
    pub keys: HashSet<IssueKey>,
}

impl GateReport {
    /// Fold another report into this one
    pub fn merge(&mut self, other: GateReport) {
        self.created += other.created;
        self.merged += other.merged;
        self.rejected += other.rejected;
        self.conflicts += other.conflicts;
        self.observed += other.observed;
        self.keys.extend(other.keys);
    }
}

/// Build a snapshot for one entity from the store
pub fn snapshot_for<S>(store: &S, entity: Entity, now: &str) -> Result<EntitySnapshot, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let work_items = store
        .work_items_for(&entity.id)
        .map_err(EngineError::store)?;
    let invoices = store.invoices_for(&entity.id).map_err(EngineError::store)?;
    let threads = store.threads_for(&entity.id).map_err(EngineError::store)?;

    Ok(EntitySnapshot {
        entity,
        work_items,
        invoices,
        threads,
        now: now.to_string(),
    })
}

/// Run the detector set over one snapshot and gate each candidate
pub fn run_pass<S>(
    store: &mut S,
    detectors: &[Box<dyn Detector + Send + Sync>],
    snapshot: &EntitySnapshot,
    config: &EngineConfig,
) -> Result<GateReport, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let mut report = GateReport::default();

    for detector in detectors {
        for candidate in detector.evaluate(snapshot) {
            if let Err(e) = validate_candidate(detector.as_ref(), &candidate) {
                tracing::warn!(
                    detector = detector.kind(),
                    key = %candidate.key,
                    "candidate rejected: {}",
                    e
                );
                report.rejected += 1;
                continue;
            }

            if config.mode == GovernanceMode::Observe {
                tracing::info!(
                    detector = detector.kind(),
                    key = %candidate.key,
                    "observe mode: would upsert candidate"
                );
                report.observed += 1;
                report.keys.insert(candidate.key.clone());
                continue;
            }

            match store
                .upsert_candidate(&candidate, &snapshot.now)
                .map_err(EngineError::store)?
            {
                UpsertOutcome::Created(id) => {
                    tracing::info!(key = %candidate.key, record = %id, "inbox record created");
                    report.created += 1;
                    report.keys.insert(candidate.key);
                }
                UpsertOutcome::Merged(id) => {
                    tracing::debug!(key = %candidate.key, record = %id, "evidence merged");
                    report.merged += 1;
                    report.keys.insert(candidate.key);
                }
                UpsertOutcome::IdentityConflict { existing } => {
                    tracing::warn!(
                        key = %candidate.key,
                        existing = %existing,
                        identity = %candidate.subject_identity,
                        "identity conflict: key held by a different canonical record"
                    );
                    report.conflicts += 1;
                    // The condition did fire for this key; auto-resolution
                    // must not treat the holder as cleared.
                    report.keys.insert(candidate.key);
                }
            }
        }
    }

    Ok(report)
}

/// Run the detector set over every active entity
pub fn run_pass_all<S>(
    store: &mut S,
    detectors: &[Box<dyn Detector + Send + Sync>],
    config: &EngineConfig,
    now: &str,
) -> Result<GateReport, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let mut report = GateReport::default();

    let entities = store.list_entities().map_err(EngineError::store)?;
    for entity in entities.into_iter().filter(|e| e.active) {
        let snapshot = snapshot_for(store, entity, now)?;
        report.merge(run_pass(store, detectors, &snapshot, config)?);
    }

    Ok(report)
}
