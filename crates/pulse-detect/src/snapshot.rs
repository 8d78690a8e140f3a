//! Normalized entity snapshot consumed by detectors

use pulse_domain::{Entity, Invoice, Thread, WorkItem};

/// Point-in-time normalized state for one entity
///
/// `now` is the canonical timestamp of the pass; detectors take it from
/// the snapshot rather than reading a clock, which keeps them pure.
#[derive(Debug, Clone)]
pub struct EntitySnapshot {
    /// The governed entity
    pub entity: Entity,

    /// Work items linked to the entity
    pub work_items: Vec<WorkItem>,

    /// Invoices billed to the entity
    pub invoices: Vec<Invoice>,

    /// Communication threads with the entity
    pub threads: Vec<Thread>,

    /// Canonical timestamp of this pass
    pub now: String,
}

impl EntitySnapshot {
    /// Snapshot with no linked records, for tests and sparse entities
    pub fn bare(entity: Entity, now: impl Into<String>) -> Self {
        Self {
            entity,
            work_items: Vec::new(),
            invoices: Vec::new(),
            threads: Vec::new(),
            now: now.into(),
        }
    }
}
