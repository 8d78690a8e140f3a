//! Canonical identity resolution for upstream records
//!
//! A raw external record maps to a `(source_system, source_id)` tuple that
//! is stable across renames and renumbering. For invoices the tuple uses
//! the upstream system's immutable internal identifier, never the
//! human-visible invoice number, which can collide across tenants.
//! All downstream dedupe, suppression, and "is this the same record"
//! checks use this tuple exclusively; display-only fields never
//! participate in equality.

use crate::entity::{Invoice, Thread, WorkItem};
use crate::source::SourceSystem;
use serde::{Deserialize, Serialize};

/// Canonical identity of an upstream record
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceIdentity {
    /// Originating source system
    pub source: SourceSystem,

    /// Upstream system's immutable internal identifier
    pub source_id: String,
}

impl SourceIdentity {
    /// Create an identity tuple
    pub fn new(source: SourceSystem, source_id: impl Into<String>) -> Self {
        Self {
            source,
            source_id: source_id.into(),
        }
    }
}

impl std::fmt::Display for SourceIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.source.as_str(), self.source_id)
    }
}

/// Resolve an invoice to its canonical identity
///
/// Uses the upstream internal `record_id`; the display `number` is
/// mutable and must never participate in equality checks.
pub fn resolve_invoice_identity(invoice: &Invoice) -> SourceIdentity {
    SourceIdentity::new(SourceSystem::Invoicing, invoice.record_id.clone())
}

/// Resolve a work item to its canonical identity
pub fn resolve_work_item_identity(item: &WorkItem) -> SourceIdentity {
    SourceIdentity::new(SourceSystem::TaskSystem, item.id.clone())
}

/// Resolve a mail thread to its canonical identity
pub fn resolve_thread_identity(thread: &Thread) -> SourceIdentity {
    SourceIdentity::new(SourceSystem::Mail, thread.id.clone())
}
