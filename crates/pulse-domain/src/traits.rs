//! Trait definitions for external interactions
//!
//! These traits define the boundaries between domain logic and
//! infrastructure. Infrastructure implementations live in other crates.

use crate::entity::{Entity, Invoice, Thread, WorkItem};
use crate::evidence::Evidence;
use crate::health::HealthAssessment;
use crate::identity::SourceIdentity;
use crate::issue::{InboxRecord, IssueState, RecordId};
use crate::key::IssueKey;
use crate::query::{InboxCounts, InboxQuery};

/// A candidate issue proposed by a detector
///
/// Candidates are what detectors emit and what the dedupe gate consumes:
/// one underlying issue key plus one evidence entry per detection.
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateIssue {
    /// Underlying issue key
    pub key: IssueKey,

    /// Affected entity
    pub entity_id: String,

    /// Canonical identity of the discriminating fact
    pub subject_identity: SourceIdentity,

    /// Evidence for this detection
    pub evidence: Evidence,
}

/// Outcome of the gate's atomic conditional upsert
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpsertOutcome {
    /// No active record held the key; a new `proposed` record was created
    Created(RecordId),

    /// An active record held the key; its evidence was enriched
    Merged(RecordId),

    /// An active record holds the key but for a different canonical
    /// identity; nothing was written
    IdentityConflict {
        /// The record already holding the key
        existing: RecordId,
    },
}

/// Expected prior state for a guarded record update
///
/// Actions are single-record transactions: the write applies only if the
/// record still has this state and suppression flag, otherwise it fails
/// with no partial field update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateGuard {
    /// Expected lifecycle state
    pub state: IssueState,

    /// Expected suppression flag
    pub suppressed: bool,
}

impl StateGuard {
    /// Guard matching a record's current state
    pub fn of(record: &InboxRecord) -> Self {
        Self {
            state: record.state,
            suppressed: record.suppressed,
        }
    }
}

/// Trait for the durable keyed record store
///
/// Implemented by the infrastructure layer (pulse-store). The
/// `upsert_candidate` primitive is the engine's sole serialization point:
/// concurrent invocations on the same key must converge to exactly one
/// inbox record.
pub trait IssueStore {
    /// Error type for store operations
    type Error;

    // --- governed entities and normalized inputs ---

    /// Insert or replace an entity
    fn put_entity(&mut self, entity: Entity) -> Result<(), Self::Error>;

    /// Get an entity by id
    fn get_entity(&self, id: &str) -> Result<Option<Entity>, Self::Error>;

    /// List all entities
    fn list_entities(&self) -> Result<Vec<Entity>, Self::Error>;

    /// Write a health assessment back to an entity
    fn write_health(
        &mut self,
        entity_id: &str,
        assessment: &HealthAssessment,
        scored_at: &str,
    ) -> Result<(), Self::Error>;

    /// Insert or replace a work item
    fn put_work_item(&mut self, item: WorkItem) -> Result<(), Self::Error>;

    /// Work items linked to an entity
    fn work_items_for(&self, entity_id: &str) -> Result<Vec<WorkItem>, Self::Error>;

    /// Insert or replace an invoice
    fn put_invoice(&mut self, invoice: Invoice) -> Result<(), Self::Error>;

    /// Invoices billed to an entity
    fn invoices_for(&self, entity_id: &str) -> Result<Vec<Invoice>, Self::Error>;

    /// Insert or replace a communication thread
    fn put_thread(&mut self, thread: Thread) -> Result<(), Self::Error>;

    /// Threads with an entity
    fn threads_for(&self, entity_id: &str) -> Result<Vec<Thread>, Self::Error>;

    // --- dedupe gate primitive ---

    /// Atomic conditional upsert of a candidate issue
    ///
    /// In one transaction: if an active record holds the candidate's key,
    /// append the evidence and bump `updated_at` with no state change;
    /// otherwise insert a new `proposed` record carrying the evidence.
    fn upsert_candidate(
        &mut self,
        candidate: &CandidateIssue,
        now: &str,
    ) -> Result<UpsertOutcome, Self::Error>;

    // --- inbox records ---

    /// Get a record by id
    fn get_record(&self, id: RecordId) -> Result<Option<InboxRecord>, Self::Error>;

    /// Find the active record for an underlying issue key, if any
    fn find_active(&self, key: &IssueKey) -> Result<Option<InboxRecord>, Self::Error>;

    /// Guarded single-record update; fails if the record's state or
    /// suppression flag no longer matches the guard
    fn update_record(
        &mut self,
        updated: &InboxRecord,
        guard: StateGuard,
    ) -> Result<(), Self::Error>;

    /// Append an evidence entry to a record and bump `updated_at`
    fn append_evidence(
        &mut self,
        id: RecordId,
        evidence: &Evidence,
        now: &str,
    ) -> Result<(), Self::Error>;

    /// Evidence entries for a record, in append order
    fn evidence_for(&self, id: RecordId) -> Result<Vec<Evidence>, Self::Error>;

    // --- read projections ---

    /// List records matching a query
    fn list_records(&self, query: &InboxQuery, now: &str) -> Result<Vec<InboxRecord>, Self::Error>;

    /// Inbox counts
    fn counts(&self) -> Result<InboxCounts, Self::Error>;

    /// Snoozed records whose `snoozed_until` has elapsed
    fn due_snoozes(&self, now: &str) -> Result<Vec<InboxRecord>, Self::Error>;

    /// Records whose `remind_after` has elapsed
    fn elapsed_reminders(&self, now: &str) -> Result<Vec<InboxRecord>, Self::Error>;

    /// Records a user acted on at or after the cutoff
    fn recently_actioned(&self, cutoff: &str) -> Result<Vec<InboxRecord>, Self::Error>;

    /// All records in active states
    fn active_records(&self) -> Result<Vec<InboxRecord>, Self::Error>;
}
