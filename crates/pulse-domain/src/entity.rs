//! Normalized entity records consumed and governed by the engine

use serde::{Deserialize, Serialize};

/// Initial health reason before the scoring engine has run
pub const NOT_YET_SCORED: &str = "not yet scored";

/// A governed business entity (client)
///
/// `health_score` and `health_reason` are derived, never hand-set:
/// only the scoring engine writes them. Entities are never deleted,
/// only deactivated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable entity identifier
    pub id: String,

    /// Display name
    pub name: String,

    /// Deactivated entities are skipped by detectors and scoring
    pub active: bool,

    /// Engagement health score, 0-100
    pub health_score: u8,

    /// Human-readable gating label for the score
    pub health_reason: String,

    /// Canonical timestamp of the last recompute
    pub scored_at: Option<String>,
}

impl Entity {
    /// Create a new active entity with an unscored health baseline
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            active: true,
            health_score: 100,
            health_reason: NOT_YET_SCORED.to_string(),
            scored_at: None,
        }
    }
}

/// A normalized work item linked to an entity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkItem {
    /// Upstream work item identifier
    pub id: String,

    /// Owning entity
    pub entity_id: String,

    /// Title
    pub title: String,

    /// Canonical due timestamp, if any
    pub due_at: Option<String>,

    /// Whether the item is still open
    pub open: bool,
}

impl WorkItem {
    /// Whether this item is open and past its due timestamp
    ///
    /// Canonical timestamps order lexicographically, so a plain string
    /// comparison suffices.
    pub fn is_overdue(&self, now: &str) -> bool {
        self.open
            && self
                .due_at
                .as_deref()
                .is_some_and(|due| due < now)
    }
}

/// A normalized invoice record
///
/// `record_id` is the upstream system's immutable internal identifier and
/// the only field that participates in identity; `number` is display-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    /// Upstream immutable internal identifier
    pub record_id: String,

    /// Human-visible invoice number (display only, mutable)
    pub number: String,

    /// Billed entity
    pub entity_id: String,

    /// Canonical due timestamp, if any
    pub due_at: Option<String>,

    /// Whether the invoice has been paid
    pub paid: bool,
}

impl Invoice {
    /// Whether this invoice is unpaid and past its due timestamp
    pub fn is_overdue(&self, now: &str) -> bool {
        !self.paid
            && self
                .due_at
                .as_deref()
                .is_some_and(|due| due < now)
    }
}

/// A normalized communication thread
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    /// Upstream thread identifier
    pub id: String,

    /// Counterparty entity
    pub entity_id: String,

    /// Subject line
    pub subject: String,

    /// Canonical timestamp of the last inbound message
    pub last_inbound_at: Option<String>,

    /// Canonical timestamp of the last outbound message
    pub last_outbound_at: Option<String>,
}

impl Thread {
    /// Whether the last message is inbound with no later outbound reply
    pub fn awaiting_reply(&self) -> bool {
        match (&self.last_inbound_at, &self.last_outbound_at) {
            (Some(inbound), Some(outbound)) => outbound < inbound,
            (Some(_), None) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_entity_baseline() {
        let entity = Entity::new("client-1", "Acme");
        assert!(entity.active);
        assert_eq!(entity.health_score, 100);
        assert_eq!(entity.health_reason, NOT_YET_SCORED);
        assert!(entity.scored_at.is_none());
    }

    #[test]
    fn test_work_item_overdue() {
        let item = WorkItem {
            id: "task-1".to_string(),
            entity_id: "client-1".to_string(),
            title: "Follow up".to_string(),
            due_at: Some("2026-02-01T00:00:00.000Z".to_string()),
            open: true,
        };
        assert!(item.is_overdue("2026-02-08T11:00:00.000Z"));
        assert!(!item.is_overdue("2026-01-31T00:00:00.000Z"));
    }

    #[test]
    fn test_closed_item_never_overdue() {
        let item = WorkItem {
            id: "task-1".to_string(),
            entity_id: "client-1".to_string(),
            title: "Done".to_string(),
            due_at: Some("2026-02-01T00:00:00.000Z".to_string()),
            open: false,
        };
        assert!(!item.is_overdue("2026-02-08T11:00:00.000Z"));
    }

    #[test]
    fn test_paid_invoice_never_overdue() {
        let invoice = Invoice {
            record_id: "rec_1".to_string(),
            number: "INV-1".to_string(),
            entity_id: "client-1".to_string(),
            due_at: Some("2026-02-01T00:00:00.000Z".to_string()),
            paid: true,
        };
        assert!(!invoice.is_overdue("2026-02-08T11:00:00.000Z"));
    }

    #[test]
    fn test_thread_awaiting_reply() {
        let mut thread = Thread {
            id: "thread-1".to_string(),
            entity_id: "client-1".to_string(),
            subject: "Renewal".to_string(),
            last_inbound_at: Some("2026-02-05T09:00:00.000Z".to_string()),
            last_outbound_at: None,
        };
        assert!(thread.awaiting_reply());

        thread.last_outbound_at = Some("2026-02-06T09:00:00.000Z".to_string());
        assert!(!thread.awaiting_reply());

        thread.last_inbound_at = Some("2026-02-07T09:00:00.000Z".to_string());
        assert!(thread.awaiting_reply());
    }
}
