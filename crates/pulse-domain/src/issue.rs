//! Inbox records and the issue lifecycle state machine

use crate::identity::SourceIdentity;
use crate::key::IssueKey;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for an inbox record based on UUIDv7
///
/// UUIDv7 provides chronological sortability, 128-bit uniqueness, and
/// coordination-free generation across concurrent detector runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct RecordId(u128);

impl RecordId {
    /// Generate a new UUIDv7-based RecordId
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7().as_u128())
    }

    /// Create a RecordId from a raw u128 value
    ///
    /// This is primarily for storage layer deserialization.
    pub fn from_value(value: u128) -> Self {
        Self(value)
    }

    /// Parse a RecordId from a UUIDv7 string
    pub fn from_string(s: &str) -> Result<Self, String> {
        uuid::Uuid::parse_str(s)
            .map(|u| Self(u.as_u128()))
            .map_err(|e| format!("Invalid record id '{}': {}", s, e))
    }

    /// Get the raw u128 value
    pub fn value(&self) -> u128 {
        self.0
    }

    /// Get the timestamp component of the UUIDv7 (milliseconds since Unix epoch)
    pub fn timestamp(&self) -> u64 {
        // UUIDv7: top 48 bits are Unix millisecond timestamp
        (self.0 >> 80) as u64
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", uuid::Uuid::from_u128(self.0))
    }
}

impl From<RecordId> for String {
    fn from(id: RecordId) -> Self {
        id.to_string()
    }
}

impl TryFrom<String> for RecordId {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::from_string(&s)
    }
}

/// Lifecycle state of an inbox record
///
/// All four states are "active" for dedupe purposes: at most one record
/// per underlying issue key may occupy any of them at a time. There is no
/// `resolved` resting state - a resolve action lands directly in
/// `regression_watch` and stamps `resolved_at` for audit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueState {
    /// Detector found it, unseen by a user
    Proposed,

    /// A user committed to act; entering this state implies acknowledgment
    Addressing,

    /// Problem snooze in effect; returns to the prior state on expiry
    Snoozed,

    /// Resolved; the system is watching for recurrence
    RegressionWatch,
}

/// The active states, in storage order
pub const ACTIVE_STATES: [IssueState; 4] = [
    IssueState::Proposed,
    IssueState::Addressing,
    IssueState::Snoozed,
    IssueState::RegressionWatch,
];

impl IssueState {
    /// Get the state name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueState::Proposed => "proposed",
            IssueState::Addressing => "addressing",
            IssueState::Snoozed => "snoozed",
            IssueState::RegressionWatch => "regression_watch",
        }
    }

    /// Parse a state from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "proposed" => Some(IssueState::Proposed),
            "addressing" => Some(IssueState::Addressing),
            "snoozed" => Some(IssueState::Snoozed),
            "regression_watch" => Some(IssueState::RegressionWatch),
            _ => None,
        }
    }
}

impl std::str::FromStr for IssueState {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid issue state: {}", s))
    }
}

impl fmt::Display for IssueState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Snooze variant
///
/// A reminder snooze defers only the user-facing notification; the issue
/// stays open with its health impact unchanged. A problem snooze suspends
/// the issue itself, including its health penalty, until expiry. The two
/// are never conflated: one never implies the other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SnoozeKind {
    /// Defer the notification only
    Reminder,

    /// Defer the problem and suspend its health penalty
    Problem,
}

impl SnoozeKind {
    /// Get the snooze kind as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SnoozeKind::Reminder => "reminder",
            SnoozeKind::Problem => "problem",
        }
    }

    /// Parse a snooze kind from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "reminder" => Some(SnoozeKind::Reminder),
            "problem" => Some(SnoozeKind::Problem),
            _ => None,
        }
    }
}

/// User actions on an inbox record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueAction {
    /// Commit to acting; implies acknowledgment
    Assign,

    /// Resolve; lands directly in regression watch
    Resolve,

    /// Defer the notification
    SnoozeReminder,

    /// Defer the problem
    SnoozeProblem,

    /// Set the suppression flag
    Suppress,

    /// Clear the suppression flag
    Unsuppress,
}

impl IssueAction {
    /// Get the action name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            IssueAction::Assign => "assign",
            IssueAction::Resolve => "resolve",
            IssueAction::SnoozeReminder => "snooze_reminder",
            IssueAction::SnoozeProblem => "snooze_problem",
            IssueAction::Suppress => "suppress",
            IssueAction::Unsuppress => "unsuppress",
        }
    }
}

impl fmt::Display for IssueAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Legal actions for a record in the given state
///
/// While suppressed, `unsuppress` is the only legal action regardless of
/// state. Snapshot and filtered views reuse this same computation - never
/// a restricted subset.
pub fn available_actions(state: IssueState, suppressed: bool) -> Vec<IssueAction> {
    if suppressed {
        return vec![IssueAction::Unsuppress];
    }

    match state {
        IssueState::Proposed => vec![
            IssueAction::Assign,
            IssueAction::Resolve,
            IssueAction::SnoozeReminder,
            IssueAction::SnoozeProblem,
            IssueAction::Suppress,
        ],
        IssueState::Addressing => vec![
            IssueAction::Resolve,
            IssueAction::SnoozeReminder,
            IssueAction::SnoozeProblem,
            IssueAction::Suppress,
        ],
        // Acting on a snoozed issue early is committing to it; assign wakes
        // the record into addressing.
        IssueState::Snoozed => vec![
            IssueAction::Assign,
            IssueAction::Resolve,
            IssueAction::Suppress,
        ],
        IssueState::RegressionWatch => vec![IssueAction::Suppress],
    }
}

/// The mutable issue instance - one per underlying issue key among the
/// active states
///
/// Records are created by the dedupe gate on first detection, enriched by
/// subsequent detections, mutated by user actions, and never physically
/// deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InboxRecord {
    /// Unique identifier
    pub id: RecordId,

    /// Underlying issue key
    pub underlying_issue_id: IssueKey,

    /// Affected entity
    pub entity_id: String,

    /// Current lifecycle state
    pub state: IssueState,

    /// Suppression flag, orthogonal to `state`
    pub suppressed: bool,

    /// Canonical identity of the discriminating fact
    pub subject_identity: SourceIdentity,

    /// Who the record is assigned to
    pub tagged_by: Option<String>,

    /// When the record was assigned (canonical)
    pub tagged_at: Option<String>,

    /// Problem snooze horizon (canonical)
    pub snoozed_until: Option<String>,

    /// State a problem snooze returns to on expiry
    pub snooze_return_state: Option<IssueState>,

    /// Reminder snooze horizon (canonical); state and health unchanged
    pub remind_after: Option<String>,

    /// When the record was resolved (canonical); stamped even though
    /// `resolved` is never a resting state
    pub resolved_at: Option<String>,

    /// When a user last acted on the record (canonical).
    /// Distinct from `updated_at`, which also bumps on evidence merges.
    pub actioned_at: Option<String>,

    /// Creation timestamp (canonical)
    pub created_at: String,

    /// Last mutation timestamp (canonical)
    pub updated_at: String,
}

impl InboxRecord {
    /// Create a freshly proposed record, as the dedupe gate does on first
    /// detection of a key
    pub fn proposed(
        key: IssueKey,
        entity_id: impl Into<String>,
        subject_identity: SourceIdentity,
        now: impl Into<String>,
    ) -> Self {
        let now = now.into();
        Self {
            id: RecordId::new(),
            underlying_issue_id: key,
            entity_id: entity_id.into(),
            state: IssueState::Proposed,
            suppressed: false,
            subject_identity,
            tagged_by: None,
            tagged_at: None,
            snoozed_until: None,
            snooze_return_state: None,
            remind_after: None,
            resolved_at: None,
            actioned_at: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }

    /// Legal actions for this record's current state and suppression flag
    pub fn available_actions(&self) -> Vec<IssueAction> {
        available_actions(self.state, self.suppressed)
    }

    /// Whether a problem snooze has elapsed
    pub fn snooze_due(&self, now: &str) -> bool {
        self.state == IssueState::Snoozed
            && self
                .snoozed_until
                .as_deref()
                .is_some_and(|until| until <= now)
    }

    /// Whether a reminder snooze is still hiding this record
    pub fn reminder_pending(&self, now: &str) -> bool {
        self.remind_after.as_deref().is_some_and(|after| after > now)
    }

    /// Whether the problem-type snooze currently suspends this record's
    /// health penalty
    pub fn penalty_suspended(&self) -> bool {
        self.suppressed || self.state == IssueState::Snoozed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::SourceSystem;

    fn record() -> InboxRecord {
        InboxRecord::proposed(
            IssueKey::new("overdue_invoice", "client-1", "rec_9f3"),
            "client-1",
            SourceIdentity::new(SourceSystem::Invoicing, "rec_9f3"),
            "2026-02-08T11:00:00.000Z",
        )
    }

    #[test]
    fn test_record_id_ordering() {
        let id1 = RecordId::from_value(1000);
        let id2 = RecordId::from_value(2000);
        assert!(id1 < id2);
    }

    #[test]
    fn test_record_id_display_and_parse() {
        let id = RecordId::new();
        let parsed = RecordId::from_string(&id.to_string()).unwrap();
        assert_eq!(id, parsed);
    }

    #[test]
    fn test_record_id_invalid_string() {
        assert!(RecordId::from_string("not-a-uuid").is_err());
        assert!(RecordId::from_string("").is_err());
    }

    #[test]
    fn test_state_roundtrip() {
        for state in ACTIVE_STATES {
            assert_eq!(IssueState::parse(state.as_str()), Some(state));
        }
        assert_eq!(IssueState::parse("resolved"), None);
        assert_eq!(IssueState::parse("all"), None);
    }

    #[test]
    fn test_proposed_record_defaults() {
        let record = record();
        assert_eq!(record.state, IssueState::Proposed);
        assert!(!record.suppressed);
        assert!(record.resolved_at.is_none());
        assert_eq!(record.created_at, record.updated_at);
    }

    #[test]
    fn test_suppressed_gates_to_unsuppress_only() {
        for state in ACTIVE_STATES {
            assert_eq!(available_actions(state, true), vec![IssueAction::Unsuppress]);
        }
    }

    #[test]
    fn test_proposed_action_set() {
        let actions = available_actions(IssueState::Proposed, false);
        assert!(actions.contains(&IssueAction::Assign));
        assert!(actions.contains(&IssueAction::Resolve));
        assert!(actions.contains(&IssueAction::SnoozeReminder));
        assert!(actions.contains(&IssueAction::SnoozeProblem));
        assert!(actions.contains(&IssueAction::Suppress));
        assert!(!actions.contains(&IssueAction::Unsuppress));
    }

    #[test]
    fn test_addressing_cannot_be_reassigned() {
        let actions = available_actions(IssueState::Addressing, false);
        assert!(!actions.contains(&IssueAction::Assign));
    }

    #[test]
    fn test_regression_watch_action_set() {
        assert_eq!(
            available_actions(IssueState::RegressionWatch, false),
            vec![IssueAction::Suppress]
        );
    }

    #[test]
    fn test_snooze_due() {
        let mut record = record();
        record.state = IssueState::Snoozed;
        record.snoozed_until = Some("2026-02-14T20:00:00.000Z".to_string());

        assert!(!record.snooze_due("2026-02-10T00:00:00.000Z"));
        assert!(record.snooze_due("2026-02-14T20:00:00.000Z"));
        assert!(record.snooze_due("2026-02-15T00:00:00.000Z"));
    }

    #[test]
    fn test_reminder_pending_does_not_suspend_penalty() {
        let mut record = record();
        record.remind_after = Some("2026-02-14T20:00:00.000Z".to_string());

        assert!(record.reminder_pending("2026-02-10T00:00:00.000Z"));
        assert!(!record.penalty_suspended());
    }

    #[test]
    fn test_penalty_suspended() {
        let mut record = record();
        assert!(!record.penalty_suspended());

        record.state = IssueState::Snoozed;
        assert!(record.penalty_suspended());

        record.state = IssueState::Proposed;
        record.suppressed = true;
        assert!(record.penalty_suspended());
    }

    #[test]
    fn test_record_serde_id_as_string() {
        let record = record();
        let json = serde_json::to_value(&record).unwrap();
        assert!(json["id"].is_string());
        assert_eq!(json["state"], "proposed");

        let back: InboxRecord = serde_json::from_value(json).unwrap();
        assert_eq!(back, record);
    }
}
