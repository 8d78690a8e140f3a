//! Read-side query types for the inbox

use crate::issue::IssueState;
use serde::{Deserialize, Serialize};

/// Query criteria for listing inbox records
///
/// An omitted state filter means all states. The explicit literal `"all"`
/// is not a valid filter value; [`parse_state_filter`] rejects it so the
/// same logical request never has two spellings.
#[derive(Debug, Clone, Default)]
pub struct InboxQuery {
    /// Filter by lifecycle state; `None` means all states
    pub state: Option<IssueState>,

    /// Filter by affected entity
    pub entity_id: Option<String>,

    /// Include suppressed records (excluded by default)
    pub include_suppressed: bool,

    /// Include records hidden by a pending reminder snooze
    /// (excluded by default)
    pub include_reminder_hidden: bool,

    /// Maximum results to return
    pub limit: Option<usize>,
}

/// Parse an optional raw state filter value
///
/// `None` (filter omitted) means all states. The literal `"all"` is
/// rejected rather than treated as a synonym for omission.
pub fn parse_state_filter(raw: Option<&str>) -> Result<Option<IssueState>, String> {
    match raw {
        None => Ok(None),
        Some("all") => Err(
            "invalid filter value 'all': omit the state filter to list all states".to_string(),
        ),
        Some(s) => IssueState::parse(s)
            .map(Some)
            .ok_or_else(|| format!("invalid state filter value '{}'", s)),
    }
}

/// Inbox counts, keyed per the read contract
///
/// `total` counts non-suppressed records (the default inbox size);
/// suppressed records appear only under their own key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboxCounts {
    /// Proposed records awaiting a user (not suppressed)
    pub unprocessed: usize,

    /// Records being addressed (not suppressed)
    pub addressing: usize,

    /// Problem-snoozed records (not suppressed)
    pub snoozed: usize,

    /// Regression-watch records (not suppressed)
    pub watching: usize,

    /// Suppressed records across all states
    pub suppressed: usize,

    /// All non-suppressed records
    pub total: usize,
}

/// Count keys exposed by the query service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountKey {
    /// Proposed records awaiting a user
    Unprocessed,
    /// Records being addressed
    Addressing,
    /// Problem-snoozed records
    Snoozed,
    /// Regression-watch records
    Watching,
    /// Suppressed records
    Suppressed,
    /// All non-suppressed records
    Total,
}

impl CountKey {
    /// Parse a count key.
    ///
    /// `"unread"` is accepted as a read-only legacy alias of
    /// `"unprocessed"` for one transition period.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "unprocessed" | "unread" => Some(CountKey::Unprocessed),
            "addressing" => Some(CountKey::Addressing),
            "snoozed" => Some(CountKey::Snoozed),
            "watching" => Some(CountKey::Watching),
            "suppressed" => Some(CountKey::Suppressed),
            "total" => Some(CountKey::Total),
            _ => None,
        }
    }
}

impl InboxCounts {
    /// Look up a count by key
    pub fn get(&self, key: CountKey) -> usize {
        match key {
            CountKey::Unprocessed => self.unprocessed,
            CountKey::Addressing => self.addressing,
            CountKey::Snoozed => self.snoozed,
            CountKey::Watching => self.watching,
            CountKey::Suppressed => self.suppressed,
            CountKey::Total => self.total,
        }
    }
}
