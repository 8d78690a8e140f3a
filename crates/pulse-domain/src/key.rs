//! Underlying issue key - deterministic identity of a real-world problem

use serde::{Deserialize, Serialize};

/// Deterministic composite key identifying an underlying issue
///
/// Derived from the detector kind, the affected entity, and the canonical
/// identity of the discriminating fact (invoice internal id, work item id,
/// thread id). Identical real-world problems across repeated detector
/// runs always produce the same key; the dedupe gate keys on it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct IssueKey(String);

impl IssueKey {
    /// Build a key from its three components
    pub fn new(detector: &str, entity_id: &str, discriminant: &str) -> Self {
        Self(format!("{}:{}:{}", detector, entity_id, discriminant))
    }

    /// Reconstruct a key from its stored string form
    pub fn from_raw(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// The key's string form
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for IssueKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
