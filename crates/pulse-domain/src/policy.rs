//! Governance policy - explicit, never ambient

use serde::{Deserialize, Serialize};

/// Governance mode for detector and worker write behavior
///
/// Threaded as an explicit configuration value into every gate, action,
/// and worker call; no component reads it from ambient state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GovernanceMode {
    /// Detectors evaluate and log; the gate writes nothing
    Observe,

    /// Detected issues land as `proposed` records (default)
    #[default]
    Propose,

    /// As `propose`, plus the worker may auto-resolve issues whose
    /// underlying condition no longer reproduces
    Auto,
}

impl GovernanceMode {
    /// Get the mode name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            GovernanceMode::Observe => "observe",
            GovernanceMode::Propose => "propose",
            GovernanceMode::Auto => "auto",
        }
    }

    /// Parse a mode from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "observe" => Some(GovernanceMode::Observe),
            "propose" => Some(GovernanceMode::Propose),
            "auto" => Some(GovernanceMode::Auto),
            _ => None,
        }
    }
}

impl std::str::FromStr for GovernanceMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Invalid governance mode: {}", s))
    }
}
