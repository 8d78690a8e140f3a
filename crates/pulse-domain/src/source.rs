//! Source system taxonomy - the fixed canonical set of evidence origins

use serde::{Deserialize, Serialize};

/// Source system an evidence record originates from
///
/// The set is closed: evidence whose source string falls outside it is
/// rejected at the parse boundary, never coerced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceSystem {
    /// Task/work tracking system
    TaskSystem,

    /// Mail threads
    Mail,

    /// Chat messages
    Chat,

    /// Calendar events
    Calendar,

    /// Meeting notes
    MeetingNotes,

    /// Invoicing system
    Invoicing,

    /// Engine-internal evidence (e.g. automatic resolution)
    Internal,
}

impl SourceSystem {
    /// Get the source system name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceSystem::TaskSystem => "task-system",
            SourceSystem::Mail => "mail",
            SourceSystem::Chat => "chat",
            SourceSystem::Calendar => "calendar",
            SourceSystem::MeetingNotes => "meeting-notes",
            SourceSystem::Invoicing => "invoicing",
            SourceSystem::Internal => "internal",
        }
    }

    /// Parse a source system from a string
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "task-system" => Some(SourceSystem::TaskSystem),
            "mail" => Some(SourceSystem::Mail),
            "chat" => Some(SourceSystem::Chat),
            "calendar" => Some(SourceSystem::Calendar),
            "meeting-notes" => Some(SourceSystem::MeetingNotes),
            "invoicing" => Some(SourceSystem::Invoicing),
            "internal" => Some(SourceSystem::Internal),
            _ => None,
        }
    }
}

impl std::str::FromStr for SourceSystem {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown source system: {}", s))
    }
}

impl std::fmt::Display for SourceSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
