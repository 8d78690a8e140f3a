//! Error taxonomy for the engine

use thiserror::Error;

/// Errors surfaced by gate, action, scoring, and view operations
///
/// Transition and evidence violations are local rejections: the calling
/// operation fails and the record is untouched. Store failures propagate
/// with no partial write, relying on the store's own atomicity.
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed or disallowed filter value (e.g. the literal "all")
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// Action illegal for the record's current state or suppression flag
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// Evidence outside the canonical source set or inconsistent with the
    /// detector's declared context
    #[error("invalid evidence: {0}")]
    InvalidEvidence(String),

    /// Resolved identity tuple collides across distinct real-world records
    #[error("identity conflict: {0}")]
    IdentityConflict(String),

    /// Record or entity not found
    #[error("not found: {0}")]
    NotFound(String),

    /// Configuration value out of range
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage layer failure
    #[error("storage error: {0}")]
    Store(String),
}

impl EngineError {
    /// Stable machine-readable discriminator for the error body
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::InvalidState(_) => "invalid_state",
            EngineError::InvalidTransition(_) => "invalid_transition",
            EngineError::InvalidEvidence(_) => "invalid_evidence",
            EngineError::IdentityConflict(_) => "identity_conflict",
            EngineError::NotFound(_) => "not_found",
            EngineError::Config(_) => "config",
            EngineError::Store(_) => "store",
        }
    }

    /// Wrap a store error
    pub(crate) fn store<E: std::fmt::Display>(e: E) -> Self {
        EngineError::Store(e.to_string())
    }
}

impl From<pulse_detect::DetectError> for EngineError {
    fn from(e: pulse_detect::DetectError) -> Self {
        EngineError::InvalidEvidence(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kinds_are_stable() {
        assert_eq!(EngineError::InvalidState("x".into()).kind(), "invalid_state");
        assert_eq!(
            EngineError::InvalidTransition("x".into()).kind(),
            "invalid_transition"
        );
        assert_eq!(
            EngineError::InvalidEvidence("x".into()).kind(),
            "invalid_evidence"
        );
        assert_eq!(
            EngineError::IdentityConflict("x".into()).kind(),
            "identity_conflict"
        );
    }
}
