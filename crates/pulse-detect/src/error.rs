//! Error types for detector operations

use thiserror::Error;

/// Errors raised while validating detector output
#[derive(Error, Debug)]
pub enum DetectError {
    /// Evidence source inconsistent with the detector's declared context
    #[error("Evidence source '{actual}' does not match detector '{detector}' context '{declared}'")]
    SourceMismatch {
        /// Detector kind
        detector: String,
        /// Source system the detector declares
        declared: String,
        /// Source system the evidence carries
        actual: String,
    },

    /// Evidence malformed or outside the canonical source set
    #[error("Invalid evidence: {0}")]
    InvalidEvidence(String),
}
