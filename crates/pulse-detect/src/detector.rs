//! The Detector trait and candidate validation

use crate::{DetectError, EntitySnapshot};
use pulse_domain::clock::is_canonical;
use pulse_domain::traits::CandidateIssue;
use pulse_domain::SourceSystem;

/// A rule evaluator proposing candidate issues from normalized state
///
/// Implementations must be pure and idempotent: no I/O, no clock reads
/// (the snapshot carries `now`), and identical input yields identical
/// candidates with identical underlying issue keys.
pub trait Detector {
    /// Stable detector kind slug; the first component of every key this
    /// detector produces
    fn kind(&self) -> &'static str;

    /// Source system this detector draws evidence from
    fn source(&self) -> SourceSystem;

    /// Evaluate one entity snapshot
    fn evaluate(&self, snapshot: &EntitySnapshot) -> Vec<CandidateIssue>;
}

/// Validate a candidate against its detector's declared context
///
/// Rejections are local: the candidate is refused, nothing is written,
/// and the rest of the pass proceeds.
pub fn validate_candidate(
    detector: &dyn Detector,
    candidate: &CandidateIssue,
) -> Result<(), DetectError> {
    if candidate.evidence.source != detector.source() {
        return Err(DetectError::SourceMismatch {
            detector: detector.kind().to_string(),
            declared: detector.source().as_str().to_string(),
            actual: candidate.evidence.source.as_str().to_string(),
        });
    }

    if candidate.subject_identity.source != detector.source() {
        return Err(DetectError::SourceMismatch {
            detector: detector.kind().to_string(),
            declared: detector.source().as_str().to_string(),
            actual: candidate.subject_identity.source.as_str().to_string(),
        });
    }

    if candidate.subject_identity.source_id.is_empty() {
        return Err(DetectError::InvalidEvidence(
            "empty upstream source id".to_string(),
        ));
    }

    if candidate.evidence.source == SourceSystem::Invoicing && candidate.evidence.url.is_some() {
        return Err(DetectError::InvalidEvidence(
            "invoicing evidence must not carry a url".to_string(),
        ));
    }

    if !is_canonical(&candidate.evidence.captured_at) {
        return Err(DetectError::InvalidEvidence(format!(
            "captured_at '{}' is not a canonical timestamp",
            candidate.evidence.captured_at
        )));
    }

    Ok(())
}
