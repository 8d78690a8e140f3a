//! Unanswered inbound thread detection

use crate::{Detector, EntitySnapshot};
use chrono::Duration;
use pulse_domain::clock::parse_canonical;
use pulse_domain::identity::resolve_thread_identity;
use pulse_domain::traits::CandidateIssue;
use pulse_domain::{Evidence, IssueKey, SourceSystem};
use serde_json::json;

/// Detector kind slug for unanswered threads
pub const UNANSWERED_THREAD: &str = "unanswered_thread";

/// Underlying issue key for an unanswered thread
pub fn unanswered_thread_key(entity_id: &str, thread_id: &str) -> IssueKey {
    IssueKey::new(UNANSWERED_THREAD, entity_id, thread_id)
}

/// Flags inbound threads waiting on a reply for more than a threshold
pub struct UnansweredThreadDetector {
    threshold_days: u32,
}

impl UnansweredThreadDetector {
    /// Create a detector with the given waiting threshold in days
    pub fn new(threshold_days: u32) -> Self {
        Self { threshold_days }
    }
}

impl Detector for UnansweredThreadDetector {
    fn kind(&self) -> &'static str {
        UNANSWERED_THREAD
    }

    fn source(&self) -> SourceSystem {
        SourceSystem::Mail
    }

    fn evaluate(&self, snapshot: &EntitySnapshot) -> Vec<CandidateIssue> {
        if !snapshot.entity.active {
            return Vec::new();
        }

        let now = match parse_canonical(&snapshot.now) {
            Ok(now) => now,
            Err(e) => {
                tracing::warn!("skipping pass with non-canonical snapshot time: {}", e);
                return Vec::new();
            }
        };
        let cutoff = now - Duration::days(i64::from(self.threshold_days));

        snapshot
            .threads
            .iter()
            .filter(|thread| thread.awaiting_reply())
            .filter(|thread| {
                thread
                    .last_inbound_at
                    .as_deref()
                    .and_then(|at| parse_canonical(at).ok())
                    .is_some_and(|inbound| inbound <= cutoff)
            })
            .map(|thread| {
                tracing::debug!(
                    entity = %snapshot.entity.id,
                    thread = %thread.id,
                    "unanswered thread detected"
                );
                CandidateIssue {
                    key: unanswered_thread_key(&snapshot.entity.id, &thread.id),
                    entity_id: snapshot.entity.id.clone(),
                    subject_identity: resolve_thread_identity(thread),
                    evidence: Evidence::new(
                        SourceSystem::Mail,
                        thread.id.clone(),
                        snapshot.now.clone(),
                    )
                    .with_url(format!("mail://{}", thread.id))
                    .with_detail(json!({
                        "subject": thread.subject,
                        "last_inbound_at": thread.last_inbound_at,
                    })),
                }
            })
            .collect()
    }
}
