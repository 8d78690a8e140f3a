//! Overdue work item detection

use crate::{Detector, EntitySnapshot};
use pulse_domain::identity::resolve_work_item_identity;
use pulse_domain::traits::CandidateIssue;
use pulse_domain::{Evidence, IssueKey, SourceSystem};
use serde_json::json;

/// Detector kind slug for overdue work items
pub const OVERDUE_WORK_ITEM: &str = "overdue_work_item";

/// Underlying issue key for an overdue work item
///
/// The scoring engine uses the same derivation to tie a work item back to
/// its inbox record when suspending penalties.
pub fn overdue_work_item_key(entity_id: &str, work_item_id: &str) -> IssueKey {
    IssueKey::new(OVERDUE_WORK_ITEM, entity_id, work_item_id)
}

/// Flags open work items past their due timestamp
pub struct OverdueWorkItemDetector;

impl Detector for OverdueWorkItemDetector {
    fn kind(&self) -> &'static str {
        OVERDUE_WORK_ITEM
    }

    fn source(&self) -> SourceSystem {
        SourceSystem::TaskSystem
    }

    fn evaluate(&self, snapshot: &EntitySnapshot) -> Vec<CandidateIssue> {
        if !snapshot.entity.active {
            return Vec::new();
        }

        snapshot
            .work_items
            .iter()
            .filter(|item| item.is_overdue(&snapshot.now))
            .map(|item| {
                tracing::debug!(
                    entity = %snapshot.entity.id,
                    work_item = %item.id,
                    "overdue work item detected"
                );
                CandidateIssue {
                    key: overdue_work_item_key(&snapshot.entity.id, &item.id),
                    entity_id: snapshot.entity.id.clone(),
                    subject_identity: resolve_work_item_identity(item),
                    evidence: Evidence::new(
                        SourceSystem::TaskSystem,
                        item.id.clone(),
                        snapshot.now.clone(),
                    )
                    .with_url(format!("task://{}", item.id))
                    .with_detail(json!({
                        "title": item.title,
                        "due_at": item.due_at,
                    })),
                }
            })
            .collect()
    }
}
