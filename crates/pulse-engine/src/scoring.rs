//! Engagement health recompute and write-back
//!
//! Recomputation may run asynchronously after detector passes; a briefly
//! stale score is acceptable, but it always converges to the latest
//! committed active-issue set. Last write wins by recompute time.

use crate::{EngineConfig, EngineError};
use pulse_detect::overdue_work_item_key;
use pulse_domain::clock::Clock;
use pulse_domain::health::{compute_health, HealthAssessment};
use pulse_domain::traits::IssueStore;

/// Recompute and write back one entity's engagement health
///
/// Work items whose inbox record is suppressed or problem-snoozed are
/// excluded from both the open and overdue counts - the penalty is
/// suspended, not merely hidden.
pub fn recompute_entity<S>(
    store: &mut S,
    entity_id: &str,
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Result<HealthAssessment, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let now = clock.now_canonical();

    store
        .get_entity(entity_id)
        .map_err(EngineError::store)?
        .ok_or_else(|| EngineError::NotFound(format!("entity {}", entity_id)))?;

    let items = store.work_items_for(entity_id).map_err(EngineError::store)?;

    let mut linked_open = 0usize;
    let mut overdue_open = 0usize;

    for item in items.iter().filter(|item| item.open) {
        let key = overdue_work_item_key(entity_id, &item.id);
        if let Some(record) = store.find_active(&key).map_err(EngineError::store)? {
            if record.penalty_suspended() {
                continue;
            }
        }

        linked_open += 1;
        if item.is_overdue(&now) {
            overdue_open += 1;
        }
    }

    let assessment = compute_health(linked_open, overdue_open, &config.penalty_curve);

    if config.dry_run {
        tracing::info!(
            entity = entity_id,
            score = assessment.score,
            "DRY RUN: would write health assessment"
        );
    } else {
        store
            .write_health(entity_id, &assessment, &now)
            .map_err(EngineError::store)?;
        tracing::debug!(
            entity = entity_id,
            score = assessment.score,
            reason = %assessment.reason,
            "health recomputed"
        );
    }

    Ok(assessment)
}

/// Recompute health for every active entity; returns how many were scored
pub fn recompute_all<S>(
    store: &mut S,
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Result<usize, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let entities = store.list_entities().map_err(EngineError::store)?;
    let mut scored = 0usize;

    for entity in entities.into_iter().filter(|e| e.active) {
        recompute_entity(store, &entity.id, config, clock)?;
        scored += 1;
    }

    Ok(scored)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;
    use pulse_domain::clock::FixedClock;
    use pulse_domain::health::NO_LINKED_OPEN_TASKS;
    use pulse_domain::traits::{CandidateIssue, UpsertOutcome};
    use pulse_domain::{
        Entity, Evidence, PenaltyCurve, RecordId, SnoozeKind, SourceIdentity, SourceSystem,
        WorkItem,
    };
    use pulse_store::SqliteStore;

    const NOW: &str = "2026-02-08T11:00:00.000Z";

    fn clock() -> FixedClock {
        FixedClock::at(NOW).unwrap()
    }

    fn config() -> EngineConfig {
        EngineConfig {
            penalty_curve: PenaltyCurve::Linear { slope: 0.6 },
            ..Default::default()
        }
    }

    fn store_with_items(items: &[(&str, Option<&str>)]) -> SqliteStore {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.put_entity(Entity::new("client-1", "Acme")).unwrap();
        for (id, due_at) in items {
            store
                .put_work_item(WorkItem {
                    id: id.to_string(),
                    entity_id: "client-1".to_string(),
                    title: format!("Task {}", id),
                    due_at: due_at.map(String::from),
                    open: true,
                })
                .unwrap();
        }
        store
    }

    fn upsert_task_issue(store: &mut SqliteStore, item_id: &str) -> RecordId {
        let candidate = CandidateIssue {
            key: overdue_work_item_key("client-1", item_id),
            entity_id: "client-1".to_string(),
            subject_identity: SourceIdentity::new(SourceSystem::TaskSystem, item_id),
            evidence: Evidence::new(SourceSystem::TaskSystem, item_id, NOW),
        };
        match store.upsert_candidate(&candidate, NOW).unwrap() {
            UpsertOutcome::Created(id) => id,
            other => panic!("expected Created, got {:?}", other),
        }
    }

    #[test]
    fn test_no_linked_open_tasks_gates_to_100() {
        let mut store = store_with_items(&[]);
        let assessment =
            recompute_entity(&mut store, "client-1", &config(), &clock()).unwrap();

        assert_eq!(assessment.score, 100);
        assert_eq!(assessment.reason, NO_LINKED_OPEN_TASKS);

        let entity = store.get_entity("client-1").unwrap().unwrap();
        assert_eq!(entity.health_score, 100);
        assert_eq!(entity.health_reason, NO_LINKED_OPEN_TASKS);
        assert_eq!(entity.scored_at.as_deref(), Some(NOW));
    }

    #[test]
    fn test_overdue_ratio_drives_score() {
        // 2 of 4 open items overdue -> 50% -> linear 0.6 -> score 70
        let mut store = store_with_items(&[
            ("task-1", Some("2026-02-01T00:00:00.000Z")),
            ("task-2", Some("2026-02-02T00:00:00.000Z")),
            ("task-3", Some("2026-03-01T00:00:00.000Z")),
            ("task-4", None),
        ]);

        let assessment =
            recompute_entity(&mut store, "client-1", &config(), &clock()).unwrap();
        assert_eq!(assessment.linked_open_tasks, 4);
        assert_eq!(assessment.overdue_open_tasks, 2);
        assert_eq!(assessment.score, 70);
    }

    #[test]
    fn test_suppressed_issue_excluded_from_both_counts() {
        let mut store = store_with_items(&[
            ("task-1", Some("2026-02-01T00:00:00.000Z")),
            ("task-2", Some("2026-03-01T00:00:00.000Z")),
        ]);
        let id = upsert_task_issue(&mut store, "task-1");
        actions::suppress(&mut store, id, &clock()).unwrap();

        let assessment =
            recompute_entity(&mut store, "client-1", &config(), &clock()).unwrap();

        // task-1 vanishes entirely: 1 open, 0 overdue
        assert_eq!(assessment.linked_open_tasks, 1);
        assert_eq!(assessment.overdue_open_tasks, 0);
        assert_eq!(assessment.score, 100);
    }

    #[test]
    fn test_problem_snooze_suspends_penalty() {
        let mut store = store_with_items(&[("task-1", Some("2026-02-01T00:00:00.000Z"))]);
        let id = upsert_task_issue(&mut store, "task-1");
        actions::snooze(&mut store, id, SnoozeKind::Problem, 7, &config(), &clock()).unwrap();

        let assessment =
            recompute_entity(&mut store, "client-1", &config(), &clock()).unwrap();

        // The only open item is snoozed away: gate reason applies
        assert_eq!(assessment.score, 100);
        assert_eq!(assessment.reason, NO_LINKED_OPEN_TASKS);
    }

    #[test]
    fn test_reminder_snooze_does_not_suspend_penalty() {
        let mut store = store_with_items(&[("task-1", Some("2026-02-01T00:00:00.000Z"))]);
        let id = upsert_task_issue(&mut store, "task-1");
        actions::snooze(&mut store, id, SnoozeKind::Reminder, 7, &config(), &clock()).unwrap();

        let assessment =
            recompute_entity(&mut store, "client-1", &config(), &clock()).unwrap();

        // Notification deferred, health impact unchanged
        assert_eq!(assessment.linked_open_tasks, 1);
        assert_eq!(assessment.overdue_open_tasks, 1);
        assert_eq!(assessment.score, 40);
    }

    #[test]
    fn test_dry_run_skips_write_back() {
        let mut store = store_with_items(&[("task-1", Some("2026-02-01T00:00:00.000Z"))]);
        let config = EngineConfig {
            dry_run: true,
            ..config()
        };

        recompute_entity(&mut store, "client-1", &config, &clock()).unwrap();

        let entity = store.get_entity("client-1").unwrap().unwrap();
        assert!(entity.scored_at.is_none());
    }

    #[test]
    fn test_unknown_entity() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let err = recompute_entity(&mut store, "ghost", &config(), &clock()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }

    #[test]
    fn test_recompute_all_counts_active_only() {
        let mut store = store_with_items(&[]);
        let mut inactive = Entity::new("client-2", "Gone");
        inactive.active = false;
        store.put_entity(inactive).unwrap();

        let scored = recompute_all(&mut store, &config(), &clock()).unwrap();
        assert_eq!(scored, 1);
    }
}
