//! User actions on inbox records
//!
//! Each action is a synchronous single-record transaction gated by the
//! record's current state and suppression flag. An illegal action fails
//! atomically with no partial field update; the guarded store write
//! rejects writers racing on the same record.

use crate::{EngineConfig, EngineError};
use pulse_domain::clock::{local_midnight_offset_days, Clock};
use pulse_domain::traits::{IssueStore, StateGuard};
use pulse_domain::{InboxRecord, IssueAction, IssueState, RecordId, SnoozeKind};

fn load_record<S>(store: &S, id: RecordId) -> Result<InboxRecord, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    store
        .get_record(id)
        .map_err(EngineError::store)?
        .ok_or_else(|| EngineError::NotFound(format!("record {}", id)))
}

/// Reject the action unless it is in the record's available set
fn ensure_allowed(record: &InboxRecord, action: IssueAction) -> Result<(), EngineError> {
    if record.available_actions().contains(&action) {
        return Ok(());
    }
    let suffix = if record.suppressed { " (suppressed)" } else { "" };
    Err(EngineError::InvalidTransition(format!(
        "action '{}' not allowed for record {} in state '{}'{}",
        action, record.id, record.state, suffix
    )))
}

fn commit<S>(store: &mut S, updated: &InboxRecord, guard: StateGuard) -> Result<(), EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    store.update_record(updated, guard).map_err(EngineError::store)
}

/// Assign the record to an actor, entering `addressing`
///
/// Assignment implies acknowledgment; there is no separate acknowledged
/// state. Assigning a snoozed record wakes it.
pub fn assign<S>(
    store: &mut S,
    id: RecordId,
    actor: &str,
    clock: &dyn Clock,
) -> Result<InboxRecord, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let record = load_record(store, id)?;
    ensure_allowed(&record, IssueAction::Assign)?;

    let guard = StateGuard::of(&record);
    let now = clock.now_canonical();

    let mut updated = record;
    updated.state = IssueState::Addressing;
    updated.tagged_by = Some(actor.to_string());
    updated.tagged_at = Some(now.clone());
    updated.snoozed_until = None;
    updated.snooze_return_state = None;
    updated.actioned_at = Some(now.clone());
    updated.updated_at = now;

    commit(store, &updated, guard)?;
    tracing::info!(record = %updated.id, actor, "record assigned");
    Ok(updated)
}

/// Resolve the record, landing directly in `regression_watch`
///
/// `resolved_at` is stamped for audit even though `resolved` is never a
/// resting state: a state that persists for zero observable duration
/// would only add transition-log noise.
pub fn resolve<S>(store: &mut S, id: RecordId, clock: &dyn Clock) -> Result<InboxRecord, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let record = load_record(store, id)?;
    ensure_allowed(&record, IssueAction::Resolve)?;

    let guard = StateGuard::of(&record);
    let now = clock.now_canonical();

    let mut updated = record;
    updated.state = IssueState::RegressionWatch;
    updated.resolved_at = Some(now.clone());
    updated.snoozed_until = None;
    updated.snooze_return_state = None;
    updated.actioned_at = Some(now.clone());
    updated.updated_at = now;

    commit(store, &updated, guard)?;
    tracing::info!(record = %updated.id, "record resolved, watching for regression");
    Ok(updated)
}

/// Snooze the record for N local calendar days
///
/// The horizon is local midnight of (today + N days) in the
/// organization's configured timezone, not `now + N*24h`. A reminder
/// snooze defers the notification only; a problem snooze moves the record
/// to `snoozed` and suspends its health penalty until expiry.
pub fn snooze<S>(
    store: &mut S,
    id: RecordId,
    kind: SnoozeKind,
    days: u32,
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Result<InboxRecord, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let record = load_record(store, id)?;
    let action = match kind {
        SnoozeKind::Reminder => IssueAction::SnoozeReminder,
        SnoozeKind::Problem => IssueAction::SnoozeProblem,
    };
    ensure_allowed(&record, action)?;

    let guard = StateGuard::of(&record);
    let now = clock.now_canonical();
    let horizon = local_midnight_offset_days(clock.now(), config.utc_offset_minutes, i64::from(days))
        .map_err(EngineError::Config)?;

    let mut updated = record;
    match kind {
        SnoozeKind::Reminder => {
            updated.remind_after = Some(horizon);
        }
        SnoozeKind::Problem => {
            updated.snooze_return_state = Some(updated.state);
            updated.state = IssueState::Snoozed;
            updated.snoozed_until = Some(horizon);
        }
    }
    updated.actioned_at = Some(now.clone());
    updated.updated_at = now;

    commit(store, &updated, guard)?;
    tracing::info!(record = %updated.id, kind = kind.as_str(), days, "record snoozed");
    Ok(updated)
}

/// Set the suppression flag
///
/// Suppression is orthogonal to the lifecycle state: the record's `state`
/// is unchanged, but it drops out of health scoring and default counts
/// until unsuppressed.
pub fn suppress<S>(store: &mut S, id: RecordId, clock: &dyn Clock) -> Result<InboxRecord, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let record = load_record(store, id)?;
    ensure_allowed(&record, IssueAction::Suppress)?;

    let guard = StateGuard::of(&record);
    let now = clock.now_canonical();

    let mut updated = record;
    updated.suppressed = true;
    updated.actioned_at = Some(now.clone());
    updated.updated_at = now;

    commit(store, &updated, guard)?;
    tracing::info!(record = %updated.id, "record suppressed");
    Ok(updated)
}

/// Clear the suppression flag
pub fn unsuppress<S>(
    store: &mut S,
    id: RecordId,
    clock: &dyn Clock,
) -> Result<InboxRecord, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let record = load_record(store, id)?;
    ensure_allowed(&record, IssueAction::Unsuppress)?;

    let guard = StateGuard::of(&record);
    let now = clock.now_canonical();

    let mut updated = record;
    updated.suppressed = false;
    updated.actioned_at = Some(now.clone());
    updated.updated_at = now;

    commit(store, &updated, guard)?;
    tracing::info!(record = %updated.id, "record unsuppressed");
    Ok(updated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulse_domain::clock::FixedClock;
    use pulse_domain::traits::{CandidateIssue, UpsertOutcome};
    use pulse_domain::{Entity, Evidence, IssueKey, SourceIdentity, SourceSystem};
    use pulse_store::SqliteStore;

    const NOW: &str = "2026-02-08T11:00:00.000Z";

    fn clock() -> FixedClock {
        FixedClock::at(NOW).unwrap()
    }

    fn store_with_record() -> (SqliteStore, RecordId) {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.put_entity(Entity::new("client-1", "Acme")).unwrap();

        let candidate = CandidateIssue {
            key: IssueKey::new("overdue_invoice", "client-1", "rec_9f3"),
            entity_id: "client-1".to_string(),
            subject_identity: SourceIdentity::new(SourceSystem::Invoicing, "rec_9f3"),
            evidence: Evidence::new(SourceSystem::Invoicing, "rec_9f3", NOW),
        };
        let id = match store.upsert_candidate(&candidate, NOW).unwrap() {
            UpsertOutcome::Created(id) => id,
            other => panic!("expected Created, got {:?}", other),
        };
        (store, id)
    }

    #[test]
    fn test_assign_enters_addressing() {
        let (mut store, id) = store_with_record();
        let updated = assign(&mut store, id, "alice", &clock()).unwrap();

        assert_eq!(updated.state, IssueState::Addressing);
        assert_eq!(updated.tagged_by.as_deref(), Some("alice"));
        assert_eq!(updated.tagged_at.as_deref(), Some(NOW));
        assert_eq!(updated.actioned_at.as_deref(), Some(NOW));
    }

    #[test]
    fn test_assign_twice_rejected() {
        let (mut store, id) = store_with_record();
        assign(&mut store, id, "alice", &clock()).unwrap();

        let err = assign(&mut store, id, "bob", &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        assert_eq!(err.kind(), "invalid_transition");
    }

    #[test]
    fn test_resolve_skips_resolved_state() {
        let (mut store, id) = store_with_record();
        let updated = resolve(&mut store, id, &clock()).unwrap();

        // Directly regression_watch; resolved_at stamped for audit
        assert_eq!(updated.state, IssueState::RegressionWatch);
        assert_eq!(updated.resolved_at.as_deref(), Some(NOW));

        let reloaded = store.get_record(id).unwrap().unwrap();
        assert_eq!(reloaded.state, IssueState::RegressionWatch);
    }

    #[test]
    fn test_problem_snooze_local_midnight_utc_plus_4() {
        let (mut store, id) = store_with_record();
        let config = EngineConfig {
            utc_offset_minutes: 240,
            ..Default::default()
        };

        // Snooze(7 days) issued 2026-02-08 15:00 local in a UTC+4 org
        let updated =
            snooze(&mut store, id, SnoozeKind::Problem, 7, &config, &clock()).unwrap();

        assert_eq!(updated.state, IssueState::Snoozed);
        assert_eq!(
            updated.snoozed_until.as_deref(),
            Some("2026-02-14T20:00:00.000Z")
        );
        assert_eq!(updated.snooze_return_state, Some(IssueState::Proposed));
    }

    #[test]
    fn test_reminder_snooze_leaves_state_unchanged() {
        let (mut store, id) = store_with_record();
        let config = EngineConfig::default();

        let updated =
            snooze(&mut store, id, SnoozeKind::Reminder, 2, &config, &clock()).unwrap();

        assert_eq!(updated.state, IssueState::Proposed);
        assert!(updated.snoozed_until.is_none());
        assert_eq!(
            updated.remind_after.as_deref(),
            Some("2026-02-10T00:00:00.000Z")
        );
        // Health penalty unchanged: the record is not penalty-suspended
        assert!(!updated.penalty_suspended());
    }

    #[test]
    fn test_problem_snooze_records_return_state() {
        let (mut store, id) = store_with_record();
        let config = EngineConfig::default();

        assign(&mut store, id, "alice", &clock()).unwrap();
        let updated =
            snooze(&mut store, id, SnoozeKind::Problem, 1, &config, &clock()).unwrap();

        assert_eq!(updated.snooze_return_state, Some(IssueState::Addressing));
    }

    #[test]
    fn test_assign_wakes_snoozed_record() {
        let (mut store, id) = store_with_record();
        let config = EngineConfig::default();

        snooze(&mut store, id, SnoozeKind::Problem, 7, &config, &clock()).unwrap();
        let updated = assign(&mut store, id, "alice", &clock()).unwrap();

        assert_eq!(updated.state, IssueState::Addressing);
        assert!(updated.snoozed_until.is_none());
        assert!(updated.snooze_return_state.is_none());
    }

    #[test]
    fn test_suppressed_gates_everything_but_unsuppress() {
        let (mut store, id) = store_with_record();
        let config = EngineConfig::default();

        let updated = suppress(&mut store, id, &clock()).unwrap();
        assert!(updated.suppressed);
        // Lifecycle state unchanged by suppression
        assert_eq!(updated.state, IssueState::Proposed);
        assert_eq!(updated.available_actions(), vec![IssueAction::Unsuppress]);

        for result in [
            assign(&mut store, id, "alice", &clock()),
            resolve(&mut store, id, &clock()),
            snooze(&mut store, id, SnoozeKind::Problem, 1, &config, &clock()),
            snooze(&mut store, id, SnoozeKind::Reminder, 1, &config, &clock()),
            suppress(&mut store, id, &clock()),
        ] {
            let err = result.unwrap_err();
            assert!(matches!(err, EngineError::InvalidTransition(_)));
        }

        // The record is untouched by the rejected actions
        let reloaded = store.get_record(id).unwrap().unwrap();
        assert_eq!(reloaded.state, IssueState::Proposed);
        assert!(reloaded.suppressed);

        let unsuppressed = unsuppress(&mut store, id, &clock()).unwrap();
        assert!(!unsuppressed.suppressed);
        assert_eq!(unsuppressed.state, IssueState::Proposed);
    }

    #[test]
    fn test_unsuppress_requires_suppressed() {
        let (mut store, id) = store_with_record();
        let err = unsuppress(&mut store, id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn test_resolve_from_regression_watch_rejected() {
        let (mut store, id) = store_with_record();
        resolve(&mut store, id, &clock()).unwrap();

        let err = resolve(&mut store, id, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn test_unknown_record() {
        let mut store = SqliteStore::new(":memory:").unwrap();
        let err = assign(&mut store, RecordId::new(), "alice", &clock()).unwrap_err();
        assert!(matches!(err, EngineError::NotFound(_)));
    }
}
