//! Read-side views over the inbox
//!
//! Thin validation and policy layer between the presentation surface and
//! the store's projections. Every view computes `available_actions` with
//! the same domain function the action endpoints gate on.

use crate::{EngineConfig, EngineError};
use pulse_domain::clock::{local_midnight_offset_days, Clock};
use pulse_domain::query::{parse_state_filter, InboxCounts, InboxQuery};
use pulse_domain::traits::IssueStore;
use pulse_domain::InboxRecord;

/// List inbox records, validating the raw state filter
///
/// An omitted filter means all states; the explicit literal `"all"` is
/// rejected with `invalid_state`.
pub fn list_inbox<S>(
    store: &S,
    raw_state: Option<&str>,
    entity_id: Option<String>,
    include_suppressed: bool,
    clock: &dyn Clock,
) -> Result<Vec<InboxRecord>, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let state = parse_state_filter(raw_state).map_err(EngineError::InvalidState)?;

    let query = InboxQuery {
        state,
        entity_id,
        include_suppressed,
        include_reminder_hidden: false,
        limit: None,
    };

    store
        .list_records(&query, &clock.now_canonical())
        .map_err(EngineError::store)
}

/// Inbox counts
pub fn inbox_counts<S>(store: &S) -> Result<InboxCounts, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    store.counts().map_err(EngineError::store)
}

/// Records a user acted on within the configured lookback window
///
/// The window is measured from local midnight in the organization's
/// configured timezone, not UTC calendar days.
pub fn recently_actioned<S>(
    store: &S,
    config: &EngineConfig,
    clock: &dyn Clock,
) -> Result<Vec<InboxRecord>, EngineError>
where
    S: IssueStore,
    S::Error: std::fmt::Display,
{
    let cutoff = local_midnight_offset_days(
        clock.now(),
        config.utc_offset_minutes,
        -i64::from(config.recent_window_days),
    )
    .map_err(EngineError::Config)?;

    store.recently_actioned(&cutoff).map_err(EngineError::store)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::actions;
    use pulse_domain::clock::FixedClock;
    use pulse_domain::traits::{CandidateIssue, UpsertOutcome};
    use pulse_domain::{Entity, Evidence, IssueKey, RecordId, SourceIdentity, SourceSystem};
    use pulse_store::SqliteStore;

    const NOW: &str = "2026-02-08T11:00:00.000Z";

    fn clock() -> FixedClock {
        FixedClock::at(NOW).unwrap()
    }

    fn store_with_records(n: usize) -> (SqliteStore, Vec<RecordId>) {
        let mut store = SqliteStore::new(":memory:").unwrap();
        store.put_entity(Entity::new("client-1", "Acme")).unwrap();

        let ids = (0..n)
            .map(|i| {
                let record_id = format!("rec_{}", i);
                let candidate = CandidateIssue {
                    key: IssueKey::new("overdue_invoice", "client-1", &record_id),
                    entity_id: "client-1".to_string(),
                    subject_identity: SourceIdentity::new(SourceSystem::Invoicing, &record_id),
                    evidence: Evidence::new(SourceSystem::Invoicing, &record_id, NOW),
                };
                match store.upsert_candidate(&candidate, NOW).unwrap() {
                    UpsertOutcome::Created(id) => id,
                    other => panic!("expected Created, got {:?}", other),
                }
            })
            .collect();
        (store, ids)
    }

    #[test]
    fn test_omitted_filter_returns_all_states() {
        let (mut store, ids) = store_with_records(2);
        actions::resolve(&mut store, ids[0], &clock()).unwrap();

        let records = list_inbox(&store, None, None, false, &clock()).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_literal_all_rejected() {
        let (store, _) = store_with_records(1);
        let err = list_inbox(&store, Some("all"), None, false, &clock()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidState(_)));
        assert_eq!(err.kind(), "invalid_state");
    }

    #[test]
    fn test_state_filter_narrows() {
        let (mut store, ids) = store_with_records(3);
        actions::assign(&mut store, ids[0], "alice", &clock()).unwrap();

        let proposed = list_inbox(&store, Some("proposed"), None, false, &clock()).unwrap();
        assert_eq!(proposed.len(), 2);

        let addressing = list_inbox(&store, Some("addressing"), None, false, &clock()).unwrap();
        assert_eq!(addressing.len(), 1);
    }

    #[test]
    fn test_counts_reflect_actions() {
        let (mut store, ids) = store_with_records(3);
        actions::assign(&mut store, ids[0], "alice", &clock()).unwrap();
        actions::suppress(&mut store, ids[1], &clock()).unwrap();

        let counts = inbox_counts(&store).unwrap();
        assert_eq!(counts.unprocessed, 1);
        assert_eq!(counts.addressing, 1);
        assert_eq!(counts.suppressed, 1);
        assert_eq!(counts.total, 2);
    }

    #[test]
    fn test_recently_actioned_local_window() {
        let (mut store, ids) = store_with_records(2);
        actions::assign(&mut store, ids[0], "alice", &clock()).unwrap();

        let config = EngineConfig::default();
        let recent = recently_actioned(&store, &config, &clock()).unwrap();
        assert_eq!(recent.len(), 1);
        assert_eq!(recent[0].id, ids[0]);

        // A week-plus later the action ages out of the window
        let later = FixedClock::at("2026-02-20T11:00:00.000Z").unwrap();
        let recent = recently_actioned(&store, &config, &later).unwrap();
        assert!(recent.is_empty());
    }

    #[test]
    fn test_views_share_available_actions() {
        let (mut store, ids) = store_with_records(1);
        actions::suppress(&mut store, ids[0], &clock()).unwrap();

        let records = list_inbox(&store, None, None, true, &clock()).unwrap();
        assert_eq!(
            records[0].available_actions(),
            vec![pulse_domain::IssueAction::Unsuppress]
        );
    }
}
