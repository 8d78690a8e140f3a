//! Pulse Storage Layer
//!
//! Implements the IssueStore trait using SQLite.
//!
//! # Architecture
//!
//! - SQLite for entities, normalized inputs, inbox records, and evidence
//! - A partial unique index over the active states enforces at most one
//!   inbox record per underlying issue key
//! - The dedupe gate's conditional upsert runs as a single IMMEDIATE
//!   transaction, so concurrent gate invocations on the same key converge
//!   to one record
//!
//! # Thread Safety
//!
//! SQLite connections are not thread-safe. Each thread should have its own
//! SqliteStore instance; WAL mode and a busy timeout serialize writers on
//! the same database file.

#![warn(missing_docs)]

use pulse_domain::traits::{CandidateIssue, IssueStore, StateGuard, UpsertOutcome};
use pulse_domain::{
    Entity, Evidence, InboxRecord, Invoice, IssueKey, IssueState, RecordId, SourceIdentity,
    SourceSystem, Thread, WorkItem,
};
use pulse_domain::health::HealthAssessment;
use pulse_domain::query::{InboxCounts, InboxQuery};
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid data format
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Guarded update lost to a concurrent writer
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// SQL predicate matching the active lifecycle states
const ACTIVE_STATES_SQL: &str =
    "state IN ('proposed', 'addressing', 'snoozed', 'regression_watch')";

const RECORD_COLUMNS: &str = "id, underlying_issue_id, entity_id, state, suppressed, \
     subject_source, subject_source_id, tagged_by, tagged_at, snoozed_until, \
     snooze_return_state, remind_after, resolved_at, actioned_at, created_at, updated_at";

/// SQLite-based implementation of IssueStore
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Create a new SqliteStore with the given database path
    ///
    /// Use `:memory:` for an in-memory database (useful for testing).
    pub fn new<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::configure(&conn)?;
        let mut store = Self { conn };
        store.initialize_schema()?;
        Ok(store)
    }

    fn configure(conn: &Connection) -> Result<(), StoreError> {
        // journal_mode returns a row, so it cannot go through execute
        let _mode: String = conn.query_row("PRAGMA journal_mode=WAL", [], |row| row.get(0))?;
        conn.busy_timeout(Duration::from_secs(5))?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        Ok(())
    }

    /// Initialize the database schema
    fn initialize_schema(&mut self) -> Result<(), StoreError> {
        let schema = include_str!("schema.sql");
        self.conn.execute_batch(schema)?;
        Ok(())
    }

    fn query_records(
        &self,
        sql: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<InboxRecord>, StoreError> {
        let mut stmt = self.conn.prepare(sql)?;
        let records = stmt
            .query_map(params, record_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }
}

/// Map a rusqlite conversion failure onto a column index
fn conv(idx: usize, msg: impl Into<String>) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        idx,
        rusqlite::types::Type::Text,
        Box::new(StoreError::InvalidData(msg.into())),
    )
}

fn record_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<InboxRecord> {
    let id_str: String = row.get(0)?;
    let id = RecordId::from_string(&id_str).map_err(|e| conv(0, e))?;

    let key: String = row.get(1)?;

    let state_str: String = row.get(3)?;
    let state = IssueState::parse(&state_str)
        .ok_or_else(|| conv(3, format!("unknown state '{}'", state_str)))?;

    let source_str: String = row.get(5)?;
    let source = SourceSystem::parse(&source_str)
        .ok_or_else(|| conv(5, format!("unknown source system '{}'", source_str)))?;

    let return_state_str: Option<String> = row.get(10)?;
    let snooze_return_state = match return_state_str {
        Some(s) => Some(
            IssueState::parse(&s)
                .ok_or_else(|| conv(10, format!("unknown return state '{}'", s)))?,
        ),
        None => None,
    };

    Ok(InboxRecord {
        id,
        underlying_issue_id: IssueKey::from_raw(key),
        entity_id: row.get(2)?,
        state,
        suppressed: row.get(4)?,
        subject_identity: SourceIdentity {
            source,
            source_id: row.get(6)?,
        },
        tagged_by: row.get(7)?,
        tagged_at: row.get(8)?,
        snoozed_until: row.get(9)?,
        snooze_return_state,
        remind_after: row.get(11)?,
        resolved_at: row.get(12)?,
        actioned_at: row.get(13)?,
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

fn evidence_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Evidence> {
    let source_str: String = row.get(0)?;
    let source = SourceSystem::parse(&source_str)
        .ok_or_else(|| conv(0, format!("unknown source system '{}'", source_str)))?;

    let detail_str: Option<String> = row.get(4)?;
    let detail = match detail_str {
        Some(s) => Some(
            serde_json::from_str(&s)
                .map_err(|e| conv(4, format!("invalid evidence detail: {}", e)))?,
        ),
        None => None,
    };

    Ok(Evidence {
        source,
        source_id: row.get(1)?,
        url: row.get(2)?,
        captured_at: row.get(3)?,
        detail,
    })
}

fn insert_evidence(
    conn: &Connection,
    record_id: RecordId,
    evidence: &Evidence,
) -> Result<(), StoreError> {
    let detail = evidence
        .detail
        .as_ref()
        .map(|v| serde_json::to_string(v))
        .transpose()
        .map_err(|e| StoreError::InvalidData(format!("evidence detail: {}", e)))?;

    // Invoicing evidence never stores a url
    let url = if evidence.source == SourceSystem::Invoicing {
        None
    } else {
        evidence.url.clone()
    };

    conn.execute(
        "INSERT INTO evidence (record_id, source, source_id, url, captured_at, detail)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            record_id.to_string(),
            evidence.source.as_str(),
            evidence.source_id,
            url,
            evidence.captured_at,
            detail,
        ],
    )?;
    Ok(())
}

fn insert_record(conn: &Connection, record: &InboxRecord) -> Result<(), StoreError> {
    conn.execute(
        "INSERT INTO inbox_records (id, underlying_issue_id, entity_id, state, suppressed,
             subject_source, subject_source_id, tagged_by, tagged_at, snoozed_until,
             snooze_return_state, remind_after, resolved_at, actioned_at, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)",
        params![
            record.id.to_string(),
            record.underlying_issue_id.as_str(),
            record.entity_id,
            record.state.as_str(),
            record.suppressed,
            record.subject_identity.source.as_str(),
            record.subject_identity.source_id,
            record.tagged_by,
            record.tagged_at,
            record.snoozed_until,
            record.snooze_return_state.map(|s| s.as_str()),
            record.remind_after,
            record.resolved_at,
            record.actioned_at,
            record.created_at,
            record.updated_at,
        ],
    )?;
    Ok(())
}

impl IssueStore for SqliteStore {
    type Error = StoreError;

    fn put_entity(&mut self, entity: Entity) -> Result<(), Self::Error> {
        // Normalization may re-run; health columns are derived and must
        // survive the upsert untouched.
        self.conn.execute(
            "INSERT INTO entities (id, name, active, health_score, health_reason, scored_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)
             ON CONFLICT(id) DO UPDATE SET name = excluded.name, active = excluded.active",
            params![
                entity.id,
                entity.name,
                entity.active,
                entity.health_score,
                entity.health_reason,
                entity.scored_at,
            ],
        )?;
        Ok(())
    }

    fn get_entity(&self, id: &str) -> Result<Option<Entity>, Self::Error> {
        let entity = self
            .conn
            .query_row(
                "SELECT id, name, active, health_score, health_reason, scored_at
                 FROM entities WHERE id = ?1",
                params![id],
                |row| {
                    Ok(Entity {
                        id: row.get(0)?,
                        name: row.get(1)?,
                        active: row.get(2)?,
                        health_score: row.get(3)?,
                        health_reason: row.get(4)?,
                        scored_at: row.get(5)?,
                    })
                },
            )
            .optional()?;
        Ok(entity)
    }

    fn list_entities(&self) -> Result<Vec<Entity>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, active, health_score, health_reason, scored_at
             FROM entities ORDER BY id",
        )?;
        let entities = stmt
            .query_map([], |row| {
                Ok(Entity {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    active: row.get(2)?,
                    health_score: row.get(3)?,
                    health_reason: row.get(4)?,
                    scored_at: row.get(5)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(entities)
    }

    fn write_health(
        &mut self,
        entity_id: &str,
        assessment: &HealthAssessment,
        scored_at: &str,
    ) -> Result<(), Self::Error> {
        let rows = self.conn.execute(
            "UPDATE entities SET health_score = ?2, health_reason = ?3, scored_at = ?4
             WHERE id = ?1",
            params![entity_id, assessment.score, assessment.reason, scored_at],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("entity {}", entity_id)));
        }
        Ok(())
    }

    fn put_work_item(&mut self, item: WorkItem) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO work_items (id, entity_id, title, due_at, open)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![item.id, item.entity_id, item.title, item.due_at, item.open],
        )?;
        Ok(())
    }

    fn work_items_for(&self, entity_id: &str) -> Result<Vec<WorkItem>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_id, title, due_at, open FROM work_items
             WHERE entity_id = ?1 ORDER BY id",
        )?;
        let items = stmt
            .query_map(params![entity_id], |row| {
                Ok(WorkItem {
                    id: row.get(0)?,
                    entity_id: row.get(1)?,
                    title: row.get(2)?,
                    due_at: row.get(3)?,
                    open: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(items)
    }

    fn put_invoice(&mut self, invoice: Invoice) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO invoices (record_id, number, entity_id, due_at, paid)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                invoice.record_id,
                invoice.number,
                invoice.entity_id,
                invoice.due_at,
                invoice.paid,
            ],
        )?;
        Ok(())
    }

    fn invoices_for(&self, entity_id: &str) -> Result<Vec<Invoice>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT record_id, number, entity_id, due_at, paid FROM invoices
             WHERE entity_id = ?1 ORDER BY record_id",
        )?;
        let invoices = stmt
            .query_map(params![entity_id], |row| {
                Ok(Invoice {
                    record_id: row.get(0)?,
                    number: row.get(1)?,
                    entity_id: row.get(2)?,
                    due_at: row.get(3)?,
                    paid: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(invoices)
    }

    fn put_thread(&mut self, thread: Thread) -> Result<(), Self::Error> {
        self.conn.execute(
            "INSERT OR REPLACE INTO threads
                 (id, entity_id, subject, last_inbound_at, last_outbound_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                thread.id,
                thread.entity_id,
                thread.subject,
                thread.last_inbound_at,
                thread.last_outbound_at,
            ],
        )?;
        Ok(())
    }

    fn threads_for(&self, entity_id: &str) -> Result<Vec<Thread>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT id, entity_id, subject, last_inbound_at, last_outbound_at FROM threads
             WHERE entity_id = ?1 ORDER BY id",
        )?;
        let threads = stmt
            .query_map(params![entity_id], |row| {
                Ok(Thread {
                    id: row.get(0)?,
                    entity_id: row.get(1)?,
                    subject: row.get(2)?,
                    last_inbound_at: row.get(3)?,
                    last_outbound_at: row.get(4)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(threads)
    }

    fn upsert_candidate(
        &mut self,
        candidate: &CandidateIssue,
        now: &str,
    ) -> Result<UpsertOutcome, Self::Error> {
        // IMMEDIATE takes the write lock up front, so lookup-then-write is
        // race-free across connections; the partial unique index is the
        // backstop.
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let existing: Option<(String, String, String)> = tx
            .query_row(
                &format!(
                    "SELECT id, subject_source, subject_source_id FROM inbox_records
                     WHERE underlying_issue_id = ?1 AND {}",
                    ACTIVE_STATES_SQL
                ),
                params![candidate.key.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        let outcome = match existing {
            Some((id_str, source, source_id)) => {
                let existing_id =
                    RecordId::from_string(&id_str).map_err(StoreError::InvalidData)?;

                if source != candidate.subject_identity.source.as_str()
                    || source_id != candidate.subject_identity.source_id
                {
                    // Same key, different real-world record: refuse without
                    // writing (dropping the transaction rolls back).
                    return Ok(UpsertOutcome::IdentityConflict {
                        existing: existing_id,
                    });
                }

                insert_evidence(&tx, existing_id, &candidate.evidence)?;
                tx.execute(
                    "UPDATE inbox_records SET updated_at = ?2 WHERE id = ?1",
                    params![id_str, now],
                )?;
                UpsertOutcome::Merged(existing_id)
            }
            None => {
                let record = InboxRecord::proposed(
                    candidate.key.clone(),
                    candidate.entity_id.clone(),
                    candidate.subject_identity.clone(),
                    now,
                );
                insert_record(&tx, &record)?;
                insert_evidence(&tx, record.id, &candidate.evidence)?;
                UpsertOutcome::Created(record.id)
            }
        };

        tx.commit()?;
        Ok(outcome)
    }

    fn get_record(&self, id: RecordId) -> Result<Option<InboxRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM inbox_records WHERE id = ?1",
                    RECORD_COLUMNS
                ),
                params![id.to_string()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn find_active(&self, key: &IssueKey) -> Result<Option<InboxRecord>, Self::Error> {
        let record = self
            .conn
            .query_row(
                &format!(
                    "SELECT {} FROM inbox_records WHERE underlying_issue_id = ?1 AND {}",
                    RECORD_COLUMNS, ACTIVE_STATES_SQL
                ),
                params![key.as_str()],
                record_from_row,
            )
            .optional()?;
        Ok(record)
    }

    fn update_record(
        &mut self,
        updated: &InboxRecord,
        guard: StateGuard,
    ) -> Result<(), Self::Error> {
        let rows = self.conn.execute(
            "UPDATE inbox_records SET state = ?2, suppressed = ?3, tagged_by = ?4,
                 tagged_at = ?5, snoozed_until = ?6, snooze_return_state = ?7,
                 remind_after = ?8, resolved_at = ?9, actioned_at = ?10, updated_at = ?11
             WHERE id = ?1 AND state = ?12 AND suppressed = ?13",
            params![
                updated.id.to_string(),
                updated.state.as_str(),
                updated.suppressed,
                updated.tagged_by,
                updated.tagged_at,
                updated.snoozed_until,
                updated.snooze_return_state.map(|s| s.as_str()),
                updated.remind_after,
                updated.resolved_at,
                updated.actioned_at,
                updated.updated_at,
                guard.state.as_str(),
                guard.suppressed,
            ],
        )?;

        if rows == 0 {
            return if self.get_record(updated.id)?.is_none() {
                Err(StoreError::NotFound(format!("record {}", updated.id)))
            } else {
                Err(StoreError::Conflict(format!(
                    "record {} no longer matches guard {}/{}",
                    updated.id,
                    guard.state.as_str(),
                    guard.suppressed,
                )))
            };
        }
        Ok(())
    }

    fn append_evidence(
        &mut self,
        id: RecordId,
        evidence: &Evidence,
        now: &str,
    ) -> Result<(), Self::Error> {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let rows = tx.execute(
            "UPDATE inbox_records SET updated_at = ?2 WHERE id = ?1",
            params![id.to_string(), now],
        )?;
        if rows == 0 {
            return Err(StoreError::NotFound(format!("record {}", id)));
        }
        insert_evidence(&tx, id, evidence)?;
        tx.commit()?;
        Ok(())
    }

    fn evidence_for(&self, id: RecordId) -> Result<Vec<Evidence>, Self::Error> {
        let mut stmt = self.conn.prepare(
            "SELECT source, source_id, url, captured_at, detail FROM evidence
             WHERE record_id = ?1 ORDER BY seq",
        )?;
        let evidence = stmt
            .query_map(params![id.to_string()], evidence_from_row)?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(evidence)
    }

    fn list_records(
        &self,
        query: &InboxQuery,
        now: &str,
    ) -> Result<Vec<InboxRecord>, Self::Error> {
        let mut sql = format!("SELECT {} FROM inbox_records WHERE 1=1", RECORD_COLUMNS);
        let mut params: Vec<Box<dyn rusqlite::ToSql>> = Vec::new();

        if let Some(state) = query.state {
            sql.push_str(" AND state = ?");
            params.push(Box::new(state.as_str()));
        }

        if let Some(entity_id) = &query.entity_id {
            sql.push_str(" AND entity_id = ?");
            params.push(Box::new(entity_id.clone()));
        }

        if !query.include_suppressed {
            sql.push_str(" AND suppressed = 0");
        }

        if !query.include_reminder_hidden {
            sql.push_str(" AND (remind_after IS NULL OR remind_after <= ?)");
            params.push(Box::new(now.to_string()));
        }

        sql.push_str(" ORDER BY updated_at DESC, id");

        if let Some(limit) = query.limit {
            sql.push_str(" LIMIT ?");
            params.push(Box::new(limit as i64));
        }

        let param_refs: Vec<&dyn rusqlite::ToSql> = params.iter().map(|p| p.as_ref()).collect();
        self.query_records(&sql, &param_refs)
    }

    fn counts(&self) -> Result<InboxCounts, Self::Error> {
        let mut stmt = self
            .conn
            .prepare("SELECT state, suppressed, COUNT(*) FROM inbox_records GROUP BY state, suppressed")?;
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, bool>(1)?,
                row.get::<_, i64>(2)?,
            ))
        })?;

        let mut counts = InboxCounts::default();
        for row in rows {
            let (state_str, suppressed, n) = row?;
            let n = n as usize;

            if suppressed {
                counts.suppressed += n;
                continue;
            }
            counts.total += n;

            match IssueState::parse(&state_str) {
                Some(IssueState::Proposed) => counts.unprocessed += n,
                Some(IssueState::Addressing) => counts.addressing += n,
                Some(IssueState::Snoozed) => counts.snoozed += n,
                Some(IssueState::RegressionWatch) => counts.watching += n,
                None => {
                    return Err(StoreError::InvalidData(format!(
                        "unknown state '{}' in counts",
                        state_str
                    )))
                }
            }
        }
        Ok(counts)
    }

    fn due_snoozes(&self, now: &str) -> Result<Vec<InboxRecord>, Self::Error> {
        self.query_records(
            &format!(
                "SELECT {} FROM inbox_records
                 WHERE state = 'snoozed' AND snoozed_until IS NOT NULL AND snoozed_until <= ?1
                 ORDER BY snoozed_until",
                RECORD_COLUMNS
            ),
            &[&now],
        )
    }

    fn elapsed_reminders(&self, now: &str) -> Result<Vec<InboxRecord>, Self::Error> {
        self.query_records(
            &format!(
                "SELECT {} FROM inbox_records
                 WHERE remind_after IS NOT NULL AND remind_after <= ?1
                 ORDER BY remind_after",
                RECORD_COLUMNS
            ),
            &[&now],
        )
    }

    fn recently_actioned(&self, cutoff: &str) -> Result<Vec<InboxRecord>, Self::Error> {
        self.query_records(
            &format!(
                "SELECT {} FROM inbox_records
                 WHERE actioned_at IS NOT NULL AND actioned_at >= ?1
                 ORDER BY actioned_at DESC",
                RECORD_COLUMNS
            ),
            &[&cutoff],
        )
    }

    fn active_records(&self) -> Result<Vec<InboxRecord>, Self::Error> {
        self.query_records(
            &format!(
                "SELECT {} FROM inbox_records WHERE {} ORDER BY created_at",
                RECORD_COLUMNS, ACTIVE_STATES_SQL
            ),
            &[],
        )
    }
}
