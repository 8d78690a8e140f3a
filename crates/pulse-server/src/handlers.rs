//! HTTP request handlers for the inbox surface.
//!
//! Read views (list, counts, recently actioned) and action endpoints
//! (assign, resolve, snooze, suppress, unsuppress) over the engine,
//! using axum.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router as AxumRouter,
};
use pulse_domain::clock::SystemClock;
use pulse_domain::query::InboxCounts;
use pulse_domain::traits::IssueStore;
use pulse_domain::{Evidence, InboxRecord, IssueAction, RecordId, SnoozeKind};
use pulse_engine::{actions, view, EngineConfig, EngineError};
use pulse_store::SqliteStore;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, PoisonError};

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// Store handle; handlers take the lock only for synchronous calls
    pub store: Arc<Mutex<SqliteStore>>,
    /// Engine policy threaded into every action call
    pub config: EngineConfig,
}

/// Error response body with a stable machine-readable kind
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error taxonomy discriminator
    pub kind: String,
    /// Human-readable message
    pub error: String,
}

/// Application error wrapper mapping the engine taxonomy to HTTP statuses
#[derive(Debug)]
pub struct AppError(pub EngineError);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            EngineError::InvalidState(_) => StatusCode::BAD_REQUEST,
            EngineError::InvalidTransition(_) => StatusCode::CONFLICT,
            EngineError::InvalidEvidence(_) => StatusCode::UNPROCESSABLE_ENTITY,
            EngineError::IdentityConflict(_) => StatusCode::CONFLICT,
            EngineError::NotFound(_) => StatusCode::NOT_FOUND,
            EngineError::Config(_) | EngineError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(ErrorResponse {
            kind: self.0.kind().to_string(),
            error: self.0.to_string(),
        });
        (status, body).into_response()
    }
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError(e)
    }
}

/// One inbox record as served to clients
///
/// `available_actions` is computed with the same domain function the
/// action endpoints gate on; filtered and snapshot views serve the same
/// set, never a restricted subset.
#[derive(Debug, Serialize)]
pub struct RecordView {
    /// The record
    #[serde(flatten)]
    pub record: InboxRecord,

    /// Legal actions for the record's current state and suppression flag
    pub available_actions: Vec<IssueAction>,

    /// Evidence trail; present on single-record reads only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<Vec<Evidence>>,
}

impl RecordView {
    fn of(record: InboxRecord) -> Self {
        let available_actions = record.available_actions();
        Self {
            record,
            available_actions,
            evidence: None,
        }
    }

    fn with_evidence(record: InboxRecord, evidence: Vec<Evidence>) -> Self {
        let mut view = Self::of(record);
        view.evidence = Some(evidence);
        view
    }
}

/// Counts response
///
/// `unread` is a read-only legacy alias of `unprocessed`, kept for one
/// transition period.
#[derive(Debug, Serialize, Deserialize)]
pub struct CountsView {
    /// Proposed records awaiting a user
    pub unprocessed: usize,
    /// Records being addressed
    pub addressing: usize,
    /// Problem-snoozed records
    pub snoozed: usize,
    /// Regression-watch records
    pub watching: usize,
    /// Suppressed records
    pub suppressed: usize,
    /// All non-suppressed records
    pub total: usize,
    /// Legacy alias of `unprocessed`
    pub unread: usize,
}

impl From<InboxCounts> for CountsView {
    fn from(counts: InboxCounts) -> Self {
        Self {
            unprocessed: counts.unprocessed,
            addressing: counts.addressing,
            snoozed: counts.snoozed,
            watching: counts.watching,
            suppressed: counts.suppressed,
            total: counts.total,
            unread: counts.unprocessed,
        }
    }
}

/// Inbox list response
#[derive(Debug, Serialize)]
pub struct InboxListResponse {
    /// Matching records
    pub records: Vec<RecordView>,
    /// Counts across the whole inbox
    pub counts: CountsView,
}

/// Query parameters for the inbox list
#[derive(Debug, Deserialize)]
pub struct ListParams {
    /// State filter; omitted means all states, the literal "all" is rejected
    pub state: Option<String>,
    /// Entity filter
    pub entity_id: Option<String>,
    /// Include suppressed records
    #[serde(default)]
    pub include_suppressed: bool,
}

/// Assign request body
#[derive(Debug, Deserialize)]
pub struct AssignRequest {
    /// Who commits to act
    pub actor: String,
}

/// Snooze request body; the variant is always explicit
#[derive(Debug, Deserialize)]
pub struct SnoozeRequest {
    /// Reminder or problem snooze
    pub kind: SnoozeKind,
    /// Local calendar days until the horizon
    pub days: u32,
}

/// Entity health response
#[derive(Debug, Serialize, Deserialize)]
pub struct EntityHealthResponse {
    /// Entity id
    pub entity_id: String,
    /// Engagement health score, 0-100
    pub health_score: u8,
    /// Human-readable gating label
    pub health_reason: String,
    /// When the score was last recomputed
    pub scored_at: Option<String>,
}

fn lock_store(state: &AppState) -> std::sync::MutexGuard<'_, SqliteStore> {
    state.store.lock().unwrap_or_else(PoisonError::into_inner)
}

fn parse_record_id(raw: &str) -> Result<RecordId, AppError> {
    RecordId::from_string(raw)
        .map_err(|e| AppError(EngineError::InvalidState(e)))
}

/// GET /inbox - list records with counts
async fn list_inbox(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> Result<Json<InboxListResponse>, AppError> {
    let store = lock_store(&state);

    let records = view::list_inbox(
        &*store,
        params.state.as_deref(),
        params.entity_id,
        params.include_suppressed,
        &SystemClock,
    )?;
    let counts = view::inbox_counts(&*store)?;

    Ok(Json(InboxListResponse {
        records: records.into_iter().map(RecordView::of).collect(),
        counts: counts.into(),
    }))
}

/// GET /inbox/counts
async fn inbox_counts(State(state): State<AppState>) -> Result<Json<CountsView>, AppError> {
    let store = lock_store(&state);
    let counts = view::inbox_counts(&*store)?;
    Ok(Json(counts.into()))
}

/// GET /inbox/recent - records actioned within the lookback window
async fn recently_actioned(
    State(state): State<AppState>,
) -> Result<Json<Vec<RecordView>>, AppError> {
    let store = lock_store(&state);
    let records = view::recently_actioned(&*store, &state.config, &SystemClock)?;
    Ok(Json(records.into_iter().map(RecordView::of).collect()))
}

/// GET /inbox/:id - one record with its evidence trail
async fn get_record(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordView>, AppError> {
    let id = parse_record_id(&id)?;
    let store = lock_store(&state);

    let record = store
        .get_record(id)
        .map_err(|e| EngineError::Store(e.to_string()))?
        .ok_or_else(|| EngineError::NotFound(format!("record {}", id)))?;
    let evidence = store
        .evidence_for(id)
        .map_err(|e| EngineError::Store(e.to_string()))?;

    Ok(Json(RecordView::with_evidence(record, evidence)))
}

/// POST /inbox/:id/assign
async fn assign(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<AssignRequest>,
) -> Result<Json<RecordView>, AppError> {
    let id = parse_record_id(&id)?;
    let mut store = lock_store(&state);
    let record = actions::assign(&mut *store, id, &request.actor, &SystemClock)?;
    Ok(Json(RecordView::of(record)))
}

/// POST /inbox/:id/resolve
async fn resolve(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordView>, AppError> {
    let id = parse_record_id(&id)?;
    let mut store = lock_store(&state);
    let record = actions::resolve(&mut *store, id, &SystemClock)?;
    Ok(Json(RecordView::of(record)))
}

/// POST /inbox/:id/snooze
async fn snooze(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(request): Json<SnoozeRequest>,
) -> Result<Json<RecordView>, AppError> {
    let id = parse_record_id(&id)?;
    let mut store = lock_store(&state);
    let record = actions::snooze(
        &mut *store,
        id,
        request.kind,
        request.days,
        &state.config,
        &SystemClock,
    )?;
    Ok(Json(RecordView::of(record)))
}

/// POST /inbox/:id/suppress
async fn suppress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordView>, AppError> {
    let id = parse_record_id(&id)?;
    let mut store = lock_store(&state);
    let record = actions::suppress(&mut *store, id, &SystemClock)?;
    Ok(Json(RecordView::of(record)))
}

/// POST /inbox/:id/unsuppress
async fn unsuppress(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<RecordView>, AppError> {
    let id = parse_record_id(&id)?;
    let mut store = lock_store(&state);
    let record = actions::unsuppress(&mut *store, id, &SystemClock)?;
    Ok(Json(RecordView::of(record)))
}

/// GET /entities/:id/health
async fn entity_health(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EntityHealthResponse>, AppError> {
    let store = lock_store(&state);
    let entity = store
        .get_entity(&id)
        .map_err(|e| EngineError::Store(e.to_string()))?
        .ok_or_else(|| EngineError::NotFound(format!("entity {}", id)))?;

    Ok(Json(EntityHealthResponse {
        entity_id: entity.id,
        health_score: entity.health_score,
        health_reason: entity.health_reason,
        scored_at: entity.scored_at,
    }))
}

/// Service liveness response
#[derive(Debug, Serialize, Deserialize)]
pub struct ServiceHealthResponse {
    /// Overall service status
    pub status: String,
}

/// GET /health - service liveness
async fn health_check() -> Json<ServiceHealthResponse> {
    Json(ServiceHealthResponse {
        status: "ok".to_string(),
    })
}

/// Create the axum router with all routes
pub fn create_router(state: AppState) -> AxumRouter {
    AxumRouter::new()
        .route("/inbox", get(list_inbox))
        .route("/inbox/counts", get(inbox_counts))
        .route("/inbox/recent", get(recently_actioned))
        .route("/inbox/:id", get(get_record))
        .route("/inbox/:id/assign", post(assign))
        .route("/inbox/:id/resolve", post(resolve))
        .route("/inbox/:id/snooze", post(snooze))
        .route("/inbox/:id/suppress", post(suppress))
        .route("/inbox/:id/unsuppress", post(unsuppress))
        .route("/entities/:id/health", get(entity_health))
        .route("/health", get(health_check))
        .with_state(state)
}
