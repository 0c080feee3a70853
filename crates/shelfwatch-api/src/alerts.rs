//! Handlers for `/alerts` endpoints.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/alerts/process` | Body: a shelf snapshot |
//! | `GET`  | `/alerts` | Filters, sort, and pagination via query params |
//! | `GET`  | `/alerts/active` | Active alerts, most severe first |
//! | `GET`  | `/alerts/statistics` | Aggregate counts |
//! | `GET`  | `/alerts/:id` | 404 if not found |
//! | `GET`  | `/alerts/:id/history` | Audit trail, newest first |
//! | `POST` | `/alerts/:id/acknowledge` | Body: `{"employee_id":"E1"}` |
//! | `POST` | `/alerts/:id/resolve` | Body: `{"employee_id":"E1"}` |
//! | `POST` | `/alerts/acknowledge` | Batch; per-id success/failure |
//! | `POST` | `/alerts/resolve` | Batch; per-id success/failure |

use axum::{
  Json,
  extract::{Path, Query, State},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use shelfwatch_core::{
  Error as CoreError,
  alert::{Alert, AlertId, AlertPriority, AlertStatus, AlertType},
  engine::BatchOutcome,
  history::AlertHistoryRecord,
  snapshot::ShelfSnapshot,
  store::{AlertQuery, AlertSort, AlertStatistics, AlertStore},
};

use crate::{AppState, error::ApiError};

// ─── Process ─────────────────────────────────────────────────────────────────

/// `POST /alerts/process` — run one snapshot through the engine.
///
/// Failures keep the ingest-report shape (with `success: false`) so snapshot
/// producers can treat every response uniformly.
pub async fn process<S>(
  State(state): State<AppState<S>>,
  Json(snapshot): Json<ShelfSnapshot>,
) -> Response
where
  S: AlertStore + 'static,
{
  match state.engine.ingest(&snapshot).await {
    Ok(report) => Json(report).into_response(),
    Err(e) => {
      let status = match &e {
        CoreError::InvalidSnapshot(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
      };
      let body = json!({
        "success":        false,
        "error":          e.to_string(),
        "alerts_created": 0,
        "alerts":         [],
        "errors":         [e.to_string()],
      });
      (status, Json(body)).into_response()
    }
  }
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListParams {
  pub status:      Option<AlertStatus>,
  pub priority:    Option<AlertPriority>,
  pub alert_type:  Option<AlertType>,
  pub shelf_name:  Option<String>,
  /// Filters on the staff member the alert was assigned to at creation.
  pub employee_id: Option<String>,
  #[serde(default)]
  pub sort:        AlertSort,
  pub limit:       Option<usize>,
  pub offset:      Option<usize>,
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
  pub alerts:      Vec<Alert>,
  /// Count of all matches, ignoring pagination.
  pub total_count: u64,
}

/// `GET /alerts[?status=...&priority=...&sort=severity&limit=...&offset=...]`
pub async fn list<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<ListResponse>, ApiError>
where
  S: AlertStore + 'static,
{
  let query = AlertQuery {
    status:            params.status,
    priority:          params.priority,
    alert_type:        params.alert_type,
    shelf_name:        params.shelf_name,
    assigned_staff_id: params.employee_id,
    sort:              params.sort,
    limit:             params.limit,
    offset:            params.offset,
  };
  let alerts = state
    .store
    .query_alerts(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  let total_count = state
    .store
    .count_alerts(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(ListResponse { alerts, total_count }))
}

#[derive(Debug, Deserialize)]
pub struct ActiveParams {
  pub employee_id: Option<String>,
}

/// `GET /alerts/active[?employee_id=...]` — active alerts, most severe first.
pub async fn active<S>(
  State(state): State<AppState<S>>,
  Query(params): Query<ActiveParams>,
) -> Result<Json<Vec<Alert>>, ApiError>
where
  S: AlertStore + 'static,
{
  let query = AlertQuery {
    status: Some(AlertStatus::Active),
    assigned_staff_id: params.employee_id,
    sort: AlertSort::Severity,
    ..AlertQuery::default()
  };
  let alerts = state
    .store
    .query_alerts(&query)
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(alerts))
}

// ─── Get one / history / statistics ──────────────────────────────────────────

/// `GET /alerts/:id`
pub async fn get_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
{
  let alert = state
    .store
    .get_alert(AlertId(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;
  Ok(Json(alert))
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
  pub alert:   Alert,
  pub history: Vec<AlertHistoryRecord>,
}

/// `GET /alerts/:id/history` — the alert plus its audit trail, newest first.
pub async fn history<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
) -> Result<Json<HistoryResponse>, ApiError>
where
  S: AlertStore + 'static,
{
  let alert = state
    .store
    .get_alert(AlertId(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?
    .ok_or_else(|| ApiError::NotFound(format!("alert {id} not found")))?;
  let history = state
    .store
    .history_for(AlertId(id))
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(HistoryResponse { alert, history }))
}

/// `GET /alerts/statistics`
pub async fn statistics<S>(
  State(state): State<AppState<S>>,
) -> Result<Json<AlertStatistics>, ApiError>
where
  S: AlertStore + 'static,
{
  let stats = state
    .store
    .statistics()
    .await
    .map_err(|e| ApiError::Store(Box::new(e)))?;
  Ok(Json(stats))
}

// ─── Lifecycle ───────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActionBody {
  pub employee_id: String,
}

/// `POST /alerts/:id/acknowledge`
pub async fn acknowledge_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Json(body): Json<ActionBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
{
  let alert = state
    .engine
    .acknowledge(AlertId(id), &body.employee_id)
    .await
    .map_err(ApiError::from_engine)?;
  Ok(Json(alert))
}

/// `POST /alerts/:id/resolve`
pub async fn resolve_one<S>(
  State(state): State<AppState<S>>,
  Path(id): Path<i64>,
  Json(body): Json<ActionBody>,
) -> Result<Json<Alert>, ApiError>
where
  S: AlertStore + 'static,
{
  let alert = state
    .engine
    .resolve(AlertId(id), &body.employee_id)
    .await
    .map_err(ApiError::from_engine)?;
  Ok(Json(alert))
}

#[derive(Debug, Deserialize)]
pub struct BatchBody {
  pub alert_ids:   Vec<i64>,
  pub employee_id: String,
}

/// `POST /alerts/acknowledge` — batch; always 200, per-id outcomes in the body.
pub async fn acknowledge_many<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<BatchBody>,
) -> Json<BatchOutcome>
where
  S: AlertStore + 'static,
{
  let ids: Vec<AlertId> = body.alert_ids.into_iter().map(AlertId).collect();
  Json(state.engine.acknowledge_many(&ids, &body.employee_id).await)
}

/// `POST /alerts/resolve` — batch; always 200, per-id outcomes in the body.
pub async fn resolve_many<S>(
  State(state): State<AppState<S>>,
  Json(body): Json<BatchBody>,
) -> Json<BatchOutcome>
where
  S: AlertStore + 'static,
{
  let ids: Vec<AlertId> = body.alert_ids.into_iter().map(AlertId).collect();
  Json(state.engine.resolve_many(&ids, &body.employee_id).await)
}
