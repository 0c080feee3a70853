//! JSON REST API and server wiring for shelfwatch.
//!
//! Exposes an axum [`Router`] backed by any
//! [`shelfwatch_core::store::AlertStore`]. Auth, TLS, and transport concerns
//! are the caller's responsibility.

pub mod alerts;
pub mod error;

use std::{path::PathBuf, sync::Arc};

use axum::{
  Router,
  routing::{get, post},
};
use serde::Deserialize;
use shelfwatch_core::{classifier::StockThresholds, engine::AlertEngine, store::AlertStore};
use tower_http::trace::TraceLayer;

pub use error::ApiError;

// ─── Configuration ────────────────────────────────────────────────────────────

/// Runtime server configuration, deserialised from `config.toml`.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
  pub host:         String,
  pub port:         u16,
  pub store_path:   PathBuf,
  /// Stock classification cut points; defaults match the standard tiers.
  #[serde(default)]
  pub thresholds:   StockThresholds,
  /// When true, a failed audit-trail write aborts the whole mutation.
  #[serde(default)]
  pub strict_audit: bool,
}

// ─── Application state ────────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub engine: Arc<AlertEngine<S>>,
  pub store:  Arc<S>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      engine: self.engine.clone(),
      store:  self.store.clone(),
    }
  }
}

// ─── Router ───────────────────────────────────────────────────────────────────

/// Build an axum [`Router`] for the alert API.
pub fn router<S>(state: AppState<S>) -> Router
where
  S: AlertStore + 'static,
{
  Router::new()
    .route("/alerts/process", post(alerts::process::<S>))
    .route("/alerts", get(alerts::list::<S>))
    .route("/alerts/active", get(alerts::active::<S>))
    .route("/alerts/statistics", get(alerts::statistics::<S>))
    .route("/alerts/acknowledge", post(alerts::acknowledge_many::<S>))
    .route("/alerts/resolve", post(alerts::resolve_many::<S>))
    .route("/alerts/{id}", get(alerts::get_one::<S>))
    .route("/alerts/{id}/history", get(alerts::history::<S>))
    .route("/alerts/{id}/acknowledge", post(alerts::acknowledge_one::<S>))
    .route("/alerts/{id}/resolve", post(alerts::resolve_one::<S>))
    .layer(TraceLayer::new_for_http())
    .with_state(state)
}

// ─── Integration tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
  use super::*;

  use axum::{
    body::Body,
    http::{Request, StatusCode, header},
  };
  use chrono::Utc;
  use serde_json::{Value, json};
  use shelfwatch_core::catalog::{InventoryItem, Shelf, StaffAssignment};
  use shelfwatch_store_sqlite::SqliteStore;
  use tower::ServiceExt as _;

  async fn make_state() -> AppState<SqliteStore> {
    let store = SqliteStore::open_in_memory().await.unwrap();

    for name in ["A1", "B2"] {
      store
        .put_shelf(Shelf {
          name:      name.to_string(),
          capacity:  100,
          is_active: true,
        })
        .await
        .unwrap();
    }
    store
      .put_inventory_item(InventoryItem {
        shelf_name:     "A1".to_string(),
        product_number: "PN-100".to_string(),
        product_name:   "Organic Bananas".to_string(),
        category:       Some("Produce".to_string()),
        rack_name:      None,
      })
      .await
      .unwrap();
    store
      .put_assignment(StaffAssignment {
        shelf_name:  "A1".to_string(),
        employee_id: "E201".to_string(),
        is_active:   true,
        assigned_at: Utc::now(),
      })
      .await
      .unwrap();

    let store = Arc::new(store);
    AppState {
      engine: Arc::new(AlertEngine::new(store.clone(), StockThresholds::default())),
      store,
    }
  }

  async fn request(
    state: AppState<SqliteStore>,
    method: &str,
    uri: &str,
    body: Option<Value>,
  ) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
      Some(v) => {
        builder = builder.header(header::CONTENT_TYPE, "application/json");
        Body::from(v.to_string())
      }
      None => Body::empty(),
    };
    let resp = router(state)
      .oneshot(builder.body(body).unwrap())
      .await
      .unwrap();
    let status = resp.status();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
      Value::Null
    } else {
      serde_json::from_slice(&bytes).unwrap()
    };
    (status, value)
  }

  fn snapshot(shelf: &str, empty: f64) -> Value {
    json!({
      "shelf_number":     shelf,
      "empty_percentage": empty,
      "items_detected":   [],
    })
  }

  async fn ingest(state: &AppState<SqliteStore>, shelf: &str, empty: f64) -> i64 {
    let (status, body) =
      request(state.clone(), "POST", "/alerts/process", Some(snapshot(shelf, empty)))
        .await;
    assert_eq!(status, StatusCode::OK);
    body["alerts"][0]["id"].as_i64().unwrap()
  }

  // ── Process ─────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn process_snapshot_creates_an_alert() {
    let state = make_state().await;
    let (status, body) =
      request(state, "POST", "/alerts/process", Some(snapshot("A1", 95.0))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["alerts_created"], json!(1));
    assert_eq!(body["alerts"][0]["alert_type"], json!("critical_stock"));
    assert_eq!(body["alerts"][0]["assigned_staff_id"], json!("E201"));
  }

  #[tokio::test]
  async fn invalid_snapshot_returns_400_with_failure_body() {
    let state = make_state().await;
    let (status, body) =
      request(state, "POST", "/alerts/process", Some(snapshot("A1", 150.0))).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], json!(false));
    assert_eq!(body["alerts_created"], json!(0));
    assert!(body["error"].as_str().unwrap().contains("empty_percentage"));
  }

  // ── Reads ───────────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn unknown_alert_returns_404() {
    let state = make_state().await;
    let (status, _) = request(state, "GET", "/alerts/999", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn list_supports_filters_and_pagination() {
    let state = make_state().await;
    ingest(&state, "A1", 95.0).await;
    ingest(&state, "B2", 60.0).await;

    let (status, body) =
      request(state.clone(), "GET", "/alerts?status=active&limit=1", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alerts"].as_array().unwrap().len(), 1);
    assert_eq!(body["total_count"], json!(2));

    let (_, body) =
      request(state.clone(), "GET", "/alerts?shelf_name=B2", None).await;
    assert_eq!(body["total_count"], json!(1));
    assert_eq!(body["alerts"][0]["shelf_name"], json!("B2"));

    // B2 has no staff assignment, so the employee filter only matches A1.
    let (_, body) =
      request(state, "GET", "/alerts?employee_id=E201", None).await;
    assert_eq!(body["total_count"], json!(1));
    assert_eq!(body["alerts"][0]["shelf_name"], json!("A1"));
  }

  #[tokio::test]
  async fn active_endpoint_sorts_by_severity() {
    let state = make_state().await;
    ingest(&state, "B2", 60.0).await; // medium
    ingest(&state, "A1", 95.0).await; // critical

    let (status, body) = request(state, "GET", "/alerts/active", None).await;
    assert_eq!(status, StatusCode::OK);
    let alerts = body.as_array().unwrap();
    assert_eq!(alerts.len(), 2);
    assert_eq!(alerts[0]["priority"], json!("critical"));
    assert_eq!(alerts[1]["priority"], json!("medium"));
  }

  #[tokio::test]
  async fn statistics_endpoint_reports_counts() {
    let state = make_state().await;
    ingest(&state, "A1", 95.0).await;

    let (status, body) = request(state, "GET", "/alerts/statistics", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total_active"], json!(1));
    assert_eq!(body["critical_alerts"], json!(1));
    assert_eq!(body["total_alerts"], json!(1));
  }

  // ── Lifecycle ───────────────────────────────────────────────────────────────

  #[tokio::test]
  async fn acknowledge_is_not_idempotent() {
    let state = make_state().await;
    let id = ingest(&state, "A1", 95.0).await;
    let body = json!({ "employee_id": "E7" });

    let (status, alert) = request(
      state.clone(),
      "POST",
      &format!("/alerts/{id}/acknowledge"),
      Some(body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(alert["status"], json!("acknowledged"));

    let (status, _) = request(
      state,
      "POST",
      &format!("/alerts/{id}/acknowledge"),
      Some(body),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }

  #[tokio::test]
  async fn batch_resolve_reports_per_id_outcomes() {
    let state = make_state().await;
    let id = ingest(&state, "A1", 95.0).await;

    let (status, body) = request(
      state,
      "POST",
      "/alerts/resolve",
      Some(json!({ "alert_ids": [id, 999], "employee_id": "E7" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["succeeded"], json!([id]));
    assert_eq!(body["failed"][0]["alert_id"], json!(999));
  }

  #[tokio::test]
  async fn history_endpoint_returns_the_trail_newest_first() {
    let state = make_state().await;
    let id = ingest(&state, "A1", 95.0).await;
    request(
      state.clone(),
      "POST",
      &format!("/alerts/{id}/resolve"),
      Some(json!({ "employee_id": "E7" })),
    )
    .await;

    let (status, body) =
      request(state.clone(), "GET", &format!("/alerts/{id}/history"), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["alert"]["status"], json!("resolved"));
    let records = body["history"].as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["action"], json!("resolved"));
    assert_eq!(records[1]["action"], json!("created"));

    let (status, _) = request(state, "GET", "/alerts/999/history", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
  }
}
