//! The `AlertStore` trait and supporting query/write types.
//!
//! One storage backend implements the whole trait (e.g.
//! `shelfwatch-store-sqlite`); the sections below correspond to the
//! collaborator seams the engine needs: shelf catalog, inventory catalog,
//! assignment directory, and the alert/history store itself.
//!
//! All methods return `Send` futures so the trait can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::{
  alert::{
    Alert, AlertId, AlertPriority, AlertStatus, AlertType, AlertUpdate,
    NewAlert,
  },
  catalog::InventoryItem,
  history::{AlertHistoryRecord, NewHistoryRecord},
};

// ─── Query types ─────────────────────────────────────────────────────────────

/// Result ordering for [`AlertStore::query_alerts`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertSort {
  /// `created_at` descending.
  #[default]
  Newest,
  /// Priority rank descending, then `created_at` descending (dashboard
  /// ordering).
  Severity,
}

/// Parameters for [`AlertStore::query_alerts`] and
/// [`AlertStore::count_alerts`].
#[derive(Debug, Clone, Default)]
pub struct AlertQuery {
  pub status:            Option<AlertStatus>,
  pub priority:          Option<AlertPriority>,
  pub alert_type:        Option<AlertType>,
  pub shelf_name:        Option<String>,
  pub assigned_staff_id: Option<String>,
  pub sort:              AlertSort,
  pub limit:             Option<usize>,
  pub offset:            Option<usize>,
}

/// Aggregate counts for the statistics endpoint.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AlertStatistics {
  pub total_active:        u64,
  pub critical_alerts:     u64,
  pub high_alerts:         u64,
  pub stock_alerts:        u64,
  pub misplaced_alerts:    u64,
  pub total_alerts:        u64,
  pub resolved_alerts:     u64,
  pub acknowledged_alerts: u64,
}

// ─── Write batch ─────────────────────────────────────────────────────────────

/// One alert mutation plus its audit record. The audit record is written in
/// the same transaction; whether its failure aborts the batch depends on the
/// store's audit mode.
#[derive(Debug, Clone)]
pub enum AlertWrite {
  /// Insert a new alert.
  Create { alert: NewAlert, note: NewHistoryRecord },
  /// Patch an existing alert in place and bump `updated_at`.
  Update {
    id:     AlertId,
    update: AlertUpdate,
    note:   NewHistoryRecord,
  },
  /// Move an alert to `status`, stamping `acknowledged_at`/`resolved_at` as
  /// appropriate. Transition legality is the engine's responsibility.
  SetStatus {
    id:     AlertId,
    status: AlertStatus,
    note:   NewHistoryRecord,
  },
}

/// An atomic unit of alert mutations for a single snapshot or lifecycle
/// operation. Either every write commits or none do.
#[derive(Debug, Clone, Default)]
pub struct WriteBatch {
  pub writes: Vec<AlertWrite>,
}

impl WriteBatch {
  pub fn push(&mut self, write: AlertWrite) {
    self.writes.push(write);
  }

  pub fn is_empty(&self) -> bool {
    self.writes.is_empty()
  }
}

// ─── Trait ───────────────────────────────────────────────────────────────────

/// Abstraction over the shelfwatch storage backend.
///
/// Dedup reads (`find_active_*`) and the subsequent [`AlertStore::apply`]
/// must observe a consistent view; the engine guarantees this by holding a
/// per-shelf lock across the read-then-write sequence, and implementations
/// back it up with uniqueness constraints on the active-alert dedup keys.
pub trait AlertStore: Send + Sync {
  type Error: std::error::Error + Send + Sync + 'static;

  // ── Shelf catalog ─────────────────────────────────────────────────────

  /// Whether a shelf with this name exists in the catalog.
  fn shelf_exists<'a>(
    &'a self,
    shelf_name: &'a str,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + 'a;

  // ── Inventory catalog ─────────────────────────────────────────────────

  /// Expected inventory items assigned to a shelf.
  fn items_for_shelf<'a>(
    &'a self,
    shelf_name: &'a str,
  ) -> impl Future<Output = Result<Vec<InventoryItem>, Self::Error>> + Send + 'a;

  /// Search the whole catalog for products whose name contains `needle`,
  /// case-insensitively. Used for correct-location lookups.
  fn search_items_by_name<'a>(
    &'a self,
    needle: &'a str,
  ) -> impl Future<Output = Result<Vec<InventoryItem>, Self::Error>> + Send + 'a;

  // ── Assignment directory ──────────────────────────────────────────────

  /// The employee actively assigned to a shelf, if any.
  fn active_assignee_for<'a>(
    &'a self,
    shelf_name: &'a str,
  ) -> impl Future<Output = Result<Option<String>, Self::Error>> + Send + 'a;

  // ── Alert dedup lookups ───────────────────────────────────────────────

  /// The single ACTIVE shelf-level stock-tier alert for a shelf, if any.
  fn find_active_stock_alert<'a>(
    &'a self,
    shelf_name: &'a str,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + 'a;

  /// Every ACTIVE shelf-level stock-tier alert for a shelf (auto-resolve
  /// sweeps all of them).
  fn active_stock_alerts<'a>(
    &'a self,
    shelf_name: &'a str,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + 'a;

  /// The ACTIVE misplacement alert for (shelf, detected label), if any.
  fn find_active_misplacement<'a>(
    &'a self,
    shelf_name: &'a str,
    actual_product: &'a str,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + 'a;

  /// The ACTIVE missing-items alert for a shelf (a misplacement-typed alert
  /// whose title carries [`crate::alert::MISSING_ITEMS_MARKER`]), if any.
  fn find_active_missing_items<'a>(
    &'a self,
    shelf_name: &'a str,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + 'a;

  // ── Reads ─────────────────────────────────────────────────────────────

  /// Retrieve an alert by id. Returns `None` if not found.
  fn get_alert(
    &self,
    id: AlertId,
  ) -> impl Future<Output = Result<Option<Alert>, Self::Error>> + Send + '_;

  /// List alerts matching `query`, with ordering and pagination.
  fn query_alerts<'a>(
    &'a self,
    query: &'a AlertQuery,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + 'a;

  /// Count alerts matching `query`, ignoring pagination.
  fn count_alerts<'a>(
    &'a self,
    query: &'a AlertQuery,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + 'a;

  /// The audit trail for an alert, newest first.
  fn history_for(
    &self,
    id: AlertId,
  ) -> impl Future<Output = Result<Vec<AlertHistoryRecord>, Self::Error>> + Send + '_;

  /// Aggregate counts for dashboards.
  fn statistics(
    &self,
  ) -> impl Future<Output = Result<AlertStatistics, Self::Error>> + Send + '_;

  // ── Atomic writes ─────────────────────────────────────────────────────

  /// Apply a batch of mutations in one transaction, returning the touched
  /// alerts in write order. On any error the whole batch rolls back.
  fn apply(
    &self,
    batch: WriteBatch,
  ) -> impl Future<Output = Result<Vec<Alert>, Self::Error>> + Send + '_;
}
