//! The alert engine: snapshot ingestion, upserts, and lifecycle operations.
//!
//! One ingestion call is one logical batch — classifier evaluation,
//! misplacement detection, and every resulting upsert commit atomically
//! through [`AlertStore::apply`]. Ingestion is serialised per shelf with an
//! async mutex so the read-existing-then-write dedup sequence cannot race
//! against a concurrent snapshot for the same shelf.

use std::{collections::HashMap, sync::Arc};

use serde::Serialize;
use tokio::sync::Mutex;

use crate::{
  Error, Result,
  alert::{
    Alert, AlertId, AlertPriority, AlertStatus, AlertType, AlertUpdate,
    MISSING_ITEMS_MARKER, NewAlert,
  },
  catalog::InventoryItem,
  classifier::StockThresholds,
  history::{HistoryAction, NewHistoryRecord},
  lifecycle::{self, Transition},
  misplacement,
  snapshot::ShelfSnapshot,
  store::{AlertStore, AlertWrite, WriteBatch},
};

// ─── Outcomes ────────────────────────────────────────────────────────────────

/// The result of one successfully-committed snapshot ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct IngestReport {
  pub success:        bool,
  /// Count of alerts created or updated by this snapshot. Auto-resolved
  /// alerts are committed but not reported here.
  pub alerts_created: usize,
  pub alerts:         Vec<Alert>,
  /// Non-fatal warnings collected during the run; empty on a clean run.
  pub errors:         Vec<String>,
}

/// A single failure inside a batch lifecycle operation.
#[derive(Debug, Clone, Serialize)]
pub struct BatchFailure {
  pub alert_id: AlertId,
  pub reason:   String,
}

/// The outcome of a batch acknowledge/resolve: each id is processed
/// independently, failures never abort the rest.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchOutcome {
  pub succeeded: Vec<AlertId>,
  pub failed:    Vec<BatchFailure>,
}

// ─── Engine ──────────────────────────────────────────────────────────────────

/// The rule/dedup/lifecycle engine, generic over its storage backend.
pub struct AlertEngine<S> {
  store:       Arc<S>,
  thresholds:  StockThresholds,
  shelf_locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl<S> AlertEngine<S>
where
  S: AlertStore,
{
  pub fn new(store: Arc<S>, thresholds: StockThresholds) -> Self {
    Self {
      store,
      thresholds,
      shelf_locks: Mutex::new(HashMap::new()),
    }
  }

  pub fn store(&self) -> &Arc<S> {
    &self.store
  }

  /// The serialisation point for per-shelf ingestion. Locks are created on
  /// first use and retained; only known shelves ever enter the map, so it
  /// stays bounded by the shelf population.
  async fn shelf_lock(&self, shelf_name: &str) -> Arc<Mutex<()>> {
    let mut locks = self.shelf_locks.lock().await;
    locks
      .entry(shelf_name.to_owned())
      .or_insert_with(|| Arc::new(Mutex::new(())))
      .clone()
  }

  // ── Ingestion ─────────────────────────────────────────────────────────

  /// Process one shelf snapshot into alert mutations.
  ///
  /// Returns an [`IngestReport`] when the batch committed (possibly with
  /// warnings); any error means nothing was written for this snapshot.
  pub async fn ingest(&self, snapshot: &ShelfSnapshot) -> Result<IngestReport> {
    snapshot.validate()?;

    let shelf = snapshot.shelf_number.as_str();
    tracing::info!(
      shelf,
      empty = snapshot.empty_percentage,
      labels = snapshot.items_detected.len(),
      "processing shelf snapshot"
    );

    // Unknown shelves take the single-create path below, which does no
    // read-then-write dedup and therefore needs no lock; checking first
    // keeps arbitrary shelf numbers out of the lock map.
    if !self
      .store
      .shelf_exists(shelf)
      .await
      .map_err(Error::store)?
    {
      tracing::warn!(shelf, "snapshot for unknown shelf");
      return self.ingest_unknown_shelf(snapshot).await;
    }

    let lock = self.shelf_lock(shelf).await;
    let _guard = lock.lock().await;

    let items = self
      .store
      .items_for_shelf(shelf)
      .await
      .map_err(Error::store)?;

    let mut warnings = Vec::new();
    // Resolved once per ingestion; only consulted when creating an alert.
    let assignee = match self.store.active_assignee_for(shelf).await {
      Ok(a) => a,
      Err(e) => {
        warnings
          .push(format!("failed to resolve staff assignment for shelf {shelf}: {e}"));
        None
      }
    };

    // (write, reported) — auto-resolves commit but are not returned to the
    // caller as "touched" alerts, matching the original engine.
    let mut writes: Vec<(AlertWrite, bool)> = Vec::new();

    self
      .plan_stock_writes(snapshot, &items, assignee.as_deref(), &mut writes)
      .await?;
    self
      .plan_misplacement_writes(snapshot, &items, assignee.as_deref(), &mut writes)
      .await?;

    let reported: Vec<bool> = writes.iter().map(|(_, r)| *r).collect();
    let batch = WriteBatch {
      writes: writes.into_iter().map(|(w, _)| w).collect(),
    };

    let touched = if batch.is_empty() {
      Vec::new()
    } else {
      self.store.apply(batch).await.map_err(Error::store)?
    };

    let alerts: Vec<Alert> = touched
      .into_iter()
      .zip(reported)
      .filter_map(|(alert, report)| report.then_some(alert))
      .collect();

    tracing::info!(shelf, count = alerts.len(), "snapshot processed");

    Ok(IngestReport {
      success: true,
      alerts_created: alerts.len(),
      alerts,
      errors: warnings,
    })
  }

  /// Unknown shelf: skip stock and misplacement processing entirely and
  /// raise a single PENDING alert carrying the detected labels.
  async fn ingest_unknown_shelf(
    &self,
    snapshot: &ShelfSnapshot,
  ) -> Result<IngestReport> {
    let shelf = snapshot.shelf_number.as_str();

    let mut message = format!("Shelf {shelf} not found in inventory system.");
    if !snapshot.items_detected.is_empty() {
      message.push_str(&format!(
        " Detected items: {}",
        snapshot.items_detected.join(", ")
      ));
    }

    let mut alert = NewAlert::shelf_level(
      AlertType::MisplacedItem,
      AlertPriority::Low,
      shelf,
      format!("UNKNOWN SHELF: {shelf}"),
      message,
    );
    alert.status = AlertStatus::Pending;
    alert.actual_product = if snapshot.items_detected.is_empty() {
      None
    } else {
      Some(snapshot.items_detected.join(", "))
    };

    let batch = WriteBatch {
      writes: vec![AlertWrite::Create {
        alert,
        note: NewHistoryRecord::system(
          HistoryAction::Created,
          format!("Unknown shelf alert: {shelf}"),
        ),
      }],
    };

    let alerts = self.store.apply(batch).await.map_err(Error::store)?;
    Ok(IngestReport {
      success: true,
      alerts_created: alerts.len(),
      alerts,
      errors: Vec::new(),
    })
  }

  // ── Stock path ────────────────────────────────────────────────────────

  async fn plan_stock_writes(
    &self,
    snapshot: &ShelfSnapshot,
    items: &[InventoryItem],
    assignee: Option<&str>,
    writes: &mut Vec<(AlertWrite, bool)>,
  ) -> Result<()> {
    let shelf = snapshot.shelf_number.as_str();
    let fill = snapshot.fill_percentage();

    let Some((alert_type, priority)) = self.thresholds.classify(fill) else {
      // Stock is fine: auto-resolve whatever stock alerts are still active.
      let stale = self
        .store
        .active_stock_alerts(shelf)
        .await
        .map_err(Error::store)?;
      for alert in stale {
        tracing::info!(shelf, id = %alert.id, "auto-resolving stock alert");
        writes.push((
          AlertWrite::SetStatus {
            id:     alert.id,
            status: AlertStatus::Resolved,
            note:   NewHistoryRecord::system(
              HistoryAction::AutoResolved,
              "Stock level returned to normal",
            ),
          },
          false,
        ));
      }
      return Ok(());
    };

    let (title, message) = stock_alert_text(shelf, alert_type, priority, fill);
    let category = category_summary(items);

    let existing = self
      .store
      .find_active_stock_alert(shelf)
      .await
      .map_err(Error::store)?;

    match existing {
      Some(alert) => {
        writes.push((
          AlertWrite::Update {
            id:     alert.id,
            update: AlertUpdate {
              alert_type: Some(alert_type),
              priority: Some(priority),
              title: Some(title),
              message: Some(message),
              category: Some(category),
              empty_percentage: Some(snapshot.empty_percentage),
              fill_percentage: Some(fill),
              ..AlertUpdate::default()
            },
            note:   NewHistoryRecord::system(
              HistoryAction::Updated,
              format!("Stock level updated to {fill:.1}%"),
            ),
          },
          true,
        ));
      }
      None => {
        let mut alert =
          NewAlert::shelf_level(alert_type, priority, shelf, title, message);
        alert.category = Some(category);
        alert.empty_percentage = Some(snapshot.empty_percentage);
        alert.fill_percentage = Some(fill);
        alert.assigned_staff_id = assignee.map(str::to_owned);
        writes.push((
          AlertWrite::Create {
            alert,
            note: NewHistoryRecord::system(
              HistoryAction::Created,
              format!("Stock alert created for {fill:.1}% fill level"),
            ),
          },
          true,
        ));
      }
    }

    Ok(())
  }

  // ── Misplacement / missing paths ──────────────────────────────────────

  async fn plan_misplacement_writes(
    &self,
    snapshot: &ShelfSnapshot,
    items: &[InventoryItem],
    assignee: Option<&str>,
    writes: &mut Vec<(AlertWrite, bool)>,
  ) -> Result<()> {
    let shelf = snapshot.shelf_number.as_str();
    let report = misplacement::detect(items, &snapshot.items_detected);

    for label in &report.misplaced {
      let correct_location = self.find_correct_location(label).await?;
      let (title, message) =
        misplacement_text(shelf, label, items, correct_location.as_deref());

      let existing = self
        .store
        .find_active_misplacement(shelf, label)
        .await
        .map_err(Error::store)?;

      match existing {
        Some(alert) => writes.push((
          AlertWrite::Update {
            id:     alert.id,
            update: AlertUpdate {
              title: Some(title),
              message: Some(message),
              correct_location: Some(correct_location),
              ..AlertUpdate::default()
            },
            note:   NewHistoryRecord::system(
              HistoryAction::Updated,
              format!("Misplacement updated: {label}"),
            ),
          },
          true,
        )),
        None => {
          let mut alert = NewAlert::shelf_level(
            AlertType::MisplacedItem,
            AlertPriority::Medium,
            shelf,
            title,
            message,
          );
          alert.category = items.first().and_then(|i| i.category.clone());
          alert.expected_product =
            items.first().map(|i| i.product_name.clone());
          alert.actual_product = Some(label.clone());
          alert.correct_location = correct_location;
          alert.assigned_staff_id = assignee.map(str::to_owned);
          writes.push((
            AlertWrite::Create {
              alert,
              note: NewHistoryRecord::system(
                HistoryAction::Created,
                format!("Misplacement alert created: {label}"),
              ),
            },
            true,
          ));
        }
      }
    }

    if !report.missing.is_empty() {
      let count = report.missing.len();
      let title = format!("{MISSING_ITEMS_MARKER}: Shelf {shelf}");
      let message = format!(
        "Expected items not detected on shelf {shelf}: {}",
        misplacement::missing_summary(&report.missing)
      );

      let existing = self
        .store
        .find_active_missing_items(shelf)
        .await
        .map_err(Error::store)?;

      match existing {
        Some(alert) => writes.push((
          AlertWrite::Update {
            id:     alert.id,
            update: AlertUpdate {
              title: Some(title),
              message: Some(message),
              ..AlertUpdate::default()
            },
            note:   NewHistoryRecord::system(
              HistoryAction::Updated,
              format!("Missing items updated: {count} items"),
            ),
          },
          true,
        )),
        None => {
          let mut alert = NewAlert::shelf_level(
            AlertType::MisplacedItem,
            AlertPriority::Low,
            shelf,
            title,
            message,
          );
          alert.expected_product = Some(report.missing.join(", "));
          alert.assigned_staff_id = assignee.map(str::to_owned);
          writes.push((
            AlertWrite::Create {
              alert,
              note: NewHistoryRecord::system(
                HistoryAction::Created,
                format!("Missing items alert created: {count} items"),
              ),
            },
            true,
          ));
        }
      }
    }

    Ok(())
  }

  /// Where a misplaced item actually belongs: the shelf of the first catalog
  /// product whose name contains the label.
  async fn find_correct_location(&self, label: &str) -> Result<Option<String>> {
    let matches = self
      .store
      .search_items_by_name(label)
      .await
      .map_err(Error::store)?;
    Ok(matches.into_iter().next().map(|item| item.shelf_name))
  }

  // ── Lifecycle operations ──────────────────────────────────────────────

  /// Acknowledge an active alert on behalf of an employee.
  pub async fn acknowledge(
    &self,
    id: AlertId,
    employee_id: &str,
  ) -> Result<Alert> {
    self
      .transition(id, Transition::Acknowledge, employee_id, "Alert acknowledged")
      .await
  }

  /// Resolve an active or acknowledged alert on behalf of an employee.
  pub async fn resolve(&self, id: AlertId, employee_id: &str) -> Result<Alert> {
    self
      .transition(id, Transition::Resolve, employee_id, "Alert resolved")
      .await
  }

  async fn transition(
    &self,
    id: AlertId,
    transition: Transition,
    employee_id: &str,
    notes: &str,
  ) -> Result<Alert> {
    let alert = self
      .store
      .get_alert(id)
      .await
      .map_err(Error::store)?
      .ok_or(Error::AlertNotFound(id))?;

    let Some(target) = lifecycle::apply(alert.status, transition) else {
      return Err(Error::IllegalTransition { id, status: alert.status });
    };

    let action = match transition {
      Transition::Acknowledge => HistoryAction::Acknowledged,
      Transition::Resolve => HistoryAction::Resolved,
      Transition::AutoResolve => HistoryAction::AutoResolved,
    };

    let batch = WriteBatch {
      writes: vec![AlertWrite::SetStatus {
        id,
        status: target,
        note: NewHistoryRecord::by(action, employee_id, notes),
      }],
    };

    let mut touched = self.store.apply(batch).await.map_err(Error::store)?;
    touched
      .pop()
      .ok_or(Error::AlertNotFound(id))
  }

  /// Acknowledge several alerts; each id is processed independently.
  pub async fn acknowledge_many(
    &self,
    ids: &[AlertId],
    employee_id: &str,
  ) -> BatchOutcome {
    self.transition_many(ids, Transition::Acknowledge, employee_id).await
  }

  /// Resolve several alerts; each id is processed independently.
  pub async fn resolve_many(
    &self,
    ids: &[AlertId],
    employee_id: &str,
  ) -> BatchOutcome {
    self.transition_many(ids, Transition::Resolve, employee_id).await
  }

  async fn transition_many(
    &self,
    ids: &[AlertId],
    transition: Transition,
    employee_id: &str,
  ) -> BatchOutcome {
    let mut outcome = BatchOutcome::default();
    for &id in ids {
      let result = match transition {
        Transition::Acknowledge => self.acknowledge(id, employee_id).await,
        _ => self.resolve(id, employee_id).await,
      };
      match result {
        Ok(_) => outcome.succeeded.push(id),
        Err(e) => {
          tracing::warn!(id = %id, error = %e, "batch lifecycle operation failed for alert");
          outcome.failed.push(BatchFailure { alert_id: id, reason: e.to_string() });
        }
      }
    }
    outcome
  }
}

// ─── Generated text ──────────────────────────────────────────────────────────

fn stock_alert_text(
  shelf: &str,
  alert_type: AlertType,
  priority: AlertPriority,
  fill: f64,
) -> (String, String) {
  if alert_type == AlertType::OutOfStock {
    (
      format!("OUT OF STOCK: Shelf {shelf}"),
      format!(
        "URGENT: Shelf {shelf} is completely empty (0% filled). \
         Immediate restocking required!"
      ),
    )
  } else {
    (
      format!("{} STOCK: Shelf {shelf}", priority.label().to_uppercase()),
      format!(
        "Shelf {shelf} has {} stock levels. Current fill: {fill:.1}%",
        priority.label()
      ),
    )
  }
}

fn misplacement_text(
  shelf: &str,
  label: &str,
  expected: &[InventoryItem],
  correct_location: Option<&str>,
) -> (String, String) {
  let title = format!("MISPLACED: {label} on Shelf {shelf}");
  let mut message = format!("Wrong item '{label}' found on shelf {shelf}.");

  if !expected.is_empty() {
    let names: Vec<&str> = expected
      .iter()
      .take(3)
      .map(|i| i.product_name.as_str())
      .collect();
    message.push_str(&format!(" Expected items: {}", names.join(", ")));
    if expected.len() > 3 {
      message.push_str(&format!(" (and {} more)", expected.len() - 3));
    }
  }

  if let Some(location) = correct_location {
    message.push_str(&format!(" | Correct location: {location}"));
  }

  (title, message)
}

/// The set of distinct non-null categories on the shelf, or "Mixed" when
/// none are recorded.
fn category_summary(items: &[InventoryItem]) -> String {
  let mut seen = Vec::new();
  for item in items {
    if let Some(category) = &item.category
      && !seen.iter().any(|s| s == category)
    {
      seen.push(category.clone());
    }
  }
  if seen.is_empty() {
    "Mixed".to_owned()
  } else {
    seen.join(", ")
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(name: &str, category: Option<&str>) -> InventoryItem {
    InventoryItem {
      shelf_name:     "A1".into(),
      product_number: "P-1".into(),
      product_name:   name.into(),
      category:       category.map(str::to_owned),
      rack_name:      None,
    }
  }

  #[test]
  fn out_of_stock_gets_urgent_wording() {
    let (title, message) = stock_alert_text(
      "A1",
      AlertType::OutOfStock,
      AlertPriority::Critical,
      0.0,
    );
    assert_eq!(title, "OUT OF STOCK: Shelf A1");
    assert!(message.starts_with("URGENT:"));
  }

  #[test]
  fn stock_text_carries_priority_and_fill() {
    let (title, message) =
      stock_alert_text("B2", AlertType::HighStock, AlertPriority::High, 20.25);
    assert_eq!(title, "HIGH STOCK: Shelf B2");
    assert!(message.contains("high stock levels"));
    assert!(message.contains("20.2%") || message.contains("20.3%"));
  }

  #[test]
  fn category_summary_dedups_and_defaults_to_mixed() {
    let items = vec![
      item("Bananas", Some("Produce")),
      item("Apples", Some("Produce")),
      item("Bread", Some("Bakery")),
      item("Mystery", None),
    ];
    assert_eq!(category_summary(&items), "Produce, Bakery");
    assert_eq!(category_summary(&[item("X", None)]), "Mixed");
    assert_eq!(category_summary(&[]), "Mixed");
  }

  #[test]
  fn misplacement_text_lists_up_to_three_expected() {
    let items = vec![
      item("A", None),
      item("B", None),
      item("C", None),
      item("D", None),
    ];
    let (_, message) = misplacement_text("A1", "Hammer", &items, Some("B2"));
    assert!(message.contains("Expected items: A, B, C (and 1 more)"));
    assert!(message.ends_with("| Correct location: B2"));
  }

  // ── Lock map ────────────────────────────────────────────────────────────

  use std::sync::atomic::{AtomicI64, Ordering};

  use crate::{
    alert::SYSTEM_AUTHOR,
    history::AlertHistoryRecord,
    store::{AlertQuery, AlertStatistics},
  };

  /// Minimal backend: one known shelf, nothing stored, create-only writes.
  struct StubStore {
    known_shelf: &'static str,
    next_id:     AtomicI64,
  }

  impl StubStore {
    fn new(known_shelf: &'static str) -> Self {
      Self { known_shelf, next_id: AtomicI64::new(1) }
    }
  }

  impl AlertStore for StubStore {
    type Error = std::convert::Infallible;

    async fn shelf_exists(&self, shelf_name: &str) -> Result<bool, Self::Error> {
      Ok(shelf_name == self.known_shelf)
    }

    async fn items_for_shelf(
      &self,
      _shelf_name: &str,
    ) -> Result<Vec<InventoryItem>, Self::Error> {
      Ok(Vec::new())
    }

    async fn search_items_by_name(
      &self,
      _needle: &str,
    ) -> Result<Vec<InventoryItem>, Self::Error> {
      Ok(Vec::new())
    }

    async fn active_assignee_for(
      &self,
      _shelf_name: &str,
    ) -> Result<Option<String>, Self::Error> {
      Ok(None)
    }

    async fn find_active_stock_alert(
      &self,
      _shelf_name: &str,
    ) -> Result<Option<Alert>, Self::Error> {
      Ok(None)
    }

    async fn active_stock_alerts(
      &self,
      _shelf_name: &str,
    ) -> Result<Vec<Alert>, Self::Error> {
      Ok(Vec::new())
    }

    async fn find_active_misplacement(
      &self,
      _shelf_name: &str,
      _actual_product: &str,
    ) -> Result<Option<Alert>, Self::Error> {
      Ok(None)
    }

    async fn find_active_missing_items(
      &self,
      _shelf_name: &str,
    ) -> Result<Option<Alert>, Self::Error> {
      Ok(None)
    }

    async fn get_alert(&self, _id: AlertId) -> Result<Option<Alert>, Self::Error> {
      Ok(None)
    }

    async fn query_alerts(
      &self,
      _query: &AlertQuery,
    ) -> Result<Vec<Alert>, Self::Error> {
      Ok(Vec::new())
    }

    async fn count_alerts(&self, _query: &AlertQuery) -> Result<u64, Self::Error> {
      Ok(0)
    }

    async fn history_for(
      &self,
      _id: AlertId,
    ) -> Result<Vec<AlertHistoryRecord>, Self::Error> {
      Ok(Vec::new())
    }

    async fn statistics(&self) -> Result<AlertStatistics, Self::Error> {
      Ok(AlertStatistics::default())
    }

    async fn apply(&self, batch: WriteBatch) -> Result<Vec<Alert>, Self::Error> {
      let now = chrono::Utc::now();
      Ok(
        batch
          .writes
          .into_iter()
          .map(|write| match write {
            AlertWrite::Create { alert, .. } => Alert {
              id:                AlertId(self.next_id.fetch_add(1, Ordering::SeqCst)),
              alert_type:        alert.alert_type,
              priority:          alert.priority,
              status:            alert.status,
              shelf_name:        alert.shelf_name,
              rack_name:         None,
              product_number:    None,
              product_name:      None,
              category:          alert.category,
              title:             alert.title,
              message:           alert.message,
              expected_product:  alert.expected_product,
              actual_product:    alert.actual_product,
              correct_location:  alert.correct_location,
              empty_percentage:  alert.empty_percentage,
              fill_percentage:   alert.fill_percentage,
              assigned_staff_id: alert.assigned_staff_id,
              created_by:        SYSTEM_AUTHOR.to_owned(),
              created_at:        now,
              updated_at:        now,
              acknowledged_at:   None,
              resolved_at:       None,
            },
            _ => panic!("stub store only materialises creates"),
          })
          .collect(),
      )
    }
  }

  fn snapshot(shelf: &str, labels: &[&str]) -> ShelfSnapshot {
    ShelfSnapshot {
      shelf_number:     shelf.to_owned(),
      empty_percentage: 50.0,
      items_detected:   labels.iter().map(|s| (*s).to_owned()).collect(),
    }
  }

  #[tokio::test]
  async fn unknown_shelves_never_enter_the_lock_map() {
    let engine =
      AlertEngine::new(Arc::new(StubStore::new("A1")), StockThresholds::default());

    for shelf in ["Z1", "Z2", "Z3"] {
      let report = engine.ingest(&snapshot(shelf, &["Thing"])).await.unwrap();
      assert_eq!(report.alerts_created, 1);
    }
    assert!(engine.shelf_locks.lock().await.is_empty());

    engine.ingest(&snapshot("A1", &[])).await.unwrap();
    assert_eq!(engine.shelf_locks.lock().await.len(), 1);
  }
}
