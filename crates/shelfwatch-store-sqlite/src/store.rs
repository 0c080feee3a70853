//! [`SqliteStore`] — the SQLite implementation of [`AlertStore`].

use std::path::Path;

use chrono::Utc;
use rusqlite::{OptionalExtension as _, types::Value as SqlValue};

use shelfwatch_core::{
  alert::{
    Alert, AlertId, AlertStatus, AlertUpdate, MISSING_ITEMS_MARKER, NewAlert,
    SYSTEM_AUTHOR,
  },
  catalog::{InventoryItem, Shelf, StaffAssignment},
  history::{AlertHistoryRecord, NewHistoryRecord},
  store::{AlertQuery, AlertSort, AlertStatistics, AlertStore, AlertWrite, WriteBatch},
};

use crate::{
  Error, Result,
  encode::{
    ALERT_COLUMNS, RawAlert, RawHistory, RawItem, encode_alert_type, encode_dt,
    encode_priority, encode_status, raw_alert_from_row,
  },
  schema::SCHEMA,
};

/// SQL tuple of the stock-tier `alert_type` tags; must stay in sync with the
/// partial index in the schema.
const STOCK_TIER_SQL: &str =
  "('low_stock', 'medium_stock', 'high_stock', 'critical_stock', 'out_of_stock')";

// ─── Audit policy ────────────────────────────────────────────────────────────

/// What to do when an audit-trail insert fails inside a write transaction.
///
/// The audit trail is advisory by default: a failed history write is logged
/// and swallowed so the parent alert mutation still commits. Deployments
/// that need a complete trail can opt into `Strict`, which fails (and rolls
/// back) the whole batch instead.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AuditMode {
  #[default]
  BestEffort,
  Strict,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// A shelfwatch store backed by a single SQLite file.
///
/// Cloning is cheap — the inner connection is reference-counted.
#[derive(Clone)]
pub struct SqliteStore {
  conn:  tokio_rusqlite::Connection,
  audit: AuditMode,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn, audit: AuditMode::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store — useful for testing.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn, audit: AuditMode::default() };
    store.init_schema().await?;
    Ok(store)
  }

  /// Set the audit-trail failure policy (default: best-effort).
  pub fn with_audit_mode(mut self, audit: AuditMode) -> Self {
    self.audit = audit;
    self
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  // ── Catalog seeding ───────────────────────────────────────────────────
  //
  // The engine never administers shelves, inventory, or assignments, but
  // its collaborators need data to exist. These upserts are the seam for
  // seeding and for whatever admin tooling sits outside this repository.

  pub async fn put_shelf(&self, shelf: Shelf) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO shelves (name, capacity, is_active)
           VALUES (?1, ?2, ?3)",
          rusqlite::params![shelf.name, shelf.capacity, shelf.is_active],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  pub async fn put_inventory_item(&self, item: InventoryItem) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT OR REPLACE INTO inventory
             (product_number, shelf_name, product_name, category, rack_name)
           VALUES (?1, ?2, ?3, ?4, ?5)",
          rusqlite::params![
            item.product_number,
            item.shelf_name,
            item.product_name,
            item.category,
            item.rack_name,
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Record an assignment. An active assignment deactivates any previous
  /// assignment for the same shelf.
  pub async fn put_assignment(&self, assignment: StaffAssignment) -> Result<()> {
    self
      .conn
      .call(move |conn| {
        if assignment.is_active {
          conn.execute(
            "UPDATE staff_assignments SET is_active = 0 WHERE shelf_name = ?1",
            rusqlite::params![assignment.shelf_name],
          )?;
        }
        conn.execute(
          "INSERT INTO staff_assignments
             (shelf_name, employee_id, is_active, assigned_at)
           VALUES (?1, ?2, ?3, ?4)",
          rusqlite::params![
            assignment.shelf_name,
            assignment.employee_id,
            assignment.is_active,
            encode_dt(assignment.assigned_at),
          ],
        )?;
        Ok(())
      })
      .await?;
    Ok(())
  }

  /// Run a single-alert SELECT and decode the result.
  async fn select_one_alert(
    &self,
    sql: String,
    values: Vec<SqlValue>,
  ) -> Result<Option<Alert>> {
    let raw: Option<RawAlert> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(&sql, rusqlite::params_from_iter(values), raw_alert_from_row)
            .optional()?,
        )
      })
      .await?;
    raw.map(RawAlert::into_alert).transpose()
  }

  /// Run a multi-alert SELECT and decode the results.
  async fn select_alerts(
    &self,
    sql: String,
    values: Vec<SqlValue>,
  ) -> Result<Vec<Alert>> {
    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(values), raw_alert_from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawAlert::into_alert).collect()
  }
}

// ─── Write helpers (run inside the transaction) ──────────────────────────────

fn insert_alert(
  tx: &rusqlite::Transaction<'_>,
  alert: &NewAlert,
  now: &str,
) -> rusqlite::Result<i64> {
  tx.execute(
    "INSERT INTO alerts (
       alert_type, priority, priority_rank, status, shelf_name, rack_name,
       category, title, message, expected_product, actual_product,
       correct_location, empty_percentage, fill_percentage,
       assigned_staff_id, created_by, created_at, updated_at
     ) VALUES (?1, ?2, ?3, ?4, ?5, NULL, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13,
               ?14, ?15, ?16, ?16)",
    rusqlite::params![
      encode_alert_type(alert.alert_type),
      encode_priority(alert.priority),
      alert.priority.rank(),
      encode_status(alert.status),
      alert.shelf_name,
      alert.category,
      alert.title,
      alert.message,
      alert.expected_product,
      alert.actual_product,
      alert.correct_location,
      alert.empty_percentage,
      alert.fill_percentage,
      alert.assigned_staff_id,
      SYSTEM_AUTHOR,
      now,
    ],
  )?;
  Ok(tx.last_insert_rowid())
}

fn update_alert(
  tx: &rusqlite::Transaction<'_>,
  id: AlertId,
  update: &AlertUpdate,
  now: &str,
) -> rusqlite::Result<()> {
  let mut sets: Vec<&'static str> = vec!["updated_at = ?"];
  let mut values: Vec<SqlValue> = vec![now.to_owned().into()];

  if let Some(t) = update.alert_type {
    sets.push("alert_type = ?");
    values.push(encode_alert_type(t).to_owned().into());
  }
  if let Some(p) = update.priority {
    sets.push("priority = ?");
    values.push(encode_priority(p).to_owned().into());
    sets.push("priority_rank = ?");
    values.push(p.rank().into());
  }
  if let Some(title) = &update.title {
    sets.push("title = ?");
    values.push(title.clone().into());
  }
  if let Some(message) = &update.message {
    sets.push("message = ?");
    values.push(message.clone().into());
  }
  if let Some(category) = &update.category {
    sets.push("category = ?");
    values.push(category.clone().into());
  }
  if let Some(expected) = &update.expected_product {
    sets.push("expected_product = ?");
    values.push(expected.clone().into());
  }
  if let Some(location) = &update.correct_location {
    sets.push("correct_location = ?");
    values.push(match location {
      Some(l) => l.clone().into(),
      None => SqlValue::Null,
    });
  }
  if let Some(empty) = update.empty_percentage {
    sets.push("empty_percentage = ?");
    values.push(empty.into());
  }
  if let Some(fill) = update.fill_percentage {
    sets.push("fill_percentage = ?");
    values.push(fill.into());
  }

  let sql = format!("UPDATE alerts SET {} WHERE id = ?", sets.join(", "));
  values.push(id.0.into());
  tx.execute(&sql, rusqlite::params_from_iter(values))?;
  Ok(())
}

fn set_status(
  tx: &rusqlite::Transaction<'_>,
  id: AlertId,
  status: AlertStatus,
  now: &str,
) -> rusqlite::Result<()> {
  let status_str = encode_status(status);
  match status {
    AlertStatus::Acknowledged => tx.execute(
      "UPDATE alerts SET status = ?1, acknowledged_at = ?2, updated_at = ?2
       WHERE id = ?3",
      rusqlite::params![status_str, now, id.0],
    )?,
    AlertStatus::Resolved => tx.execute(
      "UPDATE alerts SET status = ?1, resolved_at = ?2, updated_at = ?2
       WHERE id = ?3",
      rusqlite::params![status_str, now, id.0],
    )?,
    _ => tx.execute(
      "UPDATE alerts SET status = ?1, updated_at = ?2 WHERE id = ?3",
      rusqlite::params![status_str, now, id.0],
    )?,
  };
  Ok(())
}

fn append_history(
  tx: &rusqlite::Transaction<'_>,
  audit: AuditMode,
  alert_id: i64,
  note: &NewHistoryRecord,
  now: &str,
) -> rusqlite::Result<()> {
  let result = tx.execute(
    "INSERT INTO alert_history (alert_id, action, performed_by, notes, timestamp)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      alert_id,
      note.action.as_str(),
      note.performed_by,
      note.notes,
      now,
    ],
  );
  match result {
    Ok(_) => Ok(()),
    Err(e) => match audit {
      AuditMode::Strict => Err(e),
      AuditMode::BestEffort => {
        // Audit is advisory: log and let the parent mutation commit.
        tracing::error!(alert_id, error = %e, "audit history write failed");
        Ok(())
      }
    },
  }
}

fn must_fetch(
  tx: &rusqlite::Transaction<'_>,
  id: i64,
) -> rusqlite::Result<RawAlert> {
  tx.query_row(
    &format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?1"),
    rusqlite::params![id],
    raw_alert_from_row,
  )
}

/// Build a WHERE clause + params from an [`AlertQuery`].
fn query_filters(query: &AlertQuery) -> (String, Vec<SqlValue>) {
  let mut conds: Vec<&'static str> = Vec::new();
  let mut values: Vec<SqlValue> = Vec::new();

  if let Some(status) = query.status {
    conds.push("status = ?");
    values.push(encode_status(status).to_owned().into());
  }
  if let Some(priority) = query.priority {
    conds.push("priority = ?");
    values.push(encode_priority(priority).to_owned().into());
  }
  if let Some(alert_type) = query.alert_type {
    conds.push("alert_type = ?");
    values.push(encode_alert_type(alert_type).to_owned().into());
  }
  if let Some(shelf) = &query.shelf_name {
    conds.push("shelf_name = ?");
    values.push(shelf.clone().into());
  }
  if let Some(employee) = &query.assigned_staff_id {
    conds.push("assigned_staff_id = ?");
    values.push(employee.clone().into());
  }

  let where_clause = if conds.is_empty() {
    String::new()
  } else {
    format!("WHERE {}", conds.join(" AND "))
  };
  (where_clause, values)
}

// ─── AlertStore impl ─────────────────────────────────────────────────────────

impl AlertStore for SqliteStore {
  type Error = Error;

  // ── Shelf catalog ─────────────────────────────────────────────────────

  async fn shelf_exists(&self, shelf_name: &str) -> Result<bool> {
    let shelf = shelf_name.to_owned();
    let exists = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT 1 FROM shelves WHERE name = ?1",
              rusqlite::params![shelf],
              |_| Ok(true),
            )
            .optional()?
            .unwrap_or(false),
        )
      })
      .await?;
    Ok(exists)
  }

  // ── Inventory catalog ─────────────────────────────────────────────────

  async fn items_for_shelf(&self, shelf_name: &str) -> Result<Vec<InventoryItem>> {
    let shelf = shelf_name.to_owned();
    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT shelf_name, product_number, product_name, category, rack_name
           FROM inventory WHERE shelf_name = ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![shelf], |row| {
            Ok(RawItem {
              shelf_name:     row.get(0)?,
              product_number: row.get(1)?,
              product_name:   row.get(2)?,
              category:       row.get(3)?,
              rack_name:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawItem::into_item).collect())
  }

  async fn search_items_by_name(&self, needle: &str) -> Result<Vec<InventoryItem>> {
    // LIKE is case-insensitive for ASCII in SQLite, which matches the
    // detector's case-insensitive contract.
    let pattern = format!("%{needle}%");
    let raws: Vec<RawItem> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT shelf_name, product_number, product_name, category, rack_name
           FROM inventory WHERE product_name LIKE ?1 ORDER BY rowid",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![pattern], |row| {
            Ok(RawItem {
              shelf_name:     row.get(0)?,
              product_number: row.get(1)?,
              product_name:   row.get(2)?,
              category:       row.get(3)?,
              rack_name:      row.get(4)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    Ok(raws.into_iter().map(RawItem::into_item).collect())
  }

  // ── Assignment directory ──────────────────────────────────────────────

  async fn active_assignee_for(&self, shelf_name: &str) -> Result<Option<String>> {
    let shelf = shelf_name.to_owned();
    let assignee = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              "SELECT employee_id FROM staff_assignments
               WHERE shelf_name = ?1 AND is_active = 1
               ORDER BY id DESC LIMIT 1",
              rusqlite::params![shelf],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;
    Ok(assignee)
  }

  // ── Alert dedup lookups ───────────────────────────────────────────────

  async fn find_active_stock_alert(&self, shelf_name: &str) -> Result<Option<Alert>> {
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM alerts
       WHERE shelf_name = ? AND rack_name IS NULL AND status = 'active'
         AND alert_type IN {STOCK_TIER_SQL}
       ORDER BY id LIMIT 1"
    );
    self
      .select_one_alert(sql, vec![shelf_name.to_owned().into()])
      .await
  }

  async fn active_stock_alerts(&self, shelf_name: &str) -> Result<Vec<Alert>> {
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM alerts
       WHERE shelf_name = ? AND rack_name IS NULL AND status = 'active'
         AND alert_type IN {STOCK_TIER_SQL}
       ORDER BY id"
    );
    self
      .select_alerts(sql, vec![shelf_name.to_owned().into()])
      .await
  }

  async fn find_active_misplacement(
    &self,
    shelf_name: &str,
    actual_product: &str,
  ) -> Result<Option<Alert>> {
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM alerts
       WHERE shelf_name = ? AND alert_type = 'misplaced_item'
         AND actual_product = ? AND status = 'active'
       ORDER BY id LIMIT 1"
    );
    self
      .select_one_alert(
        sql,
        vec![shelf_name.to_owned().into(), actual_product.to_owned().into()],
      )
      .await
  }

  async fn find_active_missing_items(&self, shelf_name: &str) -> Result<Option<Alert>> {
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM alerts
       WHERE shelf_name = ? AND alert_type = 'misplaced_item'
         AND status = 'active' AND instr(title, ?) > 0
       ORDER BY id LIMIT 1"
    );
    self
      .select_one_alert(
        sql,
        vec![
          shelf_name.to_owned().into(),
          MISSING_ITEMS_MARKER.to_owned().into(),
        ],
      )
      .await
  }

  // ── Reads ─────────────────────────────────────────────────────────────

  async fn get_alert(&self, id: AlertId) -> Result<Option<Alert>> {
    let sql = format!("SELECT {ALERT_COLUMNS} FROM alerts WHERE id = ?");
    self.select_one_alert(sql, vec![id.0.into()]).await
  }

  async fn query_alerts(&self, query: &AlertQuery) -> Result<Vec<Alert>> {
    let (where_clause, mut values) = query_filters(query);
    let order = match query.sort {
      AlertSort::Newest => "ORDER BY created_at DESC, id DESC",
      AlertSort::Severity => "ORDER BY priority_rank DESC, created_at DESC, id DESC",
    };
    let sql = format!(
      "SELECT {ALERT_COLUMNS} FROM alerts {where_clause} {order} LIMIT ? OFFSET ?"
    );
    values.push((query.limit.unwrap_or(100) as i64).into());
    values.push((query.offset.unwrap_or(0) as i64).into());
    self.select_alerts(sql, values).await
  }

  async fn count_alerts(&self, query: &AlertQuery) -> Result<u64> {
    let (where_clause, values) = query_filters(query);
    let sql = format!("SELECT COUNT(*) FROM alerts {where_clause}");
    let count: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(&sql, rusqlite::params_from_iter(values), |row| {
          row.get(0)
        })?)
      })
      .await?;
    Ok(count as u64)
  }

  async fn history_for(&self, id: AlertId) -> Result<Vec<AlertHistoryRecord>> {
    let alert_id = id.0;
    let raws: Vec<RawHistory> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(
          "SELECT id, alert_id, action, performed_by, notes, timestamp
           FROM alert_history WHERE alert_id = ?1
           ORDER BY timestamp DESC, id DESC",
        )?;
        let rows = stmt
          .query_map(rusqlite::params![alert_id], |row| {
            Ok(RawHistory {
              id:           row.get(0)?,
              alert_id:     row.get(1)?,
              action:       row.get(2)?,
              performed_by: row.get(3)?,
              notes:        row.get(4)?,
              timestamp:    row.get(5)?,
            })
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;
    raws.into_iter().map(RawHistory::into_record).collect()
  }

  async fn statistics(&self) -> Result<AlertStatistics> {
    let stats = self
      .conn
      .call(|conn| {
        let count = |sql: &str| -> rusqlite::Result<u64> {
          conn.query_row(sql, [], |row| row.get::<_, i64>(0)).map(|n| n as u64)
        };
        Ok(AlertStatistics {
          total_active:        count(
            "SELECT COUNT(*) FROM alerts WHERE status = 'active'",
          )?,
          critical_alerts:     count(
            "SELECT COUNT(*) FROM alerts
             WHERE status = 'active' AND priority = 'critical'",
          )?,
          high_alerts:         count(
            "SELECT COUNT(*) FROM alerts
             WHERE status = 'active' AND priority = 'high'",
          )?,
          stock_alerts:        count(&format!(
            "SELECT COUNT(*) FROM alerts
             WHERE status = 'active' AND alert_type IN {STOCK_TIER_SQL}"
          ))?,
          misplaced_alerts:    count(
            "SELECT COUNT(*) FROM alerts
             WHERE status = 'active' AND alert_type = 'misplaced_item'",
          )?,
          total_alerts:        count("SELECT COUNT(*) FROM alerts")?,
          resolved_alerts:     count(
            "SELECT COUNT(*) FROM alerts WHERE status = 'resolved'",
          )?,
          acknowledged_alerts: count(
            "SELECT COUNT(*) FROM alerts WHERE status = 'acknowledged'",
          )?,
        })
      })
      .await?;
    Ok(stats)
  }

  // ── Atomic writes ─────────────────────────────────────────────────────

  async fn apply(&self, batch: WriteBatch) -> Result<Vec<Alert>> {
    let audit = self.audit;
    let raws: Vec<RawAlert> = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let mut touched = Vec::with_capacity(batch.writes.len());
        for write in batch.writes {
          let now = encode_dt(Utc::now());
          match write {
            AlertWrite::Create { alert, note } => {
              let id = insert_alert(&tx, &alert, &now)?;
              append_history(&tx, audit, id, &note, &now)?;
              touched.push(must_fetch(&tx, id)?);
            }
            AlertWrite::Update { id, update, note } => {
              update_alert(&tx, id, &update, &now)?;
              append_history(&tx, audit, id.0, &note, &now)?;
              touched.push(must_fetch(&tx, id.0)?);
            }
            AlertWrite::SetStatus { id, status, note } => {
              set_status(&tx, id, status, &now)?;
              append_history(&tx, audit, id.0, &note, &now)?;
              touched.push(must_fetch(&tx, id.0)?);
            }
          }
        }
        tx.commit()?;
        Ok(touched)
      })
      .await
      .map_err(Error::from_db)?;
    raws.into_iter().map(RawAlert::into_alert).collect()
  }
}
