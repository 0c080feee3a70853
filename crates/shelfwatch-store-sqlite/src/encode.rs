//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as RFC 3339 strings. Closed enums are stored as
//! their snake_case wire tags.

use chrono::{DateTime, Utc};
use shelfwatch_core::{
  alert::{Alert, AlertId, AlertPriority, AlertStatus, AlertType},
  catalog::InventoryItem,
  history::{AlertHistoryRecord, HistoryAction},
};

use crate::{Error, Result};

// ─── DateTime<Utc> ───────────────────────────────────────────────────────────

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339()
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

// ─── AlertType ───────────────────────────────────────────────────────────────

pub fn encode_alert_type(t: AlertType) -> &'static str {
  match t {
    AlertType::LowStock => "low_stock",
    AlertType::MediumStock => "medium_stock",
    AlertType::HighStock => "high_stock",
    AlertType::CriticalStock => "critical_stock",
    AlertType::OutOfStock => "out_of_stock",
    AlertType::MisplacedItem => "misplaced_item",
  }
}

pub fn decode_alert_type(s: &str) -> Result<AlertType> {
  match s {
    "low_stock" => Ok(AlertType::LowStock),
    "medium_stock" => Ok(AlertType::MediumStock),
    "high_stock" => Ok(AlertType::HighStock),
    "critical_stock" => Ok(AlertType::CriticalStock),
    "out_of_stock" => Ok(AlertType::OutOfStock),
    "misplaced_item" => Ok(AlertType::MisplacedItem),
    other => Err(Error::UnknownEnum {
      column: "alert_type",
      value:  other.to_owned(),
    }),
  }
}

// ─── AlertPriority ───────────────────────────────────────────────────────────

pub fn encode_priority(p: AlertPriority) -> &'static str {
  match p {
    AlertPriority::Low => "low",
    AlertPriority::Medium => "medium",
    AlertPriority::High => "high",
    AlertPriority::Critical => "critical",
  }
}

pub fn decode_priority(s: &str) -> Result<AlertPriority> {
  match s {
    "low" => Ok(AlertPriority::Low),
    "medium" => Ok(AlertPriority::Medium),
    "high" => Ok(AlertPriority::High),
    "critical" => Ok(AlertPriority::Critical),
    other => Err(Error::UnknownEnum {
      column: "priority",
      value:  other.to_owned(),
    }),
  }
}

// ─── AlertStatus ─────────────────────────────────────────────────────────────

pub fn encode_status(s: AlertStatus) -> &'static str {
  match s {
    AlertStatus::Active => "active",
    AlertStatus::Acknowledged => "acknowledged",
    AlertStatus::Resolved => "resolved",
    AlertStatus::Pending => "pending",
  }
}

pub fn decode_status(s: &str) -> Result<AlertStatus> {
  match s {
    "active" => Ok(AlertStatus::Active),
    "acknowledged" => Ok(AlertStatus::Acknowledged),
    "resolved" => Ok(AlertStatus::Resolved),
    "pending" => Ok(AlertStatus::Pending),
    other => Err(Error::UnknownEnum {
      column: "status",
      value:  other.to_owned(),
    }),
  }
}

// ─── HistoryAction ───────────────────────────────────────────────────────────

pub fn decode_action(s: &str) -> Result<HistoryAction> {
  match s {
    "created" => Ok(HistoryAction::Created),
    "updated" => Ok(HistoryAction::Updated),
    "acknowledged" => Ok(HistoryAction::Acknowledged),
    "resolved" => Ok(HistoryAction::Resolved),
    "auto_resolved" => Ok(HistoryAction::AutoResolved),
    "unassigned" => Ok(HistoryAction::Unassigned),
    other => Err(Error::UnknownEnum {
      column: "action",
      value:  other.to_owned(),
    }),
  }
}

// ─── Row types ───────────────────────────────────────────────────────────────

/// Raw strings read directly from an `alerts` row.
pub struct RawAlert {
  pub id:                i64,
  pub alert_type:        String,
  pub priority:          String,
  pub status:            String,
  pub shelf_name:        String,
  pub rack_name:         Option<String>,
  pub product_number:    Option<String>,
  pub product_name:      Option<String>,
  pub category:          Option<String>,
  pub title:             String,
  pub message:           String,
  pub expected_product:  Option<String>,
  pub actual_product:    Option<String>,
  pub correct_location:  Option<String>,
  pub empty_percentage:  Option<f64>,
  pub fill_percentage:   Option<f64>,
  pub assigned_staff_id: Option<String>,
  pub created_by:        String,
  pub created_at:        String,
  pub updated_at:        String,
  pub acknowledged_at:   Option<String>,
  pub resolved_at:       Option<String>,
}

/// Column list matching [`raw_alert_from_row`]; keep the two in sync.
pub const ALERT_COLUMNS: &str = "id, alert_type, priority, status, \
   shelf_name, rack_name, product_number, product_name, category, title, \
   message, expected_product, actual_product, correct_location, \
   empty_percentage, fill_percentage, assigned_staff_id, created_by, \
   created_at, updated_at, acknowledged_at, resolved_at";

pub fn raw_alert_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<RawAlert> {
  Ok(RawAlert {
    id:                row.get(0)?,
    alert_type:        row.get(1)?,
    priority:          row.get(2)?,
    status:            row.get(3)?,
    shelf_name:        row.get(4)?,
    rack_name:         row.get(5)?,
    product_number:    row.get(6)?,
    product_name:      row.get(7)?,
    category:          row.get(8)?,
    title:             row.get(9)?,
    message:           row.get(10)?,
    expected_product:  row.get(11)?,
    actual_product:    row.get(12)?,
    correct_location:  row.get(13)?,
    empty_percentage:  row.get(14)?,
    fill_percentage:   row.get(15)?,
    assigned_staff_id: row.get(16)?,
    created_by:        row.get(17)?,
    created_at:        row.get(18)?,
    updated_at:        row.get(19)?,
    acknowledged_at:   row.get(20)?,
    resolved_at:       row.get(21)?,
  })
}

impl RawAlert {
  pub fn into_alert(self) -> Result<Alert> {
    Ok(Alert {
      id:                AlertId(self.id),
      alert_type:        decode_alert_type(&self.alert_type)?,
      priority:          decode_priority(&self.priority)?,
      status:            decode_status(&self.status)?,
      shelf_name:        self.shelf_name,
      rack_name:         self.rack_name,
      product_number:    self.product_number,
      product_name:      self.product_name,
      category:          self.category,
      title:             self.title,
      message:           self.message,
      expected_product:  self.expected_product,
      actual_product:    self.actual_product,
      correct_location:  self.correct_location,
      empty_percentage:  self.empty_percentage,
      fill_percentage:   self.fill_percentage,
      assigned_staff_id: self.assigned_staff_id,
      created_by:        self.created_by,
      created_at:        decode_dt(&self.created_at)?,
      updated_at:        decode_dt(&self.updated_at)?,
      acknowledged_at:   self
        .acknowledged_at
        .as_deref()
        .map(decode_dt)
        .transpose()?,
      resolved_at:       self.resolved_at.as_deref().map(decode_dt).transpose()?,
    })
  }
}

/// Raw strings read directly from an `alert_history` row.
pub struct RawHistory {
  pub id:           i64,
  pub alert_id:     i64,
  pub action:       String,
  pub performed_by: Option<String>,
  pub notes:        Option<String>,
  pub timestamp:    String,
}

impl RawHistory {
  pub fn into_record(self) -> Result<AlertHistoryRecord> {
    Ok(AlertHistoryRecord {
      id:           self.id,
      alert_id:     AlertId(self.alert_id),
      action:       decode_action(&self.action)?,
      performed_by: self.performed_by,
      notes:        self.notes,
      timestamp:    decode_dt(&self.timestamp)?,
    })
  }
}

/// Raw strings read directly from an `inventory` row.
pub struct RawItem {
  pub shelf_name:     String,
  pub product_number: String,
  pub product_name:   String,
  pub category:       Option<String>,
  pub rack_name:      Option<String>,
}

impl RawItem {
  pub fn into_item(self) -> InventoryItem {
    InventoryItem {
      shelf_name:     self.shelf_name,
      product_number: self.product_number,
      product_name:   self.product_name,
      category:       self.category,
      rack_name:      self.rack_name,
    }
  }
}
