//! Read-only collaborator types: shelves, expected inventory, and staff
//! assignments. The engine consumes these; it never administers them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A physical shelf known to the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Shelf {
  pub name:      String,
  pub capacity:  i64,
  pub is_active: bool,
}

/// A product expected to live on a particular shelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InventoryItem {
  pub shelf_name:     String,
  pub product_number: String,
  pub product_name:   String,
  pub category:       Option<String>,
  pub rack_name:      Option<String>,
}

/// An active shelf-to-employee assignment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAssignment {
  pub shelf_name:  String,
  pub employee_id: String,
  pub is_active:   bool,
  pub assigned_at: DateTime<Utc>,
}
