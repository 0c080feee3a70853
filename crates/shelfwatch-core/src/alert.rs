//! Alert — the central entity of the engine.
//!
//! Alerts are classified by a closed (type, priority, status) triple rather
//! than ad hoc strings. Mutations go through the store as [`NewAlert`] /
//! [`AlertUpdate`] values; every mutation is mirrored by an audit record
//! (see [`crate::history`]).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Marker substring identifying the per-shelf "missing items" alert. The
/// dedup lookup for that alert matches on this title fragment.
pub const MISSING_ITEMS_MARKER: &str = "MISSING ITEMS";

/// Author recorded on every engine-generated alert and system audit entry.
pub const SYSTEM_AUTHOR: &str = "system";

// ─── Identity ────────────────────────────────────────────────────────────────

/// Opaque numeric alert identifier, assigned by the store on creation.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct AlertId(pub i64);

impl core::fmt::Display for AlertId {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    core::fmt::Display::fmt(&self.0, f)
  }
}

// ─── Classification ──────────────────────────────────────────────────────────

/// The kind of condition an alert reports. The first five variants are the
/// stock severity tiers; misplacement, missing-item, and unknown-shelf alerts
/// all carry `MisplacedItem`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertType {
  LowStock,
  MediumStock,
  HighStock,
  CriticalStock,
  OutOfStock,
  MisplacedItem,
}

impl AlertType {
  /// Whether this type belongs to the shelf-level stock tier set.
  pub fn is_stock_tier(self) -> bool {
    !matches!(self, AlertType::MisplacedItem)
  }

  /// All stock tier types, used for dedup lookups and statistics.
  pub const STOCK_TIERS: [AlertType; 5] = [
    AlertType::LowStock,
    AlertType::MediumStock,
    AlertType::HighStock,
    AlertType::CriticalStock,
    AlertType::OutOfStock,
  ];
}

/// Alert urgency. Declaration order defines the total order used for
/// sorting, so comparisons are never string comparisons.
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum AlertPriority {
  Low,
  Medium,
  High,
  Critical,
}

impl AlertPriority {
  /// Integer rank persisted alongside the textual priority so SQL `ORDER BY`
  /// agrees with the Rust `Ord` impl.
  pub fn rank(self) -> i64 {
    match self {
      AlertPriority::Low => 0,
      AlertPriority::Medium => 1,
      AlertPriority::High => 2,
      AlertPriority::Critical => 3,
    }
  }

  /// Lowercase label used in generated alert text.
  pub fn label(self) -> &'static str {
    match self {
      AlertPriority::Low => "low",
      AlertPriority::Medium => "medium",
      AlertPriority::High => "high",
      AlertPriority::Critical => "critical",
    }
  }
}

/// Where an alert is in its lifecycle. Legal transitions are defined in
/// [`crate::lifecycle`]; `Pending` is only used for unknown-shelf alerts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertStatus {
  Active,
  Acknowledged,
  Resolved,
  Pending,
}

impl core::fmt::Display for AlertStatus {
  fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
    let s = match self {
      AlertStatus::Active => "active",
      AlertStatus::Acknowledged => "acknowledged",
      AlertStatus::Resolved => "resolved",
      AlertStatus::Pending => "pending",
    };
    f.write_str(s)
  }
}

// ─── Alert ───────────────────────────────────────────────────────────────────

/// A stateful operational alert. `rack_name` is always `None` for alerts
/// produced by this engine (shelf-level only).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
  pub id:                AlertId,
  pub alert_type:        AlertType,
  pub priority:          AlertPriority,
  pub status:            AlertStatus,

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

  /// Resolved once at creation from the assignment directory; never
  /// refreshed on update even if the shelf's assignment changes later.
  pub assigned_staff_id: Option<String>,
  pub created_by:        String,

  pub created_at:        DateTime<Utc>,
  pub updated_at:        DateTime<Utc>,
  pub acknowledged_at:   Option<DateTime<Utc>>,
  pub resolved_at:       Option<DateTime<Utc>>,
}

// ─── Write inputs ────────────────────────────────────────────────────────────

/// Input to an alert creation. `id`, `created_at`, and `updated_at` are
/// assigned by the store; `status` defaults to `Active` unless set.
#[derive(Debug, Clone)]
pub struct NewAlert {
  pub alert_type:        AlertType,
  pub priority:          AlertPriority,
  pub status:            AlertStatus,
  pub shelf_name:        String,
  pub category:          Option<String>,
  pub title:             String,
  pub message:           String,
  pub expected_product:  Option<String>,
  pub actual_product:    Option<String>,
  pub correct_location:  Option<String>,
  pub empty_percentage:  Option<f64>,
  pub fill_percentage:   Option<f64>,
  pub assigned_staff_id: Option<String>,
}

impl NewAlert {
  /// A shelf-level alert skeleton with all optional context unset.
  pub fn shelf_level(
    alert_type: AlertType,
    priority: AlertPriority,
    shelf_name: impl Into<String>,
    title: impl Into<String>,
    message: impl Into<String>,
  ) -> Self {
    Self {
      alert_type,
      priority,
      status: AlertStatus::Active,
      shelf_name: shelf_name.into(),
      category: None,
      title: title.into(),
      message: message.into(),
      expected_product: None,
      actual_product: None,
      correct_location: None,
      empty_percentage: None,
      fill_percentage: None,
      assigned_staff_id: None,
    }
  }
}

/// In-place update applied to an existing active alert during dedup.
/// `None` fields are left untouched; the store always bumps `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct AlertUpdate {
  pub alert_type:       Option<AlertType>,
  pub priority:         Option<AlertPriority>,
  pub title:            Option<String>,
  pub message:          Option<String>,
  pub category:         Option<String>,
  pub expected_product: Option<String>,
  pub correct_location: Option<Option<String>>,
  pub empty_percentage: Option<f64>,
  pub fill_percentage:  Option<f64>,
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn priority_order_is_total_and_ascending() {
    assert!(AlertPriority::Low < AlertPriority::Medium);
    assert!(AlertPriority::Medium < AlertPriority::High);
    assert!(AlertPriority::High < AlertPriority::Critical);
    assert!(AlertPriority::Low.rank() < AlertPriority::Critical.rank());
  }

  #[test]
  fn stock_tier_set_excludes_misplacement() {
    for t in AlertType::STOCK_TIERS {
      assert!(t.is_stock_tier());
    }
    assert!(!AlertType::MisplacedItem.is_stock_tier());
  }
}
