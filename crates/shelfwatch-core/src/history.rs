//! Alert audit trail — immutable, append-only.
//!
//! One record is written for every alert mutation. Records are never updated
//! or deleted; whether a failed history write aborts the parent mutation is
//! governed by the store's audit mode (best-effort by default).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::alert::AlertId;

/// What happened to the alert. The wire form matches the original audit
/// vocabulary (`created`, `updated`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HistoryAction {
  Created,
  Updated,
  Acknowledged,
  Resolved,
  AutoResolved,
  Unassigned,
}

impl HistoryAction {
  pub fn as_str(self) -> &'static str {
    match self {
      HistoryAction::Created => "created",
      HistoryAction::Updated => "updated",
      HistoryAction::Acknowledged => "acknowledged",
      HistoryAction::Resolved => "resolved",
      HistoryAction::AutoResolved => "auto_resolved",
      HistoryAction::Unassigned => "unassigned",
    }
  }
}

/// A persisted audit record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AlertHistoryRecord {
  pub id:           i64,
  pub alert_id:     AlertId,
  pub action:       HistoryAction,
  /// Employee id, or `None` for system-performed actions.
  pub performed_by: Option<String>,
  pub notes:        Option<String>,
  pub timestamp:    DateTime<Utc>,
}

/// Input to a history append. `id` and `timestamp` are set by the store.
#[derive(Debug, Clone)]
pub struct NewHistoryRecord {
  pub action:       HistoryAction,
  pub performed_by: Option<String>,
  pub notes:        Option<String>,
}

impl NewHistoryRecord {
  /// A system-performed entry (no employee attribution).
  pub fn system(action: HistoryAction, notes: impl Into<String>) -> Self {
    Self {
      action,
      performed_by: None,
      notes: Some(notes.into()),
    }
  }

  /// An entry attributed to an employee.
  pub fn by(
    action: HistoryAction,
    employee_id: impl Into<String>,
    notes: impl Into<String>,
  ) -> Self {
    Self {
      action,
      performed_by: Some(employee_id.into()),
      notes: Some(notes.into()),
    }
  }
}
