//! The alert lifecycle state machine.
//!
//! `active → acknowledged → resolved`, or `active → resolved` directly
//! (manually or system-triggered). `pending` and `resolved` are terminal in
//! this engine; reopening requires creating a new alert.

use crate::alert::AlertStatus;

/// A requested lifecycle transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
  Acknowledge,
  Resolve,
  /// System-triggered resolution when a stock condition clears.
  AutoResolve,
}

/// Return the target status if `transition` is legal from `from`.
pub fn apply(from: AlertStatus, transition: Transition) -> Option<AlertStatus> {
  match (from, transition) {
    (AlertStatus::Active, Transition::Acknowledge) => {
      Some(AlertStatus::Acknowledged)
    }
    (AlertStatus::Active, Transition::Resolve)
    | (AlertStatus::Acknowledged, Transition::Resolve)
    | (AlertStatus::Active, Transition::AutoResolve) => {
      Some(AlertStatus::Resolved)
    }
    _ => None,
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn acknowledge_only_from_active() {
    assert_eq!(
      apply(AlertStatus::Active, Transition::Acknowledge),
      Some(AlertStatus::Acknowledged)
    );
    assert_eq!(apply(AlertStatus::Acknowledged, Transition::Acknowledge), None);
    assert_eq!(apply(AlertStatus::Resolved, Transition::Acknowledge), None);
    assert_eq!(apply(AlertStatus::Pending, Transition::Acknowledge), None);
  }

  #[test]
  fn resolve_from_active_or_acknowledged() {
    assert_eq!(
      apply(AlertStatus::Active, Transition::Resolve),
      Some(AlertStatus::Resolved)
    );
    assert_eq!(
      apply(AlertStatus::Acknowledged, Transition::Resolve),
      Some(AlertStatus::Resolved)
    );
    assert_eq!(apply(AlertStatus::Resolved, Transition::Resolve), None);
    assert_eq!(apply(AlertStatus::Pending, Transition::Resolve), None);
  }

  #[test]
  fn auto_resolve_only_from_active() {
    assert_eq!(
      apply(AlertStatus::Active, Transition::AutoResolve),
      Some(AlertStatus::Resolved)
    );
    assert_eq!(apply(AlertStatus::Acknowledged, Transition::AutoResolve), None);
    assert_eq!(apply(AlertStatus::Pending, Transition::AutoResolve), None);
  }

  #[test]
  fn nothing_leaves_resolved() {
    for t in [Transition::Acknowledge, Transition::Resolve, Transition::AutoResolve] {
      assert_eq!(apply(AlertStatus::Resolved, t), None);
    }
  }
}
