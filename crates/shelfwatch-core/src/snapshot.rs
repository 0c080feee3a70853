//! The snapshot input contract: one detection event for one shelf.

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// A shelf-sensor snapshot as produced by the upstream detector.
///
/// All three fields are required on the wire; `items_detected` may be empty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfSnapshot {
  pub shelf_number:     String,
  pub empty_percentage: f64,
  pub items_detected:   Vec<String>,
}

impl ShelfSnapshot {
  /// Boundary validation, run before any persistence access.
  ///
  /// The classifier itself never clamps, so out-of-range percentages must be
  /// rejected here (both 0 and 100 are legal endpoints).
  pub fn validate(&self) -> Result<()> {
    if self.shelf_number.trim().is_empty() {
      return Err(Error::InvalidSnapshot(
        "'shelf_number' is required".into(),
      ));
    }
    if !self.empty_percentage.is_finite()
      || !(0.0..=100.0).contains(&self.empty_percentage)
    {
      return Err(Error::InvalidSnapshot(format!(
        "'empty_percentage' must be within 0..=100 (got {})",
        self.empty_percentage
      )));
    }
    Ok(())
  }

  /// How full the shelf is, derived from the reported emptiness.
  pub fn fill_percentage(&self) -> f64 {
    100.0 - self.empty_percentage
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn snapshot(empty: f64) -> ShelfSnapshot {
    ShelfSnapshot {
      shelf_number:     "A1".into(),
      empty_percentage: empty,
      items_detected:   vec![],
    }
  }

  #[test]
  fn endpoints_are_legal() {
    assert!(snapshot(0.0).validate().is_ok());
    assert!(snapshot(100.0).validate().is_ok());
  }

  #[test]
  fn out_of_range_is_rejected() {
    assert!(snapshot(-0.1).validate().is_err());
    assert!(snapshot(100.1).validate().is_err());
    assert!(snapshot(f64::NAN).validate().is_err());
  }

  #[test]
  fn blank_shelf_number_is_rejected() {
    let s = ShelfSnapshot {
      shelf_number:     "  ".into(),
      empty_percentage: 50.0,
      items_detected:   vec![],
    };
    assert!(s.validate().is_err());
  }

  #[test]
  fn fill_is_complement_of_empty() {
    assert_eq!(snapshot(25.0).fill_percentage(), 75.0);
    assert_eq!(snapshot(100.0).fill_percentage(), 0.0);
  }
}
