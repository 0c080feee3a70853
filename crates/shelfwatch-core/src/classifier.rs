//! Threshold classification: fill percentage → (alert type, priority).
//!
//! A pure function of the configured cut points and the input. The caller is
//! responsible for keeping the input within [0, 100]; the classifier does not
//! clamp.

use serde::{Deserialize, Serialize};

use crate::alert::{AlertPriority, AlertType};

/// Configurable stock cut points, evaluated in ascending severity order with
/// strictly-less-than boundaries.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StockThresholds {
  /// Below this fill (and above zero) the shelf is critically low.
  pub critical: f64,
  pub high:     f64,
  pub medium:   f64,
  /// At or above this fill no stock alert is raised.
  pub low:      f64,
}

impl Default for StockThresholds {
  fn default() -> Self {
    Self {
      critical: 10.0,
      high:     25.0,
      medium:   50.0,
      low:      75.0,
    }
  }
}

impl StockThresholds {
  /// Classify a fill percentage. Returns `None` when the stock level needs
  /// no alert (fill at or above the `low` cut point).
  pub fn classify(&self, fill: f64) -> Option<(AlertType, AlertPriority)> {
    if fill < self.critical {
      let ty = if fill > 0.0 {
        AlertType::CriticalStock
      } else {
        AlertType::OutOfStock
      };
      Some((ty, AlertPriority::Critical))
    } else if fill < self.high {
      Some((AlertType::HighStock, AlertPriority::High))
    } else if fill < self.medium {
      Some((AlertType::MediumStock, AlertPriority::Medium))
    } else if fill < self.low {
      Some((AlertType::LowStock, AlertPriority::Low))
    } else {
      None
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn classify(fill: f64) -> Option<(AlertType, AlertPriority)> {
    StockThresholds::default().classify(fill)
  }

  #[test]
  fn boundary_classification() {
    assert_eq!(
      classify(9.9),
      Some((AlertType::CriticalStock, AlertPriority::Critical))
    );
    assert_eq!(
      classify(0.0),
      Some((AlertType::OutOfStock, AlertPriority::Critical))
    );
    assert_eq!(
      classify(24.9),
      Some((AlertType::HighStock, AlertPriority::High))
    );
    assert_eq!(
      classify(49.9),
      Some((AlertType::MediumStock, AlertPriority::Medium))
    );
    assert_eq!(
      classify(74.9),
      Some((AlertType::LowStock, AlertPriority::Low))
    );
    assert_eq!(classify(75.0), None);
  }

  #[test]
  fn cut_points_are_exclusive() {
    // Exactly at a cut point falls into the next (less severe) tier.
    assert_eq!(
      classify(10.0),
      Some((AlertType::HighStock, AlertPriority::High))
    );
    assert_eq!(
      classify(25.0),
      Some((AlertType::MediumStock, AlertPriority::Medium))
    );
    assert_eq!(
      classify(50.0),
      Some((AlertType::LowStock, AlertPriority::Low))
    );
  }

  #[test]
  fn full_shelf_needs_no_alert() {
    assert_eq!(classify(100.0), None);
  }

  #[test]
  fn custom_thresholds_are_honoured() {
    let t = StockThresholds {
      critical: 5.0,
      high:     15.0,
      medium:   30.0,
      low:      60.0,
    };
    assert_eq!(
      t.classify(7.0),
      Some((AlertType::HighStock, AlertPriority::High))
    );
    assert_eq!(t.classify(60.0), None);
  }
}
