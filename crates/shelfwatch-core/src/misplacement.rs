//! Misplacement detection: detected labels vs. expected inventory.
//!
//! Matching is deliberately permissive — a label and a product name match if
//! either contains the other, case-insensitively. The upstream detector emits
//! partial and abbreviated label text, so this trades false negatives for
//! usability and must be preserved.

use crate::catalog::InventoryItem;

/// At most this many product names are spelled out in a missing-items
/// message; the rest collapse into an "(and N more)" suffix.
pub const MISSING_LIST_CAP: usize = 5;

/// Bidirectional case-insensitive substring match.
pub fn labels_match(detected: &str, expected: &str) -> bool {
  let d = detected.to_lowercase();
  let e = expected.to_lowercase();
  d == e || d.contains(&e) || e.contains(&d)
}

/// Findings for one shelf snapshot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MisplacementReport {
  /// Detected labels that match no expected product on the shelf.
  pub misplaced: Vec<String>,
  /// Expected products that match no detected label. Empty when the
  /// snapshot detected nothing at all (an empty shelf is a stock problem,
  /// not a missing-items problem).
  pub missing:   Vec<String>,
}

/// Compare the snapshot's detected labels against the shelf's expected
/// inventory.
pub fn detect(
  expected: &[InventoryItem],
  detected: &[String],
) -> MisplacementReport {
  let mut report = MisplacementReport::default();

  if detected.is_empty() {
    return report;
  }

  for label in detected {
    if label.is_empty() {
      continue;
    }
    let is_expected = expected
      .iter()
      .any(|item| labels_match(label, &item.product_name));
    // A label detected more than once is a single finding; its dedup key
    // is the exact label text.
    if !is_expected && !report.misplaced.iter().any(|l| l == label) {
      report.misplaced.push(label.clone());
    }
  }

  // Missing check only runs when the shelf is not simply empty.
  for item in expected {
    let found = detected
      .iter()
      .any(|label| labels_match(label, &item.product_name));
    if !found {
      report.missing.push(item.product_name.clone());
    }
  }

  report
}

/// Human-readable summary of missing product names, capped at
/// [`MISSING_LIST_CAP`] with an "(and N more)" suffix.
pub fn missing_summary(names: &[String]) -> String {
  let mut text = names
    .iter()
    .take(MISSING_LIST_CAP)
    .cloned()
    .collect::<Vec<_>>()
    .join(", ");
  if names.len() > MISSING_LIST_CAP {
    text.push_str(&format!(" (and {} more)", names.len() - MISSING_LIST_CAP));
  }
  text
}

#[cfg(test)]
mod tests {
  use super::*;

  fn item(name: &str) -> InventoryItem {
    InventoryItem {
      shelf_name:     "A1".into(),
      product_number: "P-1".into(),
      product_name:   name.into(),
      category:       None,
      rack_name:      None,
    }
  }

  #[test]
  fn substring_match_is_bidirectional_and_case_insensitive() {
    assert!(labels_match("banana", "Organic Bananas"));
    assert!(labels_match("Organic Bananas", "banana"));
    assert!(labels_match("HAMMER", "hammer"));
    assert!(!labels_match("Hammer", "Organic Bananas"));
  }

  #[test]
  fn partial_label_is_not_misplaced() {
    let expected = vec![item("Organic Bananas")];
    let report = detect(&expected, &["banana".into()]);
    assert!(report.misplaced.is_empty());
    assert!(report.missing.is_empty());
  }

  #[test]
  fn unrelated_label_is_misplaced() {
    let expected = vec![item("Organic Bananas")];
    let report = detect(&expected, &["Hammer".into()]);
    assert_eq!(report.misplaced, vec!["Hammer".to_string()]);
    assert_eq!(report.missing, vec!["Organic Bananas".to_string()]);
  }

  #[test]
  fn repeated_label_is_a_single_finding() {
    let expected = vec![item("Organic Bananas")];
    let report =
      detect(&expected, &["Hammer".into(), "Hammer".into(), "hammer".into()]);
    // Exact-text dedup only: a case variant stays a separate finding.
    assert_eq!(
      report.misplaced,
      vec!["Hammer".to_string(), "hammer".to_string()]
    );
  }

  #[test]
  fn empty_labels_are_skipped() {
    let expected = vec![item("Organic Bananas")];
    let report = detect(&expected, &["".into(), "banana".into()]);
    assert!(report.misplaced.is_empty());
  }

  #[test]
  fn empty_snapshot_reports_nothing_missing() {
    let expected = vec![item("Organic Bananas"), item("Apples")];
    let report = detect(&expected, &[]);
    assert!(report.missing.is_empty());
    assert!(report.misplaced.is_empty());
  }

  #[test]
  fn missing_summary_caps_at_five() {
    let names: Vec<String> =
      (1..=7).map(|i| format!("Item {i}")).collect();
    let text = missing_summary(&names);
    assert_eq!(
      text,
      "Item 1, Item 2, Item 3, Item 4, Item 5 (and 2 more)"
    );
  }

  #[test]
  fn missing_summary_short_list_has_no_suffix() {
    let names: Vec<String> = vec!["A".into(), "B".into()];
    assert_eq!(missing_summary(&names), "A, B");
  }
}
