//! Feature and target resolution over a loaded table.
//!
//! The resolver runs once per dataset and produces an immutable
//! [`FeatureSpec`]: which column is the target, which features are numeric
//! vs categorical, and the display statistics the interactive surface needs.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::table::{CellValue, DataTable};

/// Substrings that mark a column as the prediction target.
const TARGET_KEYWORDS: &[&str] = &["tsunami", "label", "target", "occur"];

/// Maximum number of numeric features exposed for interactive input.
pub const MAX_INTERACTIVE_FEATURES: usize = 8;

/// Fraction of the observed span added to both ends of a display range.
const RANGE_PADDING: f32 = 0.05;

#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("dataset has no rows or columns")]
    EmptyTable,
    #[error("target column '{0}' must contain only 0/1 values")]
    TargetNotBinary(String),
    #[error("no numeric feature columns besides target '{0}'")]
    NoNumericFeatures(String),
}

/// Resolved feature layout for one dataset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureSpec {
    /// Name of the binary target column.
    pub target: String,
    /// Numeric feature columns, in table order.
    pub numeric: Vec<String>,
    /// Categorical feature columns, in table order.
    pub categorical: Vec<String>,
    /// Display range per numeric feature, padded beyond the observed span.
    pub ranges: BTreeMap<String, (f32, f32)>,
    /// Observed median per numeric feature, used as the input default.
    pub defaults: BTreeMap<String, f32>,
    /// Most frequent value per categorical feature.
    pub modes: BTreeMap<String, String>,
}

impl FeatureSpec {
    /// Numeric features exposed for interactive input, in column order.
    pub fn interactive_numeric(&self) -> &[String] {
        let n = self.numeric.len().min(MAX_INTERACTIVE_FEATURES);
        &self.numeric[..n]
    }
}

/// Resolve the target column and feature partition for a table.
pub fn resolve(table: &DataTable) -> Result<FeatureSpec, SchemaError> {
    if table.rows.is_empty() || table.columns.is_empty() {
        return Err(SchemaError::EmptyTable);
    }

    let target_idx = select_target(&table.columns);
    let target = table.columns[target_idx].clone();
    if !is_binary_column(table, target_idx) {
        return Err(SchemaError::TargetNotBinary(target));
    }

    let mut numeric = Vec::new();
    let mut categorical = Vec::new();
    for (idx, name) in table.columns.iter().enumerate() {
        if idx == target_idx {
            continue;
        }
        if is_numeric_column(table, idx) {
            numeric.push(name.clone());
        } else {
            categorical.push(name.clone());
        }
    }
    if numeric.is_empty() {
        return Err(SchemaError::NoNumericFeatures(target));
    }

    let mut ranges = BTreeMap::new();
    let mut defaults = BTreeMap::new();
    for name in &numeric {
        let idx = table
            .column_index(name)
            .expect("numeric feature taken from table columns");
        let mut values: Vec<f32> = table
            .column_cells(idx)
            .filter_map(CellValue::as_number)
            .collect();
        ranges.insert(name.clone(), padded_range(&values));
        if let Some(median) = median(&mut values) {
            defaults.insert(name.clone(), median);
        }
    }

    let mut modes = BTreeMap::new();
    for name in &categorical {
        let idx = table
            .column_index(name)
            .expect("categorical feature taken from table columns");
        if let Some(mode) = column_mode(table, idx) {
            modes.insert(name.clone(), mode);
        }
    }

    Ok(FeatureSpec {
        target,
        numeric,
        categorical,
        ranges,
        defaults,
        modes,
    })
}

/// Pick the target column: first keyword match, else the last column.
fn select_target(columns: &[String]) -> usize {
    columns
        .iter()
        .position(|name| {
            let lower = name.to_ascii_lowercase();
            TARGET_KEYWORDS.iter().any(|keyword| lower.contains(keyword))
        })
        .unwrap_or(columns.len() - 1)
}

/// A usable target holds a 0/1 number in every row.
fn is_binary_column(table: &DataTable, index: usize) -> bool {
    table
        .column_cells(index)
        .all(|cell| matches!(cell.as_number(), Some(value) if value == 0.0 || value == 1.0))
}

/// A feature is numeric when every present cell is a number and at least one is.
fn is_numeric_column(table: &DataTable, index: usize) -> bool {
    let mut saw_number = false;
    for cell in table.column_cells(index) {
        match cell {
            CellValue::Number(_) => saw_number = true,
            CellValue::Text(_) => return false,
            CellValue::Missing => {}
        }
    }
    saw_number
}

fn padded_range(values: &[f32]) -> (f32, f32) {
    let mut min = f32::INFINITY;
    let mut max = f32::NEG_INFINITY;
    for &value in values {
        min = min.min(value);
        max = max.max(value);
    }
    if !min.is_finite() || !max.is_finite() {
        return (0.0, 1.0);
    }
    let span = (max - min).max(1e-9);
    (min - RANGE_PADDING * span, max + RANGE_PADDING * span)
}

fn median(values: &mut [f32]) -> Option<f32> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f32::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

/// Most frequent category; ties break toward the lexicographically smallest.
fn column_mode(table: &DataTable, index: usize) -> Option<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for cell in table.column_cells(index) {
        if let Some(category) = cell.category() {
            *counts.entry(category.into_owned()).or_default() += 1;
        }
    }
    let mut best: Option<(String, usize)> = None;
    for (category, count) in counts {
        match &best {
            Some((_, best_count)) if count <= *best_count => {}
            _ => best = Some((category, count)),
        }
    }
    best.map(|(category, _)| category)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(columns: &[&str], rows: Vec<Vec<CellValue>>) -> DataTable {
        DataTable {
            columns: columns.iter().map(|name| name.to_string()).collect(),
            rows,
        }
    }

    fn num(value: f32) -> CellValue {
        CellValue::Number(value)
    }

    fn text(value: &str) -> CellValue {
        CellValue::Text(value.to_string())
    }

    #[test]
    fn keyword_column_is_selected_as_target() {
        let t = table(
            &["mag", "depth", "label"],
            vec![
                vec![num(6.0), num(20.0), num(1.0)],
                vec![num(5.0), num(90.0), num(0.0)],
            ],
        );
        let spec = resolve(&t).unwrap();
        assert_eq!(spec.target, "label");
        assert_eq!(spec.numeric, ["mag", "depth"]);
    }

    #[test]
    fn last_column_is_the_fallback_target() {
        let t = table(
            &["mag", "depth", "outcome"],
            vec![
                vec![num(6.0), num(20.0), num(1.0)],
                vec![num(5.0), num(90.0), num(0.0)],
            ],
        );
        assert_eq!(resolve(&t).unwrap().target, "outcome");
    }

    #[test]
    fn keyword_match_is_case_insensitive_and_substring() {
        let t = table(
            &["Tsunami_Occurred", "mag"],
            vec![
                vec![num(0.0), num(5.0)],
                vec![num(1.0), num(6.0)],
            ],
        );
        assert_eq!(resolve(&t).unwrap().target, "Tsunami_Occurred");
    }

    #[test]
    fn mixed_columns_are_categorical() {
        let t = table(
            &["mag", "region", "tsunami"],
            vec![
                vec![num(6.0), text("pacific"), num(1.0)],
                vec![num(5.0), num(4.0), num(0.0)],
            ],
        );
        let spec = resolve(&t).unwrap();
        assert_eq!(spec.numeric, ["mag"]);
        assert_eq!(spec.categorical, ["region"]);
    }

    #[test]
    fn categorical_only_features_are_rejected() {
        let t = table(
            &["region", "tsunami"],
            vec![
                vec![text("pacific"), num(1.0)],
                vec![text("atlantic"), num(0.0)],
            ],
        );
        assert!(matches!(
            resolve(&t),
            Err(SchemaError::NoNumericFeatures(_))
        ));
    }

    #[test]
    fn non_binary_target_is_rejected() {
        let t = table(
            &["mag", "tsunami"],
            vec![vec![num(6.0), num(2.0)], vec![num(5.0), num(0.0)]],
        );
        assert!(matches!(resolve(&t), Err(SchemaError::TargetNotBinary(_))));
    }

    #[test]
    fn missing_target_cells_are_rejected() {
        let t = table(
            &["mag", "tsunami"],
            vec![
                vec![num(6.0), num(1.0)],
                vec![num(5.0), CellValue::Missing],
            ],
        );
        assert!(matches!(resolve(&t), Err(SchemaError::TargetNotBinary(_))));
    }

    #[test]
    fn ranges_are_padded_by_five_percent_of_span() {
        let t = table(
            &["mag", "tsunami"],
            vec![
                vec![num(4.0), num(0.0)],
                vec![num(6.0), num(1.0)],
            ],
        );
        let spec = resolve(&t).unwrap();
        let (low, high) = spec.ranges["mag"];
        assert!((low - 3.9).abs() < 1e-6);
        assert!((high - 6.1).abs() < 1e-6);
    }

    #[test]
    fn defaults_are_column_medians() {
        let t = table(
            &["mag", "tsunami"],
            vec![
                vec![num(4.0), num(0.0)],
                vec![num(5.0), num(0.0)],
                vec![num(9.0), num(1.0)],
            ],
        );
        assert_eq!(resolve(&t).unwrap().defaults["mag"], 5.0);
    }

    #[test]
    fn mode_ties_break_to_smallest_category() {
        let t = table(
            &["mag", "region", "tsunami"],
            vec![
                vec![num(6.0), text("pacific"), num(1.0)],
                vec![num(5.0), text("atlantic"), num(0.0)],
            ],
        );
        assert_eq!(resolve(&t).unwrap().modes["region"], "atlantic");
    }

    #[test]
    fn interactive_features_cap_at_eight() {
        let columns: Vec<String> = (0..10)
            .map(|idx| format!("f{idx}"))
            .chain(["tsunami".to_string()])
            .collect();
        let names: Vec<&str> = columns.iter().map(String::as_str).collect();
        let rows = vec![
            (0..10).map(|idx| num(idx as f32)).chain([num(0.0)]).collect(),
            (0..10).map(|idx| num(idx as f32 + 1.0)).chain([num(1.0)]).collect(),
        ];
        let spec = resolve(&table(&names, rows)).unwrap();
        assert_eq!(spec.interactive_numeric().len(), 8);
        assert_eq!(spec.interactive_numeric()[0], "f0");
    }
}
