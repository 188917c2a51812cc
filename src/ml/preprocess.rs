//! Fitted preprocessing: imputation statistics plus one-hot encoding.
//!
//! Fit once on the training split, then applied unchanged at evaluation and
//! inference time. The statistics are part of the persisted model so a
//! reloaded pipeline imputes exactly as it did during training.

use serde::{Deserialize, Serialize};

use crate::dataset::schema::FeatureSpec;
use crate::dataset::table::{CellValue, DataTable};

/// Fitted statistics for one numeric feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NumericStats {
    /// Source column name.
    pub column: String,
    /// Median of the training values, substituted for missing cells.
    pub median: f32,
}

/// Fitted statistics for one categorical feature.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoricalStats {
    /// Source column name.
    pub column: String,
    /// Most frequent training value, substituted for missing cells.
    /// `None` when the training split held no values at all.
    pub mode: Option<String>,
    /// Categories observed during training, sorted; one output column each.
    /// Values outside this list encode to an all-zero block.
    pub categories: Vec<String>,
}

/// Fitted imputation + encoding transform over a feature layout.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Preprocessor {
    /// Numeric features in layout order.
    pub numeric: Vec<NumericStats>,
    /// Categorical features in layout order.
    pub categorical: Vec<CategoricalStats>,
}

/// Column indices of the preprocessor's features within one table.
#[derive(Debug, Clone)]
pub struct TableBinding {
    numeric: Vec<usize>,
    categorical: Vec<usize>,
}

impl Preprocessor {
    /// Fit imputation and encoding statistics on the given rows of a table.
    pub fn fit(table: &DataTable, spec: &FeatureSpec, rows: &[usize]) -> Result<Self, String> {
        if rows.is_empty() {
            return Err("Empty training split".to_string());
        }

        let mut numeric = Vec::with_capacity(spec.numeric.len());
        for name in &spec.numeric {
            let idx = table
                .column_index(name)
                .ok_or_else(|| format!("Missing numeric column '{name}'"))?;
            let mut values: Vec<f32> = rows
                .iter()
                .filter_map(|&row| table.rows[row][idx].as_number())
                .filter(|value| value.is_finite())
                .collect();
            numeric.push(NumericStats {
                column: name.clone(),
                median: median(&mut values).unwrap_or(0.0),
            });
        }

        let mut categorical = Vec::with_capacity(spec.categorical.len());
        for name in &spec.categorical {
            let idx = table
                .column_index(name)
                .ok_or_else(|| format!("Missing categorical column '{name}'"))?;
            let mut counts: std::collections::BTreeMap<String, usize> = Default::default();
            for &row in rows {
                if let Some(category) = table.rows[row][idx].category() {
                    *counts.entry(category.into_owned()).or_default() += 1;
                }
            }
            let mode = counts
                .iter()
                .fold(None::<(&String, usize)>, |best, (category, &count)| {
                    match best {
                        Some((_, best_count)) if count <= best_count => best,
                        _ => Some((category, count)),
                    }
                })
                .map(|(category, _)| category.clone());
            categorical.push(CategoricalStats {
                column: name.clone(),
                mode,
                categories: counts.into_keys().collect(),
            });
        }

        Ok(Self {
            numeric,
            categorical,
        })
    }

    /// Width of the transformed feature vector.
    pub fn width(&self) -> usize {
        self.numeric.len()
            + self
                .categorical
                .iter()
                .map(|stats| stats.categories.len())
                .sum::<usize>()
    }

    /// Resolve this preprocessor's columns against a table once.
    pub fn bind(&self, table: &DataTable) -> Result<TableBinding, String> {
        let lookup = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| format!("Table is missing column '{column}'"))
        };
        Ok(TableBinding {
            numeric: self
                .numeric
                .iter()
                .map(|stats| lookup(&stats.column))
                .collect::<Result<_, _>>()?,
            categorical: self
                .categorical
                .iter()
                .map(|stats| lookup(&stats.column))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Transform one table row into a feature vector.
    pub fn transform_row(
        &self,
        table: &DataTable,
        binding: &TableBinding,
        row: usize,
    ) -> Vec<f32> {
        let cells = &table.rows[row];
        let numeric: Vec<CellValue> = binding
            .numeric
            .iter()
            .map(|&idx| cells[idx].clone())
            .collect();
        let categorical: Vec<CellValue> = binding
            .categorical
            .iter()
            .map(|&idx| cells[idx].clone())
            .collect();
        self.transform_values(&numeric, &categorical)
    }

    /// Transform aligned numeric/categorical cells into a feature vector.
    ///
    /// Missing numerics take the fitted median; missing categoricals take the
    /// fitted mode; categories unseen during fitting leave their block zero.
    pub fn transform_values(
        &self,
        numeric: &[CellValue],
        categorical: &[CellValue],
    ) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.width());
        for (stats, cell) in self.numeric.iter().zip(numeric) {
            let value = match cell.as_number() {
                Some(value) if value.is_finite() => value,
                _ => stats.median,
            };
            out.push(value);
        }
        for (stats, cell) in self.categorical.iter().zip(categorical) {
            let category = match cell.category() {
                Some(category) => Some(category.into_owned()),
                None => stats.mode.clone(),
            };
            let hot = category
                .and_then(|category| stats.categories.iter().position(|known| *known == category));
            for idx in 0..stats.categories.len() {
                out.push(if hot == Some(idx) { 1.0 } else { 0.0 });
            }
        }
        out
    }
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
