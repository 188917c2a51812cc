//! Tabular dataset container shared by the loader, resolver, and pipeline.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Single cell in a data table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CellValue {
    /// A finite numeric value.
    Number(f32),
    /// A non-numeric value kept verbatim.
    Text(String),
    /// An absent value, to be filled by imputation.
    Missing,
}

impl CellValue {
    /// Return the numeric value, if any.
    pub fn as_number(&self) -> Option<f32> {
        match self {
            CellValue::Number(value) => Some(*value),
            _ => None,
        }
    }

    /// Render the cell as a category key for encoding and counting.
    ///
    /// Numbers in otherwise-textual columns are folded into their display
    /// form so fitting and inference agree on category identity.
    pub fn category(&self) -> Option<Cow<'_, str>> {
        match self {
            CellValue::Number(value) => Some(Cow::Owned(format!("{value}"))),
            CellValue::Text(text) => Some(Cow::Borrowed(text)),
            CellValue::Missing => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, CellValue::Missing)
    }
}

/// Column-ordered, row-major tabular dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct DataTable {
    /// Header names in file order.
    pub columns: Vec<String>,
    /// Rows; each row holds one cell per column.
    pub rows: Vec<Vec<CellValue>>,
}

impl DataTable {
    /// Find the index of a column by exact name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    /// Iterate the cells of one column across all rows.
    pub fn column_cells(&self, index: usize) -> impl Iterator<Item = &CellValue> {
        self.rows.iter().map(move |row| &row[index])
    }

    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn category_folds_numbers_to_text() {
        assert_eq!(CellValue::Number(3.0).category().unwrap(), "3");
        assert_eq!(CellValue::Text("reef".into()).category().unwrap(), "reef");
        assert!(CellValue::Missing.category().is_none());
    }

    #[test]
    fn column_lookup_by_name() {
        let table = DataTable {
            columns: vec!["magnitude".into(), "tsunami".into()],
            rows: vec![vec![CellValue::Number(6.1), CellValue::Number(1.0)]],
        };
        assert_eq!(table.column_index("tsunami"), Some(1));
        assert_eq!(table.column_index("depth"), None);
        assert_eq!(
            table.column_cells(0).next().unwrap().as_number(),
            Some(6.1)
        );
    }
}
