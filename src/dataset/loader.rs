//! Dataset loading: uploaded CSV text, an on-disk CSV path, or the
//! deterministic synthetic fallback.

use std::fs;
use std::path::Path;

use thiserror::Error;

use super::synthetic::{CATALOG_ROWS, CATALOG_SEED, synthetic_catalog};
use super::table::{CellValue, DataTable};

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("malformed dataset: {0}")]
    Parse(String),
}

/// Load a table from uploaded CSV text, a path hint, or the synthetic fallback.
///
/// Uploaded content wins over the path hint; a path hint that does not point
/// at a readable file falls through to the generated catalog rather than
/// erroring, so a fresh checkout works without any data on disk.
pub fn load(uploaded: Option<&str>, path_hint: Option<&Path>) -> Result<DataTable, DatasetError> {
    if let Some(text) = uploaded {
        return parse_csv(text);
    }
    if let Some(path) = path_hint {
        if path.is_file() {
            let text = fs::read_to_string(path)?;
            return parse_csv(&text);
        }
    }
    tracing::info!("No dataset supplied; generating the synthetic catalog");
    Ok(synthetic_catalog(CATALOG_SEED, CATALOG_ROWS))
}

/// Parse header-first CSV text into a table.
pub fn parse_csv(text: &str) -> Result<DataTable, DatasetError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_reader(text.as_bytes());

    let headers = reader
        .headers()
        .map_err(|err| DatasetError::Parse(err.to_string()))?;
    let columns: Vec<String> = headers.iter().map(|name| name.trim().to_string()).collect();
    if columns.is_empty() || columns.iter().all(|name| name.is_empty()) {
        return Err(DatasetError::Parse("empty header row".to_string()));
    }

    let mut rows = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record =
            record.map_err(|err| DatasetError::Parse(format!("line {}: {err}", idx + 2)))?;
        rows.push(record.iter().map(parse_cell).collect());
    }
    if rows.is_empty() {
        return Err(DatasetError::Parse("no data rows".to_string()));
    }
    Ok(DataTable { columns, rows })
}

fn parse_cell(field: &str) -> CellValue {
    let trimmed = field.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("nan") {
        return CellValue::Missing;
    }
    match trimmed.parse::<f32>() {
        Ok(value) if value.is_finite() => CellValue::Number(value),
        _ => CellValue::Text(trimmed.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn parses_numeric_and_text_cells() {
        let table = parse_csv("magnitude,region,tsunami\n6.1,pacific,1\n5.2,atlantic,0\n").unwrap();
        assert_eq!(table.columns, ["magnitude", "region", "tsunami"]);
        assert_eq!(table.n_rows(), 2);
        assert_eq!(table.rows[0][0], CellValue::Number(6.1));
        assert_eq!(table.rows[0][1], CellValue::Text("pacific".into()));
        assert_eq!(table.rows[1][2], CellValue::Number(0.0));
    }

    #[test]
    fn empty_and_nan_cells_are_missing() {
        let table = parse_csv("magnitude,depth\n6.1,\n5.2,NaN\n").unwrap();
        assert_eq!(table.rows[0][1], CellValue::Missing);
        assert_eq!(table.rows[1][1], CellValue::Missing);
    }

    #[test]
    fn ragged_rows_fail_to_parse() {
        let err = parse_csv("magnitude,depth\n6.1\n").unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
    }

    #[test]
    fn header_only_input_fails_to_parse() {
        let err = parse_csv("magnitude,depth\n").unwrap_err();
        assert!(matches!(err, DatasetError::Parse(_)));
    }

    #[test]
    fn uploaded_content_wins_over_path_hint() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, "magnitude,tsunami\n9.9,1\n").unwrap();

        let table = load(Some("magnitude,tsunami\n5.0,0\n"), Some(&path)).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Number(5.0));
    }

    #[test]
    fn path_hint_is_read_when_present() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("catalog.csv");
        fs::write(&path, "magnitude,tsunami\n9.9,1\n").unwrap();

        let table = load(None, Some(&path)).unwrap();
        assert_eq!(table.rows[0][0], CellValue::Number(9.9));
    }

    #[test]
    fn missing_path_falls_back_to_synthetic() {
        let dir = tempdir().unwrap();
        let table = load(None, Some(&dir.path().join("nope.csv"))).unwrap();
        assert_eq!(table.n_rows(), CATALOG_ROWS);
        assert_eq!(table.columns.last().map(String::as_str), Some("tsunami"));
    }
}
