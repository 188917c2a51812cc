//! Train-or-load orchestration around the artifact store.

pub mod artifact;
pub mod split;

pub use artifact::{ModelMetadata, PIPELINE_MODEL_VERSION, TrainedPipeline};
pub use split::{SplitError, SplitIndices, stratified_split};

use thiserror::Error;

use crate::dataset::schema::FeatureSpec;
use crate::dataset::table::DataTable;
use crate::ml::forest::{self, TrainOptions};
use crate::ml::metrics::{ConfusionMatrix, roc_auc};
use crate::ml::preprocess::Preprocessor;
use crate::store::{ArtifactStore, StoreError};

/// Held-out fraction of the dataset.
pub const TEST_FRACTION: f64 = 0.2;
/// Seed for the stratified split.
pub const SPLIT_SEED: u64 = 42;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("stratified split failed: {0}")]
    Split(#[from] SplitError),
    #[error("training failed: {0}")]
    Train(String),
    #[error("artifact store error: {0}")]
    Store(#[from] StoreError),
}

/// Return the stored artifact, or train one and persist it.
///
/// Cache-first, not cache-validate: an existing artifact is reused without
/// checking that it was trained on this dataset. A changed dataset therefore
/// keeps serving the old model until the store is cleared — a deliberate
/// tradeoff that makes reloads instant.
pub fn train_or_load(
    table: &DataTable,
    spec: &FeatureSpec,
    store: &ArtifactStore,
    options: &TrainOptions,
) -> Result<(TrainedPipeline, ModelMetadata), PipelineError> {
    if store.has() {
        tracing::info!(
            "Reusing model artifact at {} (dataset identity is not checked)",
            store.dir().display()
        );
        return Ok(store.load()?);
    }
    let (pipeline, meta) = train(table, spec, options)?;
    let meta = store.save(&pipeline, meta)?;
    tracing::info!("Model artifact saved to {}", store.dir().display());
    Ok((pipeline, meta))
}

/// Fit the preprocessor and forest, then evaluate on the held-out split.
pub fn train(
    table: &DataTable,
    spec: &FeatureSpec,
    options: &TrainOptions,
) -> Result<(TrainedPipeline, ModelMetadata), PipelineError> {
    let labels = target_labels(table, spec)?;
    let split = stratified_split(&labels, TEST_FRACTION, SPLIT_SEED)?;
    tracing::info!(
        train_rows = split.train.len(),
        test_rows = split.test.len(),
        trees = options.trees,
        "Training forest"
    );

    let preprocess = Preprocessor::fit(table, spec, &split.train).map_err(PipelineError::Train)?;
    let binding = preprocess.bind(table).map_err(PipelineError::Train)?;

    let transform_rows = |rows: &[usize]| -> Vec<Vec<f32>> {
        rows.iter()
            .map(|&row| preprocess.transform_row(table, &binding, row))
            .collect()
    };
    let gather_labels =
        |rows: &[usize]| -> Vec<u8> { rows.iter().map(|&row| labels[row]).collect() };

    let train_set = forest::TrainDataset {
        feature_len: preprocess.width(),
        x: transform_rows(&split.train),
        y: gather_labels(&split.train),
    };
    let model = forest::train_forest(&train_set, options).map_err(PipelineError::Train)?;

    let test_x = transform_rows(&split.test);
    let test_y = gather_labels(&split.test);
    let probabilities: Vec<f32> = test_x.iter().map(|row| model.predict_proba(row)).collect();
    let mut cm = ConfusionMatrix::new();
    for (&truth, &probability) in test_y.iter().zip(&probabilities) {
        cm.add(truth, u8::from(probability >= 0.5));
    }
    let auc = roc_auc(&probabilities, &test_y);

    let meta = ModelMetadata {
        accuracy: cm.accuracy(),
        auc,
        target: spec.target.clone(),
        numeric_columns: spec.numeric.clone(),
        categorical_columns: spec.categorical.clone(),
        feature_ranges: spec.ranges.clone(),
        numeric_defaults: spec.defaults.clone(),
        top_numeric: spec.interactive_numeric().to_vec(),
        train_rows: split.train.len(),
        test_rows: split.test.len(),
        model_sha256: String::new(),
    };
    let pipeline = TrainedPipeline {
        model_version: PIPELINE_MODEL_VERSION,
        preprocess,
        forest: model,
    };
    Ok((pipeline, meta))
}

/// Pull the binary target column out of the table.
fn target_labels(table: &DataTable, spec: &FeatureSpec) -> Result<Vec<u8>, PipelineError> {
    let idx = table
        .column_index(&spec.target)
        .ok_or_else(|| PipelineError::Train(format!("Missing target column '{}'", spec.target)))?;
    table
        .column_cells(idx)
        .map(|cell| match cell.as_number() {
            Some(value) if value == 0.0 || value == 1.0 => Ok(value as u8),
            _ => Err(PipelineError::Train(format!(
                "Target column '{}' holds a non-binary value",
                spec.target
            ))),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::schema;
    use crate::dataset::table::CellValue;
    use tempfile::tempdir;

    fn toy_table(rows: usize) -> DataTable {
        // Positive iff the single feature is above the midpoint.
        let rows: Vec<Vec<CellValue>> = (0..rows)
            .map(|idx| {
                let value = idx as f32;
                let label = f32::from(u8::from(idx >= rows / 2));
                vec![CellValue::Number(value), CellValue::Number(label)]
            })
            .collect();
        DataTable {
            columns: vec!["mag".into(), "tsunami".into()],
            rows,
        }
    }

    fn small_options() -> TrainOptions {
        TrainOptions {
            trees: 20,
            max_depth: 6,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn trains_and_evaluates_a_toy_table() {
        let table = toy_table(60);
        let spec = schema::resolve(&table).unwrap();
        let (pipeline, meta) = train(&table, &spec, &small_options()).unwrap();

        pipeline.validate().unwrap();
        assert_eq!(meta.train_rows, 48);
        assert_eq!(meta.test_rows, 12);
        assert!(meta.accuracy > 0.7);
        assert!(meta.auc.unwrap() > 0.8);
        assert_eq!(meta.top_numeric, ["mag"]);
    }

    #[test]
    fn cache_first_returns_the_stored_artifact_unchanged() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        let table = toy_table(60);
        let spec = schema::resolve(&table).unwrap();

        let (first_pipeline, first_meta) =
            train_or_load(&table, &spec, &store, &small_options()).unwrap();

        // A different dataset must not trigger a retrain.
        let other = toy_table(40);
        let other_spec = schema::resolve(&other).unwrap();
        let (second_pipeline, second_meta) =
            train_or_load(&other, &other_spec, &store, &small_options()).unwrap();

        assert_eq!(first_pipeline, second_pipeline);
        assert_eq!(first_meta, second_meta);
        assert_eq!(second_meta.train_rows, 48);
    }

    #[test]
    fn singleton_class_fails_with_insufficient_data() {
        let mut table = toy_table(20);
        for row in table.rows.iter_mut().take(10) {
            row[1] = CellValue::Number(0.0);
        }
        // Exactly one positive left.
        for row in table.rows.iter_mut().skip(10).take(9) {
            row[1] = CellValue::Number(0.0);
        }
        let spec = schema::resolve(&table).unwrap();
        assert!(matches!(
            train(&table, &spec, &small_options()),
            Err(PipelineError::Split(SplitError::InsufficientData { .. }))
        ));
    }

    #[test]
    fn single_class_dataset_yields_undefined_auc() {
        let mut table = toy_table(30);
        for row in table.rows.iter_mut() {
            row[1] = CellValue::Number(0.0);
        }
        let spec = schema::resolve(&table).unwrap();
        let (_, meta) = train(&table, &spec, &small_options()).unwrap();
        assert!(meta.auc.is_none());
        assert_eq!(meta.accuracy, 1.0);
    }

    #[test]
    fn training_is_deterministic() {
        let table = toy_table(60);
        let spec = schema::resolve(&table).unwrap();
        let first = train(&table, &spec, &small_options()).unwrap();
        let second = train(&table, &spec, &small_options()).unwrap();
        assert_eq!(first.0, second.0);
        assert_eq!(first.1, second.1);
    }
}
