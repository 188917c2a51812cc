//! Single-row inference against a trained pipeline.

use std::collections::BTreeMap;

use thiserror::Error;

use crate::dataset::table::CellValue;
use crate::pipeline::artifact::TrainedPipeline;

#[derive(Debug, Error)]
pub enum PredictError {
    #[error("unknown numeric feature '{0}'")]
    UnknownNumeric(String),
    #[error("unknown categorical feature '{0}'")]
    UnknownCategorical(String),
}

/// Feature overrides for one prediction.
///
/// Anything not supplied stays missing and is imputed with the statistics
/// fitted at training time — numerics take the training median, categoricals
/// the training mode.
#[derive(Debug, Clone, Default)]
pub struct PredictionRequest {
    /// Numeric feature values, keyed by column name.
    pub numeric: BTreeMap<String, f32>,
    /// Categorical feature values, keyed by column name.
    pub categorical: BTreeMap<String, String>,
}

/// Positive-class probability for one synthesized row.
///
/// The row starts all-missing, user values are overlaid, and the stored
/// preprocessing runs exactly as it did during training — no statistics are
/// refit here.
pub fn predict_probability(
    pipeline: &TrainedPipeline,
    request: &PredictionRequest,
) -> Result<f32, PredictError> {
    let preprocess = &pipeline.preprocess;

    let mut numeric = vec![CellValue::Missing; preprocess.numeric.len()];
    for (name, &value) in &request.numeric {
        let idx = preprocess
            .numeric
            .iter()
            .position(|stats| stats.column == *name)
            .ok_or_else(|| PredictError::UnknownNumeric(name.clone()))?;
        numeric[idx] = CellValue::Number(value);
    }

    let mut categorical = vec![CellValue::Missing; preprocess.categorical.len()];
    for (name, value) in &request.categorical {
        let idx = preprocess
            .categorical
            .iter()
            .position(|stats| stats.column == *name)
            .ok_or_else(|| PredictError::UnknownCategorical(name.clone()))?;
        categorical[idx] = CellValue::Text(value.clone());
    }

    let features = preprocess.transform_values(&numeric, &categorical);
    Ok(pipeline.forest.predict_proba(&features))
}
