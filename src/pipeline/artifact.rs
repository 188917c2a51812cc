//! Persisted training artifact: the fitted pipeline and its metadata.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ml::forest::ForestModel;
use crate::ml::preprocess::Preprocessor;

/// Current artifact format version.
pub const PIPELINE_MODEL_VERSION: i64 = 1;

/// Fitted preprocessing plus the fitted forest.
///
/// Created once by training, then only ever read: inference reuses the exact
/// imputation statistics and encoding categories captured here.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainedPipeline {
    /// Artifact format version.
    pub model_version: i64,
    /// Fitted imputation + encoding transform.
    pub preprocess: Preprocessor,
    /// Fitted forest classifier.
    pub forest: ForestModel,
}

impl TrainedPipeline {
    /// Validate structural invariants of a (re)loaded pipeline.
    pub fn validate(&self) -> Result<(), String> {
        if self.model_version != PIPELINE_MODEL_VERSION {
            return Err(format!(
                "Unsupported model_version {} (expected {PIPELINE_MODEL_VERSION})",
                self.model_version
            ));
        }
        if self.preprocess.width() != self.forest.feature_len {
            return Err(format!(
                "Preprocessor width {} does not match forest width {}",
                self.preprocess.width(),
                self.forest.feature_len
            ));
        }
        self.forest.validate()
    }
}

/// Metadata captured alongside a trained pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelMetadata {
    /// Accuracy on the held-out split.
    pub accuracy: f32,
    /// ROC AUC on the held-out split; `None` when the split held one class.
    pub auc: Option<f32>,
    /// Name of the target column.
    pub target: String,
    /// Numeric feature columns, in training order.
    pub numeric_columns: Vec<String>,
    /// Categorical feature columns, in training order.
    pub categorical_columns: Vec<String>,
    /// Padded display range per numeric feature.
    pub feature_ranges: BTreeMap<String, (f32, f32)>,
    /// Observed median per numeric feature, used as the input default.
    pub numeric_defaults: BTreeMap<String, f32>,
    /// Numeric features exposed for interactive input, in column order.
    pub top_numeric: Vec<String>,
    /// Rows used for fitting.
    pub train_rows: usize,
    /// Rows used for evaluation.
    pub test_rows: usize,
    /// SHA-256 of the serialized model blob, stamped when saved.
    #[serde(default)]
    pub model_sha256: String,
}
