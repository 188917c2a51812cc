//! Random forest classifier for imputed, one-hot encoded tabular rows.
//!
//! Bootstrap-aggregated gini trees with binned split search and optional
//! class-balanced reweighting per bootstrap draw.

mod model;
mod train;

pub use model::{DecisionTree, ForestModel, TreeNode};
pub use train::{TrainDataset, TrainOptions, train_forest};
