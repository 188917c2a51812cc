//! Machine learning building blocks for the decision core.
//!
//! Preprocessing, the forest classifier, and evaluation metrics. The
//! pipeline module composes these; nothing here touches disk.

pub mod forest;
pub mod metrics;
pub mod preprocess;
