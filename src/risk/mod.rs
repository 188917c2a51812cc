//! Risk inference and tiering over a trained pipeline.

pub mod predict;
pub mod tier;

pub use predict::{PredictError, PredictionRequest, predict_probability};
pub use tier::{MEDIUM_FRACTION, RiskTier, tier};
