//! Decision core for tsunami risk prediction from earthquake catalogs.
//!
//! Loads (or synthesizes) a tabular catalog, resolves its target and feature
//! layout, trains a preprocessing + forest pipeline once and caches it on
//! disk, then serves deterministic single-row risk predictions bucketed into
//! ordinal tiers. Presentation surfaces live in the CLI bins.
/// Application directory helpers.
pub mod app_dirs;
/// TOML-backed runtime configuration.
pub mod config;
/// Dataset loading, synthesis, and schema resolution.
pub mod dataset;
/// Logging setup.
pub mod logging;
/// Model training building blocks.
pub mod ml;
/// Training pipeline orchestration.
pub mod pipeline;
/// Risk inference and tiering.
pub mod risk;
/// Durable model artifact storage.
pub mod store;
