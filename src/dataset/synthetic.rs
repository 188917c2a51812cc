//! Deterministic synthetic earthquake catalog used when no dataset is supplied.
//!
//! Columns and the labeling rule mirror the public demo catalog: magnitude,
//! depth, epicenter coordinates, distance to the nearest coastline, and a
//! binary tsunami label derived from a fixed logistic rule.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Exp, Normal};

use super::table::{CellValue, DataTable};

/// Seed used for the fallback catalog.
pub const CATALOG_SEED: u64 = 42;
/// Number of rows generated for the fallback catalog.
pub const CATALOG_ROWS: usize = 400;

/// Column names of the generated catalog, label last.
pub const CATALOG_COLUMNS: &[&str] = &[
    "magnitude",
    "depth",
    "lat",
    "lon",
    "distance_to_coast",
    "tsunami",
];

/// Generate the synthetic catalog. Same seed, same table, every time.
pub fn synthetic_catalog(seed: u64, rows: usize) -> DataTable {
    let mut rng = StdRng::seed_from_u64(seed);
    let magnitude = Normal::new(5.5f32, 0.6).expect("finite std dev");
    let depth = Normal::new(40.0f32, 25.0).expect("finite std dev");
    let coast = Exp::new(1.0f32 / 200.0).expect("positive rate");

    let columns: Vec<String> = CATALOG_COLUMNS.iter().map(|name| name.to_string()).collect();
    let mut out = Vec::with_capacity(rows);
    for _ in 0..rows {
        let magnitude = magnitude.sample(&mut rng).clamp(3.5, 8.5);
        let depth = depth.sample(&mut rng).clamp(1.0, 300.0);
        let lat = rng.random_range(-60.0f32..60.0);
        let lon = rng.random_range(-180.0f32..180.0);
        let distance = coast.sample(&mut rng).clamp(0.0, 800.0);
        let label = demo_label(magnitude, depth, distance);
        out.push(vec![
            CellValue::Number(magnitude),
            CellValue::Number(depth),
            CellValue::Number(lat),
            CellValue::Number(lon),
            CellValue::Number(distance),
            CellValue::Number(label),
        ]);
    }
    DataTable {
        columns,
        rows: out,
    }
}

/// Fixed logistic labeling rule for the demo catalog.
fn demo_label(magnitude: f32, depth: f32, distance_to_coast: f32) -> f32 {
    let logit = 1.6 * (magnitude - 5.5) + 0.015 * (80.0 - depth) + 0.005 * (200.0 - distance_to_coast);
    if sigmoid(logit) > 0.55 { 1.0 } else { 0.0 }
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}
