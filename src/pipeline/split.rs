//! Deterministic stratified train/test split.
//!
//! Rows are ordered per class by a keyed blake3 hash, so the same seed always
//! produces the same partition without shuffling shared state.

use std::collections::BTreeMap;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SplitError {
    #[error("class {class} has only {count} example(s); need at least 2 for a stratified split")]
    InsufficientData { class: u8, count: usize },
}

/// Row indices of one train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Split rows 80/20-style, preserving each class's proportion.
///
/// Every class lands at least once on each side, so a two-class input keeps
/// both classes in the held-out set.
pub fn stratified_split(
    labels: &[u8],
    test_fraction: f64,
    seed: u64,
) -> Result<SplitIndices, SplitError> {
    let mut by_class: BTreeMap<u8, Vec<(u128, usize)>> = BTreeMap::new();
    for (row, &label) in labels.iter().enumerate() {
        let hash = blake3::hash(format!("{seed}|{label}|{row}").as_bytes());
        let key = u128::from_le_bytes(hash.as_bytes()[0..16].try_into().expect("slice size"));
        by_class.entry(label).or_default().push((key, row));
    }

    for (&class, entries) in &by_class {
        if entries.len() < 2 {
            return Err(SplitError::InsufficientData {
                class,
                count: entries.len(),
            });
        }
    }

    let mut train = Vec::new();
    let mut test = Vec::new();
    for (_class, mut entries) in by_class {
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        let n = entries.len();
        let test_n = ((n as f64) * test_fraction).round() as usize;
        let test_n = test_n.clamp(1, n - 1);
        for (idx, (_key, row)) in entries.into_iter().enumerate() {
            if idx < test_n {
                test.push(row);
            } else {
                train.push(row);
            }
        }
    }
    train.sort_unstable();
    test.sort_unstable();
    Ok(SplitIndices { train, test })
}
