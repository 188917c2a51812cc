use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use super::model::{DecisionTree, ForestModel, TreeNode};

/// Training hyperparameters for the forest.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    /// Number of bootstrap trees.
    pub trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum number of samples in each leaf.
    pub min_leaf: usize,
    /// Number of bins used for split search.
    pub bins: usize,
    /// Seed for bootstrap and feature sampling.
    pub seed: u64,
    /// Reweight classes inside each bootstrap sample.
    pub balanced: bool,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            trees: 300,
            max_depth: 16,
            min_leaf: 1,
            bins: 32,
            seed: 42,
            balanced: true,
        }
    }
}

/// In-memory dataset used for forest training.
#[derive(Debug, Clone)]
pub struct TrainDataset {
    /// Number of `f32` values in each feature vector.
    pub feature_len: usize,
    /// Feature matrix, row-major.
    pub x: Vec<Vec<f32>>,
    /// Binary labels aligned with `x`.
    pub y: Vec<u8>,
}

/// Train a bootstrap-aggregated forest of gini trees.
pub fn train_forest(
    dataset: &TrainDataset,
    options: &TrainOptions,
) -> Result<ForestModel, String> {
    if dataset.x.len() != dataset.y.len() {
        return Err("Mismatched X/Y lengths".to_string());
    }
    if dataset.x.is_empty() {
        return Err("Empty dataset".to_string());
    }
    let d = dataset.feature_len;
    if d == 0 || d > u16::MAX as usize {
        return Err(format!("Unsupported feature width {d}"));
    }
    for row in &dataset.x {
        if row.len() != d {
            return Err("Inconsistent feature row length".to_string());
        }
    }
    if dataset.y.iter().any(|&label| label > 1) {
        return Err("Labels must be 0 or 1".to_string());
    }
    if options.trees == 0 {
        return Err("Need at least one tree".to_string());
    }

    let bins = options.bins.clamp(2, 256);
    let (mins, maxs) = feature_min_max(&dataset.x, d);
    let binned = bin_features(&dataset.x, &mins, &maxs, bins);
    let n = dataset.x.len();
    let features_per_split = ((d as f64).sqrt().ceil() as usize).clamp(1, d);

    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut trees = Vec::with_capacity(options.trees);
    for _ in 0..options.trees {
        let sample: Vec<usize> = (0..n).map(|_| rng.random_range(0..n)).collect();
        let weights = class_weights(&dataset.y, &sample, options.balanced);
        let mut builder = TreeBuilder {
            dataset,
            binned: &binned,
            mins: &mins,
            maxs: &maxs,
            bins,
            weights,
            max_depth: options.max_depth.max(1),
            min_leaf: options.min_leaf.max(1),
            features_per_split,
            nodes: Vec::new(),
        };
        builder.grow(sample, 0, &mut rng);
        trees.push(DecisionTree {
            nodes: builder.nodes,
        });
    }

    let model = ForestModel {
        model_version: 1,
        feature_len: d,
        trees,
    };
    model.validate()?;
    Ok(model)
}

/// Per-class sample weights for one bootstrap draw.
///
/// Balanced mode weights each class by `n / (2 * count)` over the bootstrap,
/// so minority examples carry proportionally more impurity mass.
fn class_weights(y: &[u8], sample: &[usize], balanced: bool) -> [f64; 2] {
    if !balanced {
        return [1.0, 1.0];
    }
    let mut counts = [0usize; 2];
    for &row in sample {
        counts[y[row] as usize] += 1;
    }
    let total = sample.len() as f64;
    let weight = |count: usize| {
        if count == 0 {
            1.0
        } else {
            total / (2.0 * count as f64)
        }
    };
    [weight(counts[0]), weight(counts[1])]
}

struct TreeBuilder<'a> {
    dataset: &'a TrainDataset,
    binned: &'a [Vec<u8>],
    mins: &'a [f32],
    maxs: &'a [f32],
    bins: usize,
    weights: [f64; 2],
    max_depth: usize,
    min_leaf: usize,
    features_per_split: usize,
    nodes: Vec<TreeNode>,
}

#[derive(Debug, Clone, Copy)]
struct CandidateSplit {
    score: f64,
    feature: usize,
    threshold: f32,
}

impl TreeBuilder<'_> {
    /// Append the subtree for `samples` and return its root index.
    fn grow(&mut self, samples: Vec<usize>, depth: usize, rng: &mut StdRng) -> u32 {
        let (w0, w1) = self.weighted_counts(&samples);
        let is_pure = w0 == 0.0 || w1 == 0.0;
        if is_pure || depth >= self.max_depth || samples.len() < 2 * self.min_leaf {
            return self.push_leaf(w0, w1, samples.len());
        }
        let Some(split) = self.best_split(&samples, rng) else {
            return self.push_leaf(w0, w1, samples.len());
        };

        let mut left_rows = Vec::new();
        let mut right_rows = Vec::new();
        for &row in &samples {
            if self.dataset.x[row][split.feature] <= split.threshold {
                left_rows.push(row);
            } else {
                right_rows.push(row);
            }
        }
        if left_rows.len() < self.min_leaf || right_rows.len() < self.min_leaf {
            return self.push_leaf(w0, w1, samples.len());
        }

        let node_idx = self.nodes.len();
        self.nodes.push(TreeNode::Split {
            feature_index: split.feature as u16,
            threshold: split.threshold,
            left: 0,
            right: 0,
        });
        let left = self.grow(left_rows, depth + 1, rng);
        let right = self.grow(right_rows, depth + 1, rng);
        if let TreeNode::Split {
            left: left_slot,
            right: right_slot,
            ..
        } = &mut self.nodes[node_idx]
        {
            *left_slot = left;
            *right_slot = right;
        }
        node_idx as u32
    }

    fn weighted_counts(&self, samples: &[usize]) -> (f64, f64) {
        let mut mass = [0.0f64; 2];
        for &row in samples {
            let label = self.dataset.y[row] as usize;
            mass[label] += self.weights[label];
        }
        (mass[0], mass[1])
    }

    fn push_leaf(&mut self, w0: f64, w1: f64, samples: usize) -> u32 {
        let total = w0 + w1;
        let fraction = if total > 0.0 { (w1 / total) as f32 } else { 0.5 };
        let idx = self.nodes.len();
        self.nodes.push(TreeNode::Leaf {
            positive_fraction: fraction,
            samples: samples as u32,
        });
        idx as u32
    }

    /// Search a random feature subset for the lowest weighted-gini split.
    fn best_split(&self, samples: &[usize], rng: &mut StdRng) -> Option<CandidateSplit> {
        let mut feature_order: Vec<usize> = (0..self.dataset.feature_len).collect();
        feature_order.shuffle(rng);

        let mut best: Option<CandidateSplit> = None;
        for &feature in feature_order.iter().take(self.features_per_split) {
            let mut bin_mass0 = vec![0.0f64; self.bins];
            let mut bin_mass1 = vec![0.0f64; self.bins];
            for &row in samples {
                let bin = self.binned[row][feature] as usize;
                match self.dataset.y[row] {
                    0 => bin_mass0[bin] += self.weights[0],
                    _ => bin_mass1[bin] += self.weights[1],
                }
            }
            let total0: f64 = bin_mass0.iter().sum();
            let total1: f64 = bin_mass1.iter().sum();

            let mut left0 = 0.0f64;
            let mut left1 = 0.0f64;
            for split_bin in 0..self.bins - 1 {
                left0 += bin_mass0[split_bin];
                left1 += bin_mass1[split_bin];
                let right0 = total0 - left0;
                let right1 = total1 - left1;
                let left_total = left0 + left1;
                let right_total = right0 + right1;
                if left_total == 0.0 || right_total == 0.0 {
                    continue;
                }
                let score = (left_total * gini(left0, left1)
                    + right_total * gini(right0, right1))
                    / (left_total + right_total);
                if best.is_none_or(|current| score < current.score) {
                    best = Some(CandidateSplit {
                        score,
                        feature,
                        threshold: threshold_for_bin(
                            self.mins[feature],
                            self.maxs[feature],
                            split_bin,
                            self.bins,
                        ),
                    });
                }
            }
        }
        best
    }
}

fn gini(mass0: f64, mass1: f64) -> f64 {
    let total = mass0 + mass1;
    if total == 0.0 {
        return 0.0;
    }
    let p0 = mass0 / total;
    let p1 = mass1 / total;
    1.0 - p0 * p0 - p1 * p1
}

fn feature_min_max(x: &[Vec<f32>], feature_len: usize) -> (Vec<f32>, Vec<f32>) {
    let mut mins = vec![f32::INFINITY; feature_len];
    let mut maxs = vec![f32::NEG_INFINITY; feature_len];
    for row in x {
        for (idx, &value) in row.iter().take(feature_len).enumerate() {
            if value.is_finite() {
                mins[idx] = mins[idx].min(value);
                maxs[idx] = maxs[idx].max(value);
            }
        }
    }
    for idx in 0..feature_len {
        if !mins[idx].is_finite() || !maxs[idx].is_finite() {
            mins[idx] = 0.0;
            maxs[idx] = 0.0;
        }
        if mins[idx] == maxs[idx] {
            // Constant columns still need a non-degenerate bin width.
            maxs[idx] = mins[idx] + 1.0;
        }
    }
    (mins, maxs)
}

fn bin_features(x: &[Vec<f32>], mins: &[f32], maxs: &[f32], bins: usize) -> Vec<Vec<u8>> {
    let scale = (bins - 1) as f32;
    x.iter()
        .map(|row| {
            mins.iter()
                .zip(maxs)
                .enumerate()
                .map(|(idx, (&min, &max))| {
                    let value = row.get(idx).copied().unwrap_or(0.0);
                    let t = if max > min {
                        ((value - min) / (max - min)).clamp(0.0, 1.0)
                    } else {
                        0.0
                    };
                    (t * scale).round() as u8
                })
                .collect()
        })
        .collect()
}

fn threshold_for_bin(min: f32, max: f32, split_bin: usize, bins: usize) -> f32 {
    min + ((split_bin + 1) as f32 / bins as f32) * (max - min)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn separable_dataset() -> TrainDataset {
        let mut x = Vec::new();
        let mut y = Vec::new();
        for idx in 0..40 {
            let value = idx as f32 - 20.0;
            x.push(vec![value, 0.0]);
            y.push(u8::from(value >= 0.0));
        }
        TrainDataset {
            feature_len: 2,
            x,
            y,
        }
    }

    fn small_options() -> TrainOptions {
        TrainOptions {
            trees: 25,
            max_depth: 6,
            ..TrainOptions::default()
        }
    }

    #[test]
    fn learns_a_separable_boundary() {
        let model = train_forest(&separable_dataset(), &small_options()).unwrap();
        assert!(model.predict_proba(&[-10.0, 0.0]) < 0.2);
        assert!(model.predict_proba(&[10.0, 0.0]) > 0.8);
    }

    #[test]
    fn same_seed_trains_the_same_model() {
        let dataset = separable_dataset();
        let first = train_forest(&dataset, &small_options()).unwrap();
        let second = train_forest(&dataset, &small_options()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn different_seed_changes_the_model() {
        let dataset = separable_dataset();
        let first = train_forest(&dataset, &small_options()).unwrap();
        let mut options = small_options();
        options.seed += 1;
        let second = train_forest(&dataset, &options).unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn single_class_dataset_predicts_that_class() {
        let dataset = TrainDataset {
            feature_len: 1,
            x: vec![vec![0.0], vec![1.0], vec![2.0]],
            y: vec![1, 1, 1],
        };
        let model = train_forest(&dataset, &small_options()).unwrap();
        assert_eq!(model.predict_proba(&[1.5]), 1.0);
    }

    #[test]
    fn rejects_mismatched_inputs() {
        let dataset = TrainDataset {
            feature_len: 1,
            x: vec![vec![0.0]],
            y: vec![0, 1],
        };
        assert!(train_forest(&dataset, &TrainOptions::default()).is_err());
    }

    #[test]
    fn rejects_non_binary_labels() {
        let dataset = TrainDataset {
            feature_len: 1,
            x: vec![vec![0.0], vec![1.0]],
            y: vec![0, 2],
        };
        assert!(train_forest(&dataset, &TrainOptions::default()).is_err());
    }

    #[test]
    fn balanced_weights_lift_the_minority_class() {
        let mut x = Vec::new();
        let mut y = Vec::new();
        // 36 negatives, 4 positives, separable on the first feature.
        for idx in 0..40 {
            let positive = idx % 10 == 0;
            x.push(vec![if positive { 1.0 } else { -1.0 }]);
            y.push(u8::from(positive));
        }
        let dataset = TrainDataset {
            feature_len: 1,
            x,
            y,
        };
        let model = train_forest(&dataset, &small_options()).unwrap();
        assert!(model.predict_proba(&[1.0]) > 0.8);
    }
}
