use serde::{Deserialize, Serialize};

/// Node of a flattened decision tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    /// Internal split: `feature <= threshold` goes left.
    Split {
        feature_index: u16,
        threshold: f32,
        left: u32,
        right: u32,
    },
    /// Terminal node carrying the weighted positive-class fraction.
    Leaf {
        positive_fraction: f32,
        samples: u32,
    },
}

/// Single classification tree stored as a flat node array rooted at index 0.
///
/// Children always follow their parent in the array, so a walk strictly
/// advances and terminates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionTree {
    pub nodes: Vec<TreeNode>,
}

impl DecisionTree {
    /// Positive-class fraction at the leaf reached by a feature vector.
    pub fn predict_positive(&self, features: &[f32]) -> f32 {
        let mut idx = 0usize;
        loop {
            match self.nodes.get(idx) {
                Some(TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                }) => {
                    let value = features
                        .get(*feature_index as usize)
                        .copied()
                        .unwrap_or(0.0);
                    idx = if value <= *threshold {
                        *left as usize
                    } else {
                        *right as usize
                    };
                }
                Some(TreeNode::Leaf {
                    positive_fraction, ..
                }) => return *positive_fraction,
                None => return 0.5,
            }
        }
    }

    fn validate(&self, feature_len: usize) -> Result<(), String> {
        if self.nodes.is_empty() {
            return Err("Tree has no nodes".to_string());
        }
        for (idx, node) in self.nodes.iter().enumerate() {
            match node {
                TreeNode::Split {
                    feature_index,
                    threshold,
                    left,
                    right,
                } => {
                    if (*feature_index as usize) >= feature_len {
                        return Err(format!(
                            "Node {idx} splits on feature {feature_index} outside width {feature_len}"
                        ));
                    }
                    if !threshold.is_finite() {
                        return Err(format!("Node {idx} has a non-finite threshold"));
                    }
                    // Forward-only children guarantee the walk terminates.
                    for &child in [left, right] {
                        let child = child as usize;
                        if child <= idx || child >= self.nodes.len() {
                            return Err(format!("Node {idx} has an out-of-order child {child}"));
                        }
                    }
                }
                TreeNode::Leaf {
                    positive_fraction, ..
                } => {
                    if !positive_fraction.is_finite()
                        || !(0.0..=1.0).contains(positive_fraction)
                    {
                        return Err(format!("Node {idx} has an invalid leaf fraction"));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Random forest of probability trees for binary classification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForestModel {
    /// Model format version.
    pub model_version: i64,
    /// Number of `f32` values expected per feature vector.
    pub feature_len: usize,
    /// Fitted trees; predictions average their leaf fractions.
    pub trees: Vec<DecisionTree>,
}

impl ForestModel {
    /// Validate structural invariants of the model.
    pub fn validate(&self) -> Result<(), String> {
        if self.feature_len == 0 {
            return Err("Model expects an empty feature vector".to_string());
        }
        if self.trees.is_empty() {
            return Err("Model contains no trees".to_string());
        }
        for (tree_idx, tree) in self.trees.iter().enumerate() {
            tree.validate(self.feature_len)
                .map_err(|err| format!("Tree {tree_idx}: {err}"))?;
        }
        Ok(())
    }

    /// Positive-class probability for a feature vector, averaged over trees.
    pub fn predict_proba(&self, features: &[f32]) -> f32 {
        if self.trees.is_empty() {
            return 0.5;
        }
        let sum: f32 = self
            .trees
            .iter()
            .map(|tree| tree.predict_positive(features))
            .sum();
        sum / self.trees.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stump(threshold: f32, left_fraction: f32, right_fraction: f32) -> DecisionTree {
        DecisionTree {
            nodes: vec![
                TreeNode::Split {
                    feature_index: 0,
                    threshold,
                    left: 1,
                    right: 2,
                },
                TreeNode::Leaf {
                    positive_fraction: left_fraction,
                    samples: 1,
                },
                TreeNode::Leaf {
                    positive_fraction: right_fraction,
                    samples: 1,
                },
            ],
        }
    }

    #[test]
    fn split_routes_on_threshold() {
        let tree = stump(0.5, 0.1, 0.9);
        assert_eq!(tree.predict_positive(&[0.4]), 0.1);
        assert_eq!(tree.predict_positive(&[0.5]), 0.1);
        assert_eq!(tree.predict_positive(&[0.6]), 0.9);
    }

    #[test]
    fn forest_averages_tree_fractions() {
        let model = ForestModel {
            model_version: 1,
            feature_len: 1,
            trees: vec![stump(0.5, 0.0, 1.0), stump(0.5, 0.2, 0.6)],
        };
        model.validate().unwrap();
        assert!((model.predict_proba(&[1.0]) - 0.8).abs() < 1e-6);
        assert!((model.predict_proba(&[0.0]) - 0.1).abs() < 1e-6);
    }

    #[test]
    fn validate_rejects_backward_children() {
        let model = ForestModel {
            model_version: 1,
            feature_len: 1,
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature_index: 0,
                        threshold: 0.0,
                        left: 0,
                        right: 1,
                    },
                    TreeNode::Leaf {
                        positive_fraction: 0.5,
                        samples: 1,
                    },
                ],
            }],
        };
        assert!(model.validate().is_err());
    }

    #[test]
    fn validate_rejects_out_of_range_features() {
        let model = ForestModel {
            model_version: 1,
            feature_len: 1,
            trees: vec![DecisionTree {
                nodes: vec![
                    TreeNode::Split {
                        feature_index: 3,
                        threshold: 0.0,
                        left: 1,
                        right: 2,
                    },
                    TreeNode::Leaf {
                        positive_fraction: 0.5,
                        samples: 1,
                    },
                    TreeNode::Leaf {
                        positive_fraction: 0.5,
                        samples: 1,
                    },
                ],
            }],
        };
        assert!(model.validate().is_err());
    }
}
