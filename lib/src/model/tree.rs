//! CART regression trees.
//!
//! Trees are grown greedily by minimizing weighted squared error. Nodes are
//! stored in a flat vector with the root at index 0 and children referenced by
//! index, so both building and prediction are iterative.
//!
//! Sample weights make the same builder serve three learners: plain trees
//! (unit weights), random forests (bootstrap counts) and AdaBoost (boosting
//! weights).

use crate::model::{check_n_features, validate_training_data, Estimator, InferenceModel, ModelError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Growth limits for a single tree.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeConfig {
    /// `None` grows until leaves are pure or cannot be split.
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    /// Number of features sampled at each split; `None` considers all.
    pub max_features: Option<usize>,
}

impl Default for TreeConfig {
    fn default() -> Self {
        Self {
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            max_features: None,
        }
    }
}

impl TreeConfig {
    pub fn with_max_depth(max_depth: usize) -> Self {
        Self {
            max_depth: Some(max_depth),
            ..Self::default()
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ModelError> {
        if self.max_depth == Some(0) {
            return Err(ModelError::InvalidParameter("max_depth must be at least 1".into()));
        }
        if self.min_samples_split < 2 {
            return Err(ModelError::InvalidParameter(format!(
                "min_samples_split must be at least 2, got {}",
                self.min_samples_split
            )));
        }
        if self.min_samples_leaf == 0 {
            return Err(ModelError::InvalidParameter(
                "min_samples_leaf must be at least 1".into(),
            ));
        }
        if self.max_features == Some(0) {
            return Err(ModelError::InvalidParameter(
                "max_features must be at least 1".into(),
            ));
        }
        Ok(())
    }
}

/// A node of a fitted tree. Rows with `x[feature] <= threshold` go left.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
    },
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DecisionTreeRegressor {
    pub config: TreeConfig,
    /// Seeds feature sampling when `max_features` is set.
    pub seed: u64,
}

impl Default for DecisionTreeRegressor {
    fn default() -> Self {
        Self {
            config: TreeConfig::default(),
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedDecisionTree {
    nodes: Vec<TreeNode>,
    n_features: usize,
    depth: usize,
}

struct PendingNode {
    rows: Vec<usize>,
    depth: usize,
    slot: usize,
}

struct NodeStats {
    weight: f64,
    mean: f64,
    sse: f64,
    weighted_sq: f64,
}

struct SplitCandidate {
    feature: usize,
    threshold: f64,
}

impl DecisionTreeRegressor {
    pub fn new(config: TreeConfig, seed: u64) -> Self {
        Self { config, seed }
    }

    /// Fits on weighted rows. Rows with zero weight are left out entirely.
    pub fn fit_weighted(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        weights: &[f64],
        rng: &mut StdRng,
    ) -> Result<FittedDecisionTree, ModelError> {
        validate_training_data(x, y)?;
        self.config.validate()?;
        if weights.len() != y.len() {
            return Err(ModelError::ShapeMismatch {
                rows: y.len(),
                targets: weights.len(),
            });
        }
        if weights.iter().any(|w| !w.is_finite() || *w < 0.0) {
            return Err(ModelError::NonFiniteInput("sample weights"));
        }

        let rows: Vec<usize> = (0..y.len()).filter(|&i| weights[i] > 0.0).collect();
        if rows.is_empty() {
            return Err(ModelError::EmptyData);
        }

        let mut nodes = vec![TreeNode::Leaf { value: 0.0 }];
        let mut depth = 0;
        let mut stack = vec![PendingNode {
            rows,
            depth: 0,
            slot: 0,
        }];

        while let Some(node) = stack.pop() {
            let stats = node_stats(&node.rows, y, weights);
            let leaf = TreeNode::Leaf { value: stats.mean };

            if !self.can_split(&node, &stats) {
                nodes[node.slot] = leaf;
                continue;
            }

            let Some(split) = self.best_split(x, y, weights, &node.rows, &stats, rng) else {
                nodes[node.slot] = leaf;
                continue;
            };

            let (left_rows, right_rows): (Vec<usize>, Vec<usize>) = node
                .rows
                .iter()
                .partition(|&&i| x[[i, split.feature]] <= split.threshold);

            let left = nodes.len();
            let right = left + 1;
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes.push(TreeNode::Leaf { value: 0.0 });
            nodes[node.slot] = TreeNode::Split {
                feature: split.feature,
                threshold: split.threshold,
                left,
                right,
            };
            depth = depth.max(node.depth + 1);

            stack.push(PendingNode {
                rows: right_rows,
                depth: node.depth + 1,
                slot: right,
            });
            stack.push(PendingNode {
                rows: left_rows,
                depth: node.depth + 1,
                slot: left,
            });
        }

        Ok(FittedDecisionTree {
            nodes,
            n_features: x.ncols(),
            depth,
        })
    }

    fn can_split(&self, node: &PendingNode, stats: &NodeStats) -> bool {
        let n = node.rows.len();
        if self.config.max_depth.is_some_and(|max| node.depth >= max) {
            return false;
        }
        if n < self.config.min_samples_split || n < 2 * self.config.min_samples_leaf {
            return false;
        }
        stats.sse > f64::EPSILON * stats.weighted_sq
    }

    fn candidate_features(&self, n_features: usize, rng: &mut StdRng) -> Vec<usize> {
        match self.config.max_features {
            Some(m) if m < n_features => {
                let mut features = rand::seq::index::sample(rng, n_features, m).into_vec();
                features.sort_unstable();
                features
            }
            _ => (0..n_features).collect(),
        }
    }

    /// Scans every candidate feature for the split with the largest reduction
    /// in weighted squared error. The first best split found wins.
    fn best_split(
        &self,
        x: &Array2<f64>,
        y: &Array1<f64>,
        weights: &[f64],
        rows: &[usize],
        stats: &NodeStats,
        rng: &mut StdRng,
    ) -> Option<SplitCandidate> {
        let min_leaf = self.config.min_samples_leaf;
        let total_w = stats.weight;
        let total_wy = stats.mean * stats.weight;
        let parent_term = total_wy * total_wy / total_w;

        let mut best_gain = stats.sse * 1e-12;
        let mut best: Option<SplitCandidate> = None;
        let mut sorted = rows.to_vec();

        for feature in self.candidate_features(x.ncols(), rng) {
            sorted.sort_by(|&a, &b| {
                x[[a, feature]]
                    .partial_cmp(&x[[b, feature]])
                    .unwrap_or(Ordering::Equal)
                    .then(a.cmp(&b))
            });

            let mut left_w = 0.0;
            let mut left_wy = 0.0;
            for pos in 0..sorted.len() - 1 {
                let i = sorted[pos];
                left_w += weights[i];
                left_wy += weights[i] * y[i];

                let n_left = pos + 1;
                if n_left < min_leaf || sorted.len() - n_left < min_leaf {
                    continue;
                }
                let current = x[[i, feature]];
                let next = x[[sorted[pos + 1], feature]];
                if current >= next {
                    continue;
                }

                let right_w = total_w - left_w;
                if left_w <= 0.0 || right_w <= 0.0 {
                    continue;
                }
                let right_wy = total_wy - left_wy;
                let gain =
                    left_wy * left_wy / left_w + right_wy * right_wy / right_w - parent_term;

                if gain > best_gain {
                    best_gain = gain;
                    best = Some(SplitCandidate {
                        feature,
                        threshold: midpoint(current, next),
                    });
                }
            }
        }

        best
    }
}

fn midpoint(low: f64, high: f64) -> f64 {
    let mid = low / 2.0 + high / 2.0;
    if mid >= high {
        low
    } else {
        mid
    }
}

/// Weighted mean and squared error, computed in two passes.
fn node_stats(rows: &[usize], y: &Array1<f64>, weights: &[f64]) -> NodeStats {
    let weight: f64 = rows.iter().map(|&i| weights[i]).sum();
    let mean = rows.iter().map(|&i| weights[i] * y[i]).sum::<f64>() / weight;
    let sse = rows
        .iter()
        .map(|&i| weights[i] * (y[i] - mean).powi(2))
        .sum();
    let weighted_sq = rows.iter().map(|&i| weights[i] * y[i] * y[i]).sum();
    NodeStats {
        weight,
        mean,
        sse,
        weighted_sq,
    }
}

impl Estimator for DecisionTreeRegressor {
    type Fitted = FittedDecisionTree;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedDecisionTree, ModelError> {
        let weights = vec![1.0; y.len()];
        let mut rng = StdRng::seed_from_u64(self.seed);
        self.fit_weighted(x, y, &weights, &mut rng)
    }
}

impl FittedDecisionTree {
    /// Length of the longest root-to-leaf path.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn n_leaves(&self) -> usize {
        self.nodes
            .iter()
            .filter(|n| matches!(n, TreeNode::Leaf { .. }))
            .count()
    }

    pub fn nodes(&self) -> &[TreeNode] {
        &self.nodes
    }

    pub(crate) fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                TreeNode::Leaf { value } => return *value,
                TreeNode::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
            }
        }
    }
}

impl InferenceModel for FittedDecisionTree {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_n_features(input, self.n_features)?;
        Ok(input.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_unlimited_tree_fits_training_data() {
        let x = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let y = array![5.0, 3.0, 8.0, 1.0, 9.0];
        let tree = DecisionTreeRegressor::default().fit(&x, &y).unwrap();

        assert_eq!(tree.predict_batch(&x).unwrap(), y);
        assert_eq!(tree.n_leaves(), 5);
    }

    #[test]
    fn test_stump_threshold_is_midpoint() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 10.0, 10.0];
        let tree = DecisionTreeRegressor::new(TreeConfig::with_max_depth(1), 0)
            .fit(&x, &y)
            .unwrap();

        assert_eq!(tree.depth(), 1);
        match &tree.nodes()[0] {
            TreeNode::Split {
                feature, threshold, ..
            } => {
                assert_eq!(*feature, 0);
                assert_eq!(*threshold, 2.5);
            }
            other => panic!("expected split at root, got {other:?}"),
        }
        assert_eq!(tree.predict(array![2.5].view()).unwrap(), 0.0);
        assert_eq!(tree.predict(array![2.6].view()).unwrap(), 10.0);
    }

    #[test]
    fn test_constant_target_is_single_leaf() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![7.0, 7.0, 7.0];
        let tree = DecisionTreeRegressor::default().fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.depth(), 0);
        assert_eq!(tree.predict(array![100.0].view()).unwrap(), 7.0);
    }

    #[test]
    fn test_equal_feature_values_are_not_separated() {
        let x = array![[1.0], [1.0], [1.0]];
        let y = array![1.0, 2.0, 6.0];
        let tree = DecisionTreeRegressor::default().fit(&x, &y).unwrap();

        assert_eq!(tree.n_leaves(), 1);
        assert_eq!(tree.predict(array![1.0].view()).unwrap(), 3.0);
    }

    #[test]
    fn test_min_samples_leaf() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![100.0, 0.0, 0.0, 0.0];
        let config = TreeConfig {
            min_samples_leaf: 2,
            ..TreeConfig::default()
        };
        let tree = DecisionTreeRegressor::new(config, 0).fit(&x, &y).unwrap();

        // The only admissible split is 2 | 2
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(array![1.0].view()).unwrap(), 50.0);
    }

    #[test]
    fn test_zero_weight_rows_are_ignored() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![1.0, 1000.0, 3.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTreeRegressor::default()
            .fit_weighted(&x, &y, &[1.0, 0.0, 1.0], &mut rng)
            .unwrap();

        // Split falls between the two remaining rows at 2.0
        assert_eq!(tree.n_leaves(), 2);
        assert_eq!(tree.predict(array![2.0].view()).unwrap(), 1.0);
        assert_eq!(tree.predict(array![1.0].view()).unwrap(), 1.0);
        assert_eq!(tree.predict(array![3.0].view()).unwrap(), 3.0);
    }

    #[test]
    fn test_weights_shift_leaf_means() {
        let x = array![[1.0], [1.0]];
        let y = array![0.0, 10.0];
        let mut rng = StdRng::seed_from_u64(0);
        let tree = DecisionTreeRegressor::default()
            .fit_weighted(&x, &y, &[3.0, 1.0], &mut rng)
            .unwrap();

        assert!((tree.predict(array![1.0].view()).unwrap() - 2.5).abs() < 1e-12);
    }

    #[test]
    fn test_max_features_is_deterministic_per_seed() {
        let x = Array2::from_shape_fn((30, 4), |(i, j)| ((i * (j + 3)) % 7) as f64);
        let y = Array1::from_shape_fn(30, |i| (i % 5) as f64);
        let config = TreeConfig {
            max_features: Some(2),
            ..TreeConfig::default()
        };
        let a = DecisionTreeRegressor::new(config.clone(), 7).fit(&x, &y).unwrap();
        let b = DecisionTreeRegressor::new(config, 7).fit(&x, &y).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_config() {
        let x = array![[1.0], [2.0]];
        let y = array![1.0, 2.0];
        let config = TreeConfig {
            min_samples_split: 1,
            ..TreeConfig::default()
        };
        assert!(matches!(
            DecisionTreeRegressor::new(config, 0).fit(&x, &y),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            DecisionTreeRegressor::new(TreeConfig::with_max_depth(0), 0).fit(&x, &y),
            Err(ModelError::InvalidParameter(_))
        ));
    }
}
