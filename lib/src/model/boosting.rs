//! Boosted tree ensembles.
//!
//! - [`GradientBoostingRegressor`]: squared-error gradient boosting. Each stage
//!   fits a depth-limited tree to the current residuals and is added with a
//!   shrinkage factor.
//! - [`AdaBoostRegressor`]: AdaBoost.R2. Stages are fitted on reweighted rows
//!   and combined by a weighted median.

use crate::model::tree::{DecisionTreeRegressor, FittedDecisionTree, TreeConfig};
use crate::model::{check_n_features, validate_training_data, Estimator, InferenceModel, ModelError};
use ndarray::{Array1, Array2, ArrayView1};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::debug;

fn check_boosting_params(n_estimators: usize, learning_rate: f64) -> Result<(), ModelError> {
    if n_estimators == 0 {
        return Err(ModelError::InvalidParameter(
            "n_estimators must be at least 1".into(),
        ));
    }
    if !(learning_rate.is_finite() && learning_rate > 0.0) {
        return Err(ModelError::InvalidParameter(format!(
            "learning_rate must be positive, got {learning_rate}"
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientBoostingRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub tree: TreeConfig,
    pub seed: u64,
}

impl Default for GradientBoostingRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.3,
            tree: TreeConfig::with_max_depth(6),
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedGradientBoosting {
    init: f64,
    learning_rate: f64,
    trees: Vec<FittedDecisionTree>,
    n_features: usize,
}

impl FittedGradientBoosting {
    /// The constant the ensemble starts from: the training target mean.
    pub fn init(&self) -> f64 {
        self.init
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        self.init
            + self
                .trees
                .iter()
                .map(|t| self.learning_rate * t.predict_row(row))
                .sum::<f64>()
    }
}

impl Estimator for GradientBoostingRegressor {
    type Fitted = FittedGradientBoosting;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedGradientBoosting, ModelError> {
        check_boosting_params(self.n_estimators, self.learning_rate)?;
        validate_training_data(x, y)?;
        self.tree.validate()?;

        let n = y.len();
        let init = y.sum() / n as f64;
        let mut predictions = Array1::from_elem(n, init);
        let weights = vec![1.0; n];
        let mut rng = StdRng::seed_from_u64(self.seed);
        let builder = DecisionTreeRegressor::new(self.tree.clone(), self.seed);
        let mut trees = Vec::with_capacity(self.n_estimators);

        for stage in 0..self.n_estimators {
            let residuals = y - &predictions;
            let tree = builder.fit_weighted(x, &residuals, &weights, &mut rng)?;
            for (i, row) in x.rows().into_iter().enumerate() {
                predictions[i] += self.learning_rate * tree.predict_row(row);
            }
            trees.push(tree);

            if stage % 10 == 0 {
                let mse = (y - &predictions).mapv(|r| r * r).sum() / n as f64;
                debug!(stage, train_mse = mse, "gradient boosting stage");
            }
        }

        Ok(FittedGradientBoosting {
            init,
            learning_rate: self.learning_rate,
            trees,
            n_features: x.ncols(),
        })
    }
}

impl InferenceModel for FittedGradientBoosting {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_n_features(input, self.n_features)?;
        Ok(input.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }
}

/// How AdaBoost.R2 turns a normalized absolute error into a loss in `[0, 1]`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdaBoostLoss {
    #[default]
    Linear,
    Square,
    Exponential,
}

impl AdaBoostLoss {
    fn apply(self, normalized_error: f64) -> f64 {
        match self {
            AdaBoostLoss::Linear => normalized_error,
            AdaBoostLoss::Square => normalized_error * normalized_error,
            AdaBoostLoss::Exponential => 1.0 - (-normalized_error).exp(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdaBoostRegressor {
    pub n_estimators: usize,
    pub learning_rate: f64,
    pub loss: AdaBoostLoss,
    pub tree: TreeConfig,
    pub seed: u64,
}

impl Default for AdaBoostRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 50,
            learning_rate: 1.0,
            loss: AdaBoostLoss::Linear,
            tree: TreeConfig::with_max_depth(3),
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedAdaBoost {
    estimators: Vec<FittedDecisionTree>,
    estimator_weights: Vec<f64>,
    n_features: usize,
}

impl FittedAdaBoost {
    pub fn n_estimators(&self) -> usize {
        self.estimators.len()
    }

    pub fn estimator_weights(&self) -> &[f64] {
        &self.estimator_weights
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let predictions: Vec<f64> = self.estimators.iter().map(|t| t.predict_row(row)).collect();
        weighted_median(&predictions, &self.estimator_weights)
    }
}

/// Smallest value whose cumulative weight reaches half the total weight.
fn weighted_median(values: &[f64], weights: &[f64]) -> f64 {
    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| {
        values[a]
            .partial_cmp(&values[b])
            .unwrap_or(Ordering::Equal)
            .then(a.cmp(&b))
    });

    let half = weights.iter().sum::<f64>() / 2.0;
    let mut cumulative = 0.0;
    for &idx in &order {
        cumulative += weights[idx];
        if cumulative >= half {
            return values[idx];
        }
    }
    order.last().map_or(f64::NAN, |&idx| values[idx])
}

impl Estimator for AdaBoostRegressor {
    type Fitted = FittedAdaBoost;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedAdaBoost, ModelError> {
        check_boosting_params(self.n_estimators, self.learning_rate)?;
        validate_training_data(x, y)?;
        self.tree.validate()?;

        let n = y.len();
        let mut sample_weights = vec![1.0 / n as f64; n];
        let mut rng = StdRng::seed_from_u64(self.seed);
        let builder = DecisionTreeRegressor::new(self.tree.clone(), self.seed);
        let mut estimators = Vec::with_capacity(self.n_estimators);
        let mut estimator_weights = Vec::with_capacity(self.n_estimators);

        for stage in 0..self.n_estimators {
            let tree = builder.fit_weighted(x, y, &sample_weights, &mut rng)?;
            let errors: Vec<f64> = x
                .rows()
                .into_iter()
                .zip(y.iter())
                .map(|(row, &target)| (tree.predict_row(row) - target).abs())
                .collect();

            let max_error = errors
                .iter()
                .zip(&sample_weights)
                .filter(|(_, &w)| w > 0.0)
                .map(|(&e, _)| e)
                .fold(0.0, f64::max);
            let losses: Vec<f64> = errors
                .iter()
                .map(|&e| {
                    let normalized = if max_error > 0.0 { e / max_error } else { 0.0 };
                    self.loss.apply(normalized)
                })
                .collect();
            let estimator_error: f64 = losses
                .iter()
                .zip(&sample_weights)
                .map(|(l, w)| l * w)
                .sum();

            if estimator_error <= 0.0 {
                debug!(stage, "adaboost stage fits perfectly, stopping");
                estimators.push(tree);
                estimator_weights.push(1.0);
                break;
            }
            if estimator_error >= 0.5 {
                // Too weak to help; keep it only if nothing else exists.
                debug!(stage, estimator_error, "adaboost stage too weak, stopping");
                if estimators.is_empty() {
                    estimators.push(tree);
                    estimator_weights.push(1.0);
                }
                break;
            }

            let beta = estimator_error / (1.0 - estimator_error);
            estimators.push(tree);
            estimator_weights.push(self.learning_rate * (1.0 / beta).ln());

            if stage + 1 == self.n_estimators {
                break;
            }
            for (w, l) in sample_weights.iter_mut().zip(&losses) {
                if *w > 0.0 {
                    *w *= beta.powf((1.0 - l) * self.learning_rate);
                }
            }
            let total: f64 = sample_weights.iter().sum();
            if !(total.is_finite() && total > 0.0) {
                break;
            }
            sample_weights.iter_mut().for_each(|w| *w /= total);
        }

        Ok(FittedAdaBoost {
            estimators,
            estimator_weights,
            n_features: x.ncols(),
        })
    }
}

impl InferenceModel for FittedAdaBoost {
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
    use crate::metrics::Metrics;
    use ndarray::array;

    fn wavy_data() -> (Array2<f64>, Array1<f64>) {
        let x = Array2::from_shape_fn((60, 2), |(i, j)| {
            if j == 0 {
                i as f64 / 6.0
            } else {
                ((i * 7) % 11) as f64
            }
        });
        let y = Array1::from_shape_fn(60, |i| {
            let a = x[[i, 0]];
            let b = x[[i, 1]];
            a.sin() * 5.0 + b
        });
        (x, y)
    }

    fn r2(y: &Array1<f64>, pred: &Array1<f64>) -> f64 {
        Metrics::r_squared(y.as_slice().unwrap(), pred.as_slice().unwrap())
    }

    #[test]
    fn test_gradient_boosting_fits_training_data() {
        let (x, y) = wavy_data();
        let model = GradientBoostingRegressor {
            n_estimators: 30,
            ..Default::default()
        }
        .fit(&x, &y)
        .unwrap();

        assert_eq!(model.n_trees(), 30);
        assert!(r2(&y, &model.predict_batch(&x).unwrap()) > 0.95);
    }

    #[test]
    fn test_gradient_boosting_constant_target() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![4.0, 4.0, 4.0];
        let model = GradientBoostingRegressor::default().fit(&x, &y).unwrap();

        assert_eq!(model.init(), 4.0);
        assert_eq!(model.predict(array![10.0].view()).unwrap(), 4.0);
    }

    #[test]
    fn test_gradient_boosting_rejects_bad_learning_rate() {
        let err = GradientBoostingRegressor {
            learning_rate: 0.0,
            ..Default::default()
        }
        .fit(&array![[1.0]], &array![1.0])
        .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter(_)));
    }

    #[test]
    fn test_weighted_median() {
        assert_eq!(weighted_median(&[3.0, 1.0, 2.0], &[1.0, 1.0, 1.0]), 2.0);
        assert_eq!(weighted_median(&[3.0, 1.0, 2.0], &[5.0, 1.0, 1.0]), 3.0);
        assert_eq!(weighted_median(&[1.0, 2.0], &[1.0, 1.0]), 1.0);
    }

    #[test]
    fn test_adaboost_stops_on_perfect_fit() {
        let x = array![[1.0], [2.0], [3.0], [4.0]];
        let y = array![0.0, 0.0, 5.0, 5.0];
        let model = AdaBoostRegressor::default().fit(&x, &y).unwrap();

        assert_eq!(model.n_estimators(), 1);
        assert_eq!(model.predict_batch(&x).unwrap(), y);
    }

    #[test]
    fn test_adaboost_learns_wavy_target() {
        let (x, y) = wavy_data();
        for loss in [AdaBoostLoss::Linear, AdaBoostLoss::Square, AdaBoostLoss::Exponential] {
            let model = AdaBoostRegressor {
                loss,
                ..Default::default()
            }
            .fit(&x, &y)
            .unwrap();

            assert!(model.n_estimators() >= 1);
            assert_eq!(model.n_estimators(), model.estimator_weights().len());
            assert!(r2(&y, &model.predict_batch(&x).unwrap()) > 0.4, "{loss:?}");
        }
    }
}
