//! Random forest regression: bagged CART trees averaged at prediction time.

use crate::model::tree::{DecisionTreeRegressor, FittedDecisionTree, TreeConfig};
use crate::model::{check_n_features, validate_training_data, Estimator, InferenceModel, ModelError};
use ndarray::{Array1, Array2};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RandomForestRegressor {
    pub n_estimators: usize,
    pub tree: TreeConfig,
    /// Draw a bootstrap sample per tree; when `false` every tree sees all rows.
    pub bootstrap: bool,
    pub seed: u64,
}

impl Default for RandomForestRegressor {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            tree: TreeConfig::default(),
            bootstrap: true,
            seed: 42,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedRandomForest {
    trees: Vec<FittedDecisionTree>,
    n_features: usize,
}

impl FittedRandomForest {
    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn trees(&self) -> &[FittedDecisionTree] {
        &self.trees
    }
}

/// Bootstrap sample expressed as per-row draw counts.
fn bootstrap_weights(n: usize, rng: &mut StdRng) -> Vec<f64> {
    let mut counts = vec![0.0; n];
    for _ in 0..n {
        counts[rng.gen_range(0..n)] += 1.0;
    }
    counts
}

impl Estimator for RandomForestRegressor {
    type Fitted = FittedRandomForest;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedRandomForest, ModelError> {
        if self.n_estimators == 0 {
            return Err(ModelError::InvalidParameter(
                "n_estimators must be at least 1".into(),
            ));
        }
        validate_training_data(x, y)?;
        self.tree.validate()?;

        let n = y.len();
        let mut rng = StdRng::seed_from_u64(self.seed);
        let builder = DecisionTreeRegressor::new(self.tree.clone(), self.seed);
        let mut trees = Vec::with_capacity(self.n_estimators);

        for _ in 0..self.n_estimators {
            let weights = if self.bootstrap {
                bootstrap_weights(n, &mut rng)
            } else {
                vec![1.0; n]
            };
            trees.push(builder.fit_weighted(x, y, &weights, &mut rng)?);
        }
        debug!(n_trees = trees.len(), "random forest fitted");

        Ok(FittedRandomForest {
            trees,
            n_features: x.ncols(),
        })
    }
}

impl InferenceModel for FittedRandomForest {
    fn n_features(&self) -> usize {
        self.n_features
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_n_features(input, self.n_features)?;
        let n_trees = self.trees.len() as f64;
        Ok(input
            .rows()
            .into_iter()
            .map(|row| self.trees.iter().map(|t| t.predict_row(row)).sum::<f64>() / n_trees)
            .collect())
    }
}
