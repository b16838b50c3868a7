use crate::model::boosting::{
    AdaBoostRegressor, FittedAdaBoost, FittedGradientBoosting, GradientBoostingRegressor,
};
use crate::model::forest::{FittedRandomForest, RandomForestRegressor};
use crate::model::linear::{FittedLinearModel, LinearEstimator};
use crate::model::neighbors::{FittedKNeighbors, KNeighborsRegressor};
use crate::model::tree::{DecisionTreeRegressor, FittedDecisionTree};
use crate::model::{Estimator, InferenceModel, ModelError};
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

/// Any untrained candidate model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Regressor {
    Linear(LinearEstimator),
    KNeighbors(KNeighborsRegressor),
    DecisionTree(DecisionTreeRegressor),
    RandomForest(RandomForestRegressor),
    GradientBoosting(GradientBoostingRegressor),
    AdaBoost(AdaBoostRegressor),
}

/// Any trained model. This is the persisted form of a selected model.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FittedRegressor {
    Linear(FittedLinearModel),
    KNeighbors(FittedKNeighbors),
    DecisionTree(FittedDecisionTree),
    RandomForest(FittedRandomForest),
    GradientBoosting(FittedGradientBoosting),
    AdaBoost(FittedAdaBoost),
}

impl Regressor {
    /// Short algorithm label, independent of the roster name.
    pub fn kind(&self) -> &'static str {
        match self {
            Regressor::Linear(_) => "linear",
            Regressor::KNeighbors(_) => "k_neighbors",
            Regressor::DecisionTree(_) => "decision_tree",
            Regressor::RandomForest(_) => "random_forest",
            Regressor::GradientBoosting(_) => "gradient_boosting",
            Regressor::AdaBoost(_) => "ada_boost",
        }
    }
}

impl Estimator for Regressor {
    type Fitted = FittedRegressor;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedRegressor, ModelError> {
        Ok(match self {
            Regressor::Linear(m) => FittedRegressor::Linear(m.fit(x, y)?),
            Regressor::KNeighbors(m) => FittedRegressor::KNeighbors(m.fit(x, y)?),
            Regressor::DecisionTree(m) => FittedRegressor::DecisionTree(m.fit(x, y)?),
            Regressor::RandomForest(m) => FittedRegressor::RandomForest(m.fit(x, y)?),
            Regressor::GradientBoosting(m) => FittedRegressor::GradientBoosting(m.fit(x, y)?),
            Regressor::AdaBoost(m) => FittedRegressor::AdaBoost(m.fit(x, y)?),
        })
    }
}

impl InferenceModel for FittedRegressor {
    fn n_features(&self) -> usize {
        match self {
            FittedRegressor::Linear(m) => m.n_features(),
            FittedRegressor::KNeighbors(m) => m.n_features(),
            FittedRegressor::DecisionTree(m) => m.n_features(),
            FittedRegressor::RandomForest(m) => m.n_features(),
            FittedRegressor::GradientBoosting(m) => m.n_features(),
            FittedRegressor::AdaBoost(m) => m.n_features(),
        }
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        match self {
            FittedRegressor::Linear(m) => m.predict_batch(input),
            FittedRegressor::KNeighbors(m) => m.predict_batch(input),
            FittedRegressor::DecisionTree(m) => m.predict_batch(input),
            FittedRegressor::RandomForest(m) => m.predict_batch(input),
            FittedRegressor::GradientBoosting(m) => m.predict_batch(input),
            FittedRegressor::AdaBoost(m) => m.predict_batch(input),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::linear::GradientDescentConfig;
    use ndarray::array;

    #[test]
    fn test_dispatch_fits_matching_variant() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 3.0, 5.0, 7.0];

        let candidates = [
            Regressor::Linear(LinearEstimator::ordinary(GradientDescentConfig::default())),
            Regressor::KNeighbors(KNeighborsRegressor::new(1)),
            Regressor::DecisionTree(DecisionTreeRegressor::default()),
        ];
        for candidate in &candidates {
            let fitted = candidate.fit(&x, &y).unwrap();
            assert_eq!(fitted.n_features(), 1);
            let pred = fitted.predict(array![2.0].view()).unwrap();
            assert!((pred - 5.0).abs() < 1e-2, "{}: {pred}", candidate.kind());
        }
    }

    #[test]
    fn test_fitted_regressor_serde_roundtrip() {
        let x = array![[0.0, 1.0], [1.0, 0.0], [2.0, 2.0]];
        let y = array![1.0, 2.0, 3.0];
        let fitted = Regressor::DecisionTree(DecisionTreeRegressor::default())
            .fit(&x, &y)
            .unwrap();

        let bytes = bincode::serialize(&fitted).unwrap();
        let restored: FittedRegressor = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored, fitted);
    }
}
