//! Regression models.
//!
//! Two families live here:
//! - gradient-trained linear models ([`linear`]), which implement
//!   [`TrainableModel`] and are fitted by [`crate::trainer::Trainer`];
//! - closed-form / greedy learners ([`neighbors`], [`tree`], [`forest`],
//!   [`boosting`]) that fit directly from data.
//!
//! Every learner implements [`Estimator`], every fitted model implements
//! [`InferenceModel`]. [`Regressor`] and [`FittedRegressor`] dispatch over all
//! of them with a `match`, and `FittedRegressor` is what gets persisted.

use crate::dataset::DatasetError;
use ndarray::{Array1, Array2, ArrayView1, Axis};
use thiserror::Error;

pub mod boosting;
pub mod forest;
pub mod linear;
pub mod neighbors;
pub mod regressor;
pub mod state;
pub mod tree;

pub use regressor::{FittedRegressor, Regressor};
pub use state::{Fitted, Unfitted};

/// Errors raised while fitting or evaluating a model.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ModelError {
    #[error("cannot fit on empty data")]
    EmptyData,
    #[error("{rows} feature rows but {targets} targets")]
    ShapeMismatch { rows: usize, targets: usize },
    #[error("model expects {expected} features, got {got}")]
    FeatureMismatch { expected: usize, got: usize },
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    #[error("non-finite value in {0}")]
    NonFiniteInput(&'static str),
    #[error("training diverged at epoch {epoch} (loss is not finite)")]
    Diverged { epoch: usize },
    #[error("model produced a non-finite prediction")]
    NonFinitePrediction,
    #[error(transparent)]
    Dataset(#[from] DatasetError),
}

/// A model trained by gradient descent.
pub trait TrainableModel {
    type Params: ParamOps;
    type Output;

    fn forward(&self, input: &Array2<f64>) -> Array1<f64>;
    fn backward(&self, input: &Array2<f64>, grad_output: &Array1<f64>) -> Self::Params;
    fn params(&self) -> &Self::Params;
    fn update_params(&mut self, new_params: &Self::Params);

    fn into_fitted(self) -> Self::Output;
}

/// Arithmetic needed by optimizers on a parameter set.
pub trait ParamOps: Clone {
    fn add(&self, other: &Self) -> Self;
    fn scale(&self, scalar: f64) -> Self;
    /// Euclidean norm over all parameters.
    fn norm(&self) -> f64;
}

/// A fitted model that predicts one value per input row.
pub trait InferenceModel {
    /// Number of features the model was fitted on.
    fn n_features(&self) -> usize;

    /// Predicts every row of `input`.
    ///
    /// # Errors
    /// [`ModelError::FeatureMismatch`] if the column count differs from fit.
    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError>;

    /// Predicts a single feature vector.
    fn predict(&self, input: ArrayView1<f64>) -> Result<f64, ModelError> {
        let batch = input.insert_axis(Axis(0)).to_owned();
        Ok(self.predict_batch(&batch)?[0])
    }
}

/// A learner that can be fitted on a feature matrix and target vector.
pub trait Estimator {
    type Fitted: InferenceModel;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<Self::Fitted, ModelError>;
}

/// Rejects empty, misaligned or non-finite training data.
pub fn validate_training_data(x: &Array2<f64>, y: &Array1<f64>) -> Result<(), ModelError> {
    if x.nrows() != y.len() {
        return Err(ModelError::ShapeMismatch {
            rows: x.nrows(),
            targets: y.len(),
        });
    }
    if x.nrows() == 0 || x.ncols() == 0 {
        return Err(ModelError::EmptyData);
    }
    if x.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteInput("features"));
    }
    if y.iter().any(|v| !v.is_finite()) {
        return Err(ModelError::NonFiniteInput("targets"));
    }
    Ok(())
}

/// Checks the column count of a prediction input.
pub fn check_n_features(input: &Array2<f64>, expected: usize) -> Result<(), ModelError> {
    if input.ncols() != expected {
        return Err(ModelError::FeatureMismatch {
            expected,
            got: input.ncols(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_validate_training_data() {
        assert!(validate_training_data(&array![[1.0], [2.0]], &array![1.0, 2.0]).is_ok());
        assert_eq!(
            validate_training_data(&array![[1.0], [2.0]], &array![1.0]),
            Err(ModelError::ShapeMismatch { rows: 2, targets: 1 })
        );
        assert_eq!(
            validate_training_data(&Array2::zeros((0, 2)), &Array1::zeros(0)),
            Err(ModelError::EmptyData)
        );
        assert_eq!(
            validate_training_data(&array![[f64::NAN]], &array![1.0]),
            Err(ModelError::NonFiniteInput("features"))
        );
        assert_eq!(
            validate_training_data(&array![[1.0]], &array![f64::INFINITY]),
            Err(ModelError::NonFiniteInput("targets"))
        );
    }
}
