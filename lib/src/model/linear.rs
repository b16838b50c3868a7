//! Linear models trained by gradient descent.
//!
//! State is tracked at the type level:
//! - [`LinearRegression`] = `LinearModel<Unfitted>`, used during training.
//! - [`FittedLinearModel`] = `LinearModel<Fitted>`, an inference-only,
//!   serializable predictor.
//!
//! The fitted model is free from training hyperparameters: loss, penalty and
//! optimizer settings live on [`LinearEstimator`] and the [`Trainer`].
//!
//! One estimator covers ordinary least squares, lasso, ridge and linear
//! support vector regression by varying the [`LinearObjective`] and [`Penalty`].

use crate::dataset::InMemoryDataset;
use crate::loss::{EpsilonInsensitiveLoss, Loss, MSELoss};
use crate::model::{
    check_n_features, validate_training_data, Estimator, Fitted, InferenceModel, ModelError,
    ParamOps, TrainableModel, Unfitted,
};
use crate::optimizer::SGD;
use crate::regularizers::{self, NoRegularizer, Regularizer};
use crate::trainer::Trainer;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::marker::PhantomData;

/// Trainable parameters of a linear model: weights and bias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearParams {
    pub weights: Array1<f64>,
    pub bias: f64,
}

impl LinearParams {
    pub fn new(weights: Array1<f64>, bias: f64) -> Self {
        Self { weights, bias }
    }

    pub fn zeros(n_features: usize) -> Self {
        Self::new(Array1::zeros(n_features), 0.0)
    }
}

impl ParamOps for LinearParams {
    fn add(&self, other: &Self) -> Self {
        Self {
            weights: &self.weights + &other.weights,
            bias: self.bias + other.bias,
        }
    }

    fn scale(&self, scalar: f64) -> Self {
        Self {
            weights: &self.weights * scalar,
            bias: self.bias * scalar,
        }
    }

    fn norm(&self) -> f64 {
        (self.weights.dot(&self.weights) + self.bias * self.bias).sqrt()
    }
}

/// A linear model with its training state encoded in `S`.
///
/// - `S = Unfitted`: implements [`TrainableModel`].
/// - `S = Fitted`: implements [`InferenceModel`] and is serializable.
///
/// Calling `predict` on an untrained model does not compile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(bound = "")]
pub struct LinearModel<S> {
    params: LinearParams,
    #[serde(skip)]
    _state: PhantomData<S>,
}

/// An unfitted linear regression model, the input to [`Trainer::fit`].
pub type LinearRegression = LinearModel<Unfitted>;

/// A trained linear model: `y = w^T x + b`.
pub type FittedLinearModel = LinearModel<Fitted>;

impl LinearRegression {
    /// Creates a model with zero-initialized weights and bias.
    pub fn new(n_features: usize) -> Self {
        Self::from_params(LinearParams::zeros(n_features))
    }

    /// Constructs a model from explicit parameters (warm start).
    pub fn from_params(params: LinearParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }
}

impl FittedLinearModel {
    pub fn new(params: LinearParams) -> Self {
        Self {
            params,
            _state: PhantomData,
        }
    }

    pub fn params(&self) -> &LinearParams {
        &self.params
    }
}

impl InferenceModel for FittedLinearModel {
    fn n_features(&self) -> usize {
        self.params.weights.len()
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_n_features(input, self.n_features())?;
        Ok(input.dot(&self.params.weights) + self.params.bias)
    }
}

/// Forward pass: `X @ w + b`.
/// Backward pass: `∇w = X^T · grad`, `∇b = sum(grad)`.
impl TrainableModel for LinearRegression {
    type Params = LinearParams;
    type Output = FittedLinearModel;

    fn forward(&self, x: &Array2<f64>) -> Array1<f64> {
        x.dot(&self.params.weights) + self.params.bias
    }

    fn backward(&self, x: &Array2<f64>, grad_output: &Array1<f64>) -> LinearParams {
        LinearParams {
            weights: x.t().dot(grad_output),
            bias: grad_output.sum(),
        }
    }

    fn params(&self) -> &LinearParams {
        &self.params
    }

    fn update_params(&mut self, new_params: &LinearParams) {
        self.params = new_params.clone();
    }

    fn into_fitted(self) -> FittedLinearModel {
        FittedLinearModel::new(self.params)
    }
}

/// Gradient descent settings shared by every linear estimator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GradientDescentConfig {
    pub learning_rate: f64,
    pub max_epochs: usize,
    pub tolerance: f64,
    /// Mini-batch size; `None` trains on the full batch.
    pub batch_size: Option<usize>,
    /// Emit per-epoch loss at `debug` level.
    pub verbose: bool,
}

impl Default for GradientDescentConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.05,
            max_epochs: 2000,
            tolerance: 1e-6,
            batch_size: None,
            verbose: true,
        }
    }
}

/// Data-fit term of a linear model.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearObjective {
    SquaredError,
    EpsilonInsensitive { epsilon: f64 },
}

/// Weight penalty of a linear model.
///
/// `L2 { alpha }` is applied as `alpha / (2n) * ||w||²`, which matches the
/// ridge objective `||y - Xw||² + alpha * ||w||²` under the `1/2n` loss scaling.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Penalty {
    None,
    L1 { alpha: f64 },
    L2 { alpha: f64 },
}

/// A configured linear learner.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LinearEstimator {
    pub objective: LinearObjective,
    pub penalty: Penalty,
    pub descent: GradientDescentConfig,
}

impl LinearEstimator {
    /// Ordinary least squares.
    pub fn ordinary(descent: GradientDescentConfig) -> Self {
        Self {
            objective: LinearObjective::SquaredError,
            penalty: Penalty::None,
            descent,
        }
    }

    pub fn lasso(alpha: f64, descent: GradientDescentConfig) -> Self {
        Self {
            objective: LinearObjective::SquaredError,
            penalty: Penalty::L1 { alpha },
            descent,
        }
    }

    pub fn ridge(alpha: f64, descent: GradientDescentConfig) -> Self {
        Self {
            objective: LinearObjective::SquaredError,
            penalty: Penalty::L2 { alpha },
            descent,
        }
    }

    /// Linear support vector regression: epsilon-insensitive loss with an L2
    /// penalty of `1 / (2nC)`.
    pub fn linear_svr(c: f64, epsilon: f64, descent: GradientDescentConfig) -> Self {
        Self {
            objective: LinearObjective::EpsilonInsensitive { epsilon },
            penalty: Penalty::L2 { alpha: 1.0 / c },
            descent,
        }
    }

    fn validate(&self) -> Result<(), ModelError> {
        let d = &self.descent;
        if !(d.learning_rate.is_finite() && d.learning_rate > 0.0) {
            return Err(ModelError::InvalidParameter(format!(
                "learning_rate must be positive, got {}",
                d.learning_rate
            )));
        }
        if d.batch_size == Some(0) {
            return Err(ModelError::InvalidParameter("batch_size must be at least 1".into()));
        }
        if let LinearObjective::EpsilonInsensitive { epsilon } = self.objective {
            if !(epsilon.is_finite() && epsilon >= 0.0) {
                return Err(ModelError::InvalidParameter(format!(
                    "epsilon must be non-negative, got {epsilon}"
                )));
            }
        }
        match self.penalty {
            Penalty::L1 { alpha } | Penalty::L2 { alpha } if !(alpha.is_finite() && alpha >= 0.0) => {
                Err(ModelError::InvalidParameter(format!(
                    "penalty strength must be non-negative and finite, got {alpha}"
                )))
            }
            _ => Ok(()),
        }
    }

    fn train_with_loss<L: Loss>(
        &self,
        loss: L,
        dataset: &InMemoryDataset,
    ) -> Result<FittedLinearModel, ModelError> {
        let n = dataset.features().nrows() as f64;
        match self.penalty {
            Penalty::None => self.run(loss, NoRegularizer, dataset),
            Penalty::L1 { alpha } => self.run(loss, regularizers::L1::new(alpha), dataset),
            Penalty::L2 { alpha } => {
                self.run(loss, regularizers::L2::new(alpha / (2.0 * n)), dataset)
            }
        }
    }

    fn run<L, R>(
        &self,
        loss: L,
        regularizer: R,
        dataset: &InMemoryDataset,
    ) -> Result<FittedLinearModel, ModelError>
    where
        L: Loss,
        R: Regularizer<LinearRegression>,
    {
        let d = &self.descent;
        let batch_size = d.batch_size.unwrap_or(dataset.features().nrows());
        let trainer = Trainer::builder(loss, SGD::new(d.learning_rate), regularizer)
            .batch_size(batch_size)
            .max_epochs(d.max_epochs)
            .tolerance(d.tolerance)
            .verbose(d.verbose)
            .build();
        trainer.fit(LinearRegression::new(dataset.n_features()), dataset)
    }
}

impl Estimator for LinearEstimator {
    type Fitted = FittedLinearModel;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedLinearModel, ModelError> {
        validate_training_data(x, y)?;
        self.validate()?;
        let dataset = InMemoryDataset::new(x.clone(), y.clone())?;

        let fitted = match self.objective {
            LinearObjective::SquaredError => self.train_with_loss(MSELoss, &dataset)?,
            LinearObjective::EpsilonInsensitive { epsilon } => {
                self.train_with_loss(EpsilonInsensitiveLoss::new(epsilon), &dataset)?
            }
        };
        if !fitted.params.norm().is_finite() {
            return Err(ModelError::NonFinitePrediction);
        }
        Ok(fitted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::Metrics;
    use ndarray::array;

    fn line_data() -> (Array2<f64>, Array1<f64>) {
        // y = 2x + 1 on x in [-1, 1]
        let x = Array2::from_shape_fn((21, 1), |(i, _)| i as f64 / 10.0 - 1.0);
        let y = x.column(0).mapv(|v| 2.0 * v + 1.0);
        (x, y)
    }

    fn quiet() -> GradientDescentConfig {
        GradientDescentConfig {
            verbose: false,
            ..Default::default()
        }
    }

    #[test]
    fn test_param_ops() {
        let p1 = LinearParams::new(array![1.0, 2.0], 0.5);
        let p2 = LinearParams::new(array![0.5, 1.0], 0.5);

        let sum = p1.add(&p2);
        assert_eq!(sum.weights, array![1.5, 3.0]);
        assert_eq!(sum.bias, 1.0);

        let scaled = p1.scale(2.0);
        assert_eq!(scaled.weights, array![2.0, 4.0]);
        assert_eq!(scaled.bias, 1.0);

        let p3 = LinearParams::new(array![3.0], 4.0);
        assert!((p3.norm() - 5.0).abs() < 1e-12);
    }

    #[test]
    fn test_forward_and_backward() {
        let model = LinearRegression::from_params(LinearParams::new(array![1.0, -1.0], 0.5));
        let x = array![[1.0, 2.0], [3.0, 1.0]];

        assert_eq!(model.forward(&x), array![-0.5, 2.5]);

        let grads = model.backward(&x, &array![1.0, 0.5]);
        assert_eq!(grads.weights, array![2.5, 2.5]);
        assert_eq!(grads.bias, 1.5);
    }

    #[test]
    fn test_fitted_model_checks_feature_count() {
        let fitted = LinearRegression::new(2).into_fitted();
        let err = fitted.predict_batch(&array![[1.0, 2.0, 3.0]]).unwrap_err();
        assert_eq!(err, ModelError::FeatureMismatch { expected: 2, got: 3 });
    }

    #[test]
    fn test_ordinary_least_squares_recovers_line() {
        let (x, y) = line_data();
        let fitted = LinearEstimator::ordinary(quiet()).fit(&x, &y).unwrap();

        assert!((fitted.params().weights[0] - 2.0).abs() < 1e-3);
        assert!((fitted.params().bias - 1.0).abs() < 1e-3);
    }

    #[test]
    fn test_ridge_shrinks_weights() {
        let (x, y) = line_data();
        let ols = LinearEstimator::ordinary(quiet()).fit(&x, &y).unwrap();
        let ridge = LinearEstimator::ridge(5.0, quiet()).fit(&x, &y).unwrap();

        assert!(ridge.params().weights[0] < ols.params().weights[0]);
        assert!(ridge.params().weights[0] > 0.0);
    }

    #[test]
    fn test_lasso_shrinks_weights() {
        let (x, y) = line_data();
        let lasso = LinearEstimator::lasso(0.5, quiet()).fit(&x, &y).unwrap();

        assert!(lasso.params().weights[0] < 1.9);
        assert!(lasso.params().weights[0] > 0.5);
    }

    #[test]
    fn test_linear_svr_fits_line() {
        let (x, y) = line_data();
        let svr = LinearEstimator::linear_svr(1.0, 0.0, quiet()).fit(&x, &y).unwrap();

        let preds = svr.predict_batch(&x).unwrap();
        assert!(Metrics::r_squared(y.as_slice().unwrap(), preds.as_slice().unwrap()) > 0.9);
    }

    #[test]
    fn test_invalid_hyperparameters_are_rejected() {
        let (x, y) = line_data();
        let bad_lr = GradientDescentConfig {
            learning_rate: 0.0,
            ..quiet()
        };
        assert!(matches!(
            LinearEstimator::ordinary(bad_lr).fit(&x, &y),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            LinearEstimator::lasso(-1.0, quiet()).fit(&x, &y),
            Err(ModelError::InvalidParameter(_))
        ));
        assert!(matches!(
            LinearEstimator::linear_svr(0.0, 0.0, quiet()).fit(&x, &y),
            Err(ModelError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_fitted_model_serde_roundtrip() {
        let fitted = FittedLinearModel::new(LinearParams::new(array![0.25, -1.5], 3.0));
        let bytes = bincode::serialize(&fitted).unwrap();
        let restored: FittedLinearModel = bincode::deserialize(&bytes).unwrap();
        assert_eq!(restored.params(), fitted.params());
    }
}
