//! Penalty terms added to the training loss.
//!
//! The bias of a linear model is never penalized.

use crate::model::linear::{LinearParams, LinearRegression};
use crate::model::TrainableModel;
use ndarray::Array1;

/// A penalty on model parameters, returning its value and gradient.
pub trait Regularizer<M: TrainableModel> {
    fn regularizer_penalty_grad(&self, model: &M) -> (f64, M::Params);
}

/// No penalty.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoRegularizer;

impl Regularizer<LinearRegression> for NoRegularizer {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        let n = model.params().weights.len();
        (0.0, LinearParams::zeros(n))
    }
}

/// L1 (lasso) penalty: `alpha * Σ|w_i|`, subgradient `alpha * sign(w_i)`.
#[derive(Clone, Copy, Debug)]
pub struct L1 {
    alpha: f64,
}

impl L1 {
    pub fn new(alpha: f64) -> Self {
        Self { alpha }
    }
}

impl Regularizer<LinearRegression> for L1 {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        let weights = &model.params().weights;
        let penalty = self.alpha * weights.mapv(f64::abs).sum();
        let grad: Array1<f64> = weights.mapv(|w| if w == 0.0 { 0.0 } else { self.alpha * w.signum() });
        (penalty, LinearParams::new(grad, 0.0))
    }
}

/// L2 (ridge) penalty: `lambda * Σw_i²`, gradient `2 * lambda * w_i`.
#[derive(Clone, Copy, Debug)]
pub struct L2 {
    lambda: f64,
}

impl L2 {
    pub fn new(lambda: f64) -> Self {
        Self { lambda }
    }
}

impl Regularizer<LinearRegression> for L2 {
    fn regularizer_penalty_grad(&self, model: &LinearRegression) -> (f64, LinearParams) {
        let weights = &model.params().weights;
        let penalty = self.lambda * weights.dot(weights);
        (penalty, LinearParams::new(weights * (2.0 * self.lambda), 0.0))
    }
}
