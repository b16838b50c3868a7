//! Differentiable losses for gradient-trained models.

use ndarray::Array1;

/// A trait for differentiable loss functions used during model training.
///
/// Implementors must define:
/// - How to compute the scalar loss value (for logging and divergence checks).
/// - How to compute the gradient of the loss w.r.t. the model's predictions.
///
/// The gradient is passed to the model's `backward()` method.
pub trait Loss {
    /// Computes the scalar loss value, averaged over the batch.
    fn loss(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> f64;

    /// Computes the gradient of the loss w.r.t. the prediction: ∂L/∂pred.
    fn grad_wrt_prediction(&self, prediction: &Array1<f64>, target: &Array1<f64>) -> Array1<f64>;
}

/// Mean Squared Error (MSE) loss: `L = (1/n) * Σ(pred_i - target_i)^2`
///
/// Gradient w.r.t. prediction: `∂L/∂pred = (pred - target) / n`
///
/// The factor of 2 is omitted and absorbed into the learning rate, so the
/// gradient is that of `(1/2n) * RSS`.
#[derive(Clone, Copy, Debug, Default)]
pub struct MSELoss;

impl Loss for MSELoss {
    fn loss(&self, pred: &Array1<f64>, target: &Array1<f64>) -> f64 {
        let diff = pred - target;
        diff.dot(&diff) / diff.len() as f64
    }

    fn grad_wrt_prediction(&self, pred: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
        (pred - target) / pred.len() as f64
    }
}

/// Epsilon-insensitive loss used by linear support vector regression:
/// `L = (1/n) * Σ max(0, |pred_i - target_i| - ε)`
///
/// Gradient w.r.t. prediction: `sign(pred - target) / n` outside the ε tube,
/// zero inside it. With `ε = 0` this is the mean absolute error.
#[derive(Clone, Copy, Debug)]
pub struct EpsilonInsensitiveLoss {
    epsilon: f64,
}

impl EpsilonInsensitiveLoss {
    pub fn new(epsilon: f64) -> Self {
        Self {
            epsilon: epsilon.max(0.0),
        }
    }

    pub fn epsilon(&self) -> f64 {
        self.epsilon
    }
}

impl Loss for EpsilonInsensitiveLoss {
    fn loss(&self, pred: &Array1<f64>, target: &Array1<f64>) -> f64 {
        let n = pred.len() as f64;
        (pred - target)
            .mapv(|d| (d.abs() - self.epsilon).max(0.0))
            .sum()
            / n
    }

    fn grad_wrt_prediction(&self, pred: &Array1<f64>, target: &Array1<f64>) -> Array1<f64> {
        let n = pred.len() as f64;
        (pred - target).mapv(|d| {
            if d.abs() <= self.epsilon || d == 0.0 {
                0.0
            } else {
                d.signum() / n
            }
        })
    }
}
