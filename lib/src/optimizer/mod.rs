use crate::model::ParamOps;

/// Trait for gradient-based optimizers.
///
/// Training logic ([`crate::trainer::Trainer`]) is decoupled from the
/// parameter update rule, so any model can be paired with any optimizer
/// without dynamic dispatch.
pub trait Optimizer<P> {
    /// Performs one optimization step and returns the updated parameters.
    ///
    /// Inputs are not mutated.
    fn step(&self, params: &P, gradients: &P) -> P;
}

/// Stochastic Gradient Descent (SGD) optimizer.
///
/// ```text
/// θ ← θ - η · ∇L(θ)
/// ```
/// where `η` is the learning rate and `∇L(θ)` is the loss gradient.
/// Stateless: no momentum or adaptive rates.
#[derive(Clone, Copy, Debug)]
pub struct SGD {
    learning_rate: f64,
}

impl SGD {
    pub fn new(learning_rate: f64) -> Self {
        Self { learning_rate }
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }
}

impl<P: ParamOps> Optimizer<P> for SGD {
    fn step(&self, params: &P, gradients: &P) -> P {
        params.add(&gradients.scale(-self.learning_rate))
    }
}
