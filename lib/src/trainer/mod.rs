use crate::{
    dataset::Dataset,
    loss::Loss,
    model::{ModelError, ParamOps, TrainableModel},
    optimizer::Optimizer,
    regularizers::Regularizer,
};
use std::marker::PhantomData;
use tracing::debug;

/// Orchestrates the gradient descent loop for a [`TrainableModel`].
///
/// Combines a loss function, optimizer, and regularizer to fit a model on a dataset.
/// Once built via [`TrainerBuilder`], it is immutable and can be reused across
/// multiple models of the same type.
///
/// [`Trainer::fit`] returns the model's fitted form (`M::Output`), which contains
/// only inference logic.
pub struct Trainer<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    pub(crate) batch_size: usize,
    pub(crate) max_epochs: usize,
    pub(crate) tolerance: f64,
    pub(crate) verbose: bool,
    pub(crate) loss_fn: L,
    pub(crate) optimizer: O,
    pub(crate) regularizer: R,
    _phantom_model: PhantomData<M>,
}

/// Fluent builder for constructing a [`Trainer`].
///
/// Defaults:
/// - `batch_size`: 32
/// - `max_epochs`: 1000
/// - `tolerance`: 1e-6
/// - `verbose`: true
pub struct TrainerBuilder<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    batch_size: usize,
    max_epochs: usize,
    tolerance: f64,
    verbose: bool,
    loss_fn: L,
    optimizer: O,
    regularizer: R,
    _phantom_model: PhantomData<M>,
}

impl<L, O, M, R> TrainerBuilder<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    /// Creates a new builder with the given components.
    ///
    /// # Arguments
    /// * `loss_fn` - differentiable loss (e.g. `MSELoss`)
    /// * `optimizer` - parameter updater (e.g. `SGD`)
    /// * `regularizer` - penalty term (e.g. `L2` or `NoRegularizer`)
    pub fn new(loss_fn: L, optimizer: O, regularizer: R) -> Self {
        Self {
            batch_size: 32,
            max_epochs: 1000,
            tolerance: 1e-6,
            verbose: true,
            loss_fn,
            optimizer,
            regularizer,
            _phantom_model: PhantomData,
        }
    }

    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    pub fn max_epochs(mut self, epochs: usize) -> Self {
        self.max_epochs = epochs;
        self
    }

    /// Stops training once every batch gradient in an epoch has a norm below
    /// `tolerance`. Zero disables early stopping.
    pub fn tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// When `false`, suppresses the per-epoch `debug` loss events.
    pub fn verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn build(self) -> Trainer<L, O, M, R> {
        Trainer {
            batch_size: self.batch_size,
            max_epochs: self.max_epochs,
            tolerance: self.tolerance,
            verbose: self.verbose,
            loss_fn: self.loss_fn,
            optimizer: self.optimizer,
            regularizer: self.regularizer,
            _phantom_model: PhantomData,
        }
    }
}

impl<L, O, M, R> Trainer<L, O, M, R>
where
    L: Loss,
    M: TrainableModel,
    O: Optimizer<M::Params>,
    R: Regularizer<M>,
{
    /// Starts the builder pattern. Equivalent to [`TrainerBuilder::new`].
    pub fn builder(loss_fn: L, optimizer: O, regularizer: R) -> TrainerBuilder<L, O, M, R> {
        TrainerBuilder::new(loss_fn, optimizer, regularizer)
    }

    /// Trains the model on the provided dataset for up to `max_epochs`.
    ///
    /// Loss is averaged over the whole dataset per epoch. Gradients are averaged
    /// per batch before the regularizer gradient is added.
    ///
    /// # Errors
    /// - [`ModelError::EmptyData`] if the dataset is empty
    /// - [`ModelError::InvalidParameter`] if the dataset length is unknown
    /// - [`ModelError::Diverged`] if the epoch loss stops being finite
    /// - any batch loading error, converted into [`ModelError`]
    pub fn fit<D>(&self, mut model: M, dataset: &D) -> Result<M::Output, ModelError>
    where
        D: Dataset,
        ModelError: From<D::Error>,
    {
        let n_total = dataset.len().ok_or_else(|| {
            ModelError::InvalidParameter("training requires a dataset of known length".into())
        })?;
        if n_total == 0 {
            return Err(ModelError::EmptyData);
        }

        for epoch in 0..self.max_epochs {
            let mut total_loss = 0.0;
            let mut max_grad_norm: f64 = 0.0;

            for batch in dataset.batches(self.batch_size) {
                let (batch_x, batch_y) = batch?;
                let batch_len = batch_y.len() as f64;

                let preds = model.forward(&batch_x);
                let (reg_penalty, reg_grad) = self.regularizer.regularizer_penalty_grad(&model);
                total_loss += (self.loss_fn.loss(&preds, &batch_y) + reg_penalty) * batch_len;

                let grad_preds = self.loss_fn.grad_wrt_prediction(&preds, &batch_y);
                let grads = model.backward(&batch_x, &grad_preds).add(&reg_grad);
                max_grad_norm = max_grad_norm.max(grads.norm());

                let new_params = self.optimizer.step(model.params(), &grads);
                model.update_params(&new_params);
            }

            let avg_loss = total_loss / n_total as f64;
            if !avg_loss.is_finite() {
                return Err(ModelError::Diverged { epoch });
            }
            if self.verbose {
                debug!(epoch, loss = avg_loss, grad_norm = max_grad_norm, "epoch finished");
            }
            if max_grad_norm < self.tolerance {
                if self.verbose {
                    debug!(epoch, "gradient below tolerance, stopping early");
                }
                break;
            }
        }

        Ok(model.into_fitted())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        dataset::memory::InMemoryDataset,
        loss::MSELoss,
        model::linear::LinearRegression,
        model::InferenceModel,
        optimizer::SGD,
        regularizers::{NoRegularizer, L2},
    };
    use ndarray::{array, Array1, Array2};
    use std::ops::Range;

    type LinearTrainerBuilder = TrainerBuilder<MSELoss, SGD, LinearRegression, NoRegularizer>;

    fn builder() -> LinearTrainerBuilder {
        TrainerBuilder::new(MSELoss, SGD::new(0.01), NoRegularizer)
    }

    #[test]
    fn test_trainer_builder_default_values() {
        let builder = builder();

        assert_eq!(builder.batch_size, 32);
        assert_eq!(builder.max_epochs, 1000);
        assert_eq!(builder.tolerance, 1e-6);
        assert!(builder.verbose);
    }

    #[test]
    fn test_trainer_builder_chaining() {
        let builder = builder()
            .batch_size(128)
            .max_epochs(250)
            .tolerance(0.0)
            .verbose(false);

        assert_eq!(builder.batch_size, 128);
        assert_eq!(builder.max_epochs, 250);
        assert_eq!(builder.tolerance, 0.0);
        assert!(!builder.verbose);
    }

    #[test]
    fn test_trainer_builder_chaining_order_independent() {
        let builder1 = builder().batch_size(16).max_epochs(100);
        let builder2 = builder().max_epochs(100).batch_size(16);

        assert_eq!(builder1.batch_size, builder2.batch_size);
        assert_eq!(builder1.max_epochs, builder2.max_epochs);
    }

    #[test]
    fn test_trainer_builder_creates_valid_trainer() {
        let trainer = builder()
            .batch_size(64)
            .max_epochs(200)
            .verbose(false)
            .build();

        assert_eq!(trainer.batch_size, 64);
        assert_eq!(trainer.max_epochs, 200);
        assert!(!trainer.verbose);
    }

    #[test]
    fn test_trainer_fit_linear_regression() {
        // y = 2*x1 + 3*x2 + 1
        let x = array![[1.0, 0.0], [0.0, 1.0], [1.0, 1.0], [2.0, 3.0]];
        let y = array![3.0, 4.0, 6.0, 14.0];
        let dataset = InMemoryDataset::new(x, y).unwrap();

        let trainer = Trainer::builder(MSELoss, SGD::new(0.1), NoRegularizer)
            .batch_size(4)
            .max_epochs(2000)
            .verbose(false)
            .build();

        let fitted = trainer.fit(LinearRegression::new(2), &dataset).unwrap();

        let preds = fitted.predict_batch(&array![[1.0, 0.0], [0.0, 1.0]]).unwrap();
        assert!((preds[0] - 3.0).abs() < 0.05);
        assert!((preds[1] - 4.0).abs() < 0.05);
    }

    #[test]
    fn test_trainer_with_l2_regularization() {
        let x = array![[1.0], [2.0], [3.0]];
        let y = array![2.0, 4.0, 6.0];
        let dataset = InMemoryDataset::new(x, y).unwrap();

        let trainer = Trainer::builder(MSELoss, SGD::new(0.01), L2::new(1.0))
            .batch_size(3)
            .max_epochs(500)
            .verbose(false)
            .build();

        let fitted = trainer.fit(LinearRegression::new(1), &dataset).unwrap();
        let weight = fitted.params().weights[0];

        // Unpenalized the weight would approach 2.0
        assert!(weight < 2.0);
        assert!(weight > 0.0);
    }

    #[test]
    fn test_trainer_reports_divergence() {
        let dataset = InMemoryDataset::new(array![[100.0], [200.0]], array![1.0, 2.0]).unwrap();

        let trainer = Trainer::builder(MSELoss, SGD::new(10.0), NoRegularizer)
            .batch_size(2)
            .max_epochs(1000)
            .verbose(false)
            .build();

        let result = trainer.fit(LinearRegression::new(1), &dataset);
        assert!(matches!(result, Err(ModelError::Diverged { .. })));
    }

    #[test]
    fn test_trainer_zero_epochs_returns_initial_model() {
        let dataset = InMemoryDataset::new(array![[1.0]], array![5.0]).unwrap();
        let trainer = builder().max_epochs(0).verbose(false).build();

        let fitted = trainer.fit(LinearRegression::new(1), &dataset).unwrap();
        assert_eq!(fitted.predict_batch(&array![[1.0]]).unwrap()[0], 0.0);
    }

    #[test]
    fn test_trainer_unknown_dataset_length() {
        struct StreamingDataset;

        impl Dataset for StreamingDataset {
            type Error = ModelError;

            fn len(&self) -> Option<usize> {
                None
            }

            fn get_batch(&self, _range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
                Ok((Array2::zeros((1, 1)), Array1::zeros(1)))
            }
        }

        let trainer = builder().batch_size(1).max_epochs(1).build();
        let result = trainer.fit(LinearRegression::new(1), &StreamingDataset);
        assert!(matches!(result, Err(ModelError::InvalidParameter(_))));
    }
}
