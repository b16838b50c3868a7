//! Core traits for preprocessing transformers.
//!
//! This module defines the two central traits:
//! - [`Transformer`]: Used during fitting; has hyperparameters and can learn from data.
//! - [`FittedTransformer`]: After fitting; ready for inference and serialization.
//!
//! Both operate on dense `f64` matrices with one row per sample and one column
//! per feature. Missing values are encoded as NaN.

use crate::preprocessing::error::PreprocessingError;
use crate::serialization::{read_artifact, write_artifact, ArtifactKind, SerializableParams};
use ndarray::Array2;
use std::path::Path;

/// Trait for unfitted transformers with hyperparameters.
///
/// A transformer learns parameters from training data and can then transform
/// new data using those learned parameters. This trait represents the
/// configurable, unfitted state.
///
/// # Example
/// ```ignore
/// use house_price_ml::preprocessing::{Transformer, FittedTransformer, StandardScaler};
///
/// let scaler = StandardScaler::new();
/// let fitted = scaler.fit(&data)?;
/// let transformed = fitted.transform(&new_data)?;
/// ```
pub trait Transformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams<Error = bincode::Error>;
    /// The fitted transformer type ready for inference.
    type Fitted: FittedTransformer<Params = Self::Params>;

    /// Fit the transformer to the training data.
    ///
    /// # Errors
    /// Returns [`PreprocessingError`] if the data is empty or has a shape the
    /// transformer cannot learn from.
    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted, PreprocessingError>;

    /// Fit the transformer and transform the data in one step.
    fn fit_transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        let fitted = self.fit(data)?;
        fitted.transform(data)
    }
}

/// Trait for fitted transformers ready for inference.
///
/// # Guarantees
/// - `extract_params()` + `from_params()` is a lossless round-trip.
/// - `transform` never mutates the fitted state.
pub trait FittedTransformer: Clone {
    /// Serializable representation of learned parameters.
    type Params: SerializableParams<Error = bincode::Error>;

    /// Transform data using learned parameters.
    ///
    /// # Errors
    /// Returns [`PreprocessingError::FeatureMismatch`] if the column count differs
    /// from the one seen during fit.
    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError>;

    /// Extract learned parameters as a serializable representation.
    fn extract_params(&self) -> Self::Params;

    /// Reconstruct a fitted transformer from parameters.
    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError>
    where
        Self: Sized;

    /// Save the fitted transformer to a file.
    fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<(), PreprocessingError> {
        write_artifact(path, ArtifactKind::Transformer, &self.extract_params())?;
        Ok(())
    }

    /// Load a fitted transformer from a file.
    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError>
    where
        Self: Sized,
    {
        let params = read_artifact(path, ArtifactKind::Transformer)?;
        Self::from_params(params)
    }

    /// Returns the number of features seen during fit.
    fn n_features_in(&self) -> usize;
}

/// Checks that `data` has the column count a fitted transformer expects.
pub(crate) fn check_n_features(
    data: &Array2<f64>,
    expected_features: usize,
) -> Result<(), PreprocessingError> {
    if data.ncols() != expected_features {
        return Err(PreprocessingError::FeatureMismatch {
            expected_features,
            got_features: data.ncols(),
        });
    }
    Ok(())
}
