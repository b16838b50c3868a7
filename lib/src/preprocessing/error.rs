//! Error types for preprocessing operations.

use crate::serialization::PersistenceError;
use thiserror::Error;

/// The transformer configuration cannot be resolved against the data it is given.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigurationError {
    /// A named feature column is absent from the table header.
    #[error("required column '{column}' is missing from the table")]
    MissingColumn { column: String },
    /// A named feature column contains a value that is not a number.
    #[error("column '{column}' is not numeric (row {row}: '{value}')")]
    NonNumericColumn {
        column: String,
        row: usize,
        value: String,
    },
    /// The same feature name appears more than once in the feature list.
    #[error("feature '{0}' is listed more than once")]
    DuplicateFeature(String),
    /// The feature list is empty.
    #[error("feature list is empty")]
    NoFeatures,
}

/// Error type for preprocessing operations.
#[derive(Error, Debug)]
pub enum PreprocessingError {
    /// Named columns could not be resolved.
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    /// `apply` or `persist` was called before `fit`.
    #[error("transformer has not been fitted")]
    NotFitted,
    /// Data contains missing values (NaN) when not expected.
    #[error("missing values: {0}")]
    MissingValues(String),
    /// Invalid hyperparameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),
    /// Empty data provided where non-empty was required.
    #[error("empty data: {0}")]
    EmptyData(String),
    /// Feature dimension mismatch.
    #[error("feature mismatch: expected {expected_features} features, got {got_features}")]
    FeatureMismatch {
        expected_features: usize,
        got_features: usize,
    },
    /// Writing or reading a fitted transformer failed.
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
