//! Data preprocessing transformers.
//!
//! Transformers follow a type-state pattern: an unfitted transformer holds
//! hyperparameters, fitting it returns a separate fitted type that holds only
//! the learned parameters and can be serialized.
//!
//! # Core Traits
//!
//! - [`Transformer`]: Unfitted transformer with hyperparameters
//! - [`FittedTransformer`]: Fitted transformer ready for inference
//!
//! # Available Transformers
//!
//! - [`SimpleImputer`]: Fill missing values with mean, median, most_frequent, or constant
//! - [`StandardScaler`]: Z-score normalization
//! - [`Pipeline`]: Chain imputation and scaling
//! - [`FeatureTransformer`]: Named-column imputation + scaling over a [`FeatureTable`],
//!   built for the house features by [`build_transformer`]
//!
//! [`FeatureTable`]: crate::dataset::FeatureTable

pub mod error;
pub mod feature_transformer;
pub mod imputation;
pub mod pipeline;
pub mod scaling;
pub mod traits;

pub use error::{ConfigurationError, PreprocessingError};
pub use feature_transformer::{
    build_transformer, FeatureTransformer, FeatureTransformerParams, TransformerConfig,
};
pub use imputation::{FittedSimpleImputer, ImputeStrategy, SimpleImputer, SimpleImputerParams};
pub use pipeline::{FittedPipeline, Pipeline, PipelineParams, PipelineStep, PipelineStepEnum};
pub use scaling::{
    FittedStandardScaler, StandardScaler, StandardScalerConfig, StandardScalerParams,
};
pub use traits::{FittedTransformer, Transformer};
