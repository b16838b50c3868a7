//! Pipeline utilities for chaining transformers.
//!
//! # Example
//!
//! ```ignore
//! use house_price_ml::preprocessing::{Pipeline, SimpleImputer, StandardScaler, Transformer};
//!
//! let pipeline = Pipeline::new()
//!     .add_simple_imputer(SimpleImputer::default())
//!     .add_standard_scaler(StandardScaler::new());
//!
//! let fitted = pipeline.fit(&data)?;
//! ```

#[allow(clippy::module_inception)]
pub mod pipeline;

pub use pipeline::{
    FittedPipeline, Pipeline, PipelineParams, PipelineStep, PipelineStepEnum, PipelineStepParams,
};
