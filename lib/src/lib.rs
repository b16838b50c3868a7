//! # house-price-ml
//!
//! Preprocessing, model selection and inference for house sale price
//! regression on King County style sales data.
//!
//! ## Core Design Principles
//!
//! - **Stateful Type Safety**: transformers and gradient-trained models carry
//!   their training state in the type system (`Unfitted` vs `Fitted`), so an
//!   untrained model cannot predict.
//! - **Training/Inference Separation**: fitted models hold only prediction
//!   parameters; losses, optimizers and trainers live elsewhere.
//! - **Explicit artifacts**: the fitted preprocessor and the selected model are
//!   persisted as typed bincode envelopes and loaded back into an immutable
//!   [`PricePredictor`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use house_price_ml::{PricePredictor, TrainingConfig, TrainingPipeline};
//!
//! let summary = TrainingPipeline::new(TrainingConfig::default())
//!     .run("data/train.csv", "data/test.csv")?;
//! println!("{} scored R² = {:.3}", summary.model_name, summary.score);
//!
//! let predictor = PricePredictor::load(&summary.preprocessor_path, &summary.model_path)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Module Structure
//!
//! - `dataset`: CSV feature tables, in-memory datasets and the house schema
//! - `preprocessing`: imputation, scaling, pipelines and the named-column transformer
//! - `transformation`: fits the transformer on train data and produces model-ready arrays
//! - `model`: linear, nearest-neighbour, tree and ensemble regressors
//! - `loss`, `optimizer`, `regularizers`, `trainer`: gradient descent for linear models
//! - `selection`: candidate roster, scoring and persistence of the best model
//! - `inference`: price prediction from persisted artifacts
//! - `training`: the end-to-end pipeline
//! - `config`: TOML configuration

/// Data loading utilities and dataset abstractions.
pub mod dataset;

/// Data preprocessing transformers.
pub mod preprocessing;

/// Train/test table transformation into model-ready arrays.
pub mod transformation;

/// Differentiable loss functions for model training.
pub mod loss;

/// Regression models with compile-time state safety.
pub mod model;

/// Optimization algorithms for parameter updates.
pub mod optimizer;

/// Weight regularization strategies.
pub mod regularizers;

/// Gradient descent training loop.
pub mod trainer;

/// Regression metrics.
pub mod metrics;

/// Candidate training, scoring and selection.
pub mod selection;

/// Price prediction from persisted artifacts.
pub mod inference;

/// End-to-end training pipeline.
pub mod training;

/// Training configuration.
pub mod config;

/// Artifact persistence.
pub mod serialization;

pub mod error;

pub use config::{ConfigError, TrainingConfig};
pub use dataset::{FeatureTable, HouseFeatures, HOUSE_FEATURES, TARGET_COLUMN};
pub use error::{Error, Result};
pub use inference::{PredictionError, PricePredictor};
pub use metrics::{Metrics, RegressionMetrics};
pub use preprocessing::{build_transformer, FeatureTransformer, TransformerConfig};
pub use selection::{
    CandidateRoster, ModelHyperparameters, ModelReport, ModelSelector, ModelSelectorConfig,
    SelectedModel, SelectionError,
};
pub use training::{TrainingPipeline, TrainingSummary};
pub use transformation::{DataTransformation, DataTransformationConfig, TransformedData};
