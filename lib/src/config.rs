//! Training configuration, loaded from TOML.
//!
//! Every field has a default, so an empty file (or no file) is a valid
//! configuration:
//!
//! ```toml
//! artifact_dir = "artifact"
//! min_score = 0.6
//! candidates = ["Linear Regression", "Random Forest Regressor"]
//!
//! [preprocessing]
//! strategy = "median"
//!
//! [models]
//! seed = 42
//! n_neighbors = 5
//!
//! [models.random_forest]
//! n_estimators = 100
//! ```

use crate::preprocessing::TransformerConfig;
use crate::selection::{
    CandidateRoster, ModelHyperparameters, ModelSelectorConfig, DEFAULT_MIN_SCORE,
};
use crate::transformation::DataTransformationConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config '{}'", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainingConfig {
    /// Directory holding both artifacts.
    pub artifact_dir: PathBuf,
    pub preprocessor_file: String,
    pub model_file: String,
    /// Minimum held-out R² for the best model to be accepted.
    pub min_score: f64,
    /// Restricts training to these roster names; `None` trains all of them.
    pub candidates: Option<Vec<String>>,
    pub preprocessing: TransformerConfig,
    pub models: ModelHyperparameters,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            artifact_dir: PathBuf::from("artifact"),
            preprocessor_file: "preprocessor.bin".to_string(),
            model_file: "model.bin".to_string(),
            min_score: DEFAULT_MIN_SCORE,
            candidates: None,
            preprocessing: TransformerConfig::default(),
            models: ModelHyperparameters::default(),
        }
    }
}

impl TrainingConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn preprocessor_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.preprocessor_file)
    }

    pub fn model_path(&self) -> PathBuf {
        self.artifact_dir.join(&self.model_file)
    }

    /// The standard roster, restricted to `candidates` when set.
    pub fn roster(&self) -> Result<CandidateRoster, ConfigError> {
        let roster = CandidateRoster::standard();
        match &self.candidates {
            None => Ok(roster),
            Some(names) => roster
                .restrict(names)
                .map_err(|e| ConfigError::Invalid(e.to_string())),
        }
    }

    pub fn transformation_config(&self) -> DataTransformationConfig {
        DataTransformationConfig {
            preprocessor_path: self.preprocessor_path(),
            transformer: self.preprocessing.clone(),
        }
    }

    pub fn selector_config(&self) -> ModelSelectorConfig {
        ModelSelectorConfig {
            model_path: self.model_path(),
            min_score: self.min_score,
            hyperparameters: self.models.clone(),
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |msg: String| Err(ConfigError::Invalid(msg));

        if !self.min_score.is_finite() || self.min_score > 1.0 {
            return invalid(format!(
                "min_score must be a finite value of at most 1, got {}",
                self.min_score
            ));
        }
        if self.preprocessor_file.is_empty() || self.model_file.is_empty() {
            return invalid("artifact file names must not be empty".into());
        }
        if self.preprocessor_file == self.model_file {
            return invalid("preprocessor_file and model_file must differ".into());
        }
        if let Some(names) = &self.candidates {
            if names.is_empty() {
                return invalid("candidates must name at least one model".into());
            }
            self.roster()?;
        }

        let m = &self.models;
        let gd = &m.gradient_descent;
        let positive_rates = [
            ("gradient_descent.learning_rate", gd.learning_rate),
            ("svr_c", m.svr_c),
            ("gradient_boosting.learning_rate", m.gradient_boosting.learning_rate),
            ("ada_boost.learning_rate", m.ada_boost.learning_rate),
        ];
        for (name, value) in positive_rates {
            if !(value.is_finite() && value > 0.0) {
                return invalid(format!("{name} must be positive, got {value}"));
            }
        }
        let non_negative = [
            ("lasso_alpha", m.lasso_alpha),
            ("ridge_alpha", m.ridge_alpha),
            ("svr_epsilon", m.svr_epsilon),
            ("gradient_descent.tolerance", gd.tolerance),
        ];
        for (name, value) in non_negative {
            if !(value.is_finite() && value >= 0.0) {
                return invalid(format!("{name} must be non-negative, got {value}"));
            }
        }
        let counts = [
            ("gradient_descent.max_epochs", gd.max_epochs),
            ("n_neighbors", m.n_neighbors),
            ("random_forest.n_estimators", m.random_forest.n_estimators),
            ("gradient_boosting.n_estimators", m.gradient_boosting.n_estimators),
            ("ada_boost.n_estimators", m.ada_boost.n_estimators),
        ];
        for (name, value) in counts {
            if value == 0 {
                return invalid(format!("{name} must be at least 1"));
            }
        }
        if gd.batch_size == Some(0) {
            return invalid("gradient_descent.batch_size must be at least 1".into());
        }
        Ok(())
    }
}
