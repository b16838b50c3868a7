//! End-to-end training: data transformation followed by model selection.

use crate::config::TrainingConfig;
use crate::error::Result;
use crate::selection::{ModelReport, ModelSelector};
use crate::transformation::DataTransformation;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

/// What a successful training run produced.
#[derive(Clone, Debug, Serialize)]
pub struct TrainingSummary {
    pub model_name: String,
    /// Held-out R² of the selected model.
    pub score: f64,
    pub report: ModelReport,
    pub preprocessor_path: PathBuf,
    pub model_path: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct TrainingPipeline {
    config: TrainingConfig,
}

impl TrainingPipeline {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Transforms both CSV files, trains the roster and persists the best model.
    pub fn run<P, Q>(&self, train_path: P, test_path: Q) -> Result<TrainingSummary>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        self.config.validate()?;
        let roster = self.config.roster()?;

        info!("starting data transformation");
        let data = DataTransformation::new(self.config.transformation_config())
            .initiate_data_transformation(train_path, test_path)?;

        info!(candidates = ?roster.names(), "starting model training");
        let selector = ModelSelector::new(self.config.selector_config());
        let selected = selector.initiate_model_trainer(&data.train, &data.test, &roster)?;

        info!(model = %selected.name, r2 = selected.score, "training finished");
        Ok(TrainingSummary {
            model_name: selected.name,
            score: selected.score,
            report: selected.report,
            preprocessor_path: data.preprocessor_path,
            model_path: selector.config().model_path.clone(),
        })
    }
}
