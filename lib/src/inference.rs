//! Price prediction from persisted artifacts.

use crate::dataset::schema::{HouseFeatures, HOUSE_FEATURES};
use crate::model::{InferenceModel, ModelError};
use crate::preprocessing::{FeatureTransformer, PreprocessingError};
use crate::selection::PersistedModel;
use crate::serialization::PersistenceError;
use std::path::Path;
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum PredictionError {
    #[error("failed to load preprocessor")]
    Preprocessor(#[source] PreprocessingError),
    #[error("failed to load model")]
    Model(#[source] PersistenceError),
    #[error("preprocessor is not built over the house feature columns")]
    FeatureLayout,
    #[error("preprocessor emits {transformer} features but model '{model_name}' expects {model}")]
    Incompatible {
        model_name: String,
        transformer: usize,
        model: usize,
    },
    #[error(transparent)]
    Transform(#[from] PreprocessingError),
    #[error(transparent)]
    Predict(#[from] ModelError),
}

/// An immutable handle over a fitted preprocessor and a selected model.
///
/// Load once, predict many times. Nothing is cached globally.
#[derive(Clone, Debug)]
pub struct PricePredictor {
    transformer: FeatureTransformer,
    model: PersistedModel,
}

impl PricePredictor {
    pub fn load<P, Q>(preprocessor_path: P, model_path: Q) -> Result<Self, PredictionError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let transformer =
            FeatureTransformer::load(preprocessor_path).map_err(PredictionError::Preprocessor)?;
        let model = PersistedModel::load(model_path).map_err(PredictionError::Model)?;
        let predictor = Self::new(transformer, model)?;
        info!(
            model = %predictor.model_name(),
            r2 = predictor.model_score(),
            "loaded price predictor"
        );
        Ok(predictor)
    }

    /// Pairs an in-memory transformer and model, checking they fit together.
    pub fn new(transformer: FeatureTransformer, model: PersistedModel) -> Result<Self, PredictionError> {
        if !transformer
            .features()
            .iter()
            .map(String::as_str)
            .eq(HOUSE_FEATURES.iter().copied())
        {
            return Err(PredictionError::FeatureLayout);
        }
        if transformer.features().len() != model.model.n_features() {
            return Err(PredictionError::Incompatible {
                model_name: model.name.clone(),
                transformer: transformer.features().len(),
                model: model.model.n_features(),
            });
        }
        Ok(Self { transformer, model })
    }

    pub fn model_name(&self) -> &str {
        &self.model.name
    }

    /// Held-out R² recorded when the model was selected.
    pub fn model_score(&self) -> f64 {
        self.model.score
    }

    /// Predicts one price per house, in input order.
    pub fn predict(&self, houses: &[HouseFeatures]) -> Result<Vec<f64>, PredictionError> {
        if houses.is_empty() {
            return Ok(Vec::new());
        }
        let raw = HouseFeatures::to_matrix(houses);
        let features = self.transformer.apply_matrix(&raw)?;
        Ok(self.model.model.predict_batch(&features)?.to_vec())
    }

    pub fn predict_one(&self, house: &HouseFeatures) -> Result<f64, PredictionError> {
        let prices = self.predict(std::slice::from_ref(house))?;
        Ok(prices[0])
    }
}
