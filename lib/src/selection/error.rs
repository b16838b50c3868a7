use crate::model::ModelError;
use crate::serialization::PersistenceError;
use std::fmt;
use thiserror::Error;

/// Where in a candidate's evaluation a failure happened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TrainingStage {
    Fit,
    Predict,
}

impl fmt::Display for TrainingStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrainingStage::Fit => f.write_str("fit"),
            TrainingStage::Predict => f.write_str("predict"),
        }
    }
}

#[derive(Error, Debug)]
pub enum SelectionError {
    #[error("candidate roster is empty")]
    EmptyRoster,

    #[error("unknown candidate model '{0}'")]
    UnknownCandidate(String),

    #[error("invalid training data: {0}")]
    InvalidData(String),

    #[error("candidate '{candidate}' failed during {stage}")]
    TrainingFailure {
        candidate: String,
        stage: TrainingStage,
        #[source]
        source: ModelError,
    },

    #[error("no acceptable model: best was '{best_model}' with R² {score:.4}, below threshold {threshold}")]
    NoAcceptableModel {
        best_model: String,
        score: f64,
        threshold: f64,
    },

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}
