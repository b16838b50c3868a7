use crate::config::ConfigError;
use crate::inference::PredictionError;
use crate::selection::SelectionError;
use crate::transformation::TransformationError;
use thiserror::Error;

/// Any failure of the end-to-end pipeline, tagged with the stage it came from.
#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid configuration")]
    Config(#[from] ConfigError),
    #[error("data transformation failed")]
    Transformation(#[from] TransformationError),
    #[error("model selection failed")]
    Selection(#[from] SelectionError),
    #[error("prediction failed")]
    Prediction(#[from] PredictionError),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
