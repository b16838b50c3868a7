//! Model selection: train a roster of candidates, score each on held-out data
//! with R², keep the best one if it clears a minimum score.

pub mod error;
pub mod registry;
pub mod report;
pub mod selector;

pub use error::{SelectionError, TrainingStage};
pub use registry::{Candidate, CandidateFactory, CandidateRoster, ModelHyperparameters};
pub use report::{ModelReport, ModelScore};
pub use selector::{
    ModelSelector, ModelSelectorConfig, PersistedModel, SelectedModel, DEFAULT_MIN_SCORE,
};
