use crate::metrics::Metrics;
use crate::model::{Estimator, FittedRegressor, InferenceModel, ModelError};
use crate::selection::{CandidateRoster, ModelHyperparameters, ModelReport, SelectionError, TrainingStage};
use crate::serialization::{read_artifact, write_artifact, ArtifactKind, PersistenceError};
use ndarray::{s, Array1, Array2};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default minimum held-out R² for a model to be accepted.
pub const DEFAULT_MIN_SCORE: f64 = 0.6;

#[derive(Clone, Debug, PartialEq)]
pub struct ModelSelectorConfig {
    /// Where the selected model is written.
    pub model_path: PathBuf,
    /// Scores strictly below this are rejected.
    pub min_score: f64,
    pub hyperparameters: ModelHyperparameters,
}

impl Default for ModelSelectorConfig {
    fn default() -> Self {
        Self {
            model_path: PathBuf::from("artifact").join("model.bin"),
            min_score: DEFAULT_MIN_SCORE,
            hyperparameters: ModelHyperparameters::default(),
        }
    }
}

/// Outcome of a successful selection.
#[derive(Clone, Debug)]
pub struct SelectedModel {
    pub name: String,
    pub score: f64,
    pub model: FittedRegressor,
    pub report: ModelReport,
}

/// The model artifact: the fitted model with its roster name and score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistedModel {
    pub name: String,
    pub score: f64,
    pub model: FittedRegressor,
}

impl PersistedModel {
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), PersistenceError> {
        write_artifact(path, ArtifactKind::Model, self)
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        read_artifact(path, ArtifactKind::Model)
    }
}

/// Trains every candidate, scores it on held-out data and persists the best.
#[derive(Clone, Debug, Default)]
pub struct ModelSelector {
    config: ModelSelectorConfig,
}

impl ModelSelector {
    pub fn new(config: ModelSelectorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ModelSelectorConfig {
        &self.config
    }

    /// Splits the last column of each array off as the target and delegates
    /// to [`initiate_training`](Self::initiate_training).
    pub fn initiate_model_trainer(
        &self,
        train: &Array2<f64>,
        test: &Array2<f64>,
        roster: &CandidateRoster,
    ) -> Result<SelectedModel, SelectionError> {
        let (train_x, train_y) = split_target(train, "train")?;
        let (test_x, test_y) = split_target(test, "test")?;
        self.initiate_training(&train_x, &train_y, &test_x, &test_y, roster)
    }

    /// Fits each candidate in roster order and scores it with R² on the test set.
    ///
    /// The first candidate failure aborts the whole run. The best model (first
    /// in roster order on ties) is persisted only if its score reaches
    /// `min_score`; otherwise nothing is written.
    ///
    /// # Errors
    /// - [`SelectionError::EmptyRoster`] / [`SelectionError::InvalidData`] before any training
    /// - [`SelectionError::TrainingFailure`] naming the failing candidate
    /// - [`SelectionError::NoAcceptableModel`] if the best score is below the threshold
    /// - [`SelectionError::Persistence`] if the artifact cannot be written
    pub fn initiate_training(
        &self,
        train_x: &Array2<f64>,
        train_y: &Array1<f64>,
        test_x: &Array2<f64>,
        test_y: &Array1<f64>,
        roster: &CandidateRoster,
    ) -> Result<SelectedModel, SelectionError> {
        if roster.is_empty() {
            return Err(SelectionError::EmptyRoster);
        }
        validate_inputs(train_x, train_y, test_x, test_y)?;

        info!(
            n_candidates = roster.len(),
            n_train = train_x.nrows(),
            n_test = test_x.nrows(),
            "evaluating candidate models"
        );

        let y_true = test_y.to_vec();
        let mut report = ModelReport::new();
        let mut best: Option<(&'static str, f64, FittedRegressor)> = None;

        for candidate in roster.iter() {
            let failure = |stage, source| SelectionError::TrainingFailure {
                candidate: candidate.name.to_string(),
                stage,
                source,
            };

            let regressor = candidate.build(&self.config.hyperparameters);
            let fitted = regressor
                .fit(train_x, train_y)
                .map_err(|e| failure(TrainingStage::Fit, e))?;
            let predictions = fitted
                .predict_batch(test_x)
                .map_err(|e| failure(TrainingStage::Predict, e))?;
            if predictions.iter().any(|p| !p.is_finite()) {
                return Err(failure(TrainingStage::Predict, ModelError::NonFinitePrediction));
            }

            let metrics = Metrics::calculate_all(&y_true, &predictions.to_vec());
            let score = metrics.r_squared;
            info!(
                candidate = candidate.name,
                r2 = score,
                rmse = metrics.rmse,
                mae = metrics.mae,
                "candidate scored"
            );
            report.push(candidate.name, &metrics);

            if best.as_ref().map_or(true, |(_, best_score, _)| score > *best_score) {
                best = Some((candidate.name, score, fitted));
            }
        }

        let (name, score, model) = best.ok_or(SelectionError::EmptyRoster)?;
        if score < self.config.min_score {
            warn!(
                best_model = name,
                r2 = score,
                threshold = self.config.min_score,
                "no model reached the minimum score"
            );
            return Err(SelectionError::NoAcceptableModel {
                best_model: name.to_string(),
                score,
                threshold: self.config.min_score,
            });
        }

        let persisted = PersistedModel {
            name: name.to_string(),
            score,
            model,
        };
        persisted.save(&self.config.model_path)?;
        info!(
            model = name,
            r2 = score,
            path = %self.config.model_path.display(),
            "best model saved"
        );

        Ok(SelectedModel {
            name: persisted.name,
            score,
            model: persisted.model,
            report,
        })
    }
}

fn split_target(data: &Array2<f64>, which: &str) -> Result<(Array2<f64>, Array1<f64>), SelectionError> {
    if data.ncols() < 2 {
        return Err(SelectionError::InvalidData(format!(
            "{which} array needs at least one feature column and a target column, got {} columns",
            data.ncols()
        )));
    }
    let last = data.ncols() - 1;
    Ok((
        data.slice(s![.., ..last]).to_owned(),
        data.column(last).to_owned(),
    ))
}

fn validate_inputs(
    train_x: &Array2<f64>,
    train_y: &Array1<f64>,
    test_x: &Array2<f64>,
    test_y: &Array1<f64>,
) -> Result<(), SelectionError> {
    let invalid = |msg: String| Err(SelectionError::InvalidData(msg));

    if train_x.nrows() == 0 {
        return invalid("training set is empty".into());
    }
    if test_x.nrows() == 0 {
        return invalid("test set is empty".into());
    }
    if train_x.nrows() != train_y.len() {
        return invalid(format!(
            "training set has {} rows but {} targets",
            train_x.nrows(),
            train_y.len()
        ));
    }
    if test_x.nrows() != test_y.len() {
        return invalid(format!(
            "test set has {} rows but {} targets",
            test_x.nrows(),
            test_y.len()
        ));
    }
    if train_x.ncols() != test_x.ncols() {
        return invalid(format!(
            "training set has {} features but test set has {}",
            train_x.ncols(),
            test_x.ncols()
        ));
    }
    let all_finite = train_x.iter().chain(train_y).chain(test_x).chain(test_y).all(|v| v.is_finite());
    if !all_finite {
        return invalid("inputs contain NaN or infinite values".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::linear::{GradientDescentConfig, LinearEstimator};
    use crate::model::neighbors::KNeighborsRegressor;
    use crate::model::tree::DecisionTreeRegressor;
    use crate::model::Regressor;
    use tempfile::tempdir;

    fn quiet_linear(h: &ModelHyperparameters) -> Regressor {
        Regressor::Linear(LinearEstimator::ordinary(GradientDescentConfig {
            verbose: false,
            ..h.gradient_descent.clone()
        }))
    }

    fn nearest(_: &ModelHyperparameters) -> Regressor {
        Regressor::KNeighbors(KNeighborsRegressor::new(1))
    }

    fn tree(h: &ModelHyperparameters) -> Regressor {
        Regressor::DecisionTree(DecisionTreeRegressor::new(h.decision_tree.clone(), h.seed))
    }

    fn broken(_: &ModelHyperparameters) -> Regressor {
        Regressor::KNeighbors(KNeighborsRegressor::new(0))
    }

    /// y = 3*x0 + 2*x1 + 5 over 40 rows; every fifth row is held out.
    fn linear_split() -> (Array2<f64>, Array1<f64>, Array2<f64>, Array1<f64>) {
        let row = |i: usize| {
            let x0 = (i as f64 - 20.0) / 12.0;
            let x1 = (((i * 7) % 11) as f64 - 5.0) / 3.0;
            (x0, x1, 3.0 * x0 + 2.0 * x1 + 5.0)
        };
        let (mut train, mut test) = (Vec::new(), Vec::new());
        for i in 0..40 {
            if i % 5 == 0 {
                test.push(row(i));
            } else {
                train.push(row(i));
            }
        }
        let to_arrays = |rows: Vec<(f64, f64, f64)>| {
            let x = Array2::from_shape_fn((rows.len(), 2), |(r, c)| if c == 0 { rows[r].0 } else { rows[r].1 });
            let y = Array1::from_iter(rows.iter().map(|r| r.2));
            (x, y)
        };
        let (train_x, train_y) = to_arrays(train);
        let (test_x, test_y) = to_arrays(test);
        (train_x, train_y, test_x, test_y)
    }

    fn selector(dir: &Path, min_score: f64) -> ModelSelector {
        ModelSelector::new(ModelSelectorConfig {
            model_path: dir.join("model.bin"),
            min_score,
            ..Default::default()
        })
    }

    #[test]
    fn test_selects_best_and_persists() {
        let dir = tempdir().unwrap();
        let (train_x, train_y, test_x, test_y) = linear_split();
        let roster = CandidateRoster::empty()
            .with_candidate("nearest", nearest)
            .with_candidate("linear", quiet_linear);

        let selected = selector(dir.path(), 0.6)
            .initiate_training(&train_x, &train_y, &test_x, &test_y, &roster)
            .unwrap();

        assert_eq!(selected.name, "linear");
        assert!(selected.score > 0.99);
        assert_eq!(selected.report.len(), 2);
        assert_eq!(selected.report.iter().next().unwrap().name, "nearest");

        let persisted = PersistedModel::load(dir.path().join("model.bin")).unwrap();
        assert_eq!(persisted.name, "linear");
        assert_eq!(persisted.score, selected.score);
        assert_eq!(persisted.model, selected.model);
    }

    #[test]
    fn test_repeated_runs_select_identically() {
        let (train_x, train_y, test_x, test_y) = linear_split();
        let roster = CandidateRoster::standard();
        let run = |dir: &Path| {
            selector(dir, f64::NEG_INFINITY)
                .initiate_training(&train_x, &train_y, &test_x, &test_y, &roster)
                .unwrap()
        };

        let (first_dir, second_dir) = (tempdir().unwrap(), tempdir().unwrap());
        let first = run(first_dir.path());
        let second = run(second_dir.path());

        assert_eq!(first.name, second.name);
        assert_eq!(first.score, second.score);
        assert_eq!(first.report, second.report);
        assert_eq!(first.model, second.model);
        assert_eq!(first.report.len(), roster.len());
        for name in ["Random Forest Regressor", "Gradient Boosting Regressor", "AdaBoost Regressor"] {
            assert_eq!(first.report.get(name), second.report.get(name));
        }
        assert_eq!(
            std::fs::read(first_dir.path().join("model.bin")).unwrap(),
            std::fs::read(second_dir.path().join("model.bin")).unwrap()
        );
    }

    #[test]
    fn test_tie_goes_to_first_candidate() {
        let dir = tempdir().unwrap();
        let (train_x, train_y, test_x, test_y) = linear_split();
        let roster = CandidateRoster::empty()
            .with_candidate("tree one", tree)
            .with_candidate("tree two", tree);

        let selected = selector(dir.path(), -10.0)
            .initiate_training(&train_x, &train_y, &test_x, &test_y, &roster)
            .unwrap();

        assert_eq!(selected.name, "tree one");
        assert_eq!(selected.report.get("tree one"), selected.report.get("tree two"));
    }

    #[test]
    fn test_below_threshold_writes_nothing() {
        let dir = tempdir().unwrap();
        // Constant features carry no signal, so every model predicts a constant
        let train_x = Array2::from_elem((6, 2), 1.0);
        let train_y = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let test_x = Array2::from_elem((3, 2), 1.0);
        let test_y = Array1::from_vec(vec![1.0, 5.0, 9.0]);
        let roster = CandidateRoster::empty()
            .with_candidate("nearest", nearest)
            .with_candidate("tree", tree);

        let err = selector(dir.path(), 0.6)
            .initiate_training(&train_x, &train_y, &test_x, &test_y, &roster)
            .unwrap_err();

        match err {
            SelectionError::NoAcceptableModel {
                best_model,
                score,
                threshold,
            } => {
                assert!(score < 0.6);
                assert_eq!(threshold, 0.6);
                assert!(!best_model.is_empty());
            }
            other => panic!("expected NoAcceptableModel, got {other:?}"),
        }
        assert!(!dir.path().join("model.bin").exists());
    }

    #[test]
    fn test_score_equal_to_threshold_is_accepted() {
        let dir = tempdir().unwrap();
        // Test rows repeat training rows, so 1-NN is exact and scores 1.0
        let train_x = Array2::from_shape_vec((3, 1), vec![0.0, 1.0, 2.0]).unwrap();
        let train_y = Array1::from_vec(vec![10.0, 20.0, 30.0]);
        let roster = CandidateRoster::empty().with_candidate("nearest", nearest);

        let selected = selector(dir.path(), 1.0)
            .initiate_training(&train_x, &train_y, &train_x, &train_y, &roster)
            .unwrap();

        assert_eq!(selected.score, 1.0);
        assert!(dir.path().join("model.bin").exists());
    }

    #[test]
    fn test_failing_candidate_aborts_run() {
        let dir = tempdir().unwrap();
        let (train_x, train_y, test_x, test_y) = linear_split();
        let roster = CandidateRoster::empty()
            .with_candidate("linear", quiet_linear)
            .with_candidate("broken", broken);

        let err = selector(dir.path(), 0.0)
            .initiate_training(&train_x, &train_y, &test_x, &test_y, &roster)
            .unwrap_err();

        match err {
            SelectionError::TrainingFailure {
                candidate,
                stage,
                source,
            } => {
                assert_eq!(candidate, "broken");
                assert_eq!(stage, TrainingStage::Fit);
                assert!(matches!(source, ModelError::InvalidParameter(_)));
            }
            other => panic!("expected TrainingFailure, got {other:?}"),
        }
        assert!(!dir.path().join("model.bin").exists());
    }

    #[test]
    fn test_single_test_row_scores_zero() {
        let dir = tempdir().unwrap();
        let train_x = Array2::from_shape_vec((4, 1), vec![0.0, 1.0, 2.0, 3.0]).unwrap();
        let train_y = Array1::from_vec(vec![1.0, 2.0, 3.0, 4.0]);
        let test_x = Array2::from_shape_vec((1, 1), vec![10.0]).unwrap();
        let test_y = Array1::from_vec(vec![11.0]);
        let roster = CandidateRoster::empty().with_candidate("nearest", nearest);

        let err = selector(dir.path(), 0.6)
            .initiate_training(&train_x, &train_y, &test_x, &test_y, &roster)
            .unwrap_err();
        assert!(matches!(err, SelectionError::NoAcceptableModel { score, .. } if score == 0.0));
    }

    #[test]
    fn test_input_validation() {
        let dir = tempdir().unwrap();
        let s = selector(dir.path(), 0.6);
        let roster = CandidateRoster::empty().with_candidate("nearest", nearest);
        let x = Array2::from_elem((2, 2), 1.0);
        let y = Array1::from_vec(vec![1.0, 2.0]);

        assert!(matches!(
            s.initiate_training(&x, &y, &x, &y, &CandidateRoster::empty()),
            Err(SelectionError::EmptyRoster)
        ));
        assert!(matches!(
            s.initiate_training(&x, &Array1::from_vec(vec![1.0]), &x, &y, &roster),
            Err(SelectionError::InvalidData(_))
        ));
        assert!(matches!(
            s.initiate_training(&x, &y, &Array2::from_elem((2, 3), 1.0), &y, &roster),
            Err(SelectionError::InvalidData(_))
        ));
        assert!(matches!(
            s.initiate_training(&x, &y, &Array2::zeros((0, 2)), &Array1::zeros(0), &roster),
            Err(SelectionError::InvalidData(_))
        ));
        let mut nan_x = x.clone();
        nan_x[[0, 0]] = f64::NAN;
        assert!(matches!(
            s.initiate_training(&nan_x, &y, &x, &y, &roster),
            Err(SelectionError::InvalidData(_))
        ));
    }

    #[test]
    fn test_initiate_model_trainer_splits_last_column() {
        let dir = tempdir().unwrap();
        let train = Array2::from_shape_vec((3, 2), vec![0.0, 10.0, 1.0, 20.0, 2.0, 30.0]).unwrap();
        let roster = CandidateRoster::empty().with_candidate("nearest", nearest);

        let selected = selector(dir.path(), 0.6)
            .initiate_model_trainer(&train, &train, &roster)
            .unwrap();
        assert_eq!(selected.model.n_features(), 1);
        assert_eq!(selected.score, 1.0);

        let err = selector(dir.path(), 0.6)
            .initiate_model_trainer(&Array2::zeros((3, 1)), &train, &roster)
            .unwrap_err();
        assert!(matches!(err, SelectionError::InvalidData(_)));
    }
}
