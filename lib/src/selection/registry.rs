//! The ordered roster of candidate models.
//!
//! A candidate is a display name plus a factory that builds an untrained
//! [`Regressor`] from [`ModelHyperparameters`]. Roster order is significant:
//! reports follow it and score ties are resolved in its favour.

use crate::model::boosting::{AdaBoostRegressor, GradientBoostingRegressor};
use crate::model::forest::RandomForestRegressor;
use crate::model::linear::{GradientDescentConfig, LinearEstimator};
use crate::model::neighbors::KNeighborsRegressor;
use crate::model::tree::{DecisionTreeRegressor, TreeConfig};
use crate::model::Regressor;
use crate::selection::SelectionError;
use serde::{Deserialize, Serialize};

/// Hyperparameters of every standard candidate.
///
/// `seed` drives all randomized learners; the `seed` fields inside the nested
/// ensemble settings are overwritten with it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelHyperparameters {
    pub seed: u64,
    pub gradient_descent: GradientDescentConfig,
    pub lasso_alpha: f64,
    pub ridge_alpha: f64,
    pub svr_c: f64,
    pub svr_epsilon: f64,
    pub n_neighbors: usize,
    pub decision_tree: TreeConfig,
    pub random_forest: RandomForestRegressor,
    pub gradient_boosting: GradientBoostingRegressor,
    pub ada_boost: AdaBoostRegressor,
}

impl Default for ModelHyperparameters {
    fn default() -> Self {
        Self {
            seed: 42,
            gradient_descent: GradientDescentConfig::default(),
            lasso_alpha: 1.0,
            ridge_alpha: 1.0,
            svr_c: 1.0,
            svr_epsilon: 0.0,
            n_neighbors: 5,
            decision_tree: TreeConfig::default(),
            random_forest: RandomForestRegressor::default(),
            gradient_boosting: GradientBoostingRegressor::default(),
            ada_boost: AdaBoostRegressor::default(),
        }
    }
}

/// Builds an untrained model from hyperparameters.
pub type CandidateFactory = fn(&ModelHyperparameters) -> Regressor;

#[derive(Clone, Copy)]
pub struct Candidate {
    pub name: &'static str,
    pub factory: CandidateFactory,
}

impl Candidate {
    pub fn build(&self, hyper: &ModelHyperparameters) -> Regressor {
        (self.factory)(hyper)
    }
}

impl std::fmt::Debug for Candidate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Candidate").field("name", &self.name).finish()
    }
}

fn linear_regression(h: &ModelHyperparameters) -> Regressor {
    Regressor::Linear(LinearEstimator::ordinary(h.gradient_descent.clone()))
}

fn lasso(h: &ModelHyperparameters) -> Regressor {
    Regressor::Linear(LinearEstimator::lasso(h.lasso_alpha, h.gradient_descent.clone()))
}

fn ridge(h: &ModelHyperparameters) -> Regressor {
    Regressor::Linear(LinearEstimator::ridge(h.ridge_alpha, h.gradient_descent.clone()))
}

fn k_neighbors(h: &ModelHyperparameters) -> Regressor {
    Regressor::KNeighbors(KNeighborsRegressor::new(h.n_neighbors))
}

fn decision_tree(h: &ModelHyperparameters) -> Regressor {
    Regressor::DecisionTree(DecisionTreeRegressor::new(h.decision_tree.clone(), h.seed))
}

fn random_forest(h: &ModelHyperparameters) -> Regressor {
    Regressor::RandomForest(RandomForestRegressor {
        seed: h.seed,
        ..h.random_forest.clone()
    })
}

fn gradient_boosting(h: &ModelHyperparameters) -> Regressor {
    Regressor::GradientBoosting(GradientBoostingRegressor {
        seed: h.seed,
        ..h.gradient_boosting.clone()
    })
}

fn ada_boost(h: &ModelHyperparameters) -> Regressor {
    Regressor::AdaBoost(AdaBoostRegressor {
        seed: h.seed,
        ..h.ada_boost.clone()
    })
}

fn svr(h: &ModelHyperparameters) -> Regressor {
    Regressor::Linear(LinearEstimator::linear_svr(
        h.svr_c,
        h.svr_epsilon,
        h.gradient_descent.clone(),
    ))
}

const STANDARD_CANDIDATES: [Candidate; 9] = [
    Candidate { name: "Linear Regression", factory: linear_regression },
    Candidate { name: "Lasso", factory: lasso },
    Candidate { name: "Ridge", factory: ridge },
    Candidate { name: "K-Neighbors Regressor", factory: k_neighbors },
    Candidate { name: "Decision Tree", factory: decision_tree },
    Candidate { name: "Random Forest Regressor", factory: random_forest },
    Candidate { name: "Gradient Boosting Regressor", factory: gradient_boosting },
    Candidate { name: "AdaBoost Regressor", factory: ada_boost },
    Candidate { name: "SVR", factory: svr },
];

/// An ordered list of candidates.
#[derive(Clone, Debug, Default)]
pub struct CandidateRoster {
    candidates: Vec<Candidate>,
}

impl CandidateRoster {
    /// The nine standard regressors, from linear regression to SVR.
    pub fn standard() -> Self {
        Self {
            candidates: STANDARD_CANDIDATES.to_vec(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn with_candidate(mut self, name: &'static str, factory: CandidateFactory) -> Self {
        self.candidates.push(Candidate { name, factory });
        self
    }

    /// Keeps only the named candidates, in roster order.
    ///
    /// # Errors
    /// [`SelectionError::UnknownCandidate`] for a name not in the roster.
    pub fn restrict<S: AsRef<str>>(&self, names: &[S]) -> Result<Self, SelectionError> {
        if let Some(unknown) = names
            .iter()
            .map(AsRef::as_ref)
            .find(|n| !self.candidates.iter().any(|c| c.name == *n))
        {
            return Err(SelectionError::UnknownCandidate(unknown.to_string()));
        }
        let candidates = self
            .candidates
            .iter()
            .filter(|c| names.iter().any(|n| n.as_ref() == c.name))
            .copied()
            .collect();
        Ok(Self { candidates })
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.candidates.iter().map(|c| c.name).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.iter()
    }

    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }
}
