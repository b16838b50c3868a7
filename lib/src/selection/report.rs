use crate::metrics::RegressionMetrics;
use serde::Serialize;
use std::fmt;

/// Held-out metrics of one candidate. `score` is the R² used for selection.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ModelScore {
    pub name: String,
    pub score: f64,
    pub rmse: f64,
    pub mae: f64,
}

/// Scores of every evaluated candidate, in roster order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct ModelReport {
    scores: Vec<ModelScore>,
}

impl ModelReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>, metrics: &RegressionMetrics) {
        self.scores.push(ModelScore {
            name: name.into(),
            score: metrics.r_squared,
            rmse: metrics.rmse,
            mae: metrics.mae,
        });
    }

    pub fn len(&self) -> usize {
        self.scores.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scores.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ModelScore> {
        self.scores.iter()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.scores.iter().find(|s| s.name == name).map(|s| s.score)
    }

    /// Highest score; the earliest entry wins a tie.
    pub fn best(&self) -> Option<&ModelScore> {
        self.scores.iter().fold(None, |best, current| match best {
            Some(b) if b.score >= current.score => Some(b),
            _ => Some(current),
        })
    }
}

impl fmt::Display for ModelReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{:<30} {:>10} {:>14} {:>14}", "model", "r2", "rmse", "mae")?;
        for entry in &self.scores {
            writeln!(
                f,
                "{:<30} {:>10.4} {:>14.2} {:>14.2}",
                entry.name, entry.score, entry.rmse, entry.mae
            )?;
        }
        Ok(())
    }
}
