//! Simple Imputer.
//!
//! Imputation transformer for completing missing values.
//! Supports mean, median, most_frequent, and constant strategies.
//!
//! Note: This implementation treats NaN as missing values.
//!
//! # Example
//! ```ignore
//! use house_price_ml::preprocessing::{Transformer, FittedTransformer, SimpleImputer, ImputeStrategy};
//!
//! let imputer = SimpleImputer::new(ImputeStrategy::Median);
//! let fitted = imputer.fit(&data)?;
//! let imputed = fitted.transform(&data)?;
//! ```

use crate::preprocessing::error::PreprocessingError;
use crate::preprocessing::traits::{check_n_features, FittedTransformer, Transformer};
use ndarray::{Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use tracing::warn;

/// Strategy for imputing missing values.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImputeStrategy {
    /// Replace missing values with the mean of each column.
    Mean,
    /// Replace missing values with the median of each column.
    #[default]
    Median,
    /// Replace missing values with the most frequent value of each column.
    /// Ties resolve to the smallest value.
    MostFrequent,
    /// Replace missing values with a constant value.
    Constant(f64),
}

/// Serializable parameters for a fitted SimpleImputer.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SimpleImputerParams {
    /// Strategy used for imputation.
    pub strategy: ImputeStrategy,
    /// Statistics (fill values) for each feature.
    pub statistics: Vec<f64>,
    /// Number of features seen during fit.
    pub n_features: usize,
}

/// SimpleImputer transformer (unfitted).
#[derive(Clone, Debug, Default)]
pub struct SimpleImputer {
    strategy: ImputeStrategy,
}

impl SimpleImputer {
    /// Create a new SimpleImputer with the specified strategy.
    pub fn new(strategy: ImputeStrategy) -> Self {
        Self { strategy }
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }
}

fn sort_values(values: &mut [f64]) {
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));
}

/// Compute the fill value for one column, ignoring NaN values.
///
/// Returns `None` when every value in the column is missing.
fn column_statistic(column: ArrayView1<f64>, strategy: &ImputeStrategy) -> Option<f64> {
    if let ImputeStrategy::Constant(value) = strategy {
        return Some(*value);
    }

    let mut present: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
    if present.is_empty() {
        return None;
    }

    let stat = match strategy {
        ImputeStrategy::Mean => present.iter().sum::<f64>() / present.len() as f64,
        ImputeStrategy::Median => {
            sort_values(&mut present);
            let n = present.len();
            if n % 2 == 0 {
                (present[n / 2 - 1] + present[n / 2]) / 2.0
            } else {
                present[n / 2]
            }
        }
        ImputeStrategy::MostFrequent => {
            sort_values(&mut present);
            let mut best = present[0];
            let mut best_count = 0;
            let mut start = 0;
            while start < present.len() {
                let value = present[start];
                let end = start + present[start..].iter().take_while(|&&v| v == value).count();
                if end - start > best_count {
                    best = value;
                    best_count = end - start;
                }
                start = end;
            }
            best
        }
        ImputeStrategy::Constant(value) => *value,
    };
    Some(stat)
}

impl Transformer for SimpleImputer {
    type Params = SimpleImputerParams;
    type Fitted = FittedSimpleImputer;

    fn fit(&self, data: &Array2<f64>) -> Result<Self::Fitted, PreprocessingError> {
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "cannot fit SimpleImputer on empty data".to_string(),
            ));
        }

        let statistics = data
            .axis_iter(Axis(1))
            .enumerate()
            .map(|(col, column)| {
                column_statistic(column, &self.strategy).unwrap_or_else(|| {
                    warn!(column = col, "every value is missing, imputing 0.0");
                    0.0
                })
            })
            .collect();

        Ok(FittedSimpleImputer {
            strategy: self.strategy.clone(),
            statistics,
            n_features: data.ncols(),
        })
    }
}

/// Fitted SimpleImputer ready for inference.
#[derive(Clone, Debug)]
pub struct FittedSimpleImputer {
    strategy: ImputeStrategy,
    statistics: Vec<f64>,
    n_features: usize,
}

impl FittedSimpleImputer {
    /// Get the imputation statistics (fill values) for each feature.
    pub fn statistics(&self) -> &[f64] {
        &self.statistics
    }

    pub fn strategy(&self) -> &ImputeStrategy {
        &self.strategy
    }
}

impl FittedTransformer for FittedSimpleImputer {
    type Params = SimpleImputerParams;

    fn transform(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        check_n_features(data, self.n_features)?;

        let mut result = data.clone();
        for (mut column, &fill) in result.axis_iter_mut(Axis(1)).zip(&self.statistics) {
            column.mapv_inplace(|v| if v.is_nan() { fill } else { v });
        }
        Ok(result)
    }

    fn extract_params(&self) -> Self::Params {
        SimpleImputerParams {
            strategy: self.strategy.clone(),
            statistics: self.statistics.clone(),
            n_features: self.n_features,
        }
    }

    fn from_params(params: Self::Params) -> Result<Self, PreprocessingError> {
        if params.statistics.len() != params.n_features {
            return Err(PreprocessingError::InvalidParameter(format!(
                "imputer has {} statistics for {} features",
                params.statistics.len(),
                params.n_features
            )));
        }
        Ok(Self {
            strategy: params.strategy,
            statistics: params.statistics,
            n_features: params.n_features,
        })
    }

    fn n_features_in(&self) -> usize {
        self.n_features
    }
}
