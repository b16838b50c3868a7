//! k-nearest-neighbors regression with uniform weights and Euclidean distance.

use crate::model::{check_n_features, validate_training_data, Estimator, InferenceModel, ModelError};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct KNeighborsRegressor {
    pub n_neighbors: usize,
}

impl Default for KNeighborsRegressor {
    fn default() -> Self {
        Self { n_neighbors: 5 }
    }
}

impl KNeighborsRegressor {
    pub fn new(n_neighbors: usize) -> Self {
        Self { n_neighbors }
    }
}

/// Stores the training set; prediction is the mean target of the `k` closest
/// rows. Distance ties are broken by training-row order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FittedKNeighbors {
    n_neighbors: usize,
    x: Array2<f64>,
    y: Array1<f64>,
}

impl FittedKNeighbors {
    /// Neighbors actually used: `min(k, n_train)`.
    pub fn effective_neighbors(&self) -> usize {
        self.n_neighbors.min(self.y.len())
    }

    fn predict_row(&self, row: ArrayView1<f64>) -> f64 {
        let mut distances: Vec<(f64, usize)> = self
            .x
            .rows()
            .into_iter()
            .enumerate()
            .map(|(idx, train_row)| {
                let d: f64 = train_row
                    .iter()
                    .zip(row.iter())
                    .map(|(a, b)| (a - b).powi(2))
                    .sum();
                (d, idx)
            })
            .collect();

        let k = self.effective_neighbors();
        let by_distance = |a: &(f64, usize), b: &(f64, usize)| {
            a.0.partial_cmp(&b.0)
                .unwrap_or(Ordering::Equal)
                .then(a.1.cmp(&b.1))
        };
        if k < distances.len() {
            distances.select_nth_unstable_by(k - 1, by_distance);
        }

        distances[..k].iter().map(|&(_, idx)| self.y[idx]).sum::<f64>() / k as f64
    }
}

impl Estimator for KNeighborsRegressor {
    type Fitted = FittedKNeighbors;

    fn fit(&self, x: &Array2<f64>, y: &Array1<f64>) -> Result<FittedKNeighbors, ModelError> {
        if self.n_neighbors == 0 {
            return Err(ModelError::InvalidParameter(
                "n_neighbors must be at least 1".into(),
            ));
        }
        validate_training_data(x, y)?;
        Ok(FittedKNeighbors {
            n_neighbors: self.n_neighbors,
            x: x.clone(),
            y: y.clone(),
        })
    }
}

impl InferenceModel for FittedKNeighbors {
    fn n_features(&self) -> usize {
        self.x.ncols()
    }

    fn predict_batch(&self, input: &Array2<f64>) -> Result<Array1<f64>, ModelError> {
        check_n_features(input, self.n_features())?;
        Ok(input.rows().into_iter().map(|row| self.predict_row(row)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_predicts_mean_of_nearest() {
        let x = array![[0.0], [1.0], [2.0], [10.0], [11.0]];
        let y = array![1.0, 2.0, 3.0, 100.0, 200.0];
        let fitted = KNeighborsRegressor::new(2).fit(&x, &y).unwrap();

        let preds = fitted.predict_batch(&array![[0.4], [10.6]]).unwrap();
        assert!((preds[0] - 1.5).abs() < 1e-12);
        assert!((preds[1] - 150.0).abs() < 1e-12);
    }

    #[test]
    fn test_k_larger_than_training_set_uses_all_rows() {
        let x = array![[0.0], [1.0], [2.0], [3.0]];
        let y = array![1.0, 2.0, 3.0, 6.0];
        let fitted = KNeighborsRegressor::default().fit(&x, &y).unwrap();

        assert_eq!(fitted.effective_neighbors(), 4);
        assert_eq!(fitted.predict(array![100.0].view()).unwrap(), 3.0);
    }

    #[test]
    fn test_distance_ties_prefer_earlier_rows() {
        // both training rows are at distance 1 from the query
        let x = array![[-1.0], [1.0]];
        let y = array![10.0, 20.0];
        let fitted = KNeighborsRegressor::new(1).fit(&x, &y).unwrap();

        assert_eq!(fitted.predict(array![0.0].view()).unwrap(), 10.0);
    }

    #[test]
    fn test_zero_neighbors_is_invalid() {
        let err = KNeighborsRegressor::new(0)
            .fit(&array![[1.0]], &array![1.0])
            .unwrap_err();
        assert!(matches!(err, ModelError::InvalidParameter(_)));
    }

    #[test]
    fn test_feature_mismatch() {
        let fitted = KNeighborsRegressor::new(1)
            .fit(&array![[1.0, 2.0]], &array![1.0])
            .unwrap();
        assert!(matches!(
            fitted.predict_batch(&array![[1.0]]),
            Err(ModelError::FeatureMismatch { expected: 2, got: 1 })
        ));
    }
}
