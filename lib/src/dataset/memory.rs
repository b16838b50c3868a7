use crate::dataset::{Dataset, DatasetError};
use ndarray::{s, Array1, Array2};
use std::ops::Range;

/// A dataset held entirely in memory.
#[derive(Clone, Debug)]
pub struct InMemoryDataset {
    x: Array2<f64>,
    y: Array1<f64>,
}

impl InMemoryDataset {
    pub fn new(x: Array2<f64>, y: Array1<f64>) -> Result<Self, DatasetError> {
        if x.nrows() != y.len() {
            return Err(DatasetError::LengthMismatch {
                rows: x.nrows(),
                targets: y.len(),
            });
        }
        if x.nrows() == 0 {
            return Err(DatasetError::Empty);
        }
        Ok(Self { x, y })
    }

    pub fn n_features(&self) -> usize {
        self.x.ncols()
    }

    pub fn features(&self) -> &Array2<f64> {
        &self.x
    }

    pub fn targets(&self) -> &Array1<f64> {
        &self.y
    }
}

impl Dataset for InMemoryDataset {
    type Error = DatasetError;

    fn len(&self) -> Option<usize> {
        Some(self.x.nrows())
    }

    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error> {
        let len = self.x.nrows();
        if range.start > range.end || range.end > len {
            return Err(DatasetError::OutOfBounds {
                start: range.start,
                end: range.end,
                len,
            });
        }
        let batch_x = self.x.slice(s![range.clone(), ..]).to_owned();
        let batch_y = self.y.slice(s![range]).to_owned();
        Ok((batch_x, batch_y))
    }
}
