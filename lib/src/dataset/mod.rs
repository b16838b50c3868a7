//! Dataset abstractions.
//!
//! - [`Dataset`]: uniform `(X, y)` access with a [`DatasetBatchIter`] for
//!   mini-batch gradient descent.
//! - [`InMemoryDataset`]: a dataset over owned `ndarray` arrays.
//! - [`FeatureTable`]: a CSV table addressed by column name.
//! - [`schema`]: the house-sales feature list and single-house input record.
//!
//! # Example
//!
//! ```rust
//! use house_price_ml::dataset::{Dataset, InMemoryDataset};
//! use ndarray::array;
//!
//! let dataset = InMemoryDataset::new(array![[1.0], [2.0]], array![0.0, 1.0]).unwrap();
//!
//! for batch in dataset.batches(1) {
//!     let (x_batch, y_batch) = batch.unwrap();
//!     assert_eq!(x_batch.nrows(), y_batch.len());
//! }
//! ```

use ndarray::{Array1, Array2};
use std::fmt::Debug;
use std::ops::Range;
use thiserror::Error;

pub mod memory;
pub mod schema;
pub mod table;

pub use self::memory::InMemoryDataset;
pub use self::schema::{HouseFeatures, HOUSE_FEATURES, TARGET_COLUMN};
pub use self::table::{FeatureTable, TableError};

/// Errors raised while building or slicing a dataset.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DatasetError {
    #[error("dataset is empty")]
    Empty,
    #[error("{rows} feature rows but {targets} targets")]
    LengthMismatch { rows: usize, targets: usize },
    #[error("batch range {start}..{end} is out of bounds for {len} samples")]
    OutOfBounds { start: usize, end: usize, len: usize },
}

/// Abstract interface for a machine learning dataset.
///
/// Defines a contract for loading data in `(X, y)` format where:
/// - `X`: feature matrix with shape `(n_samples, n_features)`
/// - `y`: target vector with shape `(n_samples,)`
pub trait Dataset {
    /// Error type returned when accessing data.
    type Error: Debug + 'static;

    /// Returns the total number of samples in the dataset, if known.
    ///
    /// `None` means the size is unknown (e.g. streaming data).
    fn len(&self) -> Option<usize>;

    /// Checks whether the dataset is empty.
    fn is_empty(&self) -> bool {
        self.len() == Some(0)
    }

    /// Creates an iterator over fixed-size batches.
    ///
    /// The last batch may be smaller than `batch_size`.
    fn batches(&self, batch_size: usize) -> DatasetBatchIter<'_, Self>
    where
        Self: Sized,
    {
        DatasetBatchIter {
            dataset: self,
            batch_size: batch_size.max(1),
            current: 0,
        }
    }

    /// Loads a subset of data for the given index range `[start, end)`.
    fn get_batch(&self, range: Range<usize>) -> Result<(Array2<f64>, Array1<f64>), Self::Error>;
}

/// Iterator over dataset batches, created by [`Dataset::batches`].
pub struct DatasetBatchIter<'a, D: ?Sized> {
    dataset: &'a D,
    batch_size: usize,
    current: usize,
}

impl<D: Dataset> Iterator for DatasetBatchIter<'_, D> {
    type Item = Result<(Array2<f64>, Array1<f64>), D::Error>;

    fn next(&mut self) -> Option<Self::Item> {
        let total = self.dataset.len()?;
        if self.current >= total {
            return None;
        }

        let end = (self.current + self.batch_size).min(total);
        let range = self.current..end;
        self.current = end;

        Some(self.dataset.get_batch(range))
    }
}
