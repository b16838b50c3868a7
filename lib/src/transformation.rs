//! Turns the raw train/test sales tables into model-ready arrays.
//!
//! The feature transformer is fitted on the training table only and applied
//! to both. Each output array holds the transformed features followed by the
//! untouched `price` target as its last column.

use crate::dataset::schema::TARGET_COLUMN;
use crate::dataset::table::{FeatureTable, TableError};
use crate::preprocessing::{build_transformer, PreprocessingError, TransformerConfig};
use ndarray::{s, Array2, ArrayView1};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

#[derive(Error, Debug)]
pub enum TransformationError {
    #[error("failed to read {which} table")]
    Table {
        which: &'static str,
        #[source]
        source: TableError,
    },
    #[error(transparent)]
    Preprocessing(#[from] PreprocessingError),
}

#[derive(Clone, Debug, PartialEq)]
pub struct DataTransformationConfig {
    /// Where the fitted transformer is written.
    pub preprocessor_path: PathBuf,
    pub transformer: TransformerConfig,
}

impl Default for DataTransformationConfig {
    fn default() -> Self {
        Self {
            preprocessor_path: PathBuf::from("artifact").join("preprocessor.bin"),
            transformer: TransformerConfig::default(),
        }
    }
}

/// Transformed arrays, target in the last column.
#[derive(Clone, Debug)]
pub struct TransformedData {
    pub train: Array2<f64>,
    pub test: Array2<f64>,
    pub preprocessor_path: PathBuf,
}

#[derive(Clone, Debug, Default)]
pub struct DataTransformation {
    config: DataTransformationConfig,
}

impl DataTransformation {
    pub fn new(config: DataTransformationConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DataTransformationConfig {
        &self.config
    }

    /// Reads both CSV files and runs [`transform_tables`](Self::transform_tables).
    pub fn initiate_data_transformation<P, Q>(
        &self,
        train_path: P,
        test_path: Q,
    ) -> Result<TransformedData, TransformationError>
    where
        P: AsRef<Path>,
        Q: AsRef<Path>,
    {
        let train = FeatureTable::from_csv_path(train_path.as_ref())
            .map_err(|source| TransformationError::Table { which: "train", source })?;
        let test = FeatureTable::from_csv_path(test_path.as_ref())
            .map_err(|source| TransformationError::Table { which: "test", source })?;
        info!(
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            "read train and test data"
        );

        Ok(self.transform_tables(&train, &test)?)
    }

    /// Fits the transformer on `train`, transforms both tables, appends the
    /// target column and persists the fitted transformer.
    ///
    /// # Errors
    /// - [`ConfigurationError::MissingColumn`] if either table lacks `price`
    ///   or a feature column
    /// - [`PreprocessingError::MissingValues`] if a target value is missing
    /// - [`PreprocessingError::Persistence`] if the transformer cannot be written
    ///
    /// [`ConfigurationError::MissingColumn`]: crate::preprocessing::ConfigurationError::MissingColumn
    pub fn transform_tables(
        &self,
        train: &FeatureTable,
        test: &FeatureTable,
    ) -> Result<TransformedData, PreprocessingError> {
        let train_target = target_column(train, "train")?;
        let test_target = target_column(test, "test")?;

        let mut transformer = build_transformer(&self.config.transformer)?;
        info!("applying preprocessing to train and test data");
        let train_features = transformer.fit_transform(train)?;
        let test_features = transformer.apply(test)?;

        transformer.persist(&self.config.preprocessor_path)?;
        info!(
            path = %self.config.preprocessor_path.display(),
            "saved preprocessing object"
        );

        Ok(TransformedData {
            train: with_target(&train_features, train_target),
            test: with_target(&test_features, test_target),
            preprocessor_path: self.config.preprocessor_path.clone(),
        })
    }
}

fn target_column<'a>(table: &'a FeatureTable, which: &str) -> Result<&'a [f64], PreprocessingError> {
    let target = table.column(TARGET_COLUMN)?;
    if let Some(row) = target.iter().position(|v| v.is_nan()) {
        return Err(PreprocessingError::MissingValues(format!(
            "target column '{TARGET_COLUMN}' is missing a value at row {row} of the {which} table"
        )));
    }
    Ok(target)
}

fn with_target(features: &Array2<f64>, target: &[f64]) -> Array2<f64> {
    let n_features = features.ncols();
    let mut out = Array2::zeros((features.nrows(), n_features + 1));
    out.slice_mut(s![.., ..n_features]).assign(features);
    out.column_mut(n_features).assign(&ArrayView1::from(target));
    out
}
