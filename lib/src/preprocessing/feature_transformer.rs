//! Named-column numeric transformer.
//!
//! [`FeatureTransformer`] resolves a fixed list of feature names against a
//! [`FeatureTable`], imputes missing values and standardizes the result. Its
//! output always has one column per feature, in feature-list order, whatever
//! the column order of the incoming table. Columns outside the feature list
//! are ignored.
//!
//! # Example
//! ```ignore
//! use house_price_ml::preprocessing::{build_transformer, TransformerConfig};
//!
//! let mut transformer = build_transformer(&TransformerConfig::default())?;
//! let train = transformer.fit_transform(&train_table)?;
//! let test = transformer.apply(&test_table)?;
//! transformer.persist("artifact/preprocessor.bin")?;
//! ```

use crate::dataset::schema::HOUSE_FEATURES;
use crate::dataset::table::FeatureTable;
use crate::preprocessing::error::{ConfigurationError, PreprocessingError};
use crate::preprocessing::imputation::{ImputeStrategy, SimpleImputer};
use crate::preprocessing::pipeline::{FittedPipeline, Pipeline, PipelineParams};
use crate::preprocessing::scaling::{StandardScaler, StandardScalerConfig};
use crate::preprocessing::traits::{FittedTransformer, Transformer};
use crate::serialization::{read_artifact, write_artifact, ArtifactKind};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use tracing::{info, warn};

/// How the numeric features are preprocessed.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Imputation strategy for missing values.
    pub strategy: ImputeStrategy,
    /// Standard scaling options.
    pub scaler: StandardScalerConfig,
}

/// Persisted form of a fitted [`FeatureTransformer`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FeatureTransformerParams {
    pub features: Vec<String>,
    pub config: TransformerConfig,
    pub pipeline: PipelineParams,
}

/// Builds the unfitted transformer over the house-sales feature columns:
/// imputation with the configured strategy followed by standard scaling.
pub fn build_transformer(config: &TransformerConfig) -> Result<FeatureTransformer, PreprocessingError> {
    FeatureTransformer::new(HOUSE_FEATURES, config.clone())
}

/// Imputes and standardizes a fixed list of named numeric columns.
#[derive(Clone, Debug)]
pub struct FeatureTransformer {
    features: Vec<String>,
    config: TransformerConfig,
    fitted: Option<FittedPipeline>,
}

impl FeatureTransformer {
    /// Creates an unfitted transformer over `features`.
    ///
    /// # Errors
    /// [`ConfigurationError::NoFeatures`] for an empty list and
    /// [`ConfigurationError::DuplicateFeature`] for a repeated name.
    pub fn new<I, S>(features: I, config: TransformerConfig) -> Result<Self, PreprocessingError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let features: Vec<String> = features.into_iter().map(Into::into).collect();
        validate_features(&features)?;
        Ok(Self {
            features,
            config,
            fitted: None,
        })
    }

    /// Feature names, in output column order.
    pub fn features(&self) -> &[String] {
        &self.features
    }

    pub fn config(&self) -> &TransformerConfig {
        &self.config
    }

    pub fn is_fitted(&self) -> bool {
        self.fitted.is_some()
    }

    fn pipeline(&self) -> Pipeline {
        Pipeline::new()
            .add_simple_imputer(SimpleImputer::new(self.config.strategy.clone()))
            .add_standard_scaler(StandardScaler::from_config(self.config.scaler.clone()))
    }

    fn fitted_pipeline(&self) -> Result<&FittedPipeline, PreprocessingError> {
        self.fitted.as_ref().ok_or(PreprocessingError::NotFitted)
    }

    /// Learns imputation and scaling statistics from `table`.
    ///
    /// Only `table` contributes to the statistics. Calling `fit` on an
    /// already fitted transformer replaces the previous parameters.
    ///
    /// # Errors
    /// A [`ConfigurationError`] when a feature column is missing or not
    /// numeric, [`PreprocessingError::EmptyData`] when the table has no rows.
    pub fn fit(&mut self, table: &FeatureTable) -> Result<(), PreprocessingError> {
        let data = table.select(&self.features)?;
        if data.nrows() == 0 {
            return Err(PreprocessingError::EmptyData(
                "cannot fit the feature transformer on a table with no rows".to_string(),
            ));
        }

        let fitted = self.pipeline().fit(&data)?;
        if self.fitted.replace(fitted).is_some() {
            warn!("refitting feature transformer, previous parameters discarded");
        }
        info!(
            rows = data.nrows(),
            features = self.features.len(),
            "fitted feature transformer"
        );
        Ok(())
    }

    /// Fits on `table` and returns its transformed features.
    pub fn fit_transform(&mut self, table: &FeatureTable) -> Result<Array2<f64>, PreprocessingError> {
        self.fit(table)?;
        self.apply(table)
    }

    /// Transforms `table` with the fitted parameters.
    ///
    /// Returns one row per table row and one column per feature, in
    /// feature-list order. Never modifies the transformer.
    ///
    /// # Errors
    /// [`PreprocessingError::NotFitted`] before `fit`, or a
    /// [`ConfigurationError`] when a feature column cannot be resolved.
    pub fn apply(&self, table: &FeatureTable) -> Result<Array2<f64>, PreprocessingError> {
        let fitted = self.fitted_pipeline()?;
        let data = table.select(&self.features)?;
        fitted.transform(&data)
    }

    /// Transforms a matrix whose columns are already in feature-list order.
    pub fn apply_matrix(&self, data: &Array2<f64>) -> Result<Array2<f64>, PreprocessingError> {
        self.fitted_pipeline()?.transform(data)
    }

    fn extract_params(&self) -> Result<FeatureTransformerParams, PreprocessingError> {
        Ok(FeatureTransformerParams {
            features: self.features.clone(),
            config: self.config.clone(),
            pipeline: self.fitted_pipeline()?.extract_params(),
        })
    }

    fn from_params(params: FeatureTransformerParams) -> Result<Self, PreprocessingError> {
        validate_features(&params.features)?;
        let pipeline = FittedPipeline::from_params(params.pipeline)?;
        if pipeline.n_features_in() != params.features.len() {
            return Err(PreprocessingError::FeatureMismatch {
                expected_features: params.features.len(),
                got_features: pipeline.n_features_in(),
            });
        }
        Ok(Self {
            features: params.features,
            config: params.config,
            fitted: Some(pipeline),
        })
    }

    /// Writes the fitted transformer to `path`, creating parent directories.
    pub fn persist<P: AsRef<Path>>(&self, path: P) -> Result<(), PreprocessingError> {
        let params = self.extract_params()?;
        write_artifact(path.as_ref(), ArtifactKind::FeatureTransformer, &params)?;
        info!(path = %path.as_ref().display(), "saved feature transformer");
        Ok(())
    }

    /// Loads a transformer written by [`FeatureTransformer::persist`].
    ///
    /// The loaded transformer produces output identical to the one persisted.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PreprocessingError> {
        let params = read_artifact(path, ArtifactKind::FeatureTransformer)?;
        Self::from_params(params)
    }
}

fn validate_features(features: &[String]) -> Result<(), ConfigurationError> {
    if features.is_empty() {
        return Err(ConfigurationError::NoFeatures);
    }
    let mut seen = HashSet::with_capacity(features.len());
    for feature in features {
        if !seen.insert(feature.as_str()) {
            return Err(ConfigurationError::DuplicateFeature(feature.clone()));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::{array, Axis};

    fn two_feature_transformer() -> FeatureTransformer {
        FeatureTransformer::new(["sqft_living", "bedrooms"], TransformerConfig::default()).unwrap()
    }

    fn train_table() -> FeatureTable {
        FeatureTable::from_columns(vec![
            ("bedrooms", vec![2.0, 3.0, f64::NAN, 5.0]),
            ("price", vec![100.0, 200.0, 300.0, 400.0]),
            ("sqft_living", vec![1000.0, 1500.0, 2000.0, 3500.0]),
        ])
        .unwrap()
    }

    #[test]
    fn test_build_transformer_uses_house_features() {
        let transformer = build_transformer(&TransformerConfig::default()).unwrap();
        assert_eq!(transformer.features().len(), 20);
        assert_eq!(transformer.features()[0], "bedrooms");
        assert_eq!(transformer.features()[19], "house_age");
        assert!(!transformer.is_fitted());
    }

    #[test]
    fn test_duplicate_or_empty_features_rejected() {
        let dup = FeatureTransformer::new(["lat", "lat"], TransformerConfig::default());
        assert!(matches!(
            dup,
            Err(PreprocessingError::Configuration(ConfigurationError::DuplicateFeature(_)))
        ));

        let empty = FeatureTransformer::new(Vec::<String>::new(), TransformerConfig::default());
        assert!(matches!(
            empty,
            Err(PreprocessingError::Configuration(ConfigurationError::NoFeatures))
        ));
    }

    #[test]
    fn test_apply_before_fit_is_not_fitted() {
        let transformer = two_feature_transformer();
        assert!(matches!(
            transformer.apply(&train_table()),
            Err(PreprocessingError::NotFitted)
        ));
        assert!(matches!(
            transformer.persist(std::env::temp_dir().join("house_price_ml_unfitted.bin")),
            Err(PreprocessingError::NotFitted)
        ));
    }

    #[test]
    fn test_output_follows_feature_order_and_is_standardized() {
        let mut transformer = two_feature_transformer();
        let out = transformer.fit_transform(&train_table()).unwrap();

        assert_eq!(out.dim(), (4, 2));
        // Column 0 is sqft_living, increasing down the rows.
        assert!(out[[0, 0]] < out[[3, 0]]);
        for column in out.axis_iter(Axis(1)) {
            let mean = column.mean().unwrap();
            let var = column.mapv(|v| (v - mean).powi(2)).mean().unwrap();
            assert!(mean.abs() < 1e-9);
            assert!((var - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_missing_value_gets_training_median() {
        let mut transformer = two_feature_transformer();
        transformer.fit(&train_table()).unwrap();

        // Median of bedrooms [2, 3, 5] is 3; a missing value maps to the same output as 3.
        let probe = FeatureTable::from_columns(vec![
            ("sqft_living", vec![1500.0, 1500.0]),
            ("bedrooms", vec![f64::NAN, 3.0]),
        ])
        .unwrap();
        let out = transformer.apply(&probe).unwrap();
        assert_eq!(out[[0, 1]], out[[1, 1]]);
    }

    #[test]
    fn test_statistics_come_from_training_table_only() {
        let mut transformer = two_feature_transformer();
        transformer.fit(&train_table()).unwrap();

        let test = FeatureTable::from_columns(vec![
            ("sqft_living", vec![1000.0, 1000.0]),
            ("bedrooms", vec![f64::NAN, 100.0]),
        ])
        .unwrap();
        let out = transformer.apply(&test).unwrap();

        let train_out = transformer.apply(&train_table()).unwrap();
        // sqft_living 1000 maps to the same value as the first training row.
        assert_eq!(out[[0, 0]], train_out[[0, 0]]);
        // Missing bedrooms imputed with the training median (3), not the test median.
        assert_eq!(out[[0, 1]], train_out[[1, 1]]);
    }

    #[test]
    fn test_apply_is_idempotent() {
        let mut transformer = two_feature_transformer();
        transformer.fit(&train_table()).unwrap();
        let first = transformer.apply(&train_table()).unwrap();
        let second = transformer.apply(&train_table()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_refit_overwrites_parameters() {
        let mut transformer = two_feature_transformer();
        transformer.fit(&train_table()).unwrap();
        let before = transformer.apply(&train_table()).unwrap();

        let other = FeatureTable::from_columns(vec![
            ("sqft_living", vec![10.0, 20.0]),
            ("bedrooms", vec![1.0, 1.0]),
        ])
        .unwrap();
        transformer.fit(&other).unwrap();
        let after = transformer.apply(&train_table()).unwrap();
        assert_ne!(before, after);
    }

    #[test]
    fn test_missing_column_is_configuration_error() {
        let mut transformer =
            FeatureTransformer::new(["sqft_living", "grade"], TransformerConfig::default())
                .unwrap();
        let err = transformer.fit(&train_table()).unwrap_err();
        assert!(matches!(
            err,
            PreprocessingError::Configuration(ConfigurationError::MissingColumn { ref column })
                if column == "grade"
        ));
    }

    #[test]
    fn test_fit_on_empty_table() {
        let empty = FeatureTable::from_columns(vec![
            ("sqft_living", Vec::new()),
            ("bedrooms", Vec::new()),
        ])
        .unwrap();
        let err = two_feature_transformer().fit(&empty).unwrap_err();
        assert!(matches!(err, PreprocessingError::EmptyData(_)));
    }

    #[test]
    fn test_persist_and_load_give_identical_output() {
        let mut transformer = two_feature_transformer();
        transformer.fit(&train_table()).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("artifact").join("preprocessor.bin");
        transformer.persist(&path).unwrap();
        let loaded = FeatureTransformer::load(&path).unwrap();

        assert_eq!(loaded.features(), transformer.features());
        assert_eq!(
            loaded.apply(&train_table()).unwrap(),
            transformer.apply(&train_table()).unwrap()
        );
    }

    #[test]
    fn test_apply_matrix_checks_width() {
        let mut transformer = two_feature_transformer();
        transformer.fit(&train_table()).unwrap();

        assert!(transformer.apply_matrix(&array![[1500.0, 3.0]]).is_ok());
        assert!(matches!(
            transformer.apply_matrix(&array![[1500.0]]),
            Err(PreprocessingError::FeatureMismatch { .. })
        ));
    }
}
