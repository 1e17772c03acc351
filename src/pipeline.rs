//! End-to-end anomaly-scoring pipeline.
//!
//! [`Pipeline::fit`] composes preprocessing, optional minority resampling
//! and forest training behind one call. The preprocessor is fit only on the
//! rows passed to `fit` and resampling happens after the transform, on
//! training data only, so no statistic ever leaks from data that is later
//! predicted on.

use crate::dataset::{validate_labels, Table};
use crate::error::PipelineError;
use crate::model::{FittedRandomForest, ForestConfig, ForestParams, RandomForest};
use crate::preprocessing::{
    ColumnTransformSpec, FittedPreprocessor, Preprocessor, PreprocessorParams,
};
use crate::resample::SmoteResampler;
use serde::{Deserialize, Serialize};
use std::io;
use std::path::Path;

/// Serializable parameters for a fitted pipeline.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PipelineParams {
    pub preprocessor: PreprocessorParams,
    pub forest: ForestParams,
}

/// Unfitted pipeline: column spec, forest hyperparameters and an optional
/// training-time resampling stage.
#[derive(Clone, Debug, Default)]
pub struct Pipeline {
    spec: ColumnTransformSpec,
    forest: ForestConfig,
    resampler: Option<SmoteResampler>,
}

impl Pipeline {
    pub fn new(spec: ColumnTransformSpec) -> Self {
        Self {
            spec,
            forest: ForestConfig::default(),
            resampler: None,
        }
    }

    pub fn with_forest_config(mut self, config: ForestConfig) -> Self {
        self.forest = config;
        self
    }

    /// Enable minority oversampling on the training matrix.
    pub fn with_resampler(mut self, resampler: SmoteResampler) -> Self {
        self.resampler = Some(resampler);
        self
    }

    /// Fit preprocessor and classifier on the training table.
    pub fn fit(&self, table: &Table, labels: &[u8]) -> Result<FittedPipeline, PipelineError> {
        validate_labels(labels, table.n_rows())?;

        let (preprocessor, x) = Preprocessor::new(self.spec.clone()).fit_transform(table)?;

        let (x, y) = match &self.resampler {
            Some(resampler) => resampler.resample(&x, labels)?,
            None => (x, labels.to_vec()),
        };

        let forest = RandomForest::new(self.forest.clone()).fit(&x, &y)?;

        Ok(FittedPipeline {
            preprocessor,
            forest,
        })
    }
}

/// Fitted pipeline ready for inference and persistence.
#[derive(Clone, Debug)]
pub struct FittedPipeline {
    preprocessor: FittedPreprocessor,
    forest: FittedRandomForest,
}

impl FittedPipeline {
    /// Hard class predictions (0 = normal, 1 = anomaly) for a table.
    pub fn predict(&self, table: &Table) -> Result<Vec<u8>, PipelineError> {
        let x = self.preprocessor.transform(table)?;
        self.forest.predict(&x)
    }

    /// Probability-of-anomaly scores in `[0, 1]` for a table.
    pub fn predict_score(&self, table: &Table) -> Result<Vec<f64>, PipelineError> {
        let x = self.preprocessor.transform(table)?;
        self.forest.predict_score(&x)
    }

    /// Feature importance aligned to [`feature_names`](Self::feature_names).
    pub fn feature_importance(&self) -> &[f64] {
        self.forest.feature_importance()
    }

    /// Preprocessor output column names, aligned to the importance vector.
    pub fn feature_names(&self) -> Vec<&str> {
        self.preprocessor.output_columns()
    }

    pub fn extract_params(&self) -> PipelineParams {
        PipelineParams {
            preprocessor: self.preprocessor.extract_params(),
            forest: self.forest.extract_params(),
        }
    }

    pub fn from_params(params: PipelineParams) -> Result<Self, PipelineError> {
        Ok(Self {
            preprocessor: FittedPreprocessor::from_params(params.preprocessor),
            forest: FittedRandomForest::from_params(params.forest)?,
        })
    }

    /// Serialize learned state to an opaque byte blob.
    pub fn to_bytes(&self) -> Result<Vec<u8>, PipelineError> {
        Ok(bincode::serialize(&self.extract_params())?)
    }

    /// Reconstruct a pipeline from [`to_bytes`](Self::to_bytes) output.
    /// The round-trip predicts identically to the original.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, PipelineError> {
        let params: PipelineParams = bincode::deserialize(bytes)?;
        Self::from_params(params)
    }

    /// Save the fitted pipeline to a file.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let bytes = self.to_bytes().map_err(io::Error::other)?;
        std::fs::write(path, bytes)
    }

    /// Load a fitted pipeline from a file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, PipelineError> {
        let bytes = std::fs::read(path)?;
        Self::from_bytes(&bytes)
    }
}
