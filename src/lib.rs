//! # tabanom
//!
//! A tabular anomaly-scoring pipeline with strict separation between fitting
//! and inference phases.
//!
//! ## Core Design Principles
//!
//! - **Frozen statistics**: every fitted component carries the parameters it
//!   learned at fit time and never recomputes them from inference data, so
//!   train/test leakage is ruled out by construction.
//! - **Declarative preprocessing**: column groups map to transforms through
//!   an explicit [`ColumnTransformSpec`] instead of loosely-typed options.
//! - **Flat tree storage**: the ensemble stores each tree as a contiguous
//!   node array with index-based children, not a pointer hierarchy.
//! - **Numeric results only**: evaluation returns plain numbers (confusion
//!   counts, ROC points, scalar metrics); rendering lives outside the crate.
//!
//! ## Quick Start
//!
//! ```rust
//! use tabanom::{ColumnTransformSpec, ForestConfig, Pipeline, SmoteResampler, Table};
//!
//! let table = Table::new(
//!     vec!["temp", "pressure"],
//!     &[
//!         vec![0.1, 1.0],
//!         vec![0.2, 1.1],
//!         vec![0.3, 0.9],
//!         vec![0.15, 1.05],
//!         vec![9.0, 8.0],
//!         vec![9.5, 8.5],
//!     ],
//! ).unwrap();
//! let labels = vec![0, 0, 0, 0, 1, 1];
//!
//! let spec = ColumnTransformSpec::new()
//!     .min_max(["temp"])
//!     .standardize(["pressure"]);
//!
//! let fitted = Pipeline::new(spec)
//!     .with_forest_config(ForestConfig::new().with_n_trees(10))
//!     .with_resampler(SmoteResampler::new())
//!     .fit(&table, &labels)
//!     .unwrap();
//!
//! let scores = fitted.predict_score(&table).unwrap();
//! assert!(scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
//! ```
//!
//! ## Module Structure
//!
//! - `dataset` — fixed-schema numeric tables and label validation
//! - `preprocessing` — declarative column transforms with fit/transform split
//! - `resample` — synthetic minority oversampling for training folds
//! - `model` — class-weighted random forest over flat decision trees
//! - `pipeline` — preprocess/resample/classify composition and persistence
//! - `evaluation` — confusion/ROC/AUC metrics and stratified k-fold CV

pub mod dataset;
pub mod error;
pub mod evaluation;
pub mod matrix;
pub mod model;
pub mod pipeline;
pub mod preprocessing;
pub mod resample;

pub use dataset::Table;
pub use error::PipelineError;
pub use evaluation::{
    evaluate, ConfusionMatrix, CrossValidationResult, CrossValidator, EvaluationResult, Metric,
    RocPoint,
};
pub use matrix::Matrix;
pub use model::{ClassWeight, FittedRandomForest, ForestConfig, RandomForest};
pub use pipeline::{FittedPipeline, Pipeline};
pub use preprocessing::{ColumnTransformSpec, FittedPreprocessor, Preprocessor, TransformKind};
pub use resample::SmoteResampler;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::class_counts;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    /// 100 rows over columns X1..X5, 90 normal / 10 anomalous, with the
    /// anomalies offset in X1, X2 and X4 so the problem is learnable but
    /// not trivially separable in every column.
    fn create_sensor_dataset() -> (Table, Vec<u8>) {
        let mut rng = StdRng::seed_from_u64(17);
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for _ in 0..90 {
            rows.push(vec![
                rng.gen::<f64>() * 2.0,        // X1: small positive
                10.0 + rng.gen::<f64>(),       // X2
                rng.gen::<f64>(),              // X3
                rng.gen::<f64>() * 0.5,        // X4
                -0.5 + rng.gen::<f64>(),       // X5
            ]);
            labels.push(0);
        }
        for _ in 0..10 {
            rows.push(vec![
                6.0 + rng.gen::<f64>() * 2.0,  // X1 shifted
                13.0 + rng.gen::<f64>(),       // X2 shifted
                rng.gen::<f64>(),              // X3 uninformative
                2.0 + rng.gen::<f64>() * 0.5,  // X4 shifted
                -0.5 + rng.gen::<f64>(),       // X5 uninformative
            ]);
            labels.push(1);
        }
        let table = Table::new(vec!["X1", "X2", "X3", "X4", "X5"], &rows).unwrap();
        (table, labels)
    }

    fn sensor_spec() -> ColumnTransformSpec {
        ColumnTransformSpec::new()
            .log1p(["X1"])
            .min_max(["X3", "X4"])
            .standardize(["X2", "X5"])
    }

    fn sensor_forest() -> ForestConfig {
        ForestConfig::new().with_n_trees(30).with_max_depth(6)
    }

    #[test]
    fn test_end_to_end_resampling_balances_and_helps_recall() {
        let (table, labels) = create_sensor_dataset();

        // Resampler balances 90/10 to 90/90 (±1) in transformed space.
        let (_, x) = Preprocessor::new(sensor_spec())
            .fit_transform(&table)
            .unwrap();
        let (_, ry) = SmoteResampler::new().resample(&x, &labels).unwrap();
        let (c0, c1) = class_counts(&ry);
        assert_eq!(c0, 90);
        assert!((c1 as i64 - 90).abs() <= 1);

        // Recall on the anomaly class with resampling must not fall below
        // recall without it.
        let pipeline = Pipeline::new(sensor_spec()).with_forest_config(sensor_forest());
        let plain = pipeline.fit(&table, &labels).unwrap();
        let resampled = pipeline
            .clone()
            .with_resampler(SmoteResampler::new())
            .fit(&table, &labels)
            .unwrap();

        let recall_of = |fitted: &FittedPipeline| {
            let scores = fitted.predict_score(&table).unwrap();
            evaluate(&labels, None, &scores).unwrap().recall
        };
        assert!(recall_of(&resampled) >= recall_of(&plain));
    }

    #[test]
    fn test_end_to_end_missing_column_raises_schema_error() {
        let (table, labels) = create_sensor_dataset();
        let fitted = Pipeline::new(sensor_spec())
            .with_forest_config(sensor_forest())
            .fit(&table, &labels)
            .unwrap();

        // Same rows with X5 dropped.
        let rows: Vec<Vec<f64>> = (0..table.n_rows())
            .map(|i| table.row(i)[..4].to_vec())
            .collect();
        let partial = Table::new(vec!["X1", "X2", "X3", "X4"], &rows).unwrap();

        match fitted.predict(&partial) {
            Err(PipelineError::SchemaMismatch { missing, .. }) => {
                assert_eq!(missing, vec!["X5".to_string()]);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_end_to_end_serialized_pipeline_predicts_identically() {
        let (table, labels) = create_sensor_dataset();
        let fitted = Pipeline::new(sensor_spec())
            .with_forest_config(sensor_forest())
            .fit(&table, &labels)
            .unwrap();

        let restored = FittedPipeline::from_bytes(&fitted.to_bytes().unwrap()).unwrap();
        assert_eq!(
            restored.predict_score(&table).unwrap(),
            fitted.predict_score(&table).unwrap()
        );
    }

    #[test]
    fn test_end_to_end_cross_validation() {
        let (table, labels) = create_sensor_dataset();
        let pipeline = Pipeline::new(sensor_spec())
            .with_forest_config(sensor_forest())
            .with_resampler(SmoteResampler::new());

        let result = CrossValidator::new(5, Metric::F1Macro)
            .evaluate(&table, &labels, &pipeline)
            .unwrap();

        assert_eq!(result.fold_scores.len(), 5);
        assert!(result.fold_scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
        assert!(result.mean > 0.7, "mean f1-macro = {}", result.mean);
    }

    #[test]
    fn test_end_to_end_feature_importance_flags_shifted_columns() {
        let (table, labels) = create_sensor_dataset();
        let fitted = Pipeline::new(sensor_spec())
            .with_forest_config(sensor_forest())
            .fit(&table, &labels)
            .unwrap();

        let names = fitted.feature_names();
        let importance = fitted.feature_importance();
        assert_eq!(names.len(), importance.len());
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-9);

        // The shifted columns should collectively outweigh the noise columns.
        let weight_of = |col: &str| {
            let i = names.iter().position(|n| *n == col).unwrap();
            importance[i]
        };
        let informative = weight_of("X1") + weight_of("X2") + weight_of("X4");
        let noise = weight_of("X3") + weight_of("X5");
        assert!(informative > noise);
    }
}
