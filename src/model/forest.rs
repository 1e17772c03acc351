//! Random forest classifier over preprocessed feature matrices.
//!
//! An ensemble of randomized decision trees grown on bootstrap samples with
//! a random feature subset per split. Class weighting counters imbalance by
//! making minority-class errors cost more in the split objective.

use crate::dataset::{class_counts, validate_labels};
use crate::error::PipelineError;
use crate::matrix::Matrix;
use crate::model::tree::{grow_tree, GrowLimits, Tree};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

/// Class-weighting mode for the training objective.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClassWeight {
    /// Every sample counts the same.
    Uniform,
    /// Per-class weight `n / (2 * class_count)`, inverse to class frequency.
    Balanced,
}

/// Random forest hyperparameters.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ForestConfig {
    /// Number of trees in the ensemble.
    pub n_trees: usize,
    /// Maximum tree depth.
    pub max_depth: usize,
    /// Minimum samples required to attempt a split.
    pub min_samples_split: usize,
    /// Features considered per split; `None` means `sqrt(n_features)`.
    pub max_features: Option<usize>,
    /// Class-weighting mode.
    pub class_weight: ClassWeight,
    /// Random seed for bootstrap and feature sampling.
    pub seed: u64,
}

impl Default for ForestConfig {
    fn default() -> Self {
        Self {
            n_trees: 100,
            max_depth: 8,
            min_samples_split: 2,
            max_features: None,
            class_weight: ClassWeight::Balanced,
            seed: 42,
        }
    }
}

impl ForestConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_n_trees(mut self, n_trees: usize) -> Self {
        self.n_trees = n_trees;
        self
    }

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_min_samples_split(mut self, min_samples_split: usize) -> Self {
        self.min_samples_split = min_samples_split;
        self
    }

    pub fn with_max_features(mut self, max_features: usize) -> Self {
        self.max_features = Some(max_features);
        self
    }

    pub fn with_class_weight(mut self, class_weight: ClassWeight) -> Self {
        self.class_weight = class_weight;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn validate(&self, n_features: usize) -> Result<usize, PipelineError> {
        if self.n_trees == 0 {
            return Err(PipelineError::InvalidConfig(
                "n_trees must be at least 1".to_string(),
            ));
        }
        if self.max_depth == 0 {
            return Err(PipelineError::InvalidConfig(
                "max_depth must be at least 1".to_string(),
            ));
        }
        if self.min_samples_split < 2 {
            return Err(PipelineError::InvalidConfig(
                "min_samples_split must be at least 2".to_string(),
            ));
        }
        let max_features = match self.max_features {
            Some(m) => {
                if m == 0 || m > n_features {
                    return Err(PipelineError::InvalidConfig(format!(
                        "max_features must be in 1..={}, got {}",
                        n_features, m
                    )));
                }
                m
            }
            None => ((n_features as f64).sqrt().round() as usize).clamp(1, n_features),
        };
        Ok(max_features)
    }
}

/// Unfitted random forest holding hyperparameters.
#[derive(Clone, Debug, Default)]
pub struct RandomForest {
    config: ForestConfig,
}

impl RandomForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    /// Train an ensemble on a feature matrix and binary labels.
    pub fn fit(&self, x: &Matrix, y: &[u8]) -> Result<FittedRandomForest, PipelineError> {
        let (n_rows, n_features) = x.shape();
        if n_rows == 0 || n_features == 0 {
            return Err(PipelineError::EmptyData(
                "Cannot fit a forest on an empty matrix".to_string(),
            ));
        }
        validate_labels(y, n_rows)?;
        let max_features = self.config.validate(n_features)?;

        let (count0, count1) = class_counts(y);
        if count0 == 0 || count1 == 0 {
            let (class, count) = if count0 == 0 { (0, count0) } else { (1, count1) };
            return Err(PipelineError::InsufficientSamples {
                class,
                count,
                required: 1,
            });
        }

        let n = n_rows as f64;
        let class_weights = match self.config.class_weight {
            ClassWeight::Uniform => [1.0, 1.0],
            ClassWeight::Balanced => [n / (2.0 * count0 as f64), n / (2.0 * count1 as f64)],
        };

        let limits = GrowLimits {
            max_depth: self.config.max_depth,
            min_samples_split: self.config.min_samples_split,
            max_features,
        };

        let mut master_rng = StdRng::seed_from_u64(self.config.seed);
        let mut trees = Vec::with_capacity(self.config.n_trees);
        let mut importance = vec![0.0; n_features];

        for _ in 0..self.config.n_trees {
            let mut rng = StdRng::seed_from_u64(master_rng.gen());
            let bootstrap: Vec<usize> = (0..n_rows).map(|_| rng.gen_range(0..n_rows)).collect();
            trees.push(grow_tree(
                x,
                y,
                &bootstrap,
                class_weights,
                &limits,
                &mut rng,
                &mut importance,
            ));
        }

        let total: f64 = importance.iter().sum();
        if total > 0.0 {
            for v in importance.iter_mut() {
                *v /= total;
            }
        } else {
            // No split ever reduced impurity; report a uniform vector so the
            // sum-to-one contract still holds.
            importance.fill(1.0 / n_features as f64);
        }

        Ok(FittedRandomForest {
            trees,
            feature_importance: importance,
            n_features,
        })
    }
}

/// Serializable parameters for a fitted forest.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ForestParams {
    pub trees: Vec<Tree>,
    pub feature_importance: Vec<f64>,
    pub n_features: usize,
}

/// Fitted forest ready for inference. Immutable once fit; refitting
/// produces a new instance.
#[derive(Clone, Debug)]
pub struct FittedRandomForest {
    trees: Vec<Tree>,
    feature_importance: Vec<f64>,
    n_features: usize,
}

impl FittedRandomForest {
    /// Probability-of-anomaly per row, averaged over the ensemble.
    pub fn predict_score(&self, x: &Matrix) -> Result<Vec<f64>, PipelineError> {
        let (n_rows, n_features) = x.shape();
        if n_features != self.n_features {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} features", self.n_features),
                got: format!("{} features", n_features),
            });
        }
        let n_trees = self.trees.len() as f64;
        Ok((0..n_rows)
            .map(|i| {
                let row = x.row(i);
                self.trees.iter().map(|t| t.score(row)).sum::<f64>() / n_trees
            })
            .collect())
    }

    /// Hard class predictions at the 0.5 score threshold.
    pub fn predict(&self, x: &Matrix) -> Result<Vec<u8>, PipelineError> {
        Ok(self
            .predict_score(x)?
            .into_iter()
            .map(|s| u8::from(s >= 0.5))
            .collect())
    }

    /// Non-negative importance per input feature, summing to 1, aligned to
    /// the feature matrix column order.
    pub fn feature_importance(&self) -> &[f64] {
        &self.feature_importance
    }

    pub fn n_features_in(&self) -> usize {
        self.n_features
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }

    pub fn extract_params(&self) -> ForestParams {
        ForestParams {
            trees: self.trees.clone(),
            feature_importance: self.feature_importance.clone(),
            n_features: self.n_features,
        }
    }

    pub fn from_params(params: ForestParams) -> Result<Self, PipelineError> {
        if params.trees.is_empty() {
            return Err(PipelineError::Serialization(
                "Forest parameters contain no trees".to_string(),
            ));
        }
        Ok(Self {
            trees: params.trees,
            feature_importance: params.feature_importance,
            n_features: params.n_features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Two well-separated blobs: class 0 near the origin, class 1 near (10, 10).
    fn create_separable_data() -> (Matrix, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..20 {
            rows.push(vec![(i % 5) as f64 * 0.3, (i % 7) as f64 * 0.2]);
            labels.push(0);
        }
        for i in 0..20 {
            rows.push(vec![10.0 + (i % 5) as f64 * 0.3, 10.0 + (i % 7) as f64 * 0.2]);
            labels.push(1);
        }
        (Matrix::from_rows(&rows).unwrap(), labels)
    }

    fn small_config() -> ForestConfig {
        ForestConfig::new().with_n_trees(20).with_max_depth(5)
    }

    #[test]
    fn test_forest_separable_data() {
        let (x, y) = create_separable_data();
        let fitted = RandomForest::new(small_config()).fit(&x, &y).unwrap();

        let preds = fitted.predict(&x).unwrap();
        assert_eq!(preds, y);

        let scores = fitted.predict_score(&x).unwrap();
        assert!(scores.iter().all(|&s| (0.0..=1.0).contains(&s)));
    }

    #[test]
    fn test_forest_deterministic_given_seed() {
        let (x, y) = create_separable_data();
        let a = RandomForest::new(small_config().with_seed(3)).fit(&x, &y).unwrap();
        let b = RandomForest::new(small_config().with_seed(3)).fit(&x, &y).unwrap();
        assert_eq!(a.predict_score(&x).unwrap(), b.predict_score(&x).unwrap());
    }

    #[test]
    fn test_forest_feature_importance_sums_to_one() {
        let (x, y) = create_separable_data();
        let fitted = RandomForest::new(small_config()).fit(&x, &y).unwrap();

        let importance = fitted.feature_importance();
        assert_eq!(importance.len(), 2);
        assert!(importance.iter().all(|&v| v >= 0.0));
        assert!((importance.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_forest_importance_uniform_when_unsplittable() {
        // Constant features: no split is ever taken.
        let x = Matrix::from_rows(&[vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]])
            .unwrap();
        let y = vec![0, 1, 0, 1];
        let fitted = RandomForest::new(small_config()).fit(&x, &y).unwrap();
        assert_eq!(fitted.feature_importance(), &[0.5, 0.5]);
    }

    #[test]
    fn test_forest_invalid_config() {
        let (x, y) = create_separable_data();
        assert!(matches!(
            RandomForest::new(ForestConfig::new().with_n_trees(0)).fit(&x, &y),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(matches!(
            RandomForest::new(ForestConfig::new().with_max_depth(0)).fit(&x, &y),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(matches!(
            RandomForest::new(ForestConfig::new().with_max_features(10)).fit(&x, &y),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_forest_single_class_rejected() {
        let x = Matrix::from_rows(&[vec![1.0], vec![2.0]]).unwrap();
        let result = RandomForest::new(small_config()).fit(&x, &[0, 0]);
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientSamples { class: 1, .. })
        ));
    }

    #[test]
    fn test_forest_feature_count_mismatch_at_predict() {
        let (x, y) = create_separable_data();
        let fitted = RandomForest::new(small_config()).fit(&x, &y).unwrap();

        let wrong = Matrix::from_rows(&[vec![1.0, 2.0, 3.0]]).unwrap();
        let result = fitted.predict(&wrong);
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_forest_params_roundtrip() {
        let (x, y) = create_separable_data();
        let fitted = RandomForest::new(small_config()).fit(&x, &y).unwrap();

        let bytes = bincode::serialize(&fitted.extract_params()).unwrap();
        let params: ForestParams = bincode::deserialize(&bytes).unwrap();
        let restored = FittedRandomForest::from_params(params).unwrap();

        assert_eq!(
            restored.predict_score(&x).unwrap(),
            fitted.predict_score(&x).unwrap()
        );
    }

    #[test]
    fn test_forest_from_params_empty_rejected() {
        let params = ForestParams {
            trees: vec![],
            feature_importance: vec![],
            n_features: 0,
        };
        assert!(matches!(
            FittedRandomForest::from_params(params),
            Err(PipelineError::Serialization(_))
        ));
    }
}
