//! Stratified k-fold evaluation of a pipeline.
//!
//! Folds preserve the global class ratio to within one sample: indices of
//! each class are shuffled with a seeded RNG and dealt round-robin across
//! folds. Every fold trains a fresh pipeline on the remaining folds, so no
//! fitted state is shared between folds and they evaluate in parallel.

use crate::dataset::{class_counts, validate_labels, Table};
use crate::error::PipelineError;
use crate::evaluation::metrics::evaluate;
use crate::pipeline::Pipeline;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Metric aggregated across folds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Metric {
    /// Unweighted mean of per-class F1 scores.
    F1Macro,
    Accuracy,
    Auc,
}

/// Per-fold scores and their aggregate.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct CrossValidationResult {
    pub fold_scores: Vec<f64>,
    pub mean: f64,
    /// Sample standard deviation (n − 1 denominator).
    pub std_dev: f64,
}

/// Stratified k-fold cross-validator.
#[derive(Clone, Debug)]
pub struct CrossValidator {
    fold_count: usize,
    metric: Metric,
    seed: u64,
}

impl CrossValidator {
    pub fn new(fold_count: usize, metric: Metric) -> Self {
        Self {
            fold_count,
            metric,
            seed: 42,
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Train and score `pipeline` across stratified folds of `(table, labels)`.
    pub fn evaluate(
        &self,
        table: &Table,
        labels: &[u8],
        pipeline: &Pipeline,
    ) -> Result<CrossValidationResult, PipelineError> {
        validate_labels(labels, table.n_rows())?;
        if self.fold_count < 2 {
            return Err(PipelineError::InvalidConfig(format!(
                "fold_count must be at least 2, got {}",
                self.fold_count
            )));
        }
        let (count0, count1) = class_counts(labels);
        let minority = count0.min(count1);
        if self.fold_count > minority {
            return Err(PipelineError::InvalidConfig(format!(
                "fold_count {} exceeds minority class count {}; folds cannot be stratified",
                self.fold_count, minority
            )));
        }

        let folds = self.stratified_folds(labels);

        let fold_scores: Vec<f64> = (0..folds.len())
            .into_par_iter()
            .map(|k| self.score_fold(table, labels, pipeline, &folds, k))
            .collect::<Result<Vec<_>, _>>()?;

        let mean = fold_scores.iter().sum::<f64>() / fold_scores.len() as f64;
        let var = fold_scores
            .iter()
            .map(|s| (s - mean).powi(2))
            .sum::<f64>()
            / (fold_scores.len() - 1) as f64;

        Ok(CrossValidationResult {
            fold_scores,
            mean,
            std_dev: var.sqrt(),
        })
    }

    /// Shuffle each class separately, then deal round-robin into folds.
    fn stratified_folds(&self, labels: &[u8]) -> Vec<Vec<usize>> {
        let mut folds = vec![Vec::new(); self.fold_count];
        for class in [0u8, 1u8] {
            let mut indices: Vec<usize> = (0..labels.len())
                .filter(|&i| labels[i] == class)
                .collect();
            let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(class as u64));
            indices.shuffle(&mut rng);
            for (i, idx) in indices.into_iter().enumerate() {
                folds[i % self.fold_count].push(idx);
            }
        }
        folds
    }

    fn score_fold(
        &self,
        table: &Table,
        labels: &[u8],
        pipeline: &Pipeline,
        folds: &[Vec<usize>],
        held_out: usize,
    ) -> Result<f64, PipelineError> {
        let test_indices = &folds[held_out];
        let train_indices: Vec<usize> = folds
            .iter()
            .enumerate()
            .filter(|(k, _)| *k != held_out)
            .flat_map(|(_, f)| f.iter().copied())
            .collect();

        let train_table = table.select_rows(&train_indices)?;
        let train_labels: Vec<u8> = train_indices.iter().map(|&i| labels[i]).collect();
        let test_table = table.select_rows(test_indices)?;
        let test_labels: Vec<u8> = test_indices.iter().map(|&i| labels[i]).collect();

        let fitted = pipeline.fit(&train_table, &train_labels)?;
        let scores = fitted.predict_score(&test_table)?;
        let result = evaluate(&test_labels, None, &scores)?;

        Ok(match self.metric {
            Metric::F1Macro => result.f1_macro,
            Metric::Accuracy => result.accuracy,
            Metric::Auc => result.auc,
        })
    }
}
