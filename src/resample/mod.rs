//! Synthetic minority oversampling for imbalanced training sets.
//!
//! [`SmoteResampler`] rebalances a transformed training matrix by
//! interpolating between minority samples and their k nearest same-class
//! neighbors. It is meant for training folds only; the pipeline never
//! applies it to data that will be predicted on.

use crate::dataset::class_counts;
use crate::error::PipelineError;
use crate::matrix::Matrix;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Synthetic minority oversampling (SMOTE-style) configuration.
///
/// Synthetic rows are `base + u * (neighbor - base)` with `u ~ U[0, 1]` and
/// the neighbor drawn uniformly from the base sample's `k_neighbors` nearest
/// same-class rows under Euclidean distance. Given a fixed seed the output
/// is reproducible.
#[derive(Clone, Debug, PartialEq)]
pub struct SmoteResampler {
    k_neighbors: usize,
    target_ratio: f64,
    seed: u64,
}

impl Default for SmoteResampler {
    fn default() -> Self {
        Self {
            k_neighbors: 5,
            target_ratio: 1.0,
            seed: 42,
        }
    }
}

impl SmoteResampler {
    /// Create a resampler with default settings (k = 5, equal class counts).
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the neighbor pool size (capped at minority count − 1 during resampling).
    pub fn with_k_neighbors(mut self, k: usize) -> Self {
        self.k_neighbors = k;
        self
    }

    /// Set the target minority/majority ratio (1.0 = equal counts).
    pub fn with_target_ratio(mut self, ratio: f64) -> Self {
        self.target_ratio = ratio;
        self
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Oversample the minority class of `(x, y)` up to the target ratio.
    ///
    /// Original rows are returned unchanged, with synthetic minority rows
    /// appended below them.
    pub fn resample(&self, x: &Matrix, y: &[u8]) -> Result<(Matrix, Vec<u8>), PipelineError> {
        if self.k_neighbors == 0 {
            return Err(PipelineError::InvalidConfig(
                "k_neighbors must be at least 1".to_string(),
            ));
        }
        if !(self.target_ratio > 0.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "target_ratio must be positive, got {}",
                self.target_ratio
            )));
        }
        crate::dataset::validate_labels(y, x.n_rows())?;

        let (count0, count1) = class_counts(y);
        let (minority_label, minority_count, majority_count) = if count1 <= count0 {
            (1u8, count1, count0)
        } else {
            (0u8, count0, count1)
        };

        let target = (majority_count as f64 * self.target_ratio).round() as usize;
        let n_synthetic = target.saturating_sub(minority_count);
        if n_synthetic == 0 {
            return Ok((x.clone(), y.to_vec()));
        }
        if minority_count < 2 {
            return Err(PipelineError::InsufficientSamples {
                class: minority_label,
                count: minority_count,
                required: 2,
            });
        }

        let minority: Vec<usize> = (0..y.len()).filter(|&i| y[i] == minority_label).collect();
        let k = self.k_neighbors.min(minority_count - 1);
        let neighbors = nearest_neighbors(x, &minority, k);

        let mut rng = StdRng::seed_from_u64(self.seed);
        let mut synthetic = Vec::with_capacity(n_synthetic);
        for s in 0..n_synthetic {
            // Cycle through minority samples so the synthetic mass spreads
            // evenly instead of clustering around a random subset.
            let base_pos = s % minority_count;
            let base = x.row(minority[base_pos]);
            let neighbor_row = neighbors[base_pos][rng.gen_range(0..k)];
            let neighbor = x.row(neighbor_row);
            let u: f64 = rng.gen();
            let row: Vec<f64> = base
                .iter()
                .zip(neighbor.iter())
                .map(|(&b, &n)| b + u * (n - b))
                .collect();
            synthetic.push(row);
        }

        let resampled_x = x.vstack(&synthetic)?;
        let mut resampled_y = y.to_vec();
        resampled_y.extend(std::iter::repeat(minority_label).take(n_synthetic));
        Ok((resampled_x, resampled_y))
    }
}

/// For each minority row, the `k` nearest other minority rows by Euclidean
/// distance (squared distances compare identically, so the sqrt is skipped).
fn nearest_neighbors(x: &Matrix, minority: &[usize], k: usize) -> Vec<Vec<usize>> {
    minority
        .iter()
        .map(|&i| {
            let mut dists: Vec<(f64, usize)> = minority
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(x.row(i), x.row(j)), j))
                .collect();
            dists.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));
            dists.truncate(k);
            dists.into_iter().map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| (x - y) * (x - y))
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::class_counts;

    /// 9 majority rows near the origin, 3 minority rows near (10, 10).
    fn create_imbalanced_data() -> (Matrix, Vec<u8>) {
        let mut rows = Vec::new();
        let mut labels = Vec::new();
        for i in 0..9 {
            rows.push(vec![i as f64 * 0.1, i as f64 * 0.2]);
            labels.push(0);
        }
        for i in 0..3 {
            rows.push(vec![10.0 + i as f64 * 0.1, 10.0 - i as f64 * 0.1]);
            labels.push(1);
        }
        (Matrix::from_rows(&rows).unwrap(), labels)
    }

    #[test]
    fn test_smote_balances_classes() {
        let (x, y) = create_imbalanced_data();
        let (rx, ry) = SmoteResampler::new().resample(&x, &y).unwrap();

        let (c0, c1) = class_counts(&ry);
        assert_eq!(c0, 9);
        assert_eq!(c1, 9);
        assert_eq!(rx.n_rows(), ry.len());
    }

    #[test]
    fn test_smote_preserves_original_rows() {
        let (x, y) = create_imbalanced_data();
        let (rx, ry) = SmoteResampler::new().resample(&x, &y).unwrap();

        for i in 0..x.n_rows() {
            assert_eq!(rx.row(i), x.row(i));
            assert_eq!(ry[i], y[i]);
        }
    }

    #[test]
    fn test_smote_synthetic_rows_interpolate_minority() {
        let (x, y) = create_imbalanced_data();
        let (rx, ry) = SmoteResampler::new().resample(&x, &y).unwrap();

        // Synthetic rows are convex combinations of minority rows, so they
        // stay inside the minority bounding box, far from the majority blob.
        for i in x.n_rows()..rx.n_rows() {
            assert_eq!(ry[i], 1);
            let row = rx.row(i);
            assert!(row[0] >= 10.0 - 1e-9 && row[0] <= 10.2 + 1e-9);
            assert!(row[1] >= 9.8 - 1e-9 && row[1] <= 10.0 + 1e-9);
        }
    }

    #[test]
    fn test_smote_deterministic_given_seed() {
        let (x, y) = create_imbalanced_data();
        let resampler = SmoteResampler::new().with_seed(7);
        let (a, _) = resampler.resample(&x, &y).unwrap();
        let (b, _) = resampler.resample(&x, &y).unwrap();
        assert_eq!(a, b);

        let (c, _) = SmoteResampler::new().with_seed(8).resample(&x, &y).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn test_smote_singleton_minority_rejected() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![10.0]]).unwrap();
        let y = vec![0, 0, 1];
        let result = SmoteResampler::new().resample(&x, &y);
        assert!(matches!(
            result,
            Err(PipelineError::InsufficientSamples {
                class: 1,
                count: 1,
                required: 2
            })
        ));
    }

    #[test]
    fn test_smote_balanced_input_is_noop() {
        let x = Matrix::from_rows(&[vec![0.0], vec![1.0], vec![10.0], vec![11.0]]).unwrap();
        let y = vec![0, 0, 1, 1];
        let (rx, ry) = SmoteResampler::new().resample(&x, &y).unwrap();
        assert_eq!(rx, x);
        assert_eq!(ry, y);
    }

    #[test]
    fn test_smote_partial_target_ratio() {
        let (x, y) = create_imbalanced_data();
        let (_, ry) = SmoteResampler::new()
            .with_target_ratio(2.0 / 3.0)
            .resample(&x, &y)
            .unwrap();
        let (_, c1) = class_counts(&ry);
        assert_eq!(c1, 6); // 9 * 2/3
    }

    #[test]
    fn test_smote_invalid_config() {
        let (x, y) = create_imbalanced_data();
        assert!(matches!(
            SmoteResampler::new().with_k_neighbors(0).resample(&x, &y),
            Err(PipelineError::InvalidConfig(_))
        ));
        assert!(matches!(
            SmoteResampler::new().with_target_ratio(0.0).resample(&x, &y),
            Err(PipelineError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_smote_label_length_mismatch() {
        let (x, _) = create_imbalanced_data();
        let result = SmoteResampler::new().resample(&x, &[0, 1]);
        assert!(matches!(result, Err(PipelineError::ShapeMismatch { .. })));
    }
}
