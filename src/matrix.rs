//! Dense row-major matrix storage.
//!
//! All preprocessing output and model input flows through [`Matrix`]: a
//! contiguous `Vec<f64>` with `(rows, cols)` shape. Rows are samples,
//! columns are features.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Dense 2D matrix of `f64` values in row-major order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Matrix {
    data: Vec<f64>,
    rows: usize,
    cols: usize,
}

impl Matrix {
    /// Create a matrix from a flat row-major buffer.
    pub fn new(data: Vec<f64>, rows: usize, cols: usize) -> Result<Self, PipelineError> {
        if data.len() != rows * cols {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} values ({} x {})", rows * cols, rows, cols),
                got: format!("{} values", data.len()),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Create a zero-filled matrix.
    pub fn zeros(rows: usize, cols: usize) -> Self {
        Self {
            data: vec![0.0; rows * cols],
            rows,
            cols,
        }
    }

    /// Create a matrix from a slice of equal-length rows.
    pub fn from_rows(rows: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let first = rows.first().ok_or_else(|| {
            PipelineError::EmptyData("Cannot build a matrix from zero rows".to_string())
        })?;
        let cols = first.len();
        let mut data = Vec::with_capacity(rows.len() * cols);
        for row in rows {
            if row.len() != cols {
                return Err(PipelineError::ShapeMismatch {
                    expected: format!("{} values per row", cols),
                    got: format!("{} values", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: rows.len(),
            cols,
        })
    }

    /// Shape as `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn n_rows(&self) -> usize {
        self.rows
    }

    pub fn n_cols(&self) -> usize {
        self.cols
    }

    /// Borrow row `i` as a slice.
    pub fn row(&self, i: usize) -> &[f64] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// Value at `(i, j)`.
    pub fn get(&self, i: usize, j: usize) -> f64 {
        self.data[i * self.cols + j]
    }

    /// Copy of column `j`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        (0..self.rows).map(|i| self.data[i * self.cols + j]).collect()
    }

    /// New matrix containing the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self, PipelineError> {
        let mut data = Vec::with_capacity(indices.len() * self.cols);
        for &i in indices {
            if i >= self.rows {
                return Err(PipelineError::ShapeMismatch {
                    expected: format!("row index < {}", self.rows),
                    got: format!("row index {}", i),
                });
            }
            data.extend_from_slice(self.row(i));
        }
        Ok(Self {
            data,
            rows: indices.len(),
            cols: self.cols,
        })
    }

    /// New matrix with `extra` rows appended below `self`.
    pub fn vstack(&self, extra: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let mut data = self.data.clone();
        for row in extra {
            if row.len() != self.cols {
                return Err(PipelineError::ShapeMismatch {
                    expected: format!("{} values per row", self.cols),
                    got: format!("{} values", row.len()),
                });
            }
            data.extend_from_slice(row);
        }
        Ok(Self {
            data,
            rows: self.rows + extra.len(),
            cols: self.cols,
        })
    }
}
