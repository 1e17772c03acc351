//! Tabular dataset with named numeric columns.
//!
//! A [`Table`] pairs a declared column schema with row-major numeric storage.
//! The schema is supplied by the caller, never inferred; labels live outside
//! the table as a plain `&[u8]` slice (0 = normal, 1 = anomaly).

use crate::error::PipelineError;
use crate::matrix::Matrix;

/// Fixed-schema numeric table: column names plus a row-major value matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
    columns: Vec<String>,
    values: Matrix,
}

impl Table {
    /// Build a table from column names and equal-length rows.
    pub fn new<S: Into<String>>(columns: Vec<S>, rows: &[Vec<f64>]) -> Result<Self, PipelineError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if columns.is_empty() {
            return Err(PipelineError::EmptyData(
                "Table requires at least one column".to_string(),
            ));
        }
        for (i, name) in columns.iter().enumerate() {
            if columns[..i].contains(name) {
                return Err(PipelineError::InvalidConfig(format!(
                    "Duplicate column name '{}'",
                    name
                )));
            }
        }
        let values = Matrix::from_rows(rows)?;
        if values.n_cols() != columns.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} columns", columns.len()),
                got: format!("{} columns", values.n_cols()),
            });
        }
        Ok(Self { columns, values })
    }

    /// Build a table directly from a matrix.
    pub fn from_matrix<S: Into<String>>(
        columns: Vec<S>,
        values: Matrix,
    ) -> Result<Self, PipelineError> {
        let columns: Vec<String> = columns.into_iter().map(Into::into).collect();
        if values.n_cols() != columns.len() {
            return Err(PipelineError::ShapeMismatch {
                expected: format!("{} columns", columns.len()),
                got: format!("{} columns", values.n_cols()),
            });
        }
        Ok(Self { columns, values })
    }

    /// Declared column names, in table order.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn n_rows(&self) -> usize {
        self.values.n_rows()
    }

    pub fn n_cols(&self) -> usize {
        self.columns.len()
    }

    /// Index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Copy of a named column's values.
    pub fn column(&self, name: &str) -> Result<Vec<f64>, PipelineError> {
        let idx = self.column_index(name).ok_or_else(|| {
            PipelineError::SchemaMismatch {
                missing: vec![name.to_string()],
                unexpected: vec![],
            }
        })?;
        Ok(self.values.column(idx))
    }

    /// Borrow row `i` in table column order.
    pub fn row(&self, i: usize) -> &[f64] {
        self.values.row(i)
    }

    /// The underlying value matrix.
    pub fn values(&self) -> &Matrix {
        &self.values
    }

    /// New table containing the given rows, in the given order.
    pub fn select_rows(&self, indices: &[usize]) -> Result<Self, PipelineError> {
        Ok(Self {
            columns: self.columns.clone(),
            values: self.values.select_rows(indices)?,
        })
    }
}

/// Check that labels are binary and aligned with a row count.
pub fn validate_labels(labels: &[u8], n_rows: usize) -> Result<(), PipelineError> {
    if labels.len() != n_rows {
        return Err(PipelineError::ShapeMismatch {
            expected: format!("{} labels", n_rows),
            got: format!("{} labels", labels.len()),
        });
    }
    if let Some(&bad) = labels.iter().find(|&&l| l > 1) {
        return Err(PipelineError::InvalidConfig(format!(
            "Labels must be 0 or 1, found {}",
            bad
        )));
    }
    Ok(())
}

/// Count of samples per class, as `(class 0, class 1)`.
pub fn class_counts(labels: &[u8]) -> (usize, usize) {
    let ones = labels.iter().filter(|&&l| l == 1).count();
    (labels.len() - ones, ones)
}
