//! Column-wise preprocessing with frozen fit-time statistics.
//!
//! [`Preprocessor::fit`] learns per-column parameters from a training table;
//! [`FittedPreprocessor::transform`] applies those frozen parameters to any
//! table with the same schema. Transform never recomputes statistics from
//! its own argument, so a row transforms identically whether it arrives
//! alone or in a batch.

use crate::dataset::Table;
use crate::error::PipelineError;
use crate::matrix::Matrix;
use crate::preprocessing::spec::{ColumnTransformSpec, TransformKind};
use serde::{Deserialize, Serialize};

/// Learned parameters for one output column.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ColumnParams {
    Log1p,
    MinMax { min: f64, max: f64 },
    Standardize { mean: f64, std: f64 },
    Passthrough,
}

/// Serializable parameters for a fitted preprocessor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PreprocessorParams {
    /// Per output column: source column name and learned parameters,
    /// in output order.
    pub columns: Vec<(String, ColumnParams)>,
}

/// Unfitted preprocessor holding the declarative column spec.
#[derive(Clone, Debug, Default)]
pub struct Preprocessor {
    spec: ColumnTransformSpec,
}

impl Preprocessor {
    pub fn new(spec: ColumnTransformSpec) -> Self {
        Self { spec }
    }

    /// Learn per-column statistics from the training table.
    pub fn fit(&self, table: &Table) -> Result<FittedPreprocessor, PipelineError> {
        if table.n_rows() == 0 {
            return Err(PipelineError::EmptyData(
                "Cannot fit preprocessor on an empty table".to_string(),
            ));
        }

        let resolved = self.spec.resolve(table.columns())?;
        let mut columns = Vec::with_capacity(resolved.len());

        for (name, kind) in resolved {
            let values = table.column(&name)?;
            let params = match kind {
                TransformKind::Log1p => {
                    check_log1p_domain(&name, &values)?;
                    ColumnParams::Log1p
                }
                TransformKind::MinMax => {
                    let min = values.iter().copied().fold(f64::INFINITY, f64::min);
                    let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
                    ColumnParams::MinMax { min, max }
                }
                TransformKind::Standardize => {
                    let n = values.len() as f64;
                    let mean = values.iter().sum::<f64>() / n;
                    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
                    ColumnParams::Standardize {
                        mean,
                        std: var.sqrt(),
                    }
                }
                TransformKind::Passthrough => ColumnParams::Passthrough,
            };
            columns.push((name, params));
        }

        Ok(FittedPreprocessor { columns })
    }

    /// Fit and transform the training table in one step.
    pub fn fit_transform(&self, table: &Table) -> Result<(FittedPreprocessor, Matrix), PipelineError> {
        let fitted = self.fit(table)?;
        let matrix = fitted.transform(table)?;
        Ok((fitted, matrix))
    }
}

/// Fitted preprocessor ready for inference. Immutable once fit.
#[derive(Clone, Debug)]
pub struct FittedPreprocessor {
    columns: Vec<(String, ColumnParams)>,
}

impl FittedPreprocessor {
    /// Output column names in output order.
    pub fn output_columns(&self) -> Vec<&str> {
        self.columns.iter().map(|(n, _)| n.as_str()).collect()
    }

    /// Number of output features.
    pub fn n_features_out(&self) -> usize {
        self.columns.len()
    }

    /// Apply the frozen per-column transforms to a table.
    ///
    /// The table must carry exactly the fit-time column set (order-free);
    /// missing or unexpected columns fail with a schema error.
    pub fn transform(&self, table: &Table) -> Result<Matrix, PipelineError> {
        self.check_schema(table)?;

        let n_rows = table.n_rows();
        let n_cols = self.columns.len();
        let mut data = vec![0.0; n_rows * n_cols];

        for (j, (name, params)) in self.columns.iter().enumerate() {
            let values = table.column(name)?;
            for (i, &x) in values.iter().enumerate() {
                data[i * n_cols + j] = apply_column(name, params, x)?;
            }
        }

        Matrix::new(data, n_rows, n_cols)
    }

    fn check_schema(&self, table: &Table) -> Result<(), PipelineError> {
        let missing: Vec<String> = self
            .columns
            .iter()
            .filter(|(name, _)| table.column_index(name).is_none())
            .map(|(name, _)| name.clone())
            .collect();
        let unexpected: Vec<String> = table
            .columns()
            .iter()
            .filter(|name| !self.columns.iter().any(|(n, _)| n == *name))
            .cloned()
            .collect();
        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                missing,
                unexpected,
            });
        }
        Ok(())
    }

    /// Extract learned parameters as a serializable representation.
    pub fn extract_params(&self) -> PreprocessorParams {
        PreprocessorParams {
            columns: self.columns.clone(),
        }
    }

    /// Reconstruct a fitted preprocessor from parameters.
    pub fn from_params(params: PreprocessorParams) -> Self {
        Self {
            columns: params.columns,
        }
    }
}

fn check_log1p_domain(name: &str, values: &[f64]) -> Result<(), PipelineError> {
    if let Some(&bad) = values.iter().find(|&&v| v < -1.0) {
        return Err(PipelineError::Domain {
            column: name.to_string(),
            value: bad,
        });
    }
    Ok(())
}

fn apply_column(name: &str, params: &ColumnParams, x: f64) -> Result<f64, PipelineError> {
    let out = match params {
        ColumnParams::Log1p => {
            if x < -1.0 {
                return Err(PipelineError::Domain {
                    column: name.to_string(),
                    value: x,
                });
            }
            (1.0 + x).ln()
        }
        ColumnParams::MinMax { min, max } => {
            // Degenerate column: defined as 0 rather than dividing by zero.
            if max == min {
                0.0
            } else {
                (x - min) / (max - min)
            }
        }
        ColumnParams::Standardize { mean, std } => {
            if *std == 0.0 {
                0.0
            } else {
                (x - mean) / std
            }
        }
        ColumnParams::Passthrough => x,
    };
    Ok(out)
}
