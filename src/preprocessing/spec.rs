//! Declarative column-to-transform mapping.
//!
//! A [`ColumnTransformSpec`] assigns each column group one [`TransformKind`].
//! Columns left out of every group default to passthrough and are appended
//! after all declared groups, in table order.

use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// The per-column transforms this crate knows about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum TransformKind {
    /// `ln(1 + x)`; undefined for `x < -1`.
    Log1p,
    /// `(x - min) / (max - min)` with fit-time min/max.
    MinMax,
    /// `(x - mean) / std` with fit-time mean/std.
    Standardize,
    /// Identity.
    Passthrough,
}

/// Ordered mapping of column groups to transform kinds.
///
/// # Example
/// ```
/// use tabanom::preprocessing::ColumnTransformSpec;
///
/// let spec = ColumnTransformSpec::new()
///     .log1p(["X1"])
///     .min_max(["X3", "X4"])
///     .standardize(["X2", "X5"]);
/// assert_eq!(spec.groups().len(), 3);
/// ```
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ColumnTransformSpec {
    groups: Vec<(TransformKind, Vec<String>)>,
}

impl ColumnTransformSpec {
    /// Create an empty spec (every column passes through).
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a log1p group.
    pub fn log1p<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_group(TransformKind::Log1p, columns)
    }

    /// Add a min-max scaling group.
    pub fn min_max<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_group(TransformKind::MinMax, columns)
    }

    /// Add a standardization group.
    pub fn standardize<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_group(TransformKind::Standardize, columns)
    }

    /// Add an explicit passthrough group (pins those columns ahead of the
    /// implicit trailing passthrough block).
    pub fn passthrough<I, S>(self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.add_group(TransformKind::Passthrough, columns)
    }

    fn add_group<I, S>(mut self, kind: TransformKind, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.groups
            .push((kind, columns.into_iter().map(Into::into).collect()));
        self
    }

    /// Declared groups in declaration order.
    pub fn groups(&self) -> &[(TransformKind, Vec<String>)] {
        &self.groups
    }

    /// Check that no column appears in more than one group.
    pub fn validate(&self) -> Result<(), PipelineError> {
        let mut seen: Vec<&str> = Vec::new();
        for (_, columns) in &self.groups {
            for name in columns {
                if seen.contains(&name.as_str()) {
                    return Err(PipelineError::InvalidConfig(format!(
                        "Column '{}' appears in more than one transform group",
                        name
                    )));
                }
                seen.push(name);
            }
        }
        Ok(())
    }

    /// Resolve the spec against a table schema into the output column order:
    /// declared groups first, then unlisted columns as passthrough.
    ///
    /// Fails with a schema error if a declared column is absent from the table.
    pub fn resolve(&self, table_columns: &[String]) -> Result<Vec<(String, TransformKind)>, PipelineError> {
        self.validate()?;

        let mut missing = Vec::new();
        let mut resolved = Vec::new();
        for (kind, columns) in &self.groups {
            for name in columns {
                if table_columns.iter().any(|c| c == name) {
                    resolved.push((name.clone(), *kind));
                } else {
                    missing.push(name.clone());
                }
            }
        }
        if !missing.is_empty() {
            return Err(PipelineError::SchemaMismatch {
                missing,
                unexpected: vec![],
            });
        }

        for name in table_columns {
            if !resolved.iter().any(|(n, _)| n == name) {
                resolved.push((name.clone(), TransformKind::Passthrough));
            }
        }
        Ok(resolved)
    }
}
