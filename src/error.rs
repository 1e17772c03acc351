//! Error types for pipeline operations.

use std::fmt;

/// Error type covering every fallible operation in the crate.
#[derive(Debug)]
pub enum PipelineError {
    /// Columns at transform/predict time don't match the columns seen at fit time.
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },
    /// A value outside the domain of a transform (e.g. x < -1 into log1p).
    Domain { column: String, value: f64 },
    /// A class has too few members for resampling or stratification.
    InsufficientSamples {
        class: u8,
        count: usize,
        required: usize,
    },
    /// Invalid hyperparameter or configuration combination.
    InvalidConfig(String),
    /// Shape mismatch between expected and actual dimensions.
    ShapeMismatch { expected: String, got: String },
    /// Empty data provided where non-empty was required.
    EmptyData(String),
    /// Serialization or deserialization error.
    Serialization(String),
    /// I/O error during file operations.
    Io(String),
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::SchemaMismatch {
                missing,
                unexpected,
            } => {
                write!(
                    f,
                    "Schema mismatch: missing columns {:?}, unexpected columns {:?}",
                    missing, unexpected
                )
            }
            PipelineError::Domain { column, value } => {
                write!(
                    f,
                    "Domain error: value {} in column '{}' is outside the transform domain",
                    value, column
                )
            }
            PipelineError::InsufficientSamples {
                class,
                count,
                required,
            } => {
                write!(
                    f,
                    "Insufficient samples: class {} has {} members, {} required",
                    class, count, required
                )
            }
            PipelineError::InvalidConfig(msg) => {
                write!(f, "Invalid config: {}", msg)
            }
            PipelineError::ShapeMismatch { expected, got } => {
                write!(f, "Shape mismatch: expected {}, got {}", expected, got)
            }
            PipelineError::EmptyData(msg) => {
                write!(f, "Empty data: {}", msg)
            }
            PipelineError::Serialization(msg) => {
                write!(f, "Serialization error: {}", msg)
            }
            PipelineError::Io(msg) => {
                write!(f, "I/O error: {}", msg)
            }
        }
    }
}

impl std::error::Error for PipelineError {}

impl From<std::io::Error> for PipelineError {
    fn from(err: std::io::Error) -> Self {
        PipelineError::Io(err.to_string())
    }
}

impl From<bincode::Error> for PipelineError {
    fn from(err: bincode::Error) -> Self {
        PipelineError::Serialization(err.to_string())
    }
}
