//! Column-wise preprocessing for fixed-schema numeric tables.
//!
//! The fit/transform split follows the usual two-phase shape: an unfitted
//! [`Preprocessor`] holds the declarative [`ColumnTransformSpec`]; fitting
//! produces an immutable [`FittedPreprocessor`] whose frozen statistics are
//! the only state `transform` ever reads.

pub mod preprocessor;
pub mod spec;

pub use preprocessor::{ColumnParams, FittedPreprocessor, Preprocessor, PreprocessorParams};
pub use spec::{ColumnTransformSpec, TransformKind};
