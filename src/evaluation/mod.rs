//! Evaluation harness: pure metrics and stratified cross-validation.

pub mod cross_validation;
pub mod metrics;

pub use cross_validation::{CrossValidationResult, CrossValidator, Metric};
pub use metrics::{evaluate, ConfusionMatrix, EvaluationResult, RocPoint, DECISION_THRESHOLD};
