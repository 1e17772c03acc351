//! Ensemble classifier built from flat array-of-structs decision trees.

pub mod forest;
pub mod tree;

pub use forest::{ClassWeight, FittedRandomForest, ForestConfig, ForestParams, RandomForest};
pub use tree::{Node, Tree};
