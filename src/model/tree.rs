//! Flat array-of-structs decision tree.
//!
//! Nodes live in a single `Vec<Node>` and children are referenced by index,
//! so traversal is a loop over a contiguous buffer with no per-node
//! dispatch. Leaves store weighted class totals rather than a hard label,
//! which gives calibrated scores for free.

use crate::matrix::Matrix;
use rand::rngs::StdRng;
use rand::seq::index::sample;
use serde::{Deserialize, Serialize};

const MIN_IMPURITY_DECREASE: f64 = 1e-12;

/// One tree node: an internal split or a leaf with weighted class totals.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Node {
    Split {
        feature: usize,
        threshold: f64,
        left: usize,
        right: usize,
    },
    Leaf {
        /// Weighted sample mass per class, `[normal, anomaly]`.
        weight: [f64; 2],
    },
}

/// A fitted decision tree. Node 0 is the root.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    /// Probability-of-anomaly for one row.
    pub fn score(&self, row: &[f64]) -> f64 {
        let mut idx = 0;
        loop {
            match &self.nodes[idx] {
                Node::Split {
                    feature,
                    threshold,
                    left,
                    right,
                } => {
                    idx = if row[*feature] <= *threshold {
                        *left
                    } else {
                        *right
                    };
                }
                Node::Leaf { weight } => {
                    let total = weight[0] + weight[1];
                    return if total > 0.0 { weight[1] / total } else { 0.5 };
                }
            }
        }
    }

    pub fn n_nodes(&self) -> usize {
        self.nodes.len()
    }
}

/// Tree-growing limits shared by every tree in a forest.
#[derive(Clone, Copy, Debug)]
pub(crate) struct GrowLimits {
    pub max_depth: usize,
    pub min_samples_split: usize,
    pub max_features: usize,
}

/// Grow a tree on a bootstrap sample.
///
/// `importance` accumulates the weighted impurity decrease per feature
/// across every split; the forest normalizes it after all trees are grown.
pub(crate) fn grow_tree(
    x: &Matrix,
    y: &[u8],
    indices: &[usize],
    class_weights: [f64; 2],
    limits: &GrowLimits,
    rng: &mut StdRng,
    importance: &mut [f64],
) -> Tree {
    let mut builder = TreeBuilder {
        x,
        y,
        class_weights,
        limits,
        nodes: Vec::new(),
    };
    builder.build(indices, 0, rng, importance);
    Tree {
        nodes: builder.nodes,
    }
}

struct TreeBuilder<'a> {
    x: &'a Matrix,
    y: &'a [u8],
    class_weights: [f64; 2],
    limits: &'a GrowLimits,
    nodes: Vec<Node>,
}

struct BestSplit {
    feature: usize,
    threshold: f64,
    decrease: f64,
}

impl<'a> TreeBuilder<'a> {
    /// Build the subtree over `indices`, returning its node index.
    fn build(
        &mut self,
        indices: &[usize],
        depth: usize,
        rng: &mut StdRng,
        importance: &mut [f64],
    ) -> usize {
        let weight = self.weighted_counts(indices);

        let is_pure = weight[0] == 0.0 || weight[1] == 0.0;
        if depth >= self.limits.max_depth
            || indices.len() < self.limits.min_samples_split
            || is_pure
        {
            return self.push_leaf(weight);
        }

        let split = match self.find_best_split(indices, &weight, rng) {
            Some(s) => s,
            None => return self.push_leaf(weight),
        };

        importance[split.feature] += (weight[0] + weight[1]) * split.decrease;

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .copied()
            .partition(|&i| self.x.get(i, split.feature) <= split.threshold);

        // Reserve the split slot before recursing so children land after it.
        let node_idx = self.nodes.len();
        self.nodes.push(Node::Leaf { weight });
        let left = self.build(&left_indices, depth + 1, rng, importance);
        let right = self.build(&right_indices, depth + 1, rng, importance);
        self.nodes[node_idx] = Node::Split {
            feature: split.feature,
            threshold: split.threshold,
            left,
            right,
        };
        node_idx
    }

    fn push_leaf(&mut self, weight: [f64; 2]) -> usize {
        self.nodes.push(Node::Leaf { weight });
        self.nodes.len() - 1
    }

    fn weighted_counts(&self, indices: &[usize]) -> [f64; 2] {
        let mut weight = [0.0; 2];
        for &i in indices {
            weight[self.y[i] as usize] += self.class_weights[self.y[i] as usize];
        }
        weight
    }

    /// Exhaustive threshold search over a random feature subset, maximizing
    /// the weighted Gini impurity decrease.
    fn find_best_split(
        &self,
        indices: &[usize],
        parent_weight: &[f64; 2],
        rng: &mut StdRng,
    ) -> Option<BestSplit> {
        let n_features = self.x.n_cols();
        let parent_total = parent_weight[0] + parent_weight[1];
        let parent_gini = gini(parent_weight);

        let features = sample(rng, n_features, self.limits.max_features);

        let mut best: Option<BestSplit> = None;
        for feature in features.iter() {
            let mut values: Vec<(f64, u8)> = indices
                .iter()
                .map(|&i| (self.x.get(i, feature), self.y[i]))
                .collect();
            values.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap_or(std::cmp::Ordering::Equal));

            let mut left = [0.0f64; 2];
            for w in 1..values.len() {
                let (prev_value, prev_label) = values[w - 1];
                left[prev_label as usize] += self.class_weights[prev_label as usize];

                // Only cut between distinct values.
                if values[w].0 <= prev_value {
                    continue;
                }

                let right = [parent_weight[0] - left[0], parent_weight[1] - left[1]];
                let left_total = left[0] + left[1];
                let right_total = right[0] + right[1];
                let decrease = parent_gini
                    - (left_total / parent_total) * gini(&left)
                    - (right_total / parent_total) * gini(&right);

                if decrease > MIN_IMPURITY_DECREASE
                    && best.as_ref().map_or(true, |b| decrease > b.decrease)
                {
                    best = Some(BestSplit {
                        feature,
                        threshold: (prev_value + values[w].0) / 2.0,
                        decrease,
                    });
                }
            }
        }
        best
    }
}

fn gini(weight: &[f64; 2]) -> f64 {
    let total = weight[0] + weight[1];
    if total == 0.0 {
        return 0.0;
    }
    let p0 = weight[0] / total;
    let p1 = weight[1] / total;
    1.0 - p0 * p0 - p1 * p1
}
