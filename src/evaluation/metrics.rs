//! Numeric evaluation of held-out predictions.
//!
//! Pure functions only: confusion counts, precision/recall/F1, a ROC sweep
//! over distinct score thresholds and trapezoidal AUC. Rendering is the
//! caller's problem; this module returns plain numbers.

use crate::dataset::{class_counts, validate_labels};
use crate::error::PipelineError;
use serde::{Deserialize, Serialize};

/// Score threshold used when deriving hard labels from scores.
pub const DECISION_THRESHOLD: f64 = 0.5;

/// Binary confusion counts (anomaly = positive class).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfusionMatrix {
    pub true_positives: usize,
    pub false_positives: usize,
    pub true_negatives: usize,
    pub false_negatives: usize,
}

impl ConfusionMatrix {
    pub fn total(&self) -> usize {
        self.true_positives + self.false_positives + self.true_negatives + self.false_negatives
    }
}

/// One point on the ROC curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RocPoint {
    pub fpr: f64,
    pub tpr: f64,
}

/// Numeric evaluation of one prediction set. Produced fresh per call,
/// never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub confusion: ConfusionMatrix,
    /// ROC points ordered by descending threshold, anchored at (0,0) and (1,1).
    pub roc: Vec<RocPoint>,
    /// Precision of the anomaly class.
    pub precision: f64,
    /// Recall of the anomaly class.
    pub recall: f64,
    /// F1 of the anomaly class.
    pub f1: f64,
    /// Unweighted mean of per-class F1 scores.
    pub f1_macro: f64,
    pub accuracy: f64,
    /// Area under the ROC curve, trapezoidal.
    pub auc: f64,
}

/// Evaluate predictions against true labels.
///
/// When `predicted_labels` is `None`, hard labels are derived by
/// thresholding `scores` at [`DECISION_THRESHOLD`].
///
/// Both classes must be present in `true_labels`; ROC and AUC are undefined
/// otherwise and the call fails with an insufficient-samples error.
pub fn evaluate(
    true_labels: &[u8],
    predicted_labels: Option<&[u8]>,
    scores: &[f64],
) -> Result<EvaluationResult, PipelineError> {
    validate_labels(true_labels, scores.len())?;
    if let Some(&bad) = scores.iter().find(|s| !s.is_finite()) {
        return Err(PipelineError::Domain {
            column: "score".to_string(),
            value: bad,
        });
    }

    let (negatives, positives) = class_counts(true_labels);
    if positives == 0 || negatives == 0 {
        let class = if positives == 0 { 1 } else { 0 };
        return Err(PipelineError::InsufficientSamples {
            class,
            count: 0,
            required: 1,
        });
    }

    let derived: Vec<u8>;
    let predicted = match predicted_labels {
        Some(p) => {
            validate_labels(p, true_labels.len())?;
            p
        }
        None => {
            derived = scores
                .iter()
                .map(|&s| u8::from(s >= DECISION_THRESHOLD))
                .collect();
            &derived
        }
    };

    let confusion = confusion_matrix(true_labels, predicted);
    let precision = ratio(
        confusion.true_positives,
        confusion.true_positives + confusion.false_positives,
    );
    let recall = ratio(
        confusion.true_positives,
        confusion.true_positives + confusion.false_negatives,
    );
    let f1 = harmonic(precision, recall);

    // F1 of the normal class, for the macro average.
    let precision0 = ratio(
        confusion.true_negatives,
        confusion.true_negatives + confusion.false_negatives,
    );
    let recall0 = ratio(
        confusion.true_negatives,
        confusion.true_negatives + confusion.false_positives,
    );
    let f1_macro = (f1 + harmonic(precision0, recall0)) / 2.0;

    let accuracy = ratio(
        confusion.true_positives + confusion.true_negatives,
        confusion.total(),
    );

    let roc = roc_curve(true_labels, scores, positives, negatives);
    let auc = trapezoid_area(&roc);

    Ok(EvaluationResult {
        confusion,
        roc,
        precision,
        recall,
        f1,
        f1_macro,
        accuracy,
        auc,
    })
}

fn confusion_matrix(true_labels: &[u8], predicted: &[u8]) -> ConfusionMatrix {
    let mut cm = ConfusionMatrix {
        true_positives: 0,
        false_positives: 0,
        true_negatives: 0,
        false_negatives: 0,
    };
    for (&t, &p) in true_labels.iter().zip(predicted.iter()) {
        match (t, p) {
            (1, 1) => cm.true_positives += 1,
            (0, 1) => cm.false_positives += 1,
            (0, 0) => cm.true_negatives += 1,
            _ => cm.false_negatives += 1,
        }
    }
    cm
}

/// Sweep the decision threshold across distinct score values descending.
/// Tied scores fall into the same threshold step, so the curve gets one
/// point per distinct score value plus the (0,0) anchor.
fn roc_curve(true_labels: &[u8], scores: &[f64], positives: usize, negatives: usize) -> Vec<RocPoint> {
    let mut order: Vec<usize> = (0..scores.len()).collect();
    order.sort_by(|&a, &b| {
        scores[b]
            .partial_cmp(&scores[a])
            .unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut points = vec![RocPoint { fpr: 0.0, tpr: 0.0 }];
    let mut tp = 0usize;
    let mut fp = 0usize;
    for (rank, &i) in order.iter().enumerate() {
        if true_labels[i] == 1 {
            tp += 1;
        } else {
            fp += 1;
        }
        let at_tie_boundary =
            rank + 1 == order.len() || scores[order[rank + 1]] < scores[i];
        if at_tie_boundary {
            points.push(RocPoint {
                fpr: fp as f64 / negatives as f64,
                tpr: tp as f64 / positives as f64,
            });
        }
    }
    points
}

fn trapezoid_area(points: &[RocPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| (w[1].fpr - w[0].fpr) * (w[0].tpr + w[1].tpr) / 2.0)
        .sum()
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn harmonic(precision: f64, recall: f64) -> f64 {
    if precision + recall == 0.0 {
        0.0
    } else {
        2.0 * precision * recall / (precision + recall)
    }
}
