//! Classification metrics

use crate::error::{CreditError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Test-split metrics for one candidate
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassificationMetrics {
    pub auc_roc: f64,
    pub accuracy: f64,
    pub f1: f64,
    pub precision: f64,
    pub recall: f64,
}

impl ClassificationMetrics {
    /// Compute all metrics from true labels and predicted positive-class
    /// probabilities. Labels are thresholded at 0.5 for the threshold-bound
    /// metrics; AUC uses the raw probabilities.
    pub fn compute(y_true: &Array1<f64>, y_proba: &Array1<f64>) -> Result<Self> {
        if y_true.len() != y_proba.len() {
            return Err(CreditError::ShapeError {
                expected: format!("{} probabilities", y_true.len()),
                actual: format!("{}", y_proba.len()),
            });
        }

        let y_pred: Array1<f64> = y_proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 });
        let (tp, fp, tn, fn_) = confusion_counts(y_true, &y_pred);

        let accuracy = (tp + tn) as f64 / y_true.len() as f64;
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };

        Ok(Self {
            auc_roc: roc_auc(y_true, y_proba)?,
            accuracy,
            f1,
            precision,
            recall,
        })
    }
}

fn confusion_counts(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> (usize, usize, usize, usize) {
    let mut tp = 0;
    let mut fp = 0;
    let mut tn = 0;
    let mut fn_ = 0;

    for (t, p) in y_true.iter().zip(y_pred.iter()) {
        match (*t > 0.5, *p > 0.5) {
            (true, true) => tp += 1,
            (false, true) => fp += 1,
            (false, false) => tn += 1,
            (true, false) => fn_ += 1,
        }
    }

    (tp, fp, tn, fn_)
}

/// Area under the ROC curve via the rank-sum (Mann-Whitney) statistic, with
/// average ranks for tied scores. Threshold-independent, so it stays
/// meaningful under the label imbalance this dataset carries.
pub fn roc_auc(y_true: &Array1<f64>, y_score: &Array1<f64>) -> Result<f64> {
    let n = y_true.len();
    let n_pos = y_true.iter().filter(|&&y| y > 0.5).count();
    let n_neg = n - n_pos;

    if n_pos == 0 || n_neg == 0 {
        return Err(CreditError::InvalidParameter(
            "AUC-ROC requires both classes to be present".to_string(),
        ));
    }

    let mut order: Vec<usize> = (0..n).collect();
    order.sort_by(|&a, &b| y_score[a].total_cmp(&y_score[b]));

    // Assign average ranks across runs of equal scores
    let mut ranks = vec![0.0f64; n];
    let mut i = 0;
    while i < n {
        let mut j = i;
        while j + 1 < n && y_score[order[j + 1]] == y_score[order[i]] {
            j += 1;
        }
        let avg_rank = (i + j + 2) as f64 / 2.0; // ranks are 1-based
        for &idx in &order[i..=j] {
            ranks[idx] = avg_rank;
        }
        i = j + 1;
    }

    let rank_sum_pos: f64 = y_true
        .iter()
        .zip(ranks.iter())
        .filter(|(&y, _)| y > 0.5)
        .map(|(_, &r)| r)
        .sum();

    let auc = (rank_sum_pos - (n_pos * (n_pos + 1)) as f64 / 2.0) / (n_pos * n_neg) as f64;
    Ok(auc)
}

/// Per-class precision/recall/F1 breakdown for the final report
#[derive(Debug, Clone)]
pub struct ClassReport {
    pub class: u8,
    pub precision: f64,
    pub recall: f64,
    pub f1: f64,
    pub support: usize,
}

/// Classification report: one entry per class, positive class last
pub fn classification_report(y_true: &Array1<f64>, y_pred: &Array1<f64>) -> Vec<ClassReport> {
    let (tp, fp, tn, fn_) = confusion_counts(y_true, y_pred);

    let entry = |tp: usize, fp: usize, fn_: usize, support: usize, class: u8| {
        let precision = if tp + fp > 0 {
            tp as f64 / (tp + fp) as f64
        } else {
            0.0
        };
        let recall = if tp + fn_ > 0 {
            tp as f64 / (tp + fn_) as f64
        } else {
            0.0
        };
        let f1 = if precision + recall > 0.0 {
            2.0 * precision * recall / (precision + recall)
        } else {
            0.0
        };
        ClassReport {
            class,
            precision,
            recall,
            f1,
            support,
        }
    };

    // For class 0 the roles of the confusion cells flip
    vec![
        entry(tn, fn_, fp, tn + fp, 0),
        entry(tp, fp, fn_, tp + fn_, 1),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_perfect_ranking_auc_is_one() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_score = array![0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&y_true, &y_score).unwrap(), 1.0);
    }

    #[test]
    fn test_reversed_ranking_auc_is_zero() {
        let y_true = array![1.0, 1.0, 0.0, 0.0];
        let y_score = array![0.1, 0.2, 0.8, 0.9];
        assert_eq!(roc_auc(&y_true, &y_score).unwrap(), 0.0);
    }

    #[test]
    fn test_tied_scores_average_ranks() {
        // All scores equal: AUC must be exactly 0.5
        let y_true = array![0.0, 1.0, 0.0, 1.0];
        let y_score = array![0.5, 0.5, 0.5, 0.5];
        assert_eq!(roc_auc(&y_true, &y_score).unwrap(), 0.5);
    }

    #[test]
    fn test_single_class_is_an_error() {
        let y_true = array![1.0, 1.0];
        let y_score = array![0.4, 0.6];
        assert!(roc_auc(&y_true, &y_score).is_err());
    }

    #[test]
    fn test_metrics_on_clean_separation() {
        let y_true = array![0.0, 0.0, 1.0, 1.0];
        let y_proba = array![0.1, 0.2, 0.8, 0.9];

        let m = ClassificationMetrics::compute(&y_true, &y_proba).unwrap();
        assert_eq!(m.accuracy, 1.0);
        assert_eq!(m.precision, 1.0);
        assert_eq!(m.recall, 1.0);
        assert_eq!(m.f1, 1.0);
        assert_eq!(m.auc_roc, 1.0);
    }

    #[test]
    fn test_classification_report_supports() {
        let y_true = array![0.0, 0.0, 0.0, 1.0];
        let y_pred = array![0.0, 0.0, 1.0, 1.0];

        let report = classification_report(&y_true, &y_pred);
        assert_eq!(report[0].support, 3);
        assert_eq!(report[1].support, 1);
        assert_eq!(report[1].recall, 1.0);
        assert_eq!(report[1].precision, 0.5);
    }
}
