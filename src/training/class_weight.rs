//! Balanced class weights for the imbalanced label

use crate::error::{CreditError, Result};
use ndarray::Array1;
use serde::{Deserialize, Serialize};

/// Per-class weights, inversely proportional to class frequency in the
/// training split. The delinquent class is a small minority; without
/// reweighting, training drifts toward always predicting the majority and
/// underestimates default risk.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ClassWeights {
    pub negative: f64,
    pub positive: f64,
}

impl ClassWeights {
    /// Uniform weights (no correction)
    pub fn uniform() -> Self {
        Self {
            negative: 1.0,
            positive: 1.0,
        }
    }

    /// `n_samples / (n_classes * count(class))` per class
    pub fn balanced(y: &Array1<f64>) -> Result<Self> {
        let n = y.len() as f64;
        let n_pos = y.iter().filter(|&&v| v > 0.5).count() as f64;
        let n_neg = n - n_pos;

        if n_pos == 0.0 || n_neg == 0.0 {
            return Err(CreditError::InvalidParameter(
                "balanced class weights require both classes in the training split".to_string(),
            ));
        }

        Ok(Self {
            negative: n / (2.0 * n_neg),
            positive: n / (2.0 * n_pos),
        })
    }

    pub fn weight_for(&self, label: f64) -> f64 {
        if label > 0.5 {
            self.positive
        } else {
            self.negative
        }
    }

    /// Per-sample weight vector aligned with `y`
    pub fn sample_weights(&self, y: &Array1<f64>) -> Array1<f64> {
        y.mapv(|label| self.weight_for(label))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array1;

    #[test]
    fn test_minority_class_gets_larger_weight() {
        // 5% positive
        let y: Array1<f64> = (0..100).map(|i| if i < 5 { 1.0 } else { 0.0 }).collect();
        let weights = ClassWeights::balanced(&y).unwrap();

        assert!(weights.positive > weights.negative);
        assert_eq!(weights.positive, 10.0);
        assert!((weights.negative - 100.0 / 190.0).abs() < 1e-12);
    }

    #[test]
    fn test_balanced_data_gives_unit_weights() {
        let y: Array1<f64> = (0..10).map(|i| (i % 2) as f64).collect();
        let weights = ClassWeights::balanced(&y).unwrap();

        assert_eq!(weights.positive, 1.0);
        assert_eq!(weights.negative, 1.0);
    }

    #[test]
    fn test_single_class_is_an_error() {
        let y = Array1::from_elem(10, 0.0);
        assert!(ClassWeights::balanced(&y).is_err());
    }
}
