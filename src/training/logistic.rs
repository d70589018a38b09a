//! Regularized logistic regression
//!
//! The fast, interpretable baseline family. Fitted by gradient descent on the
//! weighted log loss; regularization follows the inverse-strength convention,
//! so larger `c` means a weaker penalty.

use crate::error::{CreditError, Result};
use super::class_weight::ClassWeights;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogisticRegression {
    pub coefficients: Option<Array1<f64>>,
    pub intercept: Option<f64>,
    /// Inverse regularization strength
    pub c: f64,
    pub max_iter: usize,
    pub tol: f64,
    pub learning_rate: f64,
    pub class_weights: ClassWeights,
    pub is_fitted: bool,
}

impl Default for LogisticRegression {
    fn default() -> Self {
        Self::new(1.0)
    }
}

impl LogisticRegression {
    pub fn new(c: f64) -> Self {
        Self {
            coefficients: None,
            intercept: None,
            c,
            max_iter: 1000,
            tol: 1e-6,
            learning_rate: 0.1,
            class_weights: ClassWeights::uniform(),
            is_fitted: false,
        }
    }

    pub fn with_class_weights(mut self, weights: ClassWeights) -> Self {
        self.class_weights = weights;
        self
    }

    pub fn with_max_iter(mut self, max_iter: usize) -> Self {
        self.max_iter = max_iter;
        self
    }

    fn sigmoid(z: &Array1<f64>) -> Array1<f64> {
        z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
    }

    /// Fit by gradient descent on the class-weighted log loss
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(CreditError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.c <= 0.0 {
            return Err(CreditError::InvalidParameter(format!(
                "c must be positive, got {}",
                self.c
            )));
        }

        let sample_weights = self.class_weights.sample_weights(y);
        let weight_total = sample_weights.sum();
        let alpha = 1.0 / (self.c * n_samples as f64);

        let mut weights = Array1::zeros(n_features);
        let mut bias = 0.0;
        let lr = self.learning_rate;

        for _iter in 0..self.max_iter {
            let linear = x.dot(&weights) + bias;
            let predictions = Self::sigmoid(&linear);

            let weighted_errors: Array1<f64> = (&predictions - y) * &sample_weights;
            let dw = (x.t().dot(&weighted_errors) / weight_total) + alpha * &weights;
            let db = weighted_errors.sum() / weight_total;

            let grad_norm = (dw.mapv(|v| v * v).sum() + db * db).sqrt();
            if grad_norm < self.tol {
                break;
            }

            weights = weights - lr * dw;
            bias -= lr * db;
        }

        self.coefficients = Some(weights);
        self.intercept = Some(bias);
        self.is_fitted = true;

        Ok(self)
    }

    /// Positive-class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let coefficients = self.coefficients.as_ref().ok_or(CreditError::NotFitted)?;
        let intercept = self.intercept.unwrap_or(0.0);

        let linear = x.dot(coefficients) + intercept;
        Ok(Self::sigmoid(&linear))
    }

    /// Class labels at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn separable_data() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [-2.0, -1.5],
            [-1.8, -2.0],
            [-1.2, -1.0],
            [-0.8, -1.4],
            [1.0, 1.2],
            [1.4, 0.9],
            [1.8, 2.0],
            [2.2, 1.6],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separates_clean_classes() {
        let (x, y) = separable_data();
        let mut model = LogisticRegression::new(1.0);
        model.fit(&x, &y).unwrap();

        let predictions = model.predict(&x).unwrap();
        assert_eq!(predictions, y);
    }

    #[test]
    fn test_probabilities_in_unit_interval() {
        let (x, y) = separable_data();
        let mut model = LogisticRegression::new(5.0);
        model.fit(&x, &y).unwrap();

        for &p in model.predict_proba(&x).unwrap().iter() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_class_weights_shift_the_boundary() {
        // Imbalanced data: one positive among many negatives
        let x = array![
            [-1.0], [-0.9], [-0.8], [-0.7], [-0.6], [-0.5], [0.0], [0.9]
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0];

        let mut unweighted = LogisticRegression::new(1.0);
        unweighted.fit(&x, &y).unwrap();

        let weights = ClassWeights::balanced(&y).unwrap();
        let mut weighted = LogisticRegression::new(1.0).with_class_weights(weights);
        weighted.fit(&x, &y).unwrap();

        // Upweighting the rare positive raises its predicted probability
        let probe = array![[0.5]];
        let p_unweighted = unweighted.predict_proba(&probe).unwrap()[0];
        let p_weighted = weighted.predict_proba(&probe).unwrap()[0];
        assert!(p_weighted > p_unweighted);
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let model = LogisticRegression::new(1.0);
        let x = array![[0.0]];
        assert!(matches!(
            model.predict_proba(&x),
            Err(CreditError::NotFitted)
        ));
    }

    #[test]
    fn test_invalid_c_rejected() {
        let (x, y) = separable_data();
        let mut model = LogisticRegression::new(0.0);
        assert!(model.fit(&x, &y).is_err());
    }
}
