//! Boosted tree ensemble
//!
//! Binary log-odds boosting on shallow regression trees with shrinkage and
//! optional row subsampling. This family takes no class weights; it relies on
//! its own shrinkage regularization instead.

use crate::error::{CreditError, Result};
use super::decision_tree::DecisionTree;
use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingConfig {
    /// Number of boosting rounds
    pub n_estimators: usize,
    /// Shrinkage applied to every tree's contribution
    pub learning_rate: f64,
    pub max_depth: usize,
    pub min_samples_leaf: usize,
    /// Row subsample ratio per round; 1.0 uses every row
    pub subsample: f64,
    pub seed: u64,
}

impl Default for GradientBoostingConfig {
    fn default() -> Self {
        Self {
            n_estimators: 100,
            learning_rate: 0.1,
            max_depth: 3,
            min_samples_leaf: 1,
            subsample: 1.0,
            seed: 42,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GradientBoostingClassifier {
    config: GradientBoostingConfig,
    trees: Vec<DecisionTree>,
    initial_log_odds: f64,
}

impl GradientBoostingClassifier {
    pub fn new(config: GradientBoostingConfig) -> Self {
        Self {
            config,
            trees: Vec::new(),
            initial_log_odds: 0.0,
        }
    }

    /// Fit by boosting regression trees on the log-loss gradient
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(CreditError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if !(0.0..=1.0).contains(&self.config.subsample) || self.config.subsample == 0.0 {
            return Err(CreditError::InvalidParameter(format!(
                "subsample must be in (0, 1], got {}",
                self.config.subsample
            )));
        }

        let p = y.mean().unwrap_or(0.5).clamp(1e-10, 1.0 - 1e-10);
        self.initial_log_odds = (p / (1.0 - p)).ln();

        let mut log_odds = Array1::from_elem(n_samples, self.initial_log_odds);
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(self.config.seed);

        self.trees = Vec::with_capacity(self.config.n_estimators);

        for _round in 0..self.config.n_estimators {
            let probs: Array1<f64> = log_odds.mapv(|lo| 1.0 / (1.0 + (-lo).exp()));

            // Gradient of the log loss
            let residuals: Array1<f64> = y - &probs;

            let sample_indices = self.subsample_indices(n_samples, &mut rng);
            let x_sub = x.select(ndarray::Axis(0), &sample_indices);
            let r_sub: Array1<f64> =
                Array1::from_vec(sample_indices.iter().map(|&i| residuals[i]).collect());

            let mut tree = DecisionTree::new_regressor()
                .with_max_depth(self.config.max_depth)
                .with_min_samples_leaf(self.config.min_samples_leaf);
            tree.fit(&x_sub, &r_sub)?;

            // Update every row, not just the subsample
            let tree_pred = tree.predict(x)?;
            for i in 0..n_samples {
                log_odds[i] += self.config.learning_rate * tree_pred[i];
            }

            self.trees.push(tree);
        }

        Ok(self)
    }

    fn subsample_indices(&self, n: usize, rng: &mut Xoshiro256PlusPlus) -> Vec<usize> {
        if self.config.subsample >= 1.0 {
            return (0..n).collect();
        }
        let sample_size = ((n as f64) * self.config.subsample).ceil() as usize;
        let mut indices: Vec<usize> = (0..n).collect();
        indices.shuffle(rng);
        indices.truncate(sample_size);
        indices.sort_unstable();
        indices
    }

    /// Positive-class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(CreditError::NotFitted);
        }

        let n = x.nrows();
        let mut log_odds = Array1::from_elem(n, self.initial_log_odds);

        for tree in &self.trees {
            let tree_pred = tree.predict(x)?;
            for i in 0..n {
                log_odds[i] += self.config.learning_rate * tree_pred[i];
            }
        }

        Ok(log_odds.mapv(|lo| 1.0 / (1.0 + (-lo).exp())))
    }

    /// Class labels at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn config(&self) -> &GradientBoostingConfig {
        &self.config
    }
}
