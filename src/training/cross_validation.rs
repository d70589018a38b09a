//! Stratified k-fold cross-validation

use crate::error::{CreditError, Result};
use ndarray::Array1;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// A single train/validation split
#[derive(Debug, Clone)]
pub struct CvSplit {
    pub train_indices: Vec<usize>,
    pub validation_indices: Vec<usize>,
    pub fold_idx: usize,
}

/// Stratified k-fold splitter: samples are grouped by class and dealt to
/// folds round-robin, so every fold keeps both classes even when the
/// positive class is rare.
pub struct StratifiedKFold {
    n_splits: usize,
    seed: u64,
}

impl StratifiedKFold {
    pub fn new(n_splits: usize, seed: u64) -> Self {
        Self { n_splits, seed }
    }

    pub fn split(&self, y: &Array1<f64>) -> Result<Vec<CvSplit>> {
        if self.n_splits < 2 {
            return Err(CreditError::InvalidParameter(
                "n_splits must be at least 2".to_string(),
            ));
        }
        if y.len() < self.n_splits {
            return Err(CreditError::InvalidParameter(format!(
                "n_samples ({}) must be >= n_splits ({})",
                y.len(),
                self.n_splits
            )));
        }

        let mut rng = ChaCha8Rng::seed_from_u64(self.seed);

        // Group and shuffle within each class
        let mut class_indices: Vec<Vec<usize>> = vec![Vec::new(), Vec::new()];
        for (idx, &label) in y.iter().enumerate() {
            let class = usize::from(label > 0.5);
            class_indices[class].push(idx);
        }
        for indices in class_indices.iter_mut() {
            indices.shuffle(&mut rng);
        }

        // Deal samples from each class to folds round-robin
        let mut folds: Vec<Vec<usize>> = vec![Vec::new(); self.n_splits];
        for indices in &class_indices {
            for (i, &idx) in indices.iter().enumerate() {
                folds[i % self.n_splits].push(idx);
            }
        }

        let mut splits = Vec::with_capacity(self.n_splits);
        for fold_idx in 0..self.n_splits {
            let mut validation_indices = folds[fold_idx].clone();
            let mut train_indices: Vec<usize> = folds
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != fold_idx)
                .flat_map(|(_, f)| f.iter().copied())
                .collect();

            validation_indices.sort_unstable();
            train_indices.sort_unstable();

            splits.push(CvSplit {
                train_indices,
                validation_indices,
                fold_idx,
            });
        }

        Ok(splits)
    }
}

/// Per-fold scores of one candidate configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CvScores {
    pub scores: Vec<f64>,
    pub mean: f64,
    pub std: f64,
}

impl CvScores {
    pub fn from_scores(scores: Vec<f64>) -> Self {
        let n = scores.len() as f64;
        let mean = scores.iter().sum::<f64>() / n;
        let variance = scores.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / n;

        Self {
            scores,
            mean,
            std: variance.sqrt(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_folds_cover_all_samples_once() {
        let y: Array1<f64> = (0..30).map(|i| if i < 6 { 1.0 } else { 0.0 }).collect();
        let splits = StratifiedKFold::new(3, 42).split(&y).unwrap();

        assert_eq!(splits.len(), 3);

        let mut all_validation: Vec<usize> = splits
            .iter()
            .flat_map(|s| s.validation_indices.clone())
            .collect();
        all_validation.sort_unstable();
        assert_eq!(all_validation, (0..30).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_fold_sees_both_classes() {
        let y: Array1<f64> = (0..30).map(|i| if i < 6 { 1.0 } else { 0.0 }).collect();
        let splits = StratifiedKFold::new(3, 42).split(&y).unwrap();

        for split in &splits {
            let positives = split
                .validation_indices
                .iter()
                .filter(|&&i| y[i] > 0.5)
                .count();
            assert_eq!(positives, 2);
        }
    }

    #[test]
    fn test_split_is_deterministic() {
        let y: Array1<f64> = (0..24).map(|i| (i % 4 == 0) as u8 as f64).collect();
        let a = StratifiedKFold::new(3, 7).split(&y).unwrap();
        let b = StratifiedKFold::new(3, 7).split(&y).unwrap();

        for (sa, sb) in a.iter().zip(b.iter()) {
            assert_eq!(sa.train_indices, sb.train_indices);
            assert_eq!(sa.validation_indices, sb.validation_indices);
        }
    }

    #[test]
    fn test_cv_scores_mean_and_std() {
        let scores = CvScores::from_scores(vec![0.8, 0.9, 1.0]);
        assert!((scores.mean - 0.9).abs() < 1e-12);
        assert!(scores.std > 0.0);
    }
}
