//! Bagged tree ensemble
//!
//! Bootstrap-sampled, feature-subsampled decision trees fitted in parallel.
//! Each tree derives its own seed from the forest seed and its index, so the
//! fitted forest is identical regardless of how rayon schedules the work.

use crate::error::{CreditError, Result};
use super::class_weight::ClassWeights;
use super::decision_tree::DecisionTree;
use ndarray::{Array1, Array2};
use rand::seq::SliceRandom;
use rand::RngCore;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RandomForest {
    trees: Vec<DecisionTree>,
    /// Feature indices each tree was fitted on
    feature_indices_per_tree: Vec<Vec<usize>>,
    pub n_estimators: usize,
    pub max_depth: Option<usize>,
    pub min_samples_leaf: usize,
    /// Features sampled per tree; `None` means sqrt(n_features)
    pub max_features: Option<usize>,
    pub class_weights: ClassWeights,
    pub seed: u64,
}

impl RandomForest {
    pub fn new(n_estimators: usize) -> Self {
        Self {
            trees: Vec::new(),
            feature_indices_per_tree: Vec::new(),
            n_estimators,
            max_depth: None,
            min_samples_leaf: 1,
            max_features: None,
            class_weights: ClassWeights::uniform(),
            seed: 42,
        }
    }

    pub fn with_max_depth(mut self, depth: Option<usize>) -> Self {
        self.max_depth = depth;
        self
    }

    pub fn with_min_samples_leaf(mut self, min_samples: usize) -> Self {
        self.min_samples_leaf = min_samples;
        self
    }

    pub fn with_class_weights(mut self, weights: ClassWeights) -> Self {
        self.class_weights = weights;
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn features_per_tree(&self, n_features: usize) -> usize {
        self.max_features
            .unwrap_or_else(|| (n_features as f64).sqrt().ceil() as usize)
            .clamp(1, n_features)
    }

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();
        let n_features = x.ncols();

        if n_samples != y.len() {
            return Err(CreditError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if self.n_estimators == 0 {
            return Err(CreditError::InvalidParameter(
                "n_estimators must be positive".to_string(),
            ));
        }

        let max_features = self.features_per_tree(n_features);
        let base_seed = self.seed;

        let fitted: Vec<Result<(DecisionTree, Vec<usize>)>> = (0..self.n_estimators)
            .into_par_iter()
            .map(|tree_idx| {
                let mut rng = ChaCha8Rng::seed_from_u64(base_seed.wrapping_add(tree_idx as u64));

                // Bootstrap rows
                let sample_indices: Vec<usize> = (0..n_samples)
                    .map(|_| (rng.next_u64() as usize) % n_samples)
                    .collect();

                // Subsample features
                let mut feature_indices: Vec<usize> = (0..n_features).collect();
                feature_indices.shuffle(&mut rng);
                feature_indices.truncate(max_features);
                feature_indices.sort_unstable();

                let x_rows = x.select(ndarray::Axis(0), &sample_indices);
                let x_boot = x_rows.select(ndarray::Axis(1), &feature_indices);
                let y_boot: Array1<f64> =
                    Array1::from_vec(sample_indices.iter().map(|&i| y[i]).collect());

                let mut tree = DecisionTree::new_classifier()
                    .with_min_samples_leaf(self.min_samples_leaf)
                    .with_class_weights(self.class_weights);
                if let Some(depth) = self.max_depth {
                    tree = tree.with_max_depth(depth);
                }

                tree.fit(&x_boot, &y_boot)?;
                Ok((tree, feature_indices))
            })
            .collect();

        let mut trees = Vec::with_capacity(self.n_estimators);
        let mut feature_indices_per_tree = Vec::with_capacity(self.n_estimators);
        for result in fitted {
            let (tree, features) = result?;
            trees.push(tree);
            feature_indices_per_tree.push(features);
        }

        self.trees = trees;
        self.feature_indices_per_tree = feature_indices_per_tree;

        Ok(self)
    }

    /// Positive-class probability: fraction of trees voting delinquent
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        if self.trees.is_empty() {
            return Err(CreditError::NotFitted);
        }

        let votes: Vec<Array1<f64>> = self
            .trees
            .par_iter()
            .zip(self.feature_indices_per_tree.par_iter())
            .map(|(tree, features)| {
                let x_sub = x.select(ndarray::Axis(1), features);
                tree.predict(&x_sub)
            })
            .collect::<Result<Vec<_>>>()?;

        let n_trees = votes.len() as f64;
        let proba: Vec<f64> = (0..x.nrows())
            .map(|i| votes.iter().map(|v| v[i]).sum::<f64>() / n_trees)
            .collect();

        Ok(Array1::from_vec(proba))
    }

    /// Class labels at the 0.5 threshold
    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let proba = self.predict_proba(x)?;
        Ok(proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 }))
    }

    pub fn n_trees(&self) -> usize {
        self.trees.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn two_clusters() -> (Array2<f64>, Array1<f64>) {
        let x = array![
            [0.0, 0.0],
            [0.1, 0.1],
            [0.2, 0.2],
            [0.3, 0.1],
            [1.0, 1.0],
            [1.1, 1.1],
            [1.2, 1.2],
            [1.3, 1.1],
        ];
        let y = array![0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 1.0, 1.0];
        (x, y)
    }

    #[test]
    fn test_separates_clusters() {
        let (x, y) = two_clusters();
        let mut forest = RandomForest::new(25).with_seed(42);
        forest.fit(&x, &y).unwrap();

        let predictions = forest.predict(&x).unwrap();
        let correct = predictions
            .iter()
            .zip(y.iter())
            .filter(|(p, t)| (*p - *t).abs() < 0.5)
            .count();
        assert!(correct >= 7, "only {correct}/8 correct");
    }

    #[test]
    fn test_probabilities_are_vote_fractions() {
        let (x, y) = two_clusters();
        let mut forest = RandomForest::new(25).with_seed(42);
        forest.fit(&x, &y).unwrap();

        for &p in forest.predict_proba(&x).unwrap().iter() {
            assert!((0.0..=1.0).contains(&p));
        }
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (x, y) = two_clusters();

        let mut a = RandomForest::new(25).with_seed(7);
        a.fit(&x, &y).unwrap();
        let mut b = RandomForest::new(25).with_seed(7);
        b.fit(&x, &y).unwrap();

        assert_eq!(a.predict_proba(&x).unwrap(), b.predict_proba(&x).unwrap());
    }

    #[test]
    fn test_predict_before_fit_fails() {
        let forest = RandomForest::new(10);
        assert!(matches!(
            forest.predict(&array![[0.0, 0.0]]),
            Err(CreditError::NotFitted)
        ));
    }
}
