//! Decision tree, the base learner for both tree ensembles
//!
//! Two flavors share the implementation: a Gini classifier with optional
//! class-weighted impurity (used by the bagged forest) and a variance-
//! reduction regressor (used as the boosting base learner).

use crate::error::{CreditError, Result};
use super::class_weight::ClassWeights;
use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Tree node
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TreeNode {
    Leaf {
        value: f64,
        n_samples: usize,
    },
    Split {
        feature_idx: usize,
        threshold: f64,
        left: Box<TreeNode>,
        right: Box<TreeNode>,
        n_samples: usize,
    },
}

/// Split quality criterion
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Criterion {
    /// Class-weighted Gini impurity (classification)
    Gini,
    /// Variance reduction (regression / boosting residuals)
    Variance,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DecisionTree {
    root: Option<TreeNode>,
    pub max_depth: Option<usize>,
    pub min_samples_split: usize,
    pub min_samples_leaf: usize,
    pub criterion: Criterion,
    /// Class weights applied to impurity and leaf votes (Gini only)
    pub class_weights: ClassWeights,
    n_features: usize,
}

impl DecisionTree {
    pub fn new_classifier() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Gini,
            class_weights: ClassWeights::uniform(),
            n_features: 0,
        }
    }

    pub fn new_regressor() -> Self {
        Self {
            root: None,
            max_depth: None,
            min_samples_split: 2,
            min_samples_leaf: 1,
            criterion: Criterion::Variance,
            class_weights: ClassWeights::uniform(),
            n_features: 0,
        }
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_min_samples_split(mut self, min_samples: usize) -> Self {
        self.min_samples_split = min_samples;
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

    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<&mut Self> {
        let n_samples = x.nrows();

        if n_samples != y.len() {
            return Err(CreditError::ShapeError {
                expected: format!("y length = {n_samples}"),
                actual: format!("y length = {}", y.len()),
            });
        }
        if n_samples < self.min_samples_split {
            return Err(CreditError::InvalidParameter(format!(
                "need at least {} samples, got {n_samples}",
                self.min_samples_split
            )));
        }

        self.n_features = x.ncols();
        let indices: Vec<usize> = (0..n_samples).collect();
        self.root = Some(self.build_tree(x, y, &indices, 0));

        Ok(self)
    }

    fn build_tree(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize], depth: usize) -> TreeNode {
        let n_samples = indices.len();
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();

        let should_stop = n_samples < self.min_samples_split
            || n_samples <= self.min_samples_leaf
            || self.max_depth.map_or(false, |d| depth >= d)
            || is_pure(&y_subset);

        if should_stop {
            return TreeNode::Leaf {
                value: self.leaf_value(&y_subset),
                n_samples,
            };
        }

        let Some((feature_idx, threshold)) = self.find_best_split(x, y, indices) else {
            return TreeNode::Leaf {
                value: self.leaf_value(&y_subset),
                n_samples,
            };
        };

        let (left_indices, right_indices): (Vec<usize>, Vec<usize>) = indices
            .iter()
            .partition(|&&i| x[[i, feature_idx]] <= threshold);

        if left_indices.len() < self.min_samples_leaf || right_indices.len() < self.min_samples_leaf {
            return TreeNode::Leaf {
                value: self.leaf_value(&y_subset),
                n_samples,
            };
        }

        let left = Box::new(self.build_tree(x, y, &left_indices, depth + 1));
        let right = Box::new(self.build_tree(x, y, &right_indices, depth + 1));

        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            n_samples,
        }
    }

    /// Scan every feature in parallel; each feature independently finds its
    /// best threshold, then the global best gain wins.
    fn find_best_split(&self, x: &Array2<f64>, y: &Array1<f64>, indices: &[usize]) -> Option<(usize, f64)> {
        let y_subset: Vec<f64> = indices.iter().map(|&i| y[i]).collect();
        let parent_impurity = self.impurity(&y_subset);

        let feature_results: Vec<Option<(usize, f64, f64)>> = (0..x.ncols())
            .into_par_iter()
            .map(|feature_idx| {
                let mut values: Vec<f64> = indices.iter().map(|&i| x[[i, feature_idx]]).collect();
                values.sort_by(|a, b| a.total_cmp(b));
                values.dedup();

                let mut best_gain = 0.0f64;
                let mut best_threshold = None;

                for window in values.windows(2) {
                    let threshold = (window[0] + window[1]) / 2.0;
                    let mut left = SideStats::new();
                    let mut right = SideStats::new();

                    for &idx in indices {
                        let stats = if x[[idx, feature_idx]] <= threshold {
                            &mut left
                        } else {
                            &mut right
                        };
                        stats.add(y[idx], &self.class_weights);
                    }

                    if left.count < self.min_samples_leaf || right.count < self.min_samples_leaf {
                        continue;
                    }

                    let n = indices.len() as f64;
                    let weighted_impurity = (left.count as f64 * self.side_impurity(&left)
                        + right.count as f64 * self.side_impurity(&right))
                        / n;

                    let gain = parent_impurity - weighted_impurity;
                    if gain > best_gain {
                        best_gain = gain;
                        best_threshold = Some(threshold);
                    }
                }

                best_threshold.map(|t| (feature_idx, t, best_gain))
            })
            .collect();

        feature_results
            .into_iter()
            .flatten()
            .max_by(|a, b| {
                // Exact gain comparison; lower feature index wins ties so the
                // tree is identical regardless of worker count
                a.2.total_cmp(&b.2).then(b.0.cmp(&a.0))
            })
            .map(|(feature_idx, threshold, _)| (feature_idx, threshold))
    }

    fn side_impurity(&self, stats: &SideStats) -> f64 {
        match self.criterion {
            Criterion::Gini => stats.gini(),
            Criterion::Variance => stats.variance(),
        }
    }

    fn impurity(&self, y: &[f64]) -> f64 {
        let mut stats = SideStats::new();
        for &v in y {
            stats.add(v, &self.class_weights);
        }
        self.side_impurity(&stats)
    }

    fn leaf_value(&self, y: &[f64]) -> f64 {
        if y.is_empty() {
            return 0.0;
        }
        match self.criterion {
            // Class-weighted majority vote
            Criterion::Gini => {
                let mut stats = SideStats::new();
                for &v in y {
                    stats.add(v, &self.class_weights);
                }
                if stats.class_weight[1] > stats.class_weight[0] {
                    1.0
                } else {
                    0.0
                }
            }
            Criterion::Variance => y.iter().sum::<f64>() / y.len() as f64,
        }
    }

    pub fn predict(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        let root = self.root.as_ref().ok_or(CreditError::NotFitted)?;
        if x.ncols() != self.n_features {
            return Err(CreditError::ShapeError {
                expected: format!("{} features", self.n_features),
                actual: format!("{} features", x.ncols()),
            });
        }

        let predictions: Vec<f64> = (0..x.nrows())
            .map(|i| {
                let sample = x.row(i).to_vec();
                predict_sample(root, &sample)
            })
            .collect();

        Ok(Array1::from_vec(predictions))
    }

    pub fn depth(&self) -> usize {
        fn node_depth(node: &TreeNode) -> usize {
            match node {
                TreeNode::Leaf { .. } => 1,
                TreeNode::Split { left, right, .. } => 1 + node_depth(left).max(node_depth(right)),
            }
        }
        self.root.as_ref().map_or(0, node_depth)
    }
}

fn predict_sample(node: &TreeNode, sample: &[f64]) -> f64 {
    match node {
        TreeNode::Leaf { value, .. } => *value,
        TreeNode::Split {
            feature_idx,
            threshold,
            left,
            right,
            ..
        } => {
            if sample[*feature_idx] <= *threshold {
                predict_sample(left, sample)
            } else {
                predict_sample(right, sample)
            }
        }
    }
}

fn is_pure(y: &[f64]) -> bool {
    y.first().map_or(true, |&first| {
        y.iter().all(|&v| (v - first).abs() < 1e-12)
    })
}

/// Running statistics for one side of a candidate split: weighted class
/// totals for Gini, raw moments for variance.
struct SideStats {
    count: usize,
    class_weight: [f64; 2],
    sum: f64,
    sq_sum: f64,
}

impl SideStats {
    fn new() -> Self {
        Self {
            count: 0,
            class_weight: [0.0, 0.0],
            sum: 0.0,
            sq_sum: 0.0,
        }
    }

    fn add(&mut self, label: f64, weights: &ClassWeights) {
        self.count += 1;
        self.class_weight[usize::from(label > 0.5)] += weights.weight_for(label);
        self.sum += label;
        self.sq_sum += label * label;
    }

    fn gini(&self) -> f64 {
        let total = self.class_weight[0] + self.class_weight[1];
        if total == 0.0 {
            return 0.0;
        }
        let p0 = self.class_weight[0] / total;
        let p1 = self.class_weight[1] / total;
        1.0 - p0 * p0 - p1 * p1
    }

    fn variance(&self) -> f64 {
        if self.count == 0 {
            return 0.0;
        }
        let n = self.count as f64;
        self.sq_sum / n - (self.sum / n).powi(2)
    }
}
