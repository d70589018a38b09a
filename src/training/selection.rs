//! Candidate families and cross-validated model selection
//!
//! Each family is searched over a small hyperparameter grid with stratified
//! k-fold cross-validation scored by AUC-ROC; the best configuration per
//! family is refit on the full training split. Preprocessing is fitted inside
//! every fold, so validation rows never leak into the fitted parameters.

use crate::data::TrainingData;
use crate::error::{CreditError, Result};
use crate::pipeline::{CandidatePipeline, Classifier};
use super::class_weight::ClassWeights;
use super::cross_validation::{CvScores, StratifiedKFold};
use super::gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
use super::logistic::LogisticRegression;
use super::metrics::roc_auc;
use super::random_forest::RandomForest;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::info;

/// Fixed seed shared by every stochastic estimator in a training run
pub const DEFAULT_SEED: u64 = 42;

/// The three classifier families under evaluation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ModelFamily {
    /// Regularized logistic regression
    Logistic,
    /// Bagged tree ensemble
    Forest,
    /// Boosted tree ensemble
    Boosting,
}

impl ModelFamily {
    /// Families in declaration order; also the tie-break order for ranking
    pub const ALL: [ModelFamily; 3] = [
        ModelFamily::Logistic,
        ModelFamily::Forest,
        ModelFamily::Boosting,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            ModelFamily::Logistic => "logistic-regression",
            ModelFamily::Forest => "random-forest",
            ModelFamily::Boosting => "gradient-boosting",
        }
    }

    /// The hyperparameter grid searched for this family
    pub fn grid(&self) -> Vec<CandidateConfig> {
        match self {
            ModelFamily::Logistic => [0.1, 1.0, 5.0]
                .into_iter()
                .map(|c| CandidateConfig::Logistic { c })
                .collect(),
            ModelFamily::Forest => [Some(8), Some(12), None]
                .into_iter()
                .map(|max_depth| CandidateConfig::Forest { max_depth })
                .collect(),
            ModelFamily::Boosting => {
                let mut grid = Vec::new();
                for learning_rate in [0.05, 0.1] {
                    for n_estimators in [100, 200] {
                        grid.push(CandidateConfig::Boosting {
                            learning_rate,
                            n_estimators,
                        });
                    }
                }
                grid
            }
        }
    }
}

impl fmt::Display for ModelFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One point in a family's hyperparameter grid
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CandidateConfig {
    Logistic { c: f64 },
    Forest { max_depth: Option<usize> },
    Boosting { learning_rate: f64, n_estimators: usize },
}

impl CandidateConfig {
    pub fn family(&self) -> ModelFamily {
        match self {
            CandidateConfig::Logistic { .. } => ModelFamily::Logistic,
            CandidateConfig::Forest { .. } => ModelFamily::Forest,
            CandidateConfig::Boosting { .. } => ModelFamily::Boosting,
        }
    }

    /// Build an unfitted classifier for this configuration. Class weights go
    /// to the logistic and forest families; boosting ignores them and leans
    /// on shrinkage instead.
    pub fn build(&self, weights: ClassWeights, seed: u64) -> Classifier {
        match *self {
            CandidateConfig::Logistic { c } => Classifier::Logistic(
                LogisticRegression::new(c)
                    .with_max_iter(1000)
                    .with_class_weights(weights),
            ),
            CandidateConfig::Forest { max_depth } => Classifier::Forest(
                RandomForest::new(200)
                    .with_max_depth(max_depth)
                    .with_min_samples_leaf(5)
                    .with_class_weights(weights)
                    .with_seed(seed),
            ),
            CandidateConfig::Boosting {
                learning_rate,
                n_estimators,
            } => Classifier::Boosting(GradientBoostingClassifier::new(GradientBoostingConfig {
                n_estimators,
                learning_rate,
                seed,
                ..Default::default()
            })),
        }
    }
}

impl fmt::Display for CandidateConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CandidateConfig::Logistic { c } => write!(f, "C={c}"),
            CandidateConfig::Forest { max_depth } => match max_depth {
                Some(d) => write!(f, "max_depth={d}"),
                None => write!(f, "max_depth=unbounded"),
            },
            CandidateConfig::Boosting {
                learning_rate,
                n_estimators,
            } => write!(f, "learning_rate={learning_rate}, n_estimators={n_estimators}"),
        }
    }
}

/// A family's grid-search winner, refit on the full training split
#[derive(Debug, Clone)]
pub struct SelectedCandidate {
    pub family: ModelFamily,
    pub config: CandidateConfig,
    pub cv: CvScores,
    pub pipeline: CandidatePipeline,
}

/// Cross-validated grid search over the candidate families
pub struct ModelSelector {
    pub cv_folds: usize,
    pub seed: u64,
}

impl Default for ModelSelector {
    fn default() -> Self {
        Self {
            cv_folds: 3,
            seed: DEFAULT_SEED,
        }
    }
}

impl ModelSelector {
    pub fn new(cv_folds: usize, seed: u64) -> Self {
        Self { cv_folds, seed }
    }

    /// Select the best configuration for every family, in declaration order
    pub fn select_all(&self, train: &TrainingData) -> Result<Vec<SelectedCandidate>> {
        require_nonempty(train)?;
        let weights = ClassWeights::balanced(&train.labels)?;
        info!(
            negative = weights.negative,
            positive = weights.positive,
            "balanced class weights"
        );

        ModelFamily::ALL
            .iter()
            .map(|&family| self.select_family(family, train, weights))
            .collect()
    }

    /// Grid search one family: score every configuration on every fold,
    /// pick the best mean AUC, refit on the full training split.
    pub fn select_family(
        &self,
        family: ModelFamily,
        train: &TrainingData,
        weights: ClassWeights,
    ) -> Result<SelectedCandidate> {
        let grid = family.grid();
        let splits = StratifiedKFold::new(self.cv_folds, self.seed).split(&train.labels)?;

        info!(family = %family, configurations = grid.len(), folds = splits.len(), "grid search");

        // Every (configuration, fold) cell is independent; fits own their
        // seeds, so the schedule cannot change the outcome
        let cells: Vec<(usize, usize)> = (0..grid.len())
            .flat_map(|c| (0..splits.len()).map(move |f| (c, f)))
            .collect();

        let cell_scores: Vec<Result<f64>> = cells
            .par_iter()
            .map(|&(config_idx, fold_idx)| {
                let split = &splits[fold_idx];
                let fold_train = train.take(&split.train_indices)?;
                let fold_val = train.take(&split.validation_indices)?;

                let classifier = grid[config_idx].build(weights, self.seed);
                let pipeline =
                    CandidatePipeline::fit(&fold_train.features, &fold_train.labels, classifier)?;

                let proba = pipeline.predict_proba(&fold_val.features)?;
                roc_auc(&fold_val.labels, &proba)
            })
            .collect();

        let mut per_config: Vec<Vec<f64>> = vec![Vec::new(); grid.len()];
        for (&(config_idx, _), score) in cells.iter().zip(cell_scores) {
            per_config[config_idx].push(score?);
        }

        // Best mean CV score; exact comparison, first configuration wins ties
        let mut best_idx = 0;
        let mut best_cv = CvScores::from_scores(per_config[0].clone());
        for (idx, scores) in per_config.into_iter().enumerate().skip(1) {
            let cv = CvScores::from_scores(scores);
            if cv.mean.total_cmp(&best_cv.mean) == std::cmp::Ordering::Greater {
                best_idx = idx;
                best_cv = cv;
            }
        }

        let config = grid[best_idx];
        info!(
            family = %family,
            best_params = %config,
            cv_auc = best_cv.mean,
            cv_std = best_cv.std,
            "selected configuration"
        );

        let classifier = config.build(weights, self.seed);
        let pipeline = CandidatePipeline::fit(&train.features, &train.labels, classifier)?;

        Ok(SelectedCandidate {
            family,
            config,
            cv: best_cv,
            pipeline,
        })
    }
}

/// Guard used by the selector's callers: selection needs a loaded dataset,
/// never a partial or synthetic stand-in.
pub fn require_nonempty(train: &TrainingData) -> Result<()> {
    if train.n_rows() == 0 {
        return Err(CreditError::DataLoadError(
            "training split is empty".to_string(),
        ));
    }
    Ok(())
}
