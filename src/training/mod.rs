//! Model training
//!
//! Three candidate classifier families (regularized logistic regression, a
//! bagged tree ensemble, a boosted tree ensemble), stratified cross-validated
//! grid search per family, and the test-split evaluator that ranks the
//! winners.

mod engine;
pub mod class_weight;
pub mod cross_validation;
pub mod decision_tree;
pub mod evaluation;
pub mod gradient_boosting;
pub mod logistic;
pub mod metrics;
pub mod random_forest;
pub mod selection;

pub use class_weight::ClassWeights;
pub use cross_validation::{CvScores, CvSplit, StratifiedKFold};
pub use decision_tree::{Criterion, DecisionTree, TreeNode};
pub use engine::{TrainEngine, TrainingConfig, TrainingOutcome};
pub use evaluation::EvaluationRecord;
pub use gradient_boosting::{GradientBoostingClassifier, GradientBoostingConfig};
pub use logistic::LogisticRegression;
pub use metrics::{roc_auc, ClassificationMetrics};
pub use random_forest::RandomForest;
pub use selection::{
    CandidateConfig, ModelFamily, ModelSelector, SelectedCandidate, DEFAULT_SEED,
};
