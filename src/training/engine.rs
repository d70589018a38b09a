//! Training run orchestration
//!
//! Load → stratified split → per-family grid search → test-split ranking →
//! artifact persist. A failure anywhere aborts the run with full context; no
//! partial artifact is produced, and no silent fallback to a lesser model.

use crate::artifact::{ArtifactMetadata, ScoringArtifact};
use crate::data::{self, DatasetConfig};
use crate::error::Result;
use super::evaluation::{self, EvaluationRecord};
use super::selection::{ModelSelector, DEFAULT_SEED};
use chrono::Utc;
use std::path::PathBuf;
use tracing::info;

#[derive(Debug, Clone)]
pub struct TrainingConfig {
    pub data_path: String,
    pub dataset: DatasetConfig,
    pub artifact_path: PathBuf,
    /// Held-out fraction, stratified by label
    pub test_size: f64,
    pub cv_folds: usize,
    pub seed: u64,
}

impl TrainingConfig {
    pub fn new(data_path: impl Into<String>, artifact_path: impl Into<PathBuf>) -> Self {
        Self {
            data_path: data_path.into(),
            dataset: DatasetConfig::default(),
            artifact_path: artifact_path.into(),
            test_size: 0.2,
            cv_folds: 3,
            seed: DEFAULT_SEED,
        }
    }
}

/// What a completed run produced
#[derive(Debug)]
pub struct TrainingOutcome {
    /// Test-split ranking, best first
    pub rankings: Vec<EvaluationRecord>,
    /// The persisted artifact (also written to `artifact_path`)
    pub artifact: ScoringArtifact,
}

/// Run the full training-and-selection procedure
pub struct TrainEngine {
    config: TrainingConfig,
}

impl TrainEngine {
    pub fn new(config: TrainingConfig) -> Self {
        Self { config }
    }

    pub fn run(&self) -> Result<TrainingOutcome> {
        let data = data::load_csv(&self.config.data_path, &self.config.dataset)?;
        let (train, test) =
            data::stratified_split(&data, self.config.test_size, self.config.seed)?;
        info!(
            train_rows = train.n_rows(),
            test_rows = test.n_rows(),
            "stratified split"
        );

        let selector = ModelSelector::new(self.config.cv_folds, self.config.seed);
        let candidates = selector.select_all(&train)?;

        let rankings = evaluation::rank_candidates(&candidates, &test)?;
        evaluation::log_ranking(&rankings);

        // The ranking's head names the winner; fetch its fitted pipeline
        let best = &rankings[0];
        let winner = candidates
            .iter()
            .find(|c| c.family == best.family)
            .expect("ranked family came from the candidate list");
        info!(family = %winner.family, params = %winner.config, "final model");

        evaluation::log_winner_report(winner, &test)?;

        let artifact = ScoringArtifact {
            pipeline: winner.pipeline.clone(),
            metadata: ArtifactMetadata {
                family: winner.family,
                config: winner.config,
                trained_at: Utc::now(),
                cv_auc: winner.cv.mean,
                test_auc: best.metrics.auc_roc,
                n_training_rows: train.n_rows(),
            },
        };
        artifact.save(&self.config.artifact_path)?;

        Ok(TrainingOutcome { rankings, artifact })
    }
}
