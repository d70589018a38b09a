//! Command-line interface: thin wrappers over the library

use crate::data::DatasetConfig;
use crate::error::Result;
use crate::schema::FeatureRecord;
use crate::serving::{PredictionService, ScoreRequest};
use crate::training::{TrainEngine, TrainingConfig, DEFAULT_SEED};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "credit-scoring", about = "Credit delinquency scoring pipeline")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Train all candidate families and persist the best pipeline
    Train {
        /// Path to the applicant CSV
        #[arg(long)]
        data: String,
        /// Label column name
        #[arg(long, default_value = "label")]
        target: String,
        /// Identifier column name (excluded from features)
        #[arg(long, default_value = "id")]
        id_column: String,
        /// Where to write the scoring artifact
        #[arg(long, default_value = "best_model.json")]
        artifact: PathBuf,
        /// Cross-validation folds
        #[arg(long, default_value_t = 3)]
        cv_folds: usize,
        /// Random seed
        #[arg(long, default_value_t = DEFAULT_SEED)]
        seed: u64,
    },
    /// Score one applicant record (JSON file) against a saved artifact
    Predict {
        #[arg(long, default_value = "best_model.json")]
        artifact: PathBuf,
        /// Path to a JSON file with the ten feature fields
        #[arg(long)]
        input: PathBuf,
    },
    /// Print the service identity for a saved artifact
    Status {
        #[arg(long, default_value = "best_model.json")]
        artifact: PathBuf,
    },
}

pub fn cmd_train(
    data: &str,
    target: &str,
    id_column: &str,
    artifact: PathBuf,
    cv_folds: usize,
    seed: u64,
) -> Result<()> {
    let mut config = TrainingConfig::new(data, artifact);
    config.dataset = DatasetConfig {
        id_column: id_column.to_string(),
        target_column: target.to_string(),
    };
    config.cv_folds = cv_folds;
    config.seed = seed;

    let outcome = TrainEngine::new(config).run()?;
    let best = &outcome.rankings[0];
    println!(
        "best model: {} ({}) test AUC-ROC {:.4}",
        best.family, best.config, best.metrics.auc_roc
    );
    Ok(())
}

pub fn cmd_predict(artifact: PathBuf, input: PathBuf) -> Result<()> {
    let service = PredictionService::open(&artifact)?;

    let body = std::fs::read_to_string(&input)?;
    let record: FeatureRecord = serde_json::from_str(&body)?;
    let response = service.handle(&ScoreRequest::from_record(&record)?);

    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

pub fn cmd_status(artifact: PathBuf) -> Result<()> {
    let service = PredictionService::open(&artifact)?;
    println!("{}", serde_json::to_string_pretty(&service.status())?);
    Ok(())
}
