//! Credit scoring - main entry point

use clap::Parser;
use credit_scoring::cli::{cmd_predict, cmd_status, cmd_train, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "credit_scoring=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Train {
            data,
            target,
            id_column,
            artifact,
            cv_folds,
            seed,
        } => {
            cmd_train(&data, &target, &id_column, artifact, cv_folds, seed)?;
        }
        Commands::Predict { artifact, input } => {
            cmd_predict(artifact, input)?;
        }
        Commands::Status { artifact } => {
            cmd_status(artifact)?;
        }
    }

    Ok(())
}
