//! Scoring artifact persistence
//!
//! Single-slot storage for the winning pipeline: created by a training run,
//! read-only afterwards, replaced wholesale by the next run. The write goes
//! through a temp file and rename, so a reader either sees a complete valid
//! artifact or the previous one — never a partial write.

use crate::error::{CreditError, Result};
use crate::pipeline::CandidatePipeline;
use crate::training::{CandidateConfig, ModelFamily};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::info;

/// Provenance recorded alongside the pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArtifactMetadata {
    pub family: ModelFamily,
    pub config: CandidateConfig,
    pub trained_at: DateTime<Utc>,
    pub cv_auc: f64,
    pub test_auc: f64,
    pub n_training_rows: usize,
}

/// The persisted winner: frozen preprocessing plus fitted classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringArtifact {
    pub pipeline: CandidatePipeline,
    pub metadata: ArtifactMetadata,
}

impl ScoringArtifact {
    /// Atomically persist to `path`: serialize to `path.tmp`, then rename.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string(self)?;

        let tmp_path = path.with_extension("tmp");
        fs::write(&tmp_path, json)?;
        fs::rename(&tmp_path, path)?;

        info!(path = %path.display(), family = %self.metadata.family, "scoring artifact written");
        Ok(())
    }

    /// Load a previously written artifact. Any failure here is fatal to a
    /// serving process: it must refuse to start rather than serve unmodeled.
    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)
            .map_err(|e| CreditError::ArtifactLoadError(format!("{}: {e}", path.display())))?;
        serde_json::from_str(&json)
            .map_err(|e| CreditError::ArtifactLoadError(format!("{}: {e}", path.display())))
    }
}
