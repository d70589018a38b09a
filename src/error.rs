//! Error types for the credit scoring pipeline

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CreditError {
    /// Training dataset missing, unreadable, or violating the label invariant.
    /// Fatal to a training run; no artifact is produced.
    #[error("Failed to load dataset: {0}")]
    DataLoadError(String),

    /// A feature record failed schema validation at the serving boundary.
    #[error("Invalid feature record: field '{field}': {reason}")]
    SchemaError { field: String, reason: String },

    /// A value could not be carried through imputation/scaling.
    #[error("Transform failed: {0}")]
    TransformError(String),

    /// Scoring artifact missing or unreadable at startup.
    #[error("Failed to load scoring artifact: {0}")]
    ArtifactLoadError(String),

    /// An estimator was used before fitting.
    #[error("Model is not fitted")]
    NotFitted,

    #[error("Shape mismatch: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for CreditError {
    fn from(e: serde_json::Error) -> Self {
        CreditError::SerializationError(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, CreditError>;
