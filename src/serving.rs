//! Prediction serving
//!
//! The service holds one immutable scoring artifact, loaded at startup and
//! shared read-only across requests; `score` takes `&self` and touches no
//! shared mutable state, so concurrent requests need no locking. The
//! request/response types are the boundary contract for whatever transport
//! layer sits in front.

use crate::artifact::ScoringArtifact;
use crate::error::{CreditError, Result};
use crate::schema::{self, FeatureRecord};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Path the transport layer is expected to expose scoring on
pub const PREDICT_ENDPOINT: &str = "/predict";

/// A loosely-typed request body, validated against the schema before any
/// numeric transform runs
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScoreRequest {
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl ScoreRequest {
    pub fn from_record(record: &FeatureRecord) -> Result<Self> {
        let value = serde_json::to_value(record)?;
        let fields = value
            .as_object()
            .cloned()
            .ok_or_else(|| CreditError::SerializationError("record is not an object".into()))?;
        // Optional fields serialize as explicit nulls; the validator treats
        // null and absent the same way
        Ok(Self { fields })
    }
}

/// Either a probability or a structured error; the outcome is part of the
/// signature, not an exception contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probability: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ScoreResponse {
    pub fn ok(probability: f64) -> Self {
        Self {
            success: true,
            probability: Some(probability),
            error: None,
        }
    }

    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            success: false,
            probability: None,
            error: Some(error.into()),
        }
    }
}

/// Static service identity for the diagnostic endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceStatus {
    pub status: String,
    pub model: String,
    pub endpoint: String,
}

/// Read-only handle over the loaded artifact, constructed explicitly at
/// startup and passed to the transport layer — not an ambient global.
#[derive(Debug, Clone)]
pub struct PredictionService {
    artifact: Arc<ScoringArtifact>,
}

impl PredictionService {
    /// Load the artifact once for the process lifetime. A missing or
    /// unreadable artifact is startup-fatal, never a per-request error.
    pub fn open(path: &Path) -> Result<Self> {
        let artifact = ScoringArtifact::load(path)?;
        debug!(family = %artifact.metadata.family, "prediction service ready");
        Ok(Self::from_artifact(artifact))
    }

    pub fn from_artifact(artifact: ScoringArtifact) -> Self {
        Self {
            artifact: Arc::new(artifact),
        }
    }

    /// Score one validated record: frozen transform, then the classifier's
    /// positive-class probability. No thresholding — that is a caller concern.
    pub fn score(&self, record: &FeatureRecord) -> Result<f64> {
        let df = record.to_dataframe()?;
        let proba = self.artifact.pipeline.predict_proba(&df)?;
        Ok(proba[0])
    }

    /// Boundary entry point: validate the loose request, score, and fold any
    /// failure into the response. Errors are isolated to this request.
    pub fn handle(&self, request: &ScoreRequest) -> ScoreResponse {
        let record = match schema::validate(&request.fields) {
            Ok(record) => record,
            Err(err) => {
                warn!(%err, "request rejected by schema validation");
                return ScoreResponse::failure(err.to_string());
            }
        };

        match self.score(&record) {
            Ok(probability) => ScoreResponse::ok(probability),
            Err(err) => {
                warn!(%err, "scoring failed");
                ScoreResponse::failure(err.to_string())
            }
        }
    }

    pub fn status(&self) -> ServiceStatus {
        ServiceStatus {
            status: "ok".to_string(),
            model: self.artifact.metadata.family.name().to_string(),
            endpoint: PREDICT_ENDPOINT.to_string(),
        }
    }

    pub fn artifact(&self) -> &ScoringArtifact {
        &self.artifact
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactMetadata;
    use crate::pipeline::{CandidatePipeline, Classifier};
    use crate::schema::feature_names;
    use crate::training::{CandidateConfig, LogisticRegression, ModelFamily};
    use chrono::Utc;
    use ndarray::Array1;
    use polars::prelude::*;
    use serde_json::json;

    fn service() -> PredictionService {
        let rows = 40;
        let labels: Array1<f64> = (0..rows).map(|r| (r % 2) as f64).collect();
        let mut columns: Vec<Column> = Vec::new();
        for name in feature_names() {
            let values: Vec<f64> = (0..rows)
                .map(|r| match name {
                    "late90" => labels[r] * 4.0,
                    "utilization" => 0.1 + labels[r] * 0.8,
                    _ => (r % 6) as f64,
                })
                .collect();
            columns.push(Series::new(name.into(), &values).into());
        }
        let df = DataFrame::new(columns).unwrap();

        let classifier = Classifier::Logistic(LogisticRegression::new(1.0));
        let pipeline = CandidatePipeline::fit(&df, &labels, classifier).unwrap();

        PredictionService::from_artifact(ScoringArtifact {
            pipeline,
            metadata: ArtifactMetadata {
                family: ModelFamily::Logistic,
                config: CandidateConfig::Logistic { c: 1.0 },
                trained_at: Utc::now(),
                cv_auc: 0.9,
                test_auc: 0.9,
                n_training_rows: rows,
            },
        })
    }

    fn request(body: serde_json::Value) -> ScoreRequest {
        ScoreRequest {
            fields: body.as_object().unwrap().clone(),
        }
    }

    #[test]
    fn test_valid_request_gets_probability() {
        let response = service().handle(&request(json!({
            "utilization": 0.2, "age": 40, "late30": 0, "debtRatio": 0.5,
            "income": 5000.0, "openLines": 5, "late90": 0, "realEstate": 1,
            "late60": 0, "dependents": 0.0
        })));

        assert!(response.success);
        let p = response.probability.unwrap();
        assert!((0.0..=1.0).contains(&p));
        assert!(response.error.is_none());
    }

    #[test]
    fn test_invalid_request_gets_structured_error() {
        let response = service().handle(&request(json!({
            "utilization": 0.2
        })));

        assert!(!response.success);
        assert!(response.probability.is_none());
        assert!(response.error.unwrap().contains("age"));
    }

    #[test]
    fn test_missing_optional_field_is_imputed_not_rejected() {
        let response = service().handle(&request(json!({
            "utilization": 0.2, "age": 40, "late30": 0, "debtRatio": 0.5,
            "openLines": 5, "late90": 0, "realEstate": 1,
            "late60": 0, "dependents": 0.0
        })));

        assert!(response.success, "got {:?}", response.error);
    }

    #[test]
    fn test_missing_artifact_is_startup_fatal() {
        let err = PredictionService::open(Path::new("/nonexistent/model.json")).unwrap_err();
        assert!(matches!(err, CreditError::ArtifactLoadError(_)));
    }

    #[test]
    fn test_status_reports_identity() {
        let status = service().status();
        assert_eq!(status.status, "ok");
        assert_eq!(status.model, "logistic-regression");
        assert_eq!(status.endpoint, "/predict");
    }

    #[test]
    fn test_response_wire_format() {
        let ok = serde_json::to_value(ScoreResponse::ok(0.25)).unwrap();
        assert_eq!(ok, json!({"success": true, "probability": 0.25}));

        let err = serde_json::to_value(ScoreResponse::failure("bad field")).unwrap();
        assert_eq!(err, json!({"success": false, "error": "bad field"}));
    }
}
