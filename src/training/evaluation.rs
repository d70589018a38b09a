//! Held-out evaluation and candidate ranking

use crate::data::TrainingData;
use crate::error::Result;
use super::metrics::{classification_report, ClassificationMetrics};
use super::selection::{CandidateConfig, ModelFamily, SelectedCandidate};
use ndarray::Array1;
use serde::{Deserialize, Serialize};
use tracing::info;

/// One candidate's scores on the held-out test split
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub family: ModelFamily,
    pub config: CandidateConfig,
    pub metrics: ClassificationMetrics,
}

/// Score each family winner on the test split and rank by AUC-ROC
/// descending. Comparison is exact (`total_cmp`); an exact tie keeps the
/// earlier family in declaration order, never an arbitrary one.
pub fn rank_candidates(
    candidates: &[SelectedCandidate],
    test: &TrainingData,
) -> Result<Vec<EvaluationRecord>> {
    let mut records = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        let proba = candidate.pipeline.predict_proba(&test.features)?;
        let metrics = ClassificationMetrics::compute(&test.labels, &proba)?;
        records.push(EvaluationRecord {
            family: candidate.family,
            config: candidate.config,
            metrics,
        });
    }

    // Stable sort: equal AUC preserves declaration order
    records.sort_by(|a, b| b.metrics.auc_roc.total_cmp(&a.metrics.auc_roc));
    Ok(records)
}

/// Emit the human-readable ranking report. No other state changes.
pub fn log_ranking(records: &[EvaluationRecord]) {
    info!("test-split ranking ({} candidates)", records.len());
    for (rank, record) in records.iter().enumerate() {
        info!(
            rank = rank + 1,
            family = %record.family,
            params = %record.config,
            auc_roc = record.metrics.auc_roc,
            accuracy = record.metrics.accuracy,
            f1 = record.metrics.f1,
            precision = record.metrics.precision,
            recall = record.metrics.recall,
            "candidate"
        );
    }
}

/// Detailed per-class report for the winning candidate
pub fn log_winner_report(winner: &SelectedCandidate, test: &TrainingData) -> Result<()> {
    let proba = winner.pipeline.predict_proba(&test.features)?;
    let y_pred: Array1<f64> = proba.mapv(|p| if p >= 0.5 { 1.0 } else { 0.0 });

    for entry in classification_report(&test.labels, &y_pred) {
        info!(
            class = entry.class,
            precision = entry.precision,
            recall = entry.recall,
            f1 = entry.f1,
            support = entry.support,
            "winner class report"
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{CandidatePipeline, Classifier};
    use crate::schema::feature_names;
    use crate::training::class_weight::ClassWeights;
    use crate::training::cross_validation::CvScores;
    use crate::training::logistic::LogisticRegression;
    use polars::prelude::*;

    fn toy_data(rows: usize, late90_signal: bool) -> TrainingData {
        let labels: Vec<f64> = (0..rows).map(|r| (r % 2) as f64).collect();
        let mut columns: Vec<Column> = Vec::new();
        for name in feature_names() {
            let values: Vec<f64> = (0..rows)
                .map(|r| {
                    if name == "late90" && late90_signal {
                        labels[r] * 5.0
                    } else {
                        (r % 5) as f64
                    }
                })
                .collect();
            columns.push(Series::new(name.into(), &values).into());
        }
        TrainingData {
            features: DataFrame::new(columns).unwrap(),
            labels: Array1::from_vec(labels),
        }
    }

    fn fitted_candidate(family: ModelFamily, c: f64, data: &TrainingData) -> SelectedCandidate {
        let classifier = Classifier::Logistic(
            LogisticRegression::new(c).with_class_weights(ClassWeights::uniform()),
        );
        let pipeline = CandidatePipeline::fit(&data.features, &data.labels, classifier).unwrap();
        SelectedCandidate {
            family,
            config: CandidateConfig::Logistic { c },
            cv: CvScores::from_scores(vec![0.5]),
            pipeline,
        }
    }

    #[test]
    fn test_ranking_orders_by_auc_descending() {
        let data = toy_data(40, true);
        let candidates = vec![
            fitted_candidate(ModelFamily::Logistic, 1.0, &data),
            fitted_candidate(ModelFamily::Forest, 5.0, &data),
        ];

        let records = rank_candidates(&candidates, &data).unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[0].metrics.auc_roc >= records[1].metrics.auc_roc);
    }

    #[test]
    fn test_exact_tie_keeps_declaration_order() {
        let data = toy_data(40, true);
        // Identical pipelines produce exactly equal AUC
        let candidates = vec![
            fitted_candidate(ModelFamily::Logistic, 1.0, &data),
            fitted_candidate(ModelFamily::Forest, 1.0, &data),
        ];

        let records = rank_candidates(&candidates, &data).unwrap();
        assert_eq!(records[0].metrics.auc_roc, records[1].metrics.auc_roc);
        assert_eq!(records[0].family, ModelFamily::Logistic);
    }
}
