//! Candidate pipeline: frozen preprocessing composed with a fitted classifier
//!
//! The pipeline is the unit that model selection fits, the evaluator ranks,
//! and the scoring artifact persists. Serving goes through the same
//! `transform` the pipeline was fitted with, so the feature vector at
//! inference time is field-for-field identical to training.

use crate::error::Result;
use crate::preprocessing::Preprocessor;
use crate::schema;
use crate::training::{
    GradientBoostingClassifier, LogisticRegression, RandomForest,
};
use ndarray::{Array1, Array2};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};

/// A classifier from one of the three candidate families
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Classifier {
    Logistic(LogisticRegression),
    Forest(RandomForest),
    Boosting(GradientBoostingClassifier),
}

impl Classifier {
    pub fn fit(&mut self, x: &Array2<f64>, y: &Array1<f64>) -> Result<()> {
        match self {
            Classifier::Logistic(model) => model.fit(x, y).map(|_| ()),
            Classifier::Forest(model) => model.fit(x, y).map(|_| ()),
            Classifier::Boosting(model) => model.fit(x, y).map(|_| ()),
        }
    }

    /// Positive-class probabilities
    pub fn predict_proba(&self, x: &Array2<f64>) -> Result<Array1<f64>> {
        match self {
            Classifier::Logistic(model) => model.predict_proba(x),
            Classifier::Forest(model) => model.predict_proba(x),
            Classifier::Boosting(model) => model.predict_proba(x),
        }
    }
}

/// Preprocessing parameters and classifier state, fitted together and
/// immutable once selection completes
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatePipeline {
    preprocessor: Preprocessor,
    classifier: Classifier,
}

impl CandidatePipeline {
    /// Fit preprocessing on the given split, then the classifier on the
    /// transformed matrix. The classifier arrives configured but unfitted.
    pub fn fit(features: &DataFrame, labels: &Array1<f64>, mut classifier: Classifier) -> Result<Self> {
        let mut preprocessor = Preprocessor::new();
        let transformed = preprocessor.fit_transform(features)?;
        let x = schema::to_feature_matrix(&transformed)?;

        classifier.fit(&x, labels)?;

        Ok(Self {
            preprocessor,
            classifier,
        })
    }

    /// Transform with the frozen parameters and return positive-class
    /// probabilities. Never re-fits.
    pub fn predict_proba(&self, features: &DataFrame) -> Result<Array1<f64>> {
        let transformed = self.preprocessor.transform(features)?;
        let x = schema::to_feature_matrix(&transformed)?;
        self.classifier.predict_proba(&x)
    }

    pub fn classifier(&self) -> &Classifier {
        &self.classifier
    }

    pub fn preprocessor(&self) -> &Preprocessor {
        &self.preprocessor
    }
}
