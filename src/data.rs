//! Dataset loading and splitting
//!
//! Loads the applicant CSV into a polars DataFrame, enforces the label
//! invariant, and produces the stratified train/test split used by model
//! selection and evaluation.

use crate::error::{CreditError, Result};
use crate::schema;
use ndarray::Array1;
use polars::prelude::*;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use std::fs::File;
use tracing::info;

/// Names of the non-feature columns in the dataset file
#[derive(Debug, Clone)]
pub struct DatasetConfig {
    /// Identifier column, excluded from features
    pub id_column: String,
    /// Binary label column (1 = seriously delinquent within two years)
    pub target_column: String,
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            id_column: "id".to_string(),
            target_column: "label".to_string(),
        }
    }
}

/// Feature columns plus aligned labels, ready for fitting
#[derive(Debug, Clone)]
pub struct TrainingData {
    /// The ten canonical feature columns, schema order
    pub features: DataFrame,
    /// Binary labels, one per row
    pub labels: Array1<f64>,
}

impl TrainingData {
    pub fn n_rows(&self) -> usize {
        self.features.height()
    }

    /// Fraction of rows in the positive (delinquent) class
    pub fn positive_rate(&self) -> f64 {
        if self.labels.is_empty() {
            return 0.0;
        }
        self.labels.sum() / self.labels.len() as f64
    }

    /// Subset by row indices
    pub fn take(&self, indices: &[usize]) -> Result<TrainingData> {
        let features = take_rows(&self.features, indices)?;
        let labels = Array1::from_vec(indices.iter().map(|&i| self.labels[i]).collect());
        Ok(TrainingData { features, labels })
    }
}

/// Load the applicant dataset. A missing or unreadable file fails fast with
/// `DataLoadError` before any fitting begins.
pub fn load_csv(path: &str, config: &DatasetConfig) -> Result<TrainingData> {
    let file = File::open(path)
        .map_err(|e| CreditError::DataLoadError(format!("{path}: {e}")))?;

    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(100))
        .into_reader_with_file_handle(file)
        .finish()
        .map_err(|e| CreditError::DataLoadError(format!("{path}: {e}")))?;

    from_dataframe(df, config)
}

/// Validate and split an in-memory DataFrame into features and labels
pub fn from_dataframe(df: DataFrame, config: &DatasetConfig) -> Result<TrainingData> {
    info!(rows = df.height(), cols = df.width(), "dataset loaded");

    let labels = extract_labels(&df, &config.target_column)?;

    // The identifier carries no signal; drop it before selecting features
    let df = if df.column(&config.id_column).is_ok() {
        df.drop(&config.id_column)
            .map_err(|e| CreditError::DataLoadError(e.to_string()))?
    } else {
        df
    };

    // Keep exactly the schema columns, in canonical order
    let features = df
        .select(schema::feature_names())
        .map_err(|e| CreditError::DataLoadError(format!("feature column missing: {e}")))?;

    log_null_counts(&features);

    let positives = labels.sum();
    let n = labels.len() as f64;
    info!(
        positive = positives,
        negative = n - positives,
        positive_rate = positives / n,
        "label distribution"
    );

    Ok(TrainingData { features, labels })
}

fn extract_labels(df: &DataFrame, target_column: &str) -> Result<Array1<f64>> {
    let column = df.column(target_column).map_err(|_| {
        CreditError::DataLoadError(format!("label column '{target_column}' not found"))
    })?;

    let casted = column
        .cast(&DataType::Float64)
        .map_err(|e| CreditError::DataLoadError(e.to_string()))?;
    let ca = casted
        .f64()
        .map_err(|e| CreditError::DataLoadError(e.to_string()))?;

    let mut labels = Vec::with_capacity(ca.len());
    for (row, value) in ca.into_iter().enumerate() {
        match value {
            Some(v) if v == 0.0 || v == 1.0 => labels.push(v),
            Some(v) => {
                return Err(CreditError::DataLoadError(format!(
                    "label at row {row} is {v}, expected 0 or 1"
                )))
            }
            None => {
                return Err(CreditError::DataLoadError(format!(
                    "label at row {row} is missing"
                )))
            }
        }
    }

    Ok(Array1::from_vec(labels))
}

fn log_null_counts(df: &DataFrame) {
    for column in df.get_columns() {
        let nulls = column.null_count();
        if nulls > 0 {
            info!(column = %column.name(), nulls, "missing values");
        }
    }
}

/// Stratified train/test split: each class is shuffled and apportioned
/// separately so the test split preserves the label distribution.
pub fn stratified_split(
    data: &TrainingData,
    test_size: f64,
    seed: u64,
) -> Result<(TrainingData, TrainingData)> {
    if !(0.0..1.0).contains(&test_size) || test_size == 0.0 {
        return Err(CreditError::InvalidParameter(format!(
            "test_size must be in (0, 1), got {test_size}"
        )));
    }

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut train_indices = Vec::new();
    let mut test_indices = Vec::new();

    for class in [0.0, 1.0] {
        let mut class_indices: Vec<usize> = data
            .labels
            .iter()
            .enumerate()
            .filter(|(_, &y)| y == class)
            .map(|(i, _)| i)
            .collect();
        class_indices.shuffle(&mut rng);

        let n_test = ((class_indices.len() as f64) * test_size).round() as usize;
        test_indices.extend_from_slice(&class_indices[..n_test]);
        train_indices.extend_from_slice(&class_indices[n_test..]);
    }

    // Restore row order so the split is a pure subset, not a reshuffle
    train_indices.sort_unstable();
    test_indices.sort_unstable();

    Ok((data.take(&train_indices)?, data.take(&test_indices)?))
}

/// Subset a DataFrame by row indices
pub fn take_rows(df: &DataFrame, indices: &[usize]) -> Result<DataFrame> {
    let idx: Vec<IdxSize> = indices.iter().map(|&i| i as IdxSize).collect();
    let idx_ca = IdxCa::from_vec("idx".into(), idx);
    df.take(&idx_ca)
        .map_err(|e| CreditError::DataLoadError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_dataset(n_pos: usize, n_neg: usize) -> TrainingData {
        let n = n_pos + n_neg;
        let labels: Vec<f64> = (0..n).map(|i| if i < n_pos { 1.0 } else { 0.0 }).collect();

        let columns: Vec<Column> = schema::feature_names()
            .into_iter()
            .map(|name| {
                let fill: Vec<f64> = (0..n).map(|i| i as f64).collect();
                Series::new(name.into(), &fill).into()
            })
            .collect();

        TrainingData {
            features: DataFrame::new(columns).unwrap(),
            labels: Array1::from_vec(labels),
        }
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let err = load_csv("/nonexistent/applicants.csv", &DatasetConfig::default()).unwrap_err();
        assert!(matches!(err, CreditError::DataLoadError(_)));
    }

    #[test]
    fn test_non_binary_label_rejected() {
        let df = DataFrame::new(vec![
            Series::new("label".into(), &[0.0_f64, 2.0]).into(),
        ])
        .unwrap();
        let err = extract_labels(&df, "label").unwrap_err();
        assert!(matches!(err, CreditError::DataLoadError(_)));
    }

    #[test]
    fn test_stratified_split_preserves_class_balance() {
        let data = toy_dataset(20, 80);
        let (train, test) = stratified_split(&data, 0.2, 42).unwrap();

        assert_eq!(test.n_rows(), 20);
        assert_eq!(train.n_rows(), 80);

        // 20% of each class lands in the test split
        assert_eq!(test.labels.sum() as usize, 4);
        assert_eq!(train.labels.sum() as usize, 16);
    }

    #[test]
    fn test_split_is_deterministic() {
        let data = toy_dataset(10, 40);
        let (train_a, _) = stratified_split(&data, 0.2, 7).unwrap();
        let (train_b, _) = stratified_split(&data, 0.2, 7).unwrap();

        assert_eq!(train_a.labels, train_b.labels);
    }
}
