//! Median imputation for missing feature values

use crate::error::{CreditError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Fills missing values with the per-column median computed at fit time.
///
/// The median is estimated once, on the training split only, and applied
/// unchanged to every later transform. Financial ratios are heavy-tailed, so
/// the median is preferred over the mean as the substitute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MedianImputer {
    medians: HashMap<String, f64>,
    is_fitted: bool,
}

impl Default for MedianImputer {
    fn default() -> Self {
        Self::new()
    }
}

impl MedianImputer {
    pub fn new() -> Self {
        Self {
            medians: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Estimate per-column medians from the training data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                CreditError::TransformError(format!("column '{col_name}' not found"))
            })?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| CreditError::TransformError(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| CreditError::TransformError(e.to_string()))?;

            let median = ca.median().ok_or_else(|| {
                CreditError::TransformError(format!(
                    "column '{col_name}' has no values to compute a median from"
                ))
            })?;
            self.medians.insert(col_name.to_string(), median);
        }

        self.is_fitted = true;
        Ok(self)
    }

    /// Replace nulls with the fitted medians. Columns the imputer was not
    /// fitted on pass through untouched.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CreditError::NotFitted);
        }

        let mut result = df.clone();
        for (col_name, &median) in &self.medians {
            let Ok(column) = df.column(col_name) else {
                return Err(CreditError::TransformError(format!(
                    "column '{col_name}' not found"
                )));
            };
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| CreditError::TransformError(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| CreditError::TransformError(e.to_string()))?;

            let filled: Float64Chunked = ca
                .into_iter()
                .map(|opt| Some(opt.unwrap_or(median)))
                .collect();

            result = result
                .with_column(filled.with_name(column.name().clone()).into_series())
                .map_err(|e| CreditError::TransformError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    /// Fitted median for a column, if any
    pub fn median(&self, column: &str) -> Option<f64> {
        self.medians.get(column).copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fills_nulls_with_median() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[Some(1.0), None, Some(3.0), Some(5.0)]).into(),
        ])
        .unwrap();

        let mut imputer = MedianImputer::new();
        imputer.fit(&df, &["a"]).unwrap();
        let result = imputer.transform(&df).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        assert_eq!(col.null_count(), 0);
        assert_eq!(col.get(1), Some(3.0));
    }

    #[test]
    fn test_complete_column_unchanged() {
        let df = DataFrame::new(vec![
            Series::new("a".into(), &[1.0, 2.0, 3.0]).into(),
        ])
        .unwrap();

        let mut imputer = MedianImputer::new();
        imputer.fit(&df, &["a"]).unwrap();
        let result = imputer.transform(&df).unwrap();

        let col = result.column("a").unwrap().f64().unwrap();
        for (orig, filled) in [1.0, 2.0, 3.0].iter().zip(col.into_no_null_iter()) {
            assert_eq!(*orig, filled);
        }
    }

    #[test]
    fn test_transform_before_fit_fails() {
        let df = DataFrame::new(vec![Series::new("a".into(), &[1.0]).into()]).unwrap();
        let imputer = MedianImputer::new();
        assert!(matches!(
            imputer.transform(&df),
            Err(CreditError::NotFitted)
        ));
    }

    #[test]
    fn test_missing_column_at_transform() {
        let fit_df = DataFrame::new(vec![Series::new("a".into(), &[1.0, 2.0]).into()]).unwrap();
        let mut imputer = MedianImputer::new();
        imputer.fit(&fit_df, &["a"]).unwrap();

        let other = DataFrame::new(vec![Series::new("b".into(), &[1.0]).into()]).unwrap();
        assert!(matches!(
            imputer.transform(&other),
            Err(CreditError::TransformError(_))
        ));
    }
}
