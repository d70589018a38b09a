//! Robust feature scaling

use crate::error::{CreditError, Result};
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Parameters for one fitted column
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScaleParams {
    /// Median
    center: f64,
    /// Interquartile range; 1.0 when the IQR degenerates to zero
    spread: f64,
}

/// Median/IQR scaler: `(x - median) / IQR`.
///
/// Chosen over z-score standardization because utilization and debt ratios
/// carry extreme outliers that would dominate a mean/variance estimate.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RobustScaler {
    params: HashMap<String, ScaleParams>,
    is_fitted: bool,
}

impl Default for RobustScaler {
    fn default() -> Self {
        Self::new()
    }
}

impl RobustScaler {
    pub fn new() -> Self {
        Self {
            params: HashMap::new(),
            is_fitted: false,
        }
    }

    /// Fit center/spread per column from the training data
    pub fn fit(&mut self, df: &DataFrame, columns: &[&str]) -> Result<&mut Self> {
        for col_name in columns {
            let column = df.column(col_name).map_err(|_| {
                CreditError::TransformError(format!("column '{col_name}' not found"))
            })?;
            let series = column.as_materialized_series();
            let params = Self::compute_params(series)?;
            self.params.insert(col_name.to_string(), params);
        }

        self.is_fitted = true;
        Ok(self)
    }

    fn compute_params(series: &Series) -> Result<ScaleParams> {
        let casted = series
            .cast(&DataType::Float64)
            .map_err(|e| CreditError::TransformError(e.to_string()))?;
        let ca = casted
            .f64()
            .map_err(|e| CreditError::TransformError(e.to_string()))?;

        let median = ca.median().unwrap_or(0.0);
        let q1 = ca
            .quantile(0.25, QuantileMethod::Linear)
            .map_err(|e| CreditError::TransformError(e.to_string()))?
            .unwrap_or(0.0);
        let q3 = ca
            .quantile(0.75, QuantileMethod::Linear)
            .map_err(|e| CreditError::TransformError(e.to_string()))?
            .unwrap_or(0.0);
        let iqr = q3 - q1;

        Ok(ScaleParams {
            center: median,
            spread: if iqr == 0.0 { 1.0 } else { iqr },
        })
    }

    /// Scale every fitted column. Builds all replacement columns first, then
    /// applies them in a single pass.
    pub fn transform(&self, df: &DataFrame) -> Result<DataFrame> {
        if !self.is_fitted {
            return Err(CreditError::NotFitted);
        }

        let mut replacements = Vec::with_capacity(self.params.len());
        for (col_name, params) in &self.params {
            let column = df.column(col_name).map_err(|_| {
                CreditError::TransformError(format!("column '{col_name}' not found"))
            })?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| CreditError::TransformError(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| CreditError::TransformError(e.to_string()))?;

            let scaled: Float64Chunked = ca
                .into_iter()
                .map(|opt| opt.map(|v| (v - params.center) / params.spread))
                .collect();
            replacements.push(scaled.with_name(column.name().clone()).into_series());
        }

        let mut result = df.clone();
        for scaled in replacements {
            result = result
                .with_column(scaled)
                .map_err(|e| CreditError::TransformError(e.to_string()))?
                .clone();
        }

        Ok(result)
    }

    /// Fitted (center, spread) for a column, if any
    pub fn params(&self, column: &str) -> Option<(f64, f64)> {
        self.params.get(column).map(|p| (p.center, p.spread))
    }
}
