//! Canonical feature schema
//!
//! Single source of truth for the ten applicant features: their names, order,
//! and numeric kinds. Training and serving both build feature matrices through
//! this module, so field order cannot drift between the two.

use crate::error::{CreditError, Result};
use ndarray::Array2;
use polars::prelude::*;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Numeric kind of a schema field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    /// Integer-valued (counts, age)
    Int,
    /// Real-valued (ratios, amounts)
    Float,
}

/// One field of the canonical schema
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Whether a value must be present in every record. Non-required fields
    /// may be absent or null and are filled by the fitted imputer.
    pub required: bool,
    pub description: &'static str,
}

/// The ten applicant features, in canonical order
pub const FEATURES: [FieldSpec; 10] = [
    FieldSpec {
        name: "utilization",
        kind: FieldKind::Float,
        required: true,
        description: "Revolving utilization of unsecured credit lines",
    },
    FieldSpec {
        name: "age",
        kind: FieldKind::Int,
        required: true,
        description: "Applicant age in years",
    },
    FieldSpec {
        name: "late30",
        kind: FieldKind::Int,
        required: true,
        description: "Times 30-59 days past due in the last two years",
    },
    FieldSpec {
        name: "debtRatio",
        kind: FieldKind::Float,
        required: true,
        description: "Monthly debt payments divided by monthly gross income",
    },
    FieldSpec {
        name: "income",
        kind: FieldKind::Float,
        required: false,
        description: "Monthly income",
    },
    FieldSpec {
        name: "openLines",
        kind: FieldKind::Int,
        required: true,
        description: "Open credit lines and loans",
    },
    FieldSpec {
        name: "late90",
        kind: FieldKind::Int,
        required: true,
        description: "Times 90 or more days past due",
    },
    FieldSpec {
        name: "realEstate",
        kind: FieldKind::Int,
        required: true,
        description: "Mortgage and real estate loans or lines",
    },
    FieldSpec {
        name: "late60",
        kind: FieldKind::Int,
        required: true,
        description: "Times 60-89 days past due in the last two years",
    },
    FieldSpec {
        name: "dependents",
        kind: FieldKind::Float,
        required: false,
        description: "Number of dependents in the household",
    },
];

/// Feature names in canonical order
pub fn feature_names() -> Vec<&'static str> {
    FEATURES.iter().map(|f| f.name).collect()
}

/// A validated applicant record. `income` and `dependents` may be missing;
/// every other field is mandatory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRecord {
    pub utilization: f64,
    pub age: f64,
    pub late30: f64,
    #[serde(rename = "debtRatio")]
    pub debt_ratio: f64,
    pub income: Option<f64>,
    #[serde(rename = "openLines")]
    pub open_lines: f64,
    pub late90: f64,
    #[serde(rename = "realEstate")]
    pub real_estate: f64,
    pub late60: f64,
    pub dependents: Option<f64>,
}

impl FeatureRecord {
    /// Field values in canonical order; `None` marks a missing optional value.
    pub fn to_row(&self) -> Vec<Option<f64>> {
        vec![
            Some(self.utilization),
            Some(self.age),
            Some(self.late30),
            Some(self.debt_ratio),
            self.income,
            Some(self.open_lines),
            Some(self.late90),
            Some(self.real_estate),
            Some(self.late60),
            self.dependents,
        ]
    }

    /// Single-row DataFrame with the canonical columns, missing values as nulls
    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let row = self.to_row();
        let columns: Vec<Column> = FEATURES
            .iter()
            .zip(row)
            .map(|(spec, value)| {
                let series = Series::new(spec.name.into(), &[value]);
                series.into()
            })
            .collect();

        DataFrame::new(columns).map_err(|e| CreditError::TransformError(e.to_string()))
    }
}

/// Validate a loosely-typed request body against the schema, producing a
/// strongly-typed record or a structured error naming the offending field.
///
/// Rules: every required field present, every present value a finite
/// non-negative number, integer fields integer-valued, no unknown fields.
/// No implicit defaulting.
pub fn validate(fields: &Map<String, Value>) -> Result<FeatureRecord> {
    for key in fields.keys() {
        if !FEATURES.iter().any(|f| f.name == key) {
            return Err(CreditError::SchemaError {
                field: key.clone(),
                reason: "unknown field".to_string(),
            });
        }
    }

    let mut values: Vec<Option<f64>> = Vec::with_capacity(FEATURES.len());
    for spec in &FEATURES {
        let value = match fields.get(spec.name) {
            None | Some(Value::Null) => {
                if spec.required {
                    return Err(CreditError::SchemaError {
                        field: spec.name.to_string(),
                        reason: "required field is missing".to_string(),
                    });
                }
                values.push(None);
                continue;
            }
            Some(v) => v,
        };

        let number = coerce_numeric(spec, value)?;
        values.push(Some(number));
    }

    Ok(FeatureRecord {
        utilization: values[0].unwrap(),
        age: values[1].unwrap(),
        late30: values[2].unwrap(),
        debt_ratio: values[3].unwrap(),
        income: values[4],
        open_lines: values[5].unwrap(),
        late90: values[6].unwrap(),
        real_estate: values[7].unwrap(),
        late60: values[8].unwrap(),
        dependents: values[9],
    })
}

fn coerce_numeric(spec: &FieldSpec, value: &Value) -> Result<f64> {
    let number = value
        .as_f64()
        .ok_or_else(|| CreditError::SchemaError {
            field: spec.name.to_string(),
            reason: format!("expected a number, got {value}"),
        })?;

    if !number.is_finite() {
        return Err(CreditError::SchemaError {
            field: spec.name.to_string(),
            reason: "value is not finite".to_string(),
        });
    }
    if number < 0.0 {
        return Err(CreditError::SchemaError {
            field: spec.name.to_string(),
            reason: "value must be non-negative".to_string(),
        });
    }
    if spec.kind == FieldKind::Int && number.fract() != 0.0 {
        return Err(CreditError::SchemaError {
            field: spec.name.to_string(),
            reason: "expected an integer".to_string(),
        });
    }

    Ok(number)
}

/// Extract the canonical feature columns from a DataFrame into a row-major
/// matrix, in schema order. A missing column is a transform-time error, not a
/// silent substitution.
pub fn to_feature_matrix(df: &DataFrame) -> Result<Array2<f64>> {
    let n_rows = df.height();
    let n_cols = FEATURES.len();

    let col_data: Vec<Vec<f64>> = FEATURES
        .iter()
        .map(|spec| {
            let column = df.column(spec.name).map_err(|_| {
                CreditError::TransformError(format!("column '{}' not found", spec.name))
            })?;
            let casted = column
                .cast(&DataType::Float64)
                .map_err(|e| CreditError::TransformError(e.to_string()))?;
            let ca = casted
                .f64()
                .map_err(|e| CreditError::TransformError(e.to_string()))?;

            ca.into_iter()
                .enumerate()
                .map(|(row, v)| {
                    v.ok_or_else(|| {
                        CreditError::TransformError(format!(
                            "column '{}' has a non-numeric value at row {row}",
                            spec.name
                        ))
                    })
                })
                .collect::<Result<Vec<f64>>>()
        })
        .collect::<Result<Vec<Vec<f64>>>>()?;

    let col_refs: Vec<&[f64]> = col_data.iter().map(|c| c.as_slice()).collect();
    Ok(Array2::from_shape_fn((n_rows, n_cols), |(r, c)| {
        col_refs[c][r]
    }))
}
