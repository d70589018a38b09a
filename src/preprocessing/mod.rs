//! Feature preprocessing
//!
//! Median imputation for missing values and robust (median/IQR) scaling,
//! with a strict fit/transform split: parameters come from the training data
//! only and are frozen into the scoring artifact.

mod imputer;
mod scaler;
mod pipeline;

pub use imputer::MedianImputer;
pub use scaler::RobustScaler;
pub use pipeline::Preprocessor;
