//! Error types for the regarima library.

use thiserror::Error;

/// Result type alias for model-identification operations.
pub type Result<T> = std::result::Result<T, RegArimaError>;

/// Errors that can occur during model identification and estimation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RegArimaError {
    /// Input data is empty.
    #[error("empty input data")]
    EmptyData,

    /// Insufficient data points for the operation.
    #[error("insufficient data: need at least {needed}, got {got}")]
    InsufficientData { needed: usize, got: usize },

    /// Unsupported annual frequency.
    #[error("unsupported frequency: {0} (expected 1, 2, 3, 4, 6 or 12)")]
    UnsupportedFrequency(usize),

    /// Invalid parameter value.
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Dimension mismatch between data structures.
    #[error("dimension mismatch: expected {expected}, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    /// Missing values detected in the input series.
    #[error("missing values detected in data")]
    MissingValues,

    /// Log transformation requested on a series with non-positive values.
    #[error("log transformation requires strictly positive data")]
    NonPositiveData,

    /// The numeric estimation primitive failed.
    #[error("estimation failed: {0}")]
    Estimation(String),

    /// Numerical computation error (singular matrix, non-finite objective).
    #[error("computation error: {0}")]
    Computation(String),
}
