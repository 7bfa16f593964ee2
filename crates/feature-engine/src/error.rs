//! Feature Transformation Error Types

use data_validator::ValidationError;
use thiserror::Error;

/// Errors raised while turning a raw record into a feature vector
#[derive(Debug, Error)]
pub enum FeatureError {
    /// Categorical value outside its fixed enumeration
    #[error("Unknown {field} category: {value:?}")]
    UnknownCategory { field: &'static str, value: String },

    /// Canonical feature order missing, empty or inconsistent
    #[error("Schema mismatch: {0}")]
    SchemaMismatch(String),

    /// Scaler and feature vector disagree on column count
    #[error("Dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A non-indicator canonical column is absent from the encoded record
    #[error("Numeric feature {0} is missing and cannot be zero-filled")]
    MissingNumericFeature(String),

    /// Month number outside 1..=12
    #[error("Month {0} is outside 1..=12")]
    InvalidMonth(i64),

    /// Nothing to fit on
    #[error("Cannot fit on an empty batch")]
    EmptyBatch,

    /// Numeric field failed range validation
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Matrix assembly failed
    #[error("Matrix shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),
}

impl FeatureError {
    /// Whether the error points at bad caller input rather than bad artifacts
    pub fn is_invalid_input(&self) -> bool {
        matches!(
            self,
            FeatureError::UnknownCategory { .. }
                | FeatureError::InvalidMonth(_)
                | FeatureError::Validation(_)
        )
    }
}
