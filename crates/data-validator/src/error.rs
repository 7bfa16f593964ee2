//! Validation Error Types

use thiserror::Error;

/// Errors during data validation
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    /// Value out of allowed range
    #[error("{field} value {value} is out of range [{min}, {max}]")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Value must be strictly greater than zero
    #[error("{field} must be greater than 0, got {value}")]
    NotPositive { field: &'static str, value: f64 },

    /// NaN or infinite input
    #[error("{field} is not a finite number")]
    NonFinite { field: &'static str },
}
