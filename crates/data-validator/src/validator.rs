//! Data Validator for Range Checking

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Validation configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Upper bound on voyage distance (lower bound is exclusive zero)
    pub max_distance: f64,
    /// Engine efficiency valid range (%)
    pub efficiency_range: (f64, f64),
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_distance: f64::MAX,
            efficiency_range: (0.0, 100.0),
        }
    }
}

/// Validator for the numeric fields of a voyage record
#[derive(Debug, Clone)]
pub struct Validator {
    config: ValidationConfig,
}

impl Validator {
    /// Create a new validator with given config
    pub fn new(config: ValidationConfig) -> Self {
        Self { config }
    }

    /// Validate a single value against an inclusive range
    pub fn validate_range(
        &self,
        field: &'static str,
        value: f64,
        range: (f64, f64),
    ) -> Result<(), ValidationError> {
        Self::validate_finite(field, value)?;
        if value < range.0 || value > range.1 {
            Err(ValidationError::OutOfRange {
                field,
                value,
                min: range.0,
                max: range.1,
            })
        } else {
            Ok(())
        }
    }

    /// Validate voyage distance (strictly positive)
    pub fn validate_distance(&self, distance: f64) -> Result<(), ValidationError> {
        Self::validate_finite("distance", distance)?;
        if distance <= 0.0 {
            return Err(ValidationError::NotPositive {
                field: "distance",
                value: distance,
            });
        }
        self.validate_range("distance", distance, (0.0, self.config.max_distance))
    }

    /// Validate engine efficiency percentage
    pub fn validate_engine_efficiency(&self, efficiency: f64) -> Result<(), ValidationError> {
        self.validate_range("engine_efficiency", efficiency, self.config.efficiency_range)
    }

    /// Validate all numeric fields of a record
    pub fn validate_record_fields(
        &self,
        distance: f64,
        engine_efficiency: f64,
    ) -> Result<(), ValidationError> {
        self.validate_distance(distance)?;
        self.validate_engine_efficiency(engine_efficiency)?;
        debug!("Validated distance={} efficiency={}", distance, engine_efficiency);
        Ok(())
    }

    fn validate_finite(field: &'static str, value: f64) -> Result<(), ValidationError> {
        if value.is_finite() {
            Ok(())
        } else {
            Err(ValidationError::NonFinite { field })
        }
    }
}

impl Default for Validator {
    fn default() -> Self {
        Self::new(ValidationConfig::default())
    }
}
