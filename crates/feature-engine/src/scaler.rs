//! Standardization Scaler

use ndarray::{Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::FeatureError;

/// Per-column mean and scale, fit once on the training matrix
///
/// There is no way to refit an existing value: the only constructors are
/// [`FittedScaler::fit`] and deserialization of a persisted state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ScalerState", into = "ScalerState")]
pub struct FittedScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

/// Persisted form of a [`FittedScaler`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScalerState {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl FittedScaler {
    /// Fit per-column mean and population standard deviation
    ///
    /// Zero-variance columns get scale 1, so they come out centered but
    /// unscaled instead of dividing by zero.
    pub fn fit(matrix: &Array2<f64>) -> Result<Self, FeatureError> {
        if matrix.nrows() == 0 || matrix.ncols() == 0 {
            return Err(FeatureError::EmptyBatch);
        }

        let n = matrix.nrows() as f64;
        let mean = matrix.mean_axis(Axis(0)).ok_or(FeatureError::EmptyBatch)?;
        let variance = matrix.var_axis(Axis(0), 0.0);

        let scale: Vec<f64> = mean
            .iter()
            .zip(variance.iter())
            .map(|(&m, &var)| {
                // Rounding in the mean leaves a constant column with a
                // variance on the order of (n * m * eps)^2, not exactly 0.
                let bound = n * f64::EPSILON * var + (n * m * f64::EPSILON).powi(2);
                if var <= bound || !var.is_finite() {
                    1.0
                } else {
                    var.sqrt()
                }
            })
            .collect();

        let constant = scale.iter().filter(|&&s| s == 1.0).count();
        debug!(
            "Fitted scaler on {}x{} matrix ({} columns with unit scale)",
            matrix.nrows(),
            matrix.ncols(),
            constant
        );

        Ok(Self {
            mean: mean.to_vec(),
            scale,
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }

    /// Standardize every row of a matrix
    pub fn transform(&self, matrix: &Array2<f64>) -> Result<Array2<f64>, FeatureError> {
        self.check_width(matrix.ncols())?;

        let mut out = matrix.to_owned();
        for mut row in out.rows_mut() {
            for (j, value) in row.iter_mut().enumerate() {
                *value = self.standardize(j, *value);
            }
        }
        Ok(out)
    }

    /// Standardize a single row
    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, FeatureError> {
        self.check_width(row.len())?;
        Ok(row
            .iter()
            .enumerate()
            .map(|(j, &value)| self.standardize(j, value))
            .collect())
    }

    fn standardize(&self, column: usize, value: f64) -> f64 {
        (value - self.mean[column]) / self.scale[column]
    }

    fn check_width(&self, actual: usize) -> Result<(), FeatureError> {
        if actual == self.n_features() {
            Ok(())
        } else {
            Err(FeatureError::DimensionMismatch {
                expected: self.n_features(),
                actual,
            })
        }
    }
}

impl TryFrom<ScalerState> for FittedScaler {
    type Error = FeatureError;

    fn try_from(state: ScalerState) -> Result<Self, Self::Error> {
        if state.mean.is_empty() {
            return Err(FeatureError::EmptyBatch);
        }
        if state.mean.len() != state.scale.len() {
            return Err(FeatureError::DimensionMismatch {
                expected: state.mean.len(),
                actual: state.scale.len(),
            });
        }
        if let Some(bad) = state.scale.iter().find(|s| !(s.is_finite() && **s > 0.0)) {
            return Err(FeatureError::SchemaMismatch(format!(
                "scaler state holds non-positive scale {bad}"
            )));
        }
        Ok(Self {
            mean: state.mean,
            scale: state.scale,
        })
    }
}

impl From<FittedScaler> for ScalerState {
    fn from(scaler: FittedScaler) -> Self {
        Self {
            mean: scaler.mean,
            scale: scaler.scale,
        }
    }
}
