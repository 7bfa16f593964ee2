//! Held-out Evaluation Metrics

use serde::{Deserialize, Serialize};

use crate::InferenceError;

/// Standard regression error metrics
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegressionMetrics {
    /// Mean absolute error
    pub mae: f64,
    /// Root mean squared error
    pub rmse: f64,
    /// Coefficient of determination
    pub r_squared: f64,
}

impl RegressionMetrics {
    pub fn evaluate(y_true: &[f64], y_pred: &[f64]) -> Result<Self, InferenceError> {
        if y_true.len() != y_pred.len() {
            return Err(InferenceError::InvalidInputShape {
                expected: y_true.len(),
                actual: y_pred.len(),
            });
        }
        if y_true.is_empty() {
            return Err(InferenceError::Training("cannot evaluate on zero samples".to_string()));
        }

        let n = y_true.len() as f64;
        let mean = y_true.iter().sum::<f64>() / n;

        let mut abs_sum = 0.0;
        let mut sq_sum = 0.0;
        let mut total = 0.0;
        for (t, p) in y_true.iter().zip(y_pred) {
            let err = t - p;
            abs_sum += err.abs();
            sq_sum += err * err;
            total += (t - mean).powi(2);
        }

        // Constant targets: perfect fit scores 1, anything else 0
        let r_squared = if total > 0.0 {
            1.0 - sq_sum / total
        } else if sq_sum == 0.0 {
            1.0
        } else {
            0.0
        };

        Ok(Self {
            mae: abs_sum / n,
            rmse: (sq_sum / n).sqrt(),
            r_squared,
        })
    }
}
