//! Regression Models

use ndarray::{Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::InferenceError;

/// A model scoring feature vectors laid out in canonical order
pub trait RegressionModel: Send + Sync {
    /// Feature vector length the model was fit on
    fn n_features(&self) -> usize;

    /// Score one feature vector
    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError>;

    /// Expected output over the training distribution
    fn base_value(&self) -> f64;

    /// Signed per-feature contributions; they sum to `predict - base_value`
    fn contributions(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError>;

    fn check_width(&self, features: &[f64]) -> Result<(), InferenceError> {
        if features.len() == self.n_features() {
            Ok(())
        } else {
            Err(InferenceError::InvalidInputShape {
                expected: self.n_features(),
                actual: features.len(),
            })
        }
    }
}

/// Ridge-regularized linear regression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearModel {
    intercept: f64,
    coefficients: Vec<f64>,
    /// Training mean of every input column
    feature_means: Vec<f64>,
}

impl LinearModel {
    pub fn new(intercept: f64, coefficients: Vec<f64>, feature_means: Vec<f64>) -> Result<Self, InferenceError> {
        if coefficients.len() != feature_means.len() {
            return Err(InferenceError::InvalidInputShape {
                expected: coefficients.len(),
                actual: feature_means.len(),
            });
        }
        Ok(Self {
            intercept,
            coefficients,
            feature_means,
        })
    }

    /// Fit on a scaled feature matrix
    ///
    /// Solves `(XcᵀXc + λI) w = Xcᵀ(y - ȳ)` on centered columns, leaving the
    /// intercept unpenalized. A positive `ridge` keeps the system solvable
    /// when indicator groups are collinear with the intercept.
    pub fn fit(x: &Array2<f64>, y: &[f64], ridge: f64) -> Result<Self, InferenceError> {
        if x.nrows() == 0 {
            return Err(InferenceError::Training("no training rows".to_string()));
        }
        if y.len() != x.nrows() {
            return Err(InferenceError::InvalidInputShape {
                expected: x.nrows(),
                actual: y.len(),
            });
        }
        if !(ridge >= 0.0 && ridge.is_finite()) {
            return Err(InferenceError::Training(format!("invalid ridge penalty {ridge}")));
        }

        let x_mean = x
            .mean_axis(Axis(0))
            .ok_or_else(|| InferenceError::Training("no training rows".to_string()))?;
        let y_mean = y.iter().sum::<f64>() / y.len() as f64;

        let mut xc = x.to_owned();
        for mut row in xc.rows_mut() {
            row -= &x_mean;
        }
        let yc: Array1<f64> = y.iter().map(|v| v - y_mean).collect();

        let mut gram = xc.t().dot(&xc);
        for i in 0..gram.nrows() {
            gram[[i, i]] += ridge;
        }
        let rhs = xc.t().dot(&yc);

        let weights = solve(gram, rhs)?;
        let intercept = y_mean - x_mean.dot(&weights);

        info!(
            "Fitted linear model on {}x{} matrix (ridge={})",
            x.nrows(),
            x.ncols(),
            ridge
        );

        Self::new(intercept, weights.to_vec(), x_mean.to_vec())
    }

    pub fn intercept(&self) -> f64 {
        self.intercept
    }

    pub fn coefficients(&self) -> &[f64] {
        &self.coefficients
    }

    /// Score every row of a matrix
    pub fn predict_batch(&self, x: &Array2<f64>) -> Result<Vec<f64>, InferenceError> {
        x.rows()
            .into_iter()
            .map(|row| match row.as_slice() {
                Some(slice) => self.predict(slice),
                None => self.predict(&row.to_vec()),
            })
            .collect()
    }
}

impl RegressionModel for LinearModel {
    fn n_features(&self) -> usize {
        self.coefficients.len()
    }

    fn predict(&self, features: &[f64]) -> Result<f64, InferenceError> {
        self.check_width(features)?;
        Ok(self.intercept
            + self
                .coefficients
                .iter()
                .zip(features)
                .map(|(w, x)| w * x)
                .sum::<f64>())
    }

    fn base_value(&self) -> f64 {
        self.intercept
            + self
                .coefficients
                .iter()
                .zip(&self.feature_means)
                .map(|(w, m)| w * m)
                .sum::<f64>()
    }

    fn contributions(&self, features: &[f64]) -> Result<Vec<f64>, InferenceError> {
        self.check_width(features)?;
        Ok(self
            .coefficients
            .iter()
            .zip(features.iter().zip(&self.feature_means))
            .map(|(w, (x, m))| w * (x - m))
            .collect())
    }
}

/// Gaussian elimination with partial pivoting
fn solve(mut a: Array2<f64>, mut b: Array1<f64>) -> Result<Array1<f64>, InferenceError> {
    let n = b.len();

    for col in 0..n {
        let pivot = (col..n)
            .max_by(|&i, &j| a[[i, col]].abs().total_cmp(&a[[j, col]].abs()))
            .unwrap_or(col);

        if a[[pivot, col]].abs() < 1e-12 {
            return Err(InferenceError::Training(format!(
                "normal equations are singular at column {col}; increase the ridge penalty"
            )));
        }

        if pivot != col {
            for k in 0..n {
                a.swap([col, k], [pivot, k]);
            }
            b.swap(col, pivot);
        }

        for row in (col + 1)..n {
            let factor = a[[row, col]] / a[[col, col]];
            if factor == 0.0 {
                continue;
            }
            for k in col..n {
                a[[row, k]] -= factor * a[[col, k]];
            }
            b[row] -= factor * b[col];
        }
    }

    let mut x = Array1::zeros(n);
    for row in (0..n).rev() {
        let tail: f64 = ((row + 1)..n).map(|k| a[[row, k]] * x[k]).sum();
        x[row] = (b[row] - tail) / a[[row, row]];
    }

    debug!("Solved {}x{} linear system", n, n);
    Ok(x)
}
