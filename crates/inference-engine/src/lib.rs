//! Fuel Consumption Inference
//!
//! Regression model, serving artifact bundle and per-feature explanations
//! on top of the shared feature transformation pipeline.

mod engine;
mod evaluation;
mod model;

pub use engine::{Explanation, InferenceEngine, InferenceResult, ServingArtifacts};
pub use evaluation::RegressionMetrics;
pub use model::{LinearModel, RegressionModel};

use feature_engine::FeatureError;
use storage::StorageError;
use thiserror::Error;

/// Errors during inference
#[derive(Debug, Error)]
pub enum InferenceError {
    /// Serving artifacts are not loaded
    #[error("Model not ready: {0}")]
    NotReady(String),
    #[error(transparent)]
    Feature(#[from] FeatureError),
    #[error("Invalid input shape: expected {expected}, got {actual}")]
    InvalidInputShape { expected: usize, actual: usize },
    #[error("Training failed: {0}")]
    Training(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
