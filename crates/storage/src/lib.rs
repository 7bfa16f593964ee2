//! Storage Layer
//!
//! Provides the file-backed artifact store written by the trainer and read
//! at service startup, plus an in-memory prediction history with
//! predicted versus actual consumption analytics.

mod analytics;
mod artifacts;
mod repository;

pub use analytics::{
    DeviationCategory, DeviationHistogram, DeviationSummary, ShipDeviation, WeatherConsumption,
};
pub use artifacts::{ArtifactKind, ArtifactStore};
pub use repository::{HistoryFilter, PredictionRecord, Repository};

use std::path::PathBuf;
use thiserror::Error;

/// Storage errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Artifact not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Serialization error in {}: {source}", .path.display())]
    Serialization {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("Prediction {0} not found")]
    RecordNotFound(i64),
    #[error("Invalid value: {0}")]
    InvalidValue(String),
    #[error("Lock error: {0}")]
    Lock(String),
}
