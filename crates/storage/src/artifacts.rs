//! Artifact Store
//!
//! Three named, versionless JSON blobs in one directory: the trained model,
//! the fitted scaler and the canonical feature order. The trainer writes
//! them; the service only reads them.

use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::StorageError;

/// Named artifacts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Trained regression model
    Model,
    /// Fitted standardization state
    Scaler,
    /// Canonical feature order
    FeatureOrder,
    /// Held-out evaluation report of the last training run
    TrainingReport,
}

impl ArtifactKind {
    /// Artifacts required before the service can score requests
    pub const SERVING: [ArtifactKind; 3] = [
        ArtifactKind::Model,
        ArtifactKind::Scaler,
        ArtifactKind::FeatureOrder,
    ];

    pub fn file_name(&self) -> &'static str {
        match self {
            ArtifactKind::Model => "best_model.json",
            ArtifactKind::Scaler => "scaler.json",
            ArtifactKind::FeatureOrder => "feature_order.json",
            ArtifactKind::TrainingReport => "training_report.json",
        }
    }
}

/// Directory-backed artifact store
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    dir: PathBuf,
}

impl ArtifactStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path(&self, kind: ArtifactKind) -> PathBuf {
        self.dir.join(kind.file_name())
    }

    pub fn exists(&self, kind: ArtifactKind) -> bool {
        self.path(kind).is_file()
    }

    /// Serving artifacts absent from the store
    pub fn missing(&self) -> Vec<ArtifactKind> {
        ArtifactKind::SERVING
            .into_iter()
            .filter(|kind| !self.exists(*kind))
            .collect()
    }

    /// Write an artifact, creating the directory if needed
    pub fn save<T: Serialize>(&self, kind: ArtifactKind, value: &T) -> Result<(), StorageError> {
        fs::create_dir_all(&self.dir).map_err(|source| StorageError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.path(kind);
        let file = File::create(&path).map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, value).map_err(|source| {
            StorageError::Serialization {
                path: path.clone(),
                source,
            }
        })?;
        writer.flush().map_err(|source| StorageError::Io {
            path: path.clone(),
            source,
        })?;

        info!("Saved {:?} artifact to {}", kind, path.display());
        Ok(())
    }

    /// Read an artifact; a missing file is [`StorageError::NotFound`]
    pub fn load<T: DeserializeOwned>(&self, kind: ArtifactKind) -> Result<T, StorageError> {
        let path = self.path(kind);
        let file = File::open(&path).map_err(|source| match source.kind() {
            ErrorKind::NotFound => StorageError::NotFound(path.clone()),
            _ => StorageError::Io {
                path: path.clone(),
                source,
            },
        })?;

        let value = serde_json::from_reader(BufReader::new(file))
            .map_err(|source| StorageError::Serialization {
                path: path.clone(),
                source,
            })?;

        debug!("Loaded {:?} artifact from {}", kind, path.display());
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path().join("artifacts"));

        let order = vec!["distance".to_string(), "month_sin".to_string()];
        store.save(ArtifactKind::FeatureOrder, &order).unwrap();

        let loaded: Vec<String> = store.load(ArtifactKind::FeatureOrder).unwrap();
        assert_eq!(loaded, order);
        assert!(store.exists(ArtifactKind::FeatureOrder));
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());

        let err = store.load::<Vec<String>>(ArtifactKind::Scaler).unwrap_err();
        assert!(matches!(err, StorageError::NotFound(ref p) if p.ends_with("scaler.json")));
        assert_eq!(store.missing(), ArtifactKind::SERVING.to_vec());
    }

    #[test]
    fn test_corrupt_artifact_is_serialization_error() {
        let dir = tempdir().unwrap();
        let store = ArtifactStore::new(dir.path());
        fs::write(store.path(ArtifactKind::FeatureOrder), "not json").unwrap();

        let err = store.load::<Vec<String>>(ArtifactKind::FeatureOrder).unwrap_err();
        assert!(matches!(err, StorageError::Serialization { .. }));
    }
}
