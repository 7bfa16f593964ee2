//! Service Configuration

use config::{Config, ConfigError, Environment, File};
use feature_engine::PipelineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Settings for the prediction service
///
/// Layered from built-in defaults, an optional TOML file and `OPTIFUEL_*`
/// environment variables, in increasing precedence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Socket address to listen on
    pub bind_addr: String,
    /// Directory holding the trained artifacts
    pub artifacts_dir: PathBuf,
    /// Zero-filled share above which a request is flagged
    pub max_zero_fill_fraction: f64,
    /// Predictions kept in memory for the history endpoint
    pub history_limit: usize,
    /// Emit logs as JSON lines
    pub log_json: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind_addr: "0.0.0.0:8000".to_string(),
            artifacts_dir: PathBuf::from("artifacts"),
            max_zero_fill_fraction: 0.5,
            history_limit: 10_000,
            log_json: false,
        }
    }
}

impl ServiceConfig {
    pub const DEFAULT_FILE: &'static str = "optifuel.toml";
    pub const ENV_PREFIX: &'static str = "OPTIFUEL";

    /// Load from `optifuel.toml` in the working directory and the environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(Self::DEFAULT_FILE))
    }

    /// Load from the given file, which may be absent, and the environment
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(File::from(path).required(false))
            .add_source(Environment::with_prefix(Self::ENV_PREFIX).try_parsing(true))
            .build()?
            .try_deserialize()
    }

    pub fn pipeline(&self) -> PipelineConfig {
        PipelineConfig {
            max_zero_fill_fraction: self.max_zero_fill_fraction,
            ..Default::default()
        }
    }
}
