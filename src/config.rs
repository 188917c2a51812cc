//! Runtime configuration persisted as TOML under the app root.
//!
//! Missing files load as defaults so a fresh install works without setup.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::app_dirs;

/// Default filename used to store the configuration.
pub const CONFIG_FILE_NAME: &str = "config.toml";

/// Default decision threshold applied when none is configured.
pub const DEFAULT_THRESHOLD: f32 = 0.5;

/// Errors that can occur while loading or saving the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The app directory could not be resolved or created.
    #[error(transparent)]
    AppDir(#[from] app_dirs::AppDirError),
    /// Failed to read the configuration file.
    #[error("Failed to read config at {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML.
    #[error("Failed to parse config at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: toml::de::Error,
    },
    /// Failed to serialize or write the configuration file.
    #[error("Failed to write config at {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// User-tunable settings for the decision core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoreConfig {
    /// Probability threshold that separates the high tier.
    pub threshold: f32,
    /// Optional CSV dataset path consulted before the synthetic fallback.
    pub dataset_path: Option<PathBuf>,
    /// Optional override for where model artifacts are stored.
    pub artifact_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            dataset_path: None,
            artifact_dir: None,
        }
    }
}

impl CoreConfig {
    /// Clamp out-of-range values loaded from disk into usable bounds.
    fn normalized(mut self) -> Self {
        if !self.threshold.is_finite() {
            self.threshold = DEFAULT_THRESHOLD;
        }
        self.threshold = self.threshold.clamp(0.0, 1.0);
        self
    }
}

/// Resolve the configuration file path, ensuring the parent directory exists.
pub fn config_path() -> Result<PathBuf, ConfigError> {
    Ok(app_dirs::app_root_dir()?.join(CONFIG_FILE_NAME))
}

/// Load configuration from the default location, returning defaults if missing.
pub fn load_or_default() -> Result<CoreConfig, ConfigError> {
    load_from(&config_path()?)
}

/// Load configuration from a specific path, returning defaults if missing.
pub fn load_from(path: &Path) -> Result<CoreConfig, ConfigError> {
    if !path.exists() {
        return Ok(CoreConfig::default());
    }
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: CoreConfig = toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(config.normalized())
}

/// Persist configuration to the default location.
pub fn save(config: &CoreConfig) -> Result<(), ConfigError> {
    save_to_path(config, &config_path()?)
}

/// Save configuration to a specific path, creating parent directories as needed.
pub fn save_to_path(config: &CoreConfig, path: &Path) -> Result<(), ConfigError> {
    let map_write = |source: std::io::Error| ConfigError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(map_write)?;
    }
    let text = toml::to_string_pretty(config)
        .map_err(|err| map_write(std::io::Error::other(err.to_string())))?;
    std::fs::write(path, text).map_err(map_write)
}
