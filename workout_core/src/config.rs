//! Configuration file support for wkt.
//!
//! Configuration is loaded from `$XDG_CONFIG_HOME/wkt/config.toml`.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Application configuration
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub data: DataConfig,

    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Data storage configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DataConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    /// Program library file name, relative to `data_dir`
    #[serde(default = "default_program_file")]
    pub program_file: String,

    /// Progress store file name, relative to `data_dir`
    #[serde(default = "default_store_file")]
    pub store_file: String,
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            program_file: default_program_file(),
            store_file: default_store_file(),
        }
    }
}

impl DataConfig {
    pub fn program_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.program_file)
    }

    pub fn store_path(&self, data_dir: &Path) -> PathBuf {
        data_dir.join(&self.store_file)
    }
}

/// Progress engine behaviour
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProgressConfig {
    /// Slot note used when a skip carries no reason
    #[serde(default = "default_skip_reason")]
    pub default_skip_reason: String,

    /// Number of records returned by history when no limit is given
    #[serde(default = "default_history_limit")]
    pub history_limit: usize,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            default_skip_reason: default_skip_reason(),
            history_limit: default_history_limit(),
        }
    }
}

// Default value functions
fn default_data_dir() -> PathBuf {
    let base = dirs::data_local_dir()
        .or_else(|| dirs::home_dir().map(|home| home.join(".local/share")))
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("wkt")
}

fn default_program_file() -> String {
    "programs.json".into()
}

fn default_store_file() -> String {
    "progress.json".into()
}

fn default_skip_reason() -> String {
    "Skipped".into()
}

fn default_history_limit() -> usize {
    20
}

impl Config {
    /// Load configuration from the standard config path
    pub fn load() -> Result<Self> {
        let config_path = Self::default_config_path();
        if config_path.exists() {
            Self::load_from(&config_path)
        } else {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        tracing::info!("Loaded config from {:?}", path);
        Ok(config)
    }

    /// Get the default config file path
    pub fn default_config_path() -> PathBuf {
        let base = dirs::config_dir()
            .or_else(|| dirs::home_dir().map(|home| home.join(".config")))
            .unwrap_or_else(|| PathBuf::from("."));
        base.join("wkt").join("config.toml")
    }

    /// Reject settings the engine cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.data.program_file.trim().is_empty() {
            return Err(Error::Config("data.program_file must not be empty".into()));
        }
        if self.data.store_file.trim().is_empty() {
            return Err(Error::Config("data.store_file must not be empty".into()));
        }
        if self.progress.history_limit == 0 {
            return Err(Error::Config("progress.history_limit must be positive".into()));
        }
        Ok(())
    }

    /// Save the current configuration to a specific path
    pub fn save_to(&self, path: &Path) -> Result<()> {
        // Ensure parent directory exists
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(path, contents)?;
        tracing::info!("Saved config to {:?}", path);
        Ok(())
    }
}
