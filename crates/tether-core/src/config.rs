//! Bot configuration loaded from a YAML file.
//!
//! ```yaml
//! log:     { dir: /var/log/tether }
//! storage: { dir: /var/lib/tether }
//! service:
//!   api: http://control.example/api
//!   websocket: ws://control.example/channel
//! ```
//!
//! Loading creates `log.dir` and `storage.dir` recursively if absent.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while loading the config file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Read(#[source] std::io::Error),

    #[error("failed to parse config file: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("failed to create directory {dir}: {source}")]
    CreateDir {
        dir: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Top-level bot configuration.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct BotConfig {
    pub log: LogConfig,
    pub storage: StorageConfig,
    pub service: ServiceConfig,
}

/// Logging output location.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LogConfig {
    /// Directory holding the rolling `bot.log` files.
    pub dir: PathBuf,
}

/// Persistent state location.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Directory holding the `robot_id` identity record.
    pub dir: PathBuf,
}

/// Remote control service endpoints.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServiceConfig {
    /// Base URL of the HTTP control plane.
    pub api: String,
    /// Base URL of the WebSocket control channel.
    pub websocket: String,
}

impl BotConfig {
    /// Load and validate a config file, creating the log and storage
    /// directories if they do not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path.as_ref()).map_err(ConfigError::Read)?;
        let config: Self = serde_yaml::from_str(&raw)?;
        config.ensure_dirs()?;
        Ok(config)
    }

    fn ensure_dirs(&self) -> Result<(), ConfigError> {
        for dir in [&self.log.dir, &self.storage.dir] {
            fs::create_dir_all(dir).map_err(|source| ConfigError::CreateDir {
                dir: dir.clone(),
                source,
            })?;
        }
        Ok(())
    }
}
