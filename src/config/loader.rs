//! Configuration file loader
//! Loads the optional YAML configuration file for the log server

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::config::AppConfig;
use crate::error::LogError;

/// On-disk configuration; every field is optional and overrides the default
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConfigFile {
    pub server_host: Option<String>,
    pub server_port: Option<u16>,
    pub seed_path: Option<PathBuf>,
    pub server_id: Option<String>,
}

impl ConfigFile {
    /// Load a YAML file and deserialize it
    pub fn load_yaml(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref();
        info!("Loading log server configuration from: {:?}", path);

        if !path.exists() {
            return Err(LogError::ConfigError(format!(
                "Configuration file not found: {:?}",
                path
            )));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            LogError::ConfigError(format!("Failed to read {:?}: {}", path, e))
        })?;

        serde_yaml::from_str(&contents).map_err(|e| {
            LogError::ConfigError(format!("Failed to parse {:?}: {}", path, e))
        })
    }

    pub fn apply_to(self, config: &mut AppConfig) {
        if let Some(host) = self.server_host {
            config.server_host = host;
        }
        if let Some(port) = self.server_port {
            config.server_port = port;
        }
        if let Some(path) = self.seed_path {
            config.seed_path = Some(path);
        }
        if let Some(server_id) = self.server_id {
            config.server_id = server_id;
        }
    }
}
