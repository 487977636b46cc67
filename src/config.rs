use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

use crate::error::{LogError, Result};

pub mod loader;

use loader::ConfigFile;

/// Environment variable naming an optional YAML config file
pub const CONFIG_PATH_VAR: &str = "MERKLE_LOG_CONFIG";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
    pub server_host: String,
    pub server_port: u16,
    pub seed_path: Option<PathBuf>,
    pub server_id: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server_host: "0.0.0.0".to_string(),
            server_port: 3000,
            seed_path: None,
            server_id: "merkle-log-01".to_string(),
        }
    }
}

impl AppConfig {
    /// Load from `MERKLE_LOG_CONFIG` (if set) with environment overrides
    pub fn load() -> Result<Self> {
        Self::load_with(|key| env::var(key).ok())
    }

    /// Same as [`AppConfig::load`], reading variables through `lookup`
    pub fn load_with<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let file = match lookup(CONFIG_PATH_VAR) {
            Some(path) => Some(ConfigFile::load_yaml(PathBuf::from(path))?),
            None => None,
        };
        Self::from_sources(file, lookup)
    }

    /// Defaults, then the config file, then individual variables from `lookup`
    pub fn from_sources<F>(file: Option<ConfigFile>, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(file) = file {
            file.apply_to(&mut config);
        }

        if let Some(host) = lookup("LOG_SERVER_HOST") {
            config.server_host = host;
        }

        if let Some(port) = lookup("LOG_SERVER_PORT") {
            config.server_port = port.parse().map_err(|e| {
                LogError::ConfigError(format!("Invalid LOG_SERVER_PORT {:?}: {}", port, e))
            })?;
        }

        if let Some(path) = lookup("LOG_SEED_PATH") {
            config.seed_path = Some(PathBuf::from(path));
        }

        if let Some(server_id) = lookup("LOG_SERVER_ID") {
            config.server_id = server_id;
        }

        Ok(config)
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::io::Write;

    fn lookup_from(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_sources(None, |_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
    }

    #[test]
    fn test_env_overrides() {
        let config = AppConfig::from_sources(
            None,
            lookup_from(&[
                ("LOG_SERVER_PORT", "8080"),
                ("LOG_SEED_PATH", "/var/lib/log/events.txt"),
                ("LOG_SERVER_ID", "log-eu-1"),
            ]),
        )
        .unwrap();

        assert_eq!(config.server_port, 8080);
        assert_eq!(
            config.seed_path,
            Some(PathBuf::from("/var/lib/log/events.txt"))
        );
        assert_eq!(config.server_id, "log-eu-1");
        assert_eq!(config.server_host, "0.0.0.0");
    }

    #[test]
    fn test_env_overrides_file() {
        let file = ConfigFile {
            server_host: Some("127.0.0.1".to_string()),
            server_port: Some(4000),
            ..Default::default()
        };
        let config =
            AppConfig::from_sources(Some(file), lookup_from(&[("LOG_SERVER_PORT", "5000")]))
                .unwrap();

        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 5000);
    }

    #[test]
    fn test_load_reads_named_yaml_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "server_host: 127.0.0.1").unwrap();
        writeln!(file, "server_port: 4100").unwrap();
        writeln!(file, "server_id: log-from-file").unwrap();
        let path = file.path().to_string_lossy().to_string();

        let config = AppConfig::load_with(lookup_from(&[
            (CONFIG_PATH_VAR, path.as_str()),
            ("LOG_SERVER_ID", "log-from-env"),
        ]))
        .unwrap();

        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.server_port, 4100);
        assert_eq!(config.server_id, "log-from-env");
        assert_eq!(config.seed_path, None);
    }

    #[test]
    fn test_load_with_missing_named_file() {
        let result = AppConfig::load_with(lookup_from(&[(
            CONFIG_PATH_VAR,
            "/nonexistent/merkle-log.yml",
        )]));
        assert!(matches!(result, Err(LogError::ConfigError(_))));
    }

    #[test]
    fn test_invalid_port() {
        let result = AppConfig::from_sources(None, lookup_from(&[("LOG_SERVER_PORT", "http")]));
        assert!(matches!(result, Err(LogError::ConfigError(_))));
    }
}
