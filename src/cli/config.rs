//! Configuration file
//!
//! ```json
//! {"data_dir": "./data", "fsync": true, "log_level": "info"}
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::errors::{CliError, CliResult};
use crate::engine::OpenOptions;
use crate::observability::Severity;

/// Configuration file structure
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// fsync the record log after every mutation (optional, default true)
    #[serde(default = "default_fsync")]
    pub fsync: bool,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_fsync() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from file
    pub fn load(path: &Path) -> CliResult<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| CliError::config_error(format!("Failed to read config: {}", e)))?;

        let config: Config = serde_json::from_str(&content)
            .map_err(|e| CliError::config_error(format!("Invalid config JSON: {}", e)))?;

        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> CliResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(CliError::config_error("data_dir must not be empty"));
        }
        self.severity()?;
        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Minimum severity written by the logger
    pub fn severity(&self) -> CliResult<Severity> {
        match Severity::parse(&self.log_level) {
            Some(Severity::Fatal) | None => Err(CliError::config_error(format!(
                "Invalid log_level: '{}'. Expected trace, info, warn or error.",
                self.log_level
            ))),
            Some(severity) => Ok(severity),
        }
    }

    pub fn open_options(&self) -> OpenOptions {
        OpenOptions {
            sync_on_write: self.fsync,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write_config(dir: &TempDir, body: &str) -> std::path::PathBuf {
        let path = dir.path().join("registrar.json");
        fs::write(&path, body).unwrap();
        path
    }

    #[test]
    fn test_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(&write_config(&tmp, r#"{"data_dir": "./data"}"#)).unwrap();
        assert!(config.fsync);
        assert_eq!(config.severity().unwrap(), Severity::Info);
        assert!(config.open_options().sync_on_write);
    }

    #[test]
    fn test_missing_data_dir() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&write_config(&tmp, r#"{"fsync": false}"#)).unwrap_err();
        assert_eq!(err.code_str(), "REG_CLI_CONFIG_ERROR");
    }

    #[test]
    fn test_invalid_log_level() {
        let tmp = TempDir::new().unwrap();
        let err = Config::load(&write_config(&tmp, r#"{"data_dir": "d", "log_level": "loud"}"#)).unwrap_err();
        assert!(err.message().contains("loud"));
    }

    #[test]
    fn test_missing_file() {
        let tmp = TempDir::new().unwrap();
        assert!(Config::load(&tmp.path().join("absent.json")).is_err());
    }
}
