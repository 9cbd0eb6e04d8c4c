//! Configuration file loading and parsing.
//!
//! This module handles loading the configuration file from disk and parsing
//! it into validated, type-safe structures.
//!
//! # Configuration File Locations
//!
//! The configuration file is searched in the following order:
//!
//! 1. Path given as the `CONFIG_FILE` CLI argument
//! 2. Default location:
//!    - **Linux/macOS:** `~/.admanager-mcp/config.json`
//!    - **Windows:** `%USERPROFILE%\.admanager-mcp\config.json`
//!
//! The file is optional. When the default file does not exist the built-in
//! defaults are used; an explicitly named file must exist.
//!
//! Environment variables (`GOOGLE_ADMANAGER_NETWORK_CODE`,
//! `GOOGLE_APPLICATION_CREDS`, `GOOGLE_ADMANAGER_CLIENT`) take precedence over
//! the file. See [`Config::apply_env_overrides`].

mod settings;

pub use settings::{
    ApiConfig, ClientPreference, Config, LoggingConfig, ENV_CLIENT, ENV_CREDENTIALS_PATH,
    ENV_NETWORK_CODE,
};

use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Returns the default configuration directory.
///
/// - **Linux/macOS:** `~/.admanager-mcp/`
/// - **Windows:** `%USERPROFILE%\.admanager-mcp\`
#[must_use]
pub fn default_config_dir() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".admanager-mcp"))
}

/// Returns the platform-specific default configuration file path.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    default_config_dir().map(|p| p.join("config.json"))
}

/// Loads and parses the configuration file, then applies environment overrides.
///
/// If `path` is `None`, uses the platform-specific default location and falls
/// back to defaults when that file does not exist.
///
/// # Errors
///
/// Returns an error if:
/// - An explicitly given configuration file cannot be found
/// - The file cannot be read
/// - The JSON is malformed
/// - Required fields are missing or invalid
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let mut config = match path {
        Some(p) => read_config_file(p)?,
        None => match default_config_path() {
            Some(p) if p.exists() => read_config_file(&p)?,
            _ => Config::default(),
        },
    };

    config.apply_env_overrides(|key| std::env::var(key).ok())?;

    // Validate the configuration
    config.validate()?;

    Ok(config)
}

/// Reads and parses a single configuration file without overrides.
///
/// # Errors
///
/// Returns an error if the file is missing, unreadable or malformed.
pub fn read_config_file(config_path: &Path) -> Result<Config, ConfigError> {
    if !config_path.exists() {
        return Err(ConfigError::NotFound {
            path: config_path.to_path_buf(),
        });
    }

    let contents = std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
        path: config_path.to_path_buf(),
        source: e,
    })?;

    serde_json::from_str(&contents).map_err(|e| ConfigError::ParseError {
        path: config_path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_dir_exists() {
        assert!(default_config_dir().is_some());
    }

    #[test]
    fn default_config_path_exists() {
        let path = default_config_path();
        assert!(path.is_some());
        assert!(path.unwrap().to_string_lossy().contains("config.json"));
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_config_file(&dir.path().join("missing.json")).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "{ not json").unwrap();
        let err = read_config_file(&path).unwrap_err();
        assert!(matches!(err, ConfigError::ParseError { .. }));
    }

    #[test]
    fn reads_file_contents() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{ "network_code": "1234", "client": "rest" }"#).unwrap();
        let config = read_config_file(&path).unwrap();
        assert_eq!(config.network_code.as_deref(), Some("1234"));
        assert_eq!(config.client, ClientPreference::Rest);
    }
}
