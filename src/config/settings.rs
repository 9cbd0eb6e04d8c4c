//! Configuration structures for deserialisation.
//!
//! These structures map directly to the JSON configuration file format.

use std::path::PathBuf;

use serde::Deserialize;

use crate::error::ConfigError;

/// Environment variable holding the Ad Manager network code.
pub const ENV_NETWORK_CODE: &str = "GOOGLE_ADMANAGER_NETWORK_CODE";

/// Environment variable overriding the credential file path.
pub const ENV_CREDENTIALS_PATH: &str = "GOOGLE_APPLICATION_CREDS";

/// Environment variable overriding the client preference.
pub const ENV_CLIENT: &str = "GOOGLE_ADMANAGER_CLIENT";

/// Root configuration structure.
///
/// This is the top-level structure that matches the JSON config file.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Optional JSON schema reference (ignored during parsing).
    #[serde(rename = "$schema", default)]
    _schema: Option<String>,

    /// Optional comment field (ignored during parsing).
    #[serde(rename = "_comment", default)]
    _comment: Option<String>,

    /// Ad Manager network code.
    #[serde(default)]
    pub network_code: Option<String>,

    /// Path to a service-account key file.
    #[serde(default)]
    pub credentials_path: Option<PathBuf>,

    /// Application name sent in the legacy request header.
    #[serde(default = "default_application_name")]
    pub application_name: String,

    /// Which client implementation to use.
    #[serde(default)]
    pub client: ClientPreference,

    /// Remote API endpoints and HTTP settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            _schema: None,
            _comment: None,
            network_code: None,
            credentials_path: None,
            application_name: default_application_name(),
            client: ClientPreference::default(),
            api: ApiConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any validation checks fail.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some(ref code) = self.network_code {
            if code.is_empty() || !code.chars().all(|c| c.is_ascii_digit()) {
                return Err(ConfigError::ValidationError {
                    message: format!("Invalid network code '{code}'. Must be numeric"),
                });
            }
        }
        if self.api.timeout_secs == 0 {
            return Err(ConfigError::ValidationError {
                message: "api.timeout_secs must be greater than zero".to_string(),
            });
        }
        for (field, value) in [
            ("api.rest_endpoint", &self.api.rest_endpoint),
            ("api.soap_endpoint", &self.api.soap_endpoint),
        ] {
            if !value.starts_with("http://") && !value.starts_with("https://") {
                return Err(ConfigError::ValidationError {
                    message: format!("{field} must be an http(s) URL, got '{value}'"),
                });
            }
        }
        Ok(())
    }

    /// Applies environment overrides read through `lookup`.
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns an error if an override holds an invalid value.
    pub fn apply_env_overrides<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(code) = get(ENV_NETWORK_CODE) {
            self.network_code = Some(code.trim().to_string());
        }
        if let Some(path) = get(ENV_CREDENTIALS_PATH) {
            self.credentials_path = Some(PathBuf::from(path));
        }
        if let Some(client) = get(ENV_CLIENT) {
            self.client = ClientPreference::parse(&client).ok_or_else(|| {
                ConfigError::ValidationError {
                    message: format!(
                        "Invalid {ENV_CLIENT} '{client}'. Must be one of: auto, rest, legacy"
                    ),
                }
            })?;
        }
        Ok(())
    }
}

fn default_application_name() -> String {
    format!("admanager-mcp/{}", env!("CARGO_PKG_VERSION"))
}

/// Client implementation preference.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ClientPreference {
    /// REST if compiled in, otherwise legacy.
    #[default]
    Auto,
    /// REST only.
    Rest,
    /// Legacy SOAP only.
    Legacy,
}

impl ClientPreference {
    /// Parses a preference name (case-insensitive).
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "auto" => Some(Self::Auto),
            "rest" => Some(Self::Rest),
            "legacy" | "soap" => Some(Self::Legacy),
            _ => None,
        }
    }
}

/// Remote API configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiConfig {
    /// Base URL of the REST API, without the version segment.
    #[serde(default = "default_rest_endpoint")]
    pub rest_endpoint: String,

    /// Base URL of the legacy SOAP API, without the version segment.
    #[serde(default = "default_soap_endpoint")]
    pub soap_endpoint: String,

    /// Legacy API version, e.g. "v202405".
    #[serde(default = "default_soap_version")]
    pub soap_version: String,

    /// HTTP request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            rest_endpoint: default_rest_endpoint(),
            soap_endpoint: default_soap_endpoint(),
            soap_version: default_soap_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_rest_endpoint() -> String {
    "https://admanager.googleapis.com".to_string()
}

fn default_soap_endpoint() -> String {
    "https://ads.google.com/apis/ads/publisher".to_string()
}

fn default_soap_version() -> String {
    "v202405".to_string()
}

const fn default_timeout_secs() -> u64 {
    60
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
