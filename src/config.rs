//! Configuration management for kia-uvo
//!
//! This module handles loading, validation, and management of the application
//! configuration from YAML files.

use crate::error::{Result, UvoError};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Environment variable pointing at an explicit configuration file
pub const CONFIG_PATH_ENV: &str = "KIA_UVO_CONFIG";

/// Refresh cadence used when the config does not override it
pub const DEFAULT_UPDATE_INTERVAL_MINUTES: u32 = 5;

fn default_true() -> bool {
    true
}

fn default_update_interval() -> u32 {
    DEFAULT_UPDATE_INTERVAL_MINUTES
}

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct Config {
    /// One entry per UVO user account
    pub accounts: Vec<AccountConfig>,

    /// Refresh scheduling
    pub polling: PollingConfig,

    /// UVO backend client settings
    pub client: ClientConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Web server binding configuration
    pub web: WebConfig,
}

/// Credentials for a single UVO account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
pub struct AccountConfig {
    /// Display name, unique across accounts
    pub name: String,

    /// UVO login name
    pub username: String,

    /// UVO password; never serialized back out
    #[serde(default, skip_serializing)]
    pub password: String,

    /// Account is only observed, never commanded
    #[serde(default)]
    pub read_only: bool,
}

/// Refresh scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
pub struct PollingConfig {
    /// Minutes between scheduled refreshes (1..=60)
    #[serde(default = "default_update_interval")]
    pub update_interval_minutes: u32,
}

/// UVO backend client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the UVO API gateway
    pub base_url: String,

    /// Per-request timeout in seconds
    pub timeout_seconds: u64,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    pub level: String,

    /// Directory (or file path whose parent is used) for rolling logs
    pub file: String,

    /// Number of rotated files to keep
    pub backup_count: u32,

    /// Whether to log to console
    pub console_output: bool,

    /// Whether to use JSON format
    pub json_format: bool,
}

/// Web server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(schemars::JsonSchema))]
#[serde(default)]
pub struct WebConfig {
    /// Serve the HTTP command/status surface
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Bind address
    pub host: String,

    /// TCP port
    pub port: u16,
}

impl AccountConfig {
    pub fn new<N: Into<String>, U: Into<String>, P: Into<String>>(
        name: N,
        username: U,
        password: P,
    ) -> Self {
        Self {
            name: name.into(),
            username: username.into(),
            password: password.into(),
            read_only: false,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            update_interval_minutes: DEFAULT_UPDATE_INTERVAL_MINUTES,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.owners.kia.com/apigw/v1".to_string(),
            timeout_seconds: 30,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: "/tmp/kia-uvo.log".to_string(),
            backup_count: 5,
            console_output: true,
            json_format: false,
        }
    }
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            host: "127.0.0.1".to_string(),
            port: 8089,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            accounts: Vec::new(),
            polling: PollingConfig::default(),
            client: ClientConfig::default(),
            logging: LoggingConfig::default(),
            web: WebConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from a YAML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from `KIA_UVO_CONFIG` or the default locations
    pub fn load() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
            return Self::from_file(path);
        }

        let default_paths = [
            "kia_uvo.yaml",
            "/data/kia_uvo.yaml",
            "/etc/kia-uvo/config.yaml",
        ];

        for path in &default_paths {
            if Path::new(path).exists() {
                return Self::from_file(path);
            }
        }

        Ok(Self::default())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        let mut seen = HashSet::new();
        for (idx, account) in self.accounts.iter().enumerate() {
            if account.name.trim().is_empty() {
                return Err(UvoError::validation(
                    format!("accounts[{idx}].name"),
                    "Name cannot be empty",
                ));
            }
            if account.username.trim().is_empty() {
                return Err(UvoError::validation(
                    format!("accounts[{idx}].username"),
                    "Username cannot be empty",
                ));
            }
            if account.password.is_empty() {
                return Err(UvoError::validation(
                    format!("accounts[{idx}].password"),
                    "Password cannot be empty",
                ));
            }
            if !seen.insert(account.name.as_str()) {
                return Err(UvoError::validation(
                    format!("accounts[{idx}].name"),
                    format!("Duplicate account name '{}'", account.name),
                ));
            }
        }

        let interval = self.polling.update_interval_minutes;
        if interval == 0 || interval > 60 {
            return Err(UvoError::validation(
                "polling.update_interval_minutes",
                "Must be between 1 and 60",
            ));
        }

        if self.client.base_url.trim().is_empty() {
            return Err(UvoError::validation(
                "client.base_url",
                "Base URL cannot be empty",
            ));
        }

        if self.web.enabled && self.web.port == 0 {
            return Err(UvoError::validation(
                "web.port",
                "Port must be greater than 0",
            ));
        }

        Ok(())
    }
}
