#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Configuration management for waypoint
//!
//! This crate handles loading and merging configuration from:
//! - Default values (hard-coded)
//! - Configuration file (~/.config/waypoint/config.toml)
//! - Environment variables (`WAYPOINT_*`)
//! - CLI flags (applied by the binary)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use waypoint_errors::{ConfigError, Error};
use waypoint_types::{ColorChoice, OutputFormat};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,

    #[serde(default)]
    pub validation: ValidationSettings,

    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub account: AccountConfig,

    #[serde(default)]
    pub links: LinksConfig,
}

/// General configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    #[serde(default = "default_output_format")]
    pub default_output: OutputFormat,
    #[serde(default = "default_color_choice")]
    pub color: ColorChoice,
}

/// Validation polling as written in the config file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationSettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
}

/// Network configuration for the query and document backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_timeout")]
    pub timeout: u64, // seconds
    #[serde(default = "default_connect_timeout")]
    pub connect_timeout: u64, // seconds
}

/// Account credentials
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AccountConfig {
    pub api_key: Option<String>,
    pub account_id: Option<u64>,
}

/// Where success links point
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LinksConfig {
    #[serde(default = "default_platform_url")]
    pub platform_url: String,
}

/// Polling parameters handed to the recipe validator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ValidationConfig {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl ValidationConfig {
    #[must_use]
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self::new(default_max_attempts(), Duration::from_secs(default_interval_secs()))
    }
}

// Default implementations

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_output: OutputFormat::Tty,
            color: ColorChoice::Auto,
        }
    }
}

impl Default for ValidationSettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            interval_secs: default_interval_secs(),
        }
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            timeout: default_timeout(),
            connect_timeout: default_connect_timeout(),
        }
    }
}

impl Default for LinksConfig {
    fn default() -> Self {
        Self {
            platform_url: default_platform_url(),
        }
    }
}

// Default value functions for serde
fn default_output_format() -> OutputFormat {
    OutputFormat::Tty
}

fn default_color_choice() -> ColorChoice {
    ColorChoice::Auto
}

fn default_max_attempts() -> u32 {
    60
}

fn default_interval_secs() -> u64 {
    5
}

fn default_endpoint() -> String {
    "https://api.newrelic.com/graphql".to_string()
}

fn default_timeout() -> u64 {
    30
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_platform_url() -> String {
    "https://one.newrelic.com".to_string()
}

impl Config {
    /// Get the default config file path
    ///
    /// # Errors
    ///
    /// Returns an error if the system config directory cannot be determined.
    pub fn default_path() -> Result<PathBuf, Error> {
        let config_dir = dirs::config_dir().ok_or_else(|| ConfigError::NotFound {
            path: "config directory".to_string(),
        })?;
        Ok(config_dir.join("waypoint").join("config.toml"))
    }

    /// Load configuration from file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or if the file contents
    /// contain invalid TOML syntax that cannot be parsed.
    pub async fn load_from_file(path: &Path) -> Result<Self, Error> {
        let contents = fs::read_to_string(path)
            .await
            .map_err(|_| ConfigError::NotFound {
                path: path.display().to_string(),
            })?;

        let config: Self = toml::from_str(&contents).map_err(|e| ConfigError::ParseError {
            message: e.to_string(),
        })?;
        tracing::debug!(path = %path.display(), "loaded configuration file");
        Ok(config)
    }

    /// Load configuration with fallback to defaults
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file exists but cannot be read
    /// or contains invalid TOML syntax.
    pub async fn load() -> Result<Self, Error> {
        let config_path = Self::default_path()?;

        if config_path.exists() {
            Self::load_from_file(&config_path).await
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from an optional path or use default
    ///
    /// # Errors
    ///
    /// Returns an error if the config file cannot be read or parsed
    pub async fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(config_path) => Self::load_from_file(config_path).await,
            None => Self::load().await,
        }
    }

    /// Merge with environment variables
    ///
    /// # Errors
    ///
    /// Returns an error if environment variables contain invalid values
    /// that cannot be parsed into the expected types.
    pub fn merge_env(&mut self) -> Result<(), Error> {
        if let Ok(output) = std::env::var("WAYPOINT_OUTPUT") {
            self.general.default_output = match output.as_str() {
                "plain" => OutputFormat::Plain,
                "tty" => OutputFormat::Tty,
                "json" => OutputFormat::Json,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "WAYPOINT_OUTPUT".to_string(),
                        value: output,
                    }
                    .into())
                }
            };
        }

        if let Ok(color) = std::env::var("WAYPOINT_COLOR") {
            self.general.color = match color.as_str() {
                "always" => ColorChoice::Always,
                "auto" => ColorChoice::Auto,
                "never" => ColorChoice::Never,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        field: "WAYPOINT_COLOR".to_string(),
                        value: color,
                    }
                    .into())
                }
            };
        }

        if let Ok(api_key) = std::env::var("WAYPOINT_API_KEY") {
            if !api_key.trim().is_empty() {
                self.account.api_key = Some(api_key);
            }
        }

        if let Ok(account_id) = std::env::var("WAYPOINT_ACCOUNT_ID") {
            self.account.account_id =
                Some(account_id.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "WAYPOINT_ACCOUNT_ID".to_string(),
                    value: account_id,
                })?);
        }

        if let Ok(endpoint) = std::env::var("WAYPOINT_ENDPOINT") {
            self.network.endpoint = endpoint;
        }

        if let Ok(attempts) = std::env::var("WAYPOINT_VALIDATION_MAX_ATTEMPTS") {
            self.validation.max_attempts =
                attempts.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "WAYPOINT_VALIDATION_MAX_ATTEMPTS".to_string(),
                    value: attempts,
                })?;
        }

        if let Ok(interval) = std::env::var("WAYPOINT_VALIDATION_INTERVAL_SECS") {
            self.validation.interval_secs =
                interval.parse().map_err(|_| ConfigError::InvalidValue {
                    field: "WAYPOINT_VALIDATION_INTERVAL_SECS".to_string(),
                    value: interval,
                })?;
        }

        Ok(())
    }

    /// Polling parameters for the recipe validator
    #[must_use]
    pub fn validation_config(&self) -> ValidationConfig {
        ValidationConfig::new(
            self.validation.max_attempts,
            Duration::from_secs(self.validation.interval_secs),
        )
    }

    /// API key and account id, both required for remote access
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::MissingField` naming the first absent credential.
    pub fn credentials(&self) -> Result<(&str, u64), Error> {
        let api_key = self
            .account
            .api_key
            .as_deref()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingField {
                field: "api_key".to_string(),
            })?;
        let account_id = self
            .account
            .account_id
            .ok_or_else(|| ConfigError::MissingField {
                field: "account_id".to_string(),
            })?;
        Ok((api_key, account_id))
    }
}
