use reqwest::Url;
use std::env;
use std::path::PathBuf;
use thiserror::Error;

/// Base URL used when `DOCPOINT_API_URL` is not provided.
pub const DEFAULT_API_URL: &str = "http://localhost:8080";

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable {key}: {reason}")]
    InvalidValue {
        /// Variable that failed validation.
        key: String,
        /// Parser explanation for the rejection.
        reason: String,
    },
}

/// Runtime configuration for the document API client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root address of the backend service.
    pub api_url: String,
    /// Optional file that receives a copy of the log stream.
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            log_file: None,
        }
    }
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a configuration targeting an explicit base URL.
    pub fn with_api_url(api_url: impl Into<String>) -> Result<Self, ConfigError> {
        let api_url = api_url.into();
        validate_url("DOCPOINT_API_URL", &api_url)?;
        Ok(Self {
            api_url,
            ..Self::default()
        })
    }

    fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let optional = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let api_url = optional("DOCPOINT_API_URL")
            .map(|value| value.trim().to_string())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        validate_url("DOCPOINT_API_URL", &api_url)?;

        Ok(Self {
            api_url,
            log_file: optional("DOCPOINT_LOG_FILE").map(PathBuf::from),
        })
    }
}

fn validate_url(key: &str, value: &str) -> Result<(), ConfigError> {
    Url::parse(value)
        .map(|_| ())
        .map_err(|err| ConfigError::InvalidValue {
            key: key.to_string(),
            reason: err.to_string(),
        })
}

/// Read `.env` (when present) and resolve configuration from the environment.
pub fn load() -> Result<Config, ConfigError> {
    dotenvy::dotenv().ok();
    let config = Config::from_env()?;
    tracing::debug!(
        api_url = %config.api_url,
        log_file = ?config.log_file,
        "Loaded configuration"
    );
    Ok(config)
}
