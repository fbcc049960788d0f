//! Configuration for the Prometheus exporter.

use std::fmt;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use screeps_common::LoggingConfig;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    Load(#[from] screeps_common::Error),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("API token not set: environment variable {var} is missing or empty")]
    MissingToken { var: String },
}

/// Complete exporter configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExporterConfig {
    /// Screeps API settings.
    #[serde(default)]
    pub screeps: ScreepsConfig,

    /// HTTP endpoint settings.
    #[serde(default)]
    pub http: HttpConfig,

    /// Logging configuration.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote Screeps API configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreepsConfig {
    /// Base URL of the Screeps server (default: "https://screeps.com").
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Shard whose memory is read (default: "shard3").
    #[serde(default = "default_shard")]
    pub shard: String,

    /// Environment variable holding the API token (default: "SCREEPS_TOKEN").
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Request timeout in seconds. Unset means the HTTP client default.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_api_url() -> String {
    "https://screeps.com".to_string()
}

fn default_shard() -> String {
    "shard3".to_string()
}

fn default_token_env() -> String {
    "SCREEPS_TOKEN".to_string()
}

impl Default for ScreepsConfig {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            shard: default_shard(),
            token_env: default_token_env(),
            timeout_secs: None,
        }
    }
}

/// HTTP endpoint configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Address to listen on (default: "0.0.0.0:5025").
    #[serde(default = "default_listen")]
    pub listen: String,

    /// Path for metrics endpoint (default: "/metrics").
    #[serde(default = "default_path")]
    pub path: String,
}

fn default_listen() -> String {
    "0.0.0.0:5025".to_string()
}

fn default_path() -> String {
    "/metrics".to_string()
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            listen: default_listen(),
            path: default_path(),
        }
    }
}

/// Screeps API token.
///
/// Never printed: `Debug` output is redacted.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiToken(String);

impl ApiToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// The raw token, for the `X-Token` header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiToken(***)")
    }
}

impl ExporterConfig {
    /// Load configuration from a JSON5 file.
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let config: ExporterConfig = screeps_common::load_config(path)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON5 string.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: ExporterConfig = screeps_common::parse_config(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let url = reqwest::Url::parse(&self.screeps.api_url).map_err(|e| {
            ConfigError::Validation(format!("Invalid api_url {}: {}", self.screeps.api_url, e))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::Validation(format!(
                "api_url must use http or https: {}",
                self.screeps.api_url
            )));
        }

        if self.screeps.shard.trim().is_empty() {
            return Err(ConfigError::Validation(
                "shard must not be empty".to_string(),
            ));
        }

        if self.screeps.token_env.trim().is_empty() {
            return Err(ConfigError::Validation(
                "token_env must not be empty".to_string(),
            ));
        }

        if self.screeps.timeout_secs == Some(0) {
            return Err(ConfigError::Validation(
                "timeout_secs must be > 0".to_string(),
            ));
        }

        // Validate listen address format
        if self.http.listen.parse::<std::net::SocketAddr>().is_err() {
            return Err(ConfigError::Validation(format!(
                "Invalid listen address: {}",
                self.http.listen
            )));
        }

        // Validate path starts with /
        if !self.http.path.starts_with('/') {
            return Err(ConfigError::Validation(
                "Metrics path must start with /".to_string(),
            ));
        }

        Ok(())
    }

    /// Read the API token from the configured environment variable.
    pub fn api_token(&self) -> Result<ApiToken, ConfigError> {
        self.api_token_from(|var| std::env::var(var).ok())
    }

    /// Read the API token through `lookup` instead of the process environment.
    pub fn api_token_from<F>(&self, lookup: F) -> Result<ApiToken, ConfigError>
    where
        F: FnOnce(&str) -> Option<String>,
    {
        match lookup(&self.screeps.token_env) {
            Some(token) if !token.trim().is_empty() => Ok(ApiToken::new(token.trim())),
            _ => Err(ConfigError::MissingToken {
                var: self.screeps.token_env.clone(),
            }),
        }
    }
}
