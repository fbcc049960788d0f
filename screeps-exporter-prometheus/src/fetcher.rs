//! Retrieval of the encoded memory payload from the Screeps API.

use std::future::Future;
use std::time::Duration;

use reqwest::{StatusCode, Url};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::config::{ApiToken, ScreepsConfig};

/// Memory path requested from the API. The exporter only understands the
/// flat `Memory.stats` layout.
pub const MEMORY_PATH: &str = "stats";

/// Header carrying the API token.
pub const TOKEN_HEADER: &str = "X-Token";

/// Errors that can occur while fetching the memory payload.
#[derive(Debug, Error)]
pub enum FetchError {
    /// The endpoint URL could not be built from the configuration.
    #[error("Invalid endpoint: {0}")]
    Endpoint(String),

    /// Connection, TLS, or timeout failure.
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The server rejected the token.
    #[error("Authentication rejected (HTTP {0})")]
    Unauthorized(u16),

    /// Any other non-success HTTP status.
    #[error("Unexpected HTTP status {0}")]
    Status(u16),

    /// The server answered with an explicit error message.
    #[error("API error: {0}")]
    Api(String),

    /// The body is not the expected `{ ok, data }` envelope.
    #[error("Malformed response envelope: {0}")]
    Envelope(String),
}

/// Source of encoded memory payloads.
pub trait MemoryFetcher: Send + Sync + 'static {
    /// Fetch one encoded payload (`gz:...`).
    fn fetch(&self) -> impl Future<Output = Result<String, FetchError>> + Send;
}

/// Response body of `GET /api/user/memory`.
#[derive(Debug, Deserialize)]
struct MemoryEnvelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    error: Option<String>,
}

impl MemoryEnvelope {
    fn into_payload(self) -> Result<String, FetchError> {
        if let Some(error) = self.error {
            return Err(FetchError::Api(error));
        }

        match self.data {
            Some(Value::String(payload)) => Ok(payload),
            Some(Value::Null) | None => {
                Err(FetchError::Envelope("missing `data` field".to_string()))
            }
            Some(other) => Err(FetchError::Envelope(format!(
                "`data` is not a string: {}",
                json_type(&other)
            ))),
        }
    }
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// HTTP client for the Screeps memory endpoint.
#[derive(Debug, Clone)]
pub struct ScreepsClient {
    client: reqwest::Client,
    endpoint: Url,
    shard: String,
    token: ApiToken,
}

impl ScreepsClient {
    /// Create a client for the configured server and shard.
    pub fn new(config: &ScreepsConfig, token: ApiToken) -> Result<Self, FetchError> {
        let endpoint = memory_endpoint(&config.api_url)?;

        let mut builder = reqwest::Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")));
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            endpoint,
            shard: config.shard.clone(),
            token,
        })
    }

    /// The memory endpoint, without query parameters.
    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }
}

impl MemoryFetcher for ScreepsClient {
    async fn fetch(&self) -> Result<String, FetchError> {
        debug!(endpoint = %self.endpoint, shard = %self.shard, "Fetching memory");

        let response = self
            .client
            .get(self.endpoint.clone())
            .query(&[("shard", self.shard.as_str()), ("path", MEMORY_PATH)])
            .header(TOKEN_HEADER, self.token.expose())
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(FetchError::Unauthorized(status.as_u16()));
        }
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }

        let envelope: MemoryEnvelope = response
            .json()
            .await
            .map_err(|e| FetchError::Envelope(e.to_string()))?;

        let payload = envelope.into_payload()?;
        debug!(len = payload.len(), "Memory payload received");
        Ok(payload)
    }
}

/// Build `<api_url>/api/user/memory`, keeping any path prefix of the base URL.
fn memory_endpoint(api_url: &str) -> Result<Url, FetchError> {
    let base = api_url.trim_end_matches('/');
    Url::parse(&format!("{}/api/user/memory", base))
        .map_err(|e| FetchError::Endpoint(format!("{}: {}", api_url, e)))
}
