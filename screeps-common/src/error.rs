use thiserror::Error;

/// Common error type for Screeps exporter components.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Payload decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Why an encoded memory payload could not be turned into a value.
///
/// Each stage of the `gz:` pipeline has its own variant so that logs can say
/// which stage rejected the payload. Callers that only care whether decoding
/// worked can treat every variant the same way.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The payload does not start with the expected marker.
    #[error("unexpected payload marker {found:?}, expected {expected:?}")]
    Prefix {
        expected: &'static str,
        found: String,
    },

    /// The text after the marker is not valid standard base64.
    #[error("invalid base64: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not a complete gzip stream.
    #[error("invalid gzip stream: {0}")]
    Gzip(#[source] std::io::Error),

    /// The decompressed bytes are not UTF-8.
    #[error("decompressed payload is not UTF-8: {0}")]
    Utf8(#[from] std::str::Utf8Error),

    /// The text is not syntactically valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[source] serde_json::Error),

    /// The JSON is valid but does not have the expected structure.
    #[error("unexpected snapshot shape: {0}")]
    Shape(#[source] serde_json::Error),
}

impl DecodeError {
    /// Short, stable name of the failing stage, for structured logs.
    pub fn stage(&self) -> &'static str {
        match self {
            DecodeError::Prefix { .. } => "prefix",
            DecodeError::Base64(_) => "base64",
            DecodeError::Gzip(_) => "gzip",
            DecodeError::Utf8(_) => "utf8",
            DecodeError::Json(_) => "json",
            DecodeError::Shape(_) => "shape",
        }
    }
}

/// Result type alias using the exporter's Error.
pub type Result<T> = std::result::Result<T, Error>;
