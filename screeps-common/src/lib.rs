//! Screeps Exporter Common Library
//!
//! This crate provides the shared building blocks for the Screeps exporter:
//!
//! - [`snapshot`] - Typed model of the `Memory.stats` object (`Snapshot`, `RoomStats`, ...)
//! - [`codec`] - The `gz:` + base64 + gzip payload codec
//! - [`config`] - Configuration loading (JSON5 format)
//! - [`error`] - Error types

pub mod codec;
pub mod config;
pub mod error;
pub mod snapshot;

// Re-export commonly used types at the crate root
pub use codec::{GZIP_MARKER, decode, decode_as, encode};
pub use config::{LogFormat, LoggingConfig, load_config, parse_config};
pub use error::{DecodeError, Error, Result};
pub use snapshot::{
    CpuStats, CreepRecord, GclStats, Reading, RoomStats, Snapshot, UNDEFINED_ROLE,
};

/// Initialize tracing with the given configuration.
///
/// Supports two output formats:
/// - `LogFormat::Text` (default): Human-readable text format
/// - `LogFormat::Json`: Structured JSON format for log aggregation systems
///
/// `RUST_LOG`, when set, takes precedence over `config.level`.
///
/// # Example
///
/// ```ignore
/// use screeps_common::{LoggingConfig, LogFormat, init_tracing};
///
/// let config = LoggingConfig {
///     level: "info".to_string(),
///     format: LogFormat::Json,
/// };
/// init_tracing(&config)?;
/// ```
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format {
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(fmt::layer())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(fmt::layer().json())
                .with(filter)
                .try_init()
                .map_err(|e| Error::Config(format!("Failed to initialize tracing: {}", e)))?;
        }
    }

    Ok(())
}
