//! Prometheus exporter for Screeps memory stats.
//!
//! Every scrape fetches the bot's `Memory.stats` object from the Screeps API,
//! decodes the `gz:` payload, and renders it as Prometheus text. Nothing is
//! cached between scrapes.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐     ┌─────────────────┐
//! │   Screeps API   │────>│     Fetcher     │────>│     Decoder     │────>│    Formatter    │
//! │ /api/user/memory│     │  (X-Token auth) │     │ (gz: + base64)  │     │   (/metrics)    │
//! └─────────────────┘     └─────────────────┘     └─────────────────┘     └─────────────────┘
//! ```
//!
//! # Usage
//!
//! Export the API token and run the exporter binary, optionally with a
//! configuration file:
//!
//! ```bash
//! SCREEPS_TOKEN=... screeps-exporter-prometheus --config config.json5
//! ```
//!
//! # Configuration
//!
//! See [`config::ExporterConfig`] for configuration options.

pub mod config;
pub mod fetcher;
pub mod formatter;
pub mod http;
pub mod mapping;
pub mod pipeline;

pub use config::{ApiToken, ExporterConfig};
pub use fetcher::{FetchError, MemoryFetcher, ScreepsClient};
pub use formatter::MetricLine;
pub use http::HttpServer;
pub use pipeline::{ScrapeError, scrape};
