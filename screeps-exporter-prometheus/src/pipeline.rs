//! One scrape: fetch, decode, format.

use screeps_common::DecodeError;
use thiserror::Error;
use tracing::{debug, warn};

use crate::fetcher::{FetchError, MemoryFetcher};
use crate::formatter::{self, MetricLine};

/// Why a scrape produced no metrics.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("fetch failed: {0}")]
    Fetch(#[from] FetchError),

    #[error("decode failed: {0}")]
    Decode(#[from] DecodeError),
}

/// Run the full pipeline once and return the metric lines.
///
/// Decoding only runs once the fetch succeeded, and formatting only once
/// decoding succeeded.
pub async fn scrape<F: MemoryFetcher>(fetcher: &F) -> Result<Vec<MetricLine>, ScrapeError> {
    let payload = fetcher.fetch().await?;
    let snapshot = screeps_common::decode(&payload)?;
    if snapshot.is_empty() {
        warn!("Memory.stats has none of the known sections");
    }
    let lines = formatter::format(&snapshot);

    debug!(lines = lines.len(), "Scrape completed");
    Ok(lines)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    struct StaticFetcher(Result<String, u16>);

    impl MemoryFetcher for StaticFetcher {
        async fn fetch(&self) -> Result<String, FetchError> {
            self.0.clone().map_err(FetchError::Status)
        }
    }

    #[tokio::test]
    async fn test_scrape_success() {
        let payload = screeps_common::encode(&json!({ "time": 5 })).unwrap();
        let lines = scrape(&StaticFetcher(Ok(payload))).await.unwrap();

        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].to_string(), "screeps_time 5");
    }

    #[tokio::test]
    async fn test_scrape_empty_stats() {
        let payload = screeps_common::encode(&json!({ "unrelated": true })).unwrap();
        let lines = scrape(&StaticFetcher(Ok(payload))).await.unwrap();

        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_scrape_fetch_error() {
        let err = scrape(&StaticFetcher(Err(502))).await.unwrap_err();
        assert!(matches!(err, ScrapeError::Fetch(FetchError::Status(502))));
    }

    #[tokio::test]
    async fn test_scrape_decode_error() {
        let err = scrape(&StaticFetcher(Ok("gz:???".to_string())))
            .await
            .unwrap_err();
        assert!(matches!(err, ScrapeError::Decode(DecodeError::Base64(_))));
    }
}
