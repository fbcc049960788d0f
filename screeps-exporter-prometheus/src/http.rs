//! HTTP server for the Prometheus metrics endpoint.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use tokio::sync::watch;
use tower_http::cors::CorsLayer;
use tracing::{info, warn};

use crate::fetcher::MemoryFetcher;
use crate::formatter;
use crate::pipeline::{ScrapeError, scrape};

/// Content type of the Prometheus text exposition format.
pub const CONTENT_TYPE: &str = "text/plain; version=0.0.4; charset=utf-8";

/// Body returned when the memory could not be fetched.
pub const FETCH_ERROR_BODY: &str = "Error fetching data\n";

/// Body returned when the fetched memory could not be decoded.
pub const DECODE_ERROR_BODY: &str = "Error processing data\n";

/// Application state shared across handlers.
struct AppState<F> {
    fetcher: Arc<F>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            fetcher: Arc::clone(&self.fetcher),
        }
    }
}

/// Create the HTTP router.
///
/// The metrics handler is mounted on `metrics_path` and on `/`.
pub fn create_router<F: MemoryFetcher>(fetcher: Arc<F>, metrics_path: &str) -> Router {
    let state = AppState { fetcher };

    let mut router = Router::new().route(metrics_path, get(metrics_handler::<F>));
    if metrics_path != "/" {
        router = router.route("/", get(metrics_handler::<F>));
    }

    router
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Handler for the metrics endpoint.
async fn metrics_handler<F: MemoryFetcher>(State(state): State<AppState<F>>) -> Response {
    match scrape(state.fetcher.as_ref()).await {
        Ok(lines) => (
            StatusCode::OK,
            [("content-type", CONTENT_TYPE)],
            formatter::render(&lines),
        )
            .into_response(),
        Err(ScrapeError::Fetch(e)) => {
            warn!(error = %e, "Failed to fetch memory");
            (StatusCode::INTERNAL_SERVER_ERROR, FETCH_ERROR_BODY).into_response()
        }
        Err(ScrapeError::Decode(e)) => {
            warn!(stage = e.stage(), error = %e, "Failed to decode memory payload");
            (StatusCode::INTERNAL_SERVER_ERROR, DECODE_ERROR_BODY).into_response()
        }
    }
}

/// Handler for the /health endpoint.
async fn health_handler() -> Response {
    (StatusCode::OK, "healthy\n").into_response()
}

/// HTTP server configuration.
pub struct HttpServer<F> {
    fetcher: Arc<F>,
    listen_addr: SocketAddr,
    metrics_path: String,
}

impl<F: MemoryFetcher> HttpServer<F> {
    /// Create a new HTTP server.
    pub fn new(fetcher: Arc<F>, listen_addr: SocketAddr, metrics_path: String) -> Self {
        Self {
            fetcher,
            listen_addr,
            metrics_path,
        }
    }

    /// Run the HTTP server until the shutdown signal is received.
    pub async fn run(self, shutdown: watch::Receiver<bool>) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.listen_addr)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", self.listen_addr, e))?;

        self.serve(listener, shutdown).await
    }

    /// Serve on an already bound listener until the shutdown signal is received.
    pub async fn serve(
        self,
        listener: tokio::net::TcpListener,
        mut shutdown: watch::Receiver<bool>,
    ) -> anyhow::Result<()> {
        let router = create_router(self.fetcher, &self.metrics_path);
        let addr = listener.local_addr().unwrap_or(self.listen_addr);

        info!(
            addr = %addr,
            path = %self.metrics_path,
            "HTTP server listening"
        );

        // Run server with graceful shutdown
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                // Wait for shutdown signal
                loop {
                    if shutdown.changed().await.is_err() {
                        break;
                    }
                    if *shutdown.borrow() {
                        break;
                    }
                }
                info!("HTTP server shutting down");
            })
            .await
            .map_err(|e| anyhow::anyhow!("HTTP server error: {}", e))?;

        info!("HTTP server stopped");
        Ok(())
    }
}
