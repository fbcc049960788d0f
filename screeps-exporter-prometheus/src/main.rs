//! Prometheus exporter for Screeps memory stats.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tokio::sync::watch;
use tracing::{error, info, warn};

use screeps_exporter_prometheus::{ExporterConfig, HttpServer, ScreepsClient};

/// Prometheus exporter for Screeps memory stats.
#[derive(Parser, Debug)]
#[command(name = "screeps-exporter-prometheus")]
#[command(about = "Export Screeps Memory.stats as Prometheus metrics")]
#[command(version)]
struct Args {
    /// Path to configuration file (JSON5 format).
    #[arg(short, long)]
    config: Option<String>,

    /// HTTP listen address (overrides config).
    #[arg(long)]
    listen: Option<String>,

    /// Log level (trace, debug, info, warn, error; overrides config).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // A missing .env file is fine; the token may come from the real environment.
    let dotenv = dotenvy::dotenv();

    // Load configuration
    let mut config = if let Some(config_path) = &args.config {
        ExporterConfig::load_from_file(config_path)?
    } else {
        ExporterConfig::default()
    };

    // Apply CLI overrides
    if let Some(listen) = args.listen {
        config.http.listen = listen;
    }
    if let Some(level) = args.log_level {
        config.logging.level = level;
    }
    config.validate()?;

    screeps_common::init_tracing(&config.logging)?;

    info!("Starting Screeps Prometheus Exporter");
    if let Ok(path) = dotenv {
        info!(path = %path.display(), "Loaded environment file");
    }

    // The token is read once; a missing token is a startup error.
    let token = config.api_token()?;
    let client = ScreepsClient::new(&config.screeps, token)?;
    info!(
        endpoint = %client.endpoint(),
        shard = %config.screeps.shard,
        "Screeps API client ready"
    );

    // Parse listen address
    let listen_addr = config
        .http
        .listen
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid listen address: {}", e))?;

    // Bind before spawning so an address in use is a startup error
    let listener = tokio::net::TcpListener::bind(listen_addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", listen_addr, e))?;

    // Create shutdown signal
    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let http_server = HttpServer::new(Arc::new(client), listen_addr, config.http.path.clone());

    // Start HTTP server
    let mut http_task = tokio::spawn(http_server.serve(listener, shutdown_rx));

    // Wait for shutdown signal, or for the server to exit on its own
    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
        _ = terminate_signal() => {
            info!("Received SIGTERM, shutting down...");
        }
        result = &mut http_task => {
            error!("HTTP server exited unexpectedly");
            result??;
            return Err(anyhow::anyhow!("HTTP server stopped without a shutdown signal"));
        }
    }

    // Signal shutdown
    shutdown_tx.send(true)?;

    // Wait for the server to drain
    match tokio::time::timeout(Duration::from_secs(5), http_task).await {
        Ok(result) => result??,
        Err(_) => warn!("HTTP server did not stop within 5s"),
    }

    info!("Exporter stopped");
    Ok(())
}

#[cfg(unix)]
async fn terminate_signal() {
    match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
        Ok(mut sigterm) => {
            sigterm.recv().await;
        }
        Err(e) => {
            warn!("Failed to install SIGTERM handler: {}", e);
            std::future::pending::<()>().await;
        }
    }
}

#[cfg(not(unix))]
async fn terminate_signal() {
    std::future::pending::<()>().await;
}
