//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Healthz server main binary

use anyhow::Context;
use clap::Parser;
use healthz_server::{
    config::{load_config, ConfigOverrides},
    init_service, SimulationProfile, SERVER_NAME, SERVER_VERSION,
};
use std::path::PathBuf;
use tokio::net::TcpListener;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "healthz-server")]
#[command(about = "Health check aggregation and exposition service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Address to bind the HTTP listener to
    #[arg(long)]
    bind: Option<String>,

    /// Per-probe deadline in milliseconds
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Pause between check rounds in milliseconds
    #[arg(long)]
    refresh_interval_ms: Option<u64>,

    /// Register the end-to-end workflow check
    #[arg(long)]
    workflow: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();
    info!("Starting {} v{}", SERVER_NAME, SERVER_VERSION);

    // Load configuration
    let mut config = load_config(cli.config.clone()).context("failed to load configuration")?;
    config.apply_overrides(&ConfigOverrides {
        bind_address: cli.bind,
        probe_timeout_ms: cli.probe_timeout_ms,
        refresh_interval_ms: cli.refresh_interval_ms,
        workflow: cli.workflow,
    });
    let addr = config.socket_addr()?;
    info!("Configuration loaded successfully");

    let service = init_service(&config, &SimulationProfile::default())?;

    if config.wait_for_first_round {
        info!("Waiting for the first check round");
        let snapshot = service.wait_for_first_round().await?;
        info!(
            "First round complete, overall status {}",
            if snapshot.overall_ok { "ok" } else { "error" }
        );
    }

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;

    info!("Starting HTTP server on {}", addr);
    info!("  Text report: http://{}/healthz", addr);
    info!("  JSON report: http://{}/healthz?format=json", addr);
    info!("  Metrics:     http://{}/metrics", addr);

    let server = axum::serve(listener, service.router());

    // Handle shutdown signals
    let graceful_shutdown = server.with_graceful_shutdown(shutdown_signal());

    // Run server
    if let Err(e) = graceful_shutdown.await {
        error!("HTTP server error: {}", e);
    }

    info!("Shutting down check refresher");
    service.shutdown().await?;

    info!("{} shutdown completed", SERVER_NAME);
    Ok(())
}

/// Handle shutdown signals
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal");
        }
        _ = terminate => {
            info!("Received terminate signal");
        }
    }

    info!("Shutdown signal received");
}
