//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Healthz server
//!
//! Wires the check engine from `healthz-core` to simulated probes and
//! serves the latest snapshot over HTTP as a text report, a JSON report
//! and Prometheus metrics.

pub mod config;
pub mod error;
pub mod exposition;
pub mod http;
pub mod probes;

use axum::Router;
use healthz_core::{
    BackgroundRefresher, CheckOrchestrator, ProbeRegistry, RoundRunner, Snapshot, SnapshotStore,
};
use std::sync::Arc;
use tracing::info;

pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use http::HttpServer;
pub use probes::SimulationProfile;

/// Server version information
pub const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Server name
pub const SERVER_NAME: &str = "healthz-server";

/// Default HTTP bind address
pub const DEFAULT_BIND_ADDRESS: &str = "0.0.0.0:8080";

/// Running check engine plus the HTTP surface reading from it
pub struct HealthzService {
    store: SnapshotStore,
    refresher: BackgroundRefresher,
    http_server: HttpServer,
}

impl HealthzService {
    /// Start the refresher for the given registry
    pub fn start(config: &ServerConfig, registry: ProbeRegistry) -> Self {
        let orchestrator: Arc<dyn RoundRunner> =
            Arc::new(CheckOrchestrator::from_config(registry, &config.checks));
        let store = SnapshotStore::new();
        let refresher = BackgroundRefresher::start(orchestrator, store.clone(), &config.checks);
        let http_server = HttpServer::new(store.clone());

        Self {
            store,
            refresher,
            http_server,
        }
    }

    /// Snapshot store shared with the HTTP handlers
    pub fn store(&self) -> &SnapshotStore {
        &self.store
    }

    /// Router serving the snapshot
    pub fn router(&self) -> Router {
        self.http_server.create_router()
    }

    /// Wait until the first round has been published
    pub async fn wait_for_first_round(&self) -> ServerResult<Snapshot> {
        Ok(self.store.wait_initialized().await?)
    }

    /// Stop the refresher
    pub async fn shutdown(mut self) -> ServerResult<()> {
        self.refresher.stop().await?;
        info!("Healthz service stopped");
        Ok(())
    }
}

/// Validate the configuration and start the service with simulated probes
pub fn init_service(
    config: &ServerConfig,
    profile: &SimulationProfile,
) -> ServerResult<HealthzService> {
    config.validate()?;
    let registry = probes::build_registry(&config.probes, profile)?;
    info!(
        "Registered {} probes, probe timeout {}ms, refresh interval {}ms",
        registry.len(),
        config.checks.probe_timeout_ms,
        config.checks.refresh_interval_ms
    );
    Ok(HealthzService::start(config, registry))
}
