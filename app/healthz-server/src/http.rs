//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! HTTP endpoints for the healthz server
//!
//! Handlers only read the snapshot store; they never run probes.

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use healthz_core::SnapshotStore;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::exposition::{
    render_json, render_metrics, render_text, ReportFormat, METRICS_CONTENT_TYPE,
    TEXT_CONTENT_TYPE,
};

/// Query parameters of `/healthz`
#[derive(Debug, Default, Deserialize)]
pub struct HealthzParams {
    /// `text` (default) or `json`; other values fall back to text
    pub format: Option<String>,
}

/// HTTP server for health endpoints
#[derive(Clone)]
pub struct HttpServer {
    store: SnapshotStore,
}

impl HttpServer {
    /// Create new HTTP server
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    /// Create router with all endpoints
    pub fn create_router(&self) -> Router {
        Router::new()
            .route("/healthz", get(Self::healthz))
            .route("/healthz/live", get(Self::health_live))
            .route("/metrics", get(Self::metrics))
            .layer(TraceLayer::new_for_http())
            .with_state(Arc::new(self.clone()))
    }

    /// Aggregated health report
    async fn healthz(
        State(server): State<Arc<Self>>,
        Query(params): Query<HealthzParams>,
    ) -> Response {
        let snapshot = server.store.read();
        let status_code = if snapshot.overall_ok {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        match ReportFormat::parse(params.format.as_deref()) {
            ReportFormat::Text => (
                status_code,
                [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
                render_text(&snapshot),
            )
                .into_response(),
            ReportFormat::Json => match serde_json::to_string_pretty(&render_json(&snapshot)) {
                Ok(body) => (
                    status_code,
                    [(header::CONTENT_TYPE, "application/json")],
                    body,
                )
                    .into_response(),
                Err(e) => {
                    error!("Failed to serialize health report: {}", e);
                    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
                }
            },
        }
    }

    /// Liveness probe endpoint
    async fn health_live(State(_server): State<Arc<Self>>) -> impl IntoResponse {
        (StatusCode::OK, Json(json!({ "status": "alive" })))
    }

    /// Prometheus metrics endpoint
    async fn metrics(State(server): State<Arc<Self>>) -> impl IntoResponse {
        let snapshot = server.store.read();
        (
            StatusCode::OK,
            [(header::CONTENT_TYPE, METRICS_CONTENT_TYPE)],
            render_metrics(&snapshot),
        )
    }
}
