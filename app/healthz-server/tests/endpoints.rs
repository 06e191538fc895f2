//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! End-to-end tests against the HTTP endpoints

use healthz_core::{ProbeRegistry, SKIPPED_UPSTREAM_CRITICAL};
use healthz_server::{
    exposition::HealthReport,
    init_service,
    probes::{ApiProbe, DependencyProbe},
    HealthzService, ServerConfig, SimulationProfile,
};
use serde_json::Value;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

fn test_config() -> ServerConfig {
    let mut config = ServerConfig {
        bind_address: "127.0.0.1:0".to_string(),
        ..Default::default()
    };
    config.checks.probe_timeout_ms = 500;
    config.checks.refresh_interval_ms = 50;
    config.checks.max_backoff_ms = 1_000;
    config
}

async fn serve(service: &HealthzService) -> SocketAddr {
    service.wait_for_first_round().await.unwrap();

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let router = service.router();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

#[tokio::test]
async fn test_all_probes_pass() {
    let config = test_config();
    let service = init_service(&config, &SimulationProfile::always_pass()).unwrap();
    let addr = serve(&service).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/healthz?format=json", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers()["content-type"].to_str().unwrap(),
        "application/json"
    );
    let report: HealthReport = response.json().await.unwrap();
    assert_eq!(report.status, "ok");
    assert_eq!(report.data.message, "All critical checks passed");
    assert_eq!(report.data.checks.critical.len(), 4);
    assert_eq!(report.data.checks.external.len(), 2);

    let response = client
        .get(format!("http://{}/metrics", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let metrics = response.text().await.unwrap();
    assert_eq!(metrics.lines().filter(|l| l.starts_with('#')).count(), 2);
    assert_eq!(
        metrics.lines().filter(|l| !l.starts_with('#')).count(),
        config.probes.probe_names().len()
    );
    for name in config.probes.probe_names() {
        let matching: Vec<&str> = metrics
            .lines()
            .filter(|line| line.starts_with(&format!("healthcheck_status{{check=\"{}\"", name)))
            .collect();
        assert_eq!(matching.len(), 1, "expected one gauge for {}", name);
        assert!(matching[0].ends_with(" 1"));
    }

    let response = client
        .get(format!("http://{}/healthz", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let text = response.text().await.unwrap();
    assert!(text.starts_with("HEALTH CHECK REPORT\n"));
    assert!(text.contains("----- EXTERNAL -----"));

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_failing_database_gates_dependents() {
    let pass = SimulationProfile::always_pass();
    let fail = SimulationProfile::always_fail();
    let registry = ProbeRegistry::builder()
        .critical(Arc::new(DependencyProbe::new("db_connection", &fail)))
        .critical(Arc::new(DependencyProbe::new("config_service", &pass)))
        .dependent(Arc::new(ApiProbe::internal("billing", &pass)))
        .dependent(Arc::new(ApiProbe::internal("usage", &pass)))
        .independent(Arc::new(ApiProbe::external("alipay", &pass)))
        .independent(Arc::new(ApiProbe::external("sms", &fail)))
        .build()
        .unwrap();

    let service = HealthzService::start(&test_config(), registry);
    let addr = serve(&service).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/healthz?format=json", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "error");
    assert_eq!(body["data"]["message"], "Some critical checks failed");

    let critical = body["data"]["checks"]["critical"].as_array().unwrap();
    assert_eq!(critical[0]["name"], "db_connection");
    assert_eq!(critical[0]["message"], "Database connection failed");
    assert_eq!(critical[1]["status"], "ok");
    for dependent in &critical[2..] {
        assert_eq!(dependent["status"], "error");
        assert_eq!(dependent["message"], SKIPPED_UPSTREAM_CRITICAL);
    }

    let external = body["data"]["checks"]["external"].as_array().unwrap();
    assert_eq!(external.len(), 2);
    assert_eq!(external[0]["status"], "ok");
    assert_eq!(external[0]["message"], "external_api/alipay OK (0ms)");
    assert_eq!(external[1]["message"], "external_api/sms returned error");

    let response = client
        .get(format!("http://{}/healthz?format=yaml", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 500);
    let text = response.text().await.unwrap();
    assert!(text.contains("skipped: upstream critical failure"));

    let response = client
        .get(format!("http://{}/metrics", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let metrics = response.text().await.unwrap();
    assert!(metrics.contains(r#"healthcheck_status{check="db_connection",type="critical"} 0"#));
    assert!(metrics.contains(
        r#"healthcheck_status{check="internal_api/billing",type="critical"} 0"#
    ));
    assert!(metrics.contains(r#"healthcheck_status{check="external_api/alipay",type="external"} 1"#));

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_liveness_and_unknown_routes() {
    let config = test_config();
    let service = init_service(&config, &SimulationProfile::always_pass()).unwrap();
    let addr = serve(&service).await;
    let client = reqwest::Client::new();

    let response = client
        .get(format!("http://{}/healthz/live", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["status"], "alive");

    let response = client
        .get(format!("http://{}/nope", addr))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 404);

    service.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_workflow_section_reported() {
    let mut config = test_config();
    config.probes.workflow = true;
    let service = init_service(&config, &SimulationProfile::always_pass()).unwrap();
    let addr = serve(&service).await;

    let body: Value = reqwest::get(format!("http://{}/healthz?format=json", addr))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let workflow = body["data"]["checks"]["workflow"].as_array().unwrap();
    assert_eq!(workflow.len(), 1);
    assert_eq!(workflow[0]["name"], "endtoend_workflow");
    assert_eq!(workflow[0]["message"], "Workflow executed successfully");

    service.shutdown().await.unwrap();
}
