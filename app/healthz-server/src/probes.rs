//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Simulated dependency probes
//!
//! These stand in for real connectivity checks. Outcomes are drawn from
//! `fastrand` according to a [`SimulationProfile`], so tests can pin them.

use async_trait::async_trait;
use healthz_core::{HealthzResult, Probe, ProbeError, ProbeOutcome, ProbeRegistry};
use std::sync::Arc;
use std::time::Duration;

use crate::config::{external_api_name, internal_api_name, ProbeSetConfig};

/// Name of the end-to-end workflow probe
pub const WORKFLOW_PROBE_NAME: &str = "endtoend_workflow";

/// How long a hanging API probe sleeps; always past any sane deadline
const HANG_DURATION: Duration = Duration::from_secs(3600);

/// Outcome rates and latency range of the simulators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationProfile {
    /// Probability that a critical dependency check passes
    pub critical_success_rate: f64,

    /// Probability that an API call never returns
    pub api_hang_rate: f64,

    /// Probability that an API call that returned reports an error
    pub api_error_rate: f64,

    /// Probability that the workflow check passes
    pub workflow_success_rate: f64,

    /// Lower bound of simulated API latency in milliseconds
    pub min_latency_ms: u64,

    /// Upper bound of simulated API latency in milliseconds
    pub max_latency_ms: u64,
}

impl Default for SimulationProfile {
    fn default() -> Self {
        Self {
            critical_success_rate: 0.98,
            api_hang_rate: 0.02,
            api_error_rate: 0.13,
            workflow_success_rate: 0.95,
            min_latency_ms: 50,
            max_latency_ms: 500,
        }
    }
}

impl SimulationProfile {
    /// Every probe passes without delay
    pub fn always_pass() -> Self {
        Self {
            critical_success_rate: 1.0,
            api_hang_rate: 0.0,
            api_error_rate: 0.0,
            workflow_success_rate: 1.0,
            min_latency_ms: 0,
            max_latency_ms: 0,
        }
    }

    /// Every probe fails without delay
    pub fn always_fail() -> Self {
        Self {
            critical_success_rate: 0.0,
            api_hang_rate: 0.0,
            api_error_rate: 1.0,
            workflow_success_rate: 0.0,
            min_latency_ms: 0,
            max_latency_ms: 0,
        }
    }

    fn latency(&self) -> Duration {
        let max = self.max_latency_ms.max(self.min_latency_ms);
        Duration::from_millis(fastrand::u64(self.min_latency_ms..=max))
    }
}

fn roll(rate: f64) -> bool {
    fastrand::f64() < rate
}

/// Critical dependency such as a database or a config service
#[derive(Debug, Clone)]
pub struct DependencyProbe {
    name: String,
    pass_message: String,
    fail_message: String,
    success_rate: f64,
}

impl DependencyProbe {
    pub fn new(name: impl Into<String>, profile: &SimulationProfile) -> Self {
        let name = name.into();
        match name.as_str() {
            "db_connection" => Self::with_messages(
                name,
                "Database is connected",
                "Database connection failed",
                profile,
            ),
            "config_service" => Self::with_messages(
                name,
                "Config service is reachable",
                "Config service error",
                profile,
            ),
            _ => {
                let pass = format!("{} is reachable", name);
                let fail = format!("{} check failed", name);
                Self::with_messages(name, pass, fail, profile)
            }
        }
    }

    fn with_messages(
        name: String,
        pass_message: impl Into<String>,
        fail_message: impl Into<String>,
        profile: &SimulationProfile,
    ) -> Self {
        Self {
            name,
            pass_message: pass_message.into(),
            fail_message: fail_message.into(),
            success_rate: profile.critical_success_rate,
        }
    }
}

#[async_trait]
impl Probe for DependencyProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        if roll(self.success_rate) {
            Ok(ProbeOutcome::pass(self.pass_message.clone()))
        } else {
            Ok(ProbeOutcome::fail(self.fail_message.clone()))
        }
    }
}

/// Remote API call with simulated latency
#[derive(Debug, Clone)]
pub struct ApiProbe {
    name: String,
    profile: SimulationProfile,
}

impl ApiProbe {
    pub fn internal(api: &str, profile: &SimulationProfile) -> Self {
        Self {
            name: internal_api_name(api),
            profile: *profile,
        }
    }

    pub fn external(api: &str, profile: &SimulationProfile) -> Self {
        Self {
            name: external_api_name(api),
            profile: *profile,
        }
    }
}

#[async_trait]
impl Probe for ApiProbe {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        if roll(self.profile.api_hang_rate) {
            tokio::time::sleep(HANG_DURATION).await;
        }

        let latency = self.profile.latency();
        tokio::time::sleep(latency).await;

        if roll(self.profile.api_error_rate) {
            return Err(ProbeError::new(format!("{} returned error", self.name)));
        }

        Ok(ProbeOutcome::pass(format!(
            "{} OK ({}ms)",
            self.name,
            latency.as_millis()
        )))
    }
}

/// End-to-end business workflow
#[derive(Debug, Clone)]
pub struct WorkflowProbe {
    success_rate: f64,
}

impl WorkflowProbe {
    pub fn new(profile: &SimulationProfile) -> Self {
        Self {
            success_rate: profile.workflow_success_rate,
        }
    }
}

#[async_trait]
impl Probe for WorkflowProbe {
    fn name(&self) -> &str {
        WORKFLOW_PROBE_NAME
    }

    async fn check(&self) -> Result<ProbeOutcome, ProbeError> {
        if roll(self.success_rate) {
            Ok(ProbeOutcome::pass("Workflow executed successfully"))
        } else {
            Ok(ProbeOutcome::fail("Workflow execution failed"))
        }
    }
}

/// Register the configured simulators
pub fn build_registry(
    probes: &ProbeSetConfig,
    profile: &SimulationProfile,
) -> HealthzResult<ProbeRegistry> {
    let mut builder = ProbeRegistry::builder();

    for name in &probes.critical {
        builder = builder.critical(Arc::new(DependencyProbe::new(name.clone(), profile)));
    }
    for api in &probes.internal_apis {
        builder = builder.dependent(Arc::new(ApiProbe::internal(api, profile)));
    }
    for api in &probes.external_apis {
        builder = builder.independent(Arc::new(ApiProbe::external(api, profile)));
    }
    if probes.workflow {
        builder = builder.workflow(Arc::new(WorkflowProbe::new(profile)));
    }

    builder.build()
}
