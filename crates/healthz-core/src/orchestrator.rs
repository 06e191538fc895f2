//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Check orchestrator
//!
//! Runs one full round: critical and independent probes start together, the
//! dependent tier runs only when every critical probe passed, and the
//! optional workflow tier runs last when everything before it passed. Each
//! probe runs in its own task under its own deadline, so a hung or panicking
//! probe only ever costs its own result.

use async_trait::async_trait;
use futures::future::join_all;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tracing::{debug, error, warn};

use crate::config::HealthCheckConfig;
use crate::health::{CheckFailure, CheckResult, CheckRound, Tier};
use crate::probe::Probe;
use crate::registry::ProbeRegistry;

/// Something that can produce a complete round on demand
#[async_trait]
pub trait RoundRunner: Send + Sync {
    /// Run every tier once and return the assembled round
    async fn run_round(&self) -> CheckRound;
}

/// Executes check rounds over a probe registry
pub struct CheckOrchestrator {
    registry: ProbeRegistry,
    probe_timeout: Duration,
    sequence: AtomicU64,
}

impl CheckOrchestrator {
    /// Create a new orchestrator
    pub fn new(registry: ProbeRegistry, probe_timeout: Duration) -> Self {
        Self {
            registry,
            probe_timeout,
            sequence: AtomicU64::new(0),
        }
    }

    /// Create an orchestrator using the configured probe timeout
    pub fn from_config(registry: ProbeRegistry, config: &HealthCheckConfig) -> Self {
        Self::new(registry, config.probe_timeout())
    }

    /// Run one complete round
    pub async fn run_round(&self) -> CheckRound {
        let started = Instant::now();
        let sequence = self.sequence.fetch_add(1, Ordering::SeqCst) + 1;

        let gated = async {
            let critical = self.run_tier(Tier::Critical).await;
            let dependent = if critical.iter().all(|r| r.ok) {
                self.run_tier(Tier::Dependent).await
            } else {
                self.skip_tier(Tier::Dependent, CheckFailure::UpstreamCriticalSkip)
            };
            (critical, dependent)
        };

        let ((critical, dependent), independent) =
            tokio::join!(gated, self.run_tier(Tier::Independent));

        let upstream_ok = critical
            .iter()
            .chain(dependent.iter())
            .chain(independent.iter())
            .all(|r| r.ok);
        let workflow = if upstream_ok {
            self.run_tier(Tier::Workflow).await
        } else {
            self.skip_tier(Tier::Workflow, CheckFailure::UpstreamSkip)
        };

        let round = CheckRound::new(sequence, critical, dependent, independent, workflow);

        debug!(
            "Check round {} completed in {}ms: overall_ok={}, {} failed",
            round.sequence,
            started.elapsed().as_millis(),
            round.overall_ok,
            round.failed_count()
        );

        round
    }

    /// Run every probe of a tier concurrently, keeping declaration order
    async fn run_tier(&self, tier: Tier) -> Vec<CheckResult> {
        let probes = self.registry.probes(tier);
        if probes.is_empty() {
            return Vec::new();
        }

        let timeout = self.probe_timeout;
        let runs = probes
            .iter()
            .map(|entry| execute_probe(entry.name().to_string(), entry.probe(), timeout));

        join_all(runs).await
    }

    /// Synthesize failed results for a tier without invoking its probes
    fn skip_tier(&self, tier: Tier, failure: CheckFailure) -> Vec<CheckResult> {
        let probes = self.registry.probes(tier);
        if !probes.is_empty() {
            warn!(
                "Skipping {} {} probes: {}",
                probes.len(),
                tier,
                failure.message("")
            );
        }

        probes
            .iter()
            .map(|entry| CheckResult::failure(entry.name(), failure.clone()))
            .collect()
    }
}

#[async_trait]
impl RoundRunner for CheckOrchestrator {
    async fn run_round(&self) -> CheckRound {
        CheckOrchestrator::run_round(self).await
    }
}

/// Run a single probe under its deadline
///
/// The probe runs in its own task owned by a `JoinSet`: on timeout, or when
/// the round itself is dropped, the task is aborted. A panic is reported
/// through the join error.
async fn execute_probe(name: String, probe: Arc<dyn Probe>, timeout: Duration) -> CheckResult {
    let started = Instant::now();
    let mut task = JoinSet::new();
    task.spawn(async move { probe.check().await });

    let joined = tokio::time::timeout(timeout, task.join_next()).await;
    let result = match joined {
        Ok(Some(Ok(Ok(outcome)))) => CheckResult::new(name, outcome.ok, outcome.message),
        Ok(Some(Ok(Err(err)))) => CheckResult::failure(name, CheckFailure::Error(err.to_string())),
        Ok(Some(Err(join_err))) if join_err.is_panic() => {
            error!("Probe {} panicked: {}", name, join_err);
            CheckResult::failure(name, CheckFailure::Panic)
        }
        Ok(Some(Err(join_err))) => {
            error!("Probe {} task failed: {}", name, join_err);
            let message = format!("{} cancelled", name);
            CheckResult::failure(name, CheckFailure::Error(message))
        }
        Ok(None) => {
            let message = format!("{} cancelled", name);
            CheckResult::failure(name, CheckFailure::Error(message))
        }
        Err(_) => {
            task.abort_all();
            CheckResult::failure(name, CheckFailure::Timeout)
        }
    };

    if !result.ok {
        warn!("Check {} failed: {}", result.name, result.message);
    }

    result.with_duration(started.elapsed().as_millis() as u64)
}
