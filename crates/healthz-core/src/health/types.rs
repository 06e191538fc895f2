//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Check result types and data structures

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

use crate::{SKIPPED_UPSTREAM, SKIPPED_UPSTREAM_CRITICAL};

/// Probe tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Failures here gate the dependent tier and fail the service
    Critical,

    /// Runs only when every critical probe passed; counts toward status
    Dependent,

    /// Always runs; never affects status
    Independent,

    /// Runs last, only when every earlier result passed; never affects status
    Workflow,
}

impl Tier {
    /// All tiers in reporting order
    pub const ALL: [Tier; 4] = [
        Tier::Critical,
        Tier::Dependent,
        Tier::Independent,
        Tier::Workflow,
    ];

    /// Whether results of this tier contribute to `overall_ok`
    pub fn affects_status(&self) -> bool {
        matches!(self, Tier::Critical | Tier::Dependent)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tier::Critical => write!(f, "critical"),
            Tier::Dependent => write!(f, "dependent"),
            Tier::Independent => write!(f, "independent"),
            Tier::Workflow => write!(f, "workflow"),
        }
    }
}

/// Why a check result was recorded as failed without a probe outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CheckFailure {
    /// Probe exceeded its deadline
    Timeout,

    /// Probe returned an error
    Error(String),

    /// Probe task panicked
    Panic,

    /// Dependent probe not run because a critical probe failed
    UpstreamCriticalSkip,

    /// Workflow probe not run because an earlier result failed
    UpstreamSkip,
}

impl CheckFailure {
    /// Message recorded for the named check
    pub fn message(&self, name: &str) -> String {
        match self {
            CheckFailure::Timeout => format!("{} timed out", name),
            CheckFailure::Error(message) => message.clone(),
            CheckFailure::Panic => format!("{} panicked", name),
            CheckFailure::UpstreamCriticalSkip => SKIPPED_UPSTREAM_CRITICAL.to_string(),
            CheckFailure::UpstreamSkip => SKIPPED_UPSTREAM.to_string(),
        }
    }
}

/// Outcome of a single check within a round
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    /// Qualified check name
    pub name: String,

    /// Whether the check passed
    pub ok: bool,

    /// Human-readable detail
    pub message: String,

    /// Time spent waiting on the probe, 0 for synthesized results
    pub duration_ms: u64,
}

impl CheckResult {
    /// Create a new check result
    pub fn new(name: impl Into<String>, ok: bool, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ok,
            message: message.into(),
            duration_ms: 0,
        }
    }

    /// Create a failed result for the given failure kind
    pub fn failure(name: impl Into<String>, failure: CheckFailure) -> Self {
        let name = name.into();
        let message = failure.message(&name);
        Self::new(name, false, message)
    }

    /// Set the duration of the check
    pub fn with_duration(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }
}

/// One complete execution of all tiers
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckRound {
    /// Critical tier, registry order
    pub critical_results: Vec<CheckResult>,

    /// Dependent tier, registry order
    pub dependent_results: Vec<CheckResult>,

    /// Independent tier, registry order
    pub independent_results: Vec<CheckResult>,

    /// Workflow tier, registry order
    pub workflow_results: Vec<CheckResult>,

    /// AND over critical and dependent results
    pub overall_ok: bool,

    /// Completion time of the round
    pub produced_at: DateTime<Utc>,

    /// Round number, 0 for the placeholder published before any round ran
    pub sequence: u64,
}

impl CheckRound {
    /// Assemble a round from per-tier results, stamped now
    pub fn new(
        sequence: u64,
        critical_results: Vec<CheckResult>,
        dependent_results: Vec<CheckResult>,
        independent_results: Vec<CheckResult>,
        workflow_results: Vec<CheckResult>,
    ) -> Self {
        let overall_ok = critical_results
            .iter()
            .chain(dependent_results.iter())
            .all(|r| r.ok);

        Self {
            critical_results,
            dependent_results,
            independent_results,
            workflow_results,
            overall_ok,
            produced_at: Utc::now(),
            sequence,
        }
    }

    /// Placeholder served before the first round completes
    pub fn uninitialized() -> Self {
        Self {
            critical_results: Vec::new(),
            dependent_results: Vec::new(),
            independent_results: Vec::new(),
            workflow_results: Vec::new(),
            overall_ok: true,
            produced_at: DateTime::<Utc>::UNIX_EPOCH,
            sequence: 0,
        }
    }

    /// Whether this round came from the orchestrator
    pub fn is_initialized(&self) -> bool {
        self.sequence > 0
    }

    /// Results of one tier
    pub fn results(&self, tier: Tier) -> &[CheckResult] {
        match tier {
            Tier::Critical => &self.critical_results,
            Tier::Dependent => &self.dependent_results,
            Tier::Independent => &self.independent_results,
            Tier::Workflow => &self.workflow_results,
        }
    }

    /// Critical results followed by dependent results
    pub fn status_results(&self) -> impl Iterator<Item = &CheckResult> {
        self.critical_results
            .iter()
            .chain(self.dependent_results.iter())
    }

    /// Every result in reporting order with its tier
    pub fn iter(&self) -> impl Iterator<Item = (Tier, &CheckResult)> {
        Tier::ALL
            .into_iter()
            .flat_map(move |tier| self.results(tier).iter().map(move |r| (tier, r)))
    }

    /// Number of failed results that count toward status
    pub fn failed_count(&self) -> usize {
        self.status_results().filter(|r| !r.ok).count()
    }

    /// Total number of results across all tiers
    pub fn len(&self) -> usize {
        Tier::ALL.iter().map(|tier| self.results(*tier).len()).sum()
    }

    /// Whether the round carries no results
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
