//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Check orchestration engine for the healthz service
//!
//! This crate runs dependency probes in tiers, applies the gating policy
//! between tiers, keeps the latest completed round in a snapshot store and
//! refreshes it from a background task. Exposition of the snapshot lives in
//! the `healthz-server` application.

pub mod config;
pub mod error;
pub mod health;
pub mod orchestrator;
pub mod probe;
pub mod refresher;
pub mod registry;
pub mod snapshot;

// Re-export commonly used types
pub use config::HealthCheckConfig;
pub use error::{HealthzError, HealthzResult};
pub use health::{CheckFailure, CheckResult, CheckRound, Tier};
pub use orchestrator::{CheckOrchestrator, RoundRunner};
pub use probe::{Probe, ProbeError, ProbeOutcome};
pub use refresher::BackgroundRefresher;
pub use registry::{ProbeRegistry, ProbeRegistryBuilder, RegisteredProbe};
pub use snapshot::{Snapshot, SnapshotStore};

/// Engine version information
pub const HEALTHZ_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Engine name
pub const HEALTHZ_NAME: &str = "healthz-core";

/// Message recorded for dependent probes skipped after a critical failure
pub const SKIPPED_UPSTREAM_CRITICAL: &str = "skipped: upstream critical failure";

/// Message recorded for workflow probes skipped after any earlier failure
pub const SKIPPED_UPSTREAM: &str = "skipped: upstream failure";
