//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Check scheduling configuration

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{HealthzError, HealthzResult};

/// Default per-probe timeout in milliseconds
pub const DEFAULT_PROBE_TIMEOUT_MS: u64 = 2_000;

/// Default refresh interval in milliseconds
pub const DEFAULT_REFRESH_INTERVAL_MS: u64 = 10_000;

/// Default ceiling for the refresher backoff in milliseconds
pub const DEFAULT_MAX_BACKOFF_MS: u64 = 60_000;

/// Check scheduling configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Deadline for a single probe in milliseconds
    pub probe_timeout_ms: u64,

    /// Pause between two rounds in milliseconds
    pub refresh_interval_ms: u64,

    /// Upper bound for the delay after a failed round in milliseconds
    pub max_backoff_ms: u64,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            probe_timeout_ms: DEFAULT_PROBE_TIMEOUT_MS,
            refresh_interval_ms: DEFAULT_REFRESH_INTERVAL_MS,
            max_backoff_ms: DEFAULT_MAX_BACKOFF_MS,
        }
    }
}

impl HealthCheckConfig {
    /// Per-probe deadline
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }

    /// Pause between rounds
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_millis(self.refresh_interval_ms)
    }

    /// Backoff ceiling
    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.max_backoff_ms)
    }

    /// Validate check configuration
    pub fn validate(&self) -> HealthzResult<()> {
        if self.probe_timeout_ms == 0 {
            return Err(HealthzError::configuration(
                "probe timeout must be greater than 0",
            ));
        }

        if self.refresh_interval_ms == 0 {
            return Err(HealthzError::configuration(
                "refresh interval must be greater than 0",
            ));
        }

        if self.max_backoff_ms < self.refresh_interval_ms {
            return Err(HealthzError::configuration(
                "max backoff must not be less than the refresh interval",
            ));
        }

        Ok(())
    }
}
