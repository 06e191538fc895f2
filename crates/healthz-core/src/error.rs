//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error types for the healthz engine
//!
//! Probe-level failures never surface here: they are folded into the
//! [`CheckResult`](crate::health::CheckResult) of the round. These errors
//! cover configuration, registry construction and refresher lifecycle.

use thiserror::Error;

/// Result type for engine operations
pub type HealthzResult<T> = Result<T, HealthzError>;

/// Error type for engine operations
#[derive(Error, Debug)]
pub enum HealthzError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Registry error: {0}")]
    Registry(String),

    #[error("Refresher error: {0}")]
    Refresher(String),

    #[error("Snapshot store closed")]
    SnapshotClosed,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl HealthzError {
    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        HealthzError::Configuration(message.into())
    }

    /// Create a registry error
    pub fn registry(message: impl Into<String>) -> Self {
        HealthzError::Registry(message.into())
    }
}

impl From<tokio::task::JoinError> for HealthzError {
    fn from(err: tokio::task::JoinError) -> Self {
        if err.is_panic() {
            HealthzError::Refresher(format!("task panicked: {}", err))
        } else {
            HealthzError::Internal(err.to_string())
        }
    }
}
