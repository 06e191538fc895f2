//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Probe capability
//!
//! A probe is a named unit of work that reports pass/fail with a message.
//! Concrete checks (database pings, API calls, simulators) implement
//! [`Probe`]; the orchestrator owns deadlines, so implementations do not
//! need their own timeout handling.

use async_trait::async_trait;
use thiserror::Error;

/// Outcome reported by a probe that completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutcome {
    /// Whether the checked dependency is healthy
    pub ok: bool,

    /// Human-readable detail
    pub message: String,
}

impl ProbeOutcome {
    /// Passing outcome
    pub fn pass(message: impl Into<String>) -> Self {
        Self {
            ok: true,
            message: message.into(),
        }
    }

    /// Failing outcome
    pub fn fail(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            message: message.into(),
        }
    }
}

/// Error raised by a probe that could not produce an outcome
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProbeError {
    message: String,
}

impl ProbeError {
    /// Create a new probe error
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// Error text
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Probe capability implemented by every concrete check
#[async_trait]
pub trait Probe: Send + Sync {
    /// Qualified check name, unique within a registry
    fn name(&self) -> &str;

    /// Run the check once
    async fn check(&self) -> Result<ProbeOutcome, ProbeError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_constructors() {
        let pass = ProbeOutcome::pass("Database is connected");
        assert!(pass.ok);
        assert_eq!(pass.message, "Database is connected");

        let fail = ProbeOutcome::fail("Database connection failed");
        assert!(!fail.ok);
    }

    #[test]
    fn test_probe_error_display() {
        let err = ProbeError::new("internal_api/billing returned error");
        assert_eq!(err.to_string(), "internal_api/billing returned error");
        assert_eq!(err.message(), "internal_api/billing returned error");
    }
}
