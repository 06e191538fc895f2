//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Error types for the healthz server

use healthz_core::HealthzError;
use thiserror::Error;

/// Result type for server operations
pub type ServerResult<T> = Result<T, ServerError>;

/// Error type for server operations
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Engine error: {0}")]
    Engine(#[from] HealthzError),
}

impl From<toml::de::Error> for ServerError {
    fn from(err: toml::de::Error) -> Self {
        ServerError::Configuration(format!("Failed to parse config file: {}", err))
    }
}

impl From<std::net::AddrParseError> for ServerError {
    fn from(err: std::net::AddrParseError) -> Self {
        ServerError::Configuration(format!("Invalid bind address: {}", err))
    }
}
