//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Server configuration
//!
//! Settings are layered: built-in defaults, an optional TOML file,
//! `HEALTHZ_*` environment variables and finally command-line overrides.

use healthz_core::HealthCheckConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::error::{ServerError, ServerResult};
use crate::DEFAULT_BIND_ADDRESS;

/// Default location of the optional configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/healthz.toml";

/// Environment variable naming the configuration file
pub const CONFIG_PATH_ENV: &str = "HEALTHZ_CONFIG_PATH";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address the HTTP listener binds to
    pub bind_address: String,

    /// Hold the listener back until the first round is published
    pub wait_for_first_round: bool,

    /// Probe scheduling
    pub checks: HealthCheckConfig,

    /// Probes to register
    pub probes: ProbeSetConfig,
}

/// Names of the probes registered at startup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProbeSetConfig {
    /// Critical dependency probes
    pub critical: Vec<String>,

    /// Internal APIs, registered as dependent probes
    pub internal_apis: Vec<String>,

    /// External APIs, registered as independent probes
    pub external_apis: Vec<String>,

    /// Register the end-to-end workflow probe
    pub workflow: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: DEFAULT_BIND_ADDRESS.to_string(),
            wait_for_first_round: true,
            checks: HealthCheckConfig::default(),
            probes: ProbeSetConfig::default(),
        }
    }
}

impl Default for ProbeSetConfig {
    fn default() -> Self {
        Self {
            critical: vec!["db_connection".to_string(), "config_service".to_string()],
            internal_apis: vec!["billing".to_string(), "usage".to_string()],
            external_apis: vec!["alipay".to_string(), "sms".to_string()],
            workflow: false,
        }
    }
}

/// Command-line overrides, applied last
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub bind_address: Option<String>,
    pub probe_timeout_ms: Option<u64>,
    pub refresh_interval_ms: Option<u64>,
    pub workflow: bool,
}

impl ServerConfig {
    /// Load configuration from a TOML file
    pub fn from_file(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ServerError::Configuration(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = toml::from_str::<ServerConfig>(&content)?;
        Ok(config)
    }

    /// Apply `HEALTHZ_*` overrides from the process environment
    pub fn apply_env(&mut self) -> ServerResult<()> {
        self.apply_env_from(|key| std::env::var(key).ok())
    }

    /// Apply `HEALTHZ_*` overrides from an arbitrary lookup
    pub fn apply_env_from<F>(&mut self, lookup: F) -> ServerResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HEALTHZ_BIND_ADDRESS") {
            self.bind_address = value;
        }
        if let Some(value) = lookup("HEALTHZ_PROBE_TIMEOUT_MS") {
            self.checks.probe_timeout_ms = parse_env("HEALTHZ_PROBE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("HEALTHZ_REFRESH_INTERVAL_MS") {
            self.checks.refresh_interval_ms = parse_env("HEALTHZ_REFRESH_INTERVAL_MS", &value)?;
        }
        if let Some(value) = lookup("HEALTHZ_MAX_BACKOFF_MS") {
            self.checks.max_backoff_ms = parse_env("HEALTHZ_MAX_BACKOFF_MS", &value)?;
        }
        if let Some(value) = lookup("HEALTHZ_CRITICAL_PROBES") {
            self.probes.critical = split_list(&value);
        }
        if let Some(value) = lookup("HEALTHZ_INTERNAL_APIS") {
            self.probes.internal_apis = split_list(&value);
        }
        if let Some(value) = lookup("HEALTHZ_EXTERNAL_APIS") {
            self.probes.external_apis = split_list(&value);
        }
        if let Some(value) = lookup("HEALTHZ_WORKFLOW") {
            self.probes.workflow = parse_env("HEALTHZ_WORKFLOW", &value)?;
        }
        if let Some(value) = lookup("HEALTHZ_WAIT_FOR_FIRST_ROUND") {
            self.wait_for_first_round = parse_env("HEALTHZ_WAIT_FOR_FIRST_ROUND", &value)?;
        }
        Ok(())
    }

    /// Apply command-line overrides
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(bind_address) = &overrides.bind_address {
            self.bind_address = bind_address.clone();
        }
        if let Some(timeout) = overrides.probe_timeout_ms {
            self.checks.probe_timeout_ms = timeout;
        }
        if let Some(interval) = overrides.refresh_interval_ms {
            self.checks.refresh_interval_ms = interval;
        }
        if overrides.workflow {
            self.probes.workflow = true;
        }
    }

    /// Parsed bind address
    pub fn socket_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.bind_address.parse()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> ServerResult<()> {
        self.socket_addr()?;
        self.checks.validate()?;

        let mut seen = HashSet::new();
        for name in self.probes.probe_names() {
            if name.trim().is_empty() || name.ends_with('/') {
                return Err(ServerError::Configuration(
                    "probe names must not be empty".to_string(),
                ));
            }
            if !seen.insert(name.clone()) {
                return Err(ServerError::Configuration(format!(
                    "duplicate probe name: {}",
                    name
                )));
            }
        }

        Ok(())
    }
}

impl ProbeSetConfig {
    /// Fully qualified probe names in registration order
    pub fn probe_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.critical.clone();
        names.extend(self.internal_apis.iter().map(|n| internal_api_name(n)));
        names.extend(self.external_apis.iter().map(|n| external_api_name(n)));
        if self.workflow {
            names.push(crate::probes::WORKFLOW_PROBE_NAME.to_string());
        }
        names
    }
}

/// Probe name of an internal API
pub fn internal_api_name(api: &str) -> String {
    format!("internal_api/{}", api)
}

/// Probe name of an external API
pub fn external_api_name(api: &str) -> String {
    format!("external_api/{}", api)
}

/// Load configuration: defaults, then file, then environment
///
/// An explicitly requested file must exist; the default path is optional.
pub fn load_config(explicit_path: Option<PathBuf>) -> ServerResult<ServerConfig> {
    let (path, required) = match explicit_path {
        Some(path) => (path, true),
        None => match std::env::var(CONFIG_PATH_ENV) {
            Ok(path) => (PathBuf::from(path), true),
            Err(_) => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
        },
    };

    let mut config = if path.exists() || required {
        info!("Loading configuration from {}", path.display());
        ServerConfig::from_file(&path)?
    } else {
        info!("Using default configuration");
        ServerConfig::default()
    };

    config.apply_env()?;
    debug!(?config, "Configuration resolved");
    Ok(config)
}

fn parse_env<T>(key: &str, value: &str) -> ServerResult<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ServerError::Configuration(format!("Invalid value for {}: {}", key, e)))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
