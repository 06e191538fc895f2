//! SPDX-FileCopyrightText: © 2025 Cory Parent <goedelsoup+orasi@goedelsoup.io>
//! SPDX-License-Identifier: Apache-2.0
//!

//! Probe set registry
//!
//! Static assignment of probes to tiers. Declaration order within a tier is
//! the order results are reported in, whatever order the probes finish.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use tracing::info;

use crate::error::{HealthzError, HealthzResult};
use crate::health::Tier;
use crate::probe::Probe;

/// Probe registered under a tier
#[derive(Clone)]
pub struct RegisteredProbe {
    name: String,
    tier: Tier,
    probe: Arc<dyn Probe>,
}

impl RegisteredProbe {
    /// Check name captured at registration
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Tier the probe belongs to
    pub fn tier(&self) -> Tier {
        self.tier
    }

    /// Shared handle on the probe
    pub fn probe(&self) -> Arc<dyn Probe> {
        Arc::clone(&self.probe)
    }
}

impl fmt::Debug for RegisteredProbe {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisteredProbe")
            .field("name", &self.name)
            .field("tier", &self.tier)
            .finish()
    }
}

/// Probes grouped by tier
#[derive(Debug, Clone, Default)]
pub struct ProbeRegistry {
    critical: Vec<RegisteredProbe>,
    dependent: Vec<RegisteredProbe>,
    independent: Vec<RegisteredProbe>,
    workflow: Vec<RegisteredProbe>,
}

impl ProbeRegistry {
    /// Start building a registry
    pub fn builder() -> ProbeRegistryBuilder {
        ProbeRegistryBuilder::default()
    }

    /// Probes of one tier in declaration order
    pub fn probes(&self, tier: Tier) -> &[RegisteredProbe] {
        match tier {
            Tier::Critical => &self.critical,
            Tier::Dependent => &self.dependent,
            Tier::Independent => &self.independent,
            Tier::Workflow => &self.workflow,
        }
    }

    /// Names of one tier in declaration order
    pub fn names(&self, tier: Tier) -> Vec<&str> {
        self.probes(tier).iter().map(|p| p.name()).collect()
    }

    /// Total number of registered probes
    pub fn len(&self) -> usize {
        Tier::ALL.iter().map(|tier| self.probes(*tier).len()).sum()
    }

    /// Whether no probe is registered
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builder validating probe names while collecting tiers
#[derive(Default)]
pub struct ProbeRegistryBuilder {
    entries: Vec<RegisteredProbe>,
}

impl ProbeRegistryBuilder {
    /// Register a probe under the given tier
    pub fn register(mut self, tier: Tier, probe: Arc<dyn Probe>) -> Self {
        self.entries.push(RegisteredProbe {
            name: probe.name().to_string(),
            tier,
            probe,
        });
        self
    }

    /// Register a critical probe
    pub fn critical(self, probe: Arc<dyn Probe>) -> Self {
        self.register(Tier::Critical, probe)
    }

    /// Register a dependent probe
    pub fn dependent(self, probe: Arc<dyn Probe>) -> Self {
        self.register(Tier::Dependent, probe)
    }

    /// Register an independent probe
    pub fn independent(self, probe: Arc<dyn Probe>) -> Self {
        self.register(Tier::Independent, probe)
    }

    /// Register a workflow probe
    pub fn workflow(self, probe: Arc<dyn Probe>) -> Self {
        self.register(Tier::Workflow, probe)
    }

    /// Validate names and build the registry
    pub fn build(self) -> HealthzResult<ProbeRegistry> {
        let mut seen = HashSet::new();
        let mut registry = ProbeRegistry::default();

        for entry in self.entries {
            if entry.name.trim().is_empty() {
                return Err(HealthzError::registry(format!(
                    "probe name must not be empty ({} tier)",
                    entry.tier
                )));
            }

            if !seen.insert(entry.name.clone()) {
                return Err(HealthzError::registry(format!(
                    "duplicate probe name: {}",
                    entry.name
                )));
            }

            match entry.tier {
                Tier::Critical => registry.critical.push(entry),
                Tier::Dependent => registry.dependent.push(entry),
                Tier::Independent => registry.independent.push(entry),
                Tier::Workflow => registry.workflow.push(entry),
            }
        }

        info!(
            "Probe registry built: {} critical, {} dependent, {} independent, {} workflow",
            registry.critical.len(),
            registry.dependent.len(),
            registry.independent.len(),
            registry.workflow.len()
        );

        Ok(registry)
    }
}
