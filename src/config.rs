//! Topology configuration.
//!
//! A YAML document selects the graph file, the entity mappings, any extra
//! links declared between entities, and how eagerly delays are recomputed.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use crate::topology::{EntityId, NodeId, RecomputePolicy};

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub network: NetworkConfig,
}

impl Config {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if let Some(level) = &self.general.log_level {
            if log::LevelFilter::from_str(level).is_err() {
                return Err(ValidationError::InvalidGeneral(format!("Unknown log level '{}'", level)));
            }
        }
        if self.general.parallel_threshold == Some(0) {
            return Err(ValidationError::InvalidGeneral(
                "parallel_threshold must be at least 1".to_string(),
            ));
        }

        if let Some(path) = &self.network.gml {
            if path.as_os_str().is_empty() {
                return Err(ValidationError::InvalidNetwork("GML path cannot be empty".to_string()));
            }
        }

        let mut mapped = HashSet::new();
        for mapping in &self.network.entities {
            if !mapped.insert(mapping.entity) {
                return Err(ValidationError::InvalidNetwork(format!(
                    "Entity {} is mapped more than once",
                    mapping.entity
                )));
            }
        }

        for link in &self.network.links {
            if !link.bandwidth.is_finite() || link.bandwidth <= 0.0 {
                return Err(ValidationError::InvalidLink(format!(
                    "bandwidth of link {} -> {} must be positive, got {}",
                    link.source, link.target, link.bandwidth
                )));
            }
        }

        Ok(())
    }
}

/// Settings that are not about the topology itself
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct GeneralConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
    #[serde(default)]
    pub recompute: RecomputePolicy,
    /// Node count from which delay computation runs in parallel
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallel_threshold: Option<usize>,
}

impl GeneralConfig {
    /// Configured log level, `None` when unset or unrecognised.
    pub fn level_filter(&self) -> Option<log::LevelFilter> {
        self.log_level
            .as_deref()
            .and_then(|level| log::LevelFilter::from_str(level).ok())
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct NetworkConfig {
    /// Set to false to run the simulation without network delays
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    /// GML topology file, relative paths resolve against the config file
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gml: Option<PathBuf>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entities: Vec<EntityMapping>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<LinkConfig>,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gml: None,
            entities: Vec::new(),
            links: Vec::new(),
        }
    }
}

fn default_enabled() -> bool {
    true
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct EntityMapping {
    pub entity: EntityId,
    pub node: NodeId,
}

/// A link declared between two entities
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct LinkConfig {
    pub source: EntityId,
    pub target: EntityId,
    /// Mbit/s
    pub bandwidth: f64,
    #[serde(with = "humantime_serde")]
    pub latency: Duration,
}

impl LinkConfig {
    pub fn latency_millis(&self) -> f64 {
        self.latency.as_nanos() as f64 / 1e6
    }
}

/// Configuration validation errors
#[derive(Debug, thiserror::Error)]
pub enum ValidationError {
    #[error("Invalid general configuration: {0}")]
    InvalidGeneral(String),
    #[error("Invalid network configuration: {0}")]
    InvalidNetwork(String),
    #[error("Invalid link configuration: {0}")]
    InvalidLink(String),
}
