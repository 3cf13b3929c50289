//! Topology type definitions.
//!
//! Identifier newtypes, the delay query result, and the recompute policy
//! shared by the graph, the mapper and the service.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a vertex in the topology graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(pub u32);

/// Identifier the simulation kernel uses for a host, datacenter or broker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<EntityId> for NodeId {
    /// Default node allocation for an entity that was never mapped.
    fn from(entity: EntityId) -> Self {
        NodeId(entity.0)
    }
}

/// Result of a delay query between two entities.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Delay {
    /// Minimum cumulative latency, in milliseconds.
    Reachable(f64),
    /// No path exists, or one of the entities is not mapped to a node.
    Unreachable,
}

impl Delay {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Self::Reachable(_))
    }

    /// The delay in milliseconds, `None` when unreachable.
    pub fn as_millis(&self) -> Option<f64> {
        match self {
            Self::Reachable(ms) => Some(*ms),
            Self::Unreachable => None,
        }
    }
}

impl From<Option<f64>> for Delay {
    fn from(value: Option<f64>) -> Self {
        value.map_or(Self::Unreachable, Self::Reachable)
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Reachable(ms) => write!(f, "{}ms", ms),
            Self::Unreachable => write!(f, "unreachable"),
        }
    }
}

/// When the service rebuilds its delay matrix after a mutation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecomputePolicy {
    /// Rebuild on the first delay query after the graph changed
    #[default]
    Lazy,
    /// Rebuild at the end of every mutating call
    Eager,
}
