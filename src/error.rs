//! Error types for the topology engine.

use crate::topology::NodeId;

/// Errors raised by graph and service operations.
///
/// Two classes exist: invalid parameters (a caller passed a value the
/// model cannot represent) and structural errors (an operation named a node
/// the graph does not contain).
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TopologyError {
    #[error("Invalid link bandwidth {value}: must be positive and finite")]
    InvalidBandwidth { value: f64 },

    #[error("Invalid link latency {value}: must be non-negative and finite")]
    InvalidLatency { value: f64 },

    #[error("Node {0} is not part of the topology")]
    UnknownNode(NodeId),
}

impl TopologyError {
    /// True for errors caused by a malformed argument rather than by the
    /// current shape of the graph.
    pub fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidBandwidth { .. } | Self::InvalidLatency { .. })
    }
}
