//! Network topology module.
//!
//! This module contains the topology engine: the weighted link graph, the
//! entity-to-node mapping, the all-pairs delay computation and the service
//! that ties them together behind entity-addressed queries.

pub mod types;
pub mod graph;
pub mod mapper;
pub mod delay;
pub mod service;
pub mod shared;

// Re-export key types for easier access
pub use types::{Delay, EntityId, NodeId, RecomputePolicy};
pub use graph::{Link, TopologicalGraph};
pub use mapper::EntityNodeMapper;
pub use delay::{BandwidthMatrix, DelayMatrix, DelayMatrixCalculator};
pub use service::NetworkTopology;
pub use shared::SharedNetworkTopology;
