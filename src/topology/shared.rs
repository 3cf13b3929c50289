//! Thread-safe handle over a [`NetworkTopology`].
//!
//! Every call holds one exclusive lock for its whole read-modify-write
//! sequence, so a query that finds the cache stale rebuilds it while other
//! callers wait and then read the fresh matrix.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::graph::TopologicalGraph;
use super::service::NetworkTopology;
use super::types::{Delay, EntityId, NodeId};
use crate::error::TopologyError;

#[derive(Debug, Clone)]
pub struct SharedNetworkTopology {
    inner: Arc<Mutex<NetworkTopology>>,
}

impl From<NetworkTopology> for SharedNetworkTopology {
    fn from(topology: NetworkTopology) -> Self {
        Self {
            inner: Arc::new(Mutex::new(topology)),
        }
    }
}

impl SharedNetworkTopology {
    pub fn new(topology: NetworkTopology) -> Self {
        topology.into()
    }

    // Service calls leave no partial state on panic, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, NetworkTopology> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn add_link(
        &self,
        source: EntityId,
        destination: EntityId,
        bandwidth: f64,
        latency: f64,
    ) -> Result<(), TopologyError> {
        self.lock().add_link(source, destination, bandwidth, latency)
    }

    pub fn remove_link(&self, source: EntityId, destination: EntityId) -> Result<usize, TopologyError> {
        self.lock().remove_link(source, destination)
    }

    pub fn map_node(&self, entity: EntityId, node: NodeId) {
        self.lock().map_node(entity, node)
    }

    pub fn unmap_node(&self, entity: EntityId) -> Option<NodeId> {
        self.lock().unmap_node(entity)
    }

    pub fn get_delay(&self, source: EntityId, destination: EntityId) -> Delay {
        self.lock().get_delay(source, destination)
    }

    pub fn get_bandwidth(&self, source: EntityId, destination: EntityId) -> f64 {
        self.lock().get_bandwidth(source, destination)
    }

    pub fn rebuild(&self) -> bool {
        self.lock().rebuild()
    }

    pub fn is_network_enabled(&self) -> bool {
        self.lock().is_network_enabled()
    }

    pub fn recompute_count(&self) -> u64 {
        self.lock().recompute_count()
    }

    /// Run `f` against the graph while holding the lock.
    pub fn with_graph<R>(&self, f: impl FnOnce(&TopologicalGraph) -> R) -> R {
        f(self.lock().topological_graph())
    }

    /// Copy of the graph as it is now.
    pub fn graph_snapshot(&self) -> TopologicalGraph {
        self.with_graph(TopologicalGraph::clone)
    }
}
