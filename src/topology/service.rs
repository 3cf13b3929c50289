//! Network topology service.
//!
//! [`NetworkTopology`] is what the simulation kernel talks to. It owns the
//! graph, the entity mapping and the cached matrices, and decides when the
//! delay matrix has to be recomputed. A topology whose construction failed is
//! represented by the disabled state, in which every query answers with zero
//! delay and every mutation is ignored.

use super::delay::{BandwidthMatrix, DelayMatrix, DelayMatrixCalculator};
use super::graph::{validate_link_weights, TopologicalGraph};
use super::mapper::EntityNodeMapper;
use super::types::{Delay, EntityId, NodeId, RecomputePolicy};
use crate::error::TopologyError;

/// Matrices derived from one graph version.
#[derive(Debug, Clone)]
struct CachedMatrices {
    delay: DelayMatrix,
    bandwidth: BandwidthMatrix,
}

impl CachedMatrices {
    fn compute(graph: &TopologicalGraph, calculator: &mut DelayMatrixCalculator) -> Self {
        Self {
            delay: calculator.compute(graph),
            bandwidth: BandwidthMatrix::from_graph(graph),
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveNetwork {
    graph: TopologicalGraph,
    mapper: EntityNodeMapper,
    calculator: DelayMatrixCalculator,
    cache: Option<CachedMatrices>,
    policy: RecomputePolicy,
}

impl ActiveNetwork {
    fn is_stale(&self) -> bool {
        self.cache
            .as_ref()
            .map_or(true, |cache| cache.delay.graph_version() != self.graph.version())
    }

    /// Fresh matrices, recomputing them first if the graph moved on.
    fn matrices(&mut self) -> &CachedMatrices {
        if self.is_stale() {
            self.cache = None;
        }
        let graph = &self.graph;
        let calculator = &mut self.calculator;
        self.cache
            .get_or_insert_with(|| CachedMatrices::compute(graph, calculator))
    }

    fn after_mutation(&mut self) {
        if self.policy == RecomputePolicy::Eager {
            self.matrices();
        }
    }

    /// Node for `entity`, falling back to the default allocation.
    fn node_or_default(&self, entity: EntityId) -> NodeId {
        self.mapper.node_id_for(entity).unwrap_or_else(|| entity.into())
    }
}

#[derive(Debug, Clone)]
enum NetworkState {
    Enabled(Box<ActiveNetwork>),
    /// Holds an empty graph so the read-only view stays available.
    Disabled(TopologicalGraph),
}

/// Delay model over a topology graph, addressed by simulation entity ids.
#[derive(Debug, Clone)]
pub struct NetworkTopology {
    state: NetworkState,
}

impl Default for NetworkTopology {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkTopology {
    /// An enabled topology with an empty graph.
    pub fn new() -> Self {
        Self::from_graph(TopologicalGraph::new())
    }

    /// An enabled topology over an already populated graph.
    pub fn from_graph(graph: TopologicalGraph) -> Self {
        Self {
            state: NetworkState::Enabled(Box::new(ActiveNetwork {
                graph,
                mapper: EntityNodeMapper::new(),
                calculator: DelayMatrixCalculator::default(),
                cache: None,
                policy: RecomputePolicy::default(),
            })),
        }
    }

    /// A topology that models no network at all.
    pub fn disabled() -> Self {
        Self {
            state: NetworkState::Disabled(TopologicalGraph::new()),
        }
    }

    pub fn with_policy(mut self, policy: RecomputePolicy) -> Self {
        if let NetworkState::Enabled(network) = &mut self.state {
            network.policy = policy;
            network.after_mutation();
        }
        self
    }

    pub fn with_calculator(mut self, calculator: DelayMatrixCalculator) -> Self {
        if let NetworkState::Enabled(network) = &mut self.state {
            network.calculator = calculator;
            network.cache = None;
            network.after_mutation();
        }
        self
    }

    pub fn is_network_enabled(&self) -> bool {
        matches!(self.state, NetworkState::Enabled(_))
    }

    pub fn policy(&self) -> Option<RecomputePolicy> {
        match &self.state {
            NetworkState::Enabled(network) => Some(network.policy),
            NetworkState::Disabled(_) => None,
        }
    }

    /// Add a link between two entities.
    ///
    /// An entity without a mapping is mapped to the node carrying its own id
    /// before the link is added. A link rejected for its weights leaves the
    /// mapping table untouched.
    pub fn add_link(
        &mut self,
        source: EntityId,
        destination: EntityId,
        bandwidth: f64,
        latency: f64,
    ) -> Result<(), TopologyError> {
        let NetworkState::Enabled(network) = &mut self.state else {
            log::trace!("Network disabled, ignoring link {} -> {}", source, destination);
            return Ok(());
        };

        validate_link_weights(bandwidth, latency)?;

        let source_node = network.node_or_default(source);
        let destination_node = network.node_or_default(destination);
        network.graph.add_link(source_node, destination_node, bandwidth, latency)?;

        for (entity, node) in [(source, source_node), (destination, destination_node)] {
            if network.mapper.node_id_for(entity).is_none() {
                log::debug!("Allocated node {} for unmapped entity {}", node, entity);
                network.mapper.map(entity, node);
            }
        }

        network.after_mutation();
        Ok(())
    }

    /// Declare a node ahead of any link touching it.
    pub fn add_node(&mut self, node: NodeId) {
        if let NetworkState::Enabled(network) = &mut self.state {
            if network.graph.add_node(node) {
                network.after_mutation();
            }
        }
    }

    /// Remove every link between the nodes behind two entities.
    ///
    /// An unmapped entity owns no node, so nothing is removed.
    pub fn remove_link(&mut self, source: EntityId, destination: EntityId) -> Result<usize, TopologyError> {
        let NetworkState::Enabled(network) = &mut self.state else {
            return Ok(0);
        };

        let (Some(source_node), Some(destination_node)) =
            (network.mapper.node_id_for(source), network.mapper.node_id_for(destination))
        else {
            log::trace!("Unmapped entity in link removal {} -> {}", source, destination);
            return Ok(0);
        };
        let removed = network.graph.remove_link(source_node, destination_node)?;
        if removed > 0 {
            network.after_mutation();
        }
        Ok(removed)
    }

    /// Map an entity onto a topology node, replacing any previous mapping.
    pub fn map_node(&mut self, entity: EntityId, node: NodeId) {
        match &mut self.state {
            NetworkState::Enabled(network) => {
                if let Some(previous) = network.mapper.map(entity, node) {
                    log::debug!("Entity {} remapped from node {} to node {}", entity, previous, node);
                }
            }
            NetworkState::Disabled(_) => {
                log::trace!("Network disabled, ignoring mapping {} -> {}", entity, node);
            }
        }
    }

    pub fn unmap_node(&mut self, entity: EntityId) -> Option<NodeId> {
        match &mut self.state {
            NetworkState::Enabled(network) => network.mapper.unmap(entity),
            NetworkState::Disabled(_) => None,
        }
    }

    pub fn node_id_for(&self, entity: EntityId) -> Option<NodeId> {
        match &self.state {
            NetworkState::Enabled(network) => network.mapper.node_id_for(entity),
            NetworkState::Disabled(_) => None,
        }
    }

    pub fn mapping_count(&self) -> usize {
        match &self.state {
            NetworkState::Enabled(network) => network.mapper.len(),
            NetworkState::Disabled(_) => 0,
        }
    }

    /// Communication delay between two entities.
    ///
    /// A disabled network always answers zero. Otherwise an unmapped entity or
    /// a pair with no connecting path answers [`Delay::Unreachable`].
    pub fn get_delay(&mut self, source: EntityId, destination: EntityId) -> Delay {
        let NetworkState::Enabled(network) = &mut self.state else {
            return Delay::Reachable(0.0);
        };

        let (Some(source_node), Some(destination_node)) =
            (network.mapper.node_id_for(source), network.mapper.node_id_for(destination))
        else {
            return Delay::Unreachable;
        };

        network
            .matrices()
            .delay
            .get(source_node, destination_node)
            .into()
    }

    /// Bandwidth of the best direct link between two entities' nodes, in
    /// Mbit/s. Zero when disabled, unmapped or not directly linked.
    pub fn get_bandwidth(&mut self, source: EntityId, destination: EntityId) -> f64 {
        let NetworkState::Enabled(network) = &mut self.state else {
            return 0.0;
        };

        match (network.mapper.node_id_for(source), network.mapper.node_id_for(destination)) {
            (Some(source_node), Some(destination_node)) => {
                network.matrices().bandwidth.get(source_node, destination_node)
            }
            _ => 0.0,
        }
    }

    /// The current delay matrix, recomputed first if stale. `None` when disabled.
    pub fn delay_matrix(&mut self) -> Option<&DelayMatrix> {
        match &mut self.state {
            NetworkState::Enabled(network) => Some(&network.matrices().delay),
            NetworkState::Disabled(_) => None,
        }
    }

    /// Recompute the matrices now if the graph changed since the last build.
    /// Returns whether a recompute happened.
    pub fn rebuild(&mut self) -> bool {
        match &mut self.state {
            NetworkState::Enabled(network) => {
                let stale = network.is_stale();
                network.matrices();
                stale
            }
            NetworkState::Disabled(_) => false,
        }
    }

    pub fn is_stale(&self) -> bool {
        match &self.state {
            NetworkState::Enabled(network) => network.is_stale(),
            NetworkState::Disabled(_) => false,
        }
    }

    /// How many times the delay matrix has been computed.
    pub fn recompute_count(&self) -> u64 {
        match &self.state {
            NetworkState::Enabled(network) => network.calculator.computations(),
            NetworkState::Disabled(_) => 0,
        }
    }

    /// Read-only view of the underlying graph. Empty when disabled.
    pub fn topological_graph(&self) -> &TopologicalGraph {
        match &self.state {
            NetworkState::Enabled(network) => &network.graph,
            NetworkState::Disabled(graph) => graph,
        }
    }
}
