//! Undirected weighted topology graph.
//!
//! The graph is plain data: a node set and a list of links. Parallel links
//! between the same pair of nodes are kept as independent edges. Every
//! structural mutation bumps [`TopologicalGraph::version`], which consumers
//! compare against to detect stale derived data.

use std::collections::btree_map::Entry;
use std::collections::{BTreeMap, BTreeSet};

use super::types::NodeId;
use crate::error::TopologyError;

/// A bandwidth-and-latency-bearing edge between two nodes.
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub source: NodeId,
    pub destination: NodeId,
    /// Capacity in Mbit/s
    pub bandwidth: f64,
    /// One-way latency in milliseconds
    pub latency: f64,
}

impl Link {
    /// True when this link joins `a` and `b`, in either direction.
    pub fn connects(&self, a: NodeId, b: NodeId) -> bool {
        (self.source == a && self.destination == b) || (self.source == b && self.destination == a)
    }

    /// The endpoint opposite `node`, or `None` if `node` is not an endpoint.
    pub fn other_end(&self, node: NodeId) -> Option<NodeId> {
        if self.source == node {
            Some(self.destination)
        } else if self.destination == node {
            Some(self.source)
        } else {
            None
        }
    }
}

/// Check link weights before they enter a graph.
pub fn validate_link_weights(bandwidth: f64, latency: f64) -> Result<(), TopologyError> {
    if !bandwidth.is_finite() || bandwidth <= 0.0 {
        return Err(TopologyError::InvalidBandwidth { value: bandwidth });
    }
    if !latency.is_finite() || latency < 0.0 {
        return Err(TopologyError::InvalidLatency { value: latency });
    }
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct TopologicalGraph {
    nodes: BTreeSet<NodeId>,
    links: Vec<Link>,
    version: u64,
}

impl TopologicalGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node if absent. Returns true when the node was new.
    pub fn add_node(&mut self, node: NodeId) -> bool {
        let inserted = self.nodes.insert(node);
        if inserted {
            self.version += 1;
        }
        inserted
    }

    /// Append a link, creating either endpoint on first sight.
    pub fn add_link(
        &mut self,
        source: NodeId,
        destination: NodeId,
        bandwidth: f64,
        latency: f64,
    ) -> Result<(), TopologyError> {
        validate_link_weights(bandwidth, latency)?;

        self.nodes.insert(source);
        self.nodes.insert(destination);
        self.links.push(Link {
            source,
            destination,
            bandwidth,
            latency,
        });
        self.version += 1;
        Ok(())
    }

    /// Remove every link joining `a` and `b`, returning how many were removed.
    ///
    /// Both nodes stay in the graph even if they become isolated.
    pub fn remove_link(&mut self, a: NodeId, b: NodeId) -> Result<usize, TopologyError> {
        for node in [a, b] {
            if !self.nodes.contains(&node) {
                return Err(TopologyError::UnknownNode(node));
            }
        }

        let before = self.links.len();
        self.links.retain(|link| !link.connects(a, b));
        let removed = before - self.links.len();
        if removed > 0 {
            self.version += 1;
        }
        Ok(removed)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    pub fn contains_node(&self, node: NodeId) -> bool {
        self.nodes.contains(&node)
    }

    /// Nodes in ascending id order.
    pub fn nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.iter().copied()
    }

    /// Links in insertion order, parallel links included.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// For each node adjacent to `node`, the lowest-latency link reaching it,
    /// ordered by neighbour id.
    pub fn neighbors(&self, node: NodeId) -> Result<Vec<(NodeId, &Link)>, TopologyError> {
        if !self.nodes.contains(&node) {
            return Err(TopologyError::UnknownNode(node));
        }

        let mut best: BTreeMap<NodeId, &Link> = BTreeMap::new();
        for link in &self.links {
            let Some(other) = link.other_end(node) else {
                continue;
            };
            match best.entry(other) {
                Entry::Vacant(slot) => {
                    slot.insert(link);
                }
                Entry::Occupied(mut slot) => {
                    if link.latency < slot.get().latency {
                        slot.insert(link);
                    }
                }
            }
        }

        Ok(best.into_iter().collect())
    }

    /// Mutation counter; changes whenever the node set or link list changes.
    pub fn version(&self) -> u64 {
        self.version
    }
}
