//! All-pairs delay computation.
//!
//! [`DelayMatrixCalculator`] runs Floyd–Warshall over the latency-weighted
//! adjacency of a [`TopologicalGraph`]. Unreachable pairs hold
//! `f64::INFINITY` internally and surface as `None`.

use std::time::Instant;

use rayon::prelude::*;

use super::graph::TopologicalGraph;
use super::types::NodeId;

/// Node count from which relaxation rows are processed in parallel.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 256;

/// Square table over the graph's nodes, stored row-major.
#[derive(Debug, Clone, PartialEq)]
struct NodeTable {
    nodes: Vec<NodeId>,
    cells: Vec<f64>,
}

impl NodeTable {
    fn filled(graph: &TopologicalGraph, value: f64) -> Self {
        let nodes: Vec<NodeId> = graph.nodes().collect();
        let n = nodes.len();
        Self {
            nodes,
            cells: vec![value; n * n],
        }
    }

    fn size(&self) -> usize {
        self.nodes.len()
    }

    /// Row/column position of `node`. Nodes are kept sorted.
    fn index_of(&self, node: NodeId) -> Option<usize> {
        self.nodes.binary_search(&node).ok()
    }

    fn cell(&self, i: usize, j: usize) -> f64 {
        self.cells[i * self.size() + j]
    }

    fn cell_mut(&mut self, i: usize, j: usize) -> &mut f64 {
        let n = self.size();
        &mut self.cells[i * n + j]
    }

    fn lookup(&self, source: NodeId, destination: NodeId) -> Option<f64> {
        let i = self.index_of(source)?;
        let j = self.index_of(destination)?;
        Some(self.cell(i, j))
    }
}

/// Minimum cumulative latency between every pair of nodes, in milliseconds.
#[derive(Debug, Clone, PartialEq)]
pub struct DelayMatrix {
    table: NodeTable,
    graph_version: u64,
}

impl DelayMatrix {
    /// Delay from `source` to `destination`. `None` when no path exists or
    /// either node is outside the matrix.
    pub fn get(&self, source: NodeId, destination: NodeId) -> Option<f64> {
        self.table
            .lookup(source, destination)
            .filter(|delay| delay.is_finite())
    }

    /// Nodes indexing the rows and columns, ascending.
    pub fn nodes(&self) -> &[NodeId] {
        &self.table.nodes
    }

    pub fn size(&self) -> usize {
        self.table.size()
    }

    pub fn is_empty(&self) -> bool {
        self.table.nodes.is_empty()
    }

    /// Row of delays from `source` to every node, in [`Self::nodes`] order.
    pub fn row(&self, source: NodeId) -> Option<Vec<Option<f64>>> {
        let i = self.table.index_of(source)?;
        let n = self.size();
        Some(
            self.table.cells[i * n..(i + 1) * n]
                .iter()
                .map(|delay| delay.is_finite().then_some(*delay))
                .collect(),
        )
    }

    /// Graph version this matrix was computed from.
    pub fn graph_version(&self) -> u64 {
        self.graph_version
    }
}

/// Direct-link capacity between every pair of nodes, in Mbit/s.
///
/// A cell holds the largest bandwidth among the links directly joining the
/// pair, or 0 when the nodes are not adjacent.
#[derive(Debug, Clone, PartialEq)]
pub struct BandwidthMatrix {
    table: NodeTable,
}

impl BandwidthMatrix {
    pub fn from_graph(graph: &TopologicalGraph) -> Self {
        let mut table = NodeTable::filled(graph, 0.0);
        for link in graph.links() {
            if link.source == link.destination {
                continue;
            }
            let (Some(i), Some(j)) = (table.index_of(link.source), table.index_of(link.destination)) else {
                continue;
            };
            for (a, b) in [(i, j), (j, i)] {
                let cell = table.cell_mut(a, b);
                *cell = cell.max(link.bandwidth);
            }
        }
        Self { table }
    }

    pub fn get(&self, source: NodeId, destination: NodeId) -> f64 {
        self.table.lookup(source, destination).unwrap_or(0.0)
    }
}

/// Builds [`DelayMatrix`] values and counts how many it has built.
#[derive(Debug, Clone)]
pub struct DelayMatrixCalculator {
    parallel_threshold: usize,
    computations: u64,
}

impl Default for DelayMatrixCalculator {
    fn default() -> Self {
        Self::new(DEFAULT_PARALLEL_THRESHOLD)
    }
}

impl DelayMatrixCalculator {
    pub fn new(parallel_threshold: usize) -> Self {
        Self {
            parallel_threshold,
            computations: 0,
        }
    }

    /// Number of matrices computed so far.
    pub fn computations(&self) -> u64 {
        self.computations
    }

    pub fn compute(&mut self, graph: &TopologicalGraph) -> DelayMatrix {
        let started = Instant::now();
        let mut table = NodeTable::filled(graph, f64::INFINITY);
        let n = table.size();

        for i in 0..n {
            *table.cell_mut(i, i) = 0.0;
        }
        for link in graph.links() {
            let (Some(i), Some(j)) = (table.index_of(link.source), table.index_of(link.destination)) else {
                continue;
            };
            for (a, b) in [(i, j), (j, i)] {
                let cell = table.cell_mut(a, b);
                *cell = cell.min(link.latency);
            }
        }

        let parallel = n >= self.parallel_threshold;
        for k in 0..n {
            // Row k is invariant while relaxing through k since delay[k][k] is 0.
            let through = table.cells[k * n..(k + 1) * n].to_vec();
            let relax = |row: &mut [f64]| {
                let to_k = row[k];
                if to_k.is_infinite() {
                    return;
                }
                for (cell, from_k) in row.iter_mut().zip(&through) {
                    let candidate = to_k + from_k;
                    if candidate < *cell {
                        *cell = candidate;
                    }
                }
            };

            if parallel {
                table.cells.par_chunks_mut(n).for_each(relax);
            } else {
                table.cells.chunks_mut(n).for_each(relax);
            }
        }

        self.computations += 1;
        log::debug!(
            "Computed delay matrix for {} nodes and {} links in {:?} (parallel: {})",
            n,
            graph.link_count(),
            started.elapsed(),
            parallel
        );

        DelayMatrix {
            table,
            graph_version: graph.version(),
        }
    }
}
