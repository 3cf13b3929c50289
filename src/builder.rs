//! Topology construction from configuration.
//!
//! A GML file that cannot be read or converted does not abort the build: the
//! simulation still runs, with the network disabled.

use std::path::Path;

use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use log::{info, warn};

use crate::config::Config;
use crate::gml_parser::parse_gml_file;
use crate::topology::{DelayMatrixCalculator, NetworkTopology, TopologicalGraph};

/// Read a GML file into a topology graph.
pub fn load_graph(path: &Path) -> Result<TopologicalGraph> {
    parse_gml_file(path)?.to_topological_graph()
}

/// Build the service described by `config`.
///
/// `base_dir` anchors a relative GML path, normally the directory holding
/// the configuration file.
pub fn build_topology(config: &Config, base_dir: &Path) -> Result<NetworkTopology> {
    let network = &config.network;
    if !network.enabled {
        info!("Network modeling disabled by configuration");
        return Ok(NetworkTopology::disabled());
    }

    let graph = match &network.gml {
        Some(path) => {
            let path = base_dir.join(path);
            match load_graph(&path) {
                Ok(graph) => graph,
                Err(e) => {
                    warn!("Network topology unavailable, running without network delays: {:?}", e);
                    return Ok(NetworkTopology::disabled());
                }
            }
        }
        None => TopologicalGraph::new(),
    };

    let calculator = config
        .general
        .parallel_threshold
        .map(DelayMatrixCalculator::new)
        .unwrap_or_default();
    let mut topology = NetworkTopology::from_graph(graph).with_calculator(calculator);

    for mapping in &network.entities {
        topology.map_node(mapping.entity, mapping.node);
    }
    for link in &network.links {
        topology
            .add_link(link.source, link.target, link.bandwidth, link.latency_millis())
            .wrap_err_with(|| format!("Invalid link {} -> {} in configuration", link.source, link.target))?;
    }

    let topology = topology.with_policy(config.general.recompute);
    let graph = topology.topological_graph();
    info!(
        "Network topology ready: {} nodes, {} links, {} mapped entities",
        graph.node_count(),
        graph.link_count(),
        topology.mapping_count()
    );

    Ok(topology)
}
