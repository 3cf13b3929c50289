//! # netdelay - Network delay model for discrete-event simulations
//!
//! This library derives realistic point-to-point communication delay between
//! simulated entities from a weighted network topology.
//!
//! ## Overview
//!
//! A simulation kernel names its hosts, datacenters and brokers by entity id.
//! netdelay maps those entities onto the nodes of a topology graph whose
//! links carry latency and bandwidth, and answers delay queries with the
//! minimum cumulative latency between the two nodes. The all-pairs delay
//! matrix is computed once per topology change and cached between queries.
//!
//! ## Architecture
//!
//! - `topology`: graph, entity mapping, delay matrix computation and the
//!   `NetworkTopology` service
//! - `gml_parser`: GML topology file reader
//! - `config` / `config_loader`: YAML configuration and its loading
//! - `builder`: builds a `NetworkTopology` from configuration
//! - `utils`: latency and bandwidth unit parsing
//! - `error`: topology error types
//!
//! ## Example Usage
//!
//! ```rust
//! use netdelay::topology::{Delay, EntityId, NetworkTopology, NodeId};
//!
//! let mut topology = NetworkTopology::new();
//! topology.map_node(EntityId(100), NodeId(0));
//! topology.map_node(EntityId(200), NodeId(2));
//! topology.map_node(EntityId(150), NodeId(1));
//! topology.add_link(EntityId(100), EntityId(150), 10.0, 2.0)?;
//! topology.add_link(EntityId(150), EntityId(200), 10.0, 3.0)?;
//!
//! assert_eq!(topology.get_delay(EntityId(100), EntityId(200)), Delay::Reachable(5.0));
//! assert_eq!(topology.get_delay(EntityId(100), EntityId(999)), Delay::Unreachable);
//! # Ok::<(), netdelay::error::TopologyError>(())
//! ```

pub mod builder;
pub mod config;
pub mod config_loader;
pub mod error;
pub mod gml_parser;
pub mod topology;
pub mod utils;

pub use error::TopologyError;
pub use topology::{Delay, EntityId, NetworkTopology, NodeId, SharedNetworkTopology};
