use clap::{Parser, Subcommand};
use color_eyre::eyre::WrapErr;
use color_eyre::Result;
use env_logger::Env;
use log::{info, LevelFilter};
use serde::Serialize;
use std::path::{Path, PathBuf};

use netdelay::builder::build_topology;
use netdelay::config_loader::load_config;
use netdelay::topology::{EntityId, NetworkTopology};

/// Query network delays between simulation entities
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the topology configuration YAML file
    #[arg(short, long)]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the delay between two entities
    Delay {
        /// Source entity id
        source: u32,
        /// Destination entity id
        destination: u32,
    },
    /// Print the delay matrix over all topology nodes
    Matrix {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
    /// Print node, link and mapping counts
    Summary,
}

#[derive(Serialize)]
struct MatrixReport {
    nodes: Vec<u32>,
    /// Delay in milliseconds, null where unreachable
    delays_ms: Vec<Vec<Option<f64>>>,
}

fn main() -> Result<()> {
    // Initialize error handling
    color_eyre::install()?;

    let args = Args::parse();

    let level_from_env = init_logging();

    let config = load_config(&args.config)?;

    // RUST_LOG wins over the configured level
    if !level_from_env {
        if let Some(level) = config.general.level_filter() {
            log::set_max_level(level);
        }
    }

    info!("Configuration file: {:?}", args.config);

    let base_dir = args.config.parent().unwrap_or_else(|| Path::new("."));
    let mut topology = build_topology(&config, base_dir)
        .wrap_err_with(|| format!("Failed to build topology from '{}'", args.config.display()))?;

    match args.command {
        Command::Delay { source, destination } => {
            let delay = topology.get_delay(EntityId(source), EntityId(destination));
            println!("{}", delay);
        }
        Command::Matrix { json } => print_matrix(&mut topology, json)?,
        Command::Summary => print_summary(&topology),
    }

    Ok(())
}

fn print_matrix(topology: &mut NetworkTopology, json: bool) -> Result<()> {
    let Some(matrix) = topology.delay_matrix() else {
        println!("network disabled");
        return Ok(());
    };

    let report = MatrixReport {
        nodes: matrix.nodes().iter().map(|node| node.0).collect(),
        delays_ms: matrix
            .nodes()
            .iter()
            .filter_map(|node| matrix.row(*node))
            .collect(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    let header: Vec<String> = report.nodes.iter().map(|id| format!("{:>10}", id)).collect();
    println!("{:>10}{}", "", header.join(""));
    for (id, row) in report.nodes.iter().zip(&report.delays_ms) {
        let cells: Vec<String> = row
            .iter()
            .map(|cell| match cell {
                Some(ms) => format!("{:>10.3}", ms),
                None => format!("{:>10}", "-"),
            })
            .collect();
        println!("{:>10}{}", id, cells.join(""));
    }
    Ok(())
}

/// Install the logger at `info`, or at whatever `RUST_LOG` asks for.
///
/// Without `RUST_LOG` the logger itself accepts every level and the global
/// max level does the gating, so the configured level can still raise or
/// lower it once the config is loaded. Returns whether `RUST_LOG` was set.
fn init_logging() -> bool {
    let level_from_env = std::env::var_os("RUST_LOG").is_some();
    env_logger::Builder::from_env(Env::default().default_filter_or("trace")).init();
    if !level_from_env {
        log::set_max_level(LevelFilter::Info);
    }
    level_from_env
}

fn print_summary(topology: &NetworkTopology) {
    let graph = topology.topological_graph();
    println!("enabled:   {}", topology.is_network_enabled());
    println!("nodes:     {}", graph.node_count());
    println!("links:     {}", graph.link_count());
    println!("mappings:  {}", topology.mapping_count());
    if let Some(policy) = topology.policy() {
        println!("recompute: {:?}", policy);
    }
}
