#[cfg(test)]
mod gml_loading {
    use std::fs;
    use std::path::Path;

    use tempfile::TempDir;

    use netdelay::builder::build_topology;
    use netdelay::config_loader::load_config;
    use netdelay::gml_parser::{parse_gml_file, validate_topology};
    use netdelay::topology::{Delay, EntityId, NodeId, RecomputePolicy};

    const BACKBONE_GML: &str = r#"
# Four routers in a ring with one slow chord
graph [
    directed 0
    node [ id 0 label "ams" ]
    node [ id 1 label "fra" ]
    node [ id 2 label "par" ]
    node [ id 3 label "lon" ]
    node [ id 4 label "isolated" ]
    edge [ source 0 target 1 latency "6ms" bandwidth "10 Gbit" ]
    edge [ source 1 target 2 latency "8ms" bandwidth "10 Gbit" ]
    edge [ source 2 target 3 latency "5ms" bandwidth "1 Gbit" ]
    edge [ source 3 target 0 latency "4ms" bandwidth "1 Gbit" ]
    edge [ source 0 target 2 latency "20ms" bandwidth "100 Mbit" ]
]
"#;

    fn write_fixture(dir: &Path, config: &str) -> std::path::PathBuf {
        fs::write(dir.join("backbone.gml"), BACKBONE_GML).unwrap();
        let config_path = dir.join("netdelay.yaml");
        fs::write(&config_path, config).unwrap();
        config_path
    }

    #[test]
    fn test_backbone_file_structure() {
        let dir = TempDir::new().unwrap();
        write_fixture(dir.path(), "{}");

        let gml = parse_gml_file(&dir.path().join("backbone.gml")).unwrap();
        assert!(validate_topology(&gml).is_ok());
        assert_eq!(gml.nodes.len(), 5);
        assert_eq!(gml.edges.len(), 5);
        assert_eq!(gml.nodes[3].label.as_deref(), Some("lon"));
    }

    #[test]
    fn test_end_to_end_delays() {
        let dir = TempDir::new().unwrap();
        let config_path = write_fixture(
            dir.path(),
            r#"
general:
  recompute: lazy
network:
  gml: backbone.gml
  entities:
    - { entity: 10, node: 0 }
    - { entity: 11, node: 0 }
    - { entity: 20, node: 2 }
    - { entity: 40, node: 4 }
"#,
        );

        let config = load_config(&config_path).unwrap();
        let mut topology = build_topology(&config, dir.path()).unwrap();
        assert!(topology.is_network_enabled());
        assert_eq!(topology.policy(), Some(RecomputePolicy::Lazy));

        // ams -> lon -> par beats both the chord and the fra route
        assert_eq!(topology.get_delay(EntityId(10), EntityId(20)), Delay::Reachable(9.0));
        assert_eq!(topology.get_delay(EntityId(20), EntityId(10)), Delay::Reachable(9.0));
        // Entities sharing a node see no delay between them
        assert_eq!(topology.get_delay(EntityId(10), EntityId(11)), Delay::Reachable(0.0));
        // Declared but unlinked node
        assert_eq!(topology.get_delay(EntityId(10), EntityId(40)), Delay::Unreachable);
        assert_eq!(topology.recompute_count(), 1);

        // Direct chord bandwidth, in Mbit/s
        assert_eq!(topology.get_bandwidth(EntityId(10), EntityId(20)), 100.0);
    }

    #[test]
    fn test_config_links_extend_file_topology() {
        let dir = TempDir::new().unwrap();
        let config_path = write_fixture(
            dir.path(),
            r#"
network:
  gml: backbone.gml
  entities:
    - { entity: 10, node: 0 }
    - { entity: 40, node: 4 }
  links:
    - { source: 40, target: 10, bandwidth: 50, latency: 2ms }
"#,
        );

        let config = load_config(&config_path).unwrap();
        let mut topology = build_topology(&config, dir.path()).unwrap();

        assert_eq!(topology.topological_graph().link_count(), 6);
        assert_eq!(topology.get_delay(EntityId(40), EntityId(10)), Delay::Reachable(2.0));

        // An entity introduced by a link lands on the node with its own id
        topology.add_link(EntityId(40), EntityId(7), 10.0, 1.0).unwrap();
        assert_eq!(topology.node_id_for(EntityId(7)), Some(NodeId(7)));
        assert_eq!(topology.get_delay(EntityId(10), EntityId(7)), Delay::Reachable(3.0));
    }

    #[test]
    fn test_broken_gml_runs_without_network() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("broken.gml"), "graph [ node [ id 0 ]").unwrap();
        let config_path = dir.path().join("netdelay.yaml");
        fs::write(&config_path, "network:\n  gml: broken.gml\n").unwrap();

        let config = load_config(&config_path).unwrap();
        let mut topology = build_topology(&config, dir.path()).unwrap();

        assert!(!topology.is_network_enabled());
        assert_eq!(topology.get_delay(EntityId(1), EntityId(2)), Delay::Reachable(0.0));
        assert_eq!(topology.topological_graph().node_count(), 0);
    }
}
