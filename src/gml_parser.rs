//! GML topology reader.
//!
//! Reads graphs in the GML format emitted by topology generators:
//!
//! ```text
//! graph [
//!     node [ id 0 ]
//!     node [ id 1 label "edge-router" ]
//!     edge [ source 0 target 1 latency "5ms" bandwidth "1 Gbit" ]
//! ]
//! ```
//!
//! Nested lists that carry no topology data (`graphics [ ... ]` and the
//! like) are skipped. The parsed [`GmlGraph`] converts into a
//! [`TopologicalGraph`] with latencies in milliseconds and bandwidths in
//! Mbit/s.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::iter::Peekable;
use std::path::Path;
use std::str::Chars;

use color_eyre::eyre::{eyre, Result, WrapErr};

use crate::topology::{NodeId, TopologicalGraph};
use crate::utils::units::{parse_bandwidth_mbit, parse_latency_millis, DEFAULT_BANDWIDTH_MBIT};

/// A node declared in a GML graph
#[derive(Debug, Clone, PartialEq)]
pub struct GmlNode {
    pub id: u32,
    pub label: Option<String>,
    pub attributes: HashMap<String, String>,
}

/// An edge declared in a GML graph
#[derive(Debug, Clone, PartialEq)]
pub struct GmlEdge {
    pub source: u32,
    pub target: u32,
    pub attributes: HashMap<String, String>,
}

impl GmlEdge {
    /// Edge latency in milliseconds, 0 when the edge does not declare one.
    pub fn latency_millis(&self) -> Result<f64> {
        match self.attributes.get("latency") {
            Some(value) => parse_latency_millis(value)
                .wrap_err_with(|| format!("Edge {} -> {} has a malformed latency", self.source, self.target)),
            None => Ok(0.0),
        }
    }

    /// Edge bandwidth in Mbit/s, [`DEFAULT_BANDWIDTH_MBIT`] when undeclared.
    pub fn bandwidth_mbit(&self) -> Result<f64> {
        match self.attributes.get("bandwidth") {
            Some(value) => parse_bandwidth_mbit(value)
                .wrap_err_with(|| format!("Edge {} -> {} has a malformed bandwidth", self.source, self.target)),
            None => Ok(DEFAULT_BANDWIDTH_MBIT),
        }
    }
}

/// A complete GML graph
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GmlGraph {
    pub nodes: Vec<GmlNode>,
    pub edges: Vec<GmlEdge>,
    pub attributes: HashMap<String, String>,
}

impl GmlGraph {
    /// Build the topology graph described by this file.
    ///
    /// Every declared node is added, linked or not. Fails if the graph does
    /// not pass [`validate_topology`] or an edge weight is malformed or
    /// out of range.
    pub fn to_topological_graph(&self) -> Result<TopologicalGraph> {
        validate_topology(self).map_err(|e| eyre!(e))?;

        let mut graph = TopologicalGraph::new();
        for node in &self.nodes {
            graph.add_node(NodeId(node.id));
        }
        for edge in &self.edges {
            graph
                .add_link(NodeId(edge.source), NodeId(edge.target), edge.bandwidth_mbit()?, edge.latency_millis()?)
                .wrap_err_with(|| format!("Edge {} -> {} rejected", edge.source, edge.target))?;
        }

        log::info!(
            "Built topology with {} nodes and {} links from GML",
            graph.node_count(),
            graph.link_count()
        );
        Ok(graph)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Token {
    Key(String),
    Number(String),
    Text(String),
    Open,
    Close,
    Eof,
}

struct Lexer<'a> {
    chars: Peekable<Chars<'a>>,
    line: usize,
}

impl<'a> Lexer<'a> {
    fn new(input: &'a str) -> Self {
        Self {
            chars: input.chars().peekable(),
            line: 1,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.chars.next();
        if ch == Some('\n') {
            self.line += 1;
        }
        ch
    }

    /// Skip whitespace and `#` comments up to the next significant character.
    fn skip_trivia(&mut self) {
        while let Some(&ch) = self.chars.peek() {
            if ch.is_whitespace() {
                self.bump();
            } else if ch == '#' {
                while self.chars.peek().is_some_and(|&c| c != '\n') {
                    self.bump();
                }
            } else {
                break;
            }
        }
    }

    fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
        let mut word = String::new();
        while let Some(&ch) = self.chars.peek() {
            if !keep(ch) {
                break;
            }
            word.push(ch);
            self.bump();
        }
        word
    }

    fn text(&mut self) -> Result<String> {
        let start = self.line;
        self.bump();
        let mut text = String::new();
        loop {
            match self.bump() {
                Some('"') => return Ok(text),
                Some('\\') => match self.bump() {
                    Some('n') => text.push('\n'),
                    Some('t') => text.push('\t'),
                    Some(escaped) => text.push(escaped),
                    None => break,
                },
                Some(ch) => text.push(ch),
                None => break,
            }
        }
        Err(eyre!("Unterminated string starting on line {}", start))
    }

    fn next_token(&mut self) -> Result<Token> {
        self.skip_trivia();
        let Some(&ch) = self.chars.peek() else {
            return Ok(Token::Eof);
        };

        match ch {
            '[' => {
                self.bump();
                Ok(Token::Open)
            }
            ']' => {
                self.bump();
                Ok(Token::Close)
            }
            '"' => self.text().map(Token::Text),
            c if c.is_alphabetic() || c == '_' => Ok(Token::Key(self.take_while(|c| c.is_alphanumeric() || c == '_'))),
            c if c.is_ascii_digit() || c == '-' || c == '+' || c == '.' => Ok(Token::Number(
                self.take_while(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '+')),
            )),
            other => Err(eyre!("Unexpected character '{}' on line {}", other, self.line)),
        }
    }
}

struct Parser<'a> {
    lexer: Lexer<'a>,
    current: Token,
}

/// Value of a key inside a GML list.
enum Value {
    Scalar(String),
    List,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Result<Self> {
        let mut lexer = Lexer::new(input);
        let current = lexer.next_token()?;
        Ok(Self { lexer, current })
    }

    fn advance(&mut self) -> Result<Token> {
        let next = self.lexer.next_token()?;
        Ok(std::mem::replace(&mut self.current, next))
    }

    fn expect(&mut self, expected: Token) -> Result<()> {
        if self.current != expected {
            return Err(eyre!(
                "Expected {:?}, found {:?} on line {}",
                expected,
                self.current,
                self.lexer.line
            ));
        }
        self.advance()?;
        Ok(())
    }

    /// Read the key of the next entry in a list, or `None` at its closing bracket.
    fn key(&mut self) -> Result<Option<String>> {
        match self.advance()? {
            Token::Key(key) => Ok(Some(key)),
            Token::Close => Ok(None),
            other => Err(eyre!("Expected a key, found {:?} on line {}", other, self.lexer.line)),
        }
    }

    fn value(&mut self) -> Result<Value> {
        match self.advance()? {
            Token::Number(v) | Token::Text(v) | Token::Key(v) => Ok(Value::Scalar(v)),
            Token::Open => {
                self.skip_list()?;
                Ok(Value::List)
            }
            other => Err(eyre!("Expected a value, found {:?} on line {}", other, self.lexer.line)),
        }
    }

    /// Consume a nested list whose opening bracket was already read.
    fn skip_list(&mut self) -> Result<()> {
        let mut depth = 1;
        while depth > 0 {
            match self.advance()? {
                Token::Open => depth += 1,
                Token::Close => depth -= 1,
                Token::Eof => return Err(eyre!("Unclosed list at end of input")),
                _ => {}
            }
        }
        Ok(())
    }

    /// Read the `key value` pairs of a list whose opening bracket was already read.
    fn entries(&mut self) -> Result<HashMap<String, String>> {
        let mut entries = HashMap::new();
        while let Some(key) = self.key()? {
            if let Value::Scalar(value) = self.value()? {
                entries.insert(key, value);
            }
        }
        Ok(entries)
    }

    fn node(&mut self) -> Result<GmlNode> {
        self.expect(Token::Open)?;
        let mut attributes = self.entries()?;

        let id = attributes
            .remove("id")
            .ok_or_else(|| eyre!("Node missing required 'id' attribute"))?;
        let id = id.parse::<u32>().map_err(|_| eyre!("Invalid node id: {}", id))?;
        let label = attributes.remove("label");

        Ok(GmlNode { id, label, attributes })
    }

    fn edge(&mut self) -> Result<GmlEdge> {
        self.expect(Token::Open)?;
        let mut attributes = self.entries()?;

        let mut endpoint = |name: &str| -> Result<u32> {
            let value = attributes
                .remove(name)
                .ok_or_else(|| eyre!("Edge missing required '{}' attribute", name))?;
            value.parse::<u32>().map_err(|_| eyre!("Invalid edge {}: {}", name, value))
        };
        let source = endpoint("source")?;
        let target = endpoint("target")?;

        Ok(GmlEdge {
            source,
            target,
            attributes,
        })
    }

    fn graph(&mut self) -> Result<GmlGraph> {
        self.expect(Token::Key("graph".to_string()))?;
        self.expect(Token::Open)?;

        let mut graph = GmlGraph::default();
        while let Some(key) = self.key()? {
            match key.as_str() {
                "node" => graph.nodes.push(self.node()?),
                "edge" => graph.edges.push(self.edge()?),
                _ => {
                    if let Value::Scalar(value) = self.value()? {
                        graph.attributes.insert(key, value);
                    }
                }
            }
        }

        Ok(graph)
    }
}

/// Parse GML text into a [`GmlGraph`]
pub fn parse_gml(content: &str) -> Result<GmlGraph> {
    let mut parser = Parser::new(content)?;
    let graph = parser.graph()?;
    if parser.current != Token::Eof {
        return Err(eyre!(
            "Unexpected {:?} after the graph block on line {}",
            parser.current,
            parser.lexer.line
        ));
    }
    Ok(graph)
}

/// Parse a GML file into a [`GmlGraph`]
pub fn parse_gml_file(path: &Path) -> Result<GmlGraph> {
    let content = fs::read_to_string(path)
        .wrap_err_with(|| format!("Failed to read GML file '{}'", path.display()))?;

    parse_gml(&content).wrap_err_with(|| format!("Failed to parse GML file '{}'", path.display()))
}

/// Validate the structure of a parsed graph
///
/// Checks for duplicate node ids and edges referencing undeclared nodes.
/// Disconnected graphs are valid; their unreachable pairs surface at query
/// time.
pub fn validate_topology(graph: &GmlGraph) -> Result<(), String> {
    let mut node_ids = HashSet::new();
    for node in &graph.nodes {
        if !node_ids.insert(node.id) {
            return Err(format!("Duplicate node ID: {}", node.id));
        }
    }

    for edge in &graph.edges {
        if !node_ids.contains(&edge.source) {
            return Err(format!("Edge references non-existent source node: {}", edge.source));
        }
        if !node_ids.contains(&edge.target) {
            return Err(format!("Edge references non-existent target node: {}", edge.target));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn node(id: u32) -> GmlNode {
        GmlNode {
            id,
            label: None,
            attributes: HashMap::new(),
        }
    }

    fn edge(source: u32, target: u32) -> GmlEdge {
        GmlEdge {
            source,
            target,
            attributes: HashMap::new(),
        }
    }

    #[test]
    fn test_parse_simple_gml() {
        let graph = parse_gml(
            r#"
            graph [
                node [ id 0 ]
                node [ id 1 label "Node1" ]
                edge [ source 0 target 1 ]
            ]
        "#,
        )
        .unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert_eq!(graph.edges.len(), 1);
        assert_eq!(graph.nodes[1].label, Some("Node1".to_string()));
        assert_eq!(graph.edges[0].source, 0);
        assert_eq!(graph.edges[0].target, 1);
    }

    #[test]
    fn test_parse_gml_with_attributes() {
        let graph = parse_gml(
            r#"
            # generated topology
            graph [
                directed 0
                node [ id 0 AS "65001" ]
                node [ id 1 AS "65002" ]
                edge [ source 0 target 1 latency "5ms" bandwidth "1 Gbit" packet_loss 0.0 ]
            ]
        "#,
        )
        .unwrap();

        assert_eq!(graph.attributes.get("directed"), Some(&"0".to_string()));
        assert_eq!(graph.nodes[0].attributes.get("AS"), Some(&"65001".to_string()));
        assert_eq!(graph.edges[0].attributes.get("latency"), Some(&"5ms".to_string()));
        assert_eq!(graph.edges[0].latency_millis().unwrap(), 5.0);
        assert_eq!(graph.edges[0].bandwidth_mbit().unwrap(), 1000.0);
    }

    #[test]
    fn test_nested_lists_are_skipped() {
        let graph = parse_gml(
            r##"
            graph [
                node [ id 0 graphics [ x 1.5 y -2 fill "#ff0000" ] ]
                node [ id 1 ]
                edge [ source 0 target 1 graphics [ width 2 ] latency 3 ]
            ]
        "##,
        )
        .unwrap();

        assert_eq!(graph.nodes.len(), 2);
        assert!(graph.nodes[0].attributes.is_empty());
        assert_eq!(graph.edges[0].latency_millis().unwrap(), 3.0);
    }

    #[test]
    fn test_escaped_strings() {
        let graph = parse_gml(r#"graph [ node [ id 0 label "a \"quoted\" name" ] ]"#).unwrap();
        assert_eq!(graph.nodes[0].label.as_deref(), Some(r#"a "quoted" name"#));
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_gml("graph [ node [ label \"x\" ] ]").is_err());
        assert!(parse_gml("graph [ edge [ source 0 ] ]").is_err());
        assert!(parse_gml("graph [ node [ id -1 ] ]").is_err());
        assert!(parse_gml("graph [ node [ id 0 ]").is_err());
        assert!(parse_gml("graph [ node [ id 0 label \"open ] ]").is_err());
        assert!(parse_gml("network [ ]").is_err());
        assert!(parse_gml("graph [ node [ id 0 ] ] @").is_err());
        assert!(parse_gml("graph [ node [ id 0 } ]").is_err());
    }

    #[test]
    fn test_trailing_content_rejected() {
        let err = parse_gml("graph [ ] graph [ node [ id 0 ] ]").unwrap_err();
        assert!(err.to_string().contains("after the graph block"));
        assert!(parse_gml("graph [ node [ id 0 ] ] 42").is_err());

        // Comments and whitespace after the block are fine
        let graph = parse_gml("graph [ node [ id 0 ] ]\n# end of file\n\n").unwrap();
        assert_eq!(graph.nodes.len(), 1);
    }

    #[test]
    fn test_edge_weight_defaults() {
        let edge = edge(0, 1);
        assert_eq!(edge.latency_millis().unwrap(), 0.0);
        assert_eq!(edge.bandwidth_mbit().unwrap(), DEFAULT_BANDWIDTH_MBIT);
    }

    #[test]
    fn test_malformed_edge_weights() {
        let mut bad = edge(0, 1);
        bad.attributes.insert("latency".to_string(), "soon".to_string());
        assert!(bad.latency_millis().is_err());

        let mut bad = edge(0, 1);
        bad.attributes.insert("bandwidth".to_string(), "wide".to_string());
        assert!(bad.bandwidth_mbit().is_err());
    }

    #[test]
    fn test_validate_topology() {
        let graph = GmlGraph {
            nodes: vec![node(0), node(1)],
            edges: vec![edge(0, 1)],
            attributes: HashMap::new(),
        };
        assert!(validate_topology(&graph).is_ok());

        let duplicate = GmlGraph {
            nodes: vec![node(0), node(0)],
            ..Default::default()
        };
        assert_eq!(validate_topology(&duplicate).unwrap_err(), "Duplicate node ID: 0");

        let dangling = GmlGraph {
            nodes: vec![node(0)],
            edges: vec![edge(0, 999)],
            attributes: HashMap::new(),
        };
        assert!(validate_topology(&dangling).is_err());

        // Isolated nodes are fine
        let isolated = GmlGraph {
            nodes: vec![node(0), node(1)],
            ..Default::default()
        };
        assert!(validate_topology(&isolated).is_ok());
    }

    #[test]
    fn test_to_topological_graph() {
        let graph = parse_gml(
            r#"
            graph [
                node [ id 0 ]
                node [ id 1 ]
                node [ id 2 ]
                node [ id 3 ]
                edge [ source 0 target 1 latency "2ms" bandwidth "10 Mbit" ]
                edge [ source 1 target 2 latency 3 bandwidth 10 ]
                edge [ source 1 target 2 latency 4 ]
            ]
        "#,
        )
        .unwrap()
        .to_topological_graph()
        .unwrap();

        assert_eq!(graph.node_count(), 4);
        assert_eq!(graph.link_count(), 3);
        assert!(graph.contains_node(NodeId(3)));
        assert_eq!(graph.links()[0].latency, 2.0);
        assert_eq!(graph.links()[0].bandwidth, 10.0);
        assert_eq!(graph.links()[2].bandwidth, DEFAULT_BANDWIDTH_MBIT);
    }

    #[test]
    fn test_to_topological_graph_rejects_bad_weights() {
        let graph = parse_gml("graph [ node [ id 0 ] node [ id 1 ] edge [ source 0 target 1 latency -4 ] ]").unwrap();
        assert!(graph.to_topological_graph().is_err());

        let graph = parse_gml("graph [ node [ id 0 ] edge [ source 0 target 1 ] ]").unwrap();
        assert!(graph.to_topological_graph().is_err());
    }

    #[test]
    fn test_parse_gml_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        write!(temp_file, "graph [ node [ id 0 ] node [ id 1 ] edge [ source 0 target 1 latency \"1ms\" ] ]").unwrap();

        let graph = parse_gml_file(temp_file.path()).unwrap();
        assert_eq!(graph.nodes.len(), 2);

        let missing = parse_gml_file(Path::new("/nonexistent/topology.gml"));
        assert!(missing.is_err());
    }
}
