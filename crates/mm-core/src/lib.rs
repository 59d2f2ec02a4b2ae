#![forbid(unsafe_code)]

//! Graph model shared by the parser, the layout engine and the renderers.
//!
//! A [`Graph`] owns its nodes (keyed by a globally unique anchor id) and an
//! ordered, de-duplicated sequence of edges. Parent links are logical foreign
//! keys resolved by lookup, never direct references.

mod config;
mod links;

pub use config::{
    EdgeStyle, LayoutAlgorithm, LayoutSettings, MindmapConfig, NodeStyle, StrokeStyle, TagStyle,
    Vocabulary,
};
pub use links::{AnchorLink, find_anchor_links, is_anchor_id, strip_anchor_links};

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[serde(rename_all = "snake_case")]
pub enum NodeType {
    #[default]
    Concept,
    Example,
    Code,
    Table,
}

impl NodeType {
    pub const ALL: [Self; 4] = [Self::Concept, Self::Example, Self::Code, Self::Table];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concept => "concept",
            Self::Example => "example",
            Self::Code => "code",
            Self::Table => "table",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "concept" => Some(Self::Concept),
            "example" => Some(Self::Example),
            "code" => Some(Self::Code),
            "table" => Some(Self::Table),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EdgeType {
    /// Inferred from heading depth.
    ParentChild,
    Prereqs,
    /// Declared in an edges fence or found as an inline anchor link.
    Related,
    Contrasts,
}

impl EdgeType {
    pub const ALL: [Self; 4] = [
        Self::ParentChild,
        Self::Prereqs,
        Self::Related,
        Self::Contrasts,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ParentChild => "parent_child",
            Self::Prereqs => "prereqs",
            Self::Related => "related",
            Self::Contrasts => "contrasts",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "parent_child" => Some(Self::ParentChild),
            "prereqs" => Some(Self::Prereqs),
            "related" => Some(Self::Related),
            "contrasts" => Some(Self::Contrasts),
            _ => None,
        }
    }

    /// Edge types an author may declare inside an edges fence.
    #[must_use]
    pub fn parse_declared(value: &str) -> Option<Self> {
        match Self::parse(value)? {
            Self::ParentChild => None,
            declared @ (Self::Prereqs | Self::Related | Self::Contrasts) => Some(declared),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Error, PartialEq, Eq)]
pub enum GraphError {
    #[error("Duplicate node ID: {id}")]
    DuplicateId { id: String },
}

/// A concept unit, one per anchored heading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Node {
    id: String,
    pub title: String,
    pub level: usize,
    pub node_type: NodeType,
    pub tags: Vec<String>,
    pub content: String,
    pub parent_id: Option<String>,
    pub x: f64,
    pub y: f64,
    /// `None` until a dimension estimate or a saved size is applied.
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl Node {
    #[must_use]
    pub fn new(id: impl Into<String>, title: impl Into<String>, level: usize) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            level,
            node_type: NodeType::default(),
            tags: Vec::new(),
            content: String::new(),
            parent_id: None,
            x: 0.0,
            y: 0.0,
            width: None,
            height: None,
        }
    }

    #[must_use]
    pub fn with_parent(mut self, parent_id: impl Into<String>) -> Self {
        self.parent_id = Some(parent_id.into());
        self
    }

    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[must_use]
    pub fn effective_width(&self, default: f64) -> f64 {
        self.width.filter(|width| *width > 0.0).unwrap_or(default)
    }

    #[must_use]
    pub fn effective_height(&self, default: f64) -> f64 {
        self.height.filter(|height| *height > 0.0).unwrap_or(default)
    }

    /// Replace the tag list, dropping empties and repeats but keeping first-seen order.
    pub fn set_tags<I, S>(&mut self, tags: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags.clear();
        for tag in tags {
            let tag = tag.into();
            if !tag.is_empty() && !self.tags.contains(&tag) {
                self.tags.push(tag);
            }
        }
    }
}

/// A directed relationship. Identity is `(source, target, edge_type)`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Edge {
    pub source: String,
    pub target: String,
    pub edge_type: EdgeType,
    /// True only for edges discovered in body text.
    pub inline_link: bool,
}

impl Edge {
    #[must_use]
    pub fn new(source: impl Into<String>, target: impl Into<String>, edge_type: EdgeType) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            edge_type,
            inline_link: false,
        }
    }

    #[must_use]
    pub fn inline(source: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            inline_link: true,
            ..Self::new(source, target, EdgeType::Related)
        }
    }

    #[must_use]
    pub fn same_identity(&self, other: &Self) -> bool {
        self.source == other.source
            && self.target == other.target
            && self.edge_type == other.edge_type
    }

    /// Stable element id used by serializers.
    #[must_use]
    pub fn element_id(&self) -> String {
        format!(
            "edge-{}-{}-{}",
            self.source,
            self.target,
            self.edge_type.as_str()
        )
    }
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct Graph {
    source: String,
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    #[serde(skip)]
    index: FxHashMap<String, usize>,
}

impl Graph {
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            ..Self::default()
        }
    }

    /// Provenance of the graph, usually the markdown path.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn add_node(&mut self, node: Node) -> Result<(), GraphError> {
        if self.index.contains_key(node.id()) {
            return Err(GraphError::DuplicateId {
                id: node.id().to_string(),
            });
        }
        self.index.insert(node.id().to_string(), self.nodes.len());
        self.nodes.push(node);
        Ok(())
    }

    /// Append `edge` unless an edge with the same identity exists.
    /// Returns whether it was inserted.
    pub fn add_edge(&mut self, edge: Edge) -> bool {
        if self.edges.iter().any(|existing| existing.same_identity(&edge)) {
            return false;
        }
        self.edges.push(edge);
        true
    }

    #[must_use]
    pub fn get_node(&self, id: &str) -> Option<&Node> {
        self.index.get(id).map(|&slot| &self.nodes[slot])
    }

    #[must_use]
    pub fn node_mut(&mut self, id: &str) -> Option<&mut Node> {
        let slot = *self.index.get(id)?;
        self.nodes.get_mut(slot)
    }

    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    /// Nodes whose parent is `id`, in insertion order.
    #[must_use]
    pub fn get_children(&self, id: &str) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.parent_id.as_deref() == Some(id))
            .collect()
    }

    #[must_use]
    pub fn get_root_nodes(&self) -> Vec<&Node> {
        self.nodes
            .iter()
            .filter(|node| node.parent_id.is_none())
            .collect()
    }

    /// Nodes in insertion order.
    #[must_use]
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    /// Mutable access for coordinate and size updates. Ids cannot change
    /// through this view.
    pub fn nodes_mut(&mut self) -> &mut [Node] {
        &mut self.nodes
    }

    #[must_use]
    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// One warning per edge endpoint that names no node. Never mutates.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut warnings = Vec::new();
        for edge in &self.edges {
            if !self.contains(&edge.source) {
                warnings.push(format!("Edge source not found: {}", edge.source));
            }
            if !self.contains(&edge.target) {
                warnings.push(format!("Edge target not found: {}", edge.target));
            }
        }
        warnings
    }

    /// Drop every edge with an unresolved endpoint. Returns how many were removed.
    pub fn prune_dangling_edges(&mut self) -> usize {
        let before = self.edges.len();
        let index = &self.index;
        self.edges
            .retain(|edge| index.contains_key(&edge.source) && index.contains_key(&edge.target));
        before - self.edges.len()
    }
}

#[cfg(test)]
mod tests {
    use super::{Edge, EdgeType, Graph, GraphError, Node, NodeType};

    fn sample_graph() -> Graph {
        let mut graph = Graph::new("notes.md");
        graph.add_node(Node::new("c-root", "Root", 2)).unwrap();
        graph
            .add_node(Node::new("c-b", "B", 3).with_parent("c-root"))
            .unwrap();
        graph
            .add_node(Node::new("c-a", "A", 3).with_parent("c-root"))
            .unwrap();
        graph.add_node(Node::new("c-other", "Other", 2)).unwrap();
        graph
    }

    #[test]
    fn duplicate_node_id_is_rejected() {
        let mut graph = sample_graph();
        let error = graph.add_node(Node::new("c-a", "Again", 2)).unwrap_err();
        assert_eq!(
            error,
            GraphError::DuplicateId {
                id: "c-a".to_string()
            }
        );
        assert_eq!(graph.node_count(), 4);
        assert_eq!(error.to_string(), "Duplicate node ID: c-a");
    }

    #[test]
    fn add_edge_ignores_inline_flag_for_identity() {
        let mut graph = sample_graph();
        assert!(graph.add_edge(Edge::inline("c-a", "c-b")));
        assert!(!graph.add_edge(Edge::new("c-a", "c-b", EdgeType::Related)));
        assert!(graph.add_edge(Edge::new("c-a", "c-b", EdgeType::Prereqs)));
        assert_eq!(graph.edge_count(), 2);
        assert!(graph.edges()[0].inline_link, "first insertion wins");
    }

    #[test]
    fn children_keep_insertion_order() {
        let graph = sample_graph();
        let children: Vec<&str> = graph.get_children("c-root").iter().map(|n| n.id()).collect();
        assert_eq!(children, vec!["c-b", "c-a"]);
        assert!(graph.get_children("c-a").is_empty());
        assert!(graph.get_children("c-missing").is_empty());
    }

    #[test]
    fn root_nodes_have_no_parent() {
        let graph = sample_graph();
        let roots: Vec<&str> = graph.get_root_nodes().iter().map(|n| n.id()).collect();
        assert_eq!(roots, vec!["c-root", "c-other"]);
    }

    #[test]
    fn get_node_returns_none_for_unknown_id() {
        let graph = sample_graph();
        assert_eq!(graph.get_node("c-a").map(Node::id), Some("c-a"));
        assert!(graph.get_node("c-nope").is_none());
    }

    #[test]
    fn validate_reports_each_missing_endpoint_without_mutating() {
        let mut graph = sample_graph();
        graph.add_edge(Edge::new("c-ghost", "c-phantom", EdgeType::Contrasts));
        graph.add_edge(Edge::new("c-a", "c-missing", EdgeType::Related));

        let warnings = graph.validate();
        assert_eq!(
            warnings,
            vec![
                "Edge source not found: c-ghost".to_string(),
                "Edge target not found: c-phantom".to_string(),
                "Edge target not found: c-missing".to_string(),
            ]
        );
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn prune_dangling_edges_keeps_resolved_edges_in_order() {
        let mut graph = sample_graph();
        graph.add_edge(Edge::new("c-root", "c-b", EdgeType::ParentChild));
        graph.add_edge(Edge::new("c-a", "c-missing", EdgeType::Related));
        graph.add_edge(Edge::new("c-root", "c-a", EdgeType::ParentChild));

        assert_eq!(graph.prune_dangling_edges(), 1);
        let targets: Vec<&str> = graph.edges().iter().map(|e| e.target.as_str()).collect();
        assert_eq!(targets, vec!["c-b", "c-a"]);
        assert!(graph.validate().is_empty());
    }

    #[test]
    fn effective_dimensions_fall_back_when_unsized() {
        let mut node = Node::new("c-a", "A", 2);
        assert_eq!(node.effective_width(250.0), 250.0);
        assert_eq!(node.effective_height(80.0), 80.0);
        node.width = Some(0.0);
        node.height = Some(120.0);
        assert_eq!(node.effective_width(250.0), 250.0);
        assert_eq!(node.effective_height(80.0), 120.0);
    }

    #[test]
    fn set_tags_drops_empties_and_repeats() {
        let mut node = Node::new("c-a", "A", 2);
        node.set_tags(["sql", "", "joins", "sql"]);
        assert_eq!(node.tags, vec!["sql".to_string(), "joins".to_string()]);
    }

    #[test]
    fn type_names_round_trip_through_parse() {
        for node_type in NodeType::ALL {
            assert_eq!(NodeType::parse(node_type.as_str()), Some(node_type));
        }
        for edge_type in EdgeType::ALL {
            assert_eq!(EdgeType::parse(edge_type.as_str()), Some(edge_type));
        }
        assert_eq!(NodeType::parse("diagram"), None);
        assert_eq!(EdgeType::parse_declared("parent_child"), None);
        assert_eq!(EdgeType::parse_declared("contrasts"), Some(EdgeType::Contrasts));
    }

    #[test]
    fn edge_element_id_encodes_identity() {
        let edge = Edge::new("c-a", "c-b", EdgeType::Prereqs);
        assert_eq!(edge.element_id(), "edge-c-a-c-b-prereqs");
    }

    #[test]
    fn graph_serializes_nodes_in_insertion_order() {
        let graph = sample_graph();
        let value = serde_json::to_value(&graph).unwrap();
        let ids: Vec<&str> = value["nodes"]
            .as_array()
            .unwrap()
            .iter()
            .map(|node| node["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["c-root", "c-b", "c-a", "c-other"]);
        assert_eq!(value["source"], "notes.md");
        assert!(value.get("index").is_none());
    }
}
