//! Styling, layout and vocabulary configuration.
//!
//! Loading and merging YAML files is the binary's job; this module only
//! describes the resolved shape and the lookups the pipeline needs.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::{EdgeType, NodeType};

/// Predicates the parser uses to validate meta fields.
pub trait Vocabulary {
    fn is_known_tag(&self, tag: &str) -> bool;

    fn is_known_type(&self, name: &str) -> bool {
        NodeType::parse(name).is_some()
    }
}

impl Vocabulary for BTreeSet<String> {
    fn is_known_tag(&self, tag: &str) -> bool {
        self.contains(tag)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct NodeStyle {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: u32,
    /// Excalidraw font family: 1 Virgil, 2 Helvetica, 3 Cascadia.
    pub font_family: u32,
    pub font_size: u32,
    pub border_radius: u32,
    pub padding: u32,
}

impl Default for NodeStyle {
    fn default() -> Self {
        Self {
            fill: String::from("#e3f2fd"),
            stroke: String::from("#1976d2"),
            stroke_width: 2,
            font_family: 1,
            font_size: 20,
            border_radius: 8,
            padding: 16,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct EdgeStyle {
    pub stroke: String,
    pub stroke_width: u32,
    pub stroke_style: StrokeStyle,
    pub start_arrowhead: Option<String>,
    pub end_arrowhead: Option<String>,
}

impl Default for EdgeStyle {
    fn default() -> Self {
        Self {
            stroke: String::from("#666666"),
            stroke_width: 2,
            stroke_style: StrokeStyle::Solid,
            start_arrowhead: None,
            end_arrowhead: Some(String::from("arrow")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct TagStyle {
    pub color: String,
}

impl Default for TagStyle {
    fn default() -> Self {
        Self {
            color: String::from("#2196f3"),
        }
    }
}

/// Deserialized through [`LayoutAlgorithm::parse`]; unrecognized names mean
/// no automatic layout.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase", from = "String")]
pub enum LayoutAlgorithm {
    #[default]
    Tree,
    Force,
    None,
}

impl LayoutAlgorithm {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tree => "tree",
            Self::Force => "force",
            Self::None => "none",
        }
    }

    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "tree" => Some(Self::Tree),
            "force" => Some(Self::Force),
            "none" => Some(Self::None),
            _ => None,
        }
    }
}

impl From<String> for LayoutAlgorithm {
    fn from(value: String) -> Self {
        Self::parse(&value).unwrap_or(Self::None)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LayoutSettings {
    pub node_width: f64,
    pub node_min_height: f64,
    pub horizontal_gap: f64,
    pub vertical_gap: f64,
    pub auto_layout: LayoutAlgorithm,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        Self {
            node_width: 250.0,
            node_min_height: 80.0,
            horizontal_gap: 120.0,
            vertical_gap: 100.0,
            auto_layout: LayoutAlgorithm::Tree,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct MindmapConfig {
    pub node_types: BTreeMap<NodeType, NodeStyle>,
    pub edge_types: BTreeMap<EdgeType, EdgeStyle>,
    /// Doubles as the tag vocabulary.
    pub tags: BTreeMap<String, TagStyle>,
    pub layout: LayoutSettings,
}

impl MindmapConfig {
    /// Give every node and edge type a style entry.
    pub fn fill_missing_styles(&mut self) {
        for node_type in NodeType::ALL {
            self.node_types.entry(node_type).or_default();
        }
        for edge_type in EdgeType::ALL {
            self.edge_types.entry(edge_type).or_default();
        }
    }

    /// Style for `node_type`, falling back to the concept style.
    #[must_use]
    pub fn node_style(&self, node_type: NodeType) -> NodeStyle {
        self.node_types
            .get(&node_type)
            .or_else(|| self.node_types.get(&NodeType::Concept))
            .cloned()
            .unwrap_or_default()
    }

    /// Style for `edge_type`, falling back to the parent/child style.
    #[must_use]
    pub fn edge_style(&self, edge_type: EdgeType) -> EdgeStyle {
        self.edge_types
            .get(&edge_type)
            .or_else(|| self.edge_types.get(&EdgeType::ParentChild))
            .cloned()
            .unwrap_or_default()
    }

    #[must_use]
    pub fn tag_color(&self, tag: &str) -> Option<&str> {
        self.tags.get(tag).map(|style| style.color.as_str())
    }
}

impl Vocabulary for MindmapConfig {
    fn is_known_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use super::{
        EdgeStyle, LayoutAlgorithm, MindmapConfig, NodeStyle, StrokeStyle, TagStyle, Vocabulary,
    };
    use crate::{EdgeType, NodeType};

    #[test]
    fn node_style_falls_back_to_concept() {
        let mut config = MindmapConfig::default();
        config.node_types.insert(
            NodeType::Concept,
            NodeStyle {
                fill: "#ffffff".to_string(),
                ..NodeStyle::default()
            },
        );
        assert_eq!(config.node_style(NodeType::Code).fill, "#ffffff");
        assert_eq!(
            MindmapConfig::default().node_style(NodeType::Table),
            NodeStyle::default()
        );
    }

    #[test]
    fn edge_style_falls_back_to_parent_child() {
        let mut config = MindmapConfig::default();
        config.edge_types.insert(
            EdgeType::ParentChild,
            EdgeStyle {
                stroke_style: StrokeStyle::Dotted,
                ..EdgeStyle::default()
            },
        );
        assert_eq!(
            config.edge_style(EdgeType::Contrasts).stroke_style,
            StrokeStyle::Dotted
        );
    }

    #[test]
    fn fill_missing_styles_covers_every_type() {
        let mut config = MindmapConfig::default();
        config.fill_missing_styles();
        assert_eq!(config.node_types.len(), NodeType::ALL.len());
        assert_eq!(config.edge_types.len(), EdgeType::ALL.len());
    }

    #[test]
    fn tags_act_as_vocabulary() {
        let mut config = MindmapConfig::default();
        config.tags.insert(
            "sql".to_string(),
            TagStyle {
                color: "#ff0000".to_string(),
            },
        );
        assert!(config.is_known_tag("sql"));
        assert!(!config.is_known_tag("nosql"));
        assert_eq!(config.tag_color("sql"), Some("#ff0000"));
        assert!(config.is_known_type("example"));
        assert!(!config.is_known_type("Example"));

        let plain: BTreeSet<String> = ["db".to_string()].into_iter().collect();
        assert!(plain.is_known_tag("db"));
    }

    #[test]
    fn layout_algorithm_parse_is_case_insensitive() {
        assert_eq!(LayoutAlgorithm::parse(" Force "), Some(LayoutAlgorithm::Force));
        assert_eq!(LayoutAlgorithm::parse("NONE"), Some(LayoutAlgorithm::None));
        assert_eq!(LayoutAlgorithm::parse("radial"), None);
    }

    #[test]
    fn partial_yaml_fills_defaults() {
        let yaml = "layout:\n  auto_layout: force\n  vertical_gap: 40\nnode_types:\n  code:\n    fill: black\n";
        let config: MindmapConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.layout.auto_layout, LayoutAlgorithm::Force);
        assert_eq!(config.layout.vertical_gap, 40.0);
        assert_eq!(config.layout.node_width, 250.0);
        let code = &config.node_types[&NodeType::Code];
        assert_eq!(code.fill, "black");
        assert_eq!(code.font_size, 20);
    }

    #[test]
    fn layout_names_deserialize_case_insensitively() {
        let config: MindmapConfig = serde_yaml::from_str("layout:\n  auto_layout: Force\n").unwrap();
        assert_eq!(config.layout.auto_layout, LayoutAlgorithm::Force);

        let config: MindmapConfig = serde_yaml::from_str("layout:\n  auto_layout: radial\n").unwrap();
        assert_eq!(config.layout.auto_layout, LayoutAlgorithm::None);

        let json = serde_json::to_string(&LayoutAlgorithm::Tree).unwrap();
        assert_eq!(json, "\"tree\"");
    }
}
