use mm_core::{Edge, EdgeType, Graph, GraphError, Node, NodeType, Vocabulary};
use tracing::trace;

use crate::{ParseError, ParseResult, ParseWarning, grammar};

/// Accumulates a [`Graph`] while the line state machine walks the input.
///
/// Tracks the ancestry stack used to infer parents from heading depth and the
/// pending body text of the currently open node.
pub(crate) struct GraphBuilder<'v> {
    graph: Graph,
    vocabulary: &'v dyn Vocabulary,
    warnings: Vec<ParseWarning>,
    ancestry: Vec<(usize, String)>,
    current: Option<String>,
    body: Vec<String>,
}

impl<'v> GraphBuilder<'v> {
    pub(crate) fn new(source: &str, vocabulary: &'v dyn Vocabulary) -> Self {
        Self {
            graph: Graph::new(source),
            vocabulary,
            warnings: Vec::new(),
            ancestry: Vec::new(),
            current: None,
            body: Vec::new(),
        }
    }

    pub(crate) fn add_warning(&mut self, message: impl Into<String>, line: Option<usize>) {
        self.warnings.push(ParseWarning {
            message: message.into(),
            line,
        });
    }

    pub(crate) fn has_open_node(&self) -> bool {
        self.current.is_some()
    }

    /// Start a new node from a heading, closing the previous one.
    pub(crate) fn open_node(
        &mut self,
        level: usize,
        title: &str,
        id: &str,
        line: usize,
    ) -> Result<(), ParseError> {
        self.flush_body();

        while let Some((ancestor_level, _)) = self.ancestry.last() {
            if *ancestor_level >= level {
                let _ = self.ancestry.pop();
            } else {
                break;
            }
        }
        let parent_id = self.ancestry.last().map(|(_, id)| id.clone());

        let mut node = Node::new(id, title, level);
        node.parent_id.clone_from(&parent_id);
        self.graph.add_node(node).map_err(|error| match error {
            GraphError::DuplicateId { id } => ParseError::DuplicateNodeId { id, line },
        })?;
        trace!(id, level, parent = ?parent_id, line, "opened node");

        self.ancestry.push((level, id.to_string()));
        if let Some(parent_id) = parent_id {
            self.graph
                .add_edge(Edge::new(parent_id, id, EdgeType::ParentChild));
        }
        self.current = Some(id.to_string());
        Ok(())
    }

    /// Apply one `key: value` meta field to the open node.
    pub(crate) fn apply_meta(&mut self, key: &str, value: &str, line: usize) {
        let Some(current) = self.current.clone() else {
            return;
        };

        match key {
            "type" => {
                let node_type = NodeType::parse(value)
                    .filter(|_| self.vocabulary.is_known_type(value));
                match node_type {
                    Some(node_type) => {
                        if let Some(node) = self.graph.node_mut(&current) {
                            node.node_type = node_type;
                        }
                    }
                    None => self.add_warning(
                        format!("Unknown type '{value}', using 'concept'"),
                        Some(line),
                    ),
                }
            }
            "tags" => {
                let tags: Vec<&str> = value
                    .split(',')
                    .map(str::trim)
                    .filter(|tag| !tag.is_empty())
                    .collect();
                for tag in &tags {
                    if !self.vocabulary.is_known_tag(tag) {
                        self.add_warning(format!("Undefined tag '{tag}'"), Some(line));
                    }
                }
                if let Some(node) = self.graph.node_mut(&current) {
                    node.set_tags(tags);
                }
            }
            _ => {}
        }
    }

    /// Turn the buffered lines of a closed edges fence into edges from the open node.
    pub(crate) fn add_fence_edges(&mut self, lines: &[(usize, String)]) {
        let Some(source) = self.current.clone() else {
            return;
        };

        for (line_number, raw) in lines {
            let trimmed = raw.trim();
            // Wrapped YAML-style list items are not supported; only single-line lists.
            if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with("- ") {
                continue;
            }
            let Some((type_name, targets)) = grammar::parse_fence_line(trimmed) else {
                continue;
            };
            let Some(edge_type) = EdgeType::parse_declared(type_name) else {
                self.add_warning(
                    format!("Unknown edge type '{type_name}'"),
                    Some(*line_number),
                );
                continue;
            };

            for target in targets.split(',') {
                let target = target.trim().trim_start_matches(['-', ' ']);
                if !target.is_empty() {
                    self.graph
                        .add_edge(Edge::new(source.as_str(), target, edge_type));
                }
            }
        }
    }

    /// Record an ordinary body line: inline links become related edges.
    pub(crate) fn push_body_line(&mut self, line: &str) {
        let Some(source) = self.current.as_deref() else {
            return;
        };
        for target in grammar::inline_link_targets(line) {
            self.graph.add_edge(Edge::inline(source, target));
        }
        self.body.push(line.to_string());
    }

    fn flush_body(&mut self) {
        let lines = std::mem::take(&mut self.body);
        let Some(current) = self.current.as_deref() else {
            return;
        };
        if let Some(node) = self.graph.node_mut(current) {
            node.content = lines.join("\n").trim().to_string();
        }
    }

    pub(crate) fn finish(mut self) -> ParseResult {
        self.flush_body();

        for message in self.graph.validate() {
            self.add_warning(message, None);
        }
        let _ = self.graph.prune_dangling_edges();

        ParseResult {
            graph: self.graph,
            warnings: self.warnings,
        }
    }
}
