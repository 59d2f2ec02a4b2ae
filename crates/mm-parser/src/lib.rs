#![forbid(unsafe_code)]

//! Parser for the mind-map markdown dialect.
//!
//! Recognizes anchored headings (`## Title {#c-id}`), `> [!meta]` blocks,
//! ```` ```edges ```` fences and inline anchor links. Everything else is body
//! text of the node opened by the most recent heading.

mod builder;
mod grammar;
mod markdown_parser;

use std::fmt;

use mm_core::{Graph, Vocabulary};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParseResult {
    pub graph: Graph,
    pub warnings: Vec<ParseWarning>,
}

/// A recoverable problem found while parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParseWarning {
    pub message: String,
    /// 1-based source line, absent for whole-graph checks.
    pub line: Option<usize>,
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.line {
            Some(line) => write!(f, "Line {line}: {}", self.message),
            None => f.write_str(&self.message),
        }
    }
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("Duplicate node ID: {id} (line {line})")]
    DuplicateNodeId { id: String, line: usize },
}

impl ParseError {
    #[must_use]
    pub const fn line(&self) -> usize {
        match self {
            Self::DuplicateNodeId { line, .. } => *line,
        }
    }
}

/// Parse markdown into a graph.
///
/// `source` is recorded on the graph as provenance. Unknown types and tags are
/// judged against `vocabulary` and reported as warnings. Edges pointing at ids
/// that never appear are reported once and dropped from the result.
///
/// # Errors
///
/// Returns [`ParseError::DuplicateNodeId`] when two headings share an id.
pub fn parse(
    input: &str,
    source: &str,
    vocabulary: &dyn Vocabulary,
) -> Result<ParseResult, ParseError> {
    let result = markdown_parser::parse_markdown(input, source, vocabulary)?;
    debug!(
        source,
        nodes = result.graph.node_count(),
        edges = result.graph.edge_count(),
        warnings = result.warnings.len(),
        "parsed markdown"
    );
    Ok(result)
}

#[must_use]
pub fn parse_summary_json(parsed: &ParseResult) -> String {
    let warnings: Vec<String> = parsed.warnings.iter().map(ToString::to_string).collect();
    json!({
        "source": parsed.graph.source(),
        "node_count": parsed.graph.node_count(),
        "edge_count": parsed.graph.edge_count(),
        "warning_count": parsed.warnings.len(),
        "warnings": warnings,
    })
    .to_string()
}
