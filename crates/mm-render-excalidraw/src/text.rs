//! Node text and heuristic size estimation.
//!
//! There is no font engine here: widths come from a per-character average
//! scaled by the font size.

use mm_core::{Graph, MindmapConfig, Node, strip_anchor_links};
use tracing::trace;

/// Body characters shown on a node before truncation.
pub const CONTENT_PREVIEW_CHARS: usize = 500;
/// Line height as a multiple of the font size.
pub const LINE_HEIGHT: f64 = 1.25;

const ESTIMATE_CHAR_WIDTH: f64 = 0.55;
const WRAP_CHAR_WIDTH: f64 = 0.5;
const MIN_WRAP_CHARS: usize = 15;
/// Heights further than this from the default were set by hand.
const RESIZE_TOLERANCE: f64 = 10.0;

/// Title, then a blank line and the body preview when the body is non-empty.
#[must_use]
pub fn display_text(node: &Node) -> String {
    let body = node.content.trim();
    if body.is_empty() {
        return node.title.clone();
    }

    let preview = match body.char_indices().nth(CONTENT_PREVIEW_CHARS) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    };
    format!("{}\n\n{}", node.title, strip_anchor_links(&preview))
}

/// Break lines at spaces so none exceeds the characters that fit in `width`.
///
/// A single word longer than the limit stays on its own line.
#[must_use]
pub fn wrap_text_for_width(text: &str, width: f64, font_size: u32) -> String {
    let char_width = f64::from(font_size) * WRAP_CHAR_WIDTH;
    let max_chars = ((width / char_width) as usize).max(MIN_WRAP_CHARS);

    let mut wrapped: Vec<String> = Vec::new();
    for line in text.split('\n') {
        if line.chars().count() <= max_chars {
            wrapped.push(line.to_string());
            continue;
        }

        let mut current = String::new();
        let mut current_len = 0;
        for word in line.split(' ') {
            let word_len = word.chars().count();
            if current.is_empty() {
                current = word.to_string();
                current_len = word_len;
            } else if current_len + 1 + word_len <= max_chars {
                current.push(' ');
                current.push_str(word);
                current_len += 1 + word_len;
            } else {
                wrapped.push(std::mem::replace(&mut current, word.to_string()));
                current_len = word_len;
            }
        }
        if !current.is_empty() {
            wrapped.push(current);
        }
    }
    wrapped.join("\n")
}

/// Estimated `(width, height)` of a box holding `text`.
///
/// The width is always `max_width`; the height grows with the wrapped line
/// count and never drops below three lines' worth of font plus padding.
#[must_use]
pub fn estimate_text_dimensions(
    text: &str,
    font_size: u32,
    max_width: f64,
    padding: u32,
) -> (f64, f64) {
    let font = f64::from(font_size);
    let pad = f64::from(padding);
    if text.is_empty() {
        return (max_width, font + pad * 2.0);
    }

    let char_width = font * ESTIMATE_CHAR_WIDTH;
    let available = max_width - pad * 2.0;
    let chars_per_line = ((available / char_width) as usize).max(1);

    let line_count: usize = text
        .split('\n')
        .map(|line| line.chars().count().div_ceil(chars_per_line).max(1))
        .sum();

    let height = (line_count as f64 * font * LINE_HEIGHT + pad * 2.0).floor();
    (max_width, height.max(font * 3.0 + pad * 2.0))
}

/// Size every node that is unsized or still near the default height.
///
/// Returns how many nodes were sized. Nodes carrying other dimensions keep
/// them, so boxes resized by hand survive regeneration.
pub fn estimate_node_dimensions(graph: &mut Graph, config: &MindmapConfig) -> usize {
    let default_width = config.layout.node_width;
    let default_height = config.layout.node_min_height;
    let mut sized = 0;

    for node in graph.nodes_mut() {
        if node
            .height
            .is_some_and(|height| (height - default_height).abs() > RESIZE_TOLERANCE)
        {
            continue;
        }

        let style = config.node_style(node.node_type);
        let (width, height) = estimate_text_dimensions(
            &display_text(node),
            style.font_size,
            default_width,
            style.padding,
        );
        node.width = Some(width);
        node.height = Some(height);
        sized += 1;
        trace!(id = node.id(), width, height, "estimated node size");
    }
    sized
}
