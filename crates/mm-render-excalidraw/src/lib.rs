#![forbid(unsafe_code)]

//! Excalidraw scene output for laid-out mind-map graphs.
//!
//! Regular edges become bound arrows. Inline links become small link blocks
//! under their source node, grouped with it, each with an arrow to the
//! linked node. Element seeds and group ids are derived from element ids so
//! the same graph always renders to the same bytes.

mod element;
mod text;

pub use element::{
    ArrowFields, Binding, BoundElement, BoundKind, ElementKind, ExcalidrawElement, Roundness,
    TextFields,
};
pub use text::{
    CONTENT_PREVIEW_CHARS, LINE_HEIGHT, display_text, estimate_node_dimensions,
    estimate_text_dimensions, wrap_text_for_width,
};

use mm_core::{Edge, EdgeType, Graph, MindmapConfig, Node};
use rustc_hash::FxHashMap;
use serde::Serialize;
use tracing::debug;

const LINK_BLOCK_WIDTH: f64 = 180.0;
const LINK_BLOCK_HEIGHT: f64 = 50.0;
const LINK_BLOCK_GAP: f64 = 10.0;
const LINK_BLOCK_OFFSET: f64 = 15.0;
const LINK_PADDING: f64 = 8.0;
const LINK_FONT_SIZE: u32 = 16;
const LINK_FONT_FAMILY: u32 = 5;
const LINK_COLOR: &str = "#1971c2";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppState {
    pub grid_size: Option<u32>,
    pub view_background_color: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcalidrawDocument {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub version: u32,
    pub source: &'static str,
    pub elements: Vec<ExcalidrawElement>,
    pub app_state: AppState,
    pub files: serde_json::Map<String, serde_json::Value>,
}

impl ExcalidrawDocument {
    #[must_use]
    pub fn new(elements: Vec<ExcalidrawElement>) -> Self {
        Self {
            kind: "excalidraw",
            version: 2,
            source: "mind-map-generator",
            elements,
            app_state: AppState {
                grid_size: None,
                view_background_color: String::from("#ffffff"),
            },
            files: serde_json::Map::new(),
        }
    }
}

/// Pretty-printed JSON as written to `.excalidraw` files.
///
/// # Errors
///
/// Propagates `serde_json` serialization failures.
pub fn to_json_pretty(document: &ExcalidrawDocument) -> serde_json::Result<String> {
    serde_json::to_string_pretty(document)
}

/// Axis-aligned box of a rendered shape.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Frame {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

impl Frame {
    fn of(node: &Node, config: &MindmapConfig) -> Self {
        Self {
            x: node.x,
            y: node.y,
            width: node.effective_width(config.layout.node_width),
            height: node.effective_height(config.layout.node_min_height),
        }
    }

    fn center(self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Endpoints on the sides of `from` and `to` that face each other.
fn facing_points(from: Frame, to: Frame) -> ((f64, f64), (f64, f64)) {
    let (from_cx, from_cy) = from.center();
    let (to_cx, to_cy) = to.center();
    let dx = to_cx - from_cx;
    let dy = to_cy - from_cy;

    if dx.abs() > dy.abs() {
        if dx > 0.0 {
            ((from.x + from.width, from_cy), (to.x, to_cy))
        } else {
            ((from.x, from_cy), (to.x + to.width, to_cy))
        }
    } else if dy > 0.0 {
        ((from_cx, from.y + from.height), (to_cx, to.y))
    } else {
        ((from_cx, from.y), (to_cx, to.y + to.height))
    }
}

fn arrow_element(
    id: String,
    start: (f64, f64),
    end: (f64, f64),
    bindings: (&str, &str),
    arrowheads: (Option<String>, Option<String>),
) -> ExcalidrawElement {
    let dx = end.0 - start.0;
    let dy = end.1 - start.1;
    let mut element = ExcalidrawElement::new(
        id,
        ElementKind::Arrow(ArrowFields {
            points: vec![[0.0, 0.0], [dx, dy]],
            last_committed_point: None,
            start_binding: Binding::to(bindings.0),
            end_binding: Binding::to(bindings.1),
            start_arrowhead: arrowheads.0,
            end_arrowhead: arrowheads.1,
        }),
    )
    .at(start.0, start.1, dx.abs(), dy.abs());
    element.roundness = Some(Roundness { kind: 2 });
    element
}

fn edge_arrow(edge: &Edge, source: Frame, target: Frame, config: &MindmapConfig) -> ExcalidrawElement {
    let style = config.edge_style(edge.edge_type);
    let (start, end) = match edge.edge_type {
        EdgeType::ParentChild => (
            (source.x + source.width, source.y + source.height / 2.0),
            (target.x, target.y + target.height / 2.0),
        ),
        EdgeType::Prereqs | EdgeType::Related | EdgeType::Contrasts => {
            facing_points(source, target)
        }
    };

    let mut arrow = arrow_element(
        edge.element_id(),
        start,
        end,
        (edge.source.as_str(), edge.target.as_str()),
        (style.start_arrowhead, style.end_arrowhead),
    );
    arrow.stroke_color = style.stroke;
    arrow.stroke_width = style.stroke_width;
    arrow.stroke_style = style.stroke_style;
    arrow
}

fn node_elements(node: &Node, config: &MindmapConfig) -> (ExcalidrawElement, ExcalidrawElement) {
    let style = config.node_style(node.node_type);
    let frame = Frame::of(node, config);
    let padding = f64::from(style.padding);

    let fill = node
        .tags
        .first()
        .and_then(|tag| config.tag_color(tag))
        .map_or_else(|| style.fill.clone(), str::to_string);

    let mut rect = ExcalidrawElement::new(node.id(), ElementKind::Rectangle).at(
        frame.x,
        frame.y,
        frame.width,
        frame.height,
    );
    rect.stroke_color = style.stroke.clone();
    rect.background_color = fill;
    rect.stroke_width = style.stroke_width;
    rect.roundness = Some(Roundness { kind: 3 });

    let original_text = display_text(node);
    let text_width = frame.width - padding * 2.0;
    let mut text = ExcalidrawElement::new(
        format!("{}-text", node.id()),
        ElementKind::Text(TextFields {
            text: wrap_text_for_width(&original_text, text_width, style.font_size),
            font_size: style.font_size,
            font_family: style.font_family,
            text_align: "left",
            vertical_align: "top",
            container_id: Some(node.id().to_string()),
            original_text,
            line_height: LINE_HEIGHT,
            auto_resize: true,
        }),
    )
    .at(
        frame.x + padding,
        frame.y + padding,
        text_width,
        frame.height - padding * 2.0,
    );
    text.bound_elements = Some(Vec::new());

    (rect, text)
}

/// Rectangle, label and arrow for the `index`-th inline link of `source`.
fn link_block(
    edge: &Edge,
    source: Frame,
    target_node: &Node,
    target: Frame,
    index: usize,
    group_id: &str,
    config: &MindmapConfig,
) -> [ExcalidrawElement; 3] {
    let block = Frame {
        x: source.x + index as f64 * (LINK_BLOCK_WIDTH + LINK_BLOCK_GAP),
        y: source.y + source.height + LINK_BLOCK_OFFSET,
        width: LINK_BLOCK_WIDTH,
        height: LINK_BLOCK_HEIGHT,
    };
    let block_id = format!("link-{}-{}", edge.source, edge.target);
    let text_id = format!("{block_id}-text");
    let arrow_id = edge.element_id();

    let mut rect = ExcalidrawElement::new(block_id.as_str(), ElementKind::Rectangle).at(
        block.x,
        block.y,
        block.width,
        block.height,
    );
    rect.stroke_color = String::from(LINK_COLOR);
    rect.stroke_width = 2;
    rect.group_ids = vec![group_id.to_string()];
    rect.roundness = Some(Roundness { kind: 3 });
    rect.bound_elements = Some(vec![
        BoundElement::text(text_id.as_str()),
        BoundElement::arrow(arrow_id.as_str()),
    ]);

    let label_width = LINK_BLOCK_WIDTH - LINK_PADDING * 2.0;
    let mut label = ExcalidrawElement::new(
        text_id,
        ElementKind::Text(TextFields {
            text: wrap_text_for_width(&target_node.title, label_width, LINK_FONT_SIZE),
            font_size: LINK_FONT_SIZE,
            font_family: LINK_FONT_FAMILY,
            text_align: "center",
            vertical_align: "middle",
            container_id: Some(block_id.clone()),
            original_text: target_node.title.clone(),
            line_height: LINE_HEIGHT,
            auto_resize: true,
        }),
    )
    .at(
        block.x + LINK_PADDING,
        block.y + LINK_PADDING,
        label_width,
        LINK_BLOCK_HEIGHT - LINK_PADDING * 2.0,
    );
    label.stroke_color = String::from(LINK_COLOR);
    label.group_ids = vec![group_id.to_string()];

    let style = config.edge_style(edge.edge_type);
    let (start, end) = facing_points(block, target);
    let mut arrow = arrow_element(
        arrow_id,
        start,
        end,
        (block_id.as_str(), edge.target.as_str()),
        (None, None),
    );
    arrow.stroke_color = style.stroke;
    arrow.stroke_width = style.stroke_width;
    arrow.stroke_style = style.stroke_style;

    [rect, label, arrow]
}

/// Build the Excalidraw scene for a laid-out graph.
///
/// Edges whose endpoints are missing from the graph are skipped.
#[must_use]
pub fn render_excalidraw(graph: &Graph, config: &MindmapConfig) -> ExcalidrawDocument {
    let mut elements = Vec::new();
    let mut bound: FxHashMap<&str, Vec<BoundElement>> = FxHashMap::default();

    let (inline_edges, regular_edges): (Vec<&Edge>, Vec<&Edge>) =
        graph.edges().iter().partition(|edge| edge.inline_link);

    for edge in regular_edges {
        let (Some(source), Some(target)) = (graph.get_node(&edge.source), graph.get_node(&edge.target))
        else {
            continue;
        };
        elements.push(edge_arrow(
            edge,
            Frame::of(source, config),
            Frame::of(target, config),
            config,
        ));
        let id = edge.element_id();
        bound
            .entry(source.id())
            .or_default()
            .push(BoundElement::arrow(id.as_str()));
        bound
            .entry(target.id())
            .or_default()
            .push(BoundElement::arrow(id));
    }

    // Sources in order of their first inline link.
    let mut link_sources: Vec<&str> = Vec::new();
    let mut links_by_source: FxHashMap<&str, Vec<&Edge>> = FxHashMap::default();
    for edge in inline_edges {
        let links = links_by_source.entry(edge.source.as_str()).or_default();
        if links.is_empty() {
            link_sources.push(edge.source.as_str());
        }
        links.push(edge);
    }

    let mut group_ids: FxHashMap<&str, String> = FxHashMap::default();
    for source_id in link_sources {
        let Some(source) = graph.get_node(source_id) else {
            continue;
        };
        let group_id = element::group_id_for(source.id());
        let source_frame = Frame::of(source, config);

        for (index, edge) in links_by_source[source_id].iter().enumerate() {
            let Some(target) = graph.get_node(&edge.target) else {
                continue;
            };
            elements.extend(link_block(
                edge,
                source_frame,
                target,
                Frame::of(target, config),
                index,
                &group_id,
                config,
            ));
            bound
                .entry(target.id())
                .or_default()
                .push(BoundElement::arrow(edge.element_id()));
        }
        group_ids.insert(source.id(), group_id);
    }

    for node in graph.nodes() {
        let (mut rect, mut text) = node_elements(node, config);
        if let Some(group_id) = group_ids.get(node.id()) {
            rect.group_ids = vec![group_id.clone()];
            text.group_ids = vec![group_id.clone()];
        }
        let mut attached = bound.remove(node.id()).unwrap_or_default();
        attached.push(BoundElement::text(text.id.as_str()));
        rect.bound_elements = Some(attached);
        elements.push(rect);
        elements.push(text);
    }

    debug!(
        source = graph.source(),
        elements = elements.len(),
        "rendered excalidraw scene"
    );
    ExcalidrawDocument::new(elements)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::{
        BoundElement, ElementKind, ExcalidrawDocument, estimate_node_dimensions,
        render_excalidraw, to_json_pretty,
    };
    use mm_core::{
        EdgeStyle, EdgeType, Graph, MindmapConfig, Node, StrokeStyle, TagStyle,
    };
    use serde_json::json;

    fn config() -> MindmapConfig {
        let mut config = MindmapConfig::default();
        config.fill_missing_styles();
        config.tags = BTreeMap::from([(
            "sql".to_string(),
            TagStyle {
                color: "#ff8800".to_string(),
            },
        )]);
        config.edge_types.insert(
            EdgeType::Contrasts,
            EdgeStyle {
                stroke_style: StrokeStyle::Dashed,
                end_arrowhead: None,
                ..EdgeStyle::default()
            },
        );
        config
    }

    fn parsed(markdown: &str) -> Graph {
        let config = config();
        let mut graph = mm_parser::parse(markdown, "scene.md", &config)
            .unwrap()
            .graph;
        let _ = estimate_node_dimensions(&mut graph, &config);
        graph
    }

    fn element<'a>(document: &'a ExcalidrawDocument, id: &str) -> &'a super::ExcalidrawElement {
        document
            .elements
            .iter()
            .find(|element| element.id == id)
            .unwrap()
    }

    #[test]
    fn document_envelope() {
        let document = render_excalidraw(&Graph::new("empty.md"), &config());
        let value = serde_json::to_value(&document).unwrap();
        assert_eq!(value["type"], "excalidraw");
        assert_eq!(value["version"], 2);
        assert_eq!(value["source"], "mind-map-generator");
        assert_eq!(
            value["appState"],
            json!({ "gridSize": null, "viewBackgroundColor": "#ffffff" })
        );
        assert_eq!(value["files"], json!({}));
        assert_eq!(value["elements"], json!([]));
    }

    #[test]
    fn parent_child_arrow_runs_right_middle_to_left_middle() {
        let mut graph = parsed("## Root {#c-root}\n### Kid {#c-kid}");
        graph.node_mut("c-kid").unwrap().x = 400.0;
        graph.node_mut("c-kid").unwrap().y = 100.0;

        let document = render_excalidraw(&graph, &config());
        let arrow = element(&document, "edge-c-root-c-kid-parent_child");
        assert_eq!((arrow.x, arrow.y), (250.0, 46.0));
        let ElementKind::Arrow(fields) = &arrow.kind else {
            panic!("expected an arrow");
        };
        assert_eq!(fields.points, vec![[0.0, 0.0], [150.0, 100.0]]);
        assert_eq!(fields.start_binding.element_id, "c-root");
        assert_eq!(fields.end_binding.element_id, "c-kid");
        assert_eq!(fields.end_arrowhead.as_deref(), Some("arrow"));
        assert_eq!((arrow.width, arrow.height), (150.0, 100.0));

        let root = element(&document, "c-root");
        assert_eq!(
            root.bound_elements.as_deref(),
            Some(
                &[
                    BoundElement::arrow("edge-c-root-c-kid-parent_child"),
                    BoundElement::text("c-root-text"),
                ][..]
            )
        );
    }

    #[test]
    fn declared_edges_connect_facing_sides_with_edge_style() {
        let mut graph = parsed("## A {#c-a}\n```edges\ncontrasts: c-b\n```\n## B {#c-b}");
        graph.node_mut("c-b").unwrap().y = 500.0;

        let document = render_excalidraw(&graph, &config());
        let arrow = element(&document, "edge-c-a-c-b-contrasts");
        // Vertical: bottom-center of A to top-center of B.
        assert_eq!((arrow.x, arrow.y), (125.0, 92.0));
        assert_eq!(arrow.stroke_style, StrokeStyle::Dashed);
        let ElementKind::Arrow(fields) = &arrow.kind else {
            panic!("expected an arrow");
        };
        assert_eq!(fields.points[1], [0.0, 408.0]);
        assert_eq!(fields.end_arrowhead, None);
    }

    #[test]
    fn inline_links_become_grouped_link_blocks() {
        let graph = parsed(
            "## A {#c-a}\nSee [B](#c-b) and [C](#c-c).\n## B {#c-b}\n## C {#c-c}",
        );
        let document = render_excalidraw(&graph, &config());

        let first = element(&document, "link-c-a-c-b");
        let second = element(&document, "link-c-a-c-c");
        let source_height = graph.get_node("c-a").unwrap().height.unwrap();
        assert_eq!((first.x, first.y), (0.0, source_height + 15.0));
        assert_eq!((second.x, second.width, second.height), (190.0, 180.0, 50.0));
        assert_eq!(first.stroke_color, "#1971c2");

        let label = element(&document, "link-c-a-c-b-text");
        let ElementKind::Text(fields) = &label.kind else {
            panic!("expected text");
        };
        assert_eq!(fields.original_text, "B");
        assert_eq!(fields.font_family, 5);
        assert_eq!(fields.font_size, 16);
        assert_eq!(fields.container_id.as_deref(), Some("link-c-a-c-b"));

        let arrow = element(&document, "edge-c-a-c-b-related");
        let ElementKind::Arrow(fields) = &arrow.kind else {
            panic!("expected an arrow");
        };
        assert_eq!(fields.start_binding.element_id, "link-c-a-c-b");
        assert_eq!(fields.start_arrowhead, None);
        assert_eq!(fields.end_arrowhead, None);

        let group = &element(&document, "c-a").group_ids;
        assert_eq!(group.len(), 1);
        assert_eq!(&element(&document, "c-a-text").group_ids, group);
        assert_eq!(&first.group_ids, group);
        assert!(element(&document, "c-b").group_ids.is_empty());

        let target_bindings = element(&document, "c-b").bound_elements.clone().unwrap();
        assert_eq!(target_bindings[0], BoundElement::arrow("edge-c-a-c-b-related"));
    }

    #[test]
    fn first_configured_tag_sets_the_fill() {
        let graph = parsed(
            "## A {#c-a}\n> [!meta]\n> tags: sql\n## B {#c-b}\n> [!meta]\n> type: code\n> tags: other, sql",
        );
        let config = config();
        let document = render_excalidraw(&graph, &config);
        assert_eq!(element(&document, "c-a").background_color, "#ff8800");
        assert_eq!(
            element(&document, "c-b").background_color,
            config.node_style(mm_core::NodeType::Code).fill
        );
    }

    #[test]
    fn node_text_is_wrapped_but_keeps_original() {
        let mut graph = Graph::new("t.md");
        let mut node = Node::new("c-a", "Title", 2);
        node.content = "word ".repeat(20);
        graph.add_node(node).unwrap();

        let document = render_excalidraw(&graph, &config());
        let text = element(&document, "c-a-text");
        assert_eq!((text.x, text.y, text.width), (16.0, 16.0, 218.0));
        let ElementKind::Text(fields) = &text.kind else {
            panic!("expected text");
        };
        assert!(fields.text.contains('\n'));
        assert_eq!(fields.original_text.matches('\n').count(), 2);
        assert_eq!(fields.container_id.as_deref(), Some("c-a"));
        assert_eq!(fields.text_align, "left");
    }

    #[test]
    fn rendering_is_reproducible() {
        let markdown = "## A {#c-a}\n[B](#c-b)\n### B {#c-b}\n```edges\nprereqs: c-a\n```";
        let first = to_json_pretty(&render_excalidraw(&parsed(markdown), &config())).unwrap();
        let second = to_json_pretty(&render_excalidraw(&parsed(markdown), &config())).unwrap();
        assert_eq!(first, second);
        assert!(first.contains("\"type\": \"excalidraw\""));
    }
}
