#![no_main]

use libfuzzer_sys::fuzz_target;
use mm_core::{LayoutAlgorithm, MindmapConfig};
use mm_layout::apply_layout;
use mm_parser::parse;
use mm_render_excalidraw::{estimate_node_dimensions, render_excalidraw, to_json_pretty};

fuzz_target!(|data: &[u8]| {
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let Ok(input) = std::str::from_utf8(rest) else {
        return;
    };

    let mut config = MindmapConfig::default();
    config.fill_missing_styles();
    config.layout.auto_layout = match selector % 3 {
        0 => LayoutAlgorithm::Tree,
        1 => LayoutAlgorithm::Force,
        _ => LayoutAlgorithm::None,
    };

    let Ok(parsed) = parse(input, "fuzz.md", &config) else {
        return;
    };
    let mut graph = parsed.graph;
    let _ = estimate_node_dimensions(&mut graph, &config);
    let _ = apply_layout(&mut graph, &config.layout, None);
    for node in graph.nodes() {
        assert!(node.x.is_finite() && node.y.is_finite());
    }

    let document = render_excalidraw(&graph, &config);
    let json = to_json_pretty(&document).unwrap_or_default();
    let _: serde_json::Value = serde_json::from_str(&json).unwrap_or_default();
});
