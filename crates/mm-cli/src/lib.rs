#![forbid(unsafe_code)]

//! File-level pipeline behind the `mindmap` binary: configuration layering,
//! the position sidecar, and markdown-to-Excalidraw generation.

pub mod config;
pub mod positions;

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use mm_core::MindmapConfig;
use mm_layout::{LayoutStats, apply_layout};
use mm_parser::{ParseResult, ParseWarning};
use mm_render_excalidraw::{estimate_node_dimensions, render_excalidraw, to_json_pretty};
use tracing::{debug, info};

use crate::positions::{
    apply_saved_positions, excalidraw_path, load_positions, positions_path, save_positions,
    sync_positions_from_excalidraw,
};

#[derive(Debug, Clone, Copy, Default)]
pub struct GenerateOptions<'a> {
    pub config: Option<&'a Path>,
    /// Defaults to `<stem>.excalidraw` next to the markdown.
    pub output: Option<&'a Path>,
}

/// What happened to hand edits in the previous scene before generating.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AutoSync {
    /// The sidecar was at least as new as the scene, or there was no scene.
    Skipped,
    Synced(usize),
    Failed(String),
}

#[derive(Debug, Clone)]
pub struct GenerateReport {
    pub output: PathBuf,
    pub positions: PathBuf,
    pub auto_sync: AutoSync,
    pub warnings: Vec<ParseWarning>,
    pub node_count: usize,
    pub edge_count: usize,
    /// Nodes that had no saved position and were laid out this run.
    pub new_nodes: usize,
    pub layout: LayoutStats,
}

/// Read and parse a markdown file with its layered configuration.
///
/// # Errors
///
/// Fails when the file or config cannot be read, or the markdown has a
/// duplicate node id.
pub fn load_and_parse(
    markdown: &Path,
    config: Option<&Path>,
) -> Result<(MindmapConfig, ParseResult)> {
    let config = config::load_config(config, markdown)?;
    let input = std::fs::read_to_string(markdown)
        .with_context(|| format!("Failed to read file: {}", markdown.display()))?;
    let source = markdown.display().to_string();
    let parsed = mm_parser::parse(&input, &source, &config)
        .with_context(|| format!("Failed to parse {source}"))?;
    Ok((config, parsed))
}

/// Markdown to Excalidraw, keeping every position already saved.
///
/// # Errors
///
/// Fails on unreadable input, a duplicate node id, or when the sidecar or
/// the scene cannot be written.
pub fn generate(markdown: &Path, options: GenerateOptions<'_>) -> Result<GenerateReport> {
    let output = options
        .output
        .map_or_else(|| excalidraw_path(markdown), Path::to_path_buf);
    let positions_file = positions_path(markdown);

    let auto_sync = if is_newer(&output, &positions_file) {
        match sync_positions_from_excalidraw(&output, markdown) {
            Ok(count) => {
                info!(count, scene = %output.display(), "synced positions from scene");
                AutoSync::Synced(count)
            }
            Err(err) => AutoSync::Failed(format!("{err:#}")),
        }
    } else {
        AutoSync::Skipped
    };

    let (config, parsed) = load_and_parse(markdown, options.config)?;
    let ParseResult {
        mut graph,
        warnings,
    } = parsed;

    let saved = load_positions(&positions_file)?;
    let unplaced = apply_saved_positions(&mut graph, &saved);
    let sized = estimate_node_dimensions(&mut graph, &config);
    let layout = apply_layout(&mut graph, &config.layout, Some(unplaced.as_slice()));
    debug!(
        saved = saved.len(),
        new = unplaced.len(),
        sized,
        positioned = layout.positioned_nodes,
        "prepared graph"
    );

    save_positions(&positions_file, &graph, &config.layout)?;
    let document = render_excalidraw(&graph, &config);
    let json = to_json_pretty(&document).context("Failed to serialize Excalidraw scene")?;
    std::fs::write(&output, json)
        .with_context(|| format!("Failed to write output: {}", output.display()))?;

    Ok(GenerateReport {
        output,
        positions: positions_file,
        auto_sync,
        warnings,
        node_count: graph.node_count(),
        edge_count: graph.edge_count(),
        new_nodes: unplaced.len(),
        layout,
    })
}

fn modified(path: &Path) -> Option<SystemTime> {
    std::fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// `scene` exists and was modified after `sidecar` (or there is no sidecar).
fn is_newer(scene: &Path, sidecar: &Path) -> bool {
    match (modified(scene), modified(sidecar)) {
        (Some(scene), Some(sidecar)) => scene > sidecar,
        (Some(_), None) => true,
        (None, _) => false,
    }
}
