//! Saved node positions, kept next to the markdown file so that
//! regeneration only lays out nodes it has never placed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use mm_core::{Graph, LayoutSettings};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedPosition {
    pub x: f64,
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
}

pub type Positions = BTreeMap<String, SavedPosition>;

const SYNC_DEFAULT_WIDTH: f64 = 250.0;
const SYNC_DEFAULT_HEIGHT: f64 = 80.0;

/// `<dir>/<stem>.positions.json` for `notes.md`.
#[must_use]
pub fn positions_path(markdown: &Path) -> PathBuf {
    sibling_with_suffix(markdown, "positions.json")
}

/// `<dir>/<stem>.excalidraw` for `notes.md`.
#[must_use]
pub fn excalidraw_path(markdown: &Path) -> PathBuf {
    sibling_with_suffix(markdown, "excalidraw")
}

fn sibling_with_suffix(markdown: &Path, suffix: &str) -> PathBuf {
    let stem = markdown
        .file_stem()
        .map_or_else(String::new, |stem| stem.to_string_lossy().into_owned());
    markdown.with_file_name(format!("{stem}.{suffix}"))
}

/// Read a sidecar. A missing file is empty; so is one that is not a JSON
/// object. Entries without numeric `x` and `y` are skipped.
///
/// # Errors
///
/// Fails only when an existing file cannot be read.
pub fn load_positions(path: &Path) -> Result<Positions> {
    if !path.exists() {
        return Ok(Positions::new());
    }
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read positions: {}", path.display()))?;

    let Ok(Value::Object(entries)) = serde_json::from_str::<Value>(&text) else {
        warn!(path = %path.display(), "ignoring malformed positions file");
        return Ok(Positions::new());
    };

    let positions: Positions = entries
        .into_iter()
        .filter_map(|(id, entry)| {
            let x = entry.get("x")?.as_f64()?;
            let y = entry.get("y")?.as_f64()?;
            let dimension = |key: &str| entry.get(key).and_then(Value::as_f64);
            Some((
                id,
                SavedPosition {
                    x,
                    y,
                    width: dimension("width"),
                    height: dimension("height"),
                },
            ))
        })
        .collect();
    debug!(path = %path.display(), count = positions.len(), "loaded positions");
    Ok(positions)
}

/// Write every node's position and size, sizes falling back to `settings`.
///
/// # Errors
///
/// Fails when the file cannot be written.
pub fn save_positions(path: &Path, graph: &Graph, settings: &LayoutSettings) -> Result<()> {
    let positions: Positions = graph
        .nodes()
        .iter()
        .map(|node| {
            (
                node.id().to_string(),
                SavedPosition {
                    x: node.x,
                    y: node.y,
                    width: Some(node.effective_width(settings.node_width)),
                    height: Some(node.effective_height(settings.node_min_height)),
                },
            )
        })
        .collect();
    write_positions(path, &positions)
}

fn write_positions(path: &Path, positions: &Positions) -> Result<()> {
    let json = serde_json::to_string_pretty(positions)?;
    std::fs::write(path, json)
        .with_context(|| format!("Failed to write positions: {}", path.display()))?;
    debug!(path = %path.display(), count = positions.len(), "saved positions");
    Ok(())
}

/// Copy saved coordinates (and sizes, when saved) onto matching nodes.
///
/// Returns the ids of nodes with no saved entry, in node order.
pub fn apply_saved_positions(graph: &mut Graph, positions: &Positions) -> Vec<String> {
    let mut unplaced = Vec::new();
    for node in graph.nodes_mut() {
        let Some(saved) = positions.get(node.id()) else {
            unplaced.push(node.id().to_string());
            continue;
        };
        node.x = saved.x;
        node.y = saved.y;
        if saved.width.is_some() {
            node.width = saved.width;
        }
        if saved.height.is_some() {
            node.height = saved.height;
        }
    }
    unplaced
}

#[derive(Deserialize)]
struct Scene {
    #[serde(default)]
    elements: Vec<SceneElement>,
}

/// Every field may be absent or null; missing coordinates read as 0.
#[derive(Deserialize)]
struct SceneElement {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    kind: Option<String>,
    #[serde(default)]
    x: Option<f64>,
    #[serde(default)]
    y: Option<f64>,
    #[serde(default)]
    width: Option<f64>,
    #[serde(default)]
    height: Option<f64>,
}

/// Take node rectangles from an Excalidraw scene (as moved or resized by
/// hand) and write them as the sidecar for `markdown`.
///
/// Returns how many positions were written.
///
/// # Errors
///
/// Fails when the scene cannot be read or parsed, or the sidecar cannot be
/// written.
pub fn sync_positions_from_excalidraw(excalidraw: &Path, markdown: &Path) -> Result<usize> {
    let text = std::fs::read_to_string(excalidraw)
        .with_context(|| format!("Failed to read Excalidraw file: {}", excalidraw.display()))?;
    let scene: Scene = serde_json::from_str(&text)
        .with_context(|| format!("Invalid Excalidraw file: {}", excalidraw.display()))?;

    let positions: Positions = scene
        .elements
        .into_iter()
        .filter(|element| element.kind.as_deref() == Some("rectangle"))
        .filter_map(|element| {
            let id = element.id.filter(|id| id.starts_with("c-"))?;
            Some((
                id,
                SavedPosition {
                    x: element.x.unwrap_or(0.0),
                    y: element.y.unwrap_or(0.0),
                    width: Some(element.width.unwrap_or(SYNC_DEFAULT_WIDTH)),
                    height: Some(element.height.unwrap_or(SYNC_DEFAULT_HEIGHT)),
                },
            ))
        })
        .collect();

    write_positions(&positions_path(markdown), &positions)?;
    Ok(positions.len())
}
