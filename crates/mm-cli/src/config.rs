//! Layered YAML configuration: bundled defaults, then the project file.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use mm_core::{EdgeType, LayoutAlgorithm, MindmapConfig, NodeType};
use serde_yaml::{Mapping, Value};
use tracing::{debug, warn};

const DEFAULT_CONFIG: &str = include_str!("default_config.yaml");
const PROJECT_CONFIG_NAME: &str = "config.yaml";

/// The project config picked up next to a markdown file, if present.
#[must_use]
pub fn project_config_path(markdown: &Path) -> Option<PathBuf> {
    let candidate = markdown
        .parent()
        .unwrap_or_else(|| Path::new(""))
        .join(PROJECT_CONFIG_NAME);
    candidate.is_file().then_some(candidate)
}

/// Defaults merged with `explicit`, or with the project config next to
/// `markdown` when no explicit path is given.
///
/// # Errors
///
/// Fails when `explicit` does not exist or a layer is not valid YAML.
pub fn load_config(explicit: Option<&Path>, markdown: &Path) -> Result<MindmapConfig> {
    let overlay_path = match explicit {
        Some(path) if !path.is_file() => bail!("Config file not found: {}", path.display()),
        Some(path) => Some(path.to_path_buf()),
        None => project_config_path(markdown),
    };

    let overlay = match &overlay_path {
        Some(path) => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            debug!(path = %path.display(), "loading project config");
            Some(text)
        }
        None => None,
    };

    config_from_layers(overlay.as_deref())
        .with_context(|| match &overlay_path {
            Some(path) => format!("Invalid config: {}", path.display()),
            None => String::from("Invalid bundled config"),
        })
}

/// Build a config from the bundled defaults and an optional YAML overlay.
///
/// # Errors
///
/// Fails when either layer is not valid YAML or does not match the config
/// shape.
pub fn config_from_layers(overlay: Option<&str>) -> Result<MindmapConfig> {
    let mut merged: Value = serde_yaml::from_str(DEFAULT_CONFIG)?;
    if let Some(text) = overlay {
        let overlay: Value = serde_yaml::from_str(text)?;
        merge_values(&mut merged, overlay);
    }
    drop_unknown_keys(&mut merged, "node_types", |key| NodeType::parse(key).is_some());
    drop_unknown_keys(&mut merged, "edge_types", |key| EdgeType::parse(key).is_some());
    warn_unknown_layout(&merged);

    let mut config: MindmapConfig = serde_yaml::from_value(merged)?;
    config.fill_missing_styles();
    Ok(config)
}

/// Merge `overlay` into `base`: mappings merge key by key, anything else
/// replaces. A null never replaces a mapping and never adds a new key.
fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Mapping(_), Value::Null) => {}
        (Value::Mapping(base), Value::Mapping(overlay)) => merge_mappings(base, overlay),
        (base, overlay) => *base = overlay,
    }
}

fn merge_mappings(base: &mut Mapping, overlay: Mapping) {
    for (key, value) in overlay {
        match base.get_mut(&key) {
            Some(existing) => merge_values(existing, value),
            None if value.is_null() => {}
            None => {
                base.insert(key, value);
            }
        }
    }
}

fn drop_unknown_keys(config: &mut Value, section: &str, known: impl Fn(&str) -> bool) {
    let Some(Value::Mapping(entries)) = config.get_mut(section) else {
        return;
    };
    entries.retain(|key, _| {
        let keep = key.as_str().is_some_and(&known);
        if !keep {
            warn!(section, key = ?key, "ignoring unknown type in config");
        }
        keep
    });
}

fn warn_unknown_layout(config: &Value) {
    let Some(name) = config
        .get("layout")
        .and_then(|layout| layout.get("auto_layout"))
        .and_then(Value::as_str)
    else {
        return;
    };
    if LayoutAlgorithm::parse(name).is_none() {
        warn!(auto_layout = name, "unknown layout algorithm; nodes will not be laid out");
    }
}
