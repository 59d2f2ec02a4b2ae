//! Typed Excalidraw scene elements.

use mm_core::StrokeStyle;
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BoundKind {
    Arrow,
    Text,
}

/// Back-reference from a shape to an element attached to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BoundElement {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: BoundKind,
}

impl BoundElement {
    #[must_use]
    pub fn arrow(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BoundKind::Arrow,
        }
    }

    #[must_use]
    pub fn text(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: BoundKind::Text,
        }
    }
}

/// Corner style; 2 is used for arrows, 3 for rounded rectangles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Roundness {
    #[serde(rename = "type")]
    pub kind: u8,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Binding {
    pub element_id: String,
    pub focus: f64,
    pub gap: f64,
}

impl Binding {
    #[must_use]
    pub fn to(element_id: impl Into<String>) -> Self {
        Self {
            element_id: element_id.into(),
            focus: 0.0,
            gap: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TextFields {
    /// Wrapped for display.
    pub text: String,
    pub font_size: u32,
    pub font_family: u32,
    pub text_align: &'static str,
    pub vertical_align: &'static str,
    pub container_id: Option<String>,
    pub original_text: String,
    pub line_height: f64,
    pub auto_resize: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArrowFields {
    /// Relative to the element origin; always `[[0, 0], [dx, dy]]`.
    pub points: Vec<[f64; 2]>,
    pub last_committed_point: Option<[f64; 2]>,
    pub start_binding: Binding,
    pub end_binding: Binding,
    pub start_arrowhead: Option<String>,
    pub end_arrowhead: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Rectangle,
    Text(TextFields),
    Arrow(ArrowFields),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExcalidrawElement {
    pub id: String,
    #[serde(flatten)]
    pub kind: ElementKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub angle: f64,
    pub stroke_color: String,
    pub background_color: String,
    pub fill_style: &'static str,
    pub stroke_width: u32,
    pub stroke_style: StrokeStyle,
    pub roughness: u32,
    pub opacity: u32,
    pub group_ids: Vec<String>,
    pub frame_id: Option<String>,
    pub roundness: Option<Roundness>,
    pub seed: u32,
    pub version: u32,
    pub version_nonce: u32,
    pub is_deleted: bool,
    pub bound_elements: Option<Vec<BoundElement>>,
    pub updated: u64,
    pub link: Option<String>,
    pub locked: bool,
}

impl ExcalidrawElement {
    /// An element with the shared defaults; seeds derive from `id`.
    #[must_use]
    pub fn new(id: impl Into<String>, kind: ElementKind) -> Self {
        let id = id.into();
        let version = match kind {
            ElementKind::Text(_) => 2,
            ElementKind::Rectangle | ElementKind::Arrow(_) => 1,
        };
        Self {
            seed: seed_for(&id, "seed"),
            version_nonce: seed_for(&id, "nonce"),
            id,
            kind,
            x: 0.0,
            y: 0.0,
            width: 0.0,
            height: 0.0,
            angle: 0.0,
            stroke_color: String::from("#1e1e1e"),
            background_color: String::from("transparent"),
            fill_style: "solid",
            stroke_width: 1,
            stroke_style: StrokeStyle::Solid,
            roughness: 1,
            opacity: 100,
            group_ids: Vec::new(),
            frame_id: None,
            roundness: None,
            version,
            is_deleted: false,
            bound_elements: None,
            updated: 1,
            link: None,
            locked: false,
        }
    }

    #[must_use]
    pub fn at(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.x = x;
        self.y = y;
        self.width = width;
        self.height = height;
        self
    }

    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self.kind {
            ElementKind::Rectangle => "rectangle",
            ElementKind::Text(_) => "text",
            ElementKind::Arrow(_) => "arrow",
        }
    }
}

pub(crate) fn fnv1a_hash(bytes: &[u8]) -> u64 {
    let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        hash ^= u64::from(b);
        hash = hash.wrapping_mul(0x0100_0000_01b3);
    }
    hash
}

/// Stable value in `1..=2^31-1` for an element id and purpose.
fn seed_for(id: &str, purpose: &str) -> u32 {
    let hash = fnv1a_hash(format!("{purpose}:{id}").as_bytes());
    (hash % 2_147_483_647) as u32 + 1
}

const GROUP_ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789";
const GROUP_ID_LEN: usize = 21;

/// 21-character alphanumeric group id derived from `key`.
pub(crate) fn group_id_for(key: &str) -> String {
    let mut state = fnv1a_hash(format!("group:{key}").as_bytes());
    (0..GROUP_ID_LEN)
        .map(|_| {
            state = state
                .wrapping_mul(6_364_136_223_846_793_005)
                .wrapping_add(1_442_695_040_888_963_407);
            let pick = (state >> 33) as usize % GROUP_ID_ALPHABET.len();
            char::from(GROUP_ID_ALPHABET[pick])
        })
        .collect()
}
