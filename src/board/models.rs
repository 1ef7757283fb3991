use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geometry::{Position, Size, round_coord};

/// Stable identifier of an item on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub i64);

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A note card the core can relocate and restack.
///
/// `size` is owned by presentation and only read for boundary computation.
/// `title`, `content`, `color` and `style_code` are carried through for the
/// renderer and never interpreted here.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MovableItem {
    pub id: ItemId,
    pub position: Position,
    pub z_order: i64,
    pub size: Size,
    pub title: String,
    pub content: String,
    pub color: Option<String>,
    pub style_code: Option<String>,
}

impl MovableItem {
    pub fn new(id: ItemId, position: Position, size: Size) -> Self {
        Self {
            id,
            position,
            z_order: 0,
            size,
            title: String::new(),
            content: String::new(),
            color: None,
            style_code: None,
        }
    }

    pub fn with_z_order(mut self, z_order: i64) -> Self {
        self.z_order = z_order;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }
}

/// Style reference attached to a memo (subset of fields we care about).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoStyle {
    #[serde(default)]
    pub id: Option<i64>,
    pub code: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub is_free: Option<bool>,
}

/// A memo as served by the board snapshot endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoRecord {
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub color: Option<String>,
    pub x: f64,
    pub y: f64,
    /// Served as `zIndex` by some backends and `zindex` by others.
    #[serde(default, alias = "zindex")]
    pub z_index: i64,
    #[serde(default)]
    pub style: Option<MemoStyle>,
    #[serde(default)]
    pub is_archived: bool,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl MemoRecord {
    pub fn style_code(&self) -> Option<&str> {
        self.style.as_ref().map(|s| s.code.as_str())
    }

    /// Convert to a board item; the size comes from presentation, not the wire.
    pub fn into_item(self, size: Size) -> MovableItem {
        let style_code = self.style.map(|s| s.code);
        MovableItem {
            id: ItemId(self.id),
            position: Position::new(round_coord(self.x), round_coord(self.y)),
            z_order: self.z_index,
            size,
            title: self.title,
            content: self.content,
            color: self.color,
            style_code,
        }
    }
}
