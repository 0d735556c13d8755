use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a block in a feed or channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

impl ItemId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ItemId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for ItemId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemKind {
    #[default]
    Image,
    Link,
    Attachment,
    Text,
    Embed,
}

impl ItemKind {
    /// Kinds that open in the gesture-driven image viewer.
    pub fn is_viewable(self) -> bool {
        matches!(self, Self::Image | Self::Link | Self::Attachment)
    }
}

/// What a list page carries for each item: enough to draw a cell and to
/// seed the viewer with a low-resolution placeholder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemSummary {
    pub id: ItemId,
    #[serde(default)]
    pub kind: ItemKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder_url: Option<String>,
}

impl ItemSummary {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            kind: ItemKind::Image,
            title: None,
            placeholder_url: None,
        }
    }

    pub fn with_placeholder(mut self, url: impl Into<String>) -> Self {
        self.placeholder_url = Some(url.into());
        self
    }

    pub fn with_kind(mut self, kind: ItemKind) -> Self {
        self.kind = kind;
        self
    }
}

/// Full record fetched when an item is opened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDetail {
    pub id: ItemId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ItemDetail {
    pub fn new(id: impl Into<ItemId>) -> Self {
        Self {
            id: id.into(),
            title: None,
            image_url: None,
            description: None,
        }
    }

    pub fn with_image(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }
}
