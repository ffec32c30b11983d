//! Panel Entry
//!
//! One bookmark or folder placed on the page: which panel it is in and
//! where inside that panel.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

use super::entity::Entity;
use super::node::{BookmarkId, BookmarkNode, NodeKind};
use super::panel::Panel;

/// Identity of an entry.
///
/// A placeholder stands in for a bookmark whose native creation is still in
/// flight; it becomes `Committed` once the host returns the real id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum EntryId {
    Placeholder(u64),
    Committed(BookmarkId),
}

impl EntryId {
    pub fn committed(id: impl Into<BookmarkId>) -> Self {
        EntryId::Committed(id.into())
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, EntryId::Placeholder(_))
    }

    /// Native id, if this entry corresponds to a real bookmark
    pub fn native(&self) -> Option<&str> {
        match self {
            EntryId::Committed(id) => Some(id),
            EntryId::Placeholder(_) => None,
        }
    }

    pub fn is_native(&self, id: &str) -> bool {
        self.native() == Some(id)
    }
}

impl From<String> for EntryId {
    fn from(id: String) -> Self {
        EntryId::Committed(id)
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        match id {
            EntryId::Committed(id) => id,
            EntryId::Placeholder(n) => format!("placeholder-{}", n),
        }
    }
}

impl std::fmt::Display for EntryId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntryId::Committed(id) => f.write_str(id),
            EntryId::Placeholder(n) => write!(f, "placeholder-{}", n),
        }
    }
}

/// Entry type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    #[default]
    Bookmark,
    Folder,
}

impl From<NodeKind> for EntryKind {
    fn from(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Bookmark => EntryKind::Bookmark,
            NodeKind::Folder => EntryKind::Folder,
        }
    }
}

/// A bookmark or folder with its panel placement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PanelEntry {
    pub id: EntryId,
    /// Display label, synced from the native store
    #[serde(default)]
    pub title: String,
    /// Legacy mirror of `title`, kept for stored layouts that only have `name`
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type", default)]
    pub kind: EntryKind,
    pub panel: Panel,
    #[serde(default)]
    pub index: usize,
    #[serde(default)]
    pub is_panel_bookmark: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<BookmarkId>,
}

impl PanelEntry {
    /// Place a native node into a panel
    pub fn from_node(node: &BookmarkNode, panel: Panel, index: usize) -> Self {
        Self {
            id: EntryId::committed(node.id.clone()),
            title: node.title.clone(),
            name: node.title.clone(),
            url: node.url.as_deref().map(normalize_url),
            kind: node.kind.into(),
            panel,
            index,
            is_panel_bookmark: true,
            parent_id: node.parent_id.clone(),
        }
    }

    pub fn new_bookmark(id: EntryId, title: &str, url: &str, panel: Panel, index: usize) -> Self {
        Self {
            id,
            title: title.to_string(),
            name: title.to_string(),
            url: Some(normalize_url(url)),
            kind: EntryKind::Bookmark,
            panel,
            index,
            is_panel_bookmark: true,
            parent_id: None,
        }
    }

    pub fn new_folder(id: EntryId, title: &str, panel: Panel, index: usize) -> Self {
        Self {
            id,
            title: title.to_string(),
            name: title.to_string(),
            url: None,
            kind: EntryKind::Folder,
            panel,
            index,
            is_panel_bookmark: true,
            parent_id: None,
        }
    }

    pub fn is_folder(&self) -> bool {
        self.kind == EntryKind::Folder
    }

    pub fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
        self.name = title.to_string();
    }

    /// Native content wins: title, url, type and parent come from the store
    pub fn sync_from_node(&mut self, node: &BookmarkNode) {
        if !node.title.is_empty() {
            self.set_title(&node.title);
        }
        if let Some(url) = &node.url {
            self.url = Some(normalize_url(url));
        }
        self.kind = node.kind.into();
        self.parent_id = node.parent_id.clone();
    }

    /// Repair fields of an entry read from storage or a backup file
    pub fn normalized(mut self) -> Self {
        if self.title.is_empty() {
            self.title = self.name.clone();
        }
        if self.name.is_empty() {
            self.name = self.title.clone();
        }
        self.url = self.url.as_deref().map(normalize_url);
        self.is_panel_bookmark = true;
        self
    }
}

impl Entity for PanelEntry {
    type Id = EntryId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }
}

fn scheme_pattern() -> &'static Regex {
    static SCHEME: OnceLock<Regex> = OnceLock::new();
    SCHEME.get_or_init(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.-]*:").expect("static scheme pattern"))
}

/// Prefix `https://` onto URLs that carry no scheme
pub fn normalize_url(url: &str) -> String {
    let url = url.trim();
    if url.is_empty() || scheme_pattern().is_match(url) {
        url.to_string()
    } else {
        format!("https://{}", url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("example.com"), "https://example.com");
        assert_eq!(normalize_url("http://example.com"), "http://example.com");
        assert_eq!(normalize_url("chrome://extensions"), "chrome://extensions");
        assert_eq!(normalize_url("mailto:a@b.c"), "mailto:a@b.c");
        assert_eq!(normalize_url(""), "");
    }

    #[test]
    fn test_entry_json_shape() {
        let entry = PanelEntry::new_bookmark(EntryId::committed("42"), "Docs", "docs.rs", Panel::TopLeft, 3);
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["id"], "42");
        assert_eq!(json["type"], "bookmark");
        assert_eq!(json["panel"], "top-left");
        assert_eq!(json["isPanelBookmark"], true);
        assert_eq!(json["url"], "https://docs.rs");
    }

    #[test]
    fn test_legacy_name_only_entry() {
        let raw = r#"{"id":"7","name":"Old","type":"folder","panel":"bottom-full","index":1}"#;
        let entry: PanelEntry = serde_json::from_str::<PanelEntry>(raw).unwrap().normalized();
        assert_eq!(entry.title, "Old");
        assert!(entry.is_folder());
        assert!(entry.is_panel_bookmark);
        assert_eq!(entry.id, EntryId::committed("7"));
    }

    #[test]
    fn test_placeholder_identity() {
        let id = EntryId::Placeholder(3);
        assert!(id.is_placeholder());
        assert_eq!(id.native(), None);
        assert!(EntryId::committed("3").is_native("3"));
    }
}
