//! Native Bookmark Nodes
//!
//! Shapes exchanged with the host's bookmark store.

use serde::{Deserialize, Serialize};
use super::entity::Entity;

/// Native bookmark id as handed out by the host
pub type BookmarkId = String;

/// Node type; folders have no url
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Bookmark,
    Folder,
}

/// A node of the native bookmark tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookmarkNode {
    pub id: BookmarkId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default)]
    pub parent_id: Option<BookmarkId>,
    /// Position among native siblings
    #[serde(default)]
    pub index: usize,
}

impl BookmarkNode {
    pub fn is_folder(&self) -> bool {
        self.kind == NodeKind::Folder
    }
}

impl Entity for BookmarkNode {
    type Id = BookmarkId;

    fn id(&self) -> Self::Id {
        self.id.clone()
    }
}

/// Arguments for creating a native bookmark; no url means a folder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewBookmark {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    pub parent_id: BookmarkId,
}

impl NewBookmark {
    pub fn bookmark(title: &str, url: &str, parent_id: &str) -> Self {
        Self {
            title: title.to_string(),
            url: Some(url.to_string()),
            parent_id: parent_id.to_string(),
        }
    }

    pub fn folder(title: &str, parent_id: &str) -> Self {
        Self {
            title: title.to_string(),
            url: None,
            parent_id: parent_id.to_string(),
        }
    }
}

/// Partial update of title and/or url
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BookmarkChanges {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Change notification from the native store
#[derive(Debug, Clone, PartialEq)]
pub enum NativeEvent {
    Created { id: BookmarkId, node: BookmarkNode },
    Changed { id: BookmarkId, changes: BookmarkChanges },
    Removed { id: BookmarkId },
    Moved { id: BookmarkId, old_parent_id: BookmarkId, parent_id: BookmarkId },
}

impl NativeEvent {
    pub fn id(&self) -> &str {
        match self {
            NativeEvent::Created { id, .. }
            | NativeEvent::Changed { id, .. }
            | NativeEvent::Removed { id }
            | NativeEvent::Moved { id, .. } => id,
        }
    }
}
