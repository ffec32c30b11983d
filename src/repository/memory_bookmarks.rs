//! In-Memory Bookmark Store
//!
//! A native-tree stand-in with the same contract as the browser API:
//! root `0`, bookmarks bar `1`, other bookmarks `2`, sequential string ids.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::{broadcast, Mutex};

use super::traits::BookmarkStore;
use crate::domain::{
    BookmarkChanges, BookmarkId, BookmarkNode, DomainError, DomainResult, NativeEvent,
    NewBookmark, NodeKind,
};

pub const ROOT_ID: &str = "0";
pub const BOOKMARKS_BAR_ID: &str = "1";
pub const OTHER_BOOKMARKS_ID: &str = "2";

struct Tree {
    nodes: HashMap<BookmarkId, BookmarkNode>,
    children: HashMap<BookmarkId, Vec<BookmarkId>>,
    next_id: u64,
}

impl Tree {
    fn new() -> Self {
        let mut tree = Self {
            nodes: HashMap::new(),
            children: HashMap::new(),
            next_id: 100,
        };
        tree.insert_folder(ROOT_ID, "", None);
        tree.insert_folder(BOOKMARKS_BAR_ID, "Bookmarks Bar", Some(ROOT_ID));
        tree.insert_folder(OTHER_BOOKMARKS_ID, "Other Bookmarks", Some(ROOT_ID));
        tree
    }

    fn insert_folder(&mut self, id: &str, title: &str, parent: Option<&str>) {
        self.insert(BookmarkNode {
            id: id.to_string(),
            title: title.to_string(),
            url: None,
            kind: NodeKind::Folder,
            parent_id: parent.map(str::to_string),
            index: 0,
        });
    }

    fn insert(&mut self, mut node: BookmarkNode) {
        if let Some(parent) = &node.parent_id {
            let siblings = self.children.entry(parent.clone()).or_default();
            node.index = siblings.len();
            siblings.push(node.id.clone());
        }
        if node.kind == NodeKind::Folder {
            self.children.entry(node.id.clone()).or_default();
        }
        self.nodes.insert(node.id.clone(), node);
    }

    fn is_folder(&self, id: &str) -> bool {
        self.nodes.get(id).map(|n| n.is_folder()).unwrap_or(false)
    }

    /// True if `id` is `ancestor` or lies below it
    fn is_within(&self, id: &str, ancestor: &str) -> bool {
        let mut current = Some(id.to_string());
        while let Some(cur) = current {
            if cur == ancestor {
                return true;
            }
            current = self.nodes.get(&cur).and_then(|n| n.parent_id.clone());
        }
        false
    }

    fn detach(&mut self, id: &str) {
        let parent = self.nodes.get(id).and_then(|n| n.parent_id.clone());
        if let Some(parent) = parent {
            if let Some(siblings) = self.children.get_mut(&parent) {
                siblings.retain(|c| c != id);
            }
        }
    }

    fn remove_subtree(&mut self, id: &str) {
        let mut to_visit = vec![id.to_string()];
        while let Some(current) = to_visit.pop() {
            if let Some(kids) = self.children.remove(&current) {
                to_visit.extend(kids);
            }
            self.nodes.remove(&current);
        }
    }
}

/// In-memory implementation of the native bookmark store
pub struct MemoryBookmarkStore {
    tree: Mutex<Tree>,
    events: broadcast::Sender<NativeEvent>,
    fail_create: AtomicBool,
}

impl Default for MemoryBookmarkStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryBookmarkStore {
    pub fn new() -> Self {
        let (events, _) = broadcast::channel(256);
        Self {
            tree: Mutex::new(Tree::new()),
            events,
            fail_create: AtomicBool::new(false),
        }
    }

    /// Make every create call fail, as when the host denies permission
    pub fn set_fail_create(&self, fail: bool) {
        self.fail_create.store(fail, Ordering::Relaxed);
    }

    pub async fn contains(&self, id: &str) -> bool {
        self.tree.lock().await.nodes.contains_key(id)
    }

    fn emit(&self, event: NativeEvent) {
        // No listeners is fine
        let _ = self.events.send(event);
    }
}

#[async_trait]
impl BookmarkStore for MemoryBookmarkStore {
    async fn create(&self, bookmark: &NewBookmark) -> DomainResult<BookmarkNode> {
        if self.fail_create.load(Ordering::Relaxed) {
            return Err(DomainError::Creation(format!("host rejected \"{}\"", bookmark.title)));
        }
        let mut tree = self.tree.lock().await;
        if !tree.is_folder(&bookmark.parent_id) {
            return Err(DomainError::InvalidParent(bookmark.parent_id.clone()));
        }

        let id = tree.next_id.to_string();
        tree.next_id += 1;
        tree.insert(BookmarkNode {
            id: id.clone(),
            title: bookmark.title.clone(),
            url: bookmark.url.clone(),
            kind: if bookmark.url.is_some() { NodeKind::Bookmark } else { NodeKind::Folder },
            parent_id: Some(bookmark.parent_id.clone()),
            index: 0,
        });
        let node = tree.nodes.get(&id).cloned().ok_or_else(|| DomainError::Creation(id.clone()))?;
        drop(tree);

        self.emit(NativeEvent::Created { id, node: node.clone() });
        Ok(node)
    }

    async fn update(&self, id: &str, changes: &BookmarkChanges) -> DomainResult<BookmarkNode> {
        let mut tree = self.tree.lock().await;
        let node = tree
            .nodes
            .get_mut(id)
            .ok_or_else(|| DomainError::NotFound(format!("Bookmark {} not found", id)))?;

        if let Some(title) = &changes.title {
            node.title = title.clone();
        }
        if let Some(url) = &changes.url {
            if node.kind == NodeKind::Bookmark {
                node.url = Some(url.clone());
            }
        }
        let updated = node.clone();
        drop(tree);

        self.emit(NativeEvent::Changed { id: id.to_string(), changes: changes.clone() });
        Ok(updated)
    }

    async fn move_to(&self, id: &str, parent_id: &str) -> DomainResult<()> {
        let mut tree = self.tree.lock().await;
        let old_parent = tree
            .nodes
            .get(id)
            .ok_or_else(|| DomainError::NotFound(format!("Bookmark {} not found", id)))?
            .parent_id
            .clone()
            .unwrap_or_default();
        if !tree.is_folder(parent_id) || tree.is_within(parent_id, id) {
            return Err(DomainError::InvalidParent(parent_id.to_string()));
        }

        tree.detach(id);
        let siblings = tree.children.entry(parent_id.to_string()).or_default();
        let index = siblings.len();
        siblings.push(id.to_string());
        if let Some(node) = tree.nodes.get_mut(id) {
            node.parent_id = Some(parent_id.to_string());
            node.index = index;
        }
        drop(tree);

        self.emit(NativeEvent::Moved {
            id: id.to_string(),
            old_parent_id: old_parent,
            parent_id: parent_id.to_string(),
        });
        Ok(())
    }

    async fn delete(&self, id: &str) -> DomainResult<()> {
        let mut tree = self.tree.lock().await;
        if !tree.nodes.contains_key(id) {
            return Ok(());
        }
        tree.detach(id);
        tree.remove_subtree(id);
        drop(tree);

        self.emit(NativeEvent::Removed { id: id.to_string() });
        Ok(())
    }

    async fn bookmarks_bar_id(&self) -> DomainResult<BookmarkId> {
        Ok(BOOKMARKS_BAR_ID.to_string())
    }

    async fn list_children(&self, parent_id: &str) -> DomainResult<Vec<BookmarkNode>> {
        let tree = self.tree.lock().await;
        let kids = tree
            .children
            .get(parent_id)
            .ok_or_else(|| DomainError::NotFound(format!("Folder {} not found", parent_id)))?;

        Ok(kids
            .iter()
            .enumerate()
            .filter_map(|(index, id)| {
                tree.nodes.get(id).map(|n| BookmarkNode { index, ..n.clone() })
            })
            .collect())
    }

    async fn get(&self, id: &str) -> DomainResult<Option<BookmarkNode>> {
        Ok(self.tree.lock().await.nodes.get(id).cloned())
    }

    fn subscribe(&self) -> broadcast::Receiver<NativeEvent> {
        self.events.subscribe()
    }
}
