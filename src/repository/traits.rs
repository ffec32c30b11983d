//! Repository Layer - Core Traits
//!
//! Defines the abstract interfaces for the two external capabilities:
//! the host's native bookmark tree and a key-value storage area.
//! Implementations can use the browser, SQLite, in-memory, etc.

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::domain::{
    BookmarkChanges, BookmarkId, BookmarkNode, DomainResult, NativeEvent, NewBookmark,
};

/// Native bookmark store
///
/// All operations are async; each call is a suspension point while the host
/// resolves it.
#[async_trait]
pub trait BookmarkStore: Send + Sync {
    /// Create a bookmark (url present) or folder. Fails with `Creation` or
    /// `InvalidParent` when the host rejects it.
    async fn create(&self, bookmark: &NewBookmark) -> DomainResult<BookmarkNode>;

    /// Update title and/or url. Fails with `NotFound` if the id is gone.
    async fn update(&self, id: &str, changes: &BookmarkChanges) -> DomainResult<BookmarkNode>;

    /// Move under a new parent. Fails with `NotFound` or `InvalidParent`.
    async fn move_to(&self, id: &str, parent_id: &str) -> DomainResult<()>;

    /// Delete a bookmark or folder (recursively). Missing ids are a success.
    async fn delete(&self, id: &str) -> DomainResult<()>;

    /// Id of the bookmarks bar, the root folder of the layout overlay
    async fn bookmarks_bar_id(&self) -> DomainResult<BookmarkId>;

    /// Direct children of a folder, in native order
    async fn list_children(&self, parent_id: &str) -> DomainResult<Vec<BookmarkNode>>;

    /// Find a node by id
    async fn get(&self, id: &str) -> DomainResult<Option<BookmarkNode>>;

    /// Change notifications (created/changed/removed/moved)
    fn subscribe(&self) -> broadcast::Receiver<NativeEvent>;
}

/// A write observed on a storage area
#[derive(Debug, Clone, PartialEq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    /// Handle that performed the write; listeners skip their own writes
    pub origin: u64,
}

/// String key-value storage with change broadcast
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    async fn get(&self, key: &str) -> DomainResult<Option<String>>;

    async fn set(&self, key: &str, value: &str) -> DomainResult<()>;

    async fn remove(&self, key: &str) -> DomainResult<()>;

    /// Identity of this handle, matched against `StorageEvent::origin`
    fn origin(&self) -> u64;

    fn subscribe(&self) -> broadcast::Receiver<StorageEvent>;
}
