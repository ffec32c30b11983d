//! Repository Layer
//!
//! Data access abstractions and implementations.

mod traits;
mod local_storage;
mod sqlite_store;
mod memory_bookmarks;


pub use traits::{BookmarkStore, KeyValueStore, StorageEvent};
pub use local_storage::LocalStorage;
pub use sqlite_store::SqliteKvStore;
pub use memory_bookmarks::{MemoryBookmarkStore, BOOKMARKS_BAR_ID, OTHER_BOOKMARKS_ID, ROOT_ID};
