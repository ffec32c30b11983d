//! Domain Layer
//!
//! Contains all domain entities and core abstractions.
//! This layer has NO I/O (serde for serialization, regex for url checks).

mod entity;
mod entry;
mod node;
mod panel;
mod settings;

pub use entity::{dedupe_by_id, Entity, DomainError, DomainResult};
pub use entry::{normalize_url, EntryId, EntryKind, PanelEntry};
pub use node::{BookmarkChanges, BookmarkId, BookmarkNode, NativeEvent, NewBookmark, NodeKind};
pub use panel::{DialSize, GridDimensions, LayoutMode, Panel};
pub use settings::AppearanceSettings;
