//! Service Layer
//!
//! The panel-bookmark engine: overlay persistence, placement and
//! organization rules, reconciliation against the native tree, drag and
//! drop, and the manager that ties them together.

pub mod arrange;
pub mod backup;
pub mod dnd;
pub mod manager;
pub mod organizer;
pub mod overlay_store;
pub mod placement;
pub mod reconciler;
pub mod tab_sync;


pub use backup::{BackupDocument, RestoreReport};
pub use dnd::{DragDropController, DragSource, DropOutcome, DropTarget};
pub use manager::{PanelBookmarkManager, View};
pub use organizer::{organize, OrganizeState};
pub use overlay_store::LayoutOverlayStore;
pub use reconciler::{Reconciler, Reconciliation};
pub use tab_sync::{spawn_sync, SyncTasks};
