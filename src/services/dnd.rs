//! Drag/Drop Controller
//!
//! Turns pointer gestures into panel operations on the manager. The
//! gesture itself is tracked by `dial_dragdrop::DragGesture`; this layer
//! decides what a drop means.

use dial_dragdrop::{DragGesture, Release};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::manager::PanelBookmarkManager;
use crate::domain::{BookmarkId, DomainError, DomainResult, EntryId, EntryKind, Panel};

/// What is being dragged, captured at drag start
#[derive(Debug, Clone, PartialEq)]
pub struct DragSource {
    pub id: EntryId,
    pub panel: Panel,
    pub index: usize,
}

/// Hit-tested drop location
#[derive(Debug, Clone, PartialEq)]
pub enum DropTarget {
    /// A dial. Folders swallow the dragged entry; bookmarks take its place.
    Item { id: EntryId, kind: EntryKind, panel: Panel, index: usize },
    /// Empty space after the last dial of a panel
    PanelEnd(Panel),
    /// A full-screen grid slot
    Slot(usize),
    /// Breadcrumb segment naming the parent of the browsed folder
    Breadcrumb { folder_id: BookmarkId },
}

/// What a finished gesture did
#[derive(Debug, Clone, PartialEq)]
pub enum DropOutcome {
    Reordered,
    MovedAcross,
    IntoFolder(BookmarkId),
    ToParent(BookmarkId),
    Slot(usize),
    PanelEnd(Panel),
    /// Released without moving far enough
    Click(EntryId),
    Cancelled,
    /// The drop was valid but the mutation failed; state is unchanged
    Failed(String),
    Ignored,
}

pub struct DragDropController {
    manager: Arc<PanelBookmarkManager>,
    gesture: DragGesture<DragSource, DropTarget>,
}

impl DragDropController {
    pub fn new(manager: Arc<PanelBookmarkManager>, threshold_px: i32) -> Self {
        Self {
            manager,
            gesture: DragGesture::new(threshold_px),
        }
    }

    pub fn gesture(&self) -> &DragGesture<DragSource, DropTarget> {
        &self.gesture
    }

    pub fn is_dragging(&self) -> bool {
        self.gesture.is_dragging()
    }

    /// Highlighted target, for hover styling
    pub fn hover(&self) -> Option<&DropTarget> {
        self.gesture.hover()
    }

    pub fn press(&mut self, source: DragSource, x: i32, y: i32) {
        self.gesture.press(source, x, y);
    }

    /// Pointer motion; the manager holds off reconciliation once dragging
    pub async fn motion(&mut self, x: i32, y: i32) -> bool {
        let started = self.gesture.motion(x, y);
        if started {
            self.manager.begin_drag().await;
        }
        started
    }

    /// Native drag start, no threshold
    pub async fn start(&mut self, source: DragSource) {
        self.gesture.start(source);
        self.manager.begin_drag().await;
    }

    pub fn enter(&mut self, target: DropTarget) {
        self.gesture.enter(target, accepts);
    }

    pub fn leave(&mut self) {
        self.gesture.leave();
    }

    /// Pointer released: apply the drop, then let deferred work run
    pub async fn release(&mut self) -> DropOutcome {
        let outcome = match self.gesture.release() {
            Release::Ignored => return DropOutcome::Ignored,
            Release::Click(source) => return DropOutcome::Click(source.id),
            Release::Cancelled(source) => {
                debug!(id = %source.id, "Drag cancelled");
                DropOutcome::Cancelled
            }
            Release::Dropped { source, target } => match self.apply(&source, &target).await {
                Ok(outcome) => {
                    info!(id = %source.id, ?outcome, "Drop applied");
                    outcome
                }
                Err(e) => {
                    warn!(id = %source.id, error = %e, "Drop failed");
                    DropOutcome::Failed(e.to_string())
                }
            },
        };
        self.manager.end_drag().await;
        outcome
    }

    /// Escape or focus loss: no mutation
    pub async fn cancel(&mut self) {
        if let Some(source) = self.gesture.cancel() {
            debug!(id = %source.id, "Drag aborted");
            self.manager.end_drag().await;
        }
    }

    async fn apply(&self, source: &DragSource, target: &DropTarget) -> DomainResult<DropOutcome> {
        match target {
            DropTarget::Item { id, kind: EntryKind::Folder, .. } if id != &source.id => {
                let folder = id
                    .native()
                    .map(str::to_string)
                    .ok_or_else(|| DomainError::InvalidInput(format!("{} is still being created", id)))?;
                self.manager.move_into_folder(&source.id, &folder).await?;
                Ok(DropOutcome::IntoFolder(folder))
            }
            DropTarget::Item { panel, index, .. } => {
                if *panel == Panel::FullScreen {
                    self.manager.drop_on_slot(&source.id, *index).await?;
                    Ok(DropOutcome::Slot(*index))
                } else if *panel == source.panel {
                    self.manager.reorder_within_panel(&source.id, *index).await?;
                    Ok(DropOutcome::Reordered)
                } else {
                    self.manager.move_across_panels(&source.id, *panel, *index).await?;
                    Ok(DropOutcome::MovedAcross)
                }
            }
            DropTarget::PanelEnd(panel) => {
                self.manager.drop_on_panel_end(&source.id, *panel).await?;
                Ok(DropOutcome::PanelEnd(*panel))
            }
            DropTarget::Slot(slot) => {
                self.manager.drop_on_slot(&source.id, *slot).await?;
                Ok(DropOutcome::Slot(*slot))
            }
            DropTarget::Breadcrumb { folder_id } => {
                self.manager.move_to_parent(&source.id, source.panel, folder_id).await?;
                Ok(DropOutcome::ToParent(folder_id.clone()))
            }
        }
    }
}

/// Targets a source may hover: not itself, and folders only when the
/// source is a committed bookmark
fn accepts(source: &DragSource, target: &DropTarget) -> bool {
    match target {
        DropTarget::Item { id, kind, .. } => {
            id != &source.id && !(*kind == EntryKind::Folder && source.id.is_placeholder())
        }
        DropTarget::Slot(_) | DropTarget::PanelEnd(_) => true,
        DropTarget::Breadcrumb { .. } => source.panel == Panel::Folder && !source.id.is_placeholder(),
    }
}
