//! Reconciler
//!
//! Merges the native bookmark tree with the persisted overlay into the
//! list the page renders. Holds no state of its own.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::organizer::organize;
use super::overlay_store::LayoutOverlayStore;
use super::placement::{panel_order, place_new, resolve_slot_collisions};
use crate::domain::{
    dedupe_by_id, BookmarkId, BookmarkNode, DomainResult, GridDimensions, LayoutMode, NativeEvent, Panel,
    PanelEntry, normalize_url,
};
use crate::repository::BookmarkStore;

/// Result of one root-folder reconciliation
#[derive(Debug, Clone, Default)]
pub struct Reconciliation {
    pub entries: Vec<PanelEntry>,
    /// Native children that were not in the overlay
    pub added: usize,
    /// Overlay entries whose native id is gone
    pub pruned: usize,
    pub organized: bool,
    /// Whether the merged list was written back
    pub persisted: bool,
}

pub struct Reconciler {
    bookmarks: Arc<dyn BookmarkStore>,
    overlay: Arc<LayoutOverlayStore>,
    fallback_root: BookmarkId,
}

impl Reconciler {
    pub fn new(bookmarks: Arc<dyn BookmarkStore>, overlay: Arc<LayoutOverlayStore>, fallback_root: &str) -> Self {
        Self {
            bookmarks,
            overlay,
            fallback_root: fallback_root.to_string(),
        }
    }

    /// The bookmarks bar, or the configured fallback if the host fails
    pub async fn root_id(&self) -> BookmarkId {
        match self.bookmarks.bookmarks_bar_id().await {
            Ok(id) => id,
            Err(e) => {
                warn!(error = %e, fallback = %self.fallback_root, "Bookmarks bar lookup failed");
                self.fallback_root.clone()
            }
        }
    }

    /// Rebuild the root view from the latest overlay and the native tree.
    /// `placeholders` are in-flight creations carried over unchanged; new
    /// natives are placed around them.
    pub async fn reconcile_root(
        &self,
        layout: LayoutMode,
        grid: GridDimensions,
        placeholders: Vec<PanelEntry>,
    ) -> DomainResult<Reconciliation> {
        let overlay = self.overlay.load_latest().await;
        let root = self.root_id().await;
        let natives = dedupe_by_id(self.bookmarks.list_children(&root).await?);
        let by_id: HashMap<&str, &BookmarkNode> = natives.iter().map(|n| (n.id.as_str(), n)).collect();

        let overlay_len = overlay.len();
        let mut seen = HashSet::new();
        let mut entries: Vec<PanelEntry> = overlay
            .into_iter()
            .filter_map(|mut entry| {
                let node = entry.id.native().and_then(|id| by_id.get(id))?;
                if !seen.insert(node.id.clone()) {
                    return None;
                }
                entry.sync_from_node(node);
                Some(entry)
            })
            .collect();
        let pruned = overlay_len - entries.len();

        let fresh: Vec<BookmarkNode> = natives
            .iter()
            .filter(|n| !seen.contains(&n.id))
            .cloned()
            .collect();
        let added = fresh.len();

        let state = self.overlay.organize_state().await;
        let organized = state.needs_organize(layout);
        if organized {
            info!(from = ?state.last_organized, to = %layout, "Reorganizing overlay");
            entries = organize(entries, layout, &state, grid, &fresh);
        }

        // Placeholders go first so they keep their slots
        let held = placeholders.len();
        let mut view = placeholders;
        view.append(&mut entries);
        if !organized {
            for (dealt, node) in fresh.iter().enumerate() {
                let (panel, index) = place_new(&view, layout, dealt);
                view.push(PanelEntry::from_node(node, panel, index));
            }
        }
        let collided = layout.is_full_screen() && resolve_slot_collisions(&mut view);
        let mut entries = view.split_off(held);

        let persisted = organized || added > 0 || pruned > 0 || collided;
        if persisted {
            self.overlay.save_now(&entries, layout).await;
        }
        debug!(count = entries.len(), added, pruned, organized, "Reconciled root view");

        entries.append(&mut view);
        Ok(Reconciliation { entries, added, pruned, organized, persisted })
    }

    /// Entries for a non-root folder: native order, synthetic `folder`
    /// panel, never persisted.
    pub async fn folder_view(&self, folder_id: &str) -> DomainResult<Vec<PanelEntry>> {
        let children = self.bookmarks.list_children(folder_id).await?;
        Ok(children
            .iter()
            .enumerate()
            .map(|(index, node)| PanelEntry::from_node(node, Panel::Folder, index))
            .collect())
    }

    /// Apply one native notification to the root view in place.
    /// Returns true if the entries changed.
    pub async fn apply_native_event(
        &self,
        entries: &mut Vec<PanelEntry>,
        event: &NativeEvent,
        layout: LayoutMode,
    ) -> DomainResult<bool> {
        let root = self.root_id().await;
        let present = entries.iter().any(|e| e.id.is_native(event.id()));

        let changed = match event {
            NativeEvent::Created { node, .. } => {
                if present || node.parent_id.as_deref() != Some(root.as_str()) {
                    false
                } else {
                    let (panel, index) = place_new(entries, layout, 0);
                    entries.push(PanelEntry::from_node(node, panel, index));
                    true
                }
            }
            NativeEvent::Changed { id, changes } => {
                match entries.iter_mut().find(|e| e.id.is_native(id)) {
                    Some(entry) => {
                        if let Some(title) = &changes.title {
                            entry.set_title(title);
                        }
                        if let Some(url) = &changes.url {
                            entry.url = Some(normalize_url(url));
                        }
                        true
                    }
                    None => false,
                }
            }
            NativeEvent::Removed { id } => remove_native(entries, id),
            NativeEvent::Moved { id, parent_id, .. } => {
                if parent_id != &root {
                    remove_native(entries, id)
                } else if present {
                    false
                } else {
                    match self.bookmarks.get(id).await? {
                        Some(node) => {
                            let (panel, index) = place_new(entries, layout, 0);
                            entries.push(PanelEntry::from_node(&node, panel, index));
                            true
                        }
                        None => false,
                    }
                }
            }
        };

        if changed {
            debug!(id = %event.id(), "Applied native event");
        }
        Ok(changed)
    }
}

/// Drop the entry for a native id and close the gap in its panel
pub fn remove_native(entries: &mut Vec<PanelEntry>, id: &str) -> bool {
    let Some(pos) = entries.iter().position(|e| e.id.is_native(id)) else {
        return false;
    };
    let removed = entries.remove(pos);
    if !removed.panel.is_grid() {
        for (rank, pos) in panel_order(entries, removed.panel).into_iter().enumerate() {
            entries[pos].index = rank;
        }
    }
    true
}
