//! Panel Bookmark Manager
//!
//! Owns the in-memory panel list the page renders. Every mutation is a
//! named operation: lock the state, compute the next list, schedule a
//! debounced save. Native calls happen outside the lock so change
//! notifications can be applied while a call is pending.

use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::arrange;
use super::backup::{self, BackupDocument, RestoreReport};
use super::overlay_store::{parse_entries, LayoutOverlayStore};
use super::placement::{claim_slot, first_free_slot, is_slot_free, next_index_for_panel, panel_entries};
use super::reconciler::{remove_native, Reconciler};
use crate::config::{DialConfig, PANEL_BOOKMARKS_KEY};
use crate::domain::{
    normalize_url, AppearanceSettings, BookmarkChanges, BookmarkId, DomainError, DomainResult,
    EntryId, GridDimensions, LayoutMode, NativeEvent, NewBookmark, Panel, PanelEntry,
};
use crate::repository::{BookmarkStore, KeyValueStore, StorageEvent};

/// Which folder the page is showing
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum View {
    /// The bookmarks bar, laid out by the overlay
    #[default]
    Root,
    /// Any other folder, listed in native order
    Folder(BookmarkId),
}

struct ManagerState {
    entries: Vec<PanelEntry>,
    layout: LayoutMode,
    grid: GridDimensions,
    view: View,
    /// Slot the next full-screen add lands in
    target_slot: Option<usize>,
    next_placeholder: u64,
    dragging: bool,
    refresh_deferred: bool,
}

impl ManagerState {
    fn placeholders(&self) -> Vec<PanelEntry> {
        self.entries
            .iter()
            .filter(|e| e.id.is_placeholder() && e.panel != Panel::Folder)
            .cloned()
            .collect()
    }

    fn find(&self, id: &EntryId) -> Option<&PanelEntry> {
        self.entries.iter().find(|e| &e.id == id)
    }

    fn check_panel(&self, panel: Panel) -> DomainResult<()> {
        if self.view == View::Root && !self.layout.contains(panel) {
            return Err(DomainError::InvalidInput(format!(
                "panel {} is not part of the {} layout",
                panel, self.layout
            )));
        }
        Ok(())
    }
}

pub struct PanelBookmarkManager {
    bookmarks: Arc<dyn BookmarkStore>,
    overlay: Arc<LayoutOverlayStore>,
    reconciler: Reconciler,
    config: DialConfig,
    state: Mutex<ManagerState>,
}

impl PanelBookmarkManager {
    pub fn new(
        bookmarks: Arc<dyn BookmarkStore>,
        primary: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        config: DialConfig,
    ) -> Arc<Self> {
        let overlay = Arc::new(LayoutOverlayStore::new(primary, session, config.debounce()));
        let reconciler = Reconciler::new(
            Arc::clone(&bookmarks),
            Arc::clone(&overlay),
            &config.bookmarks_bar_fallback_id,
        );
        let state = ManagerState {
            entries: Vec::new(),
            layout: LayoutMode::default(),
            grid: config.default_grid,
            view: View::Root,
            target_slot: None,
            next_placeholder: 0,
            dragging: false,
            refresh_deferred: false,
        };
        Arc::new(Self {
            bookmarks,
            overlay,
            reconciler,
            config,
            state: Mutex::new(state),
        })
    }

    pub fn bookmarks(&self) -> &Arc<dyn BookmarkStore> {
        &self.bookmarks
    }

    pub fn overlay(&self) -> &Arc<LayoutOverlayStore> {
        &self.overlay
    }

    pub fn config(&self) -> &DialConfig {
        &self.config
    }

    // ========================================================================
    // Queries
    // ========================================================================

    pub async fn entries(&self) -> Vec<PanelEntry> {
        self.state.lock().await.entries.clone()
    }

    pub async fn layout(&self) -> LayoutMode {
        self.state.lock().await.layout
    }

    pub async fn grid(&self) -> GridDimensions {
        self.state.lock().await.grid
    }

    pub async fn view(&self) -> View {
        self.state.lock().await.view.clone()
    }

    /// Entries of one panel, sorted by index
    pub async fn get_panel_bookmarks(&self, panel: Panel) -> Vec<PanelEntry> {
        let state = self.state.lock().await;
        panel_entries(&state.entries, panel).into_iter().cloned().collect()
    }

    pub async fn get_panel_bookmark(&self, id: &EntryId) -> Option<PanelEntry> {
        self.state.lock().await.find(id).cloned()
    }

    /// True if the native id is placed on a panel
    pub async fn is_panel_bookmark(&self, id: &str) -> bool {
        self.state
            .lock()
            .await
            .entries
            .iter()
            .any(|e| e.id.is_native(id) && e.is_panel_bookmark)
    }

    /// Index the next add into `panel` would get
    pub async fn next_index_for_panel(&self, panel: Panel) -> usize {
        let state = self.state.lock().await;
        if panel.is_grid() {
            first_free_slot(&state.entries)
        } else {
            next_index_for_panel(&state.entries, panel)
        }
    }

    pub async fn set_target_slot(&self, slot: Option<usize>) {
        self.state.lock().await.target_slot = slot;
    }

    pub async fn target_slot(&self) -> Option<usize> {
        self.state.lock().await.target_slot
    }

    pub async fn is_dragging(&self) -> bool {
        self.state.lock().await.dragging
    }

    // ========================================================================
    // Reconciliation triggers
    // ========================================================================

    /// Set layout and grid, then build the first view
    pub async fn start(&self, layout: LayoutMode, grid: GridDimensions) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        state.layout = layout;
        state.grid = grid;
        self.refresh_locked(&mut state).await
    }

    /// Rebuild the current view. Deferred while a drag is in progress.
    pub async fn refresh(&self) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        self.refresh_locked(&mut state).await
    }

    async fn refresh_locked(&self, state: &mut ManagerState) -> DomainResult<()> {
        if state.dragging {
            debug!("Drag in progress, deferring refresh");
            state.refresh_deferred = true;
            return Ok(());
        }

        let result = match &state.view {
            View::Root => self
                .reconciler
                .reconcile_root(state.layout, state.grid, state.placeholders())
                .await
                .map(|r| r.entries),
            View::Folder(id) => self.reconciler.folder_view(id).await,
        };

        match result {
            Ok(entries) => {
                state.entries = entries;
                Ok(())
            }
            Err(e) => {
                // Keep the last good state; the next trigger retries
                warn!(error = %e, view = ?state.view, "Refresh failed");
                Err(e)
            }
        }
    }

    /// Switch layout mode; the root view is reorganized for it
    pub async fn set_layout(&self, layout: LayoutMode) -> DomainResult<()> {
        let mut state = self.state.lock().await;
        if state.layout == layout {
            return Ok(());
        }
        info!(from = %state.layout, to = %layout, "Layout changed");
        state.layout = layout;
        state.target_slot = None;
        if state.view == View::Root {
            self.refresh_locked(&mut state).await?;
        }
        Ok(())
    }

    pub async fn set_grid(&self, grid: GridDimensions) {
        self.state.lock().await.grid = grid;
    }

    /// Browse a folder; `None` or the bookmarks bar returns to the root view
    pub async fn browse_folder(&self, folder_id: Option<BookmarkId>) -> DomainResult<()> {
        let root = self.reconciler.root_id().await;
        let view = match folder_id {
            Some(id) if id != root => View::Folder(id),
            _ => View::Root,
        };

        let mut state = self.state.lock().await;
        let previous = std::mem::replace(&mut state.view, view);
        if let Err(e) = self.refresh_locked(&mut state).await {
            state.view = previous;
            return Err(e);
        }
        Ok(())
    }

    /// Native change notification
    pub async fn handle_native_event(&self, event: &NativeEvent) {
        let mut state = self.state.lock().await;
        if state.view != View::Root {
            if let Err(e) = self.refresh_locked(&mut state).await {
                warn!(error = %e, "Folder refresh after native event failed");
            }
            return;
        }
        // Content edits apply mid-drag; structure waits for the drop
        if state.dragging && !matches!(event, NativeEvent::Changed { .. }) {
            state.refresh_deferred = true;
            return;
        }

        let layout = state.layout;
        match self.reconciler.apply_native_event(&mut state.entries, event, layout).await {
            Ok(true) => self.persist(&state).await,
            Ok(false) => {}
            Err(e) => warn!(error = %e, id = %event.id(), "Failed to apply native event"),
        }
    }

    /// Overlay written by another tab: replace the whole list, no merge
    pub async fn handle_storage_event(&self, event: &StorageEvent) {
        if event.origin == self.overlay.origin() || event.key != PANEL_BOOKMARKS_KEY {
            return;
        }

        let mut state = self.state.lock().await;
        if state.view != View::Root {
            return;
        }
        if state.dragging {
            state.refresh_deferred = true;
            return;
        }

        let incoming = match event.new_value.as_deref() {
            Some(raw) => match parse_entries(raw) {
                Ok(entries) => entries,
                Err(e) => {
                    warn!(error = %e, "Ignoring unreadable overlay from another tab");
                    return;
                }
            },
            None => Vec::new(),
        };

        // Our pending snapshot is older than what the other tab wrote
        self.overlay.cancel_pending().await;
        let placeholders = state.placeholders();
        info!(count = incoming.len(), origin = event.origin, "Replacing overlay from another tab");
        state.entries = incoming;
        state.entries.extend(placeholders);
    }

    // ========================================================================
    // Drag lifecycle
    // ========================================================================

    pub async fn begin_drag(&self) {
        self.state.lock().await.dragging = true;
    }

    /// Drag finished; run any refresh that arrived during the gesture
    pub async fn end_drag(&self) {
        let mut state = self.state.lock().await;
        state.dragging = false;
        if std::mem::take(&mut state.refresh_deferred) {
            if let Err(e) = self.refresh_locked(&mut state).await {
                warn!(error = %e, "Deferred refresh failed");
            }
        }
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    async fn persist(&self, state: &ManagerState) {
        if state.view == View::Root {
            self.overlay.schedule_save(state.entries.clone(), state.layout).await;
        }
    }

    /// Apply an arrangement to a copy of the list; on error nothing changes
    async fn arrange<F>(&self, op: F) -> DomainResult<()>
    where
        F: FnOnce(&mut Vec<PanelEntry>) -> DomainResult<()> + Send,
    {
        let mut state = self.state.lock().await;
        let mut next = state.entries.clone();
        op(&mut next)?;
        state.entries = next;
        self.persist(&state).await;
        Ok(())
    }

    pub async fn add_bookmark_to_panel(&self, title: &str, url: &str, panel: Panel) -> DomainResult<PanelEntry> {
        if url.trim().is_empty() {
            return Err(DomainError::InvalidInput("url is required".to_string()));
        }
        self.add_entry(title, Some(url), panel).await
    }

    pub async fn add_folder_to_panel(&self, title: &str, panel: Panel) -> DomainResult<PanelEntry> {
        self.add_entry(title, None, panel).await
    }

    /// Show a placeholder at once, create natively, then commit or roll back
    async fn add_entry(&self, title: &str, url: Option<&str>, panel: Panel) -> DomainResult<PanelEntry> {
        let title = title.trim();
        if title.is_empty() {
            return Err(DomainError::InvalidInput("title is required".to_string()));
        }

        let (placeholder, parent, panel, index) = {
            let mut state = self.state.lock().await;
            let (parent, panel) = match &state.view {
                View::Root => (self.reconciler.root_id().await, panel),
                View::Folder(id) => (id.clone(), Panel::Folder),
            };
            state.check_panel(panel)?;

            let index = if panel.is_grid() {
                match state.target_slot.take() {
                    Some(slot) if is_slot_free(&state.entries, slot, None) => slot,
                    _ => first_free_slot(&state.entries),
                }
            } else {
                next_index_for_panel(&state.entries, panel)
            };

            state.next_placeholder += 1;
            let id = EntryId::Placeholder(state.next_placeholder);
            let entry = match url {
                Some(url) => PanelEntry::new_bookmark(id.clone(), title, url, panel, index),
                None => PanelEntry::new_folder(id.clone(), title, panel, index),
            };
            state.entries.push(entry);
            (id, parent, panel, index)
        };

        let request = match url {
            Some(url) => NewBookmark::bookmark(title, &normalize_url(url), &parent),
            None => NewBookmark::folder(title, &parent),
        };

        let node = match self.bookmarks.create(&request).await {
            Ok(node) => node,
            Err(e) => {
                let mut state = self.state.lock().await;
                arrange::remove_entry(&mut state.entries, &placeholder);
                warn!(error = %e, title, "Create failed, placeholder rolled back");
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        // The created notification may have placed it already
        remove_native(&mut state.entries, &node.id);
        let Some(pos) = state.entries.iter().position(|e| e.id == placeholder) else {
            debug!(id = %node.id, "View changed while creating, next refresh places it");
            return Ok(PanelEntry::from_node(&node, panel, index));
        };
        let entry = &mut state.entries[pos];
        entry.id = EntryId::committed(node.id.clone());
        entry.sync_from_node(&node);
        if claim_slot(&mut state.entries, pos) {
            debug!(id = %node.id, "Moved an entry off the committed slot");
        }
        let committed = state.entries[pos].clone();
        self.persist(&state).await;

        info!(id = %node.id, panel = %committed.panel, index = committed.index, "Added panel entry");
        Ok(committed)
    }

    /// Update natively, then mirror into the overlay. A vanished id is
    /// pruned from the overlay.
    pub async fn update_panel_bookmark(
        &self,
        id: &str,
        changes: BookmarkChanges,
        panel: Option<Panel>,
    ) -> DomainResult<PanelEntry> {
        if changes.title.as_deref().map(str::trim) == Some("") {
            return Err(DomainError::InvalidInput("title is required".to_string()));
        }
        {
            let state = self.state.lock().await;
            if !state.entries.iter().any(|e| e.id.is_native(id)) {
                return Err(DomainError::NotFound(format!("Panel entry {} not found", id)));
            }
            if let Some(panel) = panel {
                state.check_panel(panel)?;
            }
        }

        let changes = BookmarkChanges {
            title: changes.title.map(|t| t.trim().to_string()),
            url: changes.url.map(|u| normalize_url(&u)),
        };
        let node = match self.bookmarks.update(id, &changes).await {
            Ok(node) => node,
            Err(e) => {
                if e.is_prunable() {
                    let mut state = self.state.lock().await;
                    if remove_native(&mut state.entries, id) {
                        self.persist(&state).await;
                    }
                }
                return Err(e);
            }
        };

        let mut state = self.state.lock().await;
        let entry_id = EntryId::committed(id);
        let Some(entry) = state.entries.iter_mut().find(|e| e.id == entry_id) else {
            return Err(DomainError::NotFound(format!("Panel entry {} not found", id)));
        };
        entry.sync_from_node(&node);
        let moves = panel.filter(|p| *p != entry.panel);

        if let Some(target) = moves {
            let mut next = state.entries.clone();
            arrange::drop_on_panel_end(&mut next, &entry_id, target)?;
            state.entries = next;
        }
        self.persist(&state).await;

        state
            .find(&entry_id)
            .cloned()
            .ok_or_else(|| DomainError::NotFound(format!("Panel entry {} not found", id)))
    }

    /// Delete natively (missing ids count as deleted), then drop the entry
    pub async fn delete_panel_bookmark(&self, id: &str) -> DomainResult<()> {
        self.bookmarks.delete(id).await?;

        let mut state = self.state.lock().await;
        if remove_native(&mut state.entries, id) {
            self.persist(&state).await;
            info!(id, "Deleted panel entry");
        }
        Ok(())
    }

    pub async fn reorder_within_panel(&self, id: &EntryId, index: usize) -> DomainResult<()> {
        self.arrange(|entries| arrange::reorder_within_panel(entries, id, index)).await
    }

    pub async fn move_across_panels(&self, id: &EntryId, panel: Panel, index: usize) -> DomainResult<()> {
        self.state.lock().await.check_panel(panel)?;
        self.arrange(|entries| arrange::move_across_panels(entries, id, panel, index)).await
    }

    /// Full-screen only; the slot must lie on the grid
    pub async fn drop_on_slot(&self, id: &EntryId, slot: usize) -> DomainResult<()> {
        {
            let state = self.state.lock().await;
            if !state.layout.is_full_screen() || state.view != View::Root {
                return Err(DomainError::InvalidInput("slot drops need the full-screen layout".to_string()));
            }
            if slot >= state.grid.total_slots() {
                return Err(DomainError::InvalidInput(format!(
                    "slot {} is outside the {}x{} grid",
                    slot, state.grid.cols, state.grid.rows
                )));
            }
        }
        self.arrange(|entries| arrange::drop_on_slot(entries, id, slot)).await
    }

    pub async fn drop_on_panel_end(&self, id: &EntryId, panel: Panel) -> DomainResult<()> {
        self.state.lock().await.check_panel(panel)?;
        self.arrange(|entries| arrange::drop_on_panel_end(entries, id, panel)).await
    }

    /// Native move into a folder; the entry leaves the panels
    pub async fn move_into_folder(&self, id: &EntryId, folder_id: &str) -> DomainResult<()> {
        let native = id
            .native()
            .ok_or_else(|| DomainError::InvalidInput(format!("{} is still being created", id)))?;
        if native == folder_id {
            return Err(DomainError::InvalidParent(folder_id.to_string()));
        }
        self.bookmarks.move_to(native, folder_id).await?;

        let mut state = self.state.lock().await;
        if arrange::remove_entry(&mut state.entries, id).is_some() {
            self.persist(&state).await;
        }
        info!(id = native, folder = folder_id, "Moved into folder");
        Ok(())
    }

    /// Breadcrumb drop while browsing a folder: move natively to `parent_id`
    /// and, when that is the bookmarks bar, give the entry back a panel.
    /// The panel is the browsed folder's own panel if it has one, else
    /// `original_panel`.
    pub async fn move_to_parent(&self, id: &EntryId, original_panel: Panel, parent_id: &str) -> DomainResult<()> {
        let native = id
            .native()
            .ok_or_else(|| DomainError::InvalidInput(format!("{} is still being created", id)))?;
        let (current_folder, layout) = {
            let state = self.state.lock().await;
            match &state.view {
                View::Folder(folder) => (folder.clone(), state.layout),
                View::Root => {
                    return Err(DomainError::InvalidInput("not browsing a folder".to_string()));
                }
            }
        };

        self.bookmarks.move_to(native, parent_id).await?;
        {
            let mut state = self.state.lock().await;
            arrange::remove_entry(&mut state.entries, id);
        }

        let root = self.reconciler.root_id().await;
        if parent_id != root {
            return Ok(());
        }
        let node = self
            .bookmarks
            .get(native)
            .await?
            .ok_or_else(|| DomainError::NotFound(format!("Bookmark {} not found", native)))?;

        let mut overlay = self.overlay.load_latest().await;
        remove_native(&mut overlay, native);
        let panel = overlay
            .iter()
            .find(|e| e.id.is_native(&current_folder))
            .map(|e| e.panel)
            .unwrap_or(original_panel);
        let panel = if layout.contains(panel) { panel } else { layout.first_panel() };
        let index = if panel.is_grid() {
            first_free_slot(&overlay)
        } else {
            next_index_for_panel(&overlay, panel)
        };
        overlay.push(PanelEntry::from_node(&node, panel, index));
        self.overlay.schedule_save(overlay, layout).await;

        info!(id = native, panel = %panel, index, "Moved back to the bookmarks bar");
        Ok(())
    }

    // ========================================================================
    // Persistence helpers
    // ========================================================================

    /// Write any debounced save now
    pub async fn flush(&self) -> Option<bool> {
        self.overlay.flush().await
    }

    /// The root overlay, even while a folder is being browsed
    pub async fn overlay_entries(&self) -> Vec<PanelEntry> {
        {
            let state = self.state.lock().await;
            if state.view == View::Root {
                return state.entries.iter().filter(|e| !e.id.is_placeholder()).cloned().collect();
            }
        }
        self.overlay.load_latest().await
    }

    pub async fn export_panel_bookmarks(&self) -> DomainResult<String> {
        Ok(serde_json::to_string_pretty(&self.overlay_entries().await)?)
    }

    /// Replace the overlay with exported JSON; returns the entry count
    pub async fn import_panel_bookmarks(&self, json: &str) -> DomainResult<usize> {
        let entries = parse_entries(json)?;
        let count = entries.len();
        self.install_overlay(entries).await?;
        Ok(count)
    }

    /// Persist a whole overlay immediately and rebuild the root view from it
    async fn install_overlay(&self, mut entries: Vec<PanelEntry>) -> DomainResult<()> {
        super::placement::resolve_slot_collisions(&mut entries);
        let mut state = self.state.lock().await;
        if !self.overlay.save_now(&entries, state.layout).await {
            warn!("Installed overlay only reached the session backup");
        }
        if state.view == View::Root {
            let placeholders = state.placeholders();
            state.entries = entries;
            state.entries.extend(placeholders);
            self.refresh_locked(&mut state).await?;
        }
        Ok(())
    }

    pub async fn export_backup(&self, settings: AppearanceSettings) -> BackupDocument {
        let (grid, layout) = {
            let state = self.state.lock().await;
            (state.grid, state.layout)
        };
        BackupDocument::new(settings, self.overlay_entries().await, grid, layout)
    }

    /// Recreate the backed-up entries natively (reusing duplicates) and
    /// install the rebuilt overlay
    pub async fn restore_backup(&self, document: &BackupDocument) -> DomainResult<RestoreReport> {
        let root = self.reconciler.root_id().await;
        let (entries, report) =
            backup::restore_entries(self.bookmarks.as_ref(), &root, &document.panel_bookmarks).await?;
        self.install_overlay(entries).await?;
        info!(
            created = report.created,
            reused = report.reused,
            failed = report.failed,
            "Restored backup"
        );
        Ok(report)
    }
}
