//! Layout Overlay Store
//!
//! Persists the panel/index overlay as JSON under `panel-bookmarks`.
//! Writes are debounced; a failed write is retried against the session
//! store under the `_backup` key so the layout survives the session.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::organizer::OrganizeState;
use crate::config::{backup_key, HAS_ORGANIZED_KEY, ORGANIZED_LAYOUT_KEY, PANEL_BOOKMARKS_KEY};
use crate::domain::{dedupe_by_id, DomainError, DomainResult, LayoutMode, Panel, PanelEntry};
use crate::repository::KeyValueStore;

struct PendingSave {
    entries: Vec<PanelEntry>,
    layout: LayoutMode,
    handle: JoinHandle<()>,
}

pub struct LayoutOverlayStore {
    primary: Arc<dyn KeyValueStore>,
    session: Arc<dyn KeyValueStore>,
    debounce: Duration,
    pending: Mutex<Option<PendingSave>>,
    /// Held from taking a snapshot until its write is verified and recorded
    writing: Mutex<()>,
}

/// Only committed entries in real panels are written
fn persistable(entries: &[PanelEntry]) -> Vec<&PanelEntry> {
    entries
        .iter()
        .filter(|e| !e.id.is_placeholder() && e.panel != Panel::Folder)
        .collect()
}

impl LayoutOverlayStore {
    pub fn new(primary: Arc<dyn KeyValueStore>, session: Arc<dyn KeyValueStore>, debounce: Duration) -> Self {
        Self {
            primary,
            session,
            debounce,
            pending: Mutex::new(None),
            writing: Mutex::new(()),
        }
    }

    /// Origin of the primary store; storage events carrying it are our own
    pub fn origin(&self) -> u64 {
        self.primary.origin()
    }

    pub fn primary(&self) -> &Arc<dyn KeyValueStore> {
        &self.primary
    }

    /// Read the persisted overlay. Missing data falls back to the session
    /// backup; corrupted data is cleared and reads as empty.
    pub async fn load(&self) -> Vec<PanelEntry> {
        let raw = match self.primary.get(PANEL_BOOKMARKS_KEY).await {
            Ok(Some(raw)) => Some((raw, false)),
            Ok(None) => self.read_backup().await.map(|raw| (raw, true)),
            Err(e) => {
                warn!(error = %e, "Failed to read overlay, trying session backup");
                self.read_backup().await.map(|raw| (raw, true))
            }
        };
        let Some((raw, from_backup)) = raw else {
            return Vec::new();
        };

        match parse_entries(&raw) {
            Ok(entries) => {
                debug!(count = entries.len(), from_backup, "Loaded overlay");
                entries
            }
            Err(e) => {
                warn!(error = %e, from_backup, "Discarding corrupted overlay");
                let store = if from_backup { &self.session } else { &self.primary };
                let key = if from_backup { backup_key(PANEL_BOOKMARKS_KEY) } else { PANEL_BOOKMARKS_KEY.to_string() };
                if let Err(e) = store.remove(&key).await {
                    warn!(error = %e, "Failed to clear corrupted overlay");
                }
                Vec::new()
            }
        }
    }

    /// Latest overlay: the pending debounced snapshot if any, else storage
    pub async fn load_latest(&self) -> Vec<PanelEntry> {
        if let Some(pending) = self.pending.lock().await.as_ref() {
            return persistable(&pending.entries).into_iter().cloned().collect();
        }
        self.load().await
    }

    async fn read_backup(&self) -> Option<String> {
        match self.session.get(&backup_key(PANEL_BOOKMARKS_KEY)).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "Failed to read session backup");
                None
            }
        }
    }

    /// Write the overlay now. Never fails the caller: returns false when the
    /// primary write could not be verified (the session backup was tried).
    pub async fn save(&self, entries: &[PanelEntry], layout: LayoutMode) -> bool {
        let _writing = self.writing.lock().await;
        self.write(entries, layout).await
    }

    /// Caller holds `writing`
    async fn write(&self, entries: &[PanelEntry], layout: LayoutMode) -> bool {
        let json = match serde_json::to_string(&persistable(entries)) {
            Ok(json) => json,
            Err(e) => {
                warn!(error = %e, "Failed to serialize overlay");
                return false;
            }
        };

        match self.write_verified(&json).await {
            Ok(()) => {
                self.record_organized(layout).await;
                debug!(count = entries.len(), layout = %layout, "Saved overlay");
                true
            }
            Err(e) => {
                warn!(error = %e, "Overlay save failed, writing session backup");
                if let Err(e) = self.session.set(&backup_key(PANEL_BOOKMARKS_KEY), &json).await {
                    warn!(error = %e, "Session backup failed too");
                }
                false
            }
        }
    }

    async fn write_verified(&self, json: &str) -> DomainResult<()> {
        self.primary.set(PANEL_BOOKMARKS_KEY, json).await?;
        match self.primary.get(PANEL_BOOKMARKS_KEY).await? {
            Some(stored) if stored == json => Ok(()),
            _ => Err(DomainError::Persistence("overlay read-back did not match".to_string())),
        }
    }

    async fn record_organized(&self, layout: LayoutMode) {
        let results = [
            self.primary.set(ORGANIZED_LAYOUT_KEY, layout.as_str()).await,
            self.primary.set(HAS_ORGANIZED_KEY, "true").await,
        ];
        for result in results {
            if let Err(e) = result {
                warn!(error = %e, "Failed to record organized layout");
            }
        }
    }

    pub async fn organize_state(&self) -> OrganizeState {
        let last_organized = match self.primary.get(ORGANIZED_LAYOUT_KEY).await {
            Ok(value) => value.as_deref().and_then(LayoutMode::from_str),
            Err(e) => {
                warn!(error = %e, "Failed to read organized layout");
                None
            }
        };
        let has_organized = matches!(self.primary.get(HAS_ORGANIZED_KEY).await, Ok(Some(v)) if v == "true");
        OrganizeState { last_organized, has_organized }
    }

    /// Debounced save. Each call restarts the window; only the most recent
    /// snapshot is written.
    pub async fn schedule_save(self: &Arc<Self>, entries: Vec<PanelEntry>, layout: LayoutMode) {
        let mut pending = self.pending.lock().await;
        if let Some(previous) = pending.take() {
            previous.handle.abort();
        }

        let store = Arc::clone(self);
        let handle = tokio::spawn(async move {
            tokio::time::sleep(store.debounce).await;
            let _writing = store.writing.lock().await;
            let due = store.pending.lock().await.take();
            if let Some(due) = due {
                store.write(&due.entries, due.layout).await;
            }
        });
        *pending = Some(PendingSave { entries, layout, handle });
    }

    pub async fn has_pending(&self) -> bool {
        self.pending.lock().await.is_some()
    }

    /// Drop a scheduled save without writing it
    pub async fn cancel_pending(&self) {
        if let Some(previous) = self.pending.lock().await.take() {
            previous.handle.abort();
            info!("Discarded pending overlay save");
        }
    }

    /// Write a scheduled save immediately. `None` when nothing was pending.
    pub async fn flush(&self) -> Option<bool> {
        let _writing = self.writing.lock().await;
        let due = self.pending.lock().await.take()?;
        due.handle.abort();
        Some(self.write(&due.entries, due.layout).await)
    }

    /// Cancel any scheduled save and write `entries` now
    pub async fn save_now(&self, entries: &[PanelEntry], layout: LayoutMode) -> bool {
        let _writing = self.writing.lock().await;
        if let Some(previous) = self.pending.lock().await.take() {
            previous.handle.abort();
        }
        self.write(entries, layout).await
    }
}

/// Decode a stored overlay, dropping duplicate ids and synthetic entries
pub fn parse_entries(raw: &str) -> DomainResult<Vec<PanelEntry>> {
    let parsed: Vec<PanelEntry> = serde_json::from_str(raw)?;
    Ok(dedupe_by_id(
        parsed
            .into_iter()
            .map(PanelEntry::normalized)
            .filter(|e| e.panel != Panel::Folder),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryId;
    use crate::repository::{LocalStorage, StorageEvent};
    use async_trait::async_trait;
    use tokio::sync::broadcast;

    /// Writes land at once but are acknowledged late
    struct SlowAckStore {
        inner: LocalStorage,
        ack: Duration,
    }

    #[async_trait]
    impl KeyValueStore for SlowAckStore {
        async fn get(&self, key: &str) -> DomainResult<Option<String>> {
            self.inner.get(key).await
        }

        async fn set(&self, key: &str, value: &str) -> DomainResult<()> {
            self.inner.set(key, value).await?;
            tokio::time::sleep(self.ack).await;
            Ok(())
        }

        async fn remove(&self, key: &str) -> DomainResult<()> {
            self.inner.remove(key).await
        }

        fn origin(&self) -> u64 {
            self.inner.origin()
        }

        fn subscribe(&self) -> broadcast::Receiver<StorageEvent> {
            self.inner.subscribe()
        }
    }

    fn store(primary: &LocalStorage, session: &LocalStorage) -> Arc<LayoutOverlayStore> {
        Arc::new(LayoutOverlayStore::new(
            Arc::new(primary.clone()),
            Arc::new(session.clone()),
            Duration::from_millis(300),
        ))
    }

    fn entry(id: &str, index: usize) -> PanelEntry {
        PanelEntry::new_bookmark(EntryId::committed(id), id, "a.test", Panel::TopLeft, index)
    }

    #[tokio::test]
    async fn test_corrupted_overlay_is_cleared() {
        let primary = LocalStorage::new();
        primary.seed(PANEL_BOOKMARKS_KEY, "{not json").await;
        let overlay = store(&primary, &LocalStorage::new());

        assert!(overlay.load().await.is_empty());
        assert_eq!(primary.get(PANEL_BOOKMARKS_KEY).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_save_records_layout_and_skips_placeholders() {
        let primary = LocalStorage::new();
        let overlay = store(&primary, &LocalStorage::new());
        let mut placeholder = entry("x", 1);
        placeholder.id = EntryId::Placeholder(1);

        assert!(overlay.save(&[entry("1", 0), placeholder], LayoutMode::TwoPanel).await);

        let loaded = overlay.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(
            overlay.organize_state().await,
            OrganizeState::organized(LayoutMode::TwoPanel)
        );
    }

    #[tokio::test]
    async fn test_failed_save_falls_back_to_session() {
        let primary = LocalStorage::new();
        let session = LocalStorage::new();
        let overlay = store(&primary, &session);
        primary.set_fail_writes(true);

        assert!(!overlay.save(&[entry("1", 0)], LayoutMode::FourPanel).await);
        assert!(session.get("panel-bookmarks_backup").await.unwrap().is_some());

        // Primary is empty, so the backup is read
        let loaded = overlay.load().await;
        assert_eq!(loaded[0].id, EntryId::committed("1"));
        assert!(!overlay.organize_state().await.has_organized);
    }

    #[tokio::test]
    async fn test_duplicate_ids_dropped_on_parse() {
        let raw = r#"[{"id":"1","title":"a","panel":"top-left","index":0},
                      {"id":"1","title":"b","panel":"top-right","index":0}]"#;
        let entries = parse_entries(raw).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].panel, Panel::TopLeft);
    }

    #[tokio::test(start_paused = true)]
    async fn test_flush_writes_pending_snapshot() {
        let primary = LocalStorage::new();
        let overlay = store(&primary, &LocalStorage::new());

        overlay.schedule_save(vec![entry("1", 0)], LayoutMode::TwoPanel).await;
        assert!(overlay.has_pending().await);
        assert_eq!(overlay.load_latest().await.len(), 1);
        assert_eq!(primary.write_count(PANEL_BOOKMARKS_KEY).await, 0);

        assert_eq!(overlay.flush().await, Some(true));
        assert_eq!(primary.write_count(PANEL_BOOKMARKS_KEY).await, 1);
        assert_eq!(overlay.flush().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_debounced_write_in_flight_finishes_before_newer_save() {
        let primary = LocalStorage::new();
        let session = LocalStorage::new();
        let slow = SlowAckStore { inner: primary.clone(), ack: Duration::from_millis(50) };
        let overlay = Arc::new(LayoutOverlayStore::new(
            Arc::new(slow),
            Arc::new(session.clone()),
            Duration::from_millis(300),
        ));

        overlay.schedule_save(vec![entry("old", 0)], LayoutMode::TwoPanel).await;
        // The timer has taken the snapshot and is waiting on its write
        tokio::time::sleep(Duration::from_millis(310)).await;
        assert!(!overlay.has_pending().await);

        assert!(overlay.save_now(&[entry("new", 0)], LayoutMode::TwoPanel).await);
        tokio::time::sleep(Duration::from_millis(500)).await;

        let loaded = overlay.load().await;
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, EntryId::committed("new"));
        assert_eq!(session.get("panel-bookmarks_backup").await.unwrap(), None);
    }
}
