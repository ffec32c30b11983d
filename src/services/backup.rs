//! Backup and Restore
//!
//! A backup file carries the appearance settings flattened at top level,
//! the panel overlay, the grid shape and a few counts for diagnostics.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use tracing::{debug, warn};

use crate::domain::{
    normalize_url, AppearanceSettings, BookmarkId, BookmarkNode, DomainResult, GridDimensions,
    LayoutMode, NewBookmark, Panel, PanelEntry,
};
use crate::repository::BookmarkStore;

pub const BACKUP_VERSION: &str = "2.2";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BackupDocument {
    #[serde(flatten)]
    pub settings: AppearanceSettings,
    #[serde(default, deserialize_with = "lenient_entries")]
    pub panel_bookmarks: Vec<PanelEntry>,
    #[serde(default)]
    pub grid_dimensions: GridDimensions,
    #[serde(default = "legacy_version")]
    pub backup_version: String,
    #[serde(default)]
    pub timestamp: String,
    #[serde(default)]
    pub grid_layout_at_backup: LayoutMode,
    #[serde(default)]
    pub total_bookmarks: usize,
    /// Entries per persisted panel
    #[serde(default)]
    pub layout_stats: BTreeMap<String, usize>,
}

fn legacy_version() -> String {
    "1.0".to_string()
}

/// Keep the entries that decode; files edited by hand may hold junk
fn lenient_entries<'de, D>(deserializer: D) -> Result<Vec<PanelEntry>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Vec<serde_json::Value> = Vec::deserialize(deserializer)?;
    let total = raw.len();
    let entries: Vec<PanelEntry> = raw
        .into_iter()
        .filter_map(|value| serde_json::from_value::<PanelEntry>(value).ok())
        .filter(|e| !e.id.to_string().is_empty() && e.panel != Panel::Folder)
        .map(PanelEntry::normalized)
        .collect();
    if entries.len() < total {
        warn!(dropped = total - entries.len(), "Skipped invalid backup entries");
    }
    Ok(entries)
}

impl BackupDocument {
    pub fn new(
        settings: AppearanceSettings,
        entries: Vec<PanelEntry>,
        grid: GridDimensions,
        layout: LayoutMode,
    ) -> Self {
        let layout_stats = Panel::PERSISTED
            .iter()
            .map(|p| (p.as_str().to_string(), entries.iter().filter(|e| e.panel == *p).count()))
            .collect();
        Self {
            settings,
            total_bookmarks: entries.len(),
            panel_bookmarks: entries,
            grid_dimensions: grid,
            backup_version: BACKUP_VERSION.to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            grid_layout_at_backup: layout,
            layout_stats,
        }
    }

    pub fn to_json(&self) -> DomainResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> DomainResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Outcome counts of a restore
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestoreReport {
    pub created: usize,
    pub reused: usize,
    pub failed: usize,
}

impl RestoreReport {
    pub fn is_complete(&self) -> bool {
        self.failed == 0
    }
}

fn same_node(entry: &PanelEntry, node: &BookmarkNode) -> bool {
    if entry.title != node.title || entry.is_folder() != node.is_folder() {
        return false;
    }
    match (&entry.url, &node.url) {
        (Some(a), Some(b)) => normalize_url(a) == normalize_url(b),
        (None, None) => true,
        _ => false,
    }
}

/// Resolve each backed-up entry to a native id under `root`: reuse a
/// matching child (title, url and parent) or create one. Entries keep their
/// panel and index. Failures are counted, not fatal.
pub async fn restore_entries(
    store: &dyn BookmarkStore,
    root: &str,
    entries: &[PanelEntry],
) -> DomainResult<(Vec<PanelEntry>, RestoreReport)> {
    let existing = store.list_children(root).await?;
    let mut claimed: HashSet<BookmarkId> = HashSet::new();
    let mut report = RestoreReport::default();
    let mut restored = Vec::with_capacity(entries.len());

    for entry in entries {
        let reuse = existing
            .iter()
            .find(|node| !claimed.contains(&node.id) && same_node(entry, node));

        let node = match reuse {
            Some(node) => {
                report.reused += 1;
                node.clone()
            }
            None => {
                let request = match &entry.url {
                    Some(url) => NewBookmark::bookmark(&entry.title, url, root),
                    None => NewBookmark::folder(&entry.title, root),
                };
                match store.create(&request).await {
                    Ok(node) => {
                        report.created += 1;
                        node
                    }
                    Err(e) => {
                        warn!(title = %entry.title, error = %e, "Could not restore entry");
                        report.failed += 1;
                        continue;
                    }
                }
            }
        };

        claimed.insert(node.id.clone());
        restored.push(PanelEntry::from_node(&node, entry.panel, entry.index));
    }

    debug!(?report, "Resolved backup entries");
    Ok((restored, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::EntryId;
    use crate::repository::{MemoryBookmarkStore, BOOKMARKS_BAR_ID};

    #[test]
    fn test_document_shape() {
        let entries = vec![
            PanelEntry::new_bookmark(EntryId::committed("1"), "A", "a.test", Panel::TopLeft, 0),
            PanelEntry::new_folder(EntryId::committed("2"), "F", Panel::BottomFull, 0),
        ];
        let doc = BackupDocument::new(AppearanceSettings::default(), entries, GridDimensions::default(), LayoutMode::ThreePanel);
        let json: serde_json::Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();

        assert_eq!(json["backupVersion"], "2.2");
        assert_eq!(json["totalBookmarks"], 2);
        assert_eq!(json["layoutStats"]["bottom-full"], 1);
        assert_eq!(json["gridDimensions"]["cols"], 10);
        assert_eq!(json["gridLayoutAtBackup"], "3-panel");
        // Settings sit at the top level
        assert_eq!(json["wallpaper"], "dark-wallpaper");
    }

    #[test]
    fn test_invalid_entries_skipped() {
        let raw = r#"{
            "gridLayout": "2-panel",
            "panelBookmarks": [
                {"id": "1", "title": "ok", "panel": "top-left", "index": 0},
                {"id": "2", "title": "no panel"},
                {"title": "no id", "panel": "top-left", "index": 1}
            ]
        }"#;
        let doc = BackupDocument::from_json(raw).unwrap();
        assert_eq!(doc.panel_bookmarks.len(), 1);
        assert_eq!(doc.backup_version, "1.0");
        assert_eq!(doc.settings.grid_layout, LayoutMode::TwoPanel);
    }

    #[tokio::test]
    async fn test_restore_reuses_duplicates() {
        let store = MemoryBookmarkStore::new();
        let existing = store
            .create(&NewBookmark::bookmark("A", "https://a.test", BOOKMARKS_BAR_ID))
            .await
            .unwrap();

        let entries = vec![
            PanelEntry::new_bookmark(EntryId::committed("old-1"), "A", "a.test", Panel::TopRight, 3),
            PanelEntry::new_bookmark(EntryId::committed("old-2"), "B", "b.test", Panel::TopLeft, 0),
            PanelEntry::new_folder(EntryId::committed("old-3"), "F", Panel::TopLeft, 1),
        ];
        let (restored, report) = restore_entries(&store, BOOKMARKS_BAR_ID, &entries).await.unwrap();

        assert_eq!(report, RestoreReport { created: 2, reused: 1, failed: 0 });
        assert_eq!(restored[0].id, EntryId::committed(existing.id));
        assert_eq!((restored[0].panel, restored[0].index), (Panel::TopRight, 3));
        assert!(restored[2].is_folder());
        assert_eq!(store.list_children(BOOKMARKS_BAR_ID).await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_restore_counts_failures() {
        let store = MemoryBookmarkStore::new();
        store.set_fail_create(true);
        let entries = vec![PanelEntry::new_bookmark(EntryId::committed("x"), "X", "x.test", Panel::TopLeft, 0)];

        let (restored, report) = restore_entries(&store, BOOKMARKS_BAR_ID, &entries).await.unwrap();
        assert!(restored.is_empty());
        assert_eq!(report.failed, 1);
        assert!(!report.is_complete());
    }
}
