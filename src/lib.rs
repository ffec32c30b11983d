//! Speed Dial Backend
//!
//! Layered architecture:
//! - domain: Panel entries, layouts, native bookmark types and errors
//! - repository: Native bookmark tree and key-value storage abstractions
//! - services: Overlay persistence, reconciliation, organization, drag/drop
//! - commands: String-typed handlers for the page front end

use std::path::Path;
use std::sync::Arc;
use tracing::info;

pub mod commands;
pub mod config;
pub mod domain;
pub mod repository;
pub mod services;

use config::DialConfig;
use domain::{DomainResult, GridDimensions, LayoutMode};
use repository::{BookmarkStore, KeyValueStore, LocalStorage, SqliteKvStore};
use services::{spawn_sync, DragDropController, PanelBookmarkManager, SyncTasks};

/// Application state shared across commands
pub struct AppState {
    pub manager: Arc<PanelBookmarkManager>,
    sync: SyncTasks,
}

impl AppState {
    /// Build the manager, load the first view and start listening for
    /// native and cross-tab changes
    pub async fn start(
        bookmarks: Arc<dyn BookmarkStore>,
        primary: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        config: DialConfig,
        layout: LayoutMode,
        grid: GridDimensions,
    ) -> DomainResult<Self> {
        let manager = PanelBookmarkManager::new(bookmarks, primary, session, config);
        manager.start(layout, grid).await?;
        let sync = spawn_sync(Arc::clone(&manager));
        info!(layout = %layout, cols = grid.cols, rows = grid.rows, "Speed dial started");
        Ok(Self { manager, sync })
    }

    /// Durable profile: overlay in a SQLite file, session backup in memory
    pub async fn open(
        db_path: &Path,
        bookmarks: Arc<dyn BookmarkStore>,
        config: DialConfig,
        layout: LayoutMode,
    ) -> DomainResult<Self> {
        let primary = Arc::new(SqliteKvStore::open(db_path)?);
        let session = Arc::new(LocalStorage::new());
        let grid = config.default_grid;
        Self::start(bookmarks, primary, session, config, layout, grid).await
    }

    /// Gesture controller using the configured drag threshold
    pub fn drag_controller(&self) -> DragDropController {
        DragDropController::new(Arc::clone(&self.manager), self.manager.config().drag_threshold_px)
    }

    /// Stop listeners and write any pending save
    pub async fn shutdown(&self) {
        self.sync.stop();
        self.manager.flush().await;
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    /// Route log output through the test harness
    pub fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_test_writer()
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PANEL_BOOKMARKS_KEY;
    use crate::domain::{NewBookmark, Panel};
    use crate::repository::{MemoryBookmarkStore, BOOKMARKS_BAR_ID};

    #[tokio::test]
    async fn test_open_durable_profile() {
        test_support::init_tracing();
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("speed_dial.db");
        let bookmarks = Arc::new(MemoryBookmarkStore::new());
        bookmarks
            .create(&NewBookmark::bookmark("Docs", "https://docs.rs", BOOKMARKS_BAR_ID))
            .await
            .unwrap();

        let state = AppState::open(&db_path, bookmarks.clone(), DialConfig::default(), LayoutMode::TwoPanel)
            .await
            .unwrap();
        let entries = state.manager.get_panel_bookmarks(Panel::TopLeft).await;
        assert_eq!(entries.len(), 1);
        state.shutdown().await;

        let reopened = SqliteKvStore::open(&db_path).unwrap();
        let raw = reopened.get(PANEL_BOOKMARKS_KEY).await.unwrap().unwrap();
        assert!(raw.contains("https://docs.rs"));
    }
}
