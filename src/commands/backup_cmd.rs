//! Commands for Export, Import and Backup Files

use crate::domain::AppearanceSettings;
use crate::services::{BackupDocument, RestoreReport};
use crate::AppState;

/// The bare overlay as pretty JSON
pub async fn export_panel_bookmarks(state: &AppState) -> Result<String, String> {
    state.manager.export_panel_bookmarks().await.map_err(|e| e.to_string())
}

/// Replace the overlay with previously exported JSON; returns the entry count
pub async fn import_panel_bookmarks(state: &AppState, json: String) -> Result<usize, String> {
    state
        .manager
        .import_panel_bookmarks(&json)
        .await
        .map_err(|e| e.to_string())
}

/// Full backup file. `settings` is the page's appearance settings as JSON;
/// missing fields take their defaults.
pub async fn export_backup(state: &AppState, settings: Option<String>) -> Result<String, String> {
    let settings = match settings {
        Some(json) => serde_json::from_str::<AppearanceSettings>(&json).map_err(|e| e.to_string())?,
        None => AppearanceSettings::default(),
    };
    state.manager.export_backup(settings).await.to_json().map_err(|e| e.to_string())
}

/// Restore panel bookmarks from a backup file. The settings it carries are
/// returned for the settings store to apply.
pub async fn restore_backup(
    state: &AppState,
    json: String,
) -> Result<(RestoreReport, AppearanceSettings), String> {
    let document = BackupDocument::from_json(&json).map_err(|e| format!("Invalid backup file: {}", e))?;
    let report = state
        .manager
        .restore_backup(&document)
        .await
        .map_err(|e| e.to_string())?;
    Ok((report, document.settings))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DialConfig;
    use crate::domain::{GridDimensions, LayoutMode};
    use crate::repository::{LocalStorage, MemoryBookmarkStore};
    use std::sync::Arc;

    async fn state() -> AppState {
        AppState::start(
            Arc::new(MemoryBookmarkStore::new()),
            Arc::new(LocalStorage::new()),
            Arc::new(LocalStorage::new()),
            DialConfig::default(),
            LayoutMode::TwoPanel,
            GridDimensions::default(),
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_backup_into_second_profile() {
        let source = state().await;
        crate::commands::add_panel_bookmark(&source, "Docs".into(), "docs.rs".into(), "top-right".into())
            .await
            .unwrap();
        let backup = export_backup(&source, Some(r#"{"wallpaper":"forest","showTitle":false}"#.into()))
            .await
            .unwrap();

        let target = state().await;
        let (report, settings) = restore_backup(&target, backup).await.unwrap();

        assert_eq!(report.created, 1);
        assert_eq!(settings.wallpaper, "forest");
        assert!(!settings.show_title);
        let right = crate::commands::get_panel_bookmarks(&target, "top-right".into()).await.unwrap();
        assert_eq!(right[0].title, "Docs");
    }

    #[tokio::test]
    async fn test_garbage_rejected() {
        let state = state().await;
        let err = restore_backup(&state, "not a backup".into()).await.unwrap_err();
        assert!(err.starts_with("Invalid backup file"));
        assert!(import_panel_bookmarks(&state, "{".into()).await.is_err());
        assert_eq!(export_panel_bookmarks(&state).await.unwrap().trim(), "[]");
    }
}
