//! Engine Configuration
//!
//! Tunables for the panel-bookmark engine plus the storage keys the
//! overlay is persisted under.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::domain::{DomainResult, GridDimensions};

/// Persisted PanelEntry list
pub const PANEL_BOOKMARKS_KEY: &str = "panel-bookmarks";
/// Last layout mode the organizer ran for
pub const ORGANIZED_LAYOUT_KEY: &str = "organized-layout";
/// Set once auto-organization has run at least once
pub const HAS_ORGANIZED_KEY: &str = "has-organized";
/// Suffix of the secondary key written when the primary write fails
pub const BACKUP_SUFFIX: &str = "_backup";

pub fn backup_key(key: &str) -> String {
    format!("{}{}", key, BACKUP_SUFFIX)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DialConfig {
    /// Debounce window for overlay saves
    pub save_debounce_ms: u64,
    /// Grid used when nothing has measured the viewport yet
    pub default_grid: GridDimensions,
    /// Floor applied when fitting the grid to the viewport
    pub min_grid: GridDimensions,
    pub drag_threshold_px: i32,
    /// Used when the host cannot name its bookmarks bar
    pub bookmarks_bar_fallback_id: String,
}

impl Default for DialConfig {
    fn default() -> Self {
        Self {
            save_debounce_ms: 300,
            default_grid: GridDimensions::default(),
            min_grid: GridDimensions::MIN,
            drag_threshold_px: dial_dragdrop::DRAG_THRESHOLD_PX,
            bookmarks_bar_fallback_id: "1".to_string(),
        }
    }
}

impl DialConfig {
    pub fn from_json(json: &str) -> DomainResult<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.save_debounce_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DialConfig::default();
        assert_eq!(config.debounce(), Duration::from_millis(300));
        assert_eq!(config.default_grid, GridDimensions::new(10, 6));
        assert_eq!(config.drag_threshold_px, 5);
    }

    #[test]
    fn test_partial_json() {
        let config = DialConfig::from_json(r#"{"saveDebounceMs":50,"defaultGrid":{"cols":3,"rows":3}}"#).unwrap();
        assert_eq!(config.save_debounce_ms, 50);
        assert_eq!(config.default_grid.total_slots(), 9);
        assert_eq!(config.min_grid, GridDimensions::MIN);
        assert_eq!(config.bookmarks_bar_fallback_id, "1");
    }

    #[test]
    fn test_invalid_json() {
        assert!(DialConfig::from_json("{not json").is_err());
        assert_eq!(backup_key(PANEL_BOOKMARKS_KEY), "panel-bookmarks_backup");
    }
}
