//! Commands for Layout Mode, Grid and Folder Browsing

use serde::{Deserialize, Serialize};

use super::parse_layout;
use crate::domain::{DialSize, GridDimensions, PanelEntry};
use crate::services::View;
use crate::AppState;

/// Layout snapshot for the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LayoutInfo {
    pub layout: String,
    pub panels: Vec<String>,
    pub grid: GridDimensions,
    /// Browsed folder, `None` at the bookmarks bar
    pub folder_id: Option<String>,
}

pub async fn get_layout(state: &AppState) -> Result<LayoutInfo, String> {
    let layout = state.manager.layout().await;
    let folder_id = match state.manager.view().await {
        View::Root => None,
        View::Folder(id) => Some(id),
    };
    Ok(LayoutInfo {
        layout: layout.as_str().to_string(),
        panels: layout.panels().iter().map(|p| p.as_str().to_string()).collect(),
        grid: state.manager.grid().await,
        folder_id,
    })
}

/// Switch layout; entries are reorganized for the new mode
pub async fn set_layout(state: &AppState, layout: String) -> Result<Vec<PanelEntry>, String> {
    let layout = parse_layout(&layout)?;
    state.manager.set_layout(layout).await.map_err(|e| e.to_string())?;
    Ok(state.manager.entries().await)
}

/// Resize the full-screen grid from the viewport and dial size
pub async fn fit_grid(
    state: &AppState,
    width_px: u32,
    height_px: u32,
    dial_size: Option<String>,
) -> Result<GridDimensions, String> {
    let dial = match dial_size {
        Some(size) => serde_json::from_value::<DialSize>(serde_json::Value::String(size.clone()))
            .map_err(|_| format!("Unknown dial size: {}", size))?,
        None => DialSize::default(),
    };
    let grid = GridDimensions::fit(width_px, height_px, dial, state.manager.config().min_grid);
    state.manager.set_grid(grid).await;
    state.manager.refresh().await.map_err(|e| e.to_string())?;
    Ok(grid)
}

/// Show a folder's children; `None` returns to the bookmarks bar
pub async fn browse_folder(state: &AppState, folder_id: Option<String>) -> Result<Vec<PanelEntry>, String> {
    state.manager.browse_folder(folder_id).await.map_err(|e| e.to_string())?;
    Ok(state.manager.entries().await)
}

/// Rebuild the current view from the native tree
pub async fn refresh(state: &AppState) -> Result<Vec<PanelEntry>, String> {
    state.manager.refresh().await.map_err(|e| e.to_string())?;
    Ok(state.manager.entries().await)
}
