//! Commands Layer
//!
//! Handlers that bridge the page front end to the panel-bookmark services.
//! Arguments arrive as plain strings and numbers; errors leave as strings.

mod backup_cmd;
mod layout_cmd;
mod panel_cmd;

pub use backup_cmd::*;
pub use layout_cmd::*;
pub use panel_cmd::*;

use crate::domain::{EntryId, LayoutMode, Panel};

fn parse_panel(panel: &str) -> Result<Panel, String> {
    match Panel::from_str(panel) {
        Some(Panel::Folder) | None => Err(format!("Unknown panel: {}", panel)),
        Some(panel) => Ok(panel),
    }
}

fn parse_layout(layout: &str) -> Result<LayoutMode, String> {
    LayoutMode::from_str(layout).ok_or_else(|| format!("Unknown layout: {}", layout))
}

fn entry_id(id: &str) -> Result<EntryId, String> {
    let id = id.trim();
    if id.is_empty() {
        return Err("Bookmark id is required".to_string());
    }
    Ok(EntryId::committed(id))
}
