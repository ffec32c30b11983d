//! Commands for Panel Bookmark CRUD + Arrangement
//!
//! Exposes the manager's panel operations to the page.

use serde::{Deserialize, Serialize};

use super::{entry_id, parse_layout, parse_panel};
use crate::domain::{BookmarkChanges, PanelEntry};
use crate::AppState;

/// A panel operation as sent by the page
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum PanelCommand {
    AddBookmark { title: String, url: String, panel: String },
    AddFolder { title: String, panel: String },
    #[serde(rename_all = "camelCase")]
    Update {
        id: String,
        title: Option<String>,
        url: Option<String>,
        panel: Option<String>,
    },
    Delete { id: String },
    Reorder { id: String, index: usize },
    Move { id: String, panel: String, index: usize },
    DropOnSlot { id: String, slot: usize },
    DropOnPanelEnd { id: String, panel: String },
    #[serde(rename_all = "camelCase")]
    MoveIntoFolder { id: String, folder_id: String },
    ChangeLayout { layout: String },
    #[serde(rename_all = "camelCase")]
    BrowseFolder { folder_id: Option<String> },
    SetTargetSlot { slot: Option<usize> },
}

/// What a command produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum CommandOutput {
    Entry(PanelEntry),
    Entries(Vec<PanelEntry>),
    Done,
}

impl PanelCommand {
    /// Reject malformed arguments before anything touches the manager
    pub fn validate(&self) -> Result<(), String> {
        match self {
            PanelCommand::AddBookmark { title, url, panel } => {
                require("title", title)?;
                require("url", url)?;
                parse_panel(panel).map(|_| ())
            }
            PanelCommand::AddFolder { title, panel } => {
                require("title", title)?;
                parse_panel(panel).map(|_| ())
            }
            PanelCommand::Update { id, title, url, panel } => {
                entry_id(id)?;
                if title.is_none() && url.is_none() && panel.is_none() {
                    return Err("Nothing to update".to_string());
                }
                if let Some(title) = title {
                    require("title", title)?;
                }
                panel.as_deref().map(parse_panel).transpose().map(|_| ())
            }
            PanelCommand::Delete { id }
            | PanelCommand::Reorder { id, .. }
            | PanelCommand::DropOnSlot { id, .. } => entry_id(id).map(|_| ()),
            PanelCommand::Move { id, panel, .. } | PanelCommand::DropOnPanelEnd { id, panel } => {
                entry_id(id)?;
                parse_panel(panel).map(|_| ())
            }
            PanelCommand::MoveIntoFolder { id, folder_id } => {
                entry_id(id)?;
                require("folder id", folder_id)
            }
            PanelCommand::ChangeLayout { layout } => parse_layout(layout).map(|_| ()),
            PanelCommand::BrowseFolder { .. } | PanelCommand::SetTargetSlot { .. } => Ok(()),
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{} is required", field));
    }
    Ok(())
}

/// Validate and run one command
pub async fn execute(state: &AppState, command: PanelCommand) -> Result<CommandOutput, String> {
    command.validate()?;
    match command {
        PanelCommand::AddBookmark { title, url, panel } => {
            add_panel_bookmark(state, title, url, panel).await.map(CommandOutput::Entry)
        }
        PanelCommand::AddFolder { title, panel } => {
            add_panel_folder(state, title, panel).await.map(CommandOutput::Entry)
        }
        PanelCommand::Update { id, title, url, panel } => {
            update_panel_bookmark(state, id, title, url, panel).await.map(CommandOutput::Entry)
        }
        PanelCommand::Delete { id } => delete_panel_bookmark(state, id).await.map(|_| CommandOutput::Done),
        PanelCommand::Reorder { id, index } => {
            reorder_panel_bookmark(state, id, index).await.map(|_| CommandOutput::Done)
        }
        PanelCommand::Move { id, panel, index } => {
            move_panel_bookmark(state, id, panel, index).await.map(|_| CommandOutput::Done)
        }
        PanelCommand::DropOnSlot { id, slot } => drop_on_slot(state, id, slot).await.map(|_| CommandOutput::Done),
        PanelCommand::DropOnPanelEnd { id, panel } => {
            drop_on_panel_end(state, id, panel).await.map(|_| CommandOutput::Done)
        }
        PanelCommand::MoveIntoFolder { id, folder_id } => {
            move_into_folder(state, id, folder_id).await.map(|_| CommandOutput::Done)
        }
        PanelCommand::ChangeLayout { layout } => {
            super::set_layout(state, layout).await.map(CommandOutput::Entries)
        }
        PanelCommand::BrowseFolder { folder_id } => {
            super::browse_folder(state, folder_id).await.map(CommandOutput::Entries)
        }
        PanelCommand::SetTargetSlot { slot } => set_target_slot(state, slot).await.map(|_| CommandOutput::Done),
    }
}

/// Entries of one panel, sorted by index
pub async fn get_panel_bookmarks(state: &AppState, panel: String) -> Result<Vec<PanelEntry>, String> {
    let panel = parse_panel(&panel)?;
    Ok(state.manager.get_panel_bookmarks(panel).await)
}

/// Everything the current view shows
pub async fn list_entries(state: &AppState) -> Result<Vec<PanelEntry>, String> {
    Ok(state.manager.entries().await)
}

pub async fn is_panel_bookmark(state: &AppState, id: String) -> Result<bool, String> {
    Ok(state.manager.is_panel_bookmark(&id).await)
}

/// Create a bookmark and place it on a panel
pub async fn add_panel_bookmark(
    state: &AppState,
    title: String,
    url: String,
    panel: String,
) -> Result<PanelEntry, String> {
    let panel = parse_panel(&panel)?;
    state
        .manager
        .add_bookmark_to_panel(&title, &url, panel)
        .await
        .map_err(|e| e.to_string())
}

/// Create a folder and place it on a panel
pub async fn add_panel_folder(state: &AppState, title: String, panel: String) -> Result<PanelEntry, String> {
    let panel = parse_panel(&panel)?;
    state
        .manager
        .add_folder_to_panel(&title, panel)
        .await
        .map_err(|e| e.to_string())
}

/// Edit title/url; an optional panel moves the entry to that panel's end
pub async fn update_panel_bookmark(
    state: &AppState,
    id: String,
    title: Option<String>,
    url: Option<String>,
    panel: Option<String>,
) -> Result<PanelEntry, String> {
    let panel = panel.as_deref().map(parse_panel).transpose()?;
    let changes = BookmarkChanges { title, url };
    state
        .manager
        .update_panel_bookmark(&id, changes, panel)
        .await
        .map_err(|e| e.to_string())
}

pub async fn delete_panel_bookmark(state: &AppState, id: String) -> Result<(), String> {
    let id = entry_id(&id)?;
    let native = id.native().unwrap_or_default().to_string();
    state.manager.delete_panel_bookmark(&native).await.map_err(|e| e.to_string())
}

pub async fn reorder_panel_bookmark(state: &AppState, id: String, index: usize) -> Result<(), String> {
    let id = entry_id(&id)?;
    state
        .manager
        .reorder_within_panel(&id, index)
        .await
        .map_err(|e| e.to_string())
}

pub async fn move_panel_bookmark(
    state: &AppState,
    id: String,
    panel: String,
    index: usize,
) -> Result<(), String> {
    let id = entry_id(&id)?;
    let panel = parse_panel(&panel)?;
    state
        .manager
        .move_across_panels(&id, panel, index)
        .await
        .map_err(|e| e.to_string())
}

pub async fn drop_on_slot(state: &AppState, id: String, slot: usize) -> Result<(), String> {
    let id = entry_id(&id)?;
    state.manager.drop_on_slot(&id, slot).await.map_err(|e| e.to_string())
}

pub async fn drop_on_panel_end(state: &AppState, id: String, panel: String) -> Result<(), String> {
    let id = entry_id(&id)?;
    let panel = parse_panel(&panel)?;
    state
        .manager
        .drop_on_panel_end(&id, panel)
        .await
        .map_err(|e| e.to_string())
}

pub async fn move_into_folder(state: &AppState, id: String, folder_id: String) -> Result<(), String> {
    let id = entry_id(&id)?;
    state
        .manager
        .move_into_folder(&id, &folder_id)
        .await
        .map_err(|e| e.to_string())
}

/// Breadcrumb drop while browsing a folder
pub async fn move_to_parent(
    state: &AppState,
    id: String,
    original_panel: String,
    parent_id: String,
) -> Result<(), String> {
    let id = entry_id(&id)?;
    let panel = parse_panel(&original_panel)?;
    state
        .manager
        .move_to_parent(&id, panel, &parent_id)
        .await
        .map_err(|e| e.to_string())
}

/// Remember the empty slot the user clicked; the next full-screen add uses it
pub async fn set_target_slot(state: &AppState, slot: Option<usize>) -> Result<(), String> {
    state.manager.set_target_slot(slot).await;
    Ok(())
}
