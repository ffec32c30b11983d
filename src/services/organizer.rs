//! Layout Organizer
//!
//! Redistributes the overlay when the layout mode changes. Pure: no I/O,
//! the caller persists the result and records the new mode.

use std::collections::{HashMap, HashSet};

use super::placement::{next_index_for_panel, place_new};
use crate::domain::{BookmarkNode, GridDimensions, LayoutMode, Panel, PanelEntry};

/// What the overlay store remembers about the last reorganization
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct OrganizeState {
    pub last_organized: Option<LayoutMode>,
    pub has_organized: bool,
}

impl OrganizeState {
    pub fn organized(layout: LayoutMode) -> Self {
        Self { last_organized: Some(layout), has_organized: true }
    }

    /// False when `target` is already the organized layout
    pub fn needs_organize(&self, target: LayoutMode) -> bool {
        !(self.has_organized && self.last_organized == Some(target))
    }
}

/// Where an entry from `panel` goes under `target`. `None` means the
/// entry has no natural home and is dealt round-robin.
fn remap_panel(panel: Panel, target: LayoutMode) -> Option<Panel> {
    match (target, panel) {
        (LayoutMode::FullScreen, _) => Some(Panel::FullScreen),
        (_, Panel::FullScreen | Panel::Folder) => None,
        (LayoutMode::TwoPanel, Panel::TopRight) => Some(Panel::TopRight),
        (LayoutMode::TwoPanel, _) => Some(Panel::TopLeft),
        (LayoutMode::ThreePanel, Panel::BottomLeft | Panel::BottomRight) => Some(Panel::BottomFull),
        (LayoutMode::FourPanel, Panel::BottomFull) => Some(Panel::BottomLeft),
        (_, panel) => Some(panel),
    }
}

/// Reorganize `entries` for `target`, then place any native children that
/// the list does not hold yet.
pub fn organize(
    mut entries: Vec<PanelEntry>,
    target: LayoutMode,
    state: &OrganizeState,
    grid: GridDimensions,
    unplaced: &[BookmarkNode],
) -> Vec<PanelEntry> {
    if !state.needs_organize(target) {
        return entries;
    }

    if target.is_full_screen() {
        organize_grid(&mut entries, grid);
    } else {
        organize_panels(&mut entries, target);
    }

    let mut known: HashSet<String> = entries
        .iter()
        .filter_map(|e| e.id.native().map(str::to_string))
        .collect();
    let mut dealt = 0;
    for node in unplaced {
        if known.insert(node.id.clone()) {
            let (panel, index) = place_new(&entries, target, dealt);
            entries.push(PanelEntry::from_node(node, panel, index));
            dealt += 1;
        }
    }
    entries
}

/// Full-screen: keep in-range unused slots, hand out the rest ascending
fn organize_grid(entries: &mut [PanelEntry], grid: GridDimensions) {
    let total = grid.total_slots();
    let mut used = HashSet::new();
    let mut pending = Vec::new();

    for (pos, entry) in entries.iter().enumerate() {
        let keeps = entry.panel == Panel::FullScreen && entry.index < total && used.insert(entry.index);
        if !keeps {
            pending.push(pos);
        }
    }

    let mut cursor = 0;
    for pos in pending {
        while used.contains(&cursor) {
            cursor += 1;
        }
        entries[pos].panel = Panel::FullScreen;
        entries[pos].index = cursor;
        used.insert(cursor);
    }
}

/// Panel modes: compatible entries stay put, the rest are appended
fn organize_panels(entries: &mut [PanelEntry], target: LayoutMode) {
    let panels = target.panels();
    let mut moved = Vec::new();

    for (pos, entry) in entries.iter().enumerate() {
        if !target.contains(entry.panel) {
            moved.push(pos);
        }
    }

    // Appends go after the entries that kept their panel
    let kept: Vec<PanelEntry> = entries
        .iter()
        .filter(|e| target.contains(e.panel))
        .cloned()
        .collect();
    let mut next: HashMap<Panel, usize> = panels
        .iter()
        .map(|&p| (p, next_index_for_panel(&kept, p)))
        .collect();

    let mut dealt = 0;
    for pos in moved {
        let panel = match remap_panel(entries[pos].panel, target) {
            Some(panel) => panel,
            None => {
                let panel = panels[dealt % panels.len()];
                dealt += 1;
                panel
            }
        };
        let slot = next.entry(panel).or_insert(0);
        entries[pos].panel = panel;
        entries[pos].index = *slot;
        *slot += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryId, NodeKind};

    fn entry(id: &str, panel: Panel, index: usize) -> PanelEntry {
        PanelEntry::new_bookmark(EntryId::committed(id), id, "a.test", panel, index)
    }

    fn node(id: &str) -> BookmarkNode {
        BookmarkNode {
            id: id.to_string(),
            title: id.to_string(),
            url: Some(format!("https://{}.test", id)),
            kind: NodeKind::Bookmark,
            parent_id: Some("1".to_string()),
            index: 0,
        }
    }

    fn ids(entries: &[PanelEntry]) -> Vec<String> {
        let mut ids: Vec<String> = entries.iter().map(|e| e.id.to_string()).collect();
        ids.sort();
        ids
    }

    #[test]
    fn test_four_to_two_panel_collapses_into_top_left() {
        let entries = vec![
            entry("1", Panel::TopLeft, 0),
            entry("2", Panel::TopLeft, 1),
            entry("3", Panel::TopRight, 0),
            entry("4", Panel::BottomRight, 0),
            entry("5", Panel::BottomRight, 1),
        ];
        let state = OrganizeState::organized(LayoutMode::FourPanel);
        let out = organize(entries, LayoutMode::TwoPanel, &state, GridDimensions::default(), &[]);

        let top_left: Vec<(String, usize)> = out
            .iter()
            .filter(|e| e.panel == Panel::TopLeft)
            .map(|e| (e.id.to_string(), e.index))
            .collect();
        assert_eq!(
            top_left,
            vec![("1".into(), 0), ("2".into(), 1), ("4".into(), 2), ("5".into(), 3)]
        );
        assert_eq!(out[2].panel, Panel::TopRight);
    }

    #[test]
    fn test_three_panel_merges_bottom_halves() {
        let entries = vec![entry("1", Panel::BottomLeft, 0), entry("2", Panel::BottomRight, 0)];
        let out = organize(entries, LayoutMode::ThreePanel, &OrganizeState::default(), GridDimensions::default(), &[]);
        assert!(out.iter().all(|e| e.panel == Panel::BottomFull));
        assert_eq!(out[0].index, 0);
        assert_eq!(out[1].index, 1);
    }

    #[test]
    fn test_full_screen_resolves_collisions_later_loses() {
        let entries = vec![
            entry("a", Panel::FullScreen, 2),
            entry("b", Panel::FullScreen, 2),
            entry("c", Panel::FullScreen, 40),
            entry("d", Panel::TopLeft, 0),
        ];
        let grid = GridDimensions::new(3, 3);
        let out = organize(entries, LayoutMode::FullScreen, &OrganizeState::default(), grid, &[]);

        let slots: Vec<usize> = out.iter().map(|e| e.index).collect();
        assert_eq!(slots, vec![2, 0, 1, 3]);
        assert!(out.iter().all(|e| e.panel == Panel::FullScreen));
    }

    #[test]
    fn test_full_screen_to_panels_round_robin() {
        let entries: Vec<PanelEntry> = (0..5).map(|i| entry(&i.to_string(), Panel::FullScreen, i)).collect();
        let out = organize(entries, LayoutMode::ThreePanel, &OrganizeState::default(), GridDimensions::default(), &[]);
        let panels: Vec<Panel> = out.iter().map(|e| e.panel).collect();
        assert_eq!(
            panels,
            vec![Panel::TopLeft, Panel::TopRight, Panel::BottomFull, Panel::TopLeft, Panel::TopRight]
        );
        assert_eq!(out[3].index, 1);
    }

    #[test]
    fn test_idempotent_when_already_organized() {
        let entries = vec![entry("1", Panel::BottomRight, 7)];
        let state = OrganizeState::organized(LayoutMode::TwoPanel);
        let out = organize(entries.clone(), LayoutMode::TwoPanel, &state, GridDimensions::default(), &[node("9")]);
        assert_eq!(out, entries);
    }

    #[test]
    fn test_conservation_across_round_trip() {
        let entries = vec![
            entry("1", Panel::TopLeft, 0),
            entry("2", Panel::BottomLeft, 0),
            entry("3", Panel::BottomRight, 0),
            entry("4", Panel::TopRight, 3),
        ];
        let before = ids(&entries);
        let grid = GridDimensions::new(2, 2);
        let full = organize(entries, LayoutMode::FullScreen, &OrganizeState::organized(LayoutMode::FourPanel), grid, &[]);
        let back = organize(full, LayoutMode::FourPanel, &OrganizeState::organized(LayoutMode::FullScreen), grid, &[]);
        assert_eq!(ids(&back), before);
    }

    #[test]
    fn test_unplaced_natives_appended() {
        let entries = vec![entry("1", Panel::FullScreen, 0)];
        let out = organize(
            entries,
            LayoutMode::FullScreen,
            &OrganizeState::default(),
            GridDimensions::default(),
            &[node("1"), node("2"), node("3")],
        );
        assert_eq!(out.len(), 3);
        assert_eq!(out[1].index, 1);
        assert_eq!(out[2].index, 2);
    }
}
