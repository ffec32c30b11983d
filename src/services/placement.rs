//! Placement Rules
//!
//! Where new entries land: dealt round-robin over the layout's panels in
//! panel modes, first free slot in the full-screen grid.

use std::collections::HashSet;

use crate::domain::{EntryId, LayoutMode, Panel, PanelEntry};

/// Positions (into `entries`) of the entries in `panel`, ordered by index.
/// Ties keep vector order.
pub fn panel_order(entries: &[PanelEntry], panel: Panel) -> Vec<usize> {
    let mut order: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, e)| e.panel == panel)
        .map(|(pos, _)| pos)
        .collect();
    order.sort_by_key(|&pos| entries[pos].index);
    order
}

/// Entries in `panel`, sorted by index
pub fn panel_entries(entries: &[PanelEntry], panel: Panel) -> Vec<&PanelEntry> {
    panel_order(entries, panel).into_iter().map(|pos| &entries[pos]).collect()
}

/// Next index for a panel: one past the highest index in use, 0 when empty
pub fn next_index_for_panel(entries: &[PanelEntry], panel: Panel) -> usize {
    entries
        .iter()
        .filter(|e| e.panel == panel)
        .map(|e| e.index + 1)
        .max()
        .unwrap_or(0)
}

/// Lowest index not present in `used`. The scan is unbounded, so a full
/// grid yields a slot past the last one rather than reusing a taken slot.
pub fn first_free_in(used: impl IntoIterator<Item = usize>) -> usize {
    let used: HashSet<usize> = used.into_iter().collect();
    (0..).find(|slot| !used.contains(slot)).unwrap_or(used.len())
}

/// Lowest full-screen slot no entry occupies
pub fn first_free_slot(entries: &[PanelEntry]) -> usize {
    first_free_in(
        entries
            .iter()
            .filter(|e| e.panel == Panel::FullScreen)
            .map(|e| e.index),
    )
}

pub fn is_slot_free(entries: &[PanelEntry], slot: usize, ignoring: Option<&EntryId>) -> bool {
    !entries
        .iter()
        .any(|e| e.panel == Panel::FullScreen && e.index == slot && Some(&e.id) != ignoring)
}

/// Panel and index for the `dealt`-th new entry of a batch under `layout`.
/// Panels are dealt in order starting from the first; the entry goes one
/// past the panel's highest index.
pub fn place_new(entries: &[PanelEntry], layout: LayoutMode, dealt: usize) -> (Panel, usize) {
    if layout.is_full_screen() {
        return (Panel::FullScreen, first_free_slot(entries));
    }
    let panels = layout.panels();
    let panel = panels[dealt % panels.len()];
    (panel, next_index_for_panel(entries, panel))
}

/// Reassign full-screen entries that share a slot. The first entry in
/// vector order keeps the slot; later ones move to the lowest free slot.
/// Returns true if anything moved.
pub fn resolve_slot_collisions(entries: &mut [PanelEntry]) -> bool {
    let mut seen = HashSet::new();
    let mut losers = Vec::new();
    for (pos, entry) in entries.iter().enumerate() {
        if entry.panel == Panel::FullScreen && !seen.insert(entry.index) {
            losers.push(pos);
        }
    }
    if losers.is_empty() {
        return false;
    }

    let mut cursor = 0;
    for pos in losers {
        while seen.contains(&cursor) {
            cursor += 1;
        }
        entries[pos].index = cursor;
        seen.insert(cursor);
    }
    true
}

/// Give the full-screen slot of `entries[pos]` to that entry alone; any
/// other entry on it moves to the lowest free slot. Returns true if
/// anything moved.
pub fn claim_slot(entries: &mut [PanelEntry], pos: usize) -> bool {
    if entries[pos].panel != Panel::FullScreen {
        return false;
    }
    let slot = entries[pos].index;
    let mut moved = false;
    for other in 0..entries.len() {
        if other != pos && entries[other].panel == Panel::FullScreen && entries[other].index == slot {
            let free = first_free_slot(entries);
            entries[other].index = free;
            moved = true;
        }
    }
    moved
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, panel: Panel, index: usize) -> PanelEntry {
        PanelEntry::new_bookmark(EntryId::committed(id), id, "a.test", panel, index)
    }

    #[test]
    fn test_next_index_for_panel() {
        let entries = vec![entry("1", Panel::TopLeft, 0), entry("2", Panel::TopLeft, 4)];
        assert_eq!(next_index_for_panel(&entries, Panel::TopLeft), 5);
        assert_eq!(next_index_for_panel(&entries, Panel::TopRight), 0);
    }

    #[test]
    fn test_first_free_slot_fills_gaps() {
        let entries = vec![
            entry("1", Panel::FullScreen, 0),
            entry("2", Panel::FullScreen, 2),
            entry("3", Panel::TopLeft, 1),
        ];
        assert_eq!(first_free_slot(&entries), 1);
        assert!(!is_slot_free(&entries, 2, None));
        assert!(is_slot_free(&entries, 2, Some(&EntryId::committed("2"))));
    }

    #[test]
    fn test_place_new_deals_in_panel_order() {
        let mut entries = vec![entry("a", Panel::TopLeft, 0), entry("b", Panel::TopLeft, 1)];
        let mut placed = Vec::new();
        for (dealt, id) in ["c", "d", "e", "f"].into_iter().enumerate() {
            let (panel, index) = place_new(&entries, LayoutMode::TwoPanel, dealt);
            entries.push(entry(id, panel, index));
            placed.push((panel, index));
        }
        assert_eq!(
            placed,
            vec![
                (Panel::TopLeft, 2),
                (Panel::TopRight, 0),
                (Panel::TopLeft, 3),
                (Panel::TopRight, 1),
            ]
        );
    }

    #[test]
    fn test_place_new_full_screen_ignores_dealing() {
        let entries = vec![entry("1", Panel::FullScreen, 0)];
        assert_eq!(place_new(&entries, LayoutMode::FullScreen, 3), (Panel::FullScreen, 1));
    }

    #[test]
    fn test_resolve_slot_collisions() {
        let mut entries = vec![
            entry("1", Panel::FullScreen, 1),
            entry("2", Panel::FullScreen, 1),
            entry("3", Panel::FullScreen, 0),
        ];
        assert!(resolve_slot_collisions(&mut entries));
        assert_eq!(entries[0].index, 1);
        assert_eq!(entries[1].index, 2);
        assert!(!resolve_slot_collisions(&mut entries));
    }

    #[test]
    fn test_claim_slot_moves_the_other_entry() {
        let mut entries = vec![
            entry("ext", Panel::FullScreen, 0),
            entry("1", Panel::FullScreen, 1),
            entry("mine", Panel::FullScreen, 0),
        ];
        assert!(claim_slot(&mut entries, 2));
        assert_eq!(entries[2].index, 0);
        assert_eq!(entries[0].index, 2);
        assert!(!claim_slot(&mut entries, 2));
    }
}
