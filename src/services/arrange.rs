//! Arrangement Operations
//!
//! In-memory moves behind drag and drop. List panels are renumbered
//! densely after every change; full-screen indices are slot coordinates
//! and are never renumbered.

use super::placement::{first_free_in, first_free_slot, panel_order};
use crate::domain::{DomainError, DomainResult, EntryId, Panel, PanelEntry};

fn position(entries: &[PanelEntry], id: &EntryId) -> DomainResult<usize> {
    entries
        .iter()
        .position(|e| &e.id == id)
        .ok_or_else(|| DomainError::NotFound(format!("Panel entry {} not found", id)))
}

/// Renumber a list panel 0..n in its current order
pub fn renumber(entries: &mut [PanelEntry], panel: Panel) {
    if panel.is_grid() {
        return;
    }
    for (rank, pos) in panel_order(entries, panel).into_iter().enumerate() {
        entries[pos].index = rank;
    }
}

fn apply_order(entries: &mut [PanelEntry], order: &[usize]) {
    for (rank, &pos) in order.iter().enumerate() {
        entries[pos].index = rank;
    }
}

/// Move an entry to `target_index` within its own panel (clamped)
pub fn reorder_within_panel(entries: &mut [PanelEntry], id: &EntryId, target_index: usize) -> DomainResult<()> {
    let source = position(entries, id)?;
    let panel = entries[source].panel;
    if panel.is_grid() {
        return Err(DomainError::InvalidInput("full-screen entries move by slot".to_string()));
    }

    let mut order = panel_order(entries, panel);
    order.retain(|&pos| pos != source);
    let at = target_index.min(order.len());
    order.insert(at, source);
    apply_order(entries, &order);
    Ok(())
}

/// Move an entry into another panel at `target_index` (clamped).
/// Same panel degrades to a reorder; the grid takes its first free slot.
pub fn move_across_panels(
    entries: &mut [PanelEntry],
    id: &EntryId,
    to_panel: Panel,
    target_index: usize,
) -> DomainResult<()> {
    let source = position(entries, id)?;
    let from_panel = entries[source].panel;
    if from_panel == to_panel && !to_panel.is_grid() {
        return reorder_within_panel(entries, id, target_index);
    }
    if to_panel.is_grid() {
        let slot = first_free_slot(entries);
        return drop_on_slot(entries, id, slot);
    }

    let mut order = panel_order(entries, to_panel);
    let at = target_index.min(order.len());
    order.insert(at, source);
    entries[source].panel = to_panel;
    apply_order(entries, &order);
    renumber(entries, from_panel);
    Ok(())
}

/// Drop onto a full-screen slot. An occupant is never lost: it takes the
/// source's old slot when the source came from the grid, otherwise the
/// first free slot.
pub fn drop_on_slot(entries: &mut [PanelEntry], id: &EntryId, slot: usize) -> DomainResult<()> {
    let source = position(entries, id)?;
    let from_panel = entries[source].panel;
    let from_index = entries[source].index;
    if from_panel == Panel::FullScreen && from_index == slot {
        return Ok(());
    }

    let occupant = entries
        .iter()
        .position(|e| e.panel == Panel::FullScreen && e.index == slot && &e.id != id);

    entries[source].panel = Panel::FullScreen;
    entries[source].index = slot;

    if let Some(occupant) = occupant {
        entries[occupant].index = if from_panel == Panel::FullScreen {
            from_index
        } else {
            first_free_in(
                entries
                    .iter()
                    .enumerate()
                    .filter(|(pos, e)| *pos != occupant && e.panel == Panel::FullScreen)
                    .map(|(_, e)| e.index),
            )
        };
    }
    renumber(entries, from_panel);
    Ok(())
}

/// Drop past the last item of a panel
pub fn drop_on_panel_end(entries: &mut [PanelEntry], id: &EntryId, panel: Panel) -> DomainResult<()> {
    if panel.is_grid() {
        let slot = first_free_slot(entries);
        return drop_on_slot(entries, id, slot);
    }
    let source = position(entries, id)?;
    let len = panel_order(entries, panel).len();
    if entries[source].panel == panel {
        reorder_within_panel(entries, id, len.saturating_sub(1))
    } else {
        move_across_panels(entries, id, panel, len)
    }
}

/// Remove an entry, closing the gap in its panel
pub fn remove_entry(entries: &mut Vec<PanelEntry>, id: &EntryId) -> Option<PanelEntry> {
    let pos = entries.iter().position(|e| &e.id == id)?;
    let removed = entries.remove(pos);
    renumber(entries, removed.panel);
    Some(removed)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, panel: Panel, index: usize) -> PanelEntry {
        PanelEntry::new_bookmark(EntryId::committed(id), id, "a.test", panel, index)
    }

    fn id(s: &str) -> EntryId {
        EntryId::committed(s)
    }

    fn layout_of(entries: &[PanelEntry]) -> Vec<(String, Panel, usize)> {
        entries.iter().map(|e| (e.id.to_string(), e.panel, e.index)).collect()
    }

    #[test]
    fn test_reorder_to_front() {
        let mut entries = vec![entry("1", Panel::TopLeft, 0), entry("2", Panel::TopLeft, 1)];
        reorder_within_panel(&mut entries, &id("2"), 0).unwrap();
        assert_eq!(entries[1].index, 0);
        assert_eq!(entries[0].index, 1);
    }

    #[test]
    fn test_reorder_clamps_target() {
        let mut entries = vec![
            entry("1", Panel::TopLeft, 0),
            entry("2", Panel::TopLeft, 1),
            entry("3", Panel::TopLeft, 2),
        ];
        reorder_within_panel(&mut entries, &id("1"), 99).unwrap();
        assert_eq!(
            layout_of(&entries),
            vec![
                ("1".into(), Panel::TopLeft, 2),
                ("2".into(), Panel::TopLeft, 0),
                ("3".into(), Panel::TopLeft, 1),
            ]
        );
    }

    #[test]
    fn test_move_across_renumbers_both_panels() {
        let mut entries = vec![
            entry("1", Panel::TopLeft, 0),
            entry("2", Panel::TopLeft, 1),
            entry("3", Panel::TopRight, 0),
        ];
        move_across_panels(&mut entries, &id("1"), Panel::TopRight, 0).unwrap();
        assert_eq!(
            layout_of(&entries),
            vec![
                ("1".into(), Panel::TopRight, 0),
                ("2".into(), Panel::TopLeft, 0),
                ("3".into(), Panel::TopRight, 1),
            ]
        );
    }

    #[test]
    fn test_swap_on_occupied_slot() {
        let mut entries = vec![entry("a", Panel::FullScreen, 4), entry("b", Panel::FullScreen, 2)];
        drop_on_slot(&mut entries, &id("a"), 2).unwrap();
        assert_eq!(entries[0].index, 2);
        assert_eq!(entries[1].index, 4);
    }

    #[test]
    fn test_slot_drop_from_panel_relocates_occupant() {
        let mut entries = vec![
            entry("a", Panel::TopLeft, 0),
            entry("b", Panel::FullScreen, 0),
            entry("c", Panel::FullScreen, 1),
        ];
        drop_on_slot(&mut entries, &id("a"), 0).unwrap();
        assert_eq!(entries[0].panel, Panel::FullScreen);
        assert_eq!(entries[0].index, 0);
        assert_eq!(entries[1].index, 2);
    }

    #[test]
    fn test_panel_end_drop() {
        let mut entries = vec![
            entry("1", Panel::TopLeft, 0),
            entry("2", Panel::TopLeft, 1),
            entry("3", Panel::TopRight, 0),
        ];
        drop_on_panel_end(&mut entries, &id("1"), Panel::TopLeft).unwrap();
        assert_eq!(entries[0].index, 1);
        drop_on_panel_end(&mut entries, &id("3"), Panel::TopLeft).unwrap();
        assert_eq!((entries[2].panel, entries[2].index), (Panel::TopLeft, 2));
    }

    #[test]
    fn test_missing_entry_is_not_found() {
        let mut entries = vec![entry("1", Panel::TopLeft, 0)];
        let err = reorder_within_panel(&mut entries, &id("9"), 0).unwrap_err();
        assert!(err.is_prunable());
        assert!(remove_entry(&mut entries, &id("9")).is_none());
    }
}
