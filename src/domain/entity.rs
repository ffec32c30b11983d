//! Domain Layer - Core Entity Trait
//!
//! This trait defines the basic contract for all domain entities.

use serde::{Deserialize, Serialize};

/// Core trait for all domain entities
pub trait Entity: Sized + Send + Sync + Clone {
    /// The type of the entity's unique identifier
    type Id: Clone + Eq + std::hash::Hash + Send + Sync;

    /// Returns the entity's unique identifier
    fn id(&self) -> Self::Id;
}

/// Keep the first occurrence of every id, preserving order
pub fn dedupe_by_id<E: Entity>(items: impl IntoIterator<Item = E>) -> Vec<E> {
    let mut seen = std::collections::HashSet::new();
    items.into_iter().filter(|item| seen.insert(item.id())).collect()
}

/// Common result type for domain operations
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level errors
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, thiserror::Error)]
pub enum DomainError {
    /// A native bookmark id vanished
    #[error("Not found: {0}")]
    NotFound(String),
    /// The host rejected a bookmark creation
    #[error("Could not create bookmark: {0}")]
    Creation(String),
    /// Move or create targeted a parent that cannot hold children
    #[error("Invalid parent: {0}")]
    InvalidParent(String),
    /// Overlay storage could not be written or read
    #[error("Storage error: {0}")]
    Persistence(String),
    /// Persisted or imported JSON could not be decoded
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl DomainError {
    /// `NotFound` means the overlay should drop the id, not fail the caller
    pub fn is_prunable(&self) -> bool {
        matches!(self, DomainError::NotFound(_))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(e: serde_json::Error) -> Self {
        DomainError::Parse(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{EntryId, Panel, PanelEntry};

    #[test]
    fn test_dedupe_keeps_first() {
        let entries = vec![
            PanelEntry::new_bookmark(EntryId::committed("1"), "first", "a.test", Panel::TopLeft, 0),
            PanelEntry::new_bookmark(EntryId::committed("2"), "other", "b.test", Panel::TopLeft, 1),
            PanelEntry::new_bookmark(EntryId::committed("1"), "second", "a.test", Panel::TopRight, 0),
        ];
        let kept = dedupe_by_id(entries);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[0].title, "first");
    }
}
