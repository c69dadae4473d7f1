use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::post::Category;

/// Whose posts a row belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subject {
    /// The signed-in viewer's own timeline when no profile handle is known.
    Own,
    /// A named person, keyed by handle.
    User(String),
}

impl Subject {
    pub fn user(handle: impl Into<String>) -> Self {
        Subject::User(handle.into())
    }

    /// Named subject when a handle is available, [`Subject::Own`] otherwise.
    pub fn from_handle(handle: Option<&str>) -> Self {
        match handle.filter(|name| !name.is_empty()) {
            Some(name) => Subject::User(name.to_string()),
            None => Subject::Own,
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Own => f.write_str("me"),
            Subject::User(handle) => f.write_str(handle),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DeckKey {
    pub subject: Subject,
    pub category: Category,
    pub row: usize,
}

impl DeckKey {
    pub fn new(subject: Subject, category: Category, row: usize) -> Self {
        Self {
            subject,
            category,
            row,
        }
    }
}

impl fmt::Display for DeckKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-row{}", self.subject, self.category, self.row)
    }
}

/// Current card position for every deck a view has touched.
///
/// Writes are stored verbatim, including positions past the end of the
/// row they address. Readers go through [`resolve_position`] so a stale
/// position shows the first card without rewriting the store.
#[derive(Debug, Default, Clone)]
pub struct DeckIndexStore {
    positions: HashMap<DeckKey, usize>,
}

impl DeckIndexStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &DeckKey) -> usize {
        self.positions.get(key).copied().unwrap_or(0)
    }

    pub fn set(&mut self, key: DeckKey, position: usize) {
        debug!(deck = %key, position, "deck position changed");
        self.positions.insert(key, position);
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Drops every stored position; used when the owning view unmounts.
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Stored position for `key`, resolved against the row currently shown.
    pub fn display_position(&self, key: &DeckKey, len: usize) -> usize {
        resolve_position(self.get(key), len)
    }
}

/// Index to display for a stored `position` over `len` items: the stored
/// value when in range, otherwise 0.
pub fn resolve_position(position: usize, len: usize) -> usize {
    if position < len {
        position
    } else {
        0
    }
}

/// Item to display for a stored `position`, with the same fallback.
pub fn resolve_item<T>(items: &[T], position: usize) -> Option<(usize, &T)> {
    let index = resolve_position(position, items.len());
    items.get(index).map(|item| (index, item))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(row: usize) -> DeckKey {
        DeckKey::new(Subject::user("ada"), Category::Media, row)
    }

    #[test]
    fn unset_keys_read_as_zero() {
        let store = DeckIndexStore::new();
        assert_eq!(store.get(&key(0)), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn keys_are_structural() {
        let mut store = DeckIndexStore::new();
        store.set(key(1), 4);
        assert_eq!(store.get(&key(1)), 4);
        assert_eq!(store.get(&key(0)), 0);
        assert_eq!(
            store.get(&DeckKey::new(Subject::user("ada"), Category::Thoughts, 1)),
            0
        );
        assert_eq!(
            store.get(&DeckKey::new(Subject::Own, Category::Media, 1)),
            0
        );
    }

    #[test]
    fn out_of_range_positions_survive_and_display_first_card() {
        let mut store = DeckIndexStore::new();
        store.set(key(0), 9);
        assert_eq!(store.display_position(&key(0), 3), 0);
        assert_eq!(store.get(&key(0)), 9);

        // the row grows back past the stored position
        assert_eq!(store.display_position(&key(0), 12), 9);

        let items = ["a", "b", "c"];
        assert_eq!(resolve_item(&items, 9), Some((0, &"a")));
        assert_eq!(resolve_item(&items, 2), Some((2, &"c")));
        assert_eq!(resolve_item::<&str>(&[], 0), None);
    }

    #[test]
    fn keys_render_like_legacy_strings() {
        assert_eq!(key(2).to_string(), "ada-media-row2");
        assert_eq!(
            DeckKey::new(Subject::from_handle(None), Category::Thoughts, 0).to_string(),
            "me-thoughts-row0"
        );
    }
}
