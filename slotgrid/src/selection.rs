use std::collections::HashSet;

use crate::{Record, RecordStore, RowKey};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SelectionMode {
    Single,
    #[default]
    Multiple,
}

/// Tri-state of the header checkbox for the current view.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct HeaderCheckState {
    pub checked: bool,
    pub indeterminate: bool,
}

/// Set of selected identity keys.
///
/// Membership is by key, never by view position, so it survives sorting,
/// filtering and paging unchanged.
#[derive(Clone, Debug, Default)]
pub struct SelectionLedger {
    keys: HashSet<RowKey>,
    mode: SelectionMode,
}

impl SelectionLedger {
    pub fn new(mode: SelectionMode) -> Self {
        Self {
            keys: HashSet::new(),
            mode,
        }
    }

    pub fn mode(&self) -> SelectionMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: SelectionMode) {
        self.mode = mode;
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RowKey> {
        self.keys.iter()
    }

    pub fn is_row_selected(&self, key: &RowKey) -> bool {
        self.keys.contains(key)
    }

    /// Flips membership of `key`. Returns whether it is now selected.
    pub fn toggle(&mut self, key: &RowKey) -> bool {
        if self.keys.remove(key) {
            false
        } else {
            self.keys.insert(key.clone());
            true
        }
    }

    pub fn add(&mut self, key: RowKey) -> bool {
        self.keys.insert(key)
    }

    pub fn remove(&mut self, key: &RowKey) -> bool {
        self.keys.remove(key)
    }

    /// Empties the ledger. Returns whether anything was selected.
    pub fn clear(&mut self) -> bool {
        let had = !self.keys.is_empty();
        self.keys.clear();
        had
    }

    /// Adds every key in `visible`. Returns how many were newly added.
    pub fn select_all_visible<'a>(&mut self, visible: impl IntoIterator<Item = &'a RowKey>) -> usize {
        visible
            .into_iter()
            .filter(|k| self.keys.insert((*k).clone()))
            .count()
    }

    /// Removes every key in `visible`. Returns how many were removed.
    pub fn deselect_visible<'a>(&mut self, visible: impl IntoIterator<Item = &'a RowKey>) -> usize {
        visible.into_iter().filter(|k| self.keys.remove(*k)).count()
    }

    /// Replaces the selection with every key in the store.
    pub fn select_all(&mut self, store: &RecordStore) {
        self.keys.clear();
        self.keys.extend(store.keys().iter().cloned());
    }

    /// Plain row click. In single mode without a modifier every other key is
    /// dropped first; the clicked row is then toggled.
    pub fn click(&mut self, key: &RowKey, modifier: bool) -> bool {
        if self.mode == SelectionMode::Single && !modifier {
            self.keys.retain(|k| k == key);
        }
        self.toggle(key)
    }

    /// Checkbox state for the rows in `visible` (the current view, not the store).
    pub fn header_state<'a>(&self, visible: impl IntoIterator<Item = &'a RowKey>) -> HeaderCheckState {
        let mut total = 0usize;
        let mut selected = 0usize;
        for key in visible {
            total += 1;
            if self.keys.contains(key) {
                selected += 1;
            }
        }
        HeaderCheckState {
            checked: total > 0 && selected == total,
            indeterminate: selected > 0 && selected < total,
        }
    }

    /// Selected records, resolved against the store in store order.
    ///
    /// Rows paged or filtered out of the current view are still returned.
    pub fn selected_rows<'s>(&self, store: &'s RecordStore) -> Vec<&'s Record> {
        if self.keys.is_empty() {
            return Vec::new();
        }
        store
            .iter()
            .filter(|(key, _)| self.keys.contains(*key))
            .map(|(_, record)| record)
            .collect()
    }
}
