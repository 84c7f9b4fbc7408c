//! Row selection for bulk actions

use std::collections::BTreeSet;

use crate::model::RowId;

/// Tri-state of a "select all" checkbox.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CheckState {
    Unchecked,
    Checked,
    Indeterminate,
}

impl CheckState {
    /// Derives the state from the selection size and the row count.
    pub fn from_counts(selected: usize, total: usize) -> Self {
        if selected == 0 {
            CheckState::Unchecked
        } else if selected == total {
            CheckState::Checked
        } else {
            CheckState::Indeterminate
        }
    }
}

/// Ids chosen for a bulk action.
///
/// Independent of filtering and paging: rows hidden by the current search or
/// on another page stay selected.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SelectionSet {
    ids: BTreeSet<RowId>,
}

impl SelectionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects or unselects exactly the given ids.
    ///
    /// Pass every id in the table for "select all", or the ids of one group
    /// card for a narrower scope.
    pub fn toggle_all<'a>(&mut self, checked: bool, ids: impl IntoIterator<Item = &'a RowId>) {
        for id in ids {
            if checked {
                self.ids.insert(id.clone());
            } else {
                self.ids.remove(id);
            }
        }
    }

    pub fn toggle_one(&mut self, id: &RowId, checked: bool) {
        if checked {
            self.ids.insert(id.clone());
        } else {
            self.ids.remove(id);
        }
    }

    pub fn contains(&self, id: &RowId) -> bool {
        self.ids.contains(id)
    }

    /// Drops ids the predicate rejects, e.g. rows gone after a refresh.
    pub fn retain(&mut self, mut keep: impl FnMut(&RowId) -> bool) {
        self.ids.retain(|id| keep(id));
    }

    pub fn remove_all(&mut self, ids: &[RowId]) {
        for id in ids {
            self.ids.remove(id);
        }
    }

    pub fn clear(&mut self) {
        self.ids.clear();
    }

    /// Selected ids in ascending order.
    pub fn ids(&self) -> Vec<RowId> {
        self.ids.iter().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Master checkbox state against `total` rows.
    pub fn check_state(&self, total: usize) -> CheckState {
        CheckState::from_counts(self.ids.len(), total)
    }
}
