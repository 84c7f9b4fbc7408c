//! Authoritative fetched rows

use indexmap::IndexMap;

use crate::model::Row;
use crate::model::RowId;

/// The rows last fetched from the server, in server order.
///
/// Rows are replaced wholesale on every successful fetch, never patched in
/// place. `generation` counts those replacements so overlays built against an
/// older snapshot can tell they are stale.
#[derive(Debug, Clone, Default)]
pub struct RowStore {
    pristine: IndexMap<RowId, Row>,
    generation: u64,
}

impl RowStore {
    /// Creates an empty store at generation 0.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces all rows and bumps the generation.
    ///
    /// A later duplicate id overwrites an earlier one but keeps its position.
    pub fn replace(&mut self, rows: Vec<Row>) {
        let before = self.pristine.len();
        self.pristine = rows.into_iter().map(|row| (row.id().clone(), row)).collect();
        self.generation += 1;
        log::debug!(
            "Row store generation {}: {} -> {} rows",
            self.generation,
            before,
            self.pristine.len()
        );
    }

    /// Removes rows ahead of the authoritative refetch. Does not change the
    /// generation.
    pub fn remove_optimistic(&mut self, ids: &[RowId]) {
        for id in ids {
            self.pristine.shift_remove(id);
        }
    }

    /// Returns the pristine row with this id.
    pub fn get(&self, id: &RowId) -> Option<&Row> {
        self.pristine.get(id)
    }

    /// Returns `true` if a row with this id is present.
    pub fn contains(&self, id: &RowId) -> bool {
        self.pristine.contains_key(id)
    }

    /// Iterates the rows in server order.
    pub fn rows(&self) -> impl Iterator<Item = &Row> {
        self.pristine.values()
    }

    /// Iterates the ids in server order.
    pub fn ids(&self) -> impl Iterator<Item = &RowId> {
        self.pristine.keys()
    }

    pub fn len(&self) -> usize {
        self.pristine.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pristine.is_empty()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}
