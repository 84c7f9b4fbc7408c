//! Per-row change sets sent in update batches

use serde::Serialize;

use super::Fields;
use super::RowId;

/// The changed fields of one row, serialized as `{"id": .., <field>: ..}`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Patch {
    pub id: RowId,
    #[serde(flatten)]
    pub changes: Fields,
}

impl Patch {
    /// Creates a patch for the given row.
    pub fn new(id: RowId, changes: Fields) -> Self {
        Self { id, changes }
    }

    /// Returns `true` if no field changed.
    pub fn is_empty(&self) -> bool {
        self.changes.is_empty()
    }
}
