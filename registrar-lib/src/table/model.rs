//! Per-table state: rows plus the overlays built on them

use super::CheckState;
use super::EditBuffer;
use super::PageSize;
use super::PageWindow;
use super::RowStore;
use super::SelectionSet;
use super::ViewState;
use crate::error::FieldError;
use crate::model::Fields;
use crate::model::Row;
use crate::model::RowId;
use crate::model::Schema;
use crate::render::TableEvent;

/// What the front end should do after an event was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventOutcome {
    Updated,
    /// Open the row editor for this row.
    OpenEditor(RowId),
}

/// Everything one table needs: column schema, fetched rows, pending edits,
/// selection and view position.
#[derive(Debug, Clone)]
pub struct TableModel {
    schema: Schema,
    form_schema: Option<Schema>,
    store: RowStore,
    edits: EditBuffer,
    selection: SelectionSet,
    view: ViewState,
}

impl TableModel {
    pub fn new(schema: Schema, page_size: PageSize) -> Self {
        Self {
            schema,
            form_schema: None,
            store: RowStore::new(),
            edits: EditBuffer::new(),
            selection: SelectionSet::new(),
            view: ViewState::new(page_size),
        }
    }

    /// Uses a different schema for the add form than for the columns.
    pub fn with_form_schema(mut self, schema: Schema) -> Self {
        self.form_schema = Some(schema);
        self
    }

    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Schema of the add form; the column schema unless one was set.
    pub fn form_schema(&self) -> &Schema {
        self.form_schema.as_ref().unwrap_or(&self.schema)
    }

    pub fn store(&self) -> &RowStore {
        &self.store
    }

    pub fn edits(&self) -> &EditBuffer {
        &self.edits
    }

    pub fn selection(&self) -> &SelectionSet {
        &self.selection
    }

    pub fn view(&self) -> &ViewState {
        &self.view
    }

    pub fn view_mut(&mut self) -> &mut ViewState {
        &mut self.view
    }

    /// Installs a fresh snapshot. Overlays of vanished rows are pruned and
    /// edits that now match the fetched values are dropped.
    pub fn replace_rows(&mut self, rows: Vec<Row>) {
        self.store.replace(rows);
        let store = &self.store;
        self.selection.retain(|id| store.contains(id));
        self.edits.rebase(store, &self.schema);
    }

    /// Applies an event coming from the rendered table.
    pub fn apply(&mut self, event: TableEvent) -> Result<EventOutcome, FieldError> {
        match event {
            TableEvent::RowClicked(id) => {
                if !self.store.contains(&id) {
                    return Err(FieldError::UnknownRow { id: id.to_string() });
                }
                Ok(EventOutcome::OpenEditor(id))
            }
            TableEvent::RowChecked { id, checked } => {
                if checked && !self.store.contains(&id) {
                    return Err(FieldError::UnknownRow { id: id.to_string() });
                }
                self.selection.toggle_one(&id, checked);
                Ok(EventOutcome::Updated)
            }
            TableEvent::AllChecked(checked) => {
                self.selection.toggle_all(checked, self.store.ids());
                Ok(EventOutcome::Updated)
            }
            TableEvent::CellEdited { id, key, value } => {
                self.edits
                    .set_field(&self.store, &self.schema, &id, &key, value)?;
                Ok(EventOutcome::Updated)
            }
        }
    }

    /// The page currently visible under search and pagination.
    pub fn window(&self) -> PageWindow<'_> {
        self.view.window(self.store.rows())
    }

    pub fn total_pages(&self) -> usize {
        self.window().total_pages
    }

    pub fn next_page(&mut self) -> bool {
        let total = self.total_pages();
        self.view.next_page(total)
    }

    pub fn prev_page(&mut self) -> bool {
        self.view.prev_page()
    }

    pub fn go_to_page(&mut self, page: usize) -> bool {
        let total = self.total_pages();
        self.view.go_to(page, total)
    }

    /// Master checkbox state over all loaded rows.
    pub fn check_state(&self) -> CheckState {
        CheckState::from_counts(self.selection.len(), self.store.len())
    }

    /// Current values of a row with pending edits laid over the fetched ones.
    pub fn editor_values(&self, id: &RowId) -> Option<Fields> {
        let row = self.store.get(id)?;
        let mut values = row.fields().clone();
        for field in self.schema.iter() {
            if let Some(pending) = self.edits.pending_value(id, &field.key) {
                values.insert(field.key.clone(), pending.clone());
            }
        }
        Some(values)
    }

    /// Drops the pending edits of one row, e.g. when its editor is cancelled.
    pub fn discard_edits(&mut self, id: &RowId) {
        self.edits.discard(id);
    }

    pub(crate) fn edits_mut(&mut self) -> &mut EditBuffer {
        &mut self.edits
    }

    pub(crate) fn selection_mut(&mut self) -> &mut SelectionSet {
        &mut self.selection
    }

    pub(crate) fn store_mut(&mut self) -> &mut RowStore {
        &mut self.store
    }
}
