//! Table view model

use super::Locale;
use crate::model::FieldSchema;
use crate::model::InputKind;
use crate::model::RowId;
use crate::model::Value;
use crate::table::CheckState;
use crate::table::TableModel;

const PASSWORD_MASK: &str = "••••••";

/// Input coming back from a rendered table.
#[derive(Debug, Clone, PartialEq)]
pub enum TableEvent {
    /// A row was activated; the front end should open its editor.
    RowClicked(RowId),
    /// One row checkbox changed.
    RowChecked { id: RowId, checked: bool },
    /// The master checkbox changed; applies to every loaded row.
    AllChecked(bool),
    /// A cell was edited in place or through the row editor.
    CellEdited { id: RowId, key: String, value: Value },
}

/// Column header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub key: String,
    pub title: String,
    pub width: Option<String>,
}

/// One rendered cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cell {
    pub text: String,
    /// The cell shows an unsaved edit rather than the fetched value.
    pub edited: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableRowView {
    pub id: RowId,
    pub selected: bool,
    pub cells: Vec<Cell>,
}

/// Everything needed to draw one page of a table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableView {
    pub columns: Vec<Column>,
    pub master: CheckState,
    pub rows: Vec<TableRowView>,
    pub page: usize,
    pub total_pages: usize,
    pub can_prev: bool,
    pub can_next: bool,
    /// Rows matching the search term.
    pub matched: usize,
    /// Rows loaded in total.
    pub total: usize,
    pub selected: usize,
    /// Edited fields not yet saved.
    pub pending: usize,
}

/// Renders a [`TableModel`] into a [`TableView`].
///
/// # Example
///
/// ```ignore
/// let view = TableRenderer::new(Locale::En).render(&model);
/// for row in &view.rows {
///     let line: Vec<_> = row.cells.iter().map(|c| c.text.as_str()).collect();
///     println!("{}", line.join(" | "));
/// }
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct TableRenderer {
    locale: Locale,
}

impl TableRenderer {
    pub fn new(locale: Locale) -> Self {
        Self { locale }
    }

    pub fn locale(&self) -> Locale {
        self.locale
    }

    pub fn render(&self, model: &TableModel) -> TableView {
        let schema = model.schema();
        let columns = schema
            .iter()
            .map(|field| Column {
                key: field.key.clone(),
                title: field.title.clone(),
                width: field.width.clone(),
            })
            .collect();

        let window = model.window();
        let rows = window
            .rows
            .iter()
            .map(|row| {
                let id = row.id();
                let cells = schema
                    .iter()
                    .map(|field| match model.edits().pending_value(id, &field.key) {
                        Some(pending) => Cell {
                            text: self.cell_text(field, pending),
                            edited: true,
                        },
                        None => Cell {
                            text: self.cell_text(field, row.value(&field.key)),
                            edited: false,
                        },
                    })
                    .collect();
                TableRowView {
                    id: id.clone(),
                    selected: model.selection().contains(id),
                    cells,
                }
            })
            .collect();

        TableView {
            columns,
            master: model.check_state(),
            rows,
            page: window.page,
            total_pages: window.total_pages,
            can_prev: window.can_prev,
            can_next: window.can_next,
            matched: window.matched,
            total: model.store().len(),
            selected: model.selection().len(),
            pending: model.edits().pending_count(),
        }
    }

    /// Read-only text of one value under its field schema.
    pub fn cell_text(&self, field: &FieldSchema, value: &Value) -> String {
        if value.is_null() {
            return String::new();
        }
        match &field.kind {
            InputKind::Boolean => match field.coerce(value) {
                Ok(Value::Bool(b)) => self.locale.bool_label(b).to_string(),
                _ => value.display(),
            },
            InputKind::Select(_) => field
                .option_label(value)
                .map(str::to_string)
                .unwrap_or_else(|| value.display()),
            InputKind::Password => PASSWORD_MASK.to_string(),
            InputKind::Text | InputKind::Number | InputKind::Tel => value.display(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Row;
    use crate::model::Schema;
    use crate::model::SelectOption;
    use crate::table::PageSize;

    fn model() -> TableModel {
        let schema = Schema::new(vec![
            FieldSchema::number("id", "ID").read_only(),
            FieldSchema::text("surname", "Surname"),
            FieldSchema::boolean("entrance", "Entrance"),
            FieldSchema::select(
                "privilege",
                "Role",
                vec![SelectOption::new("Guest", 0), SelectOption::new("Admin", 2)],
            ),
            FieldSchema::password("password", "Password"),
        ])
        .unwrap();
        let mut model = TableModel::new(schema, PageSize::default());
        model.replace_rows(vec![
            Row::new(1).set("surname", "Ivanova").set("entrance", true).set("privilege", 2),
            Row::new(2).set("surname", "Petrov").set("entrance", false).set("password", "x"),
        ]);
        model
    }

    #[test]
    fn test_cells_use_localized_and_option_labels() {
        let model = model();
        let view = TableRenderer::new(Locale::En).render(&model);

        let first: Vec<_> = view.rows[0].cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(first, vec!["1", "Ivanova", "Yes", "Admin", ""]);

        let second: Vec<_> = view.rows[1].cells.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(second, vec!["2", "Petrov", "No", "", PASSWORD_MASK]);

        let ru = TableRenderer::new(Locale::Ru).render(&model);
        assert_eq!(ru.rows[0].cells[2].text, "Да");
    }

    #[test]
    fn test_pending_edits_overlay_cells() {
        let mut model = model();
        model
            .apply(TableEvent::CellEdited {
                id: RowId::Int(2),
                key: "entrance".into(),
                value: "true".into(),
            })
            .unwrap();

        let view = TableRenderer::new(Locale::En).render(&model);
        let cell = &view.rows[1].cells[2];
        assert_eq!(cell.text, "Yes");
        assert!(cell.edited);
        assert!(!view.rows[0].cells[2].edited);
        assert_eq!(view.pending, 1);
    }

    #[test]
    fn test_selection_and_master_state() {
        let mut model = model();
        let view = TableRenderer::default().render(&model);
        assert_eq!(view.master, CheckState::Unchecked);

        model
            .apply(TableEvent::RowChecked {
                id: RowId::Int(1),
                checked: true,
            })
            .unwrap();
        let view = TableRenderer::default().render(&model);
        assert_eq!(view.master, CheckState::Indeterminate);
        assert!(view.rows[0].selected);

        model.apply(TableEvent::AllChecked(true)).unwrap();
        let view = TableRenderer::default().render(&model);
        assert_eq!(view.master, CheckState::Checked);
        assert_eq!(view.selected, 2);
    }
}
