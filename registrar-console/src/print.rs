//! Plain-text drawing of table and form view models

use registrar_lib::api::GroupDetail;
use registrar_lib::render::FormControl;
use registrar_lib::render::FormFieldView;
use registrar_lib::render::TableView;
use registrar_lib::table::CheckState;
use unicode_width::UnicodeWidthChar;
use unicode_width::UnicodeWidthStr;

/// Widest a column may grow before its cells are cut.
const MAX_COLUMN_WIDTH: usize = 28;
const SEPARATOR: &str = " │ ";

fn checkbox(state: CheckState) -> &'static str {
    match state {
        CheckState::Checked => "[x]",
        CheckState::Unchecked => "[ ]",
        CheckState::Indeterminate => "[-]",
    }
}

/// Cuts `text` to at most `width` terminal columns, marking the cut with `…`.
fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn pad(text: &str, width: usize) -> String {
    let fill = width.saturating_sub(text.width());
    format!("{}{}", text, " ".repeat(fill))
}

/// Draws one page of a table followed by a status line.
///
/// Cells holding unsaved edits are marked with `*`.
pub fn table(view: &TableView) -> String {
    let cells: Vec<Vec<String>> = view
        .rows
        .iter()
        .map(|row| {
            row.cells
                .iter()
                .map(|cell| {
                    if cell.edited {
                        format!("{}*", cell.text)
                    } else {
                        cell.text.clone()
                    }
                })
                .collect()
        })
        .collect();

    let widths: Vec<usize> = view
        .columns
        .iter()
        .enumerate()
        .map(|(i, column)| {
            cells
                .iter()
                .map(|row| row[i].width())
                .chain(std::iter::once(column.title.width()))
                .max()
                .unwrap_or(0)
                .min(MAX_COLUMN_WIDTH)
        })
        .collect();

    let mut lines = Vec::with_capacity(view.rows.len() + 3);

    let header: Vec<String> = view
        .columns
        .iter()
        .zip(&widths)
        .map(|(column, &w)| pad(&truncate(&column.title, w), w))
        .collect();
    lines.push(format!("{} {}", checkbox(view.master), header.join(SEPARATOR)));

    let rule: Vec<String> = widths.iter().map(|&w| "─".repeat(w)).collect();
    lines.push(format!("{} {}", "───", rule.join("─┼─")));

    for (row, texts) in view.rows.iter().zip(&cells) {
        let mark = if row.selected { "[x]" } else { "[ ]" };
        let line: Vec<String> = texts
            .iter()
            .zip(&widths)
            .map(|(text, &w)| pad(&truncate(text, w), w))
            .collect();
        lines.push(format!("{} {}", mark, line.join(SEPARATOR).trim_end()));
    }

    if view.rows.is_empty() {
        lines.push("    (no rows)".to_string());
    }

    lines.push(status(view));
    lines.join("\n")
}

fn status(view: &TableView) -> String {
    let mut parts = vec![format!("page {}/{}", view.page, view.total_pages.max(1))];
    if view.matched == view.total {
        parts.push(format!("{} rows", view.total));
    } else {
        parts.push(format!("{} of {} rows", view.matched, view.total));
    }
    if view.selected > 0 {
        parts.push(format!("{} selected", view.selected));
    }
    if view.pending > 0 {
        parts.push(format!("{} unsaved", view.pending));
    }
    let nav = match (view.can_prev, view.can_next) {
        (true, true) => " ‹ prev · next ›",
        (true, false) => " ‹ prev",
        (false, true) => " next ›",
        (false, false) => "",
    };
    format!("{}{}", parts.join(" · "), nav)
}

/// Prompt text for one form field, listing choices for selects.
pub fn field_prompt(field: &FormFieldView) -> String {
    let marker = if field.required { "*" } else { "" };
    match &field.control {
        FormControl::Input { text, .. } if text.is_empty() => format!("{}{}: ", field.title, marker),
        FormControl::Input { text, .. } => format!("{}{} [{}]: ", field.title, marker, text),
        FormControl::Select { choices } => {
            let labels: Vec<String> = choices
                .iter()
                .map(|c| {
                    if c.selected {
                        format!("({})", c.label)
                    } else {
                        c.label.clone()
                    }
                })
                .collect();
            format!("{}{} {{{}}}: ", field.title, marker, labels.join("/"))
        }
        FormControl::ReadOnly { text } => format!("{}: {}", field.title, text),
    }
}

/// Group info card followed by its student table.
pub fn group_card(detail: &GroupDetail, students: &TableView) -> String {
    let created = detail
        .created_at
        .map(|t| t.format("%d.%m.%Y %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "Group {} · {}\nCreated: {}\nStudents: {}\n\n{}",
        detail.id,
        detail.name,
        created,
        detail.students_count(),
        table(students)
    )
}
