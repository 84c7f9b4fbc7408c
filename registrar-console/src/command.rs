//! Console command parsing

use std::str::FromStr;

use registrar_lib::model::RowId;

use crate::error::ConsoleError;
use crate::pages::Page;

/// One line of console input.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Open(Page),
    Refresh,
    Search(String),
    Size(usize),
    Next,
    Prev,
    Page(usize),
    Select(Vec<RowId>),
    Unselect(Vec<RowId>),
    SelectAll,
    SelectNone,
    Set { id: RowId, key: String, value: String },
    Edit(RowId),
    Pending,
    Save,
    Add,
    Delete,
    Group(RowId),
    Enroll { student: RowId, group: RowId },
    Logout,
    Help,
    Quit,
}

pub const HELP: &str = "\
Pages
  open <users|students|groups|subjects>   switch table
  refresh                                 reload rows from the server
  search [term]                           filter rows; no term clears
  size <5|10|15|20>                       rows per page
  next | prev | page <n>                  move between pages

Selection
  select <id>... | unselect <id>...       tick or untick rows
  select-all | select-none                tick or untick every row

Editing
  set <id> <field> <value>                stage a change (empty value clears)
  edit <id>                               open the row editor
  pending                                 list staged changes
  save                                    send staged changes
  add                                     fill in and submit the add form
  delete                                  delete the selected rows

Groups
  group <id>                              show a group and its students
  enroll <student-id> <group-id>          add a student to a group

  logout | help | quit";

impl Command {
    /// Parses a line. Blank lines and `#` comments yield `None`.
    pub fn parse(line: &str) -> Result<Option<Self>, ConsoleError> {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            return Ok(None);
        }

        let (word, rest) = split_word(line);
        let command = match word.to_lowercase().as_str() {
            "open" => Command::Open(Page::from_str(required(rest, "open <page>")?).map_err(ConsoleError::usage)?),
            "refresh" | "r" => Command::Refresh,
            "search" | "/" => Command::Search(rest.to_string()),
            "size" => Command::Size(number(required(rest, "size <n>")?)?),
            "next" | "n" => Command::Next,
            "prev" | "p" => Command::Prev,
            "page" => Command::Page(number(required(rest, "page <n>")?)?),
            "select" => Command::Select(ids(required(rest, "select <id>...")?)),
            "unselect" => Command::Unselect(ids(required(rest, "unselect <id>...")?)),
            "select-all" => Command::SelectAll,
            "select-none" => Command::SelectNone,
            "set" => {
                let usage = "set <id> <field> <value>";
                let (id, rest) = split_word(required(rest, usage)?);
                let (key, value) = split_word(rest);
                if key.is_empty() {
                    return Err(ConsoleError::usage(format!("usage: {}", usage)));
                }
                Command::Set {
                    id: row_id(id),
                    key: key.to_string(),
                    value: value.to_string(),
                }
            }
            "edit" => Command::Edit(row_id(required(rest, "edit <id>")?)),
            "pending" => Command::Pending,
            "save" => Command::Save,
            "add" => Command::Add,
            "delete" => Command::Delete,
            "group" => Command::Group(row_id(required(rest, "group <id>")?)),
            "enroll" => {
                let usage = "enroll <student-id> <group-id>";
                let (student, group) = split_word(required(rest, usage)?);
                if group.is_empty() || group.contains(char::is_whitespace) {
                    return Err(ConsoleError::usage(format!("usage: {}", usage)));
                }
                Command::Enroll {
                    student: row_id(student),
                    group: row_id(group),
                }
            }
            "logout" => Command::Logout,
            "help" | "?" => Command::Help,
            "quit" | "exit" | "q" => Command::Quit,
            other => {
                return Err(ConsoleError::usage(format!(
                    "unknown command '{}' (type 'help')",
                    other
                )));
            }
        };
        Ok(Some(command))
    }
}

/// Splits off the first word; the remainder keeps its inner spacing.
fn split_word(s: &str) -> (&str, &str) {
    let s = s.trim_start();
    match s.find(char::is_whitespace) {
        Some(at) => (&s[..at], s[at..].trim()),
        None => (s, ""),
    }
}

fn required<'a>(rest: &'a str, usage: &str) -> Result<&'a str, ConsoleError> {
    if rest.is_empty() {
        Err(ConsoleError::usage(format!("usage: {}", usage)))
    } else {
        Ok(rest)
    }
}

fn number(s: &str) -> Result<usize, ConsoleError> {
    s.trim()
        .parse()
        .map_err(|_| ConsoleError::usage(format!("expected a number, got '{}'", s)))
}

fn row_id(s: &str) -> RowId {
    match RowId::from_str(s) {
        Ok(id) => id,
        Err(never) => match never {},
    }
}

fn ids(s: &str) -> Vec<RowId> {
    s.split(|c: char| c.is_whitespace() || c == ',')
        .filter(|part| !part.is_empty())
        .map(row_id)
        .collect()
}
