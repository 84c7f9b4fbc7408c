//! The resources the console can open and their column schemas

use std::fmt;
use std::str::FromStr;

use registrar_lib::api::Resource;
use registrar_lib::error::Error;
use registrar_lib::model::FieldSchema;
use registrar_lib::model::Schema;
use registrar_lib::table::PageSize;
use registrar_lib::table::TableModel;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Page {
    Users,
    Students,
    Groups,
    Subjects,
}

impl Page {
    pub const ALL: [Page; 4] = [Page::Users, Page::Students, Page::Groups, Page::Subjects];

    pub fn resource(self) -> Resource {
        match self {
            Page::Users => Resource::USER,
            Page::Students => Resource::STUDENT,
            Page::Groups => Resource::GROUP,
            Page::Subjects => Resource::SUBJECT,
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Users => "Пользователи",
            Page::Students => "Студенты",
            Page::Groups => "Группы",
            Page::Subjects => "Предметы",
        }
    }

    /// Table columns.
    pub fn columns(self) -> Result<Schema, Error> {
        let fields = match self {
            Page::Users => vec![
                id().width("5%"),
                FieldSchema::text("login", "Логин").required().width("28%"),
                FieldSchema::text("name", "Имя").width("19%"),
                FieldSchema::text("surname", "Фамилия").width("19%"),
                FieldSchema::text("lastname", "Отчество").width("19%"),
                FieldSchema::number("privilege", "Привилегия").width("10%"),
            ],
            Page::Students => vec![
                id().width("3%"),
                FieldSchema::text("educational_id", "Код Студента").required().width("11%"),
                FieldSchema::text("group", "Группа").read_only().width("11%"),
                FieldSchema::text("surname", "Фамилия").width("16%"),
                FieldSchema::text("name", "Имя").width("15%"),
                FieldSchema::text("lastname", "Отчество").width("15%"),
                FieldSchema::boolean("entrance", "Пропуск").width("10%"),
                FieldSchema::text("diploma", "Диплом").read_only().width("10%"),
                FieldSchema::text("exams", "Экзамены").read_only().width("10%"),
            ],
            Page::Groups | Page::Subjects => vec![
                id().width("10%"),
                FieldSchema::text("name", "Название").required().width("90%"),
            ],
        };
        Schema::new(fields)
    }

    /// Fields of the add form.
    pub fn add_form(self) -> Result<Schema, Error> {
        let fields = match self {
            Page::Users => vec![
                FieldSchema::text("login", "Логин").required(),
                FieldSchema::password("password", "Пароль").required(),
                FieldSchema::text("name", "Имя").required(),
                FieldSchema::text("surname", "Фамилия").required(),
                FieldSchema::text("lastname", "Отчество"),
                FieldSchema::number("privilege", "Привилегия"),
            ],
            Page::Students => vec![
                FieldSchema::text("educational_id", "Код Студента").required(),
                FieldSchema::text("surname", "Фамилия"),
                FieldSchema::text("name", "Имя"),
                FieldSchema::text("lastname", "Отчество"),
                FieldSchema::boolean("entrance", "Пропуск").required(),
            ],
            Page::Groups | Page::Subjects => vec![FieldSchema::text("name", "Название").required()],
        };
        Schema::new(fields)
    }

    /// Empty table model for this page.
    pub fn model(self, page_size: PageSize) -> Result<TableModel, Error> {
        Ok(TableModel::new(self.columns()?, page_size).with_form_schema(self.add_form()?))
    }
}

fn id() -> FieldSchema {
    FieldSchema::number("id", "ID").read_only()
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Page::Users => "users",
            Page::Students => "students",
            Page::Groups => "groups",
            Page::Subjects => "subjects",
        };
        f.write_str(name)
    }
}

impl FromStr for Page {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "users" | "user" => Ok(Page::Users),
            "students" | "student" => Ok(Page::Students),
            "groups" | "group" => Ok(Page::Groups),
            "subjects" | "subject" => Ok(Page::Subjects),
            other => {
                let known: Vec<String> = Page::ALL.iter().map(Page::to_string).collect();
                Err(format!("unknown page '{}' (expected one of: {})", other, known.join(", ")))
            }
        }
    }
}
