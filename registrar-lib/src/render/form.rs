//! Form view model and add-form state

use super::Locale;
use super::TableRenderer;
use crate::error::FieldError;
use crate::error::FieldValidationError;
use crate::error::ValidationError;
use crate::model::FieldSchema;
use crate::model::Fields;
use crate::model::ID_FIELD;
use crate::model::InputKind;
use crate::model::Schema;
use crate::model::Value;

/// A field value chosen or typed by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldChange {
    pub key: String,
    pub value: Value,
}

/// One entry of a rendered select control.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Choice {
    pub label: String,
    pub selected: bool,
}

/// The control drawn for a field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormControl {
    /// Free text entry; `kind` is `text`, `number`, `password` or `tel`.
    Input { kind: &'static str, text: String },
    /// Pick one label. Booleans are shown as a Yes/No select.
    Select { choices: Vec<Choice> },
    ReadOnly { text: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormFieldView {
    pub key: String,
    pub title: String,
    pub required: bool,
    pub control: FormControl,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormView {
    pub fields: Vec<FormFieldView>,
}

/// Renders a schema and current values into a [`FormView`] and maps input
/// back to typed [`FieldChange`]s.
///
/// Select fields show option labels and emit the option's value.
///
/// # Example
///
/// ```ignore
/// let form = FormRenderer::new(&schema, Locale::En);
/// let change = form.choose("entrance", "Yes")?;
/// assert_eq!(change.value, Value::Bool(true));
/// ```
#[derive(Debug, Clone, Copy)]
pub struct FormRenderer<'a> {
    schema: &'a Schema,
    locale: Locale,
}

impl<'a> FormRenderer<'a> {
    pub fn new(schema: &'a Schema, locale: Locale) -> Self {
        Self { schema, locale }
    }

    pub fn render(&self, values: &Fields) -> FormView {
        let fields = self
            .schema
            .iter()
            .map(|field| {
                let value = values.get(&field.key).unwrap_or(&Value::Null);
                FormFieldView {
                    key: field.key.clone(),
                    title: field.title.clone(),
                    required: field.required,
                    control: self.control(field, value),
                }
            })
            .collect();
        FormView { fields }
    }

    fn control(&self, field: &FieldSchema, value: &Value) -> FormControl {
        if !field.editable {
            return FormControl::ReadOnly {
                text: TableRenderer::new(self.locale).cell_text(field, value),
            };
        }

        let choices = self.choices(field);
        if choices.is_empty() {
            let text = match field.kind {
                InputKind::Password if !value.is_blank() => "••••••".to_string(),
                _ => value.display(),
            };
            return FormControl::Input {
                kind: field.kind.name(),
                text,
            };
        }

        let current = field.coerce(value).unwrap_or_else(|_| value.clone());
        FormControl::Select {
            choices: choices
                .into_iter()
                .map(|(label, v)| Choice {
                    selected: !current.is_null() && v == current,
                    label,
                })
                .collect(),
        }
    }

    /// Label/value pairs for select-like fields, empty for free input.
    fn choices(&self, field: &FieldSchema) -> Vec<(String, Value)> {
        match &field.kind {
            InputKind::Boolean => vec![
                (self.locale.yes().to_string(), Value::Bool(true)),
                (self.locale.no().to_string(), Value::Bool(false)),
            ],
            InputKind::Select(options) => options
                .iter()
                .map(|o| (o.label.clone(), o.value.clone()))
                .collect(),
            InputKind::Text | InputKind::Number | InputKind::Password | InputKind::Tel => Vec::new(),
        }
    }

    fn editable(&self, key: &str) -> Result<&'a FieldSchema, FieldError> {
        let field = self.schema.require(key)?;
        if !field.editable || key == ID_FIELD {
            return Err(FieldError::read_only(key));
        }
        Ok(field)
    }

    /// Maps a chosen label to the option's underlying value.
    pub fn choose(&self, key: &str, label: &str) -> Result<FieldChange, FieldError> {
        let field = self.editable(key)?;
        let choices = self.choices(field);
        if choices.is_empty() {
            return self.input(key, label);
        }

        let wanted = label.trim().to_lowercase();
        choices
            .into_iter()
            .find(|(l, _)| l.to_lowercase() == wanted)
            .map(|(_, value)| FieldChange {
                key: key.to_string(),
                value,
            })
            .ok_or_else(|| FieldError::coercion(key, label, "one of the options"))
    }

    /// Records typed text as-is; it is coerced when the form is submitted.
    ///
    /// For select-like fields the text is matched as a label first.
    pub fn input(&self, key: &str, raw: &str) -> Result<FieldChange, FieldError> {
        let field = self.editable(key)?;
        if !self.choices(field).is_empty() {
            if let Ok(change) = self.choose(key, raw) {
                return Ok(change);
            }
        }
        Ok(FieldChange {
            key: key.to_string(),
            value: Value::String(raw.to_string()),
        })
    }
}

/// State of an "add record" form.
///
/// Entered values survive a failed submit; [`FormState::close`] resets them.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormState {
    open: bool,
    values: Fields,
}

impl FormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opens the form with blank values for every editable field.
    pub fn open(&mut self, schema: &Schema) {
        self.values = schema
            .iter()
            .filter(|field| field.editable && field.key != ID_FIELD)
            .map(|field| (field.key.clone(), field.default_value()))
            .collect();
        self.open = true;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn values(&self) -> &Fields {
        &self.values
    }

    pub fn apply(&mut self, change: FieldChange) {
        self.values.insert(change.key, change.value);
    }

    /// Checks required fields and value types without sending anything.
    pub fn validate(&self, schema: &Schema) -> Result<(), ValidationError> {
        self.payload(schema).map(|_| ())
    }

    /// Coerced record body for a create request.
    ///
    /// Optional fields left blank are sent as null.
    pub fn payload(&self, schema: &Schema) -> Result<Fields, ValidationError> {
        let mut errors = Vec::new();
        let mut payload = Fields::new();

        for field in schema.iter().filter(|f| f.editable && f.key != ID_FIELD) {
            let raw = self.values.get(&field.key).unwrap_or(&Value::Null);
            match field.coerce(raw) {
                Ok(value) if value.is_null() && field.required => {
                    errors.push(FieldValidationError::required(&field.key));
                }
                Ok(value) => {
                    payload.insert(field.key.clone(), value);
                }
                Err(e) => errors.push(e.into()),
            }
        }

        ValidationError::check(errors)?;
        Ok(payload)
    }

    /// Closes the form and forgets the entered values.
    pub fn close(&mut self) {
        self.open = false;
        self.values.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SelectOption;

    fn schema() -> Schema {
        Schema::new(vec![
            FieldSchema::number("id", "ID").read_only(),
            FieldSchema::text("login", "Login").required(),
            FieldSchema::password("password", "Password").required(),
            FieldSchema::number("privilege", "Privilege"),
            FieldSchema::boolean("entrance", "Entrance"),
            FieldSchema::select(
                "group",
                "Group",
                vec![SelectOption::new("PI-21", 3), SelectOption::new("IS-22", 4)],
            ),
            FieldSchema::text("diploma", "Diploma").read_only(),
        ])
        .unwrap()
    }

    #[test]
    fn test_boolean_rendered_as_localized_select() {
        let schema = schema();
        let mut values = Fields::new();
        values.insert("entrance".into(), Value::Bool(false));

        let view = FormRenderer::new(&schema, Locale::En).render(&values);
        let entrance = view.fields.iter().find(|f| f.key == "entrance").unwrap();
        assert_eq!(
            entrance.control,
            FormControl::Select {
                choices: vec![
                    Choice { label: "Yes".into(), selected: false },
                    Choice { label: "No".into(), selected: true },
                ]
            }
        );
    }

    #[test]
    fn test_choose_emits_underlying_value() {
        let schema = schema();
        let form = FormRenderer::new(&schema, Locale::Ru);

        assert_eq!(form.choose("entrance", "Да").unwrap().value, Value::Bool(true));
        assert_eq!(form.choose("group", "is-22").unwrap().value, Value::Int(4));
        assert!(form.choose("group", "Nowhere").is_err());
    }

    #[test]
    fn test_read_only_fields() {
        let schema = schema();
        let form = FormRenderer::new(&schema, Locale::En);

        assert_eq!(form.input("diploma", "x"), Err(FieldError::read_only("diploma")));
        assert_eq!(form.input("id", "9"), Err(FieldError::read_only("id")));

        let mut values = Fields::new();
        values.insert("diploma".into(), "D-1".into());
        let view = form.render(&values);
        let diploma = view.fields.iter().find(|f| f.key == "diploma").unwrap();
        assert_eq!(diploma.control, FormControl::ReadOnly { text: "D-1".into() });
    }

    #[test]
    fn test_payload_validates_and_coerces() {
        let schema = schema();
        let form = FormRenderer::new(&schema, Locale::En);
        let mut state = FormState::new();
        state.open(&schema);
        assert!(state.is_open());
        assert!(!state.values().contains_key("id"));

        let err = state.validate(&schema).unwrap_err();
        assert_eq!(err.fields(), vec!["login", "password"]);

        state.apply(form.input("login", "admin").unwrap());
        state.apply(form.input("password", "secret").unwrap());
        state.apply(form.input("privilege", "2").unwrap());
        state.apply(form.input("entrance", "yes").unwrap());

        let payload = state.payload(&schema).unwrap();
        assert_eq!(payload.get("privilege"), Some(&Value::Int(2)));
        assert_eq!(payload.get("entrance"), Some(&Value::Bool(true)));
        assert_eq!(payload.get("group"), Some(&Value::Null));
        assert!(!payload.contains_key("diploma"));

        state.close();
        assert!(!state.is_open());
        assert!(state.values().is_empty());
    }
}
