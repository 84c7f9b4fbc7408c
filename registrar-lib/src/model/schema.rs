//! Declarative field schemas

use super::Fields;
use super::Value;
use crate::error::Error;
use crate::error::FieldError;

/// One entry of a select control: the label shown and the value sent.
#[derive(Debug, Clone, PartialEq)]
pub struct SelectOption {
    pub label: String,
    pub value: Value,
}

impl SelectOption {
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// How a field is entered and displayed.
///
/// Closed on purpose: renderers match it exhaustively.
#[derive(Debug, Clone, PartialEq)]
pub enum InputKind {
    Text,
    Number,
    Password,
    Tel,
    Boolean,
    /// Fixed choices, in display order.
    Select(Vec<SelectOption>),
}

impl InputKind {
    /// Short name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            InputKind::Text => "text",
            InputKind::Number => "number",
            InputKind::Password => "password",
            InputKind::Tel => "tel",
            InputKind::Boolean => "boolean",
            InputKind::Select(_) => "select",
        }
    }
}

/// Description of one column of a table or one field of a form.
///
/// # Example
///
/// ```
/// use registrar_lib::model::FieldSchema;
///
/// let login = FieldSchema::text("login", "Login").required().width("28%");
/// let privilege = FieldSchema::number("privilege", "Privilege");
/// let id = FieldSchema::number("id", "ID").read_only();
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct FieldSchema {
    pub key: String,
    pub title: String,
    pub width: Option<String>,
    pub kind: InputKind,
    pub required: bool,
    pub editable: bool,
}

impl FieldSchema {
    /// Creates an optional, editable field.
    pub fn new(key: impl Into<String>, title: impl Into<String>, kind: InputKind) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            width: None,
            kind,
            required: false,
            editable: true,
        }
    }

    pub fn text(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(key, title, InputKind::Text)
    }

    pub fn number(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(key, title, InputKind::Number)
    }

    pub fn password(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(key, title, InputKind::Password)
    }

    pub fn tel(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(key, title, InputKind::Tel)
    }

    pub fn boolean(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self::new(key, title, InputKind::Boolean)
    }

    pub fn select(key: impl Into<String>, title: impl Into<String>, options: Vec<SelectOption>) -> Self {
        Self::new(key, title, InputKind::Select(options))
    }

    /// Marks the field as required at submit time.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Marks the field as display-only.
    pub fn read_only(mut self) -> Self {
        self.editable = false;
        self
    }

    /// Sets the display width hint (e.g. `"10%"`).
    pub fn width(mut self, width: impl Into<String>) -> Self {
        self.width = Some(width.into());
        self
    }

    /// Converts a raw input value into the value sent to the server.
    ///
    /// Inputs arrive as strings from text controls and selects; this is the
    /// only place they become numbers and booleans. Already-typed values pass
    /// through unchanged, and blank input becomes null.
    pub fn coerce(&self, value: &Value) -> Result<Value, FieldError> {
        if value.is_blank() {
            return Ok(Value::Null);
        }
        match &self.kind {
            InputKind::Text | InputKind::Password | InputKind::Tel => Ok(match value {
                Value::String(s) => Value::String(s.clone()),
                Value::Json(_) => value.clone(),
                other => Value::String(other.display()),
            }),
            InputKind::Number => self.coerce_number(value),
            InputKind::Boolean => self.coerce_bool(value),
            InputKind::Select(options) => self.coerce_select(options, value),
        }
    }

    fn coerce_number(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Int(n) => Ok(Value::Int(*n)),
            Value::Float(f) => Ok(normalize_float(*f)),
            Value::String(s) => {
                let trimmed = s.trim();
                if trimmed.is_empty() {
                    return Ok(Value::Null);
                }
                if let Ok(n) = trimmed.parse::<i64>() {
                    return Ok(Value::Int(n));
                }
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() => Ok(normalize_float(f)),
                    _ => Err(FieldError::coercion(&self.key, s, "number")),
                }
            }
            other => Err(FieldError::coercion(&self.key, other.display(), "number")),
        }
    }

    fn coerce_bool(&self, value: &Value) -> Result<Value, FieldError> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(*b)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::String(s) => match s.trim().to_lowercase().as_str() {
                "" => Ok(Value::Null),
                "true" | "1" => Ok(Value::Bool(true)),
                "false" | "0" => Ok(Value::Bool(false)),
                _ => Err(FieldError::coercion(&self.key, s, "boolean")),
            },
            other => Err(FieldError::coercion(&self.key, other.display(), "boolean")),
        }
    }

    fn coerce_select(&self, options: &[SelectOption], value: &Value) -> Result<Value, FieldError> {
        if let Some(option) = options.iter().find(|o| &o.value == value) {
            return Ok(option.value.clone());
        }
        let text = value.display();
        options
            .iter()
            .find(|o| o.value.display() == text)
            .or_else(|| options.iter().find(|o| o.label == text))
            .map(|o| o.value.clone())
            .ok_or_else(|| FieldError::coercion(&self.key, text, "one of the options"))
    }

    /// Returns the option label for a value, if this is a select field.
    pub fn option_label(&self, value: &Value) -> Option<&str> {
        match &self.kind {
            InputKind::Select(options) => {
                let text = value.display();
                options
                    .iter()
                    .find(|o| &o.value == value || o.value.display() == text)
                    .map(|o| o.label.as_str())
            }
            _ => None,
        }
    }

    /// Initial value of this field in an empty add form.
    pub fn default_value(&self) -> Value {
        match &self.kind {
            InputKind::Boolean => Value::Bool(false),
            InputKind::Select(options) if self.required => {
                options.first().map(|o| o.value.clone()).unwrap_or_default()
            }
            _ => Value::Null,
        }
    }
}

fn normalize_float(f: f64) -> Value {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Value::Int(f as i64)
    } else {
        Value::Float(f)
    }
}

/// Ordered set of fields with unique keys.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Schema {
    fields: Vec<FieldSchema>,
}

impl Schema {
    /// Creates a schema. Fails if two fields share a key.
    pub fn new(fields: Vec<FieldSchema>) -> Result<Self, Error> {
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.key == field.key) {
                return Err(Error::InvalidOperation(format!(
                    "duplicate field key '{}' in schema",
                    field.key
                )));
            }
        }
        Ok(Self { fields })
    }

    /// Returns the field with the given key.
    pub fn field(&self, key: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.key == key)
    }

    /// Returns the field with the given key or a `Missing` error.
    pub fn require(&self, key: &str) -> Result<&FieldSchema, FieldError> {
        self.field(key).ok_or_else(|| FieldError::missing(key))
    }

    /// Iterates fields in display order.
    pub fn iter(&self) -> impl Iterator<Item = &FieldSchema> {
        self.fields.iter()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Blank values for every field, used to open an add form.
    pub fn defaults(&self) -> Fields {
        self.fields
            .iter()
            .map(|f| (f.key.clone(), f.default_value()))
            .collect()
    }
}
