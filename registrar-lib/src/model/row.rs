//! Rows and row identifiers

use std::convert::Infallible;
use std::str::FromStr;

use indexmap::IndexMap;
use serde::Deserialize;
use serde::Serialize;

use super::Value;
use crate::error::FieldError;

/// Ordered field map, as sent and received by the API.
pub type Fields = IndexMap<String, Value>;

/// Name of the identifier field every row carries.
pub const ID_FIELD: &str = "id";

/// Stable identifier of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowId {
    Int(i64),
    Str(String),
}

impl RowId {
    /// Extracts an id from a field value.
    pub fn from_value(value: &Value) -> Result<Self, FieldError> {
        match value {
            Value::Int(n) => Ok(RowId::Int(*n)),
            Value::String(s) => Ok(RowId::Str(s.clone())),
            other => Err(FieldError::type_mismatch(ID_FIELD, "int or string", other.type_name())),
        }
    }

    /// Converts the id back into a field value.
    pub fn to_value(&self) -> Value {
        match self {
            RowId::Int(n) => Value::Int(*n),
            RowId::Str(s) => Value::String(s.clone()),
        }
    }
}

impl std::fmt::Display for RowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RowId::Int(n) => write!(f, "{}", n),
            RowId::Str(s) => f.write_str(s),
        }
    }
}

/// Parses user input: integers become [`RowId::Int`], anything else a string id.
impl FromStr for RowId {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().parse::<i64>() {
            Ok(n) => RowId::Int(n),
            Err(_) => RowId::Str(s.trim().to_string()),
        })
    }
}

impl From<i64> for RowId {
    fn from(v: i64) -> Self {
        RowId::Int(v)
    }
}

impl From<i32> for RowId {
    fn from(v: i32) -> Self {
        RowId::Int(i64::from(v))
    }
}

impl From<&str> for RowId {
    fn from(v: &str) -> Self {
        RowId::Str(v.to_string())
    }
}

/// One record of a managed resource.
///
/// Fields keep the order the server sent them in. The `id` field is required
/// and cannot be changed once the row exists; extra fields not described by
/// any schema are kept as-is.
///
/// # Example
///
/// ```
/// use registrar_lib::model::{Row, RowId};
///
/// let row: Row = serde_json::from_str(r#"{"id": 5, "name": "Anna"}"#).unwrap();
/// assert_eq!(row.id(), &RowId::Int(5));
/// assert_eq!(row.get_str("name").unwrap(), Some("Anna"));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Fields", into = "Fields")]
pub struct Row {
    id: RowId,
    fields: Fields,
}

impl Row {
    /// Builds a row from a field map. Fails if `id` is missing or not an id.
    pub fn from_fields(fields: Fields) -> Result<Self, FieldError> {
        let id = fields
            .get(ID_FIELD)
            .ok_or_else(|| FieldError::missing(ID_FIELD))
            .and_then(RowId::from_value)?;
        Ok(Self { id, fields })
    }

    /// Creates a row with only an id (builder pattern with [`Row::set`]).
    pub fn new(id: impl Into<RowId>) -> Self {
        let id = id.into();
        let mut fields = Fields::new();
        fields.insert(ID_FIELD.to_string(), id.to_value());
        Self { id, fields }
    }

    /// Sets a field value (builder pattern). Setting `id` is ignored.
    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        if field != ID_FIELD {
            self.fields.insert(field, value.into());
        }
        self
    }

    /// Returns the row identifier.
    pub fn id(&self) -> &RowId {
        &self.id
    }

    /// Returns a reference to the field value, if it exists.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Returns the value of a field, or null when absent.
    pub fn value(&self, field: &str) -> &Value {
        static NULL: Value = Value::Null;
        self.fields.get(field).unwrap_or(&NULL)
    }

    /// Returns `true` if the row contains the given field.
    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    /// Returns all fields in server order.
    pub fn fields(&self) -> &Fields {
        &self.fields
    }

    /// Returns a string field. `Ok(None)` when the field is null.
    pub fn get_str(&self, field: &str) -> Result<Option<&str>, FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s)),
            Some(other) => Err(FieldError::type_mismatch(field, "string", other.type_name())),
        }
    }

    /// Returns an integer field. `Ok(None)` when the field is null.
    pub fn get_i64(&self, field: &str) -> Result<Option<i64>, FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Int(n)) => Ok(Some(*n)),
            Some(other) => Err(FieldError::type_mismatch(field, "int", other.type_name())),
        }
    }

    /// Returns a boolean field. `Ok(None)` when the field is null.
    pub fn get_bool(&self, field: &str) -> Result<Option<bool>, FieldError> {
        match self.get(field) {
            None => Err(FieldError::missing(field)),
            Some(Value::Null) => Ok(None),
            Some(Value::Bool(b)) => Ok(Some(*b)),
            Some(other) => Err(FieldError::type_mismatch(field, "bool", other.type_name())),
        }
    }

    /// Returns `true` if any field, stringified, contains `needle`.
    ///
    /// `needle` must already be lowercase.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        self.fields
            .values()
            .any(|value| value.display().to_lowercase().contains(needle))
    }
}

impl TryFrom<Fields> for Row {
    type Error = FieldError;

    fn try_from(fields: Fields) -> Result<Self, Self::Error> {
        Row::from_fields(fields)
    }
}

impl From<Row> for Fields {
    fn from(row: Row) -> Self {
        row.fields
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_keeps_field_order() {
        let row: Row =
            serde_json::from_str(r#"{"id": 1, "surname": "Ivanova", "name": "Anna", "extra": [1, 2]}"#).unwrap();
        let keys: Vec<&str> = row.fields().keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["id", "surname", "name", "extra"]);
        assert_eq!(row.get("extra").map(Value::type_name), Some("json"));
    }

    #[test]
    fn test_deserialize_requires_id() {
        let result: Result<Row, _> = serde_json::from_str(r#"{"name": "Anna"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_string_ids() {
        let row: Row = serde_json::from_str(r#"{"id": "MATH-1", "name": "Algebra"}"#).unwrap();
        assert_eq!(row.id(), &RowId::Str("MATH-1".into()));
    }

    #[test]
    fn test_set_cannot_change_id() {
        let row = Row::new(3).set("id", 4).set("name", "Boris");
        assert_eq!(row.id(), &RowId::Int(3));
        assert_eq!(row.value("id"), &Value::Int(3));
    }

    #[test]
    fn test_typed_getters() {
        let row = Row::new(1).set("entrance", false).set("lastname", Value::Null);
        assert_eq!(row.get_bool("entrance").unwrap(), Some(false));
        assert_eq!(row.get_str("lastname").unwrap(), None);
        assert!(matches!(row.get_str("entrance"), Err(FieldError::TypeMismatch { .. })));
        assert!(matches!(row.get_i64("missing"), Err(FieldError::Missing { .. })));
    }

    #[test]
    fn test_row_id_from_str() {
        assert_eq!("42".parse::<RowId>().unwrap(), RowId::Int(42));
        assert_eq!("ab".parse::<RowId>().unwrap(), RowId::Str("ab".into()));
    }
}
