//! FieldError for row access and edits

/// Error type for reading, editing or coercing a single field.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum FieldError {
    /// The requested field does not exist in the row or schema.
    #[error("Field '{field}' not found")]
    Missing { field: String },

    /// The field exists but has a different type than requested.
    #[error("Field '{field}' type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        field: String,
        expected: &'static str,
        actual: &'static str,
    },

    /// No row with this id is present in the store.
    #[error("Row {id} is not loaded")]
    UnknownRow { id: String },

    /// The field is marked non-editable.
    #[error("Field '{field}' is read-only")]
    ReadOnly { field: String },

    /// The value cannot be converted to the field's input kind.
    #[error("Field '{field}': cannot use {value:?} as {expected}")]
    Coercion {
        field: String,
        value: String,
        expected: &'static str,
    },
}

impl FieldError {
    /// Creates a new missing field error.
    pub fn missing(field: impl Into<String>) -> Self {
        Self::Missing {
            field: field.into(),
        }
    }

    /// Creates a new type mismatch error.
    pub fn type_mismatch(field: impl Into<String>, expected: &'static str, actual: &'static str) -> Self {
        Self::TypeMismatch {
            field: field.into(),
            expected,
            actual,
        }
    }

    /// Creates a new read-only error.
    pub fn read_only(field: impl Into<String>) -> Self {
        Self::ReadOnly {
            field: field.into(),
        }
    }

    /// Creates a new coercion error.
    pub fn coercion(field: impl Into<String>, value: impl Into<String>, expected: &'static str) -> Self {
        Self::Coercion {
            field: field.into(),
            value: value.into(),
            expected,
        }
    }

    /// Returns the field key this error refers to, if any.
    pub fn field(&self) -> Option<&str> {
        match self {
            Self::Missing { field }
            | Self::TypeMismatch { field, .. }
            | Self::ReadOnly { field }
            | Self::Coercion { field, .. } => Some(field),
            Self::UnknownRow { .. } => None,
        }
    }
}
