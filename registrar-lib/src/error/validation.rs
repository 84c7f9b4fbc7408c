//! Validation error types

use super::FieldError;

/// Error information for a specific field that failed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldValidationError {
    /// The field that failed validation.
    pub field: String,
    /// Human-readable validation error message.
    pub message: String,
    /// Optional error code.
    pub code: Option<String>,
}

impl FieldValidationError {
    /// Creates a new field validation error.
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: None,
        }
    }

    /// Creates a new field validation error with an error code.
    pub fn with_code(field: impl Into<String>, message: impl Into<String>, code: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
            code: Some(code.into()),
        }
    }

    /// A required field left empty.
    pub fn required(field: impl Into<String>) -> Self {
        Self::with_code(field, "is required", "required")
    }
}

impl std::fmt::Display for FieldValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if let Some(code) = &self.code {
            write!(f, "{}: {} ({})", self.field, self.message, code)
        } else {
            write!(f, "{}: {}", self.field, self.message)
        }
    }
}

impl From<FieldError> for FieldValidationError {
    fn from(err: FieldError) -> Self {
        let field = err.field().unwrap_or_default().to_string();
        Self::with_code(field, err.to_string(), "invalid")
    }
}

/// Client-side validation failure, raised before any request is sent.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("Validation failed: {}", .errors.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", "))]
pub struct ValidationError {
    /// Every field that failed, in schema order.
    pub errors: Vec<FieldValidationError>,
}

impl ValidationError {
    /// Wraps a list of field errors.
    pub fn new(errors: Vec<FieldValidationError>) -> Self {
        Self { errors }
    }

    /// Returns `Ok(())` when the list is empty.
    pub fn check(errors: Vec<FieldValidationError>) -> Result<(), Self> {
        if errors.is_empty() {
            Ok(())
        } else {
            Err(Self { errors })
        }
    }

    /// Returns the keys of the failing fields.
    pub fn fields(&self) -> Vec<&str> {
        self.errors.iter().map(|e| e.field.as_str()).collect()
    }
}

impl From<FieldError> for ValidationError {
    fn from(err: FieldError) -> Self {
        Self::new(vec![err.into()])
    }
}
