//! Error types

mod api;
mod auth;
mod detail;
mod field;
mod sync;
mod validation;

use std::time::Duration;

pub use api::*;
pub use auth::*;
pub use detail::*;
pub use field::*;
pub use sync::*;
pub use validation::*;

/// Crate-level error returned by client calls.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Transport or HTTP failure.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Missing or rejected credential.
    #[error(transparent)]
    Auth(#[from] AuthError),

    /// Client-side validation failed before any request was sent.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A field could not be read, edited or coerced.
    #[error(transparent)]
    Field(#[from] FieldError),

    /// A request body could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The operation is not valid in the current state.
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// The server kept answering 429 after all retries.
    #[error("Rate limited (retry after {retry_after:?})")]
    RateLimit {
        /// Server-suggested wait, if sent.
        retry_after: Option<Duration>,
    },
}

impl Error {
    /// Returns `true` if this error means the credential is missing or was
    /// refused by the server.
    pub fn is_auth(&self) -> bool {
        match self {
            Self::Auth(_) => true,
            Self::Api(api) => api.status_code() == Some(401),
            _ => false,
        }
    }

    /// Returns the HTTP status code, if the server answered.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::Api(api) => api.status_code(),
            Self::Auth(AuthError::Rejected { status, .. }) => Some(*status),
            _ => None,
        }
    }
}
