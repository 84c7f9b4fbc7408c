//! Errors surfaced at the table engine boundary

use super::AuthError;
use super::Error;
use super::ValidationError;

/// The mutation that failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Create,
    Update,
    Delete,
    Link,
}

impl std::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Create => "create",
            Self::Update => "update",
            Self::Delete => "delete",
            Self::Link => "link",
        })
    }
}

/// Failure of a [`SyncEngine`](crate::table::SyncEngine) operation.
///
/// Every network error is converted into one of these at the engine
/// boundary. A multi-row update that the server partly rejects is reported
/// as a single `Mutation` failure for the whole batch.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Reading rows failed; the previous rows are still shown.
    #[error("Failed to load {resource}: {source}")]
    Fetch {
        resource: String,
        #[source]
        source: Error,
    },

    /// The credential is missing or was rejected.
    #[error("Authentication required: {0}")]
    Auth(#[source] AuthError),

    /// A required field is empty or a value cannot be coerced.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// A create, update or delete request was sent and failed.
    #[error("Failed to {operation} {resource}: {source}")]
    Mutation {
        operation: MutationKind,
        resource: String,
        #[source]
        source: Error,
    },
}

impl SyncError {
    /// Classifies a failed read.
    pub fn fetch(resource: impl Into<String>, err: Error) -> Self {
        Self::classify(err, |source| Self::Fetch {
            resource: resource.into(),
            source,
        })
    }

    /// Classifies a failed mutation.
    pub fn mutation(operation: MutationKind, resource: impl Into<String>, err: Error) -> Self {
        Self::classify(err, |source| Self::Mutation {
            operation,
            resource: resource.into(),
            source,
        })
    }

    fn classify(err: Error, otherwise: impl FnOnce(Error) -> Self) -> Self {
        match err {
            Error::Auth(auth) => Self::Auth(auth),
            Error::Validation(validation) => Self::Validation(validation),
            Error::Api(api) if api.status_code() == Some(401) => Self::Auth(AuthError::Rejected {
                status: 401,
                message: match &api {
                    super::ApiError::Http { message, .. } => message.clone(),
                    other => other.to_string(),
                },
            }),
            other => otherwise(other),
        }
    }

    /// Returns `true` for authentication failures.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Auth(_))
    }
}
