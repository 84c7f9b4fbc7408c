//! Authentication error types

/// Errors raised by the session/token collaborator or the login flow.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// No token is stored; the request was never sent.
    #[error("Not signed in")]
    MissingToken,

    /// The server refused the bearer credential.
    #[error("Credential rejected (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    /// Invalid login or password.
    #[error("Invalid credentials")]
    InvalidCredentials,

    /// Network error during authentication.
    #[error("Network error during auth: {0}")]
    Network(#[from] reqwest::Error),

    /// Failed to parse authentication response.
    #[error("Auth response parse error: {0}")]
    Parse(String),
}
