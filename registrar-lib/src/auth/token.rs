//! TokenProvider trait and AccessToken

use async_trait::async_trait;

/// A bearer token issued by the records service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    /// The bearer token used for API authentication.
    pub access_token: String,
    /// Token type reported by the server, normally `bearer`.
    pub token_type: String,
}

impl AccessToken {
    /// Creates a new bearer access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            token_type: "bearer".to_string(),
        }
    }

    /// Returns the token as a bearer authorization header value.
    pub fn as_bearer(&self) -> String {
        format!("Bearer {}", self.access_token)
    }
}

/// Source of the credential attached to every request.
///
/// The client calls `get_token` before each request and never sends a
/// request when it returns `None`. Providers do not validate or refresh
/// tokens; a token the server no longer accepts comes back as
/// [`AuthError::Rejected`](crate::error::AuthError::Rejected) and the caller
/// decides whether to sign in again.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use registrar_lib::auth::{AccessToken, TokenProvider};
///
/// struct EnvTokenProvider;
///
/// #[async_trait]
/// impl TokenProvider for EnvTokenProvider {
///     async fn get_token(&self) -> Option<AccessToken> {
///         std::env::var("REGISTRAR_TOKEN").ok().map(AccessToken::new)
///     }
///
///     async fn clear_token(&self) {}
/// }
/// ```
#[async_trait]
pub trait TokenProvider: Send + Sync {
    /// Returns the current token, or `None` when signed out.
    async fn get_token(&self) -> Option<AccessToken>;

    /// Forgets the current token.
    async fn clear_token(&self);
}

/// A token provider that always returns the same static token.
///
/// Useful for testing or for long-lived tokens passed on the command line.
///
/// # Example
///
/// ```
/// use registrar_lib::auth::StaticTokenProvider;
///
/// let provider = StaticTokenProvider::new("my-access-token");
/// ```
#[derive(Debug, Clone)]
pub struct StaticTokenProvider {
    token: AccessToken,
}

impl StaticTokenProvider {
    /// Creates a new static token provider with the given access token.
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            token: AccessToken::new(access_token),
        }
    }

    /// Creates a new static token provider from an existing AccessToken.
    pub fn from_token(token: AccessToken) -> Self {
        Self { token }
    }
}

#[async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self) -> Option<AccessToken> {
        Some(self.token.clone())
    }

    async fn clear_token(&self) {}
}
