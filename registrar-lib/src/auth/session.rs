//! In-memory session context

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::AccessToken;
use super::TokenProvider;

/// The signed-in state of one console session.
///
/// Passed explicitly to the client (as its [`TokenProvider`]) and to
/// whatever handles sign-in and sign-out. Clones share the same token.
///
/// # Example
///
/// ```
/// use registrar_lib::auth::Session;
///
/// let session = Session::new();
/// let shared = session.clone();
/// // after a successful login:
/// // session.set_token(AccessToken::new("...")).await;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Session {
    token: Arc<RwLock<Option<AccessToken>>>,
}

impl Session {
    /// Creates a signed-out session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a session that is already signed in.
    pub fn with_token(token: AccessToken) -> Self {
        Self {
            token: Arc::new(RwLock::new(Some(token))),
        }
    }

    /// Stores a new token, replacing any previous one.
    pub async fn set_token(&self, token: AccessToken) {
        *self.token.write().await = Some(token);
    }

    /// Returns `true` if a token is stored.
    pub async fn is_signed_in(&self) -> bool {
        self.token.read().await.is_some()
    }
}

#[async_trait]
impl TokenProvider for Session {
    async fn get_token(&self) -> Option<AccessToken> {
        self.token.read().await.clone()
    }

    async fn clear_token(&self) {
        log::debug!("Clearing session token");
        *self.token.write().await = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_clones_share_token() {
        let session = Session::new();
        let shared = session.clone();
        assert!(shared.get_token().await.is_none());

        session.set_token(AccessToken::new("abc")).await;
        assert_eq!(shared.get_token().await.unwrap().access_token, "abc");

        shared.clear_token().await;
        assert!(!session.is_signed_in().await);
    }
}
