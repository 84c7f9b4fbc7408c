//! Login/password sign-in

use serde::Deserialize;
use serde::Serialize;

use super::AccessToken;
use crate::error::AuthError;
use crate::error::ServerErrorDetail;

#[derive(Serialize)]
struct Credentials<'a> {
    login: &'a str,
    password: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default = "default_token_type")]
    token_type: String,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl TokenResponse {
    fn into_access_token(self) -> AccessToken {
        AccessToken {
            access_token: self.access_token,
            token_type: self.token_type,
        }
    }
}

/// Exchanges a login and password for a bearer token.
///
/// Posts `{"login", "password"}` as JSON to `<base><prefix>/oauth2/authorize`.
///
/// # Example
///
/// ```ignore
/// use registrar_lib::auth::{PasswordFlow, Session};
///
/// let flow = PasswordFlow::new("https://records.example.edu");
/// let token = flow.authenticate("admin", "secret").await?;
/// session.set_token(token).await;
/// ```
#[derive(Debug, Clone)]
pub struct PasswordFlow {
    base_url: String,
    api_prefix: String,
    http_client: reqwest::Client,
}

impl PasswordFlow {
    /// Creates a flow against the given service root, using the `/api` prefix.
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_prefix: "/api".to_string(),
            http_client: reqwest::Client::new(),
        }
    }

    /// Overrides the API path prefix.
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Uses a custom HTTP client.
    pub fn http_client(mut self, client: reqwest::Client) -> Self {
        self.http_client = client;
        self
    }

    fn token_url(&self) -> String {
        format!("{}{}/oauth2/authorize", self.base_url, self.api_prefix)
    }

    /// Signs in and returns the issued token.
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<AccessToken, AuthError> {
        log::debug!("Signing in as {}", login);

        let response = self
            .http_client
            .post(self.token_url())
            .json(&Credentials { login, password })
            .send()
            .await?;

        self.handle_response(response).await
    }

    async fn handle_response(&self, response: reqwest::Response) -> Result<AccessToken, AuthError> {
        let status = response.status();
        if status.is_success() {
            let body = response.text().await?;
            let token: TokenResponse =
                serde_json::from_str(&body).map_err(|e| AuthError::Parse(e.to_string()))?;
            return Ok(token.into_access_token());
        }

        let code = status.as_u16();
        if code == 401 || code == 404 {
            log::warn!("Sign-in refused with HTTP {}", code);
            return Err(AuthError::InvalidCredentials);
        }

        let body = response.text().await.unwrap_or_default();
        let message = ServerErrorDetail::parse(&body)
            .map(|detail| detail.to_string())
            .unwrap_or_else(|| body.clone());
        Err(AuthError::Rejected {
            status: code,
            message,
        })
    }
}
