//! Main RegistrarClient

use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;

use crate::auth::TokenProvider;
use crate::retry::RetryConfig;

/// The HTTP client for the academic records service.
///
/// This client is cheap to clone (uses `Arc` internally) and can be shared
/// across tasks safely.
///
/// # Example
///
/// ```ignore
/// use registrar_lib::{RegistrarClient, auth::Session};
///
/// let session = Session::new();
/// let client = RegistrarClient::builder()
///     .url("http://localhost:8000")
///     .token_provider(session.clone())
///     .build();
///
/// let students = client.list(Resource::STUDENT).await?;
/// ```
#[derive(Clone)]
pub struct RegistrarClient {
    pub(crate) inner: Arc<RegistrarClientInner>,
}

pub(crate) struct RegistrarClientInner {
    pub(crate) base_url: String,
    pub(crate) api_prefix: String,
    pub(crate) token_provider: Arc<dyn TokenProvider>,
    pub(crate) http_client: Client,
    pub(crate) timeout: Option<Duration>,
    pub(crate) retry_config: RetryConfig,
}

impl RegistrarClient {
    /// Creates a new builder for constructing a client.
    pub fn builder() -> RegistrarClientBuilder<Missing, Missing> {
        RegistrarClientBuilder::new()
    }

    /// Returns the service root URL.
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Returns the API path prefix, `/api` unless overridden.
    pub fn api_prefix(&self) -> &str {
        &self.inner.api_prefix
    }

    /// Returns the retry configuration.
    pub fn retry_config(&self) -> &RetryConfig {
        &self.inner.retry_config
    }

    /// Forgets the current credential.
    pub async fn sign_out(&self) {
        self.inner.token_provider.clear_token().await;
    }
}

impl std::fmt::Debug for RegistrarClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RegistrarClient")
            .field("base_url", &self.inner.base_url)
            .field("api_prefix", &self.inner.api_prefix)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Typestate Builder
// =============================================================================

/// Marker type for missing required builder fields.
pub struct Missing;

/// Marker type for set builder fields.
pub struct Set<T>(T);

/// Builder for constructing a [`RegistrarClient`].
///
/// Uses the typestate pattern to ensure required fields are set at compile time.
///
/// # Required Fields
///
/// - `url` - The service root URL
/// - `token_provider` - A [`TokenProvider`] implementation
///
/// # Example
///
/// ```ignore
/// let client = RegistrarClient::builder()
///     .url("http://localhost:8000")
///     .token_provider(session)
///     .timeout(Duration::from_secs(30))
///     .retry(RetryConfig::no_retry())
///     .build();
/// ```
pub struct RegistrarClientBuilder<Url, Provider> {
    url: Url,
    token_provider: Provider,
    api_prefix: String,
    timeout: Option<Duration>,
    connect_timeout: Option<Duration>,
    http_client: Option<Client>,
    retry_config: RetryConfig,
}

impl RegistrarClientBuilder<Missing, Missing> {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            url: Missing,
            token_provider: Missing,
            api_prefix: "/api".to_string(),
            timeout: None,
            connect_timeout: None,
            http_client: None,
            retry_config: RetryConfig::default(),
        }
    }
}

impl Default for RegistrarClientBuilder<Missing, Missing> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P> RegistrarClientBuilder<Missing, P> {
    /// Sets the service root URL.
    pub fn url(self, url: impl Into<String>) -> RegistrarClientBuilder<Set<String>, P> {
        RegistrarClientBuilder {
            url: Set(url.into().trim_end_matches('/').to_string()),
            token_provider: self.token_provider,
            api_prefix: self.api_prefix,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            retry_config: self.retry_config,
        }
    }
}

impl<U> RegistrarClientBuilder<U, Missing> {
    /// Sets the token provider for authentication.
    pub fn token_provider<T: TokenProvider + 'static>(
        self,
        provider: T,
    ) -> RegistrarClientBuilder<U, Set<Arc<dyn TokenProvider>>> {
        RegistrarClientBuilder {
            url: self.url,
            token_provider: Set(Arc::new(provider) as Arc<dyn TokenProvider>),
            api_prefix: self.api_prefix,
            timeout: self.timeout,
            connect_timeout: self.connect_timeout,
            http_client: self.http_client,
            retry_config: self.retry_config,
        }
    }
}

impl<U, P> RegistrarClientBuilder<U, P> {
    /// Sets the API path prefix.
    ///
    /// Defaults to `/api`.
    pub fn api_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.api_prefix = prefix.into().trim_end_matches('/').to_string();
        self
    }

    /// Sets the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Sets the connection timeout.
    ///
    /// This is applied when building the HTTP client.
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Sets a custom HTTP client.
    ///
    /// If not set, a default client will be created.
    pub fn http_client(mut self, client: Client) -> Self {
        self.http_client = Some(client);
        self
    }

    /// Sets the retry policy for read requests.
    pub fn retry(mut self, config: RetryConfig) -> Self {
        self.retry_config = config;
        self
    }
}

impl RegistrarClientBuilder<Set<String>, Set<Arc<dyn TokenProvider>>> {
    /// Builds the [`RegistrarClient`].
    ///
    /// This method is only available when both `url` and `token_provider` have been set.
    pub fn build(self) -> RegistrarClient {
        let http_client = self.http_client.unwrap_or_else(|| {
            let mut builder = Client::builder();
            if let Some(timeout) = self.connect_timeout {
                builder = builder.connect_timeout(timeout);
            }
            builder.build().unwrap_or_else(|e| {
                log::warn!("Falling back to default HTTP client: {}", e);
                Client::new()
            })
        });

        RegistrarClient {
            inner: Arc::new(RegistrarClientInner {
                base_url: self.url.0,
                api_prefix: self.api_prefix,
                token_provider: self.token_provider.0,
                http_client,
                timeout: self.timeout,
                retry_config: self.retry_config,
            }),
        }
    }
}
