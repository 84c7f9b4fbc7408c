//! Operation execution logic
//!
//! This module contains the HTTP execution logic for CRUD operations.

use std::time::Duration;

use reqwest::Method;
use reqwest::header::HeaderMap;
use reqwest::header::HeaderValue;

use super::Operation;
use super::OperationResult;
use super::Resource;
use crate::RegistrarClient;
use crate::error::ApiError;
use crate::error::AuthError;
use crate::error::Error;
use crate::error::ServerErrorDetail;
use crate::model::Fields;
use crate::model::Patch;
use crate::model::Row;
use crate::model::RowId;

impl RegistrarClient {
    /// Executes any operation.
    ///
    /// This is the universal execution method that can run any [`Operation`].
    ///
    /// # Example
    ///
    /// ```ignore
    /// use registrar_lib::api::{Op, Resource};
    ///
    /// let op = Op::delete(Resource::STUDENT, vec![3.into(), 7.into()]);
    /// client.execute(op).await?;
    /// ```
    pub async fn execute(&self, operation: impl Into<Operation>) -> Result<OperationResult, Error> {
        match operation.into() {
            Operation::List { resource, filter } => {
                let rows = self.execute_list(&resource, &filter).await?;
                Ok(OperationResult::List(rows))
            }
            Operation::Create { resource, fields } => {
                let row = self.execute_create(&resource, &fields).await?;
                Ok(OperationResult::Create(row))
            }
            Operation::Update { resource, patches } => {
                self.execute_update(&resource, &patches).await?;
                Ok(OperationResult::Update)
            }
            Operation::Delete { resource, ids } => {
                self.execute_delete(&resource, &ids).await?;
                Ok(OperationResult::Delete)
            }
            Operation::AddToGroup {
                student_id,
                group_id,
            } => {
                self.execute_add_to_group(&student_id, &group_id).await?;
                Ok(OperationResult::AddToGroup)
            }
        }
    }

    // =========================================================================
    // Individual operation execution
    // =========================================================================

    pub(crate) async fn execute_list(
        &self,
        resource: &Resource,
        filter: &[(String, String)],
    ) -> Result<Vec<Row>, Error> {
        let url = self.build_url(&resource.path(), filter)?;
        log::debug!("GET {}", url);

        let response = self.request(Method::GET, &url, None).await?;
        let body = response.text().await.map_err(ApiError::from)?;
        decode_rows(&body)
    }

    async fn execute_create(&self, resource: &Resource, fields: &Fields) -> Result<Option<Row>, Error> {
        let url = self.build_url(&resource.path(), &[])?;
        let body = serde_json::to_string(fields)?;
        log::debug!("POST {} ({} fields)", url, fields.len());

        let response = self.request(Method::POST, &url, Some(body)).await?;
        let text = response.text().await.map_err(ApiError::from)?;
        // Some endpoints answer with a bare status message instead of the row.
        Ok(serde_json::from_str::<Row>(&text).ok())
    }

    async fn execute_update(&self, resource: &Resource, patches: &[Patch]) -> Result<(), Error> {
        let url = self.build_url(&resource.path(), &[])?;
        let body = serde_json::to_string(patches)?;
        log::debug!("PUT {} ({} rows)", url, patches.len());

        self.request(Method::PUT, &url, Some(body)).await?;
        Ok(())
    }

    async fn execute_delete(&self, resource: &Resource, ids: &[RowId]) -> Result<(), Error> {
        let url = self.build_url(&resource.path(), &[])?;
        let body = serde_json::to_string(ids)?;
        log::debug!("DELETE {} ({} ids)", url, ids.len());

        self.request(Method::DELETE, &url, Some(body)).await?;
        Ok(())
    }

    async fn execute_add_to_group(&self, student_id: &RowId, group_id: &RowId) -> Result<(), Error> {
        let query = [
            ("student_id".to_string(), student_id.to_string()),
            ("group_id".to_string(), group_id.to_string()),
        ];
        let url = self.build_url(&format!("{}/add", Resource::GROUP.path()), &query)?;
        log::debug!("POST {}", url);

        self.request(Method::POST, &url, None).await?;
        Ok(())
    }

    // =========================================================================
    // Helper methods
    // =========================================================================

    pub(crate) fn build_url(&self, path: &str, query: &[(String, String)]) -> Result<String, Error> {
        let raw = format!("{}{}{}", self.inner.base_url, self.inner.api_prefix, path);
        let mut url =
            url::Url::parse(&raw).map_err(|e| ApiError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if !query.is_empty() {
            url.query_pairs_mut().extend_pairs(query);
        }
        Ok(url.to_string())
    }

    fn default_headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));
        headers.insert("Accept", HeaderValue::from_static("application/json"));
        headers
    }

    /// Makes an HTTP request with retry logic.
    ///
    /// Only `GET` is retried. Non-success responses are turned into errors:
    /// 401 becomes [`AuthError::Rejected`], anything else an [`ApiError::Http`]
    /// carrying the server's `detail` message.
    pub(crate) async fn request(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let retry_config = &self.inner.retry_config;
        let idempotent = method == Method::GET;
        let mut attempts = 0;

        loop {
            let result = self
                .send_request_inner(method.clone(), url, body.clone())
                .await;
            let can_retry = idempotent && attempts < retry_config.max_retries;
            let delay = retry_config.delay_for(attempts);

            match result {
                Ok(response) => {
                    let status = response.status().as_u16();
                    if response.status().is_success() {
                        return Ok(response);
                    }

                    if can_retry && retry_config.should_retry_status(status) {
                        let wait = if status == 429 {
                            parse_retry_after(&response).unwrap_or(delay)
                        } else {
                            delay
                        };
                        log::debug!("{} {} answered {}, retrying in {:?}", method, url, status, wait);
                        tokio::time::sleep(wait).await;
                        attempts += 1;
                        continue;
                    }

                    return Err(error_from_response(response).await);
                }
                Err(e) => {
                    let transient = matches!(
                        &e,
                        Error::Api(ApiError::Network(_)) | Error::Api(ApiError::Timeout(_))
                    );

                    if transient && can_retry && retry_config.retry_on_network {
                        log::debug!("{} {} failed ({}), retrying in {:?}", method, url, e, delay);
                        tokio::time::sleep(delay).await;
                        attempts += 1;
                        continue;
                    }

                    return Err(e);
                }
            }
        }
    }

    /// Inner request method without retry logic.
    async fn send_request_inner(
        &self,
        method: Method,
        url: &str,
        body: Option<String>,
    ) -> Result<reqwest::Response, Error> {
        let token = self
            .inner
            .token_provider
            .get_token()
            .await
            .ok_or(AuthError::MissingToken)?;

        let mut request = self
            .inner
            .http_client
            .request(method, url)
            .headers(self.default_headers())
            .bearer_auth(&token.access_token);

        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        if let Some(body) = body {
            request = request.body(body);
        }

        request.send().await.map_err(|e| {
            if e.is_timeout() {
                Error::Api(ApiError::Timeout(self.inner.timeout.unwrap_or_default()))
            } else {
                Error::Api(ApiError::Network(e))
            }
        })
    }
}

async fn error_from_response(response: reqwest::Response) -> Error {
    let status = response.status().as_u16();
    let retry_after = parse_retry_after(&response);
    let body = response.text().await.unwrap_or_default();

    match status {
        401 => Error::Auth(AuthError::Rejected {
            status,
            message: ServerErrorDetail::parse(&body)
                .map(|detail| detail.to_string())
                .unwrap_or(body),
        }),
        429 => Error::RateLimit { retry_after },
        _ => Error::Api(ApiError::from_body(status, &body)),
    }
}

/// Parses the Retry-After header value (seconds).
fn parse_retry_after(response: &reqwest::Response) -> Option<Duration> {
    response
        .headers()
        .get("Retry-After")?
        .to_str()
        .ok()?
        .parse::<u64>()
        .ok()
        .map(Duration::from_secs)
}

/// Decodes a rows response.
///
/// Accepts a flat array of objects, or an array whose first element is the
/// array of objects (the shape of filtered group lookups).
pub(crate) fn decode_rows(body: &str) -> Result<Vec<Row>, Error> {
    let json: serde_json::Value = serde_json::from_str(body)
        .map_err(|e| ApiError::parse_with_body(e.to_string(), body))?;

    let items = match json {
        serde_json::Value::Array(mut items) => match items.first() {
            Some(serde_json::Value::Array(_)) => items.swap_remove(0),
            _ => serde_json::Value::Array(items),
        },
        other => {
            return Err(ApiError::parse_with_body(
                format!("expected an array of rows, got {}", json_kind(&other)),
                body,
            )
            .into());
        }
    };

    serde_json::from_value(items).map_err(|e| ApiError::parse_with_body(e.to_string(), body).into())
}

fn json_kind(value: &serde_json::Value) -> &'static str {
    match value {
        serde_json::Value::Null => "null",
        serde_json::Value::Bool(_) => "a boolean",
        serde_json::Value::Number(_) => "a number",
        serde_json::Value::String(_) => "a string",
        serde_json::Value::Array(_) => "an array",
        serde_json::Value::Object(_) => "an object",
    }
}

// =============================================================================
// Convenience CRUD methods on RegistrarClient
// =============================================================================

impl RegistrarClient {
    /// Lists the rows of a resource.
    ///
    /// Returns a builder that can be filtered and awaited.
    ///
    /// # Example
    ///
    /// ```ignore
    /// let all = client.list(Resource::STUDENT).await?;
    /// let one_group = client.list(Resource::GROUP).filter("group_ids", 3).await?;
    /// ```
    pub fn list(&self, resource: Resource) -> ClientListBuilder<'_> {
        ClientListBuilder {
            client: self,
            resource,
            filter: Vec::new(),
        }
    }

    /// Creates one record. `fields` must not contain `id`.
    pub async fn create(&self, resource: &Resource, fields: &Fields) -> Result<Option<Row>, Error> {
        self.execute_create(resource, fields).await
    }

    /// Sends a batch of per-row patches.
    pub async fn update(&self, resource: &Resource, patches: &[Patch]) -> Result<(), Error> {
        self.execute_update(resource, patches).await
    }

    /// Deletes rows by id.
    pub async fn delete(&self, resource: &Resource, ids: &[RowId]) -> Result<(), Error> {
        self.execute_delete(resource, ids).await
    }

    /// Assigns a student to a group.
    pub async fn add_student_to_group(&self, student_id: &RowId, group_id: &RowId) -> Result<(), Error> {
        self.execute_add_to_group(student_id, group_id).await
    }
}

// =============================================================================
// Client-bound builders (with IntoFuture for .await)
// =============================================================================

/// Builder for list operations bound to a client.
pub struct ClientListBuilder<'a> {
    client: &'a RegistrarClient,
    resource: Resource,
    filter: Vec<(String, String)>,
}

impl<'a> ClientListBuilder<'a> {
    /// Adds a server-side filter query parameter.
    pub fn filter(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.filter.push((key.into(), value.to_string()));
        self
    }
}

impl<'a> std::future::IntoFuture for ClientListBuilder<'a> {
    type Output = Result<Vec<Row>, Error>;
    type IntoFuture =
        std::pin::Pin<Box<dyn std::future::Future<Output = Self::Output> + Send + 'a>>;

    fn into_future(self) -> Self::IntoFuture {
        Box::pin(async move {
            self.client
                .execute_list(&self.resource, &self.filter)
                .await
        })
    }
}

impl<'a> From<ClientListBuilder<'a>> for Operation {
    fn from(builder: ClientListBuilder<'a>) -> Self {
        Operation::List {
            resource: builder.resource,
            filter: builder.filter,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::StaticTokenProvider;

    fn client() -> RegistrarClient {
        RegistrarClient::builder()
            .url("http://localhost:8000/")
            .token_provider(StaticTokenProvider::new("t"))
            .build()
    }

    #[test]
    fn test_build_url_with_prefix_and_query() {
        let client = client();
        assert_eq!(
            client.build_url("/student", &[]).unwrap(),
            "http://localhost:8000/api/student"
        );

        let query = [("group_ids".to_string(), "3".to_string())];
        assert_eq!(
            client.build_url("/group", &query).unwrap(),
            "http://localhost:8000/api/group?group_ids=3"
        );
    }

    #[test]
    fn test_build_url_rejects_garbage() {
        let client = RegistrarClient::builder()
            .url("not a url")
            .token_provider(StaticTokenProvider::new("t"))
            .build();
        let err = client.build_url("/user", &[]).unwrap_err();
        assert!(matches!(err, Error::Api(ApiError::InvalidUrl(_))));
    }

    #[test]
    fn test_decode_flat_rows() {
        let rows = decode_rows(r#"[{"id":1,"name":"Anna"},{"id":2,"name":"Boris"}]"#).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].id(), &RowId::Int(2));
    }

    #[test]
    fn test_decode_nested_rows() {
        let rows = decode_rows(r#"[[{"id":4,"name":"PI-21"}]]"#).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].get_str("name").unwrap(), Some("PI-21"));
    }

    #[test]
    fn test_decode_empty_and_invalid() {
        assert!(decode_rows("[]").unwrap().is_empty());
        assert!(decode_rows(r#"{"detail":"nope"}"#).is_err());
        assert!(decode_rows(r#"[{"name":"no id"}]"#).is_err());
    }
}
