//! `TmdbClient` - TMDB API client implementation.

use anyhow::Context;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::Mutex;
use tracing::instrument;
use url::Url;

use super::api::LocalTransport;
use super::request::{ApiRequest, ApiVersion, Method};
use crate::error::{Result, TmdbError};

/// Default base URL for TMDB API v3.
const DEFAULT_V3_BASE_URL: &str = "https://api.themoviedb.org/3/";

/// Default base URL for TMDB API v4.
const DEFAULT_V4_BASE_URL: &str = "https://api.themoviedb.org/4/";

/// TMDB status code for an invalid API key.
const STATUS_INVALID_API_KEY: i64 = 7;

/// TMDB status code for a token lacking write permission.
const STATUS_WRITE_PERMISSION: i64 = 36;

/// TMDB status code for a private resource.
const STATUS_PRIVATE_RESOURCE: i64 = 39;

/// Error body returned by TMDB.
#[derive(Debug, Deserialize)]
struct TmdbErrorResponse {
    /// TMDB status code.
    #[serde(default)]
    status_code: i64,
    /// Human readable message.
    #[serde(default)]
    status_message: String,
}

/// TMDB API client.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClient {
    /// HTTP client.
    http_client: Client,
    /// Base URL for v3 requests.
    v3_base_url: Url,
    /// Base URL for v4 requests.
    v4_base_url: Url,
    /// v3 API key.
    api_key: String,
    /// v4 bearer token (read access or user access).
    v4_access_token: Option<String>,
    /// v4 account object id; its presence grants write scope.
    v4_account_id: Option<String>,
    /// v3 session id, set up front or converted lazily from the v4 token.
    session_id: Mutex<Option<String>>,
}

/// Builder for `TmdbClient`.
#[derive(Debug)]
#[allow(clippy::module_name_repetitions)]
pub struct TmdbClientBuilder {
    v3_base_url: Option<Url>,
    v4_base_url: Option<Url>,
    api_key: Option<String>,
    v4_access_token: Option<String>,
    v4_account_id: Option<String>,
    session_id: Option<String>,
    user_agent: Option<String>,
}

impl TmdbClientBuilder {
    /// Creates a new builder.
    const fn new() -> Self {
        Self {
            v3_base_url: None,
            v4_base_url: None,
            api_key: None,
            v4_access_token: None,
            v4_account_id: None,
            session_id: None,
            user_agent: None,
        }
    }

    /// Overrides the v3 base URL (for wiremock in tests).
    #[must_use]
    pub fn base_url(mut self, url: Url) -> Self {
        self.v3_base_url = Some(url);
        self
    }

    /// Overrides the v4 base URL (for wiremock in tests).
    #[must_use]
    pub fn v4_base_url(mut self, url: Url) -> Self {
        self.v4_base_url = Some(url);
        self
    }

    /// Sets the v3 API key (required).
    #[must_use]
    pub fn api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Sets the v4 access token.
    #[must_use]
    pub fn v4_access_token(mut self, token: impl Into<String>) -> Self {
        self.v4_access_token = Some(token.into());
        self
    }

    /// Sets the v4 account object id. Together with a v4 access token
    /// this enables write operations.
    #[must_use]
    pub fn v4_account_id(mut self, account_id: impl Into<String>) -> Self {
        self.v4_account_id = Some(account_id.into());
        self
    }

    /// Sets an already established v3 session id.
    #[must_use]
    pub fn session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = Some(session_id.into());
        self
    }

    /// Sets the User-Agent (required).
    #[must_use]
    pub fn user_agent(mut self, ua: impl Into<String>) -> Self {
        self.user_agent = Some(ua.into());
        self
    }

    /// Builds the client.
    ///
    /// # Errors
    ///
    /// - `api_key` is not set.
    /// - `user_agent` is not set.
    /// - `reqwest::Client` build fails.
    pub fn build(self) -> anyhow::Result<TmdbClient> {
        let api_key = self.api_key.context("api_key is required")?;
        let user_agent = self.user_agent.context("user_agent is required")?;

        let v3_base_url = if let Some(url) = self.v3_base_url {
            url
        } else {
            Url::parse(DEFAULT_V3_BASE_URL).context("invalid default v3 base URL")?
        };
        let v4_base_url = if let Some(url) = self.v4_base_url {
            url
        } else {
            Url::parse(DEFAULT_V4_BASE_URL).context("invalid default v4 base URL")?
        };

        let http_client = Client::builder()
            .user_agent(&user_agent)
            .gzip(true)
            .build()
            .context("failed to build HTTP client")?;

        Ok(TmdbClient {
            http_client,
            v3_base_url,
            v4_base_url,
            api_key,
            v4_access_token: self.v4_access_token,
            v4_account_id: self.v4_account_id,
            session_id: Mutex::new(self.session_id),
        })
    }
}

impl TmdbClient {
    /// Creates a new builder.
    #[must_use]
    pub const fn builder() -> TmdbClientBuilder {
        TmdbClientBuilder::new()
    }

    /// Sends a request with credentials attached and maps the response.
    #[instrument(skip_all)]
    async fn execute(&self, request: &ApiRequest, session_id: Option<&str>) -> Result<Value> {
        let base_url = match request.version {
            ApiVersion::V3 => &self.v3_base_url,
            ApiVersion::V4 => &self.v4_base_url,
        };
        let url = base_url.join(&request.path).map_err(|e| {
            TmdbError::Connection(format!("failed to join URL path {}: {e}", request.path))
        })?;

        let mut builder = self
            .http_client
            .request(http_method(request.method), url)
            .query(&request.query);
        builder = match request.version {
            ApiVersion::V3 => builder.query(&[("api_key", self.api_key.as_str())]),
            ApiVersion::V4 => {
                builder.bearer_auth(self.v4_access_token.as_deref().unwrap_or(&self.api_key))
            }
        };
        if let Some(session_id) = session_id {
            builder = builder.query(&[("session_id", session_id)]);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }
        let http_request = builder.build().map_err(|e| {
            TmdbError::Connection(format!("failed to build request {}: {e}", request.path))
        })?;

        tracing::debug!(
            method = ?request.method,
            version = ?request.version,
            path = %request.path,
            "TMDB API request"
        );

        let response = self
            .http_client
            .execute(http_request)
            .await
            .map_err(|e| TmdbError::Connection(format!("request failed: {}: {e}", request.path)))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| {
            TmdbError::Connection(format!("failed to read response body: {}: {e}", request.path))
        })?;

        map_response(status, &body)
    }
}

/// Converts the crate method into a `reqwest` method.
const fn http_method(method: Method) -> reqwest::Method {
    match method {
        Method::Get => reqwest::Method::GET,
        Method::Post => reqwest::Method::POST,
        Method::Put => reqwest::Method::PUT,
        Method::Delete => reqwest::Method::DELETE,
    }
}

/// Maps a status and body onto the decoded JSON or a categorized error.
fn map_response(status: StatusCode, body: &str) -> Result<Value> {
    let value: Value = if body.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(body)
            .map_err(|e| TmdbError::Connection(format!("failed to decode JSON response: {e}")))?
    };

    let message = || {
        serde_json::from_value::<TmdbErrorResponse>(value.clone()).map_or_else(
            |_| format!("HTTP {status}: {body}"),
            |error| format!("({}) {}", error.status_code, error.status_message),
        )
    };

    if status == StatusCode::UNAUTHORIZED {
        let code = value.get("status_code").and_then(Value::as_i64);
        return Err(match code {
            Some(STATUS_WRITE_PERMISSION) => TmdbError::AuthenticationRequired(message()),
            Some(STATUS_PRIVATE_RESOURCE) => TmdbError::PrivateResource(message()),
            Some(STATUS_INVALID_API_KEY) => TmdbError::Unauthorized(message()),
            _ => TmdbError::Remote(message()),
        });
    }
    if status == StatusCode::NOT_FOUND {
        return Err(TmdbError::NotFound(message()));
    }
    if status.is_client_error() || status.is_server_error() {
        return Err(TmdbError::Remote(message()));
    }
    if let Some(errors) = value.get("errors") {
        return Err(TmdbError::Remote(errors.to_string()));
    }
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        return Err(TmdbError::Remote(message()));
    }
    Ok(value)
}

impl LocalTransport for TmdbClient {
    #[instrument(skip_all)]
    async fn send(&self, request: ApiRequest) -> Result<Value> {
        let session_id = if request.session {
            Some(self.session_token().await?)
        } else {
            None
        };
        self.execute(&request, session_id.as_deref()).await
    }

    #[instrument(skip_all)]
    async fn session_token(&self) -> Result<String> {
        let mut session_id = self.session_id.lock().await;
        if let Some(existing) = session_id.as_ref() {
            return Ok(existing.clone());
        }

        let token = match (&self.v4_access_token, self.has_write_scope()) {
            (Some(token), true) => token.clone(),
            _ => {
                return Err(TmdbError::AuthenticationRequired(String::from(
                    "a v3 session id or a v4 access token with account id is required",
                )));
            }
        };

        tracing::debug!("converting v4 access token into a v3 session");
        let request = ApiRequest::post("authentication/session/convert/4")
            .body(json!({ "access_token": token }));
        let response = self.execute(&request, None).await?;
        let converted = response
            .get("session_id")
            .and_then(Value::as_str)
            .map(String::from)
            .ok_or_else(|| {
                TmdbError::Remote(String::from("session conversion returned no session_id"))
            })?;

        *session_id = Some(converted.clone());
        Ok(converted)
    }

    fn read_credential(&self) -> &str {
        &self.api_key
    }

    fn has_write_scope(&self) -> bool {
        self.v4_access_token.is_some() && self.v4_account_id.is_some()
    }

    fn has_v4_token(&self) -> bool {
        self.v4_access_token.is_some()
    }

    fn v4_account_id(&self) -> Option<&str> {
        self.v4_account_id.as_deref()
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    /// Builds a client pointed at the mock server for both API versions.
    fn mock_client(mock_server: &wiremock::MockServer) -> TmdbClientBuilder {
        TmdbClient::builder()
            .base_url(Url::parse(&format!("{}/3/", mock_server.uri())).unwrap())
            .v4_base_url(Url::parse(&format!("{}/4/", mock_server.uri())).unwrap())
            .api_key("test-key")
            .user_agent("reelmeta-test/0.0.0")
    }

    #[test]
    fn test_builder_requires_api_key() {
        // Arrange
        let builder = TmdbClient::builder().user_agent("ua");

        // Act
        let result = builder.build();

        // Assert
        let err = result.unwrap_err();
        assert!(err.to_string().contains("api_key is required"));
    }

    #[test]
    fn test_builder_requires_user_agent() {
        let result = TmdbClient::builder().api_key("k").build();
        let err = result.unwrap_err();
        assert!(err.to_string().contains("user_agent is required"));
    }

    #[test]
    fn test_write_scope_needs_token_and_account() {
        let client = TmdbClient::builder()
            .api_key("k")
            .user_agent("ua")
            .v4_access_token("t")
            .build()
            .unwrap();
        assert!(client.has_v4_token());
        assert!(!client.has_write_scope());

        let client = TmdbClient::builder()
            .api_key("k")
            .user_agent("ua")
            .v4_access_token("t")
            .v4_account_id("acc")
            .build()
            .unwrap();
        assert!(client.has_write_scope());
        assert_eq!(client.v4_account_id(), Some("acc"));
        assert_eq!(client.read_credential(), "k");
    }

    #[tokio::test]
    async fn test_send_v3_attaches_api_key() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/movie/550"))
            .and(wiremock::matchers::query_param("api_key", "test-key"))
            .and(wiremock::matchers::query_param("language", "en"))
            .respond_with(
                wiremock::ResponseTemplate::new(200)
                    .set_body_string(r#"{"id": 550, "title": "Fight Club"}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = mock_client(&mock_server).build().unwrap();

        // Act
        let value = client
            .send(ApiRequest::get("movie/550").query("language", "en"))
            .await
            .unwrap();

        // Assert
        assert_eq!(value["title"], "Fight Club");
    }

    #[tokio::test]
    async fn test_send_v4_uses_bearer_token() {
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/4/list/7"))
            .and(wiremock::matchers::header("authorization", "Bearer v4-token"))
            .respond_with(
                wiremock::ResponseTemplate::new(200).set_body_string(r#"{"id": 7}"#),
            )
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = mock_client(&mock_server)
            .v4_access_token("v4-token")
            .build()
            .unwrap();

        let value = client.send(ApiRequest::get("list/7").v4()).await.unwrap();

        assert_eq!(value["id"], 7);
    }

    #[tokio::test]
    async fn test_send_posts_json_body() {
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/3/movie/550/rating"))
            .and(wiremock::matchers::query_param("session_id", "sess"))
            .and(wiremock::matchers::body_json(json!({"value": 8.5})))
            .respond_with(wiremock::ResponseTemplate::new(201).set_body_string(
                r#"{"success": true, "status_code": 1, "status_message": "Success."}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        let client = mock_client(&mock_server).session_id("sess").build().unwrap();

        let request = ApiRequest::post("movie/550/rating")
            .body(json!({"value": 8.5}))
            .with_session();
        let value = client.send(request).await.unwrap();

        assert_eq!(value["success"], true);
    }

    /// Mounts a single GET response and returns the error from sending it.
    async fn error_for(status: u16, body: &str) -> TmdbError {
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/movie/1"))
            .respond_with(wiremock::ResponseTemplate::new(status).set_body_string(body))
            .mount(&mock_server)
            .await;
        let client = mock_client(&mock_server).build().unwrap();
        client.send(ApiRequest::get("movie/1")).await.unwrap_err()
    }

    #[tokio::test]
    async fn test_not_found_maps_to_not_found() {
        let err = error_for(
            404,
            r#"{"status_code": 34, "status_message": "The resource you requested could not be found."}"#,
        )
        .await;
        assert!(matches!(err, TmdbError::NotFound(ref m) if m.contains("could not be found")));
    }

    #[tokio::test]
    async fn test_unauthorized_status_codes() {
        let err = error_for(401, r#"{"status_code": 7, "status_message": "Invalid API key"}"#).await;
        assert!(matches!(err, TmdbError::Unauthorized(_)));

        let err = error_for(401, r#"{"status_code": 36, "status_message": "write"}"#).await;
        assert!(matches!(err, TmdbError::AuthenticationRequired(_)));

        let err = error_for(401, r#"{"status_code": 39, "status_message": "private"}"#).await;
        assert!(matches!(err, TmdbError::PrivateResource(_)));

        let err = error_for(401, r#"{"status_code": 3, "status_message": "denied"}"#).await;
        assert!(matches!(err, TmdbError::Remote(_)));
    }

    #[tokio::test]
    async fn test_server_error_maps_to_remote() {
        let err = error_for(500, r#"{"status_code": 11, "status_message": "Internal error"}"#).await;
        assert!(matches!(err, TmdbError::Remote(ref m) if m.contains("Internal error")));
    }

    #[tokio::test]
    async fn test_errors_field_and_success_false_map_to_remote() {
        let err = error_for(200, r#"{"errors": ["page must be less than or equal to 500"]}"#).await;
        assert!(matches!(err, TmdbError::Remote(ref m) if m.contains("page must be")));

        let err = error_for(200, r#"{"success": false, "status_code": 12}"#).await;
        assert!(matches!(err, TmdbError::Remote(_)));
    }

    #[tokio::test]
    async fn test_non_json_body_maps_to_connection() {
        let err = error_for(200, "<html>gateway</html>").await;
        assert!(matches!(err, TmdbError::Connection(_)));
    }

    #[tokio::test]
    async fn test_session_converted_once_from_v4_token() {
        // Arrange
        let mock_server = wiremock::MockServer::start().await;
        wiremock::Mock::given(wiremock::matchers::method("POST"))
            .and(wiremock::matchers::path("/3/authentication/session/convert/4"))
            .and(wiremock::matchers::body_json(json!({"access_token": "v4-token"})))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(
                r#"{"success": true, "session_id": "converted-session"}"#,
            ))
            .expect(1)
            .mount(&mock_server)
            .await;
        wiremock::Mock::given(wiremock::matchers::method("GET"))
            .and(wiremock::matchers::path("/3/account"))
            .and(wiremock::matchers::query_param("session_id", "converted-session"))
            .respond_with(wiremock::ResponseTemplate::new(200).set_body_string(r#"{"id": 42}"#))
            .expect(2)
            .mount(&mock_server)
            .await;
        let client = mock_client(&mock_server)
            .v4_access_token("v4-token")
            .v4_account_id("acc")
            .build()
            .unwrap();

        // Act
        let first = client
            .send(ApiRequest::get("account").with_session())
            .await
            .unwrap();
        let second = client
            .send(ApiRequest::get("account").with_session())
            .await
            .unwrap();

        // Assert
        assert_eq!(first["id"], 42);
        assert_eq!(second["id"], 42);
    }

    #[tokio::test]
    async fn test_session_without_credentials_is_authentication_required() {
        let client = TmdbClient::builder()
            .api_key("k")
            .user_agent("ua")
            .build()
            .unwrap();

        let err = client.session_token().await.unwrap_err();

        assert!(matches!(err, TmdbError::AuthenticationRequired(_)));
    }
}
