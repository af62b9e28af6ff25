//! HTTP transport for the Macrolog backend
//!
//! The client issues exactly one request per call and maps the response
//! status onto [`ApiError`]. It never retries and never touches the session;
//! the refresh-and-retry policy lives in [`crate::auth::AuthSession`].

use crate::config::ClientConfig;
use crate::endpoints::{AchievementsApi, AuthApi, FoodEntriesApi, NotificationsApi, ProfileApi};
use crate::error::{ApiError, ApiResult};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::{Client, Method, Response, Url};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Request correlation ID header
const X_REQUEST_ID: &str = "X-Request-ID";

/// Public API key header
const APIKEY_HEADER: &str = "apikey";

/// Macrolog API client
///
/// Cheap to clone; clones share the connection pool and configuration.
#[derive(Clone)]
pub struct MacrologClient {
    inner: Client,
    config: Arc<ClientConfig>,
}

impl MacrologClient {
    /// Create a new client with configuration from the environment
    pub fn new() -> ApiResult<Self> {
        let config = ClientConfig::from_env()?;
        Self::with_config(config)
    }

    /// Create a new client with specific configuration
    pub fn with_config(config: ClientConfig) -> ApiResult<Self> {
        config.validate()?;

        let mut default_headers = HeaderMap::new();
        default_headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_static(concat!("macrolog-api-client/", env!("CARGO_PKG_VERSION"))),
        );

        if let Some(ref key) = config.api_key {
            let value = HeaderValue::from_str(key)
                .map_err(|_| ApiError::config("api_key contains invalid header characters"))?;
            default_headers.insert(APIKEY_HEADER, value);
        }

        let inner = Client::builder()
            .timeout(config.timeout)
            .default_headers(default_headers)
            .build()
            .map_err(ApiError::Request)?;

        Ok(Self {
            inner,
            config: Arc::new(config),
        })
    }

    /// Get the current configuration
    #[must_use]
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    // -------------------------------------------------------------------------
    // Endpoint API accessors
    // -------------------------------------------------------------------------

    /// Access authentication endpoints
    #[must_use]
    pub fn auth(&self) -> AuthApi {
        AuthApi::new(self.clone())
    }

    /// Access food entry endpoints
    #[must_use]
    pub fn food_entries(&self) -> FoodEntriesApi {
        FoodEntriesApi::new(self.clone())
    }

    /// Access achievement endpoints
    #[must_use]
    pub fn achievements(&self) -> AchievementsApi {
        AchievementsApi::new(self.clone())
    }

    /// Access notification endpoints
    #[must_use]
    pub fn notifications(&self) -> NotificationsApi {
        NotificationsApi::new(self.clone())
    }

    /// Access profile endpoints
    #[must_use]
    pub fn profile(&self) -> ProfileApi {
        ProfileApi::new(self.clone())
    }

    // -------------------------------------------------------------------------
    // Low-level HTTP methods
    // -------------------------------------------------------------------------

    /// Perform a GET request
    #[instrument(skip(self, token))]
    pub async fn get<T: DeserializeOwned>(&self, path: &str, token: Option<&str>) -> ApiResult<T> {
        self.request(Method::GET, path, token, &[], Option::<&()>::None)
            .await
    }

    /// Perform a GET request with query parameters
    #[instrument(skip(self, token))]
    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> ApiResult<T> {
        self.request(Method::GET, path, token, query, Option::<&()>::None)
            .await
    }

    /// Perform a POST request
    #[instrument(skip(self, token, body))]
    pub async fn post<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::POST, path, token, &[], Some(body)).await
    }

    /// Perform a PUT request
    #[instrument(skip(self, token, body))]
    pub async fn put<T: DeserializeOwned, B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> ApiResult<T> {
        self.request(Method::PUT, path, token, &[], Some(body)).await
    }

    /// Perform a request whose success body is ignored
    #[instrument(skip(self, token, body))]
    pub async fn send_discarding<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        body: Option<&B>,
    ) -> ApiResult<()> {
        self.execute(method, path, token, &[], body).await?;
        Ok(())
    }

    /// Execute a request and decode the JSON body of a successful response
    pub async fn request<T: DeserializeOwned, B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<T> {
        let response = self.execute(method, path, token, query, body).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Build the absolute URL for an endpoint path
    pub fn url(&self, path: &str) -> ApiResult<Url> {
        let joined = format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );
        Url::parse(&joined).map_err(|e| ApiError::InvalidUrl(format!("{joined}: {e}")))
    }

    /// Send one request; non-success statuses become errors
    async fn execute<B: Serialize>(
        &self,
        method: Method,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
        body: Option<&B>,
    ) -> ApiResult<Response> {
        let url = self.url(path)?;
        let request_id = Uuid::new_v4().to_string();

        let mut request = self
            .inner
            .request(method.clone(), url.clone())
            .header(X_REQUEST_ID, &request_id);

        if !query.is_empty() {
            request = request.query(query);
        }

        if let Some(token) = token {
            request = request.header(AUTHORIZATION, format!("Bearer {token}"));
        }

        if let Some(b) = body {
            request = request.json(b);
        }

        let start = Instant::now();
        let response = request.send().await.map_err(|e| {
            debug!(
                request_id = %request_id,
                method = %method,
                path = %url.path(),
                error = %e,
                "Request failed in transport"
            );
            ApiError::Request(e)
        })?;

        let status = response.status();
        debug!(
            request_id = %request_id,
            method = %method,
            path = %url.path(),
            status = status.as_u16(),
            elapsed_ms = start.elapsed().as_millis(),
            authenticated = token.is_some(),
            "Request completed"
        );

        if status.is_success() {
            Ok(response)
        } else {
            let text = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(
                status.as_u16(),
                error_message(&text, status.canonical_reason()),
            ))
        }
    }
}

/// Extract a readable message from an error body
///
/// Accepts `{"error": "..."}`, `{"error": {"message": "..."}}` and
/// `{"message": "..."}`; anything else is returned verbatim.
pub(crate) fn error_message(body: &str, fallback: Option<&str>) -> String {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return fallback.unwrap_or("Unknown error").to_string();
    }

    serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            value
                .get("error")
                .and_then(value_message)
                .or_else(|| value.get("message").and_then(value_message))
        })
        .unwrap_or_else(|| trimmed.to_string())
}

/// Readable text of an `error` value: a string, or an object's `message`
pub(crate) fn value_message(value: &serde_json::Value) -> Option<String> {
    match value {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Object(map) => map
            .get("message")
            .or_else(|| map.get("error"))
            .and_then(value_message),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{header, header_exists, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MacrologClient {
        MacrologClient::with_config(ClientConfig::development().with_base_url(server.uri()))
            .unwrap()
    }

    #[test]
    fn test_client_creation() {
        let client = MacrologClient::with_config(ClientConfig::development());
        assert!(client.is_ok());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let client = MacrologClient::with_config(ClientConfig::default().with_base_url(""));
        assert!(matches!(client, Err(ApiError::Config(_))));
    }

    #[test]
    fn test_url_joining() {
        let client = MacrologClient::with_config(
            ClientConfig::development().with_base_url("http://localhost:3000/"),
        )
        .unwrap();
        assert_eq!(
            client.url("/api/profile").unwrap().as_str(),
            "http://localhost:3000/api/profile"
        );
    }

    #[test]
    fn test_error_message_extraction() {
        assert_eq!(error_message(r#"{"error":"bad token"}"#, None), "bad token");
        assert_eq!(
            error_message(r#"{"error":{"message":"nested"}}"#, None),
            "nested"
        );
        assert_eq!(error_message(r#"{"message":"plain"}"#, None), "plain");
        assert_eq!(error_message("gateway timeout", None), "gateway timeout");
        assert_eq!(error_message("", Some("Not Found")), "Not Found");
    }

    #[tokio::test]
    async fn test_bearer_and_request_id_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .and(header("authorization", "Bearer tok-1"))
            .and(header_exists("x-request-id"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let value: serde_json::Value = client_for(&server)
            .get("/api/profile", Some("tok-1"))
            .await
            .unwrap();
        assert_eq!(value["ok"], true);
    }

    #[tokio::test]
    async fn test_query_parameters() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/food-entries"))
            .and(query_param("date", "2026-10-16"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entries": []})))
            .expect(1)
            .mount(&server)
            .await;

        let value: serde_json::Value = client_for(&server)
            .get_with_query("/api/food-entries", Some("t"), &[("date", "2026-10-16".into())])
            .await
            .unwrap();
        assert!(value["entries"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_401_maps_to_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "jwt expired"})))
            .mount(&server)
            .await;

        let result: ApiResult<serde_json::Value> =
            client_for(&server).get("/api/achievements", Some("old")).await;
        assert!(matches!(result, Err(ApiError::SessionExpired)));
    }

    #[tokio::test]
    async fn test_other_statuses_map_to_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "no such entry"})))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/broken"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = client_for(&server);

        let err = client
            .get::<serde_json::Value>("/api/missing", Some("t"))
            .await
            .unwrap_err();
        match err {
            ApiError::BadResponse { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "no such entry");
            }
            other => panic!("unexpected error: {other:?}"),
        }

        let err = client
            .get::<serde_json::Value>("/api/broken", Some("t"))
            .await
            .unwrap_err();
        assert!(err.is_server_error());
    }

    #[tokio::test]
    async fn test_transport_error() {
        // Nothing listens on the discard port.
        let client = MacrologClient::with_config(
            ClientConfig::development().with_base_url("http://127.0.0.1:9"),
        )
        .unwrap();
        let err = client
            .get::<serde_json::Value>("/api/profile", Some("t"))
            .await
            .unwrap_err();
        assert!(err.is_transport());
    }
}
