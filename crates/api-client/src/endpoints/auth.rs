//! Authentication endpoints
//!
//! Maps to `/api/auth/*`:
//! - `login` and `signup` exchange credentials for a [`Session`]
//! - `refresh` exchanges a refresh token for a new pair
//! - `logout` revokes the current access token server-side

use crate::auth::TokenRefresher;
use crate::client::MacrologClient;
use crate::endpoints::require_field;
use crate::error::{ApiError, ApiResult};
use crate::session::Session;
use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};

const LOGIN_PATH: &str = "/api/auth/login";
const SIGNUP_PATH: &str = "/api/auth/signup";
const REFRESH_PATH: &str = "/api/auth/refresh";
const LOGOUT_PATH: &str = "/api/auth/logout";

/// Authentication API interface
#[derive(Clone)]
pub struct AuthApi {
    client: MacrologClient,
}

impl AuthApi {
    pub(crate) fn new(client: MacrologClient) -> Self {
        Self { client }
    }

    /// Log in with email and password
    ///
    /// POST /api/auth/login
    pub async fn login(&self, email: &str, password: &str) -> ApiResult<Session> {
        let body = Credentials {
            email,
            password,
            name: None,
        };
        let envelope: SessionEnvelope = self
            .client
            .post(LOGIN_PATH, None, &body)
            .await
            .map_err(credentials_rejected)?;
        envelope.into_session()
    }

    /// Create an account and log in
    ///
    /// POST /api/auth/signup
    pub async fn signup(&self, email: &str, password: &str, name: Option<&str>) -> ApiResult<Session> {
        let body = Credentials {
            email,
            password,
            name,
        };
        let envelope: SessionEnvelope = self
            .client
            .post(SIGNUP_PATH, None, &body)
            .await
            .map_err(credentials_rejected)?;
        envelope.into_session()
    }

    /// Exchange a refresh token for a new session
    ///
    /// POST /api/auth/refresh
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<Session> {
        let body = RefreshRequest { refresh_token };
        let envelope: SessionEnvelope = self.client.post(REFRESH_PATH, None, &body).await?;
        envelope.into_session()
    }

    /// Revoke the access token server-side
    ///
    /// POST /api/auth/logout
    pub async fn logout(&self, access_token: &str) -> ApiResult<()> {
        self.client
            .send_discarding(Method::POST, LOGOUT_PATH, Some(access_token), Option::<&()>::None)
            .await
    }
}

#[async_trait]
impl TokenRefresher for AuthApi {
    async fn refresh(&self, refresh_token: &str) -> ApiResult<Session> {
        AuthApi::refresh(self, refresh_token).await
    }
}

/// A 401 from login/signup means bad credentials, not an expired session
fn credentials_rejected(err: ApiError) -> ApiError {
    match err {
        ApiError::SessionExpired => ApiError::bad_response(401, "Invalid email or password"),
        other => other,
    }
}

#[derive(Serialize)]
struct Credentials<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// `{ "session": {...} }` or `{ "error": ... }`
#[derive(Debug, Deserialize)]
struct SessionEnvelope {
    #[serde(default)]
    session: Option<Session>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl SessionEnvelope {
    fn into_session(self) -> ApiResult<Session> {
        require_field(self.session, self.error.as_ref(), "session")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> AuthApi {
        MacrologClient::with_config(ClientConfig::development().with_base_url(server.uri()))
            .unwrap()
            .auth()
    }

    #[tokio::test]
    async fn test_refresh_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(json!({"refreshToken": "R1"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session": {
                    "access_token": "A2",
                    "refresh_token": "R2",
                    "expires_in": 3600,
                    "expires_at": 1_800_000_000
                }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = api_for(&server).refresh("R1").await.unwrap();
        assert_eq!(session.access_token, "A2");
        assert_eq!(session.refresh_token, "R2");
        assert_eq!(session.expires_at, Some(1_800_000_000));
    }

    #[tokio::test]
    async fn test_refresh_error_envelope_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"error": "refresh token revoked"})),
            )
            .mount(&server)
            .await;

        let err = api_for(&server).refresh("R1").await.unwrap_err();
        assert!(matches!(err, ApiError::BadResponse { ref message, .. } if message == "refresh token revoked"));
    }

    #[tokio::test]
    async fn test_refresh_non_2xx_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({"error": "invalid grant"})))
            .mount(&server)
            .await;

        let err = api_for(&server).refresh("R1").await.unwrap_err();
        assert_eq!(err.status(), Some(400));
    }

    #[tokio::test]
    async fn test_refresh_malformed_body_is_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let err = api_for(&server).refresh("R1").await.unwrap_err();
        assert!(matches!(err, ApiError::Json(_)));
    }

    #[tokio::test]
    async fn test_login_success_and_bad_credentials() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": "kim@example.com", "password": "right"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "session": {"access_token": "A1", "refresh_token": "R1"}
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/auth/login"))
            .and(body_json(json!({"email": "kim@example.com", "password": "wrong"})))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "invalid login"})))
            .mount(&server)
            .await;

        let api = api_for(&server);
        let session = api.login("kim@example.com", "right").await.unwrap();
        assert_eq!(session, Session::new("A1", "R1"));

        let err = api.login("kim@example.com", "wrong").await.unwrap_err();
        assert!(!err.is_session_expired());
        assert_eq!(err.status(), Some(401));
    }

    #[tokio::test]
    async fn test_signup_sends_name() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/signup"))
            .and(body_json(json!({
                "email": "kim@example.com",
                "password": "pw",
                "name": "Kim"
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({
                "session": {"access_token": "A1", "refresh_token": "R1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let session = api_for(&server)
            .signup("kim@example.com", "pw", Some("Kim"))
            .await
            .unwrap();
        assert_eq!(session.access_token, "A1");
    }

    #[tokio::test]
    async fn test_logout_sends_bearer() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/auth/logout"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        tokio_test::assert_ok!(api_for(&server).logout("A1").await);
    }
}
