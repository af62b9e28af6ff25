//! Error types for the API client

use thiserror::Error;

/// Result type alias for API operations
pub type ApiResult<T> = Result<T, ApiError>;

/// API client errors
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend rejected the access token (HTTP 401)
    #[error("Session expired - please log in again")]
    SessionExpired,

    /// The backend answered with a non-success status other than 401
    #[error("Bad response ({status}): {message}")]
    BadResponse {
        /// HTTP status code
        status: u16,
        /// Error message from the backend
        message: String,
    },

    /// Endpoint URL could not be built
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP request failed before a response arrived
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Missing environment variable
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    /// Request parameters were rejected before sending
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Session storage could not be read or written
    #[error("Session storage error: {0}")]
    Storage(String),
}

impl ApiError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a missing env var error
    pub fn missing_env(var: impl Into<String>) -> Self {
        Self::MissingEnvVar(var.into())
    }

    /// Create a bad response error
    pub fn bad_response(status: u16, message: impl Into<String>) -> Self {
        Self::BadResponse {
            status,
            message: message.into(),
        }
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Map an HTTP error status to the matching error kind
    #[must_use]
    pub fn from_status(status: u16, message: impl Into<String>) -> Self {
        if status == 401 {
            Self::SessionExpired
        } else {
            Self::bad_response(status, message)
        }
    }

    /// Check if this error means the access token was rejected
    #[must_use]
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Self::SessionExpired)
    }

    /// Check if this is a transport-level failure
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Request(_))
    }

    /// Check if this is a client error (4xx other than 401)
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::BadResponse { status, .. } if (400..500).contains(status))
    }

    /// Check if this is a server error (5xx)
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        matches!(self, Self::BadResponse { status, .. } if *status >= 500)
    }

    /// HTTP status carried by the error, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::SessionExpired => Some(401),
            Self::BadResponse { status, .. } => Some(*status),
            Self::Request(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}

impl From<macrolog_core::Error> for ApiError {
    fn from(err: macrolog_core::Error) -> Self {
        Self::Storage(err.to_string())
    }
}
