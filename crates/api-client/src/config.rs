//! Configuration for the Macrolog API client
//!
//! Supports environment-based configuration with sensible defaults.

use crate::error::{ApiError, ApiResult};
use serde::{Deserialize, Serialize};
use std::env;
use std::time::Duration;

/// Default production backend URL
const DEFAULT_API_URL: &str = "https://api.macrolog.app";

/// Local backend URL used by `development()`
const DEVELOPMENT_API_URL: &str = "http://localhost:3000";

/// Environment types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Local development backend
    Development,
    /// Staging environment
    Staging,
    /// Production environment
    #[default]
    Production,
}

impl Environment {
    /// Parse from the `MACROLOG_ENV` environment variable
    pub fn from_env() -> Self {
        Self::parse(&env::var("MACROLOG_ENV").unwrap_or_default())
    }

    /// Parse a user-supplied name, falling back to production
    #[must_use]
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "development" | "dev" | "local" => Self::Development,
            "staging" | "stage" => Self::Staging,
            _ => Self::Production,
        }
    }
}

/// Client configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Backend base URL; endpoint paths such as `/api/profile` are appended
    pub base_url: String,
    /// Public API key sent as the `apikey` header
    pub api_key: Option<String>,
    /// Request timeout
    #[serde(with = "duration_secs")]
    pub timeout: Duration,
    /// Current environment
    pub environment: Environment,
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            environment: Environment::default(),
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables
    ///
    /// Reads the following environment variables:
    /// - `MACROLOG_ENV`: Environment (development/staging/production)
    /// - `MACROLOG_API_URL`: Backend base URL (defaults per environment)
    /// - `MACROLOG_API_KEY`: Public API key
    /// - `MACROLOG_TIMEOUT_SECS`: Request timeout in seconds
    pub fn from_env() -> ApiResult<Self> {
        let environment = Environment::from_env();
        let preset = match environment {
            Environment::Development => Self::development(),
            Environment::Staging => Self::staging(),
            Environment::Production => Self::production(),
        };

        let base_url = env::var("MACROLOG_API_URL").unwrap_or(preset.base_url);
        let api_key = env::var("MACROLOG_API_KEY").ok().or(preset.api_key);

        let timeout = match env::var("MACROLOG_TIMEOUT_SECS") {
            Ok(raw) => raw
                .parse()
                .map(Duration::from_secs)
                .map_err(|_| ApiError::config(format!("MACROLOG_TIMEOUT_SECS is not a number: {raw}")))?,
            Err(_) => preset.timeout,
        };

        Ok(Self {
            base_url,
            api_key,
            timeout,
            environment,
        })
    }

    /// Create development configuration (local backend)
    #[must_use]
    pub fn development() -> Self {
        Self {
            base_url: DEVELOPMENT_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(10),
            environment: Environment::Development,
        }
    }

    /// Create staging configuration
    #[must_use]
    pub fn staging() -> Self {
        Self {
            base_url: env::var("MACROLOG_STAGING_API_URL")
                .unwrap_or_else(|_| "https://staging.api.macrolog.app".to_string()),
            api_key: env::var("MACROLOG_STAGING_API_KEY").ok(),
            timeout: Duration::from_secs(30),
            environment: Environment::Staging,
        }
    }

    /// Create production configuration
    #[must_use]
    pub fn production() -> Self {
        Self {
            base_url: DEFAULT_API_URL.to_string(),
            api_key: None,
            timeout: Duration::from_secs(30),
            environment: Environment::Production,
        }
    }

    /// Builder-style method to set base URL
    #[must_use]
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Builder-style method to set the API key
    #[must_use]
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Builder-style method to set timeout
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> ApiResult<()> {
        if self.base_url.is_empty() {
            return Err(ApiError::config("base_url cannot be empty"));
        }

        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ApiError::config("base_url must start with http:// or https://"));
        }

        if reqwest::Url::parse(&self.base_url).is_err() {
            return Err(ApiError::InvalidUrl(self.base_url.clone()));
        }

        if self.timeout.is_zero() {
            return Err(ApiError::config("timeout cannot be zero"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "https://api.macrolog.app");
        assert_eq!(config.timeout, Duration::from_secs(30));
        assert_eq!(config.environment, Environment::Production);
    }

    #[test]
    fn test_development_config() {
        let config = ClientConfig::development();
        assert!(config.base_url.contains("localhost"));
        assert_eq!(config.environment, Environment::Development);
    }

    #[test]
    fn test_environment_parse() {
        assert_eq!(Environment::parse("DEV"), Environment::Development);
        assert_eq!(Environment::parse("stage"), Environment::Staging);
        assert_eq!(Environment::parse(""), Environment::Production);
    }

    #[test]
    fn test_builder_pattern() {
        let config = ClientConfig::default()
            .with_base_url("https://test.macrolog.app")
            .with_api_key("pk_test")
            .with_timeout(Duration::from_secs(60));

        assert_eq!(config.base_url, "https://test.macrolog.app");
        assert_eq!(config.api_key.as_deref(), Some("pk_test"));
        assert_eq!(config.timeout, Duration::from_secs(60));
    }

    #[test]
    fn test_validation() {
        assert!(ClientConfig::default().validate().is_ok());
        assert!(ClientConfig::default().with_base_url("").validate().is_err());
        assert!(ClientConfig::default().with_base_url("ftp://x").validate().is_err());
        assert!(
            ClientConfig::default()
                .with_timeout(Duration::ZERO)
                .validate()
                .is_err()
        );
    }

    #[test]
    fn test_serde_timeout_as_seconds() {
        let json = serde_json::to_value(ClientConfig::development()).unwrap();
        assert_eq!(json["timeout"], 10);
        assert_eq!(json["environment"], "development");
    }
}
