//! Configuration schema definitions

use serde::{Deserialize, Serialize};

/// Root configuration schema
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigSchema {
    #[serde(default)]
    pub api: ApiSection,

    #[serde(default)]
    pub session: SessionSection,

    #[serde(default)]
    pub logging: LoggingSection,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ApiSection {
    /// Backend base URL; falls back to the environment when unset
    #[serde(default)]
    pub base_url: Option<String>,

    /// Public API key sent with every request
    #[serde(default)]
    pub api_key: Option<String>,

    /// Request timeout in seconds
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

/// Session persistence settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct SessionSection {
    /// Path of the session file; defaults to the platform data directory
    #[serde(default)]
    pub path: Option<String>,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingSection {
    /// Default log filter when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Emit JSON lines instead of compact text
    #[serde(default)]
    pub json: bool,

    /// Directory for a daily-rolling log file
    #[serde(default)]
    pub directory: Option<String>,
}

impl Default for LoggingSection {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            directory: None,
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_uses_defaults() {
        let schema: ConfigSchema = toml::from_str(
            r#"
            [api]
            base_url = "http://localhost:3000"
            "#,
        )
        .unwrap();

        assert_eq!(schema.api.base_url.as_deref(), Some("http://localhost:3000"));
        assert!(schema.api.timeout_secs.is_none());
        assert!(schema.session.path.is_none());
        assert_eq!(schema.logging.level, "warn");
        assert!(!schema.logging.json);
    }
}
