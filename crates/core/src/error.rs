//! Error handling with codes, context and recovery suggestions
//!
//! Errors raised by the core crate carry:
//! - A numeric code for programmatic handling
//! - Optional context describing what was being attempted
//! - An optional recovery suggestion for the user

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error codes for programmatic error handling
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // IO errors (2xxx)
    /// Any other filesystem failure
    IoError = 2000,
    /// A required file does not exist
    FileNotFound = 2001,
    /// The process may not read or write the file
    PermissionDenied = 2002,

    // Configuration errors (3xxx)
    /// Configuration could not be read
    ConfigError = 3000,
    /// An explicitly requested config file does not exist
    ConfigNotFound = 3001,
    /// The config file is not valid TOML for the schema
    ConfigParseError = 3002,

    // Storage errors (4xxx)
    /// Local storage could not be written
    StorageError = 4000,
    /// Local storage holds unreadable data
    StorageCorrupted = 4001,
    /// The storage lock was poisoned
    StorageLocked = 4002,
}

impl ErrorCode {
    /// Get the numeric code
    pub fn code(&self) -> u32 {
        *self as u32
    }

    /// Get a human-readable category
    pub fn category(&self) -> &'static str {
        match self.code() / 1000 {
            2 => "IO",
            3 => "Configuration",
            4 => "Storage",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "E{:04}", self.code())
    }
}

/// Main error type with rich context
#[derive(Error, Debug)]
pub struct Error {
    /// Error code for programmatic handling
    pub code: ErrorCode,
    /// Human-readable message
    pub message: String,
    /// Additional context
    pub context: Option<String>,
    /// Recovery suggestion
    pub suggestion: Option<String>,
    /// Source error
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let Some(ctx) = &self.context {
            write!(f, "\n  Context: {ctx}")?;
        }
        if let Some(suggestion) = &self.suggestion {
            write!(f, "\n  Suggestion: {suggestion}")?;
        }
        Ok(())
    }
}

impl Error {
    /// Create a new error
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            context: None,
            suggestion: None,
            source: None,
        }
    }

    /// Add context to the error
    #[must_use]
    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.context = Some(context.into());
        self
    }

    /// Add a recovery suggestion
    #[must_use]
    pub fn with_suggestion(mut self, suggestion: impl Into<String>) -> Self {
        self.suggestion = Some(suggestion.into());
        self
    }

    /// Add a source error
    #[must_use]
    pub fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Configuration could not be read
    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::ConfigError, message)
    }

    /// An explicit config path points at nothing
    pub fn config_not_found(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::ConfigNotFound,
            format!("Configuration file not found: {}", path.as_ref().display()),
        )
        .with_suggestion("Create a .macrolog.toml file or pass --config with a valid path")
    }

    /// Local storage failure
    pub fn storage(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::StorageError, message)
    }

    /// Local storage file could not be decoded
    pub fn storage_corrupted(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(
            ErrorCode::StorageCorrupted,
            format!("Local storage is corrupted: {}", path.as_ref().display()),
        )
        .with_suggestion("Delete the file and log in again")
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        let code = match err.kind() {
            std::io::ErrorKind::NotFound => ErrorCode::FileNotFound,
            std::io::ErrorKind::PermissionDenied => ErrorCode::PermissionDenied,
            _ => ErrorCode::IoError,
        };
        Error::new(code, err.to_string()).with_source(err)
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::new(ErrorCode::StorageCorrupted, format!("JSON parse error: {err}"))
            .with_source(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::new(ErrorCode::ConfigParseError, format!("TOML parse error: {err}"))
            .with_source(err)
    }
}

/// Extension trait for adding context to Results
pub trait ResultExt<T> {
    /// Attach context to the error
    fn context(self, context: impl Into<String>) -> Result<T>;
    /// Attach a recovery suggestion to the error
    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T>;
}

impl<T> ResultExt<T> for Result<T> {
    fn context(self, context: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_context(context))
    }

    fn with_suggestion(self, suggestion: impl Into<String>) -> Result<T> {
        self.map_err(|e| e.with_suggestion(suggestion))
    }
}
