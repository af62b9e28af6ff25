//! Core utilities for the Macrolog client
//!
//! Shared building blocks used by the API client and the CLI:
//!
//! - **Error handling**: errors with codes, context and recovery suggestions
//! - **Configuration**: optional TOML file with per-section defaults
//! - **Storage**: file-backed key-value map used as local session storage

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod config;
pub mod error;
pub mod storage;

pub use error::{Error, ErrorCode, Result, ResultExt};

/// Re-export commonly used types
pub mod prelude {
    pub use crate::config::{Config, ConfigSchema};
    pub use crate::error::{Error, ErrorCode, Result, ResultExt};
    pub use crate::storage::KeyValueStore;
}
