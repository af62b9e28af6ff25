//! Settings resolution for the CLI
//!
//! Precedence, highest first: command-line flags, `MACROLOG_*` environment
//! variables, the TOML config file, built-in defaults.

use anyhow::{Context, Result};
use macrolog_api_client::ClientConfig;
use macrolog_core::config::{ApiSection, Config, LoggingSection};
use macrolog_core::storage;
use macrolog_telemetry::TelemetryConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;

const API_URL_ENV: &str = "MACROLOG_API_URL";
const API_KEY_ENV: &str = "MACROLOG_API_KEY";
const TIMEOUT_ENV: &str = "MACROLOG_TIMEOUT_SECS";

/// Everything the CLI needs before it can talk to the backend
#[derive(Debug, Clone)]
pub struct Settings {
    pub client: ClientConfig,
    pub session_path: PathBuf,
    pub telemetry: TelemetryConfig,
}

/// Values supplied on the command line
#[derive(Debug, Default)]
pub struct Overrides<'a> {
    pub config_file: Option<&'a Path>,
    pub api_url: Option<&'a str>,
    pub session_file: Option<&'a Path>,
    pub verbose: bool,
}

impl Settings {
    /// Load the config file and merge it with environment and flags
    pub fn resolve(overrides: &Overrides<'_>) -> Result<Self> {
        let file = Config::load(overrides.config_file)?;

        let mut client = apply_file(ClientConfig::from_env()?, &file.schema.api, |var| {
            std::env::var_os(var).is_some()
        });
        if let Some(url) = overrides.api_url {
            client = client.with_base_url(url);
        }
        client.validate().context("Invalid API configuration")?;

        let session_path = overrides
            .session_file
            .map(Path::to_path_buf)
            .or_else(|| file.schema.session.path.as_ref().map(PathBuf::from))
            .unwrap_or_else(storage::default_path);

        Ok(Self {
            client,
            session_path,
            telemetry: telemetry_config(&file.schema.logging, overrides.verbose),
        })
    }
}

/// Fill in file values for settings the environment left unset
fn apply_file(
    mut config: ClientConfig,
    api: &ApiSection,
    env_is_set: impl Fn(&str) -> bool,
) -> ClientConfig {
    if !env_is_set(API_URL_ENV) {
        if let Some(url) = &api.base_url {
            config = config.with_base_url(url);
        }
    }
    if !env_is_set(API_KEY_ENV) {
        if let Some(key) = &api.api_key {
            config = config.with_api_key(key);
        }
    }
    if !env_is_set(TIMEOUT_ENV) {
        if let Some(secs) = api.timeout_secs {
            config = config.with_timeout(Duration::from_secs(secs));
        }
    }
    config
}

fn telemetry_config(logging: &LoggingSection, verbose: bool) -> TelemetryConfig {
    TelemetryConfig {
        log_level: if verbose {
            "macrolog=debug,macrolog_api_client=debug".to_string()
        } else {
            logging.level.clone()
        },
        json: logging.json,
        show_target: verbose,
        log_directory: logging.directory.as_ref().map(PathBuf::from),
    }
}
