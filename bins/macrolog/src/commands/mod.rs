//! CLI command implementations

pub mod account;
pub mod achievements;
pub mod entries;
pub mod notifications;
pub mod profile;

use crate::config::Settings;
use crate::output::OutputFormat;
use anyhow::{Context as _, Result};
use macrolog_api_client::{AuthSession, KeyValueSessionStore, MacrologClient};
use std::sync::Arc;

/// Shared state handed to every command
pub struct Context {
    pub client: MacrologClient,
    pub auth: AuthSession,
    pub format: OutputFormat,
}

impl Context {
    /// Build the client and open the persisted session
    pub fn new(settings: &Settings, format: OutputFormat) -> Result<Self> {
        let client = MacrologClient::with_config(settings.client.clone())?;
        let store = KeyValueSessionStore::open(&settings.session_path).with_context(|| {
            format!("Failed to open session file {}", settings.session_path.display())
        })?;
        let auth = AuthSession::new(Arc::new(store), Arc::new(client.auth()));

        Ok(Self {
            client,
            auth,
            format,
        })
    }
}
