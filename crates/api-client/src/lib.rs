//! HTTP client for the Macrolog nutrition backend
//!
//! This crate wraps the Macrolog REST API with typed endpoint modules and a
//! session manager that keeps the caller signed in across access-token expiry.
//!
//! # Features
//!
//! - **Environment-based configuration**: base URL, API key and timeout from `MACROLOG_*` variables
//! - **Persistent sessions**: token pair stored through a pluggable [`SessionStore`]
//! - **One-shot refresh**: [`AuthSession::with_auth_retry`] refreshes once on a 401 and retries once
//! - **Request correlation**: every request carries a unique `X-Request-ID`
//!
//! # Example
//!
//! ```rust,no_run
//! use macrolog_api_client::{AuthSession, KeyValueSessionStore, MacrologClient};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = MacrologClient::new()?;
//!     let store = Arc::new(KeyValueSessionStore::open_default()?);
//!     let auth = AuthSession::new(store, Arc::new(client.auth()));
//!
//!     let session = client.auth().login("kim@example.com", "secret").await?;
//!     auth.sign_in(&session)?;
//!
//!     let entries_api = client.food_entries();
//!     let api = &entries_api;
//!     let entries = auth
//!         .with_auth_retry(move |token| async move { api.list(&token, None).await })
//!         .await?;
//!     println!("Logged {} entries", entries.len());
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod client;
pub mod config;
pub mod endpoints;
pub mod error;
pub mod session;

pub use auth::{AuthSession, AuthState, AuthStats, TokenRefresher};
pub use client::MacrologClient;
pub use config::{ClientConfig, Environment};
pub use error::{ApiError, ApiResult};
pub use session::{KeyValueSessionStore, MemorySessionStore, Session, SessionStore};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::auth::{AuthSession, AuthState, TokenRefresher};
    pub use crate::client::MacrologClient;
    pub use crate::config::{ClientConfig, Environment};
    pub use crate::endpoints::food_entries::{FoodEntry, MealType, NewFoodEntry};
    pub use crate::endpoints::{
        AchievementsApi, AuthApi, FoodEntriesApi, NotificationsApi, ProfileApi,
    };
    pub use crate::error::{ApiError, ApiResult};
    pub use crate::session::{Session, SessionStore};
}
