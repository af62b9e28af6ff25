//! Session model and storage
//!
//! A [`Session`] is the access/refresh token pair issued by the backend. It is
//! owned by a [`SessionStore`], which is injected into
//! [`crate::auth::AuthSession`] so tests can substitute their own storage.
//! Stores always write and clear the two tokens together.

use crate::error::{ApiError, ApiResult};
use macrolog_core::storage::KeyValueStore;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

/// Storage key for the access token
pub const ACCESS_TOKEN_KEY: &str = "auth.access_token";
/// Storage key for the refresh token
pub const REFRESH_TOKEN_KEY: &str = "auth.refresh_token";
/// Storage key for the token lifetime in seconds
pub const EXPIRES_IN_KEY: &str = "auth.expires_in";
/// Storage key for the expiry timestamp (unix seconds)
pub const EXPIRES_AT_KEY: &str = "auth.expires_at";

/// Token pair issued by the backend
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Short-lived bearer credential
    pub access_token: String,
    /// Credential exchanged for a new pair
    pub refresh_token: String,
    /// Lifetime of the access token in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<i64>,
    /// Unix timestamp at which the access token expires
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<i64>,
}

impl Session {
    /// Create a session without expiry information
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            expires_in: None,
            expires_at: None,
        }
    }

    /// Attach expiry information
    #[must_use]
    pub fn with_expiry(mut self, expires_in: Option<i64>, expires_at: Option<i64>) -> Self {
        self.expires_in = expires_in;
        self.expires_at = expires_at;
        self
    }

    /// Whether `expires_at` lies at or before `now` (unix seconds)
    ///
    /// Sessions without an expiry timestamp never report as expired.
    #[must_use]
    pub fn is_expired_at(&self, now: i64) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }

    /// Whether the session has expired according to the local clock
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(chrono::Utc::now().timestamp())
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .field("expires_in", &self.expires_in)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Persistent holder of the current session
pub trait SessionStore: Send + Sync {
    /// Read the whole session, if both tokens are present
    fn load(&self) -> ApiResult<Option<Session>>;

    /// Replace the stored session
    fn save(&self, session: &Session) -> ApiResult<()>;

    /// Remove both tokens
    fn clear(&self) -> ApiResult<()>;

    /// Current access token
    fn access_token(&self) -> ApiResult<Option<String>> {
        Ok(self.load()?.map(|s| s.access_token))
    }

    /// Current refresh token
    fn refresh_token(&self) -> ApiResult<Option<String>> {
        Ok(self.load()?.map(|s| s.refresh_token))
    }
}

/// In-memory session store
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    session: RwLock<Option<Session>>,
}

impl MemorySessionStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store already holding `session`
    #[must_use]
    pub fn with_session(session: Session) -> Self {
        Self {
            session: RwLock::new(Some(session)),
        }
    }
}

impl SessionStore for MemorySessionStore {
    fn load(&self) -> ApiResult<Option<Session>> {
        let guard = self
            .session
            .read()
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))?;
        *guard = Some(session.clone());
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        let mut guard = self
            .session
            .write()
            .map_err(|_| ApiError::Storage("session lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}

/// Session store persisted in a [`KeyValueStore`] under fixed keys
#[derive(Debug)]
pub struct KeyValueSessionStore {
    store: KeyValueStore,
}

impl KeyValueSessionStore {
    /// Wrap an opened key-value store
    #[must_use]
    pub fn new(store: KeyValueStore) -> Self {
        Self { store }
    }

    /// Open the key-value file at `path`
    pub fn open(path: impl AsRef<Path>) -> ApiResult<Self> {
        Ok(Self::new(KeyValueStore::open(path.as_ref())?))
    }

    /// Open the key-value file in the platform data directory
    pub fn open_default() -> ApiResult<Self> {
        Ok(Self::new(KeyValueStore::open_default()?))
    }

    /// Location of the backing file
    #[must_use]
    pub fn path(&self) -> &Path {
        self.store.path()
    }

    fn read_i64(&self, key: &str) -> ApiResult<Option<i64>> {
        Ok(self.store.get(key)?.and_then(|v| v.parse().ok()))
    }
}

impl SessionStore for KeyValueSessionStore {
    fn load(&self) -> ApiResult<Option<Session>> {
        let (Some(access), Some(refresh)) = (
            self.store.get(ACCESS_TOKEN_KEY)?,
            self.store.get(REFRESH_TOKEN_KEY)?,
        ) else {
            return Ok(None);
        };

        Ok(Some(Session::new(access, refresh).with_expiry(
            self.read_i64(EXPIRES_IN_KEY)?,
            self.read_i64(EXPIRES_AT_KEY)?,
        )))
    }

    fn save(&self, session: &Session) -> ApiResult<()> {
        let expires_in = session.expires_in.map(|v| v.to_string());
        let expires_at = session.expires_at.map(|v| v.to_string());

        let mut set = vec![
            (ACCESS_TOKEN_KEY, session.access_token.as_str()),
            (REFRESH_TOKEN_KEY, session.refresh_token.as_str()),
        ];
        let mut remove = Vec::new();
        match expires_in.as_deref() {
            Some(v) => set.push((EXPIRES_IN_KEY, v)),
            None => remove.push(EXPIRES_IN_KEY),
        }
        match expires_at.as_deref() {
            Some(v) => set.push((EXPIRES_AT_KEY, v)),
            None => remove.push(EXPIRES_AT_KEY),
        }

        self.store.update(&set, &remove)?;
        Ok(())
    }

    fn clear(&self) -> ApiResult<()> {
        self.store.remove_many(&[
            ACCESS_TOKEN_KEY,
            REFRESH_TOKEN_KEY,
            EXPIRES_IN_KEY,
            EXPIRES_AT_KEY,
        ])?;
        Ok(())
    }

    fn access_token(&self) -> ApiResult<Option<String>> {
        Ok(self.store.get(ACCESS_TOKEN_KEY)?)
    }

    fn refresh_token(&self) -> ApiResult<Option<String>> {
        Ok(self.store.get(REFRESH_TOKEN_KEY)?)
    }
}
