//! Authenticated calls with one-shot token refresh
//!
//! [`AuthSession::with_auth_retry`] runs an operation with the stored access
//! token. When the backend answers [`ApiError::SessionExpired`], the session is
//! refreshed once and the operation retried once with the new token. A second
//! rejection is returned as-is; there is no loop.
//!
//! Refreshes are serialized behind an async mutex. A caller that waited on the
//! lock while another caller rotated the tokens reuses the rotated token
//! instead of spending the new refresh token a second time.
//!
//! # Example
//!
//! ```rust,no_run
//! use macrolog_api_client::{AuthSession, MacrologClient, MemorySessionStore};
//! use std::sync::Arc;
//!
//! # async fn run() -> macrolog_api_client::ApiResult<()> {
//! let client = MacrologClient::new()?;
//! let auth = AuthSession::new(Arc::new(MemorySessionStore::new()), Arc::new(client.auth()));
//!
//! let profile_api = client.profile();
//! let api = &profile_api;
//! let profile = auth
//!     .with_auth_retry(move |token| async move { api.get(&token).await })
//!     .await?;
//! println!("{}", profile.email);
//! # Ok(())
//! # }
//! ```

use crate::error::{ApiError, ApiResult};
use crate::session::{Session, SessionStore};
use async_trait::async_trait;
use serde::Serialize;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// Exchanges a refresh token for a new session
#[async_trait]
pub trait TokenRefresher: Send + Sync {
    /// Any error is treated as a failed refresh
    async fn refresh(&self, refresh_token: &str) -> ApiResult<Session>;
}

/// Whether a usable session is held
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthState {
    /// Tokens are stored
    Authenticated,
    /// No session; the user has to log in
    LoggedOut,
}

/// Snapshot of the wrapper's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AuthStats {
    /// Calls to `with_auth_retry`
    pub operations: u64,
    /// Operations retried after a rejection
    pub retries: u64,
    /// Refresh requests sent to the backend
    pub refreshes: u64,
    /// Rejections served by a refresh another caller already made
    pub coalesced: u64,
    /// Refresh requests that failed
    pub refresh_failures: u64,
    /// Times the session was cleared because it could not be recovered
    pub forced_logouts: u64,
}

#[derive(Debug, Default)]
struct Counters {
    operations: AtomicU64,
    retries: AtomicU64,
    refreshes: AtomicU64,
    coalesced: AtomicU64,
    refresh_failures: AtomicU64,
    forced_logouts: AtomicU64,
}

impl Counters {
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    fn snapshot(&self) -> AuthStats {
        AuthStats {
            operations: self.operations.load(Ordering::Relaxed),
            retries: self.retries.load(Ordering::Relaxed),
            refreshes: self.refreshes.load(Ordering::Relaxed),
            coalesced: self.coalesced.load(Ordering::Relaxed),
            refresh_failures: self.refresh_failures.load(Ordering::Relaxed),
            forced_logouts: self.forced_logouts.load(Ordering::Relaxed),
        }
    }
}

/// Session manager wrapping every authenticated call
pub struct AuthSession {
    store: Arc<dyn SessionStore>,
    refresher: Arc<dyn TokenRefresher>,
    state: watch::Sender<AuthState>,
    refresh_lock: Mutex<()>,
    counters: Counters,
}

impl AuthSession {
    /// Create a session manager over an injected store and refresher
    ///
    /// The initial state is `Authenticated` when the store already holds an
    /// access token.
    pub fn new(store: Arc<dyn SessionStore>, refresher: Arc<dyn TokenRefresher>) -> Self {
        let initial = match store.access_token() {
            Ok(Some(_)) => AuthState::Authenticated,
            Ok(None) => AuthState::LoggedOut,
            Err(e) => {
                warn!(error = %e, "Could not read stored session, starting logged out");
                AuthState::LoggedOut
            }
        };
        let (state, _) = watch::channel(initial);

        Self {
            store,
            refresher,
            state,
            refresh_lock: Mutex::new(()),
            counters: Counters::default(),
        }
    }

    /// Current authentication state
    #[must_use]
    pub fn state(&self) -> AuthState {
        *self.state.borrow()
    }

    /// Whether a session is currently held
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.state() == AuthState::Authenticated
    }

    /// Observe state changes, e.g. to route the user back to login
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.state.subscribe()
    }

    /// Counters since construction
    #[must_use]
    pub fn stats(&self) -> AuthStats {
        self.counters.snapshot()
    }

    /// The injected session store
    #[must_use]
    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    /// Persist a session obtained from login or signup
    pub fn sign_in(&self, session: &Session) -> ApiResult<()> {
        self.store.save(session)?;
        self.set_state(AuthState::Authenticated);
        info!("Signed in");
        Ok(())
    }

    /// Drop the stored session
    pub fn sign_out(&self) -> ApiResult<()> {
        self.store.clear()?;
        self.set_state(AuthState::LoggedOut);
        info!("Signed out");
        Ok(())
    }

    /// Run `operation` with the current access token, refreshing once on rejection
    ///
    /// - No stored access token: the session is cleared and
    ///   `SessionExpired` returned without calling `operation`.
    /// - `SessionExpired` from the first attempt: one refresh, then one retry
    ///   with the new token; the retry's outcome is final.
    /// - Failed refresh: the session is cleared and `SessionExpired` returned.
    /// - Any other error is returned unchanged.
    pub async fn with_auth_retry<T, F, Fut>(&self, operation: F) -> ApiResult<T>
    where
        F: Fn(String) -> Fut,
        Fut: Future<Output = ApiResult<T>>,
    {
        Counters::bump(&self.counters.operations);

        let Some(token) = self.store.access_token()? else {
            debug!("No access token stored");
            self.expire_session();
            return Err(ApiError::SessionExpired);
        };

        match operation(token.clone()).await {
            Err(ApiError::SessionExpired) => {
                debug!("Access token rejected, refreshing");
            }
            other => return other,
        }

        let fresh = self.refresh_after_rejection(&token).await?;
        Counters::bump(&self.counters.retries);
        operation(fresh).await
    }

    /// Obtain a usable access token after `rejected` was refused
    async fn refresh_after_rejection(&self, rejected: &str) -> ApiResult<String> {
        let _guard = self.refresh_lock.lock().await;

        match self.store.access_token() {
            Ok(Some(current)) if current != rejected => {
                debug!("Tokens already rotated by a concurrent refresh");
                Counters::bump(&self.counters.coalesced);
                return Ok(current);
            }
            Ok(Some(_)) => {}
            Ok(None) => {
                debug!("Session cleared while waiting to refresh");
                self.expire_session();
                return Err(ApiError::SessionExpired);
            }
            Err(e) => {
                warn!(error = %e, "Could not read session before refresh");
                self.expire_session();
                return Err(ApiError::SessionExpired);
            }
        }

        let refresh_token = match self.store.refresh_token() {
            Ok(Some(token)) => token,
            Ok(None) => {
                warn!("No refresh token stored, logging out");
                self.expire_session();
                return Err(ApiError::SessionExpired);
            }
            Err(e) => {
                warn!(error = %e, "Could not read refresh token, logging out");
                self.expire_session();
                return Err(ApiError::SessionExpired);
            }
        };

        Counters::bump(&self.counters.refreshes);
        match self.refresher.refresh(&refresh_token).await {
            Ok(session) => {
                self.store.save(&session)?;
                self.set_state(AuthState::Authenticated);
                info!("Session refreshed");
                Ok(session.access_token)
            }
            Err(e) => {
                Counters::bump(&self.counters.refresh_failures);
                warn!(error = %e, "Token refresh failed, logging out");
                self.expire_session();
                Err(ApiError::SessionExpired)
            }
        }
    }

    /// Clear the session and mark the caller logged out
    fn expire_session(&self) {
        if let Err(e) = self.store.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        Counters::bump(&self.counters.forced_logouts);
        self.set_state(AuthState::LoggedOut);
    }

    fn set_state(&self, next: AuthState) {
        self.state.send_if_modified(|current| {
            if *current == next {
                false
            } else {
                *current = next;
                true
            }
        });
    }
}
