//! Endpoint-specific API implementations
//!
//! Each module provides a typed interface for one backend resource. Every
//! method issues a single request; authenticated methods take the access
//! token as their first argument and are meant to be run through
//! [`crate::auth::AuthSession::with_auth_retry`].
//!
//! | Module | Backend path | Description |
//! |--------|--------------|-------------|
//! | `auth` | `/api/auth/*` | Login, signup, refresh, logout |
//! | `food_entries` | `/api/food-entries` | Food log CRUD |
//! | `achievements` | `/api/achievements` | Unlocked and in-progress achievements |
//! | `notifications` | `/api/notifications` | Inbox and read receipts |
//! | `profile` | `/api/profile` | User profile and macro goals |

pub mod achievements;
pub mod auth;
pub mod food_entries;
pub mod notifications;
pub mod profile;

pub use achievements::AchievementsApi;
pub use auth::AuthApi;
pub use food_entries::FoodEntriesApi;
pub use notifications::NotificationsApi;
pub use profile::ProfileApi;

use crate::client::value_message;
use crate::error::{ApiError, ApiResult};

/// Take the payload out of a decoded envelope
///
/// A 2xx body without the expected field is reported as a bad response,
/// carrying the envelope's own error message when it has one.
pub(crate) fn require_field<T>(
    field: Option<T>,
    error: Option<&serde_json::Value>,
    name: &str,
) -> ApiResult<T> {
    field.ok_or_else(|| {
        let message = error.map_or_else(
            || format!("response is missing `{name}`"),
            |e| value_message(e).unwrap_or_else(|| e.to_string()),
        );
        ApiError::bad_response(200, message)
    })
}

/// Build `<base>/<id>[/<suffix>]`, rejecting ids that would escape the path
pub(crate) fn resource_path(base: &str, id: &str, suffix: Option<&str>) -> ApiResult<String> {
    if id.is_empty()
        || id == "."
        || id == ".."
        || id.contains(['/', '?', '#', '%'])
        || id.chars().any(char::is_whitespace)
    {
        return Err(ApiError::InvalidUrl(format!("invalid resource id: {id:?}")));
    }
    Ok(match suffix {
        Some(s) => format!("{base}/{id}/{s}"),
        None => format!("{base}/{id}"),
    })
}
