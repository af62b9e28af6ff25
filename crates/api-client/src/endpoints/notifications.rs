//! Notification endpoints
//!
//! Maps to `/api/notifications`: list the inbox and mark items read.

use crate::client::MacrologClient;
use crate::endpoints::{require_field, resource_path};
use crate::error::ApiResult;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};

const NOTIFICATIONS_PATH: &str = "/api/notifications";

/// Notifications API interface
#[derive(Clone)]
pub struct NotificationsApi {
    client: MacrologClient,
}

impl NotificationsApi {
    pub(crate) fn new(client: MacrologClient) -> Self {
        Self { client }
    }

    /// List notifications, newest first
    ///
    /// GET /api/notifications?unreadOnly=true|false
    pub async fn list(&self, access_token: &str, unread_only: bool) -> ApiResult<Vec<Notification>> {
        let query = [("unreadOnly", unread_only.to_string())];
        let envelope: NotificationsEnvelope = self
            .client
            .get_with_query(NOTIFICATIONS_PATH, Some(access_token), &query)
            .await?;
        require_field(envelope.notifications, envelope.error.as_ref(), "notifications")
    }

    /// Mark one notification as read
    ///
    /// POST /api/notifications/{id}/read
    pub async fn mark_read(&self, access_token: &str, id: &str) -> ApiResult<()> {
        let path = resource_path(NOTIFICATIONS_PATH, id, Some("read"))?;
        self.client
            .send_discarding(Method::POST, &path, Some(access_token), Option::<&()>::None)
            .await
    }
}

/// In-app notification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    /// Backend identifier
    pub id: String,
    /// Headline
    pub title: String,
    /// Optional longer text
    #[serde(default)]
    pub body: Option<String>,
    /// Whether it has been marked read
    #[serde(default)]
    pub read: bool,
    /// When it was sent
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
struct NotificationsEnvelope {
    #[serde(default)]
    notifications: Option<Vec<Notification>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}
