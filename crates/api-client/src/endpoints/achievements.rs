//! Achievement endpoints
//!
//! Streaks and badges are computed server-side; the client only lists them.

use crate::client::MacrologClient;
use crate::endpoints::require_field;
use crate::error::ApiResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

const ACHIEVEMENTS_PATH: &str = "/api/achievements";

/// Achievements API interface
#[derive(Clone)]
pub struct AchievementsApi {
    client: MacrologClient,
}

impl AchievementsApi {
    pub(crate) fn new(client: MacrologClient) -> Self {
        Self { client }
    }

    /// List all achievements with their progress
    ///
    /// GET /api/achievements
    pub async fn list(&self, access_token: &str) -> ApiResult<Vec<Achievement>> {
        let envelope: AchievementsEnvelope =
            self.client.get(ACHIEVEMENTS_PATH, Some(access_token)).await?;
        require_field(envelope.achievements, envelope.error.as_ref(), "achievements")
    }
}

/// Achievement and the user's progress towards it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Achievement {
    /// Backend identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// What it takes to unlock
    #[serde(default)]
    pub description: Option<String>,
    /// Unlock time; `None` while still locked
    #[serde(default)]
    pub unlocked_at: Option<DateTime<Utc>>,
    /// Fraction complete, `0.0..=1.0`
    #[serde(default)]
    pub progress: Option<f64>,
}

impl Achievement {
    /// Whether the achievement has been earned
    #[must_use]
    pub fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }

    /// Progress as a whole percentage, clamped to `0..=100`
    #[must_use]
    pub fn percent(&self) -> u8 {
        if self.is_unlocked() {
            return 100;
        }
        let fraction = self.progress.unwrap_or(0.0);
        if fraction.is_nan() {
            return 0;
        }
        (fraction.clamp(0.0, 1.0) * 100.0).round() as u8
    }
}

#[derive(Debug, Deserialize)]
struct AchievementsEnvelope {
    #[serde(default)]
    achievements: Option<Vec<Achievement>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}
