//! Profile endpoints
//!
//! Maps to `/api/profile`: read and update the user's profile and goals.

use crate::client::MacrologClient;
use crate::endpoints::require_field;
use crate::error::ApiResult;
use serde::{Deserialize, Serialize};

const PROFILE_PATH: &str = "/api/profile";

/// Profile API interface
#[derive(Clone)]
pub struct ProfileApi {
    client: MacrologClient,
}

impl ProfileApi {
    pub(crate) fn new(client: MacrologClient) -> Self {
        Self { client }
    }

    /// Fetch the current user's profile
    ///
    /// GET /api/profile
    pub async fn get(&self, access_token: &str) -> ApiResult<Profile> {
        let envelope: ProfileEnvelope = self.client.get(PROFILE_PATH, Some(access_token)).await?;
        require_field(envelope.profile, envelope.error.as_ref(), "profile")
    }

    /// Update display name or goals
    ///
    /// PUT /api/profile
    pub async fn update(&self, access_token: &str, changes: &ProfileUpdate) -> ApiResult<Profile> {
        let envelope: ProfileEnvelope = self
            .client
            .put(PROFILE_PATH, Some(access_token), changes)
            .await?;
        require_field(envelope.profile, envelope.error.as_ref(), "profile")
    }
}

/// User profile with daily targets
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// Backend user id
    pub id: String,
    /// Account email
    pub email: String,
    /// Name shown in the app
    #[serde(default)]
    pub display_name: Option<String>,
    /// Daily energy target in kcal
    #[serde(default)]
    pub daily_calorie_goal: Option<u32>,
    /// Daily protein target in grams
    #[serde(default)]
    pub protein_goal: Option<f64>,
    /// Daily carbohydrate target in grams
    #[serde(default)]
    pub carbs_goal: Option<f64>,
    /// Daily fat target in grams
    #[serde(default)]
    pub fats_goal: Option<f64>,
}

/// Partial profile update; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    /// Name shown in the app
    #[serde(skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    /// Daily energy target in kcal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_calorie_goal: Option<u32>,
    /// Daily protein target in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein_goal: Option<f64>,
    /// Daily carbohydrate target in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs_goal: Option<f64>,
    /// Daily fat target in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fats_goal: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ProfileEnvelope {
    #[serde(default)]
    profile: Option<Profile>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl ProfileUpdate {
    /// Whether the update would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.daily_calorie_goal.is_none()
            && self.protein_goal.is_none()
            && self.carbs_goal.is_none()
            && self.fats_goal.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::error::ApiError;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> ProfileApi {
        MacrologClient::with_config(ClientConfig::development().with_base_url(server.uri()))
            .unwrap()
            .profile()
    }

    fn profile_json(goal: u32) -> serde_json::Value {
        json!({
            "id": "u1",
            "email": "kim@example.com",
            "displayName": "Kim",
            "dailyCalorieGoal": goal,
            "proteinGoal": 140.0
        })
    }

    #[tokio::test]
    async fn test_get() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profile": profile_json(2200)})))
            .mount(&server)
            .await;

        let profile = api_for(&server).get("A1").await.unwrap();
        assert_eq!(profile.display_name.as_deref(), Some("Kim"));
        assert_eq!(profile.daily_calorie_goal, Some(2200));
        assert_eq!(profile.fats_goal, None);
    }

    #[tokio::test]
    async fn test_update_sends_only_changes() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/profile"))
            .and(body_json(json!({"dailyCalorieGoal": 2000})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"profile": profile_json(2000)})))
            .expect(1)
            .mount(&server)
            .await;

        let changes = ProfileUpdate {
            daily_calorie_goal: Some(2000),
            ..ProfileUpdate::default()
        };
        let profile = api_for(&server).update("A1", &changes).await.unwrap();
        assert_eq!(profile.daily_calorie_goal, Some(2000));
    }

    #[test]
    fn test_update_is_empty() {
        assert!(ProfileUpdate::default().is_empty());
        let changes = ProfileUpdate {
            daily_calorie_goal: Some(2200),
            ..ProfileUpdate::default()
        };
        assert!(!changes.is_empty());
    }

    #[tokio::test]
    async fn test_error_envelope_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/profile"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"error": "profile not set up"})))
            .mount(&server)
            .await;

        let err = api_for(&server).get("A1").await.unwrap_err();
        assert!(matches!(err, ApiError::BadResponse { ref message, .. } if message == "profile not set up"));
    }
}
