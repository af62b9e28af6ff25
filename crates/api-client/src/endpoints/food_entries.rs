//! Food entry endpoints
//!
//! Maps to `/api/food-entries`:
//! - List entries for a day
//! - Get, create, update and delete a single entry
//!
//! Nutrition values are computed by the backend; the client only mirrors them.

use crate::client::MacrologClient;
use crate::endpoints::{require_field, resource_path};
use crate::error::{ApiError, ApiResult};
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

const FOOD_ENTRIES_PATH: &str = "/api/food-entries";

/// Food entries API interface
#[derive(Clone)]
pub struct FoodEntriesApi {
    client: MacrologClient,
}

impl FoodEntriesApi {
    pub(crate) fn new(client: MacrologClient) -> Self {
        Self { client }
    }

    /// List entries, optionally restricted to one day
    ///
    /// GET /api/food-entries?date=YYYY-MM-DD
    pub async fn list(&self, access_token: &str, date: Option<NaiveDate>) -> ApiResult<Vec<FoodEntry>> {
        let query: Vec<(&str, String)> = date
            .map(|d| vec![("date", d.format("%Y-%m-%d").to_string())])
            .unwrap_or_default();

        let envelope: EntriesEnvelope = self
            .client
            .get_with_query(FOOD_ENTRIES_PATH, Some(access_token), &query)
            .await?;
        require_field(envelope.entries, envelope.error.as_ref(), "entries")
    }

    /// Get a single entry
    ///
    /// GET /api/food-entries/{id}
    pub async fn get(&self, access_token: &str, id: &str) -> ApiResult<FoodEntry> {
        let path = resource_path(FOOD_ENTRIES_PATH, id, None)?;
        let envelope: EntryEnvelope = self.client.get(&path, Some(access_token)).await?;
        envelope.into_entry()
    }

    /// Log a new entry
    ///
    /// POST /api/food-entries
    pub async fn create(&self, access_token: &str, entry: &NewFoodEntry) -> ApiResult<FoodEntry> {
        entry.validate()?;
        let envelope: EntryEnvelope = self
            .client
            .post(FOOD_ENTRIES_PATH, Some(access_token), entry)
            .await?;
        envelope.into_entry()
    }

    /// Update fields of an existing entry
    ///
    /// PUT /api/food-entries/{id}
    pub async fn update(
        &self,
        access_token: &str,
        id: &str,
        changes: &FoodEntryUpdate,
    ) -> ApiResult<FoodEntry> {
        changes.validate()?;
        let path = resource_path(FOOD_ENTRIES_PATH, id, None)?;
        let envelope: EntryEnvelope = self.client.put(&path, Some(access_token), changes).await?;
        envelope.into_entry()
    }

    /// Delete an entry
    ///
    /// DELETE /api/food-entries/{id}
    pub async fn delete(&self, access_token: &str, id: &str) -> ApiResult<()> {
        let path = resource_path(FOOD_ENTRIES_PATH, id, None)?;
        self.client
            .send_discarding(Method::DELETE, &path, Some(access_token), Option::<&()>::None)
            .await
    }
}

// ============================================================================
// Request/Response Types
// ============================================================================

/// Meal a food entry belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MealType {
    /// Morning meal
    Breakfast,
    /// Midday meal
    Lunch,
    /// Evening meal
    Dinner,
    /// Anything between meals
    Snack,
}

impl MealType {
    /// All meal types in display order
    pub const ALL: [MealType; 4] = [Self::Breakfast, Self::Lunch, Self::Dinner, Self::Snack];

    /// Lowercase wire name
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Breakfast => "breakfast",
            Self::Lunch => "lunch",
            Self::Dinner => "dinner",
            Self::Snack => "snack",
        }
    }
}

impl fmt::Display for MealType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MealType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|m| m.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown meal type: {s} (expected breakfast, lunch, dinner or snack)"))
    }
}

/// Food entry as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntry {
    /// Backend identifier
    pub id: String,
    /// Name as logged
    pub food_name: String,
    /// Energy in kcal
    #[serde(default)]
    pub calories: Option<f64>,
    /// Protein in grams
    #[serde(default)]
    pub protein: Option<f64>,
    /// Carbohydrates in grams
    #[serde(default)]
    pub carbs: Option<f64>,
    /// Fats in grams
    #[serde(default)]
    pub fats: Option<f64>,
    /// Free-text serving, e.g. "1 cup"
    #[serde(default)]
    pub serving_size: Option<String>,
    /// Meal the entry belongs to
    #[serde(default)]
    pub meal_type: Option<MealType>,
    /// When the food was eaten
    pub logged_at: DateTime<Utc>,
    /// Server-side creation time
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    /// Server-side last modification time
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Payload for logging a new entry
///
/// Leave the macro fields empty to let the backend estimate them from the name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewFoodEntry {
    /// What was eaten; must not be blank
    pub food_name: String,
    /// Energy in kcal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Protein in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    /// Carbohydrates in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    /// Fats in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fats: Option<f64>,
    /// Free-text serving
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    /// Meal the entry belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
    /// When the food was eaten; the backend uses now when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logged_at: Option<DateTime<Utc>>,
}

impl NewFoodEntry {
    /// Start an entry for the named food
    pub fn new(food_name: impl Into<String>) -> Self {
        Self {
            food_name: food_name.into(),
            ..Self::default()
        }
    }

    /// Set calories and macros (grams)
    #[must_use]
    pub fn with_macros(mut self, calories: f64, protein: f64, carbs: f64, fats: f64) -> Self {
        self.calories = Some(calories);
        self.protein = Some(protein);
        self.carbs = Some(carbs);
        self.fats = Some(fats);
        self
    }

    /// Set the serving size description
    #[must_use]
    pub fn with_serving_size(mut self, serving_size: impl Into<String>) -> Self {
        self.serving_size = Some(serving_size.into());
        self
    }

    /// Set the meal
    #[must_use]
    pub fn with_meal_type(mut self, meal_type: MealType) -> Self {
        self.meal_type = Some(meal_type);
        self
    }

    /// Set when the food was eaten
    #[must_use]
    pub fn with_logged_at(mut self, logged_at: DateTime<Utc>) -> Self {
        self.logged_at = Some(logged_at);
        self
    }

    fn validate(&self) -> ApiResult<()> {
        if self.food_name.trim().is_empty() {
            return Err(ApiError::invalid_input("food name cannot be empty"));
        }
        check_nutrition([self.calories, self.protein, self.carbs, self.fats])
    }
}

fn check_nutrition(values: [Option<f64>; 4]) -> ApiResult<()> {
    if values.into_iter().flatten().any(|v| !v.is_finite() || v < 0.0) {
        return Err(ApiError::invalid_input("nutrition values must be non-negative numbers"));
    }
    Ok(())
}

/// Partial update of an entry; unset fields are left untouched
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FoodEntryUpdate {
    /// New name; must not be blank
    #[serde(skip_serializing_if = "Option::is_none")]
    pub food_name: Option<String>,
    /// Energy in kcal
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<f64>,
    /// Protein in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protein: Option<f64>,
    /// Carbohydrates in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub carbs: Option<f64>,
    /// Fats in grams
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fats: Option<f64>,
    /// Free-text serving
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serving_size: Option<String>,
    /// Meal the entry belongs to
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<MealType>,
}

impl FoodEntryUpdate {
    /// Whether the update would change nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.food_name.is_none()
            && self.calories.is_none()
            && self.protein.is_none()
            && self.carbs.is_none()
            && self.fats.is_none()
            && self.serving_size.is_none()
            && self.meal_type.is_none()
    }

    fn validate(&self) -> ApiResult<()> {
        if self.food_name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(ApiError::invalid_input("food name cannot be empty"));
        }
        check_nutrition([self.calories, self.protein, self.carbs, self.fats])
    }
}

/// Calorie and macro sums over a set of entries
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct MacroTotals {
    /// Summed kcal
    pub calories: f64,
    /// Summed protein in grams
    pub protein: f64,
    /// Summed carbohydrates in grams
    pub carbs: f64,
    /// Summed fats in grams
    pub fats: f64,
    /// Number of entries summed
    pub entries: usize,
}

impl MacroTotals {
    /// Sum entries; missing values count as zero
    #[must_use]
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = &'a FoodEntry>) -> Self {
        entries.into_iter().fold(Self::default(), |mut acc, e| {
            acc.calories += e.calories.unwrap_or(0.0);
            acc.protein += e.protein.unwrap_or(0.0);
            acc.carbs += e.carbs.unwrap_or(0.0);
            acc.fats += e.fats.unwrap_or(0.0);
            acc.entries += 1;
            acc
        })
    }
}

#[derive(Debug, Deserialize)]
struct EntriesEnvelope {
    #[serde(default)]
    entries: Option<Vec<FoodEntry>>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct EntryEnvelope {
    #[serde(default)]
    entry: Option<FoodEntry>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl EntryEnvelope {
    fn into_entry(self) -> ApiResult<FoodEntry> {
        require_field(self.entry, self.error.as_ref(), "entry")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn api_for(server: &MockServer) -> FoodEntriesApi {
        MacrologClient::with_config(ClientConfig::development().with_base_url(server.uri()))
            .unwrap()
            .food_entries()
    }

    fn entry_json(id: &str, calories: f64) -> serde_json::Value {
        json!({
            "id": id,
            "foodName": "Greek yogurt",
            "calories": calories,
            "protein": 17.0,
            "carbs": 6.0,
            "fats": 0.7,
            "servingSize": "170 g",
            "mealType": "breakfast",
            "loggedAt": "2026-10-16T07:30:00Z"
        })
    }

    #[test]
    fn test_meal_type_parse() {
        assert_eq!("Lunch".parse::<MealType>().unwrap(), MealType::Lunch);
        assert!("brunch".parse::<MealType>().is_err());
        assert_eq!(MealType::Snack.to_string(), "snack");
    }

    #[test]
    fn test_new_entry_serializes_camel_case_without_nulls() {
        let entry = NewFoodEntry::new("Oatmeal")
            .with_meal_type(MealType::Breakfast)
            .with_serving_size("1 cup");
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(
            value,
            json!({"foodName": "Oatmeal", "servingSize": "1 cup", "mealType": "breakfast"})
        );
    }

    #[test]
    fn test_new_entry_validation() {
        assert!(NewFoodEntry::new("  ").validate().is_err());
        assert!(
            NewFoodEntry::new("Egg")
                .with_macros(-1.0, 6.0, 0.5, 5.0)
                .validate()
                .is_err()
        );
        assert!(
            NewFoodEntry::new("Egg")
                .with_macros(78.0, 6.0, 0.5, 5.0)
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_macro_totals() {
        let a: FoodEntry = serde_json::from_value(entry_json("a", 100.0)).unwrap();
        let mut b: FoodEntry = serde_json::from_value(entry_json("b", 50.0)).unwrap();
        b.protein = None;

        let totals = MacroTotals::from_entries(&[a, b]);
        assert_eq!(totals.entries, 2);
        assert_eq!(totals.calories, 150.0);
        assert_eq!(totals.protein, 17.0);
        assert_eq!(totals.carbs, 12.0);
    }

    #[test]
    fn test_update_is_empty() {
        assert!(FoodEntryUpdate::default().is_empty());
        let update = FoodEntryUpdate {
            calories: Some(120.0),
            ..FoodEntryUpdate::default()
        };
        assert!(!update.is_empty());
    }

    #[tokio::test]
    async fn test_update_rejects_bad_values_before_sending() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;
        let api = api_for(&server);

        let negative = FoodEntryUpdate {
            fats: Some(-2.0),
            ..FoodEntryUpdate::default()
        };
        let err = api.update("A1", "e1", &negative).await.unwrap_err();
        assert!(matches!(err, ApiError::InvalidInput(_)));

        let not_finite = FoodEntryUpdate {
            calories: Some(f64::NAN),
            ..FoodEntryUpdate::default()
        };
        assert!(matches!(
            api.update("A1", "e1", &not_finite).await,
            Err(ApiError::InvalidInput(_))
        ));

        let blank_name = FoodEntryUpdate {
            food_name: Some("  ".to_string()),
            ..FoodEntryUpdate::default()
        };
        assert!(blank_name.validate().is_err());
    }

    #[tokio::test]
    async fn test_list_for_date() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/food-entries"))
            .and(query_param("date", "2026-10-16"))
            .and(header("authorization", "Bearer A1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "entries": [entry_json("e1", 100.0), entry_json("e2", 150.0)]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let date = NaiveDate::from_ymd_opt(2026, 10, 16).unwrap();
        let entries = api_for(&server).list("A1", Some(date)).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].meal_type, Some(MealType::Breakfast));
        assert_eq!(entries[1].calories, Some(150.0));
    }

    #[tokio::test]
    async fn test_create_posts_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/food-entries"))
            .and(body_json(json!({"foodName": "Greek yogurt", "mealType": "breakfast"})))
            .respond_with(ResponseTemplate::new(201).set_body_json(json!({"entry": entry_json("e9", 100.0)})))
            .expect(1)
            .mount(&server)
            .await;

        let entry = api_for(&server)
            .create(
                "A1",
                &NewFoodEntry::new("Greek yogurt").with_meal_type(MealType::Breakfast),
            )
            .await
            .unwrap();
        assert_eq!(entry.id, "e9");
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/food-entries/e1"))
            .and(body_json(json!({"calories": 120.0})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"entry": entry_json("e1", 120.0)})))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("DELETE"))
            .and(path("/api/food-entries/e1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;

        let api = api_for(&server);
        let update = FoodEntryUpdate {
            calories: Some(120.0),
            ..FoodEntryUpdate::default()
        };
        let entry = api.update("A1", "e1", &update).await.unwrap();
        assert_eq!(entry.calories, Some(120.0));

        tokio_test::assert_ok!(api.delete("A1", "e1").await);
    }

    #[tokio::test]
    async fn test_get_missing_entry_is_bad_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/food-entries/nope"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"error": "entry not found"})))
            .mount(&server)
            .await;

        let err = api_for(&server).get("A1", "nope").await.unwrap_err();
        assert!(matches!(err, ApiError::BadResponse { status: 404, .. }));
    }

    #[tokio::test]
    async fn test_expired_token_is_session_expired() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/food-entries"))
            .respond_with(ResponseTemplate::new(401))
            .mount(&server)
            .await;

        let err = api_for(&server).list("stale", None).await.unwrap_err();
        assert!(err.is_session_expired());
    }
}
