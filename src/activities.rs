//! Activity Records
//!
//! Typed activity log entries (workouts, meals, step counts) and an
//! authenticated client for the `/api/activities/` collection.

use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

const MAX_TITLE_LEN: usize = 200;

/// Kind of activity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Workout,
    Meal,
    Steps,
}

impl std::str::FromStr for ActivityType {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "workout" => Ok(ActivityType::Workout),
            "meal" => Ok(ActivityType::Meal),
            "steps" => Ok(ActivityType::Steps),
            other => Err(ActivityError::Validation(format!(
                "Unknown activity type '{}' (expected workout, meal or steps)",
                other
            ))),
        }
    }
}

impl fmt::Display for ActivityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityType::Workout => "workout",
            ActivityType::Meal => "meal",
            ActivityType::Steps => "steps",
        })
    }
}

/// Progress of an activity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityStatus {
    #[default]
    Planned,
    InProgress,
    Completed,
}

impl std::str::FromStr for ActivityStatus {
    type Err = ActivityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "planned" => Ok(ActivityStatus::Planned),
            "in_progress" => Ok(ActivityStatus::InProgress),
            "completed" => Ok(ActivityStatus::Completed),
            other => Err(ActivityError::Validation(format!(
                "Unknown status '{}' (expected planned, in_progress or completed)",
                other
            ))),
        }
    }
}

impl fmt::Display for ActivityStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ActivityStatus::Planned => "planned",
            ActivityStatus::InProgress => "in_progress",
            ActivityStatus::Completed => "completed",
        })
    }
}

/// A stored activity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Activity {
    pub id: u64,
    pub activity_type: ActivityType,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub date: NaiveDate,
    #[serde(default)]
    pub status: ActivityStatus,
    pub duration_minutes: Option<u32>,
    pub workout_type: Option<String>,
    pub calories: Option<u32>,
    pub meal_type: Option<String>,
    pub step_count: Option<u32>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Activity {
    /// One-line summary of the type-specific measurement
    pub fn measurement(&self) -> String {
        match self.activity_type {
            ActivityType::Workout => self
                .duration_minutes
                .map(|m| format!("{} min", m))
                .unwrap_or_default(),
            ActivityType::Meal => self
                .calories
                .map(|c| format!("{} kcal", c))
                .unwrap_or_default(),
            ActivityType::Steps => self
                .step_count
                .map(|s| format!("{} steps", s))
                .unwrap_or_default(),
        }
    }
}

/// Newest first, then most recently created
pub fn sort_newest_first(activities: &mut [Activity]) {
    activities.sort_by(|a, b| b.date.cmp(&a.date).then(b.created_at.cmp(&a.created_at)));
}

/// Fields for creating or replacing an activity
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewActivity {
    pub activity_type: ActivityType,
    pub title: String,
    pub description: String,
    pub date: NaiveDate,
    pub status: ActivityStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub workout_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub calories: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub meal_type: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub step_count: Option<u32>,
}

impl NewActivity {
    pub fn new(activity_type: ActivityType, title: impl Into<String>, date: NaiveDate) -> Self {
        Self {
            activity_type,
            title: title.into(),
            description: String::new(),
            date,
            status: ActivityStatus::default(),
            duration_minutes: None,
            workout_type: None,
            calories: None,
            meal_type: None,
            step_count: None,
        }
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn status(mut self, status: ActivityStatus) -> Self {
        self.status = status;
        self
    }

    pub fn workout(mut self, workout_type: impl Into<String>, minutes: u32) -> Self {
        self.workout_type = Some(workout_type.into());
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn meal(mut self, meal_type: impl Into<String>, calories: u32) -> Self {
        self.meal_type = Some(meal_type.into());
        self.calories = Some(calories);
        self
    }

    pub fn steps(mut self, count: u32) -> Self {
        self.step_count = Some(count);
        self
    }

    /// Check the record before sending it. Type-specific measurements are
    /// optional (a planned workout has no duration yet).
    pub fn validate(&self) -> Result<(), ActivityError> {
        let title = self.title.trim();
        if title.is_empty() {
            return Err(ActivityError::Validation("Title is required".into()));
        }
        if title.chars().count() > MAX_TITLE_LEN {
            return Err(ActivityError::Validation(format!(
                "Title must be at most {} characters",
                MAX_TITLE_LEN
            )));
        }

        Ok(())
    }
}

impl From<&Activity> for NewActivity {
    fn from(activity: &Activity) -> Self {
        Self {
            activity_type: activity.activity_type,
            title: activity.title.clone(),
            description: activity.description.clone(),
            date: activity.date,
            status: activity.status,
            duration_minutes: activity.duration_minutes,
            workout_type: activity.workout_type.clone(),
            calories: activity.calories,
            meal_type: activity.meal_type.clone(),
            step_count: activity.step_count,
        }
    }
}

/// Errors from the activities API
#[derive(Error, Debug)]
pub enum ActivityError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("Activity {0} not found")]
    NotFound(u64),

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
}

/// Client for the signed-in user's activities
#[derive(Debug, Clone)]
pub struct ActivitiesClient {
    client: Client,
    base_url: String,
    token: String,
}

impl ActivitiesClient {
    /// Create a client authorized with a session token
    pub fn new(
        base_url: impl Into<String>,
        token: Option<String>,
        timeout: Option<std::time::Duration>,
    ) -> Result<Self, ActivityError> {
        let token = token
            .filter(|t| !t.is_empty())
            .ok_or(ActivityError::NotAuthenticated)?;

        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token,
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/api/activities/", self.base_url)
    }

    fn item_url(&self, id: u64) -> String {
        format!("{}/api/activities/{}/", self.base_url, id)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request.header(reqwest::header::AUTHORIZATION, format!("Token {}", self.token))
    }

    async fn check(response: Response, id: Option<u64>) -> Result<Response, ActivityError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::UNAUTHORIZED {
            return Err(ActivityError::NotAuthenticated);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = id {
                return Err(ActivityError::NotFound(id));
            }
        }

        let body = response.text().await.unwrap_or_default();
        let message = crate::client::error_message(&body).unwrap_or(body);
        Err(ActivityError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// All activities, newest first
    pub async fn list(&self) -> Result<Vec<Activity>, ActivityError> {
        let response = self
            .authorized(self.client.get(self.collection_url()))
            .send()
            .await?;
        let mut activities: Vec<Activity> = Self::check(response, None).await?.json().await?;
        sort_newest_first(&mut activities);
        Ok(activities)
    }

    pub async fn get(&self, id: u64) -> Result<Activity, ActivityError> {
        let response = self
            .authorized(self.client.get(self.item_url(id)))
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    pub async fn create(&self, activity: &NewActivity) -> Result<Activity, ActivityError> {
        activity.validate()?;
        let response = self
            .authorized(self.client.post(self.collection_url()))
            .json(activity)
            .send()
            .await?;
        let created: Activity = Self::check(response, None).await?.json().await?;
        tracing::info!("Created activity {} ({})", created.id, created.title);
        Ok(created)
    }

    pub async fn update(&self, id: u64, activity: &NewActivity) -> Result<Activity, ActivityError> {
        activity.validate()?;
        let response = self
            .authorized(self.client.put(self.item_url(id)))
            .json(activity)
            .send()
            .await?;
        Ok(Self::check(response, Some(id)).await?.json().await?)
    }

    pub async fn delete(&self, id: u64) -> Result<(), ActivityError> {
        let response = self
            .authorized(self.client.delete(self.item_url(id)))
            .send()
            .await?;
        Self::check(response, Some(id)).await?;
        tracing::info!("Deleted activity {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_deserialize_activity() {
        let json = r#"{
            "id": 3, "user": 1, "activity_type": "workout", "title": "Morning Run",
            "description": "", "date": "2024-01-15", "status": "in_progress",
            "duration_minutes": 45, "workout_type": "Running", "calories": null,
            "meal_type": null, "step_count": null,
            "created_at": "2024-01-15T07:00:00Z", "updated_at": "2024-01-15T08:00:00Z"
        }"#;
        let activity: Activity = serde_json::from_str(json).unwrap();
        assert_eq!(activity.activity_type, ActivityType::Workout);
        assert_eq!(activity.status, ActivityStatus::InProgress);
        assert_eq!(activity.measurement(), "45 min");
    }

    #[test]
    fn test_sort_newest_first() {
        let base = NewActivity::new(ActivityType::Steps, "walk", date("2024-01-01"));
        let make = |id: u64, d: &str| Activity {
            id,
            activity_type: base.activity_type,
            title: base.title.clone(),
            description: String::new(),
            date: date(d),
            status: ActivityStatus::Completed,
            duration_minutes: None,
            workout_type: None,
            calories: None,
            meal_type: None,
            step_count: Some(1000),
            created_at: None,
            updated_at: None,
        };
        let mut list = vec![make(1, "2024-01-13"), make(2, "2024-01-15"), make(3, "2024-01-14")];
        sort_newest_first(&mut list);
        let ids: Vec<u64> = list.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 3, 1]);
    }

    #[test]
    fn test_validate() {
        let planned = NewActivity::new(ActivityType::Workout, "Gym", date("2024-01-15"));
        assert!(planned.validate().is_ok());
        assert!(NewActivity::new(ActivityType::Meal, "Lunch", date("2024-01-15"))
            .validate()
            .is_ok());
        assert!(NewActivity::new(ActivityType::Steps, "Walk", date("2024-01-15"))
            .validate()
            .is_ok());

        let empty = NewActivity::new(ActivityType::Meal, "", date("2024-01-15")).meal("lunch", 650);
        assert!(matches!(empty.validate(), Err(ActivityError::Validation(_))));

        let untitled = NewActivity::new(ActivityType::Steps, "  ", date("2024-01-15")).steps(10);
        assert!(untitled.validate().is_err());

        let long = NewActivity::new(ActivityType::Steps, "x".repeat(201), date("2024-01-15"))
            .steps(10);
        assert!(long.validate().is_err());
    }

    #[test]
    fn test_new_activity_body() {
        let body = serde_json::to_value(
            NewActivity::new(ActivityType::Workout, "Gym", date("2024-01-14")).workout("Strength", 60),
        )
        .unwrap();
        assert_eq!(body["activity_type"], "workout");
        assert_eq!(body["status"], "planned");
        assert_eq!(body["date"], "2024-01-14");
        assert!(body.get("calories").is_none());
    }

    #[test]
    fn test_parse_enums() {
        assert_eq!("Meal".parse::<ActivityType>().unwrap(), ActivityType::Meal);
        assert!("yoga".parse::<ActivityType>().is_err());
        assert_eq!(
            "in-progress".parse::<ActivityStatus>().unwrap(),
            ActivityStatus::InProgress
        );
    }

    #[test]
    fn test_client_requires_token() {
        let err = ActivitiesClient::new("http://localhost:8000", None, None).unwrap_err();
        assert!(matches!(err, ActivityError::NotAuthenticated));
    }
}
