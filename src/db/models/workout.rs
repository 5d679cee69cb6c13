//! Workout model, embedded exercises, and workout DTOs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use super::user::UserResponse;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Workout {
    pub id: String,
    pub title: String,
    /// RFC 3339 timestamp of when the workout took place
    pub date: String,
    pub duration_in_minutes: Option<f64>,
    pub author_id: String,
    /// JSON array of Exercise objects (stored as TEXT)
    pub exercises: String,
    pub created_at: String,
    pub updated_at: String,
}

/// An exercise embedded in its parent workout. Exercises have no row of
/// their own; they live and die with the workout.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Exercise {
    pub id: String,
    pub name: String,
    pub sets: i64,
    pub reps: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,
    pub created_at: String,
}

impl Exercise {
    pub fn new(payload: ExercisePayload) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            name: payload.name,
            sets: payload.sets,
            reps: payload.reps,
            weight: payload.weight,
            created_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Helper to parse the exercises JSON column
pub fn parse_exercises(json: &str) -> Vec<Exercise> {
    serde_json::from_str(json).unwrap_or_default()
}

/// Helper to serialize exercises back to JSON for storage
pub fn serialize_exercises(exercises: &[Exercise]) -> String {
    serde_json::to_string(exercises).unwrap_or_else(|_| "[]".to_string())
}

/// Response DTO for Workout with the author identity populated
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutResponse {
    pub id: String,
    pub title: String,
    pub date: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_in_minutes: Option<f64>,
    pub author: UserResponse,
    pub exercises: Vec<Exercise>,
    pub created_at: String,
    pub updated_at: String,
}

impl Workout {
    pub fn into_response(self, author: UserResponse) -> WorkoutResponse {
        let exercises = parse_exercises(&self.exercises);
        WorkoutResponse {
            id: self.id,
            title: self.title,
            date: self.date,
            duration_in_minutes: self.duration_in_minutes,
            author,
            exercises,
            created_at: self.created_at,
            updated_at: self.updated_at,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkoutRequest {
    pub title: String,
    pub date: DateTime<Utc>,
    pub duration_in_minutes: Option<f64>,
    #[serde(default)]
    pub exercises: Vec<ExercisePayload>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateWorkoutRequest {
    pub title: Option<String>,
    pub date: Option<DateTime<Utc>>,
    pub duration_in_minutes: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExercisePayload {
    pub name: String,
    pub sets: i64,
    pub reps: i64,
    pub weight: Option<f64>,
}
