//! Workout CRUD endpoints, scoped to the authenticated owner.
//!
//! Every read and mutation filters on `id = ? AND author_id = ?`, so a
//! missing workout and another user's workout are both reported as 404.
//! The author is assigned server-side at creation and never reassigned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use uuid::Uuid;

use super::auth::AuthUser;
use super::error::ApiError;
use super::extract::Json;
use super::validation::{
    validate_count, validate_duration, validate_exercise_name, validate_title, validate_weight,
};
use crate::db::{
    parse_exercises, serialize_exercises, CreateWorkoutRequest, Exercise, ExercisePayload,
    UpdateWorkoutRequest, UserResponse, Workout, WorkoutResponse,
};
use crate::AppState;

fn validate_exercise_payload(payload: &ExercisePayload) -> Result<(), ApiError> {
    if let Err(e) = validate_exercise_name(&payload.name) {
        return Err(ApiError::validation_field("name", e));
    }
    if let Err(e) = validate_count(payload.sets, "sets") {
        return Err(ApiError::validation_field("sets", e));
    }
    if let Err(e) = validate_count(payload.reps, "reps") {
        return Err(ApiError::validation_field("reps", e));
    }
    if let Err(e) = validate_weight(&payload.weight) {
        return Err(ApiError::validation_field("weight", e));
    }
    Ok(())
}

/// Fetch a workout only if it belongs to the caller
async fn find_owned_workout(
    state: &AppState,
    id: &str,
    user: &AuthUser,
) -> Result<Workout, ApiError> {
    let workout: Option<Workout> =
        sqlx::query_as("SELECT * FROM workouts WHERE id = ? AND author_id = ?")
            .bind(id)
            .bind(&user.id)
            .fetch_optional(&state.db)
            .await?;

    workout.ok_or_else(|| ApiError::not_found("Workout not found."))
}

/// List the caller's workouts, most recent date first
///
/// GET /workouts
pub async fn list_workouts(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
) -> Result<Json<Vec<WorkoutResponse>>, ApiError> {
    let workouts: Vec<Workout> =
        sqlx::query_as("SELECT * FROM workouts WHERE author_id = ? ORDER BY date DESC")
            .bind(&user.id)
            .fetch_all(&state.db)
            .await?;

    let author = UserResponse::from(user);
    let responses = workouts
        .into_iter()
        .map(|w| w.into_response(author.clone()))
        .collect();

    Ok(Json(responses))
}

/// Get a single workout
///
/// GET /workouts/:id
pub async fn get_workout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutResponse>, ApiError> {
    let workout = find_owned_workout(&state, &id, &user).await?;
    Ok(Json(workout.into_response(UserResponse::from(user))))
}

/// Create a workout owned by the caller
///
/// POST /workouts
pub async fn create_workout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Json(req): Json<CreateWorkoutRequest>,
) -> Result<(StatusCode, Json<WorkoutResponse>), ApiError> {
    if let Err(e) = validate_title(&req.title) {
        return Err(ApiError::validation_field("title", e));
    }
    if let Err(e) = validate_duration(&req.duration_in_minutes) {
        return Err(ApiError::validation_field("durationInMinutes", e));
    }
    for payload in &req.exercises {
        validate_exercise_payload(payload)?;
    }

    let id = Uuid::new_v4().to_string();
    let now = chrono::Utc::now().to_rfc3339();
    let exercises: Vec<Exercise> = req.exercises.into_iter().map(Exercise::new).collect();

    // author_id comes from the verified token, never from the payload
    sqlx::query(
        r#"
        INSERT INTO workouts (id, title, date, duration_in_minutes, author_id, exercises, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&id)
    .bind(&req.title)
    .bind(req.date.to_rfc3339())
    .bind(req.duration_in_minutes)
    .bind(&user.id)
    .bind(serialize_exercises(&exercises))
    .bind(&now)
    .bind(&now)
    .execute(&state.db)
    .await?;

    let workout: Workout = sqlx::query_as("SELECT * FROM workouts WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    tracing::info!(workout_id = %id, author = %user.id, "Workout created");

    Ok((
        StatusCode::CREATED,
        Json(workout.into_response(UserResponse::from(user))),
    ))
}

/// Update a workout's mutable fields (title, date, duration)
///
/// PUT /workouts/:id
pub async fn update_workout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(req): Json<UpdateWorkoutRequest>,
) -> Result<Json<WorkoutResponse>, ApiError> {
    if let Some(ref title) = req.title {
        if let Err(e) = validate_title(title) {
            return Err(ApiError::validation_field("title", e));
        }
    }
    if let Err(e) = validate_duration(&req.duration_in_minutes) {
        return Err(ApiError::validation_field("durationInMinutes", e));
    }

    // Ownership check up front so a foreign id 404s before any write
    find_owned_workout(&state, &id, &user).await?;

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query(
        r#"
        UPDATE workouts SET
            title = COALESCE(?, title),
            date = COALESCE(?, date),
            duration_in_minutes = COALESCE(?, duration_in_minutes),
            updated_at = ?
        WHERE id = ? AND author_id = ?
        "#,
    )
    .bind(&req.title)
    .bind(req.date.map(|d| d.to_rfc3339()))
    .bind(req.duration_in_minutes)
    .bind(&now)
    .bind(&id)
    .bind(&user.id)
    .execute(&state.db)
    .await?;

    let workout: Workout = sqlx::query_as("SELECT * FROM workouts WHERE id = ?")
        .bind(&id)
        .fetch_one(&state.db)
        .await?;

    Ok(Json(workout.into_response(UserResponse::from(user))))
}

/// Delete a workout and its embedded exercises, returning its prior state
///
/// DELETE /workouts/:id
pub async fn delete_workout(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<WorkoutResponse>, ApiError> {
    let workout = find_owned_workout(&state, &id, &user).await?;

    sqlx::query("DELETE FROM workouts WHERE id = ? AND author_id = ?")
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    tracing::info!(workout_id = %id, author = %user.id, "Workout deleted");

    Ok(Json(workout.into_response(UserResponse::from(user))))
}

/// Append an exercise to the end of a workout's sequence
///
/// POST /workouts/:id/exercises
pub async fn add_exercise(
    State(state): State<Arc<AppState>>,
    user: AuthUser,
    Path(id): Path<String>,
    Json(payload): Json<ExercisePayload>,
) -> Result<(StatusCode, Json<Exercise>), ApiError> {
    validate_exercise_payload(&payload)?;

    // If the parent can't be found or isn't owned, nothing is appended
    let workout = find_owned_workout(&state, &id, &user).await?;

    let mut exercises = parse_exercises(&workout.exercises);
    let exercise = Exercise::new(payload);
    exercises.push(exercise.clone());

    let now = chrono::Utc::now().to_rfc3339();

    sqlx::query("UPDATE workouts SET exercises = ?, updated_at = ? WHERE id = ? AND author_id = ?")
        .bind(serialize_exercises(&exercises))
        .bind(&now)
        .bind(&id)
        .bind(&user.id)
        .execute(&state.db)
        .await?;

    Ok((StatusCode::CREATED, Json(exercise)))
}
