pub mod auth;
mod error;
mod extract;
mod validation;
mod workouts;

pub use error::{ApiError, ErrorCode};
pub use extract::Json;

use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::AppState;

pub fn create_router(state: Arc<AppState>) -> Router {
    // Auth routes (public)
    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login));

    // Workout routes, gated by the auth middleware
    let workout_routes = Router::new()
        .route("/workouts", get(workouts::list_workouts))
        .route("/workouts", post(workouts::create_workout))
        .route("/workouts/:id", get(workouts::get_workout))
        .route("/workouts/:id", put(workouts::update_workout))
        .route("/workouts/:id", delete(workouts::delete_workout))
        .route("/workouts/:id/exercises", post(workouts::add_exercise))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .nest("/auth", auth_routes)
        .merge(workout_routes)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "OK"
}
