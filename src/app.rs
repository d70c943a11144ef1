use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/students", post(handlers::add_student_form))
        .route("/api/statistics", get(handlers::get_statistics))
        .route("/api/activity", get(handlers::get_activity))
        .route("/api/students", post(handlers::add_student))
        .route("/fragments/statistics", get(handlers::statistics_fragment))
        .route("/fragments/activity/:status", get(handlers::activity_fragment))
        .fallback(handlers::not_found)
        .with_state(state)
}
