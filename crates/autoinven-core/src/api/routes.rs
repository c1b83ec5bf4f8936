//! API routes

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{self, AppState};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health
        .route("/health", get(handlers::health))

        // Pages that fire alert checks
        .route("/api/v1/bills", get(handlers::list_bills))
        .route("/api/v1/dashboard", get(handlers::dashboard))

        // Alerts
        .route("/api/v1/alerts/check", post(handlers::check_alerts))
        .route("/api/v1/alerts/status", get(handlers::alert_status))

        .with_state(state)
}
