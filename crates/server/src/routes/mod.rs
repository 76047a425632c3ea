//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                       - Liveness payload
//! GET  /health                 - Health check (plain "ok")
//! GET  /health/ready           - Readiness (database reachable)
//!
//! # Maps API
//! POST /api/maps               - Geocode pins and create a shared map
//! GET  /api/maps/{map_id}      - Fetch a shared map (counts a view)
//! ```

pub mod home;
pub mod maps;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};

use crate::error::AppError;
use crate::state::AppState;

/// Create the map API router.
pub fn map_routes() -> Router<AppState> {
    Router::new()
        .route("/", post(maps::create))
        .route("/{map_id}", get(maps::show))
}

/// Create all routes for the API.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .nest("/api/maps", map_routes())
        .fallback(not_found)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Verifies database connectivity before returning OK.
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match state.maps().ready().await {
        Ok(()) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

async fn not_found() -> AppError {
    AppError::NotFound("no such route".to_string())
}
