//! Root liveness route.

use axum::Json;
use serde::Serialize;

/// Liveness payload served at `/`.
#[derive(Debug, Serialize)]
pub struct ServiceStatus {
    pub status: &'static str,
    pub message: &'static str,
}

/// Report that the API is up.
pub async fn home() -> Json<ServiceStatus> {
    Json(ServiceStatus {
        status: "ok",
        message: "Pinmap shared map API",
    })
}
