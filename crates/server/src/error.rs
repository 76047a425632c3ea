//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Error bodies are JSON: `{"detail": "..."}`.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::services::MapError;

/// Application-level error type for the API.
#[derive(Debug, Error)]
pub enum AppError {
    /// Map service operation failed.
    #[error(transparent)]
    Map(#[from] MapError),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

/// JSON error body.
#[derive(Debug, Serialize)]
struct ErrorBody {
    detail: String,
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Map(err) => match err {
                MapError::InvalidInput(_) => StatusCode::BAD_REQUEST,
                MapError::UnresolvableAddress { .. } => StatusCode::UNPROCESSABLE_ENTITY,
                MapError::NotFound(_) => StatusCode::NOT_FOUND,
                MapError::ProviderUnavailable(_) | MapError::Store(_) | MapError::Cache(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn detail(&self) -> String {
        // Don't expose internal error details to clients
        match self {
            Self::Map(err) => match err {
                MapError::InvalidInput(msg) => msg.clone(),
                MapError::UnresolvableAddress { address, .. } => {
                    format!("Failed to geocode address '{address}'")
                }
                MapError::NotFound(_) => "Map not found".to_string(),
                MapError::ProviderUnavailable(_) => "Geocoding service unavailable".to_string(),
                MapError::Store(_) | MapError::Cache(_) => "Internal server error".to_string(),
            },
            Self::NotFound(_) | Self::BadRequest(_) => self.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        (
            status,
            Json(ErrorBody {
                detail: self.detail(),
            }),
        )
            .into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;
