//! Map API route handlers.

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
};
use pinmap_core::{CreatedMap, MapId, Pin, RawPin, SharedMap};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::error::{AppError, Result};
use crate::state::AppState;

/// Body of `POST /api/maps`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateMapRequest {
    pub title: String,
    pub pins: Vec<RawPin>,
}

/// Body of `GET /api/maps/{map_id}`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetMapResponse {
    pub map_id: MapId,
    pub title: String,
    pub pins: Vec<Pin>,
}

impl From<SharedMap> for GetMapResponse {
    fn from(map: SharedMap) -> Self {
        Self {
            map_id: map.id,
            title: map.title,
            pins: map.pins,
        }
    }
}

/// Geocode the submitted pins and store a new map.
#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    payload: std::result::Result<Json<CreateMapRequest>, JsonRejection>,
) -> Result<Json<CreatedMap>> {
    let Json(request) = payload.map_err(|e| AppError::BadRequest(e.body_text()))?;

    let created = state.maps().create_map(&request.title, request.pins).await?;
    Ok(Json(created))
}

/// Return a stored map.
#[instrument(skip(state))]
pub async fn show(
    State(state): State<AppState>,
    Path(map_id): Path<String>,
) -> Result<Json<GetMapResponse>> {
    let map = state.maps().get_map(&map_id).await?;
    Ok(Json(map.into()))
}
