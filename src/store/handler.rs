//! HTTP handlers for the board API
//!
//! The boundary the interactive front end talks to:
//! - POST /api/v1/notes      — save a text note
//! - POST /api/v1/media      — save a base64-encoded media artifact
//! - GET  /api/v1/artifacts  — list current artifacts, oldest first
//! - GET  /api/v1/device     — local device identity
//!
//! Save and list outcomes travel in a success/error envelope with HTTP 200;
//! the front end decides whether a failure becomes a user-facing alert.

use crate::store::store::ArtifactStore;
use crate::store::types::*;
use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared state for board handlers
#[derive(Clone)]
pub struct BoardState {
    pub store: Arc<ArtifactStore>,
}

/// Create the board router with all REST endpoints
pub fn board_router(state: BoardState) -> Router {
    Router::new()
        .route("/api/v1/notes", post(save_note))
        .route("/api/v1/media", post(save_media))
        .route("/api/v1/artifacts", get(list_artifacts))
        .route("/api/v1/device", get(get_device))
        .with_state(state)
}

/// POST /api/v1/notes
async fn save_note(
    State(state): State<BoardState>,
    Json(request): Json<SaveNoteRequest>,
) -> Json<SaveResponse> {
    match state
        .store
        .write_note(&request.filename, &request.content)
        .await
    {
        Ok(_) => Json(SaveResponse::ok()),
        Err(e) => {
            tracing::warn!(filename = %request.filename, "Failed to save note: {}", e);
            Json(SaveResponse::err(e.to_string()))
        }
    }
}

/// POST /api/v1/media
async fn save_media(
    State(state): State<BoardState>,
    Json(request): Json<SaveMediaRequest>,
) -> Json<SaveResponse> {
    match state
        .store
        .write_media(&request.filename, &request.data)
        .await
    {
        Ok(path) => Json(SaveResponse::ok_with_path(path.display().to_string())),
        Err(e) => {
            tracing::warn!(filename = %request.filename, "Failed to save media: {}", e);
            Json(SaveResponse::err(e.to_string()))
        }
    }
}

/// GET /api/v1/artifacts
async fn list_artifacts(State(state): State<BoardState>) -> Json<ListResponse> {
    match state.store.list().await {
        Ok(artifacts) => Json(ListResponse {
            success: true,
            artifacts,
            error: None,
        }),
        Err(e) => {
            tracing::warn!("Failed to list artifacts: {}", e);
            Json(ListResponse {
                success: false,
                artifacts: Vec::new(),
                error: Some(e.to_string()),
            })
        }
    }
}

/// GET /api/v1/device
async fn get_device(State(state): State<BoardState>) -> Json<DeviceResponse> {
    Json(DeviceResponse {
        device: state.store.device().to_string(),
    })
}
