//! Presence services - point-in-time status snapshot

use crate::core::AppState;
use crate::dtos::StatusDTO;
use axum::extract::{Json, Path, State};
use std::sync::Arc;
use tracing::instrument;

/// `GET /api/status/{user_id}`
///
/// Best-effort snapshot; unknown users read as offline.
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_user_status(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Json<StatusDTO> {
    Json(StatusDTO {
        status: state.presence.snapshot(&user_id),
    })
}
