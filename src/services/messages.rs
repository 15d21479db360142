//! Message services - history and read-state endpoints

use crate::core::{AppError, AppState};
use crate::dtos::{MessageDTO, UnreadCountDTO};
use crate::room::RoomId;
use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// `GET /api/messages/{room_id}`
///
/// Full ordered history for a room. A room with no prior activity is an
/// empty array, never an error.
#[instrument(skip(state), fields(room_id = %room_id))]
pub async fn get_room_history(
    State(state): State<Arc<AppState>>,
    Path(room_id): Path<String>,
) -> Result<Json<Vec<MessageDTO>>, AppError> {
    debug!("Fetching room history");
    let room = RoomId::from_raw(room_id);
    let messages = state.messages.history(&room).await?;

    info!("Returning {} messages", messages.len());
    Ok(Json(messages.into_iter().map(MessageDTO::from).collect()))
}

/// `PUT /api/messages/read/{room_id}/{user_id}`
///
/// Idempotent; succeeds even when the room has no messages yet.
#[instrument(skip(state), fields(room_id = %room_id, user_id = %user_id))]
pub async fn mark_room_read(
    State(state): State<Arc<AppState>>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    debug!("Marking room read");
    let room = RoomId::from_raw(room_id);
    state.read_state.mark_read(&room, &user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/messages/unread/{room_id}/{user_id}`
#[instrument(skip(state), fields(room_id = %room_id, user_id = %user_id))]
pub async fn get_unread_count(
    State(state): State<Arc<AppState>>,
    Path((room_id, user_id)): Path<(String, String)>,
) -> Result<Json<UnreadCountDTO>, AppError> {
    let room = RoomId::from_raw(room_id);
    let count = state.read_state.unread_count(&room, &user_id).await?;
    Ok(Json(UnreadCountDTO { count }))
}
