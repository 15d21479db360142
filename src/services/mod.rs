//! Services module - HTTP handlers
//!
//! One module per surface: message history and read-state, and the presence
//! snapshot consumed by chat headers.

pub mod messages;
pub mod presence;

pub use messages::{get_room_history, get_unread_count, mark_room_read};
pub use presence::get_user_status;

use crate::core::AppState;
use axum::{extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

/// Root endpoint - health check
pub async fn root(State(_state): State<Arc<AppState>>) -> impl IntoResponse {
    (StatusCode::OK, "Server is running!")
}
