//! mason-chat - two-party real-time chat: durable history, room-addressed
//! delivery, presence, and read-state tracking.

pub mod client;
pub mod core;
pub mod dtos;
pub mod entities;
pub mod repositories;
pub mod room;
pub mod services;
pub mod ws;

// Re-export the main types to ease imports
pub use core::{AppError, AppState, config};
pub use room::RoomId;
pub use services::root;

use axum::{
    Router,
    routing::{any, get, put},
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Build the application router.
pub fn create_router(state: Arc<AppState>) -> Router {
    use services::*;
    use ws::ws_handler;

    Router::new()
        .route("/", get(root))
        .nest("/api/messages", configure_message_routes())
        .route("/api/status/{user_id}", get(get_user_status))
        .route("/ws", any(ws_handler))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Routes for message history and read-state
fn configure_message_routes() -> Router<Arc<AppState>> {
    use services::*;

    Router::new()
        .route("/{room_id}", get(get_room_history))
        .route("/read/{room_id}/{user_id}", put(mark_room_read))
        .route("/unread/{room_id}/{user_id}", get(get_unread_count))
}
