//! WebSocket module - the real-time delivery channel
//!
//! One long-lived connection per client session:
//! - HTTP -> WebSocket upgrade with the client identity in the query string
//! - connection handling (split sender/receiver tasks)
//! - per-room broadcast map defining the fan-out order
//! - presence tracking with push-based status updates

pub mod connection;
pub mod connmap;
pub mod events;
pub mod presence;
pub mod roommap;

pub use connection::handle_socket;

use crate::core::{AppError, AppState};
use axum::{
    extract::{Query, State, ws::WebSocketUpgrade},
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

/// Capacity of each room's broadcast channel. A slow reader that lags this
/// far behind loses events and falls back to re-fetching history.
pub(crate) const BROADCAST_CHANNEL_CAPACITY: usize = 256;

/// Minimum spacing enforced between inbound frames on one connection.
pub(crate) const RATE_LIMITER_MILLIS: u64 = 20;

/// A connection with no inbound traffic for this long is considered gone.
/// Reconnect re-announces online, so dropping is cheap.
pub(crate) const IDLE_TIMEOUT_SECONDS: u64 = 600;

#[derive(Deserialize)]
pub struct WsQuery {
    pub user_id: String,
}

/// Entry point for WebSocket upgrade requests on `/ws?user_id=...`.
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<Arc<AppState>>,
) -> Result<Response, AppError> {
    let user_id = query.user_id.trim().to_string();
    if user_id.is_empty() {
        return Err(AppError::bad_request("user_id query parameter is required"));
    }

    Ok(ws.on_upgrade(move |socket| handle_socket(socket, state, user_id)))
}
