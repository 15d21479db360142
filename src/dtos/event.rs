//! WebSocket event DTOs
//!
//! Tagged unions for the bidirectional channel. Serde serializes these as:
//! `{ "type": "send_message", "data": { ... } }`

use serde::{Deserialize, Serialize};

use crate::dtos::{MessageDTO, PresenceStatus, SendMessageDTO};

/// Events a client sends into the channel.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    JoinRoom { room_id: String },
    UserOnline { user_id: String },
    UserOffline { user_id: String },
    SendMessage(SendMessageDTO),
}

/// Events the server pushes to connected clients.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Acknowledges a `join_room`; by the time a client sees this, its
    /// subscription to the room's fan-out is active.
    RoomJoined { room_id: String },
    StatusUpdate { user_id: String, status: PresenceStatus },
    ReceiveMessage(MessageDTO),
    /// A send was rejected or could not be stored. Carries the client's
    /// `temp_id` so the optimistic copy can be flagged, never re-minted.
    SendError { temp_id: String, reason: String },
    Error { code: u16, message: String },
}
