//! Message DTOs

use crate::entities::StoredMessage;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Message shape exchanged with clients. `message_id` and `created_at` are
/// absent on optimistic client-local copies and present once persisted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct MessageDTO {
    pub message_id: Option<i64>,
    pub room_id: String,
    pub sender_id: String,
    pub text: String,
    #[serde(default)]
    pub time: String,
    #[serde(default)]
    pub temp_id: String,
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub read: bool,
}

impl From<StoredMessage> for MessageDTO {
    fn from(value: StoredMessage) -> Self {
        Self {
            message_id: Some(value.message_id),
            room_id: value.room_id,
            sender_id: value.sender_id,
            text: value.text,
            time: value.time,
            temp_id: value.temp_id,
            created_at: Some(value.created_at),
            read: value.read,
        }
    }
}

/// Payload of a `send_message` channel event.
#[derive(Serialize, Deserialize, Debug, Clone, Validate)]
pub struct SendMessageDTO {
    #[validate(length(min = 1, message = "room_id must not be empty"))]
    pub room_id: String,

    #[validate(length(min = 1, message = "sender_id must not be empty"))]
    pub sender_id: String,

    #[validate(length(
        min = 1,
        max = 5000,
        message = "Message text must be between 1 and 5000 characters"
    ))]
    pub text: String,

    #[serde(default)]
    pub time: String,

    #[serde(default)]
    pub temp_id: String,
}

/// Unread badge count for one (room, user) pair.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct UnreadCountDTO {
    pub count: i64,
}
