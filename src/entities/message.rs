//! Message entity - a single durably stored chat utterance

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A message as it exists after durable persistence. Immutable once stored,
/// except for the `read` flag.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct StoredMessage {
    pub message_id: i64,
    pub room_id: String,
    pub sender_id: String,
    pub text: String,
    /// Display timestamp captured on the sending client's wall clock.
    /// Advisory only; never used for ordering.
    pub time: String,
    /// Client-minted id, echoed back on fan-out so the sender can reconcile
    /// its optimistic local copy.
    pub temp_id: String,
    /// Server-assigned at persistence time; authoritative for ordering.
    pub created_at: DateTime<Utc>,
    #[sqlx(rename = "is_read")]
    pub read: bool,
}
