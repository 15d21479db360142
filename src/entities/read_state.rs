//! Read-state entity - per (room, user) "read up to" watermark

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, sqlx::FromRow)]
pub struct ReadMarker {
    pub room_id: String,
    pub user_id: String,
    pub last_read_at: DateTime<Utc>,
}
