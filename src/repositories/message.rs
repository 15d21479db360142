//! MessageRepository - the durable, append-only message log

use crate::dtos::SendMessageDTO;
use crate::entities::StoredMessage;
use crate::room::RoomId;
use chrono::Utc;
use sqlx::{Error, SqlitePool};

pub struct MessageRepository {
    connection_pool: SqlitePool,
}

impl MessageRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Append a message to the room's log.
    ///
    /// Assigns the server id and `created_at`; the insert has committed by
    /// the time this returns, so fan-out and the history endpoint can never
    /// disagree about whether the message exists.
    pub async fn append(&self, data: &SendMessageDTO) -> Result<StoredMessage, Error> {
        let created_at = Utc::now();

        let result = sqlx::query(
            r#"
            INSERT INTO messages (room_id, sender_id, text, time, temp_id, created_at, is_read)
            VALUES (?, ?, ?, ?, ?, ?, 0)
            "#,
        )
        .bind(&data.room_id)
        .bind(&data.sender_id)
        .bind(&data.text)
        .bind(&data.time)
        .bind(&data.temp_id)
        .bind(created_at)
        .execute(&self.connection_pool)
        .await?;

        Ok(StoredMessage {
            message_id: result.last_insert_rowid(),
            room_id: data.room_id.clone(),
            sender_id: data.sender_id.clone(),
            text: data.text.clone(),
            time: data.time.clone(),
            temp_id: data.temp_id.clone(),
            created_at,
            read: false,
        })
    }

    /// All messages for a room in ascending `created_at` order. An unknown
    /// room yields an empty vec, not an error.
    pub async fn history(&self, room_id: &RoomId) -> Result<Vec<StoredMessage>, Error> {
        sqlx::query_as::<_, StoredMessage>(
            r#"
            SELECT message_id, room_id, sender_id, text, time, temp_id, created_at, is_read
            FROM messages
            WHERE room_id = ?
            ORDER BY created_at ASC, message_id ASC
            "#,
        )
        .bind(room_id.as_str())
        .fetch_all(&self.connection_pool)
        .await
    }

    pub async fn find_by_id(&self, message_id: i64) -> Result<Option<StoredMessage>, Error> {
        sqlx::query_as::<_, StoredMessage>(
            r#"
            SELECT message_id, room_id, sender_id, text, time, temp_id, created_at, is_read
            FROM messages
            WHERE message_id = ?
            "#,
        )
        .bind(message_id)
        .fetch_optional(&self.connection_pool)
        .await
    }
}
