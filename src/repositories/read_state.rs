//! ReadStateRepository - per (room, user) read watermarks
//!
//! Owns the `read_state` table and the `is_read` flag on messages. Marking
//! read is idempotent; unread counts are derived from the watermark, never
//! stored.

use crate::room::RoomId;
use chrono::{DateTime, Utc};
use sqlx::{Error, SqlitePool};

pub struct ReadStateRepository {
    connection_pool: SqlitePool,
}

impl ReadStateRepository {
    pub fn new(connection_pool: SqlitePool) -> Self {
        Self { connection_pool }
    }

    /// Move the user's watermark for this room to "now" and flip the read
    /// flag on everything the other participant has sent. Succeeds on rooms
    /// with no messages.
    pub async fn mark_read(&self, room_id: &RoomId, user_id: &str) -> Result<(), Error> {
        let now = Utc::now();
        let mut tx = self.connection_pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO read_state (room_id, user_id, last_read_at)
            VALUES (?, ?, ?)
            ON CONFLICT (room_id, user_id) DO UPDATE SET last_read_at = excluded.last_read_at
            "#,
        )
        .bind(room_id.as_str())
        .bind(user_id)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            "UPDATE messages SET is_read = 1 WHERE room_id = ? AND sender_id <> ? AND is_read = 0",
        )
        .bind(room_id.as_str())
        .bind(user_id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(())
    }

    pub async fn last_read(
        &self,
        room_id: &RoomId,
        user_id: &str,
    ) -> Result<Option<DateTime<Utc>>, Error> {
        sqlx::query_scalar::<_, DateTime<Utc>>(
            "SELECT last_read_at FROM read_state WHERE room_id = ? AND user_id = ?",
        )
        .bind(room_id.as_str())
        .bind(user_id)
        .fetch_optional(&self.connection_pool)
        .await
    }

    /// Messages newer than the user's watermark that were sent by the other
    /// participant. Without a watermark, every message from the peer counts.
    pub async fn unread_count(&self, room_id: &RoomId, user_id: &str) -> Result<i64, Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*)
            FROM messages
            WHERE room_id = ?
              AND sender_id <> ?
              AND created_at > COALESCE(
                  (SELECT last_read_at FROM read_state WHERE room_id = ? AND user_id = ?),
                  ''
              )
            "#,
        )
        .bind(room_id.as_str())
        .bind(user_id)
        .bind(room_id.as_str())
        .bind(user_id)
        .fetch_one(&self.connection_pool)
        .await
    }
}
