//! Application state shared across routes and WebSocket tasks.

use crate::repositories::{MessageRepository, ReadStateRepository};
use crate::ws::connmap::ConnectionMap;
use crate::ws::presence::PresenceTracker;
use crate::ws::roommap::RoomMap;
use sqlx::SqlitePool;

pub struct AppState {
    /// Durable, queryable log of messages.
    pub messages: MessageRepository,

    /// Per (room, user) read watermarks.
    pub read_state: ReadStateRepository,

    /// In-memory online/offline map plus the interest registry used to push
    /// status updates. Process-wide, not persisted.
    pub presence: PresenceTracker,

    /// Per-connection signal senders, keyed by user id.
    pub connections: ConnectionMap,

    /// Per-room broadcast channels; the single fan-out point that defines
    /// message order within a room.
    pub rooms: RoomMap,
}

impl AppState {
    /// Create the application state, initializing every repository with the
    /// provided connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            messages: MessageRepository::new(pool.clone()),
            read_state: ReadStateRepository::new(pool),
            presence: PresenceTracker::new(),
            connections: ConnectionMap::new(),
            rooms: RoomMap::new(),
        }
    }
}
