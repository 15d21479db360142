//! ConnectionMap - per-connection signal senders keyed by user id

use dashmap::DashMap;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

use crate::dtos::ServerEvent;
use crate::room::RoomId;

/// Signals delivered to a connection's writer task over its internal channel.
pub enum InternalSignal {
    Shutdown,
    /// Subscribe the writer to a room's broadcast channel.
    Subscribe(RoomId),
    /// Push a single event to this connection only.
    Event(ServerEvent),
}

pub struct ConnectionMap {
    connected: DashMap<String, UnboundedSender<InternalSignal>>,
}

impl ConnectionMap {
    pub fn new() -> Self {
        ConnectionMap {
            connected: DashMap::new(),
        }
    }

    /// Register a connection. A reconnect for the same identity overwrites
    /// the previous entry; dropping the old sender shuts its writer down.
    #[instrument(skip(self, tx), fields(user_id))]
    pub fn register(&self, user_id: String, tx: UnboundedSender<InternalSignal>) {
        info!("Registering connection");
        self.connected.insert(user_id, tx);
        info!("Total connections: {}", self.connected.len());
    }

    /// Remove the entry for `user_id` only if it still belongs to the
    /// connection owning `tx`. A stale cleanup after a reconnect must not
    /// evict the fresh connection.
    #[instrument(skip(self, tx), fields(user_id))]
    pub fn remove_matching(&self, user_id: &str, tx: &UnboundedSender<InternalSignal>) {
        let removed = self
            .connected
            .remove_if(user_id, |_, current| current.same_channel(tx))
            .is_some();
        if removed {
            info!("Connection removed");
        } else {
            info!("Connection already replaced, leaving newer entry");
        }
    }

    #[instrument(skip(self, signal), fields(user_id))]
    pub fn send_if_connected(&self, user_id: &str, signal: InternalSignal) {
        if let Some(entry) = self.connected.get(user_id) {
            if entry.value().send(signal).is_err() {
                warn!("Connection channel closed, signal dropped");
            }
        } else {
            info!("User not connected, signal not sent");
        }
    }

    pub fn is_connected(&self, user_id: &str) -> bool {
        self.connected.contains_key(user_id)
    }

    pub fn connected_count(&self) -> usize {
        self.connected.len()
    }
}
