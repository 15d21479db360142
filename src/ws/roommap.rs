//! RoomMap - one broadcast channel per room with at least one subscriber
//!
//! The broadcast channel is the single fan-out point for a room: every
//! subscriber observes events in the order they were sent into it, which is
//! the only ordering guarantee the channel makes.

use crate::dtos::ServerEvent;
use crate::room::RoomId;
use crate::ws::BROADCAST_CHANNEL_CAPACITY;
use dashmap::DashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::SendError;
use tokio::sync::broadcast::{Receiver, Sender};
use tracing::{info, instrument, warn};

pub struct RoomMap {
    channels: DashMap<RoomId, Sender<Arc<ServerEvent>>>,
}

impl RoomMap {
    pub fn new() -> Self {
        RoomMap {
            channels: DashMap::new(),
        }
    }

    /// Subscribe to a room, lazily creating its channel. Creation goes
    /// through the map's entry lock, so two first subscribers racing on the
    /// same room always land on one shared channel. Events are shared as
    /// `Arc` so fan-out to N receivers never copies the payload.
    #[instrument(skip(self), fields(room_id = %room_id))]
    pub fn subscribe(&self, room_id: &RoomId) -> Receiver<Arc<ServerEvent>> {
        self.channels
            .entry(room_id.clone())
            .or_insert_with(|| {
                info!("Creating broadcast channel for room");
                broadcast::channel::<Arc<ServerEvent>>(BROADCAST_CHANNEL_CAPACITY).0
            })
            .subscribe()
    }

    #[instrument(skip(self, event), fields(room_id = %room_id))]
    pub fn send(
        &self,
        room_id: &RoomId,
        event: Arc<ServerEvent>,
    ) -> Result<usize, SendError<Arc<ServerEvent>>> {
        if let Some(entry) = self.channels.get(room_id) {
            match entry.send(event.clone()) {
                Ok(receivers) => {
                    info!(receivers, "Event broadcast to room");
                    Ok(receivers)
                }
                Err(e) => {
                    warn!("No active receivers, removing room channel");
                    drop(entry); // release the map guard before removing
                    // A subscriber may have arrived since the failed send;
                    // only drop the channel while it is still unobserved.
                    self.channels
                        .remove_if(room_id, |_, sender| sender.receiver_count() == 0);
                    Err(e)
                }
            }
        } else {
            warn!("Send to a room with no channel");
            Err(SendError(event))
        }
    }

    pub fn active_rooms(&self) -> usize {
        self.channels.len()
    }
}
