//! WebSocket event handlers
//!
//! Dispatches decoded client events against the state. Replies destined for
//! the originating connection go through its internal channel; room-wide
//! traffic goes through the room's broadcast channel.

use crate::core::AppState;
use crate::dtos::{ClientEvent, MessageDTO, PresenceStatus, SendMessageDTO, ServerEvent};
use crate::room::RoomId;
use crate::ws::connmap::InternalSignal;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use tracing::{info, instrument, warn};

#[instrument(skip(state, reply, event), fields(user_id = %user_id))]
pub async fn process_event(
    state: &Arc<AppState>,
    user_id: &str,
    reply: &UnboundedSender<InternalSignal>,
    event: ClientEvent,
) {
    match event {
        ClientEvent::JoinRoom { room_id } => {
            join_room(state, user_id, reply, RoomId::from_raw(room_id));
        }
        ClientEvent::UserOnline { user_id: announced } => {
            if announced != user_id {
                warn!(announced = %announced, "Online announcement for another identity ignored");
                return;
            }
            announce_online(state, user_id);
        }
        ClientEvent::UserOffline { user_id: announced } => {
            if announced != user_id {
                warn!(announced = %announced, "Offline announcement for another identity ignored");
                return;
            }
            announce_offline(state, user_id);
        }
        ClientEvent::SendMessage(dto) => {
            send_message(state, user_id, reply, dto).await;
        }
    }
}

/// Subscribe the connection to a room's fan-out, register interest in the
/// peer's presence, and acknowledge. The subscription signal is queued before
/// the ack, so a client that has seen `room_joined` is guaranteed to receive
/// every later broadcast.
fn join_room(
    state: &Arc<AppState>,
    user_id: &str,
    reply: &UnboundedSender<InternalSignal>,
    room_id: RoomId,
) {
    if !room_id.includes(user_id) {
        warn!(room_id = %room_id, "Join rejected: user is not a participant");
        let _ = reply.send(InternalSignal::Event(ServerEvent::Error {
            code: 403,
            message: "not a participant of this room".to_string(),
        }));
        return;
    }

    let _ = reply.send(InternalSignal::Subscribe(room_id.clone()));

    if let Some(peer) = room_id.peer_of(user_id) {
        state.presence.watch(user_id, peer);
        let _ = reply.send(InternalSignal::Event(ServerEvent::StatusUpdate {
            user_id: peer.to_string(),
            status: state.presence.snapshot(peer),
        }));
    }

    let _ = reply.send(InternalSignal::Event(ServerEvent::RoomJoined {
        room_id: room_id.to_string(),
    }));
    info!(room_id = %room_id, "Room joined");
}

/// Persist a message, then fan it out to the room. Nothing is broadcast
/// unless the append succeeded; a failed send is reported to the sender only,
/// keyed by the client's `temp_id`.
async fn send_message(
    state: &Arc<AppState>,
    user_id: &str,
    reply: &UnboundedSender<InternalSignal>,
    dto: SendMessageDTO,
) {
    use validator::Validate;

    if dto.sender_id != user_id {
        warn!(claimed = %dto.sender_id, "Send rejected: sender does not match connection identity");
        let _ = reply.send(InternalSignal::Event(ServerEvent::SendError {
            temp_id: dto.temp_id,
            reason: "sender does not match connection identity".to_string(),
        }));
        return;
    }

    let room_id = RoomId::from_raw(dto.room_id.clone());
    if !room_id.includes(user_id) {
        warn!(room_id = %room_id, "Send rejected: user is not a participant");
        let _ = reply.send(InternalSignal::Event(ServerEvent::SendError {
            temp_id: dto.temp_id,
            reason: "not a participant of this room".to_string(),
        }));
        return;
    }

    if let Err(e) = dto.validate() {
        warn!("Send rejected: validation failed");
        let _ = reply.send(InternalSignal::Event(ServerEvent::SendError {
            temp_id: dto.temp_id,
            reason: e.to_string(),
        }));
        return;
    }

    match state.messages.append(&dto).await {
        Ok(stored) => {
            info!(message_id = stored.message_id, "Message persisted");
            let event = Arc::new(ServerEvent::ReceiveMessage(MessageDTO::from(stored)));
            if state.rooms.send(&room_id, event).is_err() {
                // No subscriber is listening right now; the message is
                // durable and will be picked up from history.
                info!(room_id = %room_id, "No active subscribers for room");
            }
        }
        Err(e) => {
            warn!("Failed to persist message: {:?}", e);
            let _ = reply.send(InternalSignal::Event(ServerEvent::SendError {
                temp_id: dto.temp_id,
                reason: "message could not be stored".to_string(),
            }));
        }
    }
}

pub fn announce_online(state: &Arc<AppState>, user_id: &str) {
    let watchers = state.presence.set_online(user_id);
    notify_watchers(state, user_id, PresenceStatus::Online, watchers);
}

pub fn announce_offline(state: &Arc<AppState>, user_id: &str) {
    let watchers = state.presence.set_offline(user_id);
    notify_watchers(state, user_id, PresenceStatus::Offline, watchers);
}

fn notify_watchers(
    state: &Arc<AppState>,
    user_id: &str,
    status: PresenceStatus,
    watchers: Vec<String>,
) {
    for watcher in watchers {
        state.connections.send_if_connected(
            &watcher,
            InternalSignal::Event(ServerEvent::StatusUpdate {
                user_id: user_id.to_string(),
                status,
            }),
        );
    }
}
