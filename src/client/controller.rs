//! ChatScreen - the per-screen client controller
//!
//! State machine: Initializing -> Connecting -> Active, with Degraded when
//! the join ack never arrives (history polling still works there) and Closed
//! after teardown. Incoming messages are de-duplicated by server id, then by
//! `temp_id`; a message carrying the screen's own identity as sender is
//! always discarded, because it is the echo of an optimistic entry this
//! screen already rendered.
//!
//! Teardown invariant: event listener teardown must precede transport
//! teardown. `close()` detaches the incoming receiver before the offline
//! announcement and before the sending half drops; an event that arrives
//! after detach is never applied. Reordering these steps reintroduces a
//! double-render on unmount.

use crate::client::api::HistoryApi;
use crate::client::error::ClientError;
use crate::client::link::Link;
use crate::dtos::{ClientEvent, MessageDTO, PresenceStatus, SendMessageDTO, ServerEvent};
use crate::room::RoomId;
use chrono::Utc;
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScreenState {
    Initializing,
    Connecting,
    Active,
    /// Channel never acknowledged the join; live delivery is off and the
    /// screen falls back to polling history.
    Degraded,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Pending,
    Delivered,
    Failed,
}

/// One rendered message bubble.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalMessage {
    pub message_id: Option<i64>,
    pub temp_id: String,
    pub sender_id: String,
    pub text: String,
    pub time: String,
    pub read: bool,
    pub delivery: Delivery,
}

impl From<MessageDTO> for LocalMessage {
    fn from(value: MessageDTO) -> Self {
        Self {
            message_id: value.message_id,
            temp_id: value.temp_id,
            sender_id: value.sender_id,
            text: value.text,
            time: value.time,
            read: value.read,
            delivery: Delivery::Delivered,
        }
    }
}

pub struct ChatScreen {
    self_id: String,
    peer_id: String,
    room_id: RoomId,
    state: ScreenState,
    messages: Vec<LocalMessage>,
    peer_online: bool,
    channel_tx: Option<UnboundedSender<ClientEvent>>,
    events_rx: Option<UnboundedReceiver<ServerEvent>>,
    temp_seq: u64,
}

impl ChatScreen {
    /// Open a screen for a conversation with `peer`. Fails when the own
    /// identity cannot be resolved (not logged in).
    pub fn open(
        identity: Option<String>,
        peer: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let self_id = identity.ok_or(ClientError::NotLoggedIn)?;
        let peer_id = peer.into();
        let room_id = RoomId::for_pair(&self_id, &peer_id);
        Ok(Self {
            self_id,
            peer_id,
            room_id,
            state: ScreenState::Initializing,
            messages: Vec::new(),
            peer_online: false,
            channel_tx: None,
            events_rx: None,
            temp_seq: 0,
        })
    }

    pub fn state(&self) -> ScreenState {
        self.state
    }

    pub fn room_id(&self) -> &RoomId {
        &self.room_id
    }

    pub fn peer_online(&self) -> bool {
        self.peer_online
    }

    pub fn messages(&self) -> &[LocalMessage] {
        &self.messages
    }

    /// Mark the room read and load history, then move to Connecting. The
    /// identity is already resolved at this point; the channel must not be
    /// joined before this completes.
    pub async fn initialize(&mut self, api: &impl HistoryApi) -> Result<(), ClientError> {
        api.mark_read(&self.room_id, &self.self_id).await?;
        let history = api.history(&self.room_id).await?;
        self.reconcile(history);
        self.state = ScreenState::Connecting;
        Ok(())
    }

    /// Take ownership of a channel link, join the room and announce online.
    pub fn attach(&mut self, link: Link) -> Result<(), ClientError> {
        let Link { outgoing, incoming } = link;

        outgoing
            .send(ClientEvent::JoinRoom {
                room_id: self.room_id.to_string(),
            })
            .map_err(|_| ClientError::ChannelClosed)?;
        outgoing
            .send(ClientEvent::UserOnline {
                user_id: self.self_id.clone(),
            })
            .map_err(|_| ClientError::ChannelClosed)?;

        self.channel_tx = Some(outgoing);
        self.events_rx = Some(incoming);
        Ok(())
    }

    /// Wait for the `room_joined` ack, applying whatever else arrives in the
    /// meantime. Times out into Degraded rather than hanging.
    pub async fn await_join(&mut self, wait: Duration) -> ScreenState {
        let deadline = tokio::time::Instant::now() + wait;
        while self.state == ScreenState::Connecting {
            let Some(rx) = self.events_rx.as_mut() else {
                break;
            };
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(event)) => self.apply_event(event),
                Ok(None) | Err(_) => {
                    warn!("Join was not acknowledged, falling back to polling");
                    self.state = ScreenState::Degraded;
                }
            }
        }
        self.state
    }

    /// Optimistically render a new message and push it onto the channel.
    /// The returned `temp_id` identifies the entry until the server echo or
    /// a history re-fetch confirms it.
    pub fn send(&mut self, text: impl Into<String>) -> Result<String, ClientError> {
        let temp_id = self.mint_temp_id();
        let text = text.into();
        let time = Utc::now().format("%H:%M").to_string();

        self.messages.push(LocalMessage {
            message_id: None,
            temp_id: temp_id.clone(),
            sender_id: self.self_id.clone(),
            text: text.clone(),
            time: time.clone(),
            read: false,
            delivery: Delivery::Pending,
        });

        match self.emit_send(&temp_id, &text, &time) {
            Ok(()) => Ok(temp_id),
            Err(e) => {
                self.mark_failed(&temp_id);
                Err(e)
            }
        }
    }

    /// Retry a failed send. Reuses the original `temp_id`, never mints a new
    /// one, so a retried-and-now-succeeded send collapses with the original
    /// optimistic entry.
    pub fn retry(&mut self, temp_id: &str) -> Result<(), ClientError> {
        let Some(local) = self
            .messages
            .iter_mut()
            .find(|m| m.temp_id == temp_id && m.delivery == Delivery::Failed)
        else {
            return Ok(());
        };
        local.delivery = Delivery::Pending;
        let (text, time) = (local.text.clone(), local.time.clone());

        match self.emit_send(temp_id, &text, &time) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.mark_failed(temp_id);
                Err(e)
            }
        }
    }

    /// Apply one server event to the screen.
    pub fn apply_event(&mut self, event: ServerEvent) {
        match event {
            ServerEvent::RoomJoined { .. } => {
                if self.state == ScreenState::Connecting {
                    self.state = ScreenState::Active;
                }
            }
            ServerEvent::StatusUpdate { user_id, status } => {
                if user_id == self.peer_id {
                    self.peer_online = status == PresenceStatus::Online;
                }
            }
            ServerEvent::ReceiveMessage(msg) => {
                if msg.sender_id == self.self_id {
                    // Echo of a message this screen already rendered.
                    debug!("Discarding self-originated echo");
                    return;
                }
                if self.is_duplicate(&msg) {
                    debug!("Discarding duplicate delivery");
                    return;
                }
                self.messages.push(msg.into());
            }
            ServerEvent::SendError { temp_id, reason } => {
                warn!(reason = %reason, "Send failed");
                self.mark_failed(&temp_id);
            }
            ServerEvent::Error { code, message } => {
                warn!(code, message = %message, "Channel error");
            }
        }
    }

    /// Drain and apply every already-delivered event. Returns how many were
    /// applied; a no-op once listeners are detached.
    pub fn poll_events(&mut self) -> usize {
        let mut pending = Vec::new();
        if let Some(rx) = self.events_rx.as_mut() {
            while let Ok(event) = rx.try_recv() {
                pending.push(event);
            }
        }
        let applied = pending.len();
        for event in pending {
            self.apply_event(event);
        }
        applied
    }

    /// Merge a (re-)fetched history into the local list. History order is
    /// authoritative: persisted messages take their history positions, with
    /// local copies (pending optimistic entries matched by `temp_id`,
    /// live-delivered ones matched by `message_id`) moved into place rather
    /// than duplicated. Entries the server has not seen yet stay at the
    /// tail.
    pub fn reconcile(&mut self, history: Vec<MessageDTO>) {
        let mut merged = Vec::with_capacity(history.len() + self.messages.len());
        for msg in history {
            let existing = self.messages.iter().position(|m| {
                (msg.message_id.is_some() && m.message_id == msg.message_id)
                    || (!msg.temp_id.is_empty() && m.temp_id == msg.temp_id)
            });
            match existing {
                Some(pos) => {
                    let mut local = self.messages.remove(pos);
                    local.message_id = msg.message_id;
                    local.read = msg.read;
                    local.delivery = Delivery::Delivered;
                    merged.push(local);
                }
                None => merged.push(msg.into()),
            }
        }
        merged.append(&mut self.messages);
        self.messages = merged;
    }

    /// Tear the screen down. Listener teardown strictly precedes transport
    /// teardown.
    pub fn close(&mut self) {
        self.detach_listeners();
        self.disconnect();
        self.state = ScreenState::Closed;
    }

    /// Stop consuming incoming events. After this, a message already in
    /// flight on the channel can no longer trigger a state update.
    pub fn detach_listeners(&mut self) {
        self.events_rx = None;
    }

    fn disconnect(&mut self) {
        if let Some(tx) = self.channel_tx.take() {
            let _ = tx.send(ClientEvent::UserOffline {
                user_id: self.self_id.clone(),
            });
            // tx drops here; the link closes the socket behind it.
        }
    }

    fn emit_send(&mut self, temp_id: &str, text: &str, time: &str) -> Result<(), ClientError> {
        if self.state == ScreenState::Degraded {
            return Err(ClientError::SendUnavailable);
        }
        let tx = self
            .channel_tx
            .as_ref()
            .ok_or(ClientError::ChannelClosed)?;
        tx.send(ClientEvent::SendMessage(SendMessageDTO {
            room_id: self.room_id.to_string(),
            sender_id: self.self_id.clone(),
            text: text.to_string(),
            time: time.to_string(),
            temp_id: temp_id.to_string(),
        }))
        .map_err(|_| ClientError::ChannelClosed)
    }

    fn mark_failed(&mut self, temp_id: &str) {
        if let Some(local) = self.messages.iter_mut().find(|m| m.temp_id == temp_id) {
            local.delivery = Delivery::Failed;
        }
    }

    fn is_duplicate(&self, msg: &MessageDTO) -> bool {
        self.messages.iter().any(|m| {
            (msg.message_id.is_some() && m.message_id == msg.message_id)
                || (!msg.temp_id.is_empty() && m.temp_id == msg.temp_id)
        })
    }

    /// High-resolution timestamp string plus a per-screen sequence number.
    fn mint_temp_id(&mut self) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or_default();
        self.temp_seq += 1;
        format!("{nanos}-{}", self.temp_seq)
    }
}
