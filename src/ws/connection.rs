//! WebSocket connection management
//!
//! Each accepted socket is split into a listener task (inbound client events)
//! and a writer task (room fan-out plus connection-directed signals). The two
//! halves are tied together by an unbounded internal channel owned by this
//! connection alone; nothing here is shared across screen instances.

use crate::ws::{IDLE_TIMEOUT_SECONDS, RATE_LIMITER_MILLIS};
use crate::{
    core::AppState,
    dtos::{ClientEvent, ServerEvent},
    room::RoomId,
    ws::{connmap::InternalSignal, events},
};
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::time::{Duration, interval, timeout};
use tokio_stream::StreamMap;
use tokio_stream::wrappers::BroadcastStream;
use tracing::{error, info, instrument, warn};

#[instrument(skip(ws, state), fields(user_id = %user_id))]
pub async fn handle_socket(ws: WebSocket, state: Arc<AppState>, user_id: String) {
    info!("WebSocket connection established");

    let (ws_tx, ws_rx) = ws.split();

    // Internal channel tying the two halves of this connection together.
    let (int_tx, int_rx) = unbounded_channel::<InternalSignal>();

    state.connections.register(user_id.clone(), int_tx.clone());

    // A connected client is online from the first frame, not from its
    // explicit announcement; the announcement then changes nothing.
    events::announce_online(&state, &user_id);

    tokio::spawn(listen_ws(user_id.clone(), ws_rx, int_tx, state.clone()));
    tokio::spawn(write_ws(user_id, ws_tx, int_rx, state));
}

/// Writer half: forwards room fan-out and connection-directed signals to the
/// socket. Events a connection broadcast itself are skipped here, so a sender
/// never receives the echo of its own message.
#[instrument(skip(websocket_tx, internal_rx, state), fields(user_id = %user_id))]
pub async fn write_ws(
    user_id: String,
    mut websocket_tx: SplitSink<WebSocket, Message>,
    mut internal_rx: UnboundedReceiver<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Write task started");

    let mut stream_map: StreamMap<RoomId, BroadcastStream<Arc<ServerEvent>>> = StreamMap::new();

    'external: loop {
        tokio::select! {
            Some((room_id, result)) = tokio_stream::StreamExt::next(&mut stream_map) => {
                match result {
                    Ok(event) => {
                        if is_own_broadcast(&event, &user_id) {
                            continue;
                        }
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            warn!("Failed to forward room event, closing connection");
                            break 'external;
                        }
                    }
                    Err(e) => {
                        // Lagged behind the room channel; the client recovers
                        // by re-fetching history.
                        warn!(room_id = %room_id, "Room subscription lagged: {:?}", e);
                    }
                }
            }

            signal = internal_rx.recv() => {
                match signal {
                    Some(InternalSignal::Shutdown) => {
                        info!("Shutdown signal received");
                        break 'external;
                    }
                    Some(InternalSignal::Subscribe(room_id)) => {
                        info!(room_id = %room_id, "Adding room subscription");
                        let rx = state.rooms.subscribe(&room_id);
                        stream_map.insert(room_id, BroadcastStream::new(rx));
                    }
                    Some(InternalSignal::Event(event)) => {
                        if send_event(&mut websocket_tx, &event).await.is_err() {
                            warn!("Failed to send event, closing connection");
                            break 'external;
                        }
                    }
                    None => {
                        info!("Internal channel closed");
                        break 'external;
                    }
                }
            }
        }
    }

    let _ = websocket_tx.close().await;
    info!("Write task terminated");
}

fn is_own_broadcast(event: &ServerEvent, user_id: &str) -> bool {
    matches!(event, ServerEvent::ReceiveMessage(msg) if msg.sender_id == user_id)
}

async fn send_event(
    websocket_tx: &mut SplitSink<WebSocket, Message>,
    event: &ServerEvent,
) -> Result<(), axum::Error> {
    let json = serde_json::to_string(event).map_err(|e| {
        error!("Failed to serialize event: {:?}", e);
        axum::Error::new(e)
    })?;
    websocket_tx.send(Message::Text(Utf8Bytes::from(json))).await
}

/// Listener half: decodes inbound client events and dispatches them. Any exit
/// path - clean close, transport error, idle timeout - flips presence to
/// offline and shuts the writer down.
#[instrument(skip(websocket_rx, internal_tx, state), fields(user_id = %user_id))]
pub async fn listen_ws(
    user_id: String,
    mut websocket_rx: SplitStream<WebSocket>,
    internal_tx: UnboundedSender<InternalSignal>,
    state: Arc<AppState>,
) {
    info!("Listen task started");

    let mut rate_limiter = interval(Duration::from_millis(RATE_LIMITER_MILLIS));
    let timeout_duration = Duration::from_secs(IDLE_TIMEOUT_SECONDS);

    loop {
        match timeout(timeout_duration, websocket_rx.next()).await {
            Ok(Some(msg_result)) => {
                rate_limiter.tick().await;

                let msg = match msg_result {
                    Ok(m) => m,
                    Err(e) => {
                        warn!("WebSocket error: {:?}", e);
                        break;
                    }
                };

                match msg {
                    Message::Text(text) => match serde_json::from_str::<ClientEvent>(&text) {
                        Ok(event) => {
                            events::process_event(&state, &user_id, &internal_tx, event).await;
                        }
                        Err(_) => {
                            warn!("Failed to deserialize client event");
                            let _ = internal_tx.send(InternalSignal::Event(ServerEvent::Error {
                                code: 400,
                                message: "malformed event".to_string(),
                            }));
                        }
                    },
                    Message::Close(_) => {
                        info!("Close frame received");
                        break;
                    }
                    _ => {}
                }
            }
            Ok(None) => {
                info!("WebSocket stream ended");
                break;
            }
            Err(_) => {
                warn!(timeout_secs = IDLE_TIMEOUT_SECONDS, "Connection idle timeout");
                break;
            }
        }
    }

    // Cleanup. An unannounced disconnect is an implicit offline, effective
    // immediately; a reconnect simply re-announces online.
    info!("Cleaning up connection");
    events::announce_offline(&state, &user_id);
    state.presence.unwatch_all(&user_id);
    let _ = internal_tx.send(InternalSignal::Shutdown);
    state.connections.remove_matching(&user_id, &internal_tx);
    info!("Listen task terminated");
}
