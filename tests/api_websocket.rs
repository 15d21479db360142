//! Integration tests for the delivery channel, over real sockets
//!
//! Two tokio-tungstenite clients against a server on an OS-assigned port:
//! - join handshake: snapshot status_update then room_joined
//! - message fan-out to the peer, never echoed to the sender
//! - persistence-before-fan-out (history agrees with what was delivered)
//! - rejected sends reach only the sender, and are not persisted
//! - presence flip on abrupt disconnect

mod common;

use common::*;
use futures_util::{SinkExt, StreamExt};
use mason_chat::RoomId;
use mason_chat::dtos::{ClientEvent, PresenceStatus, SendMessageDTO, ServerEvent};
use sqlx::SqlitePool;
use std::net::SocketAddr;
use tokio::net::TcpStream;
use tokio::time::{Duration, timeout};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn connect(addr: SocketAddr, user_id: &str) -> WsClient {
    let url = format!("ws://{addr}/ws?user_id={user_id}");
    let (socket, _) = connect_async(&url).await.expect("ws connect failed");
    socket
}

async fn send(ws: &mut WsClient, event: &ClientEvent) {
    let json = serde_json::to_string(event).expect("serialize client event");
    ws.send(Message::Text(json.into())).await.expect("ws send failed");
}

async fn recv(ws: &mut WsClient) -> ServerEvent {
    loop {
        let frame = timeout(Duration::from_secs(2), ws.next())
            .await
            .expect("timed out waiting for server event")
            .expect("socket closed")
            .expect("socket error");
        if let Message::Text(text) = frame {
            return serde_json::from_str(&text).expect("decode server event");
        }
    }
}

async fn assert_silent(ws: &mut WsClient) {
    let result = timeout(Duration::from_millis(300), ws.next()).await;
    assert!(result.is_err(), "expected no event, got {result:?}");
}

/// join_room + user_online, consuming the handshake events.
async fn join(ws: &mut WsClient, user_id: &str, room: &RoomId) -> PresenceStatus {
    send(
        ws,
        &ClientEvent::JoinRoom {
            room_id: room.to_string(),
        },
    )
    .await;
    send(
        ws,
        &ClientEvent::UserOnline {
            user_id: user_id.to_string(),
        },
    )
    .await;

    let ServerEvent::StatusUpdate { status, .. } = recv(ws).await else {
        panic!("expected peer status snapshot first");
    };
    let ServerEvent::RoomJoined { room_id } = recv(ws).await else {
        panic!("expected room_joined ack");
    };
    assert_eq!(room_id, room.to_string());
    status
}

fn hello_dto(room: &RoomId, sender: &str, text: &str, temp_id: &str) -> SendMessageDTO {
    SendMessageDTO {
        room_id: room.to_string(),
        sender_id: sender.to_string(),
        text: text.to_string(),
        time: "10:42".to_string(),
        temp_id: temp_id.to_string(),
    }
}

#[sqlx::test]
async fn message_reaches_peer_but_never_echoes_to_sender(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let addr = spawn_server(state.clone()).await;
    let room = RoomId::for_pair("U1", "U2");

    let mut u1 = connect(addr, "U1").await;
    let peer_status = join(&mut u1, "U1", &room).await;
    assert_eq!(peer_status, PresenceStatus::Offline);

    let mut u2 = connect(addr, "U2").await;
    join(&mut u2, "U2", &room).await;

    // U1 watches U2, so U2's online announcement arrives as a push.
    let ServerEvent::StatusUpdate { user_id, status } = recv(&mut u1).await else {
        panic!("expected status push for the peer");
    };
    assert_eq!(user_id, "U2");
    assert_eq!(status, PresenceStatus::Online);

    send(
        &mut u1,
        &ClientEvent::SendMessage(hello_dto(&room, "U1", "Are you there?", "T1")),
    )
    .await;

    let ServerEvent::ReceiveMessage(msg) = recv(&mut u2).await else {
        panic!("expected receive_message on the peer connection");
    };
    assert_eq!(msg.sender_id, "U1");
    assert_eq!(msg.text, "Are you there?");
    assert_eq!(msg.temp_id, "T1");
    assert!(msg.message_id.is_some());

    // The sender's connection stays silent: no self-delivery.
    assert_silent(&mut u1).await;

    // Fan-out happened only after the durable append.
    let history = state.messages.history(&room).await?;
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].message_id, msg.message_id.unwrap());
    Ok(())
}

#[sqlx::test]
async fn rejected_send_reports_to_sender_only_and_persists_nothing(
    pool: SqlitePool,
) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let addr = spawn_server(state.clone()).await;
    let room = RoomId::for_pair("U1", "U2");

    let mut u1 = connect(addr, "U1").await;
    join(&mut u1, "U1", &room).await;
    let mut u2 = connect(addr, "U2").await;
    join(&mut u2, "U2", &room).await;
    let _ = recv(&mut u1).await; // U2's online push

    // Empty text fails validation.
    send(
        &mut u1,
        &ClientEvent::SendMessage(hello_dto(&room, "U1", "", "T-bad")),
    )
    .await;

    let ServerEvent::SendError { temp_id, .. } = recv(&mut u1).await else {
        panic!("expected send_error on the sender connection");
    };
    assert_eq!(temp_id, "T-bad");

    assert_silent(&mut u2).await;
    assert!(state.messages.history(&room).await?.is_empty());
    Ok(())
}

#[sqlx::test]
async fn joining_a_foreign_room_is_rejected(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let addr = spawn_server(state).await;

    let mut u3 = connect(addr, "U3").await;
    send(
        &mut u3,
        &ClientEvent::JoinRoom {
            room_id: "U1_U2".to_string(),
        },
    )
    .await;

    let ServerEvent::Error { code, .. } = recv(&mut u3).await else {
        panic!("expected error event");
    };
    assert_eq!(code, 403);
    Ok(())
}

#[sqlx::test]
async fn connecting_alone_marks_the_user_online(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let addr = spawn_server(state.clone()).await;

    // No join, no announcement: the open socket is the liveness signal.
    let silent = connect(addr, "U5").await;
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert!(state.presence.is_online("U5"));

    drop(silent);
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(!state.presence.is_online("U5"));
    Ok(())
}

#[sqlx::test]
async fn abrupt_disconnect_flips_presence_and_notifies_watcher(
    pool: SqlitePool,
) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let addr = spawn_server(state.clone()).await;
    let room = RoomId::for_pair("U1", "U2");

    let mut u1 = connect(addr, "U1").await;
    join(&mut u1, "U1", &room).await;

    let mut u2 = connect(addr, "U2").await;
    join(&mut u2, "U2", &room).await;
    let _ = recv(&mut u1).await; // U2 online push

    // U2 closes the app: no user_offline announcement, just a dead socket.
    drop(u2);

    let ServerEvent::StatusUpdate { user_id, status } = recv(&mut u1).await else {
        panic!("expected offline push");
    };
    assert_eq!(user_id, "U2");
    assert_eq!(status, PresenceStatus::Offline);
    assert!(!state.presence.is_online("U2"));
    Ok(())
}

#[sqlx::test]
async fn both_room_members_observe_the_same_message_order(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let addr = spawn_server(state).await;
    let room = RoomId::for_pair("U1", "U2");

    let mut u1 = connect(addr, "U1").await;
    join(&mut u1, "U1", &room).await;
    let mut u2 = connect(addr, "U2").await;
    join(&mut u2, "U2", &room).await;
    let _ = recv(&mut u1).await; // U2 online push

    for (text, temp) in [("one", "Ta"), ("two", "Tb"), ("three", "Tc")] {
        send(
            &mut u1,
            &ClientEvent::SendMessage(hello_dto(&room, "U1", text, temp)),
        )
        .await;
    }

    let mut seen = Vec::new();
    for _ in 0..3 {
        let ServerEvent::ReceiveMessage(msg) = recv(&mut u2).await else {
            panic!("expected receive_message");
        };
        seen.push(msg.text);
    }
    assert_eq!(seen, ["one", "two", "three"]);
    Ok(())
}
