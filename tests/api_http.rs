//! Integration tests for the HTTP surface
//!
//! - history: empty-room path and ordering
//! - read-state: idempotent PUT and unread counts
//! - presence snapshot endpoint
//!
//! `#[sqlx::test]` creates an isolated database per test and applies the
//! migrations from `migrations/`.

mod common;

use common::*;
use mason_chat::RoomId;
use mason_chat::dtos::{MessageDTO, PresenceStatus, SendMessageDTO, StatusDTO, UnreadCountDTO};
use sqlx::SqlitePool;

fn send_dto(room: &RoomId, sender: &str, text: &str) -> SendMessageDTO {
    SendMessageDTO {
        room_id: room.to_string(),
        sender_id: sender.to_string(),
        text: text.to_string(),
        time: "09:15".to_string(),
        temp_id: String::new(),
    }
}

#[sqlx::test]
async fn health_check(pool: SqlitePool) -> sqlx::Result<()> {
    let server = create_test_server(create_test_state(pool));
    let response = server.get("/").await;
    response.assert_status_ok();
    Ok(())
}

#[sqlx::test]
async fn history_of_fresh_room_is_empty_not_an_error(pool: SqlitePool) -> sqlx::Result<()> {
    let server = create_test_server(create_test_state(pool));

    let response = server.get("/api/messages/U1_U2").await;
    response.assert_status_ok();
    let messages: Vec<MessageDTO> = response.json();
    assert!(messages.is_empty());
    Ok(())
}

#[sqlx::test]
async fn history_returns_messages_in_creation_order(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let room = RoomId::for_pair("U1", "U2");

    state.messages.append(&send_dto(&room, "U1", "Hello")).await?;
    state.messages.append(&send_dto(&room, "U2", "Hi back")).await?;

    let server = create_test_server(state);
    let response = server.get("/api/messages/U1_U2").await;
    response.assert_status_ok();

    let messages: Vec<MessageDTO> = response.json();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender_id, "U1");
    assert_eq!(messages[0].text, "Hello");
    assert_eq!(messages[1].sender_id, "U2");
    assert!(messages.iter().all(|m| m.message_id.is_some()));
    assert!(messages[0].created_at <= messages[1].created_at);
    Ok(())
}

#[sqlx::test]
async fn mark_read_is_idempotent_over_http(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let room = RoomId::for_pair("U1", "U2");
    state.messages.append(&send_dto(&room, "U2", "unread me")).await?;

    let server = create_test_server(state);

    let unread: UnreadCountDTO = server.get("/api/messages/unread/U1_U2/U1").await.json();
    assert_eq!(unread.count, 1);

    server.put("/api/messages/read/U1_U2/U1").await.assert_status(axum::http::StatusCode::NO_CONTENT);
    server.put("/api/messages/read/U1_U2/U1").await.assert_status(axum::http::StatusCode::NO_CONTENT);

    let unread: UnreadCountDTO = server.get("/api/messages/unread/U1_U2/U1").await.json();
    assert_eq!(unread.count, 0);

    // The peer's copy is now flagged read in history.
    let messages: Vec<MessageDTO> = server.get("/api/messages/U1_U2").await.json();
    assert!(messages[0].read);
    Ok(())
}

#[sqlx::test]
async fn mark_read_on_empty_room_succeeds(pool: SqlitePool) -> sqlx::Result<()> {
    let server = create_test_server(create_test_state(pool));
    server
        .put("/api/messages/read/U1_U2/U1")
        .await
        .assert_status(axum::http::StatusCode::NO_CONTENT);
    Ok(())
}

#[sqlx::test]
async fn status_endpoint_reflects_presence(pool: SqlitePool) -> sqlx::Result<()> {
    let state = create_test_state(pool);
    let server = create_test_server(state.clone());

    let status: StatusDTO = server.get("/api/status/U2").await.json();
    assert_eq!(status.status, PresenceStatus::Offline);

    state.presence.set_online("U2");
    let status: StatusDTO = server.get("/api/status/U2").await.json();
    assert_eq!(status.status, PresenceStatus::Online);

    state.presence.set_offline("U2");
    let status: StatusDTO = server.get("/api/status/U2").await.json();
    assert_eq!(status.status, PresenceStatus::Offline);
    Ok(())
}
