#![allow(dead_code)]

use axum_test::TestServer;
use mason_chat::core::AppState;
use sqlx::SqlitePool;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;

/// Create an AppState for tests.
pub fn create_test_state(pool: SqlitePool) -> Arc<AppState> {
    Arc::new(AppState::new(pool))
}

/// Create a TestServer for HTTP-level tests.
pub fn create_test_server(state: Arc<AppState>) -> TestServer {
    let app = mason_chat::create_router(state);
    TestServer::new(app).expect("Failed to create test server")
}

/// Serve the app on an OS-assigned port for tests that need a real socket
/// (WebSocket clients, reqwest). The server task lives for the whole test.
pub async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
    let app = mason_chat::create_router(state);
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test listener");
    let addr = listener.local_addr().expect("listener has no local addr");
    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("test server failed");
    });
    addr
}
