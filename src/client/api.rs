//! History API - the HTTP surface the controller consumes

use crate::client::ClientError;
use crate::dtos::MessageDTO;
use crate::room::RoomId;

/// The two REST calls a chat screen makes while initializing. Kept as a
/// trait so tests can substitute a scripted backend.
pub trait HistoryApi {
    async fn history(&self, room_id: &RoomId) -> Result<Vec<MessageDTO>, ClientError>;
    async fn mark_read(&self, room_id: &RoomId, user_id: &str) -> Result<(), ClientError>;
}

/// reqwest-backed implementation against a running chat server.
pub struct HttpApi {
    base_url: String,
    http: reqwest::Client,
}

impl HttpApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http: reqwest::Client::new(),
        }
    }
}

impl HistoryApi for HttpApi {
    async fn history(&self, room_id: &RoomId) -> Result<Vec<MessageDTO>, ClientError> {
        let url = format!("{}/api/messages/{}", self.base_url, room_id);
        let response = self.http.get(&url).send().await?.error_for_status()?;
        Ok(response.json().await?)
    }

    async fn mark_read(&self, room_id: &RoomId, user_id: &str) -> Result<(), ClientError> {
        let url = format!("{}/api/messages/read/{}/{}", self.base_url, room_id, user_id);
        self.http.put(&url).send().await?.error_for_status()?;
        Ok(())
    }
}
