//! Client-side error taxonomy

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Identity could not be resolved; the screen never leaves Initializing.
    #[error("not logged in")]
    NotLoggedIn,

    #[error("history request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("channel connection closed")]
    ChannelClosed,

    /// The channel is down or degraded; the optimistic copy stays local with
    /// a retry affordance.
    #[error("live send unavailable")]
    SendUnavailable,

    #[error("websocket failure: {0}")]
    Ws(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("malformed server event: {0}")]
    Codec(#[from] serde_json::Error),
}
