//! Channel link - bridges a live WebSocket to the controller's event channels
//!
//! The controller never touches the socket directly: it owns the sending
//! half and the receiving half of a `Link`, so its teardown ordering
//! (listeners first, transport second) is expressible by dropping the two
//! halves independently.

use crate::client::ClientError;
use crate::dtos::{ClientEvent, ServerEvent};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;

/// One connection's worth of channel endpoints, owned by a single screen.
pub struct Link {
    pub outgoing: UnboundedSender<ClientEvent>,
    pub incoming: UnboundedReceiver<ServerEvent>,
}

impl Link {
    /// An in-process link for tests: the far ends of both channels are
    /// returned alongside.
    pub fn in_process() -> (Self, UnboundedSender<ServerEvent>, UnboundedReceiver<ClientEvent>) {
        let (out_tx, out_rx) = unbounded_channel();
        let (in_tx, in_rx) = unbounded_channel();
        (
            Link {
                outgoing: out_tx,
                incoming: in_rx,
            },
            in_tx,
            out_rx,
        )
    }
}

/// Connect to `ws://host:port/ws?user_id=...` and pump frames between the
/// socket and a fresh [`Link`].
pub async fn connect_ws(url: &str) -> Result<Link, ClientError> {
    let (socket, _) = tokio_tungstenite::connect_async(url).await?;
    let (mut sink, mut stream) = socket.split();

    let (out_tx, mut out_rx) = unbounded_channel::<ClientEvent>();
    let (in_tx, in_rx) = unbounded_channel::<ServerEvent>();

    tokio::spawn(async move {
        while let Some(event) = out_rx.recv().await {
            let json = match serde_json::to_string(&event) {
                Ok(json) => json,
                Err(e) => {
                    warn!("Failed to serialize client event: {:?}", e);
                    continue;
                }
            };
            if sink.send(Message::Text(json.into())).await.is_err() {
                break;
            }
        }
        let _ = sink.close().await;
    });

    tokio::spawn(async move {
        while let Some(Ok(frame)) = stream.next().await {
            if let Message::Text(text) = frame {
                match serde_json::from_str::<ServerEvent>(&text) {
                    Ok(event) => {
                        if in_tx.send(event).is_err() {
                            break; // screen detached its listeners
                        }
                    }
                    Err(e) => warn!("Failed to decode server event: {:?}", e),
                }
            }
        }
    });

    Ok(Link {
        outgoing: out_tx,
        incoming: in_rx,
    })
}
