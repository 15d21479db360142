//! Client module - the chat screen controller and its transports
//!
//! This is the counterpart of the server side of the channel: the per-screen
//! state machine that fetches history, joins the room, renders the merged
//! history + live stream, and reconciles optimistic sends. Transports are
//! pluggable: `HttpApi`/`connect_ws` talk to a real server, while tests drive
//! the controller through plain channels.

pub mod api;
pub mod controller;
pub mod error;
pub mod link;

pub use api::{HistoryApi, HttpApi};
pub use controller::{ChatScreen, Delivery, LocalMessage, ScreenState};
pub use error::ClientError;
pub use link::{Link, connect_ws};
