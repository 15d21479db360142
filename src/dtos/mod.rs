//! DTOs module - Data Transfer Objects
//!
//! DTOs separate the external representation (HTTP and WebSocket payloads)
//! from the internal representation (entities).

pub mod event;
pub mod message;
pub mod presence;

pub use event::{ClientEvent, ServerEvent};
pub use message::{MessageDTO, SendMessageDTO, UnreadCountDTO};
pub use presence::{PresenceStatus, StatusDTO};
