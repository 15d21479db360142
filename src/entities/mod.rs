//! Entities module - records persisted by the message store
//!
//! Each entity corresponds to a table created by the migrations.

pub mod message;
pub mod read_state;

pub use message::StoredMessage;
pub use read_state::ReadMarker;
