//! Repositories module - database access for the chat subsystem
//!
//! One repository per persisted concern. Queries use the runtime sqlx API
//! with `FromRow` so the crate builds without a live database; history reads
//! go through the `(room_id, created_at)` index.

pub mod message;
pub mod read_state;

pub use message::MessageRepository;
pub use read_state::ReadStateRepository;
