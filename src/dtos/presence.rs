//! Presence DTOs

use serde::{Deserialize, Serialize};

/// Best-effort liveness signal per identity. Not persisted; lost on restart.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PresenceStatus {
    Online,
    Offline,
}

/// Body of `GET /api/status/{user_id}`.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct StatusDTO {
    pub status: PresenceStatus,
}
