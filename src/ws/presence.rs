//! PresenceTracker - process-wide online/offline map with an interest registry
//!
//! Presence is a liveness signal, not durable state: the map lives in memory
//! and is lost on restart. Alongside the status map, the tracker keeps a
//! registry of who is watching whom (a chat screen open with a peer registers
//! interest in that peer), so status changes can be pushed instead of polled.
//!
//! Status changes return the watcher set; the connection layer delivers the
//! `status_update` events, keeping this type free of I/O.

use crate::dtos::PresenceStatus;
use dashmap::DashMap;
use std::collections::HashSet;
use tracing::{info, instrument};

pub struct PresenceTracker {
    statuses: DashMap<String, PresenceStatus>,
    /// watched identity -> identities to notify on its status changes
    watchers: DashMap<String, HashSet<String>>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        PresenceTracker {
            statuses: DashMap::new(),
            watchers: DashMap::new(),
        }
    }

    /// Mark a user online. Returns the watchers to notify, empty when the
    /// user was already online; re-announcing an unchanged status pushes
    /// nothing.
    #[instrument(skip(self), fields(user_id))]
    pub fn set_online(&self, user_id: &str) -> Vec<String> {
        let previous = self
            .statuses
            .insert(user_id.to_string(), PresenceStatus::Online);
        if previous == Some(PresenceStatus::Online) {
            return Vec::new();
        }
        info!("User marked online");
        self.watchers_of(user_id)
    }

    /// Mark a user offline, whether announced or from an abrupt disconnect.
    /// Returns the watchers to notify, empty when the user already read as
    /// offline (unknown users implicitly do).
    #[instrument(skip(self), fields(user_id))]
    pub fn set_offline(&self, user_id: &str) -> Vec<String> {
        let previous = self
            .statuses
            .insert(user_id.to_string(), PresenceStatus::Offline);
        if previous.unwrap_or(PresenceStatus::Offline) == PresenceStatus::Offline {
            return Vec::new();
        }
        info!("User marked offline");
        self.watchers_of(user_id)
    }

    /// Point-in-time query; inherently racy, best-effort only.
    /// Unknown users are implicitly offline.
    pub fn is_online(&self, user_id: &str) -> bool {
        self.snapshot(user_id) == PresenceStatus::Online
    }

    pub fn snapshot(&self, user_id: &str) -> PresenceStatus {
        self.statuses
            .get(user_id)
            .map(|entry| *entry.value())
            .unwrap_or(PresenceStatus::Offline)
    }

    /// Record that `watcher` wants status updates about `watched`.
    #[instrument(skip(self), fields(watcher, watched))]
    pub fn watch(&self, watcher: &str, watched: &str) {
        self.watchers
            .entry(watched.to_string())
            .or_default()
            .insert(watcher.to_string());
    }

    /// Drop every interest registered by `watcher`, called on disconnect.
    #[instrument(skip(self), fields(watcher))]
    pub fn unwatch_all(&self, watcher: &str) {
        self.watchers.retain(|_, set| {
            set.remove(watcher);
            !set.is_empty()
        });
    }

    fn watchers_of(&self, user_id: &str) -> Vec<String> {
        self.watchers
            .get(user_id)
            .map(|entry| entry.value().iter().cloned().collect())
            .unwrap_or_default()
    }
}
