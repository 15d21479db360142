//! Room addressing - deterministic identifiers for two-party conversations
//!
//! A room is not a stored entity: its identifier is derived from the two
//! participant identities, so both sides compute the same value without a
//! server round-trip and history can be addressed before the first message
//! is ever sent.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Separator between the two participant identities inside a room id.
/// Identities are assumed not to contain it.
pub const ROOM_SEPARATOR: char = '_';

/// Canonical identifier of a two-party conversation.
///
/// Built by trimming the two identities, sorting them lexicographically and
/// joining with [`ROOM_SEPARATOR`]. Commutative by construction:
/// `RoomId::for_pair(a, b) == RoomId::for_pair(b, a)`.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct RoomId(String);

impl RoomId {
    /// Derive the canonical room id for an unordered pair of participants.
    ///
    /// Surrounding whitespace is trimmed before sorting; case is preserved,
    /// since identities are expected to arrive already canonicalized.
    pub fn for_pair(a: &str, b: &str) -> Self {
        let a = a.trim();
        let b = b.trim();
        if a <= b {
            RoomId(format!("{a}{ROOM_SEPARATOR}{b}"))
        } else {
            RoomId(format!("{b}{ROOM_SEPARATOR}{a}"))
        }
    }

    /// Wrap an already-derived room id, e.g. one taken from a URL path.
    pub fn from_raw(raw: impl Into<String>) -> Self {
        RoomId(raw.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The two participant identities, in stored (sorted) order.
    pub fn participants(&self) -> Option<(&str, &str)> {
        self.0.split_once(ROOM_SEPARATOR)
    }

    /// Whether `user_id` is one of the two participants.
    pub fn includes(&self, user_id: &str) -> bool {
        match self.participants() {
            Some((a, b)) => a == user_id || b == user_id,
            None => false,
        }
    }

    /// The other participant of the conversation, if `user_id` is a member.
    pub fn peer_of(&self, user_id: &str) -> Option<&str> {
        let (a, b) = self.participants()?;
        if a == user_id {
            Some(b)
        } else if b == user_id {
            Some(a)
        } else {
            None
        }
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_is_commutative() {
        assert_eq!(RoomId::for_pair("U1", "U2"), RoomId::for_pair("U2", "U1"));
        assert_eq!(RoomId::for_pair("alice", "bob").as_str(), "alice_bob");
        assert_eq!(RoomId::for_pair("bob", "alice").as_str(), "alice_bob");
    }

    #[test]
    fn distinct_pairs_get_distinct_ids() {
        let ids = [
            RoomId::for_pair("U1", "U2"),
            RoomId::for_pair("U1", "U3"),
            RoomId::for_pair("U2", "U3"),
        ];
        assert_ne!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);
        assert_ne!(ids[1], ids[2]);
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        assert_eq!(RoomId::for_pair(" U1 ", "U2"), RoomId::for_pair("U1", "U2"));
    }

    #[test]
    fn participants_round_trip() {
        let room = RoomId::for_pair("U2", "U1");
        assert_eq!(room.participants(), Some(("U1", "U2")));
        assert!(room.includes("U1"));
        assert!(room.includes("U2"));
        assert!(!room.includes("U3"));
        assert_eq!(room.peer_of("U1"), Some("U2"));
        assert_eq!(room.peer_of("U2"), Some("U1"));
        assert_eq!(room.peer_of("U3"), None);
    }
}
