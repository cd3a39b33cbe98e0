//! Per-room session state for broadcast and late-joiner resync.

use crate::protocol::SessionSnapshot;
use dashmap::DashMap;

/// Maps room identifiers to the state a reconnecting client should be
/// brought up to: the dealt session from `start-game`, overwritten by
/// each relayed `play-word` state.
pub struct SessionStore {
    sessions: DashMap<String, SessionSnapshot>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
        }
    }

    /// Store or overwrite the snapshot for a room. Always succeeds.
    pub fn create(&self, room_id: &str, snapshot: SessionSnapshot) {
        self.sessions.insert(room_id.to_string(), snapshot);
    }

    pub fn get(&self, room_id: &str) -> Option<SessionSnapshot> {
        self.sessions.get(room_id).map(|s| s.clone())
    }

    /// Discard a room's snapshot, called when the room itself is deleted.
    pub fn remove(&self, room_id: &str) {
        self.sessions.remove(room_id);
    }
}

impl Default for SessionStore {
    fn default() -> Self {
        Self::new()
    }
}
