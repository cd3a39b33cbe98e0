//! Participant and room membership tracking.

use crate::protocol::PlayerInfo;
use dashmap::DashMap;
use thiserror::Error;
use uuid::Uuid;
use wordrack_core::Seat;

/// Default seats per room. Strict two-player capacity is enforced on the
/// join path.
pub const ROOM_CAPACITY: usize = 2;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RoomError {
    #[error("Game not found")]
    RoomNotFound,

    #[error("Host not found")]
    HostMissing,

    #[error("Game is full")]
    RoomFull,
}

/// Connect-time identity fields. Untrusted context from the client.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Identity {
    pub user_id: Option<String>,
    pub username: String,
    pub is_guest: bool,
    pub tab_id: Option<String>,
}

/// One connected player or spectator attempt.
///
/// Created on connection establishment, role fields mutated as the
/// participant creates/joins/syncs, removed on disconnect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    pub connection_id: Uuid,
    pub identity: Identity,
    /// 1 or 2 once seated, None until then
    pub player_number: Option<u8>,
    pub is_host: bool,
    pub room_id: Option<String>,
}

impl Participant {
    /// A participant that has connected but not yet identified or joined.
    pub fn anonymous(connection_id: Uuid) -> Self {
        Self {
            connection_id,
            identity: Identity {
                is_guest: true,
                ..Identity::default()
            },
            player_number: None,
            is_host: false,
            room_id: None,
        }
    }

    pub fn to_info(&self) -> PlayerInfo {
        PlayerInfo {
            id: self.connection_id,
            username: self.identity.username.clone(),
            is_guest: self.identity.is_guest,
            player_number: self.player_number,
            is_host: self.is_host,
        }
    }

    pub fn to_seat(&self) -> Seat {
        Seat {
            username: self.identity.username.clone(),
            user_id: self.identity.user_id.clone(),
            is_guest: self.identity.is_guest,
            player_number: self.player_number.unwrap_or_default(),
            is_host: self.is_host,
        }
    }
}

/// A room's ordered membership.
#[derive(Debug, Default)]
pub struct Room {
    pub members: Vec<Uuid>,
}

/// What a removal left behind, so the coordinator can notify or clean up.
#[derive(Debug)]
pub struct Departure {
    pub room_id: String,
    pub remaining: Vec<Uuid>,
}

/// Maps connection IDs to participants and room IDs to memberships.
///
/// Room identifiers are caller-supplied opaque strings; rooms exist from
/// the first `open` until their membership empties.
pub struct RoomRegistry {
    participants: DashMap<Uuid, Participant>,
    rooms: DashMap<String, Room>,
    /// None disables capacity enforcement.
    capacity: Option<usize>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::with_capacity(Some(ROOM_CAPACITY))
    }

    pub fn with_capacity(capacity: Option<usize>) -> Self {
        Self {
            participants: DashMap::new(),
            rooms: DashMap::new(),
            capacity,
        }
    }

    /// Add or overwrite the participant record for a connection.
    pub fn register(&self, participant: Participant) {
        self.participants
            .insert(participant.connection_id, participant);
    }

    pub fn get(&self, connection_id: Uuid) -> Option<Participant> {
        self.participants.get(&connection_id).map(|p| p.clone())
    }

    pub fn set_identity(&self, connection_id: Uuid, identity: Identity) {
        if let Some(mut participant) = self.participants.get_mut(&connection_id) {
            participant.identity = identity;
        }
    }

    /// Update a participant's seat within a room.
    pub fn assign(&self, connection_id: Uuid, room_id: &str, player_number: u8, is_host: bool) {
        if let Some(mut participant) = self.participants.get_mut(&connection_id) {
            participant.room_id = Some(room_id.to_string());
            participant.player_number = Some(player_number);
            participant.is_host = is_host;
        }
    }

    /// Current membership of a room, in join order.
    pub fn lookup_room(&self, room_id: &str) -> Option<Vec<Uuid>> {
        self.rooms.get(room_id).map(|r| r.members.clone())
    }

    /// Seat the caller as player 1 / host, creating the room if needed.
    pub fn open(&self, room_id: &str, connection_id: Uuid) {
        let mut room = self.rooms.entry(room_id.to_string()).or_default();
        if !room.members.contains(&connection_id) {
            room.members.push(connection_id);
        }
        drop(room);
        self.assign(connection_id, room_id, 1, true);
    }

    /// Seat the caller as player 2 in an existing hosted room.
    ///
    /// Returns the updated membership on success.
    pub fn join(&self, room_id: &str, connection_id: Uuid) -> Result<Vec<Uuid>, RoomError> {
        let mut room = self.rooms.get_mut(room_id).ok_or(RoomError::RoomNotFound)?;

        let has_host = room.members.iter().any(|id| {
            self.participants
                .get(id)
                .map(|p| p.is_host)
                .unwrap_or(false)
        });
        if !has_host {
            return Err(RoomError::HostMissing);
        }

        if let Some(capacity) = self.capacity {
            if room.members.len() >= capacity && !room.members.contains(&connection_id) {
                return Err(RoomError::RoomFull);
            }
        }

        if !room.members.contains(&connection_id) {
            room.members.push(connection_id);
        }
        let members = room.members.clone();
        drop(room);

        self.assign(connection_id, room_id, 2, false);
        Ok(members)
    }

    /// Delete a participant record; empties and deletes its room if it
    /// was the last member.
    pub fn remove(&self, connection_id: Uuid) -> Option<Departure> {
        let (_, participant) = self.participants.remove(&connection_id)?;
        let room_id = participant.room_id?;

        let mut remaining = Vec::new();
        let mut now_empty = false;
        if let Some(mut room) = self.rooms.get_mut(&room_id) {
            room.members.retain(|id| *id != connection_id);
            remaining = room.members.clone();
            now_empty = remaining.is_empty();
        }
        if now_empty {
            self.rooms.remove(&room_id);
        }

        Some(Departure { room_id, remaining })
    }

    /// Member records for a room, in join order.
    pub fn participants_in(&self, room_id: &str) -> Vec<Participant> {
        self.lookup_room(room_id)
            .map(|members| {
                members
                    .iter()
                    .filter_map(|id| self.participants.get(id).map(|p| p.clone()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Member infos for a room, ready for a `player-joined` broadcast.
    pub fn member_infos(&self, room_id: &str) -> Vec<PlayerInfo> {
        self.participants_in(room_id)
            .iter()
            .map(Participant::to_info)
            .collect()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn connected(registry: &RoomRegistry) -> Uuid {
        let id = Uuid::new_v4();
        registry.register(Participant::anonymous(id));
        id
    }

    #[test]
    fn test_open_creates_room_with_host() {
        let registry = RoomRegistry::new();
        let host = connected(&registry);

        registry.open("R1", host);

        assert_eq!(registry.lookup_room("R1"), Some(vec![host]));
        let participant = registry.get(host).unwrap();
        assert_eq!(participant.player_number, Some(1));
        assert!(participant.is_host);
        assert_eq!(participant.room_id.as_deref(), Some("R1"));
    }

    #[test]
    fn test_join_requires_existing_room() {
        let registry = RoomRegistry::new();
        let joiner = connected(&registry);

        assert_eq!(registry.join("nope", joiner), Err(RoomError::RoomNotFound));
    }

    #[test]
    fn test_join_requires_a_host() {
        let registry = RoomRegistry::new();
        let host = connected(&registry);
        let joiner = connected(&registry);

        registry.open("R1", host);
        // Simulate the sole member losing its host flag.
        registry.assign(host, "R1", 1, false);

        assert_eq!(registry.join("R1", joiner), Err(RoomError::HostMissing));
    }

    #[test]
    fn test_join_enforces_capacity() {
        let registry = RoomRegistry::new();
        let host = connected(&registry);
        let second = connected(&registry);
        let third = connected(&registry);

        registry.open("R1", host);
        registry.join("R1", second).unwrap();

        assert_eq!(registry.join("R1", third), Err(RoomError::RoomFull));

        // Unbounded variant lets the third one in.
        let loose = RoomRegistry::with_capacity(None);
        let host = connected(&loose);
        let second = connected(&loose);
        let third = connected(&loose);
        loose.open("R1", host);
        loose.join("R1", second).unwrap();
        assert_eq!(loose.join("R1", third).unwrap().len(), 3);
    }

    #[test]
    fn test_join_assigns_player_two() {
        let registry = RoomRegistry::new();
        let host = connected(&registry);
        let joiner = connected(&registry);

        registry.open("R1", host);
        let members = registry.join("R1", joiner).unwrap();

        assert_eq!(members, vec![host, joiner]);
        let participant = registry.get(joiner).unwrap();
        assert_eq!(participant.player_number, Some(2));
        assert!(!participant.is_host);
    }

    #[test]
    fn test_last_disconnect_deletes_room() {
        let registry = RoomRegistry::new();
        let host = connected(&registry);

        registry.open("R1", host);
        let departure = registry.remove(host).unwrap();

        assert_eq!(departure.room_id, "R1");
        assert!(departure.remaining.is_empty());
        assert_eq!(registry.lookup_room("R1"), None);
        assert_eq!(registry.get(host), None);

        // A later join sees no trace of the room.
        let joiner = connected(&registry);
        assert_eq!(registry.join("R1", joiner), Err(RoomError::RoomNotFound));
    }

    #[test]
    fn test_partial_disconnect_keeps_room() {
        let registry = RoomRegistry::new();
        let host = connected(&registry);
        let joiner = connected(&registry);

        registry.open("R1", host);
        registry.join("R1", joiner).unwrap();

        let departure = registry.remove(joiner).unwrap();
        assert_eq!(departure.remaining, vec![host]);
        assert_eq!(registry.lookup_room("R1"), Some(vec![host]));
    }

    #[test]
    fn test_remove_without_room_reports_nothing() {
        let registry = RoomRegistry::new();
        let lone = connected(&registry);

        assert!(registry.remove(lone).is_none());
        assert_eq!(registry.get(lone), None);
    }
}
