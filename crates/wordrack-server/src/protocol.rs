//! WebSocket protocol messages for WordRack multiplayer.
//!
//! Event names and payload fields follow the client wire contract:
//! kebab-case event tags, camelCase fields.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use wordrack_core::GameSession;

/// Caller-supplied game state relayed through `play-word`.
///
/// Opaque to the coordinator: it is mirrored and re-broadcast but never
/// interpreted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelayedState(pub serde_json::Value);

/// The state a room's clients should converge on.
///
/// Either the authoritative session dealt by `start-game` or the last
/// opaque state relayed through `play-word`. Serialized untagged so a
/// resync reproduces exactly what was last broadcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SessionSnapshot {
    Dealt(GameSession),
    Relayed(RelayedState),
}

/// Messages sent from client to server.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ClientMessage {
    /// Connect-time identity. Untrusted context, not a credential.
    #[serde(rename_all = "camelCase")]
    Identify {
        user_id: Option<String>,
        username: String,
        is_guest: bool,
        tab_id: Option<String>,
    },

    /// Create a room and become its host (player 1)
    #[serde(rename_all = "camelCase")]
    CreateGame { room_id: String },

    /// Join an existing room as player 2
    #[serde(rename_all = "camelCase")]
    JoinGame { room_id: String },

    /// Deal and broadcast a fresh game session (host)
    #[serde(rename_all = "camelCase")]
    StartGame { room_id: String, starter_id: String },

    /// Re-assert role after a reconnect; server replies with the current
    /// session state if one exists
    #[serde(rename_all = "camelCase")]
    SyncPlayerInfo {
        room_id: String,
        player_number: u8,
        is_host: bool,
    },

    /// Relay a move to the rest of the room
    #[serde(rename_all = "camelCase")]
    PlayWord {
        room_id: String,
        game_state: RelayedState,
    },
}

/// Messages sent from server to client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "kebab-case")]
pub enum ServerMessage {
    /// Assigned connection ID, sent on connect
    #[serde(rename_all = "camelCase")]
    Welcome { connection_id: Uuid },

    /// Room created successfully (caller only)
    #[serde(rename_all = "camelCase")]
    GameCreated { room_id: String },

    /// Membership changed; `your_id` is set only on the joiner's copy
    #[serde(rename_all = "camelCase")]
    PlayerJoined {
        players: Vec<PlayerInfo>,
        your_id: Option<Uuid>,
    },

    /// Freshly dealt session (entire room)
    GameStart(GameSession),

    /// Current session state (reconnect reply or post-move resync pulse)
    SyncGameState(SessionSnapshot),

    /// Another player's move (room minus sender)
    OpponentPlayed(RelayedState),

    /// Rejection directed at the caller
    Error { message: String },
}

/// One room member as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerInfo {
    pub id: Uuid,
    pub username: String,
    pub is_guest: bool,
    pub player_number: Option<u8>,
    pub is_host: bool,
}
