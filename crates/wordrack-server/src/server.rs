//! WebSocket server and connection handling.

use crate::protocol::{ClientMessage, ServerMessage, SessionSnapshot};
use crate::registry::{Identity, Participant, RoomRegistry};
use crate::store::SessionStore;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::{accept_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;
use wordrack_core::{GameSession, LayoutCatalog, TileDistribution, REQUIRED_PLAYERS};

/// Delay before the post-move resync pulse. Lets the immediate
/// `opponent-played` notification render before the authoritative
/// `sync-game-state` arrives.
const RESYNC_DELAY: Duration = Duration::from_millis(100);

/// Server state shared across all connections.
pub struct ServerState {
    /// Participants and room memberships
    pub registry: RoomRegistry,
    /// Per-room session snapshots for resync
    pub sessions: SessionStore,
    /// Mapping from connection ID to its message sender
    pub senders: DashMap<Uuid, mpsc::UnboundedSender<ServerMessage>>,
    /// Letter set dealt into each match
    pub distribution: TileDistribution,
    /// Board layouts to choose from
    pub layouts: LayoutCatalog,
}

impl ServerState {
    pub fn new(distribution: TileDistribution, layouts: LayoutCatalog) -> Self {
        Self {
            registry: RoomRegistry::new(),
            sessions: SessionStore::new(),
            senders: DashMap::new(),
            distribution,
            layouts,
        }
    }

    /// Send a message to a specific connection.
    pub fn send_to_connection(&self, connection_id: Uuid, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&connection_id) {
            let _ = sender.send(msg);
        }
    }

    /// Broadcast a message to every member of a room.
    pub fn broadcast_to_room(&self, room_id: &str, msg: ServerMessage) {
        if let Some(members) = self.registry.lookup_room(room_id) {
            for connection_id in members {
                self.send_to_connection(connection_id, msg.clone());
            }
        }
    }

    /// Broadcast a message to every member of a room except one.
    pub fn broadcast_to_room_except(&self, room_id: &str, except: Uuid, msg: ServerMessage) {
        if let Some(members) = self.registry.lookup_room(room_id) {
            for connection_id in members {
                if connection_id != except {
                    self.send_to_connection(connection_id, msg.clone());
                }
            }
        }
    }
}

/// Run the WebSocket server.
pub async fn run_server(addr: SocketAddr, state: Arc<ServerState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("WordRack server listening on {}", addr);

    while let Ok((stream, peer_addr)) = listener.accept().await {
        let state = Arc::clone(&state);
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, peer_addr, state).await {
                error!("Connection error from {}: {}", peer_addr, e);
            }
        });
    }

    Ok(())
}

/// Handle a single WebSocket connection.
async fn handle_connection(
    stream: TcpStream,
    addr: SocketAddr,
    state: Arc<ServerState>,
) -> anyhow::Result<()> {
    let ws_stream = accept_async(stream).await?;
    info!("New WebSocket connection from {}", addr);

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    // Assign a connection ID and register the participant
    let connection_id = Uuid::new_v4();
    state.registry.register(Participant::anonymous(connection_id));

    // Create channel for outgoing messages
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerMessage>();
    state.senders.insert(connection_id, tx);

    // Send welcome message
    let welcome = ServerMessage::Welcome { connection_id };
    let msg_text = serde_json::to_string(&welcome)?;
    ws_sender.send(Message::Text(msg_text.into())).await?;

    // Spawn task to forward messages from channel to WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if let Ok(text) = serde_json::to_string(&msg) {
                if ws_sender.send(Message::Text(text.into())).await.is_err() {
                    break;
                }
            }
        }
    });

    // Handle incoming messages
    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => {
                if let Ok(client_msg) = serde_json::from_str::<ClientMessage>(&text) {
                    handle_message(connection_id, client_msg, &state);
                } else {
                    warn!("Invalid message from {}: {}", connection_id, text);
                }
            }
            Ok(Message::Close(_)) => {
                info!("Client {} closing connection", connection_id);
                break;
            }
            Err(e) => {
                error!("WebSocket error from {}: {}", connection_id, e);
                break;
            }
            _ => {}
        }
    }

    // Clean up on disconnect
    handle_disconnect(connection_id, &state);
    state.senders.remove(&connection_id);
    send_task.abort();

    info!("Connection closed for {}", connection_id);
    Ok(())
}

/// Handle a client message.
fn handle_message(connection_id: Uuid, msg: ClientMessage, state: &Arc<ServerState>) {
    match msg {
        ClientMessage::Identify {
            user_id,
            username,
            is_guest,
            tab_id,
        } => {
            state.registry.set_identity(
                connection_id,
                Identity {
                    user_id,
                    username,
                    is_guest,
                    tab_id,
                },
            );
        }

        ClientMessage::CreateGame { room_id } => {
            state.registry.open(&room_id, connection_id);
            info!("Room {} created by {}", room_id, connection_id);

            state.send_to_connection(connection_id, ServerMessage::GameCreated { room_id });
        }

        ClientMessage::JoinGame { room_id } => match state.registry.join(&room_id, connection_id)
        {
            Ok(members) => {
                info!("{} joined room {}", connection_id, room_id);
                let players = state.registry.member_infos(&room_id);
                for member in members {
                    state.send_to_connection(
                        member,
                        ServerMessage::PlayerJoined {
                            players: players.clone(),
                            your_id: (member == connection_id).then_some(connection_id),
                        },
                    );
                }
            }
            Err(e) => {
                state.send_to_connection(
                    connection_id,
                    ServerMessage::Error {
                        message: e.to_string(),
                    },
                );
            }
        },

        ClientMessage::StartGame {
            room_id,
            starter_id,
        } => {
            let Some(members) = state.registry.lookup_room(&room_id) else {
                warn!("start-game for unknown room {}", room_id);
                return;
            };
            if members.len() < REQUIRED_PLAYERS {
                warn!(
                    "start-game for room {} with {} member(s), ignoring",
                    room_id,
                    members.len()
                );
                return;
            }

            let mut participants = state.registry.participants_in(&room_id);
            participants.sort_by_key(|p| p.player_number.unwrap_or(u8::MAX));
            let seats = participants.iter().map(Participant::to_seat).collect();

            let session = GameSession::deal(
                seats,
                &state.distribution,
                &state.layouts,
                &mut rand::thread_rng(),
            );

            info!(
                "Game started in room {} by {} with layout {}",
                room_id, starter_id, session.active_layout
            );

            state
                .sessions
                .create(&room_id, SessionSnapshot::Dealt(session.clone()));
            state.broadcast_to_room(&room_id, ServerMessage::GameStart(session));
        }

        ClientMessage::SyncPlayerInfo {
            room_id,
            player_number,
            is_host,
        } => {
            state
                .registry
                .assign(connection_id, &room_id, player_number, is_host);

            if let Some(snapshot) = state.sessions.get(&room_id) {
                state.send_to_connection(connection_id, ServerMessage::SyncGameState(snapshot));
            }
        }

        ClientMessage::PlayWord {
            room_id,
            game_state,
        } => {
            state.broadcast_to_room_except(
                &room_id,
                connection_id,
                ServerMessage::OpponentPlayed(game_state.clone()),
            );

            // Mirror the relayed state so reconnects resync to it even
            // before the pulse fires.
            state
                .sessions
                .create(&room_id, SessionSnapshot::Relayed(game_state.clone()));

            let state = Arc::clone(state);
            tokio::spawn(async move {
                tokio::time::sleep(RESYNC_DELAY).await;
                state.broadcast_to_room(
                    &room_id,
                    ServerMessage::SyncGameState(SessionSnapshot::Relayed(game_state)),
                );
            });
        }
    }
}

/// Handle participant disconnect. Always runs to completion.
fn handle_disconnect(connection_id: Uuid, state: &Arc<ServerState>) {
    if let Some(departure) = state.registry.remove(connection_id) {
        if departure.remaining.is_empty() {
            state.sessions.remove(&departure.room_id);
            info!("Room {} deleted (empty)", departure.room_id);
        } else {
            let players = state.registry.member_infos(&departure.room_id);
            state.broadcast_to_room(
                &departure.room_id,
                ServerMessage::PlayerJoined {
                    players,
                    your_id: None,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::RelayedState;
    use wordrack_core::{BOARD_SIZE, RACK_SIZE};

    fn test_state() -> Arc<ServerState> {
        Arc::new(ServerState::new(
            TileDistribution::georgian(),
            LayoutCatalog::standard(),
        ))
    }

    /// Register a connection the way `handle_connection` does, minus the
    /// socket: participant record plus an outbound channel we can drain.
    fn connect(state: &Arc<ServerState>) -> (Uuid, mpsc::UnboundedReceiver<ServerMessage>) {
        let connection_id = Uuid::new_v4();
        state.registry.register(Participant::anonymous(connection_id));
        let (tx, rx) = mpsc::unbounded_channel();
        state.senders.insert(connection_id, tx);
        (connection_id, rx)
    }

    fn identify(state: &Arc<ServerState>, connection_id: Uuid, username: &str) {
        handle_message(
            connection_id,
            ClientMessage::Identify {
                user_id: Some(format!("ext-{username}")),
                username: username.into(),
                is_guest: false,
                tab_id: None,
            },
            state,
        );
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<ServerMessage>) -> Vec<ServerMessage> {
        let mut messages = Vec::new();
        while let Ok(msg) = rx.try_recv() {
            messages.push(msg);
        }
        messages
    }

    #[tokio::test]
    async fn test_create_acknowledges_caller_only() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);
        let (_b, mut rx_b) = connect(&state);

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);

        assert_eq!(
            drain(&mut rx_a),
            vec![ServerMessage::GameCreated { room_id: "R1".into() }]
        );
        assert!(drain(&mut rx_b).is_empty());
    }

    #[tokio::test]
    async fn test_join_unknown_room_is_rejected() {
        let state = test_state();
        let (b, mut rx_b) = connect(&state);

        handle_message(b, ClientMessage::JoinGame { room_id: "nope".into() }, &state);

        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::Error {
                message: "Game not found".into()
            }]
        );
    }

    #[tokio::test]
    async fn test_join_broadcasts_membership() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);
        identify(&state, a, "alice");
        identify(&state, b, "bob");

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);
        drain(&mut rx_a);
        handle_message(b, ClientMessage::JoinGame { room_id: "R1".into() }, &state);

        let to_a = drain(&mut rx_a);
        let to_b = drain(&mut rx_b);
        let ServerMessage::PlayerJoined { players, your_id } = &to_a[0] else {
            panic!("expected player-joined, got {to_a:?}");
        };
        assert_eq!(players.len(), 2);
        assert_eq!(players[0].username, "alice");
        assert_eq!(players[0].player_number, Some(1));
        assert!(players[0].is_host);
        assert_eq!(players[1].player_number, Some(2));
        assert_eq!(*your_id, None);

        let ServerMessage::PlayerJoined { your_id, .. } = &to_b[0] else {
            panic!("expected player-joined, got {to_b:?}");
        };
        assert_eq!(*your_id, Some(b));
    }

    #[tokio::test]
    async fn test_start_with_one_member_is_a_no_op() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);
        drain(&mut rx_a);
        handle_message(
            a,
            ClientMessage::StartGame {
                room_id: "R1".into(),
                starter_id: a.to_string(),
            },
            &state,
        );

        assert!(drain(&mut rx_a).is_empty());
        assert!(state.sessions.get("R1").is_none());
    }

    #[tokio::test]
    async fn test_full_match_start_flow() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);
        identify(&state, a, "alice");
        identify(&state, b, "bob");

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);
        handle_message(b, ClientMessage::JoinGame { room_id: "R1".into() }, &state);
        drain(&mut rx_a);
        drain(&mut rx_b);

        handle_message(
            a,
            ClientMessage::StartGame {
                room_id: "R1".into(),
                starter_id: a.to_string(),
            },
            &state,
        );

        let to_a = drain(&mut rx_a);
        let to_b = drain(&mut rx_b);
        assert_eq!(to_a, to_b);

        let ServerMessage::GameStart(session) = &to_a[0] else {
            panic!("expected game-start, got {to_a:?}");
        };
        assert_eq!(session.players.len(), 2);
        assert_eq!(session.players[0].username, "alice");
        assert_eq!(session.players[0].player_number, 1);
        assert_eq!(session.players[1].player_number, 2);
        assert_eq!(session.players[0].rack.len(), RACK_SIZE);
        assert_eq!(session.players[1].rack.len(), RACK_SIZE);
        assert_eq!(
            session.bag.len(),
            state.distribution.total_tiles() as usize - 2 * RACK_SIZE
        );
        assert_eq!(session.current_player_index, 0);
        assert!(state.layouts.contains(&session.active_layout));

        let board = serde_json::to_value(&session.board_tiles).unwrap();
        assert_eq!(board.as_array().unwrap().len(), BOARD_SIZE);
        assert!(board
            .as_array()
            .unwrap()
            .iter()
            .all(|row| row.as_array().unwrap().iter().all(|c| c.is_null())));

        // The stored snapshot matches the broadcast.
        assert_eq!(
            state.sessions.get("R1"),
            Some(SessionSnapshot::Dealt(session.clone()))
        );
    }

    #[tokio::test]
    async fn test_sync_player_info_resends_session() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);
        identify(&state, a, "alice");
        identify(&state, b, "bob");

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);
        handle_message(b, ClientMessage::JoinGame { room_id: "R1".into() }, &state);
        handle_message(
            a,
            ClientMessage::StartGame {
                room_id: "R1".into(),
                starter_id: a.to_string(),
            },
            &state,
        );
        let broadcast = drain(&mut rx_a)
            .into_iter()
            .find_map(|m| match m {
                ServerMessage::GameStart(session) => Some(session),
                _ => None,
            })
            .unwrap();
        drain(&mut rx_b);

        handle_message(
            b,
            ClientMessage::SyncPlayerInfo {
                room_id: "R1".into(),
                player_number: 2,
                is_host: false,
            },
            &state,
        );

        let to_b = drain(&mut rx_b);
        let ServerMessage::SyncGameState(snapshot) = &to_b[0] else {
            panic!("expected sync-game-state, got {to_b:?}");
        };
        // Deep-equal with what start-game broadcast.
        assert_eq!(
            serde_json::to_value(snapshot).unwrap(),
            serde_json::to_value(&broadcast).unwrap()
        );
        // Caller only: the host got nothing.
        assert!(drain(&mut rx_a).is_empty());
    }

    #[tokio::test]
    async fn test_play_word_relays_then_resyncs() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);
        handle_message(b, ClientMessage::JoinGame { room_id: "R1".into() }, &state);
        drain(&mut rx_a);
        drain(&mut rx_b);

        let played = RelayedState(serde_json::json!({"boardTiles": [["ა"]], "turn": 2}));
        handle_message(
            a,
            ClientMessage::PlayWord {
                room_id: "R1".into(),
                game_state: played.clone(),
            },
            &state,
        );

        // Immediate relay goes to the room minus the sender.
        assert_eq!(
            drain(&mut rx_b),
            vec![ServerMessage::OpponentPlayed(played.clone())]
        );
        assert!(drain(&mut rx_a).is_empty());

        // The store mirrors the relayed state straight away.
        assert_eq!(
            state.sessions.get("R1"),
            Some(SessionSnapshot::Relayed(played.clone()))
        );

        // The delayed pulse reaches the whole room, sender included.
        tokio::time::sleep(RESYNC_DELAY + Duration::from_millis(50)).await;
        let pulse = ServerMessage::SyncGameState(SessionSnapshot::Relayed(played.clone()));
        assert_eq!(drain(&mut rx_a), vec![pulse.clone()]);
        assert_eq!(drain(&mut rx_b), vec![pulse.clone()]);

        // A reconnect sync now returns the played state, not the deal.
        handle_message(
            b,
            ClientMessage::SyncPlayerInfo {
                room_id: "R1".into(),
                player_number: 2,
                is_host: false,
            },
            &state,
        );
        assert_eq!(drain(&mut rx_b), vec![pulse]);
    }

    #[tokio::test]
    async fn test_disconnect_notifies_remainder_then_deletes_room() {
        let state = test_state();
        let (a, mut rx_a) = connect(&state);
        let (b, mut rx_b) = connect(&state);
        identify(&state, a, "alice");
        identify(&state, b, "bob");

        handle_message(a, ClientMessage::CreateGame { room_id: "R1".into() }, &state);
        handle_message(b, ClientMessage::JoinGame { room_id: "R1".into() }, &state);
        handle_message(
            a,
            ClientMessage::StartGame {
                room_id: "R1".into(),
                starter_id: a.to_string(),
            },
            &state,
        );
        drain(&mut rx_a);
        drain(&mut rx_b);

        handle_disconnect(b, &state);
        state.senders.remove(&b);

        let to_a = drain(&mut rx_a);
        let ServerMessage::PlayerJoined { players, your_id } = &to_a[0] else {
            panic!("expected player-joined, got {to_a:?}");
        };
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].username, "alice");
        assert_eq!(*your_id, None);

        handle_disconnect(a, &state);
        state.senders.remove(&a);

        // Room and session are gone; a fresh join is rejected.
        assert!(state.sessions.get("R1").is_none());
        let (c, mut rx_c) = connect(&state);
        handle_message(c, ClientMessage::JoinGame { room_id: "R1".into() }, &state);
        assert_eq!(
            drain(&mut rx_c),
            vec![ServerMessage::Error {
                message: "Game not found".into()
            }]
        );
    }
}
