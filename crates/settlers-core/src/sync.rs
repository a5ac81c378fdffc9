//! Full-state synchronization between clients.
//!
//! There is no action protocol: after every local input a client publishes
//! its entire game state, and an incoming state overwrites the local one
//! wholesale (last writer wins). The transport is behind a trait so the
//! engine never touches a socket; a buffered in-memory transport ships for
//! tests.

use crate::board::BoardSnapshot;
use crate::coord::GridCoord;
use crate::devcard::DevCardKind;
use crate::game::{Command, Game, Phase};
use crate::player::{Building, ResourceHand, StructureType};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

/// Errors from applying a remote snapshot or publishing a local one.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("snapshot references unknown coordinate key {0}")]
    UnknownCoordKey(i64),
    #[error("snapshot references player index {0}, but only {1} players exist")]
    PlayerIndexOutOfRange(usize, usize),
    #[error("transport failure: {0}")]
    Transport(String),
}

/// A development card as it appears on the wire.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DevCardRecord {
    #[serde(rename = "type")]
    pub kind: DevCardKind,
}

/// Per-player wire state. Buildings, roads, and colors are not transmitted;
/// structures are rebuilt from the board occupancy entries on receipt.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshot {
    pub name: String,
    pub resources: ResourceHand,
    pub dev_cards_unused: Vec<DevCardRecord>,
    pub dev_cards_used: Vec<DevCardRecord>,
}

/// The complete wire state of a game.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub board: BoardSnapshot,
    pub players: Vec<PlayerSnapshot>,
    pub whose_turn: usize,
    pub instructions: String,
    pub phase: Phase,
    pub tryna_build_type: Option<StructureType>,
    pub num_cards_to_draw: u32,
}

impl Game {
    /// Serialize the complete game state for publication.
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            board: self.board.snapshot(),
            players: self
                .players
                .iter()
                .map(|p| PlayerSnapshot {
                    name: p.name.clone(),
                    resources: p.resources,
                    dev_cards_unused: p
                        .dev_cards_unused
                        .iter()
                        .map(|&kind| DevCardRecord { kind })
                        .collect(),
                    dev_cards_used: p
                        .dev_cards_used
                        .iter()
                        .map(|&kind| DevCardRecord { kind })
                        .collect(),
                })
                .collect(),
            whose_turn: self.whose_turn,
            instructions: self.instructions.clone(),
            phase: self.phase,
            tryna_build_type: self.pending_build,
            num_cards_to_draw: self.cards_to_draw,
        }
    }

    /// Overwrite this game with a remote snapshot.
    ///
    /// Structures are rebuilt from the occupancy entries; the wire format
    /// does not carry the city flag, so every rebuilt building comes back
    /// as a settlement. The receiving player's own name is never
    /// overwritten (`session_player` owns it locally).
    ///
    /// A snapshot that fails validation (unknown coordinate key, player
    /// index out of range) leaves this game untouched.
    pub fn apply_snapshot(
        &mut self,
        snapshot: &GameSnapshot,
        session_player: usize,
    ) -> Result<(), SyncError> {
        let num_players = self.players.len();

        // Resolve every occupancy entry before mutating anything
        let mut buildings: Vec<(usize, Building)> = Vec::new();
        for &(key, occupant) in &snapshot.board.occupied_vertexes {
            let Some(player_index) = occupant else { continue };
            let location = self
                .board
                .coord_for_key(key)
                .ok_or(SyncError::UnknownCoordKey(key.0))?;
            if player_index >= num_players {
                return Err(SyncError::PlayerIndexOutOfRange(player_index, num_players));
            }
            buildings.push((
                player_index,
                Building {
                    location,
                    is_city: false,
                },
            ));
        }
        let mut roads: Vec<(usize, GridCoord)> = Vec::new();
        for &(key, occupant) in &snapshot.board.occupied_edges {
            let Some(player_index) = occupant else { continue };
            let midpoint = self
                .board
                .coord_for_key(key)
                .ok_or(SyncError::UnknownCoordKey(key.0))?;
            if player_index >= num_players {
                return Err(SyncError::PlayerIndexOutOfRange(player_index, num_players));
            }
            roads.push((player_index, midpoint));
        }
        if snapshot.players.len() > num_players {
            return Err(SyncError::PlayerIndexOutOfRange(num_players, num_players));
        }

        self.board.apply(&snapshot.board);

        for player in &mut self.players {
            player.buildings.clear();
            player.roads.clear();
        }
        for (player_index, building) in buildings {
            self.players[player_index].buildings.push(building);
        }
        for (player_index, midpoint) in roads {
            self.players[player_index].roads.push(midpoint);
        }

        for (i, remote) in snapshot.players.iter().enumerate() {
            let local = &mut self.players[i];

            // Only the player themself can update their name
            if i != session_player {
                local.name = remote.name.clone();
            }
            local.resources = remote.resources;
            local.dev_cards_unused = remote.dev_cards_unused.iter().map(|c| c.kind).collect();
            local.dev_cards_used = remote.dev_cards_used.iter().map(|c| c.kind).collect();
        }

        self.whose_turn = snapshot.whose_turn;
        self.instructions = snapshot.instructions.clone();
        self.phase = snapshot.phase;
        self.pending_build = snapshot.tryna_build_type;
        self.cards_to_draw = snapshot.num_cards_to_draw;

        Ok(())
    }
}

/// Outbound half of the sync seam. Implementations deliver a published
/// snapshot to the other clients in the same game.
pub trait SyncTransport {
    fn publish(&mut self, snapshot: &GameSnapshot, note: &str) -> Result<(), SyncError>;
}

/// In-memory transport that records everything published, for tests and
/// offline play.
#[derive(Debug, Default)]
pub struct BufferedTransport {
    pub published: Vec<(String, GameSnapshot)>,
}

impl BufferedTransport {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SyncTransport for BufferedTransport {
    fn publish(&mut self, snapshot: &GameSnapshot, note: &str) -> Result<(), SyncError> {
        self.published.push((note.to_string(), snapshot.clone()));
        Ok(())
    }
}

/// One client's seat at a shared game: the local game state, which player
/// this client controls, and the transport used to publish changes.
pub struct Session<T: SyncTransport> {
    pub game: Game,
    /// Which player this client controls
    pub player_index: usize,
    transport: T,
}

impl<T: SyncTransport> Session<T> {
    pub fn new(game: Game, transport: T) -> Self {
        Self {
            game,
            player_index: 0,
            transport,
        }
    }

    /// Handshake on (re)connect: seat assignment is arrival order, and the
    /// first client to arrive publishes the initial state for everyone.
    pub fn on_connected(&mut self, num_players_connected: usize) -> Result<(), SyncError> {
        self.player_index = num_players_connected.saturating_sub(1);
        info!(seat = self.player_index, "connected to shared game");

        if num_players_connected == 1 {
            self.transport.publish(&self.game.snapshot(), "Game created")?;
        }
        Ok(())
    }

    /// Apply a local click and publish the resulting state.
    pub fn on_click(&mut self, coord: GridCoord) -> Result<(), SyncError> {
        self.game.handle_click(coord);
        self.transport
            .publish(&self.game.snapshot(), "another player clicked!")
    }

    /// Apply a local key command and publish the resulting state.
    pub fn on_command(&mut self, command: Command) -> Result<(), SyncError> {
        self.game.handle_command(command);
        self.transport
            .publish(&self.game.snapshot(), &format!("another player hit {command:?}!"))
    }

    /// Apply a snapshot received from another client.
    pub fn on_remote_state(&mut self, snapshot: &GameSnapshot) -> Result<(), SyncError> {
        self.game.apply_snapshot(snapshot, self.player_index)
    }

    /// Rename this client's own player and publish the change.
    pub fn set_player_name(&mut self, name: impl Into<String>) -> Result<(), SyncError> {
        let num_players = self.game.players.len();
        let player = self
            .game
            .players
            .get_mut(self.player_index)
            .ok_or(SyncError::PlayerIndexOutOfRange(self.player_index, num_players))?;
        player.name = name.into();
        self.transport
            .publish(&self.game.snapshot(), "player renamed")
    }
}
