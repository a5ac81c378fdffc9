//! Core engine for a browser-playable settlement board game.
//!
//! This crate provides the full game logic, including:
//! - Fractional grid coordinates for the hex board
//! - Board representation with tiles, vertices, and edge midpoints
//! - Player state and resource management
//! - Development cards
//! - The game phase state machine
//! - Full-state synchronization between clients
//!
//! # Architecture
//!
//! The engine is deliberately free of I/O. Clicks and key commands come in
//! through [`game::Game`], and multiplayer works by publishing the entire
//! game state through the [`sync::SyncTransport`] seam after every input.
//! The companion relay server never inspects that state; it just forwards
//! it between the clients of a game.
//!
//! # Modules
//!
//! - [`coord`]: Grid coordinates, snapping, and derived keys
//! - [`board`]: Tiles and the vertex/edge occupancy registries
//! - [`player`]: Players, resources, and structures
//! - [`devcard`]: Development card kinds and the draw
//! - [`game`]: The phase state machine
//! - [`sync`]: Snapshots, sessions, and the transport seam

pub mod board;
pub mod coord;
pub mod devcard;
pub mod game;
pub mod player;
pub mod sync;

// Re-export commonly used types
pub use board::{Board, BoardSnapshot, PlayerId, Resource, Tile, TileKind};
pub use coord::{CoordKey, GridCoord};
pub use devcard::DevCardKind;
pub use game::{Command, Game, Phase, ACT_INSTRUCTION, RESOURCE_CHOICE_NUMBERS};
pub use player::{Building, Player, PlayerColor, ResourceHand, StructureType};
pub use sync::{BufferedTransport, GameSnapshot, Session, SyncError, SyncTransport};
