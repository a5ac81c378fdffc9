//! Wire messages between game clients and the relay.
//!
//! Game state travels as an opaque JSON blob; the relay stores and forwards
//! it without ever interpreting it.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A message from a client: which game it belongs to, an optional
/// free-text note, and optionally the full game state.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientEnvelope {
    #[serde(default)]
    pub game_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Value>,
}

/// The greeting sent to a client on connect: its arrival position (which
/// doubles as seat assignment) and the stored game state, if any exists.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerHello {
    pub num_players_connected: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_state: Option<Value>,
}
