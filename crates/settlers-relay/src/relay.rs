//! Room registry and the WebSocket relay loop.

use crate::protocol::{ClientEnvelope, ServerHello};
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::handshake::server::{Request, Response};
use tokio_tungstenite::tungstenite::http::Uri;
use tokio_tungstenite::{accept_hdr_async, tungstenite::Message};
use tracing::{error, info, warn};
use uuid::Uuid;

/// Errors from room operations.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("no room {0} to publish into")]
    UnknownRoom(String),
}

/// One game's connected clients plus the latest state anyone published.
#[derive(Default)]
pub struct Room {
    clients: HashMap<Uuid, mpsc::UnboundedSender<Message>>,
    latest_state: Option<Value>,
}

/// Relay state shared across all connections.
#[derive(Default)]
pub struct RelayState {
    /// Rooms keyed by normalized game id ("/abc")
    rooms: DashMap<String, Room>,
}

/// Normalize a game id into a room key.
fn room_key_for(game_id: Option<&str>) -> String {
    format!("/{}", game_id.unwrap_or(""))
}

/// Room key from the connecting URL: the `game` query parameter if present,
/// otherwise the path segment.
fn room_key_from_uri(uri: &Uri) -> String {
    if let Some(query) = uri.query() {
        for pair in query.split('&') {
            if let Some(id) = pair.strip_prefix("game=") {
                return room_key_for(Some(id));
            }
        }
    }
    room_key_for(Some(uri.path().trim_start_matches('/')))
}

impl RelayState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client in a room and build its hello: arrival position
    /// plus the stored state, so late joiners open on the shared board.
    pub fn join(
        &self,
        room_key: &str,
        client_id: Uuid,
        sender: mpsc::UnboundedSender<Message>,
    ) -> ServerHello {
        let mut room = self.rooms.entry(room_key.to_string()).or_default();
        room.clients.insert(client_id, sender);
        ServerHello {
            num_players_connected: room.clients.len(),
            game_state: room.latest_state.clone(),
        }
    }

    /// Store the envelope's state (if it carries one) and forward the raw
    /// payload verbatim to every other client in the room it names.
    pub fn publish(
        &self,
        client_id: Uuid,
        payload: &str,
        envelope: &ClientEnvelope,
    ) -> Result<(), RelayError> {
        let room_key = room_key_for(envelope.game_id.as_deref());
        let Some(mut room) = self.rooms.get_mut(&room_key) else {
            return Err(RelayError::UnknownRoom(room_key));
        };

        if envelope.game_state.is_some() {
            room.latest_state = envelope.game_state.clone();
        }

        for (id, sender) in &room.clients {
            if *id != client_id {
                let _ = sender.send(Message::Text(payload.to_string().into()));
            }
        }
        Ok(())
    }

    /// Deregister a client, dropping the room once it empties.
    pub fn leave(&self, room_key: &str, client_id: Uuid) {
        let now_empty = match self.rooms.get_mut(room_key) {
            Some(mut room) => {
                room.clients.remove(&client_id);
                room.clients.is_empty()
            }
            None => false,
        };
        if now_empty {
            self.rooms.remove(room_key);
        }
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

/// Run the relay server.
pub async fn run_relay(addr: SocketAddr, state: Arc<RelayState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!("Relay listening on {}", addr);

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
    state: Arc<RelayState>,
) -> anyhow::Result<()> {
    let mut room_key = room_key_for(None);
    let ws_stream = accept_hdr_async(stream, |request: &Request, response: Response| {
        room_key = room_key_from_uri(request.uri());
        Ok(response)
    })
    .await?;
    info!(%addr, %room_key, "new WebSocket connection");

    let (mut ws_sender, mut ws_receiver) = ws_stream.split();

    let client_id = Uuid::new_v4();

    // Channel for outgoing messages, fed by other clients' publishes
    let (tx, mut rx) = mpsc::unbounded_channel::<Message>();

    let hello = state.join(&room_key, client_id, tx);
    let hello_text = serde_json::to_string(&hello)?;
    ws_sender.send(Message::Text(hello_text.into())).await?;

    // Forward messages from the channel to the WebSocket
    let send_task = tokio::spawn(async move {
        while let Some(msg) = rx.recv().await {
            if ws_sender.send(msg).await.is_err() {
                break;
            }
        }
    });

    while let Some(msg) = ws_receiver.next().await {
        match msg {
            Ok(Message::Text(text)) => match serde_json::from_str::<ClientEnvelope>(&text) {
                Ok(envelope) => {
                    if let Err(e) = state.publish(client_id, &text, &envelope) {
                        warn!(client = %client_id, error = %e, "publish failed");
                    }
                }
                // A bad message is dropped; the connection stays up
                Err(e) => warn!(client = %client_id, error = %e, "ignoring malformed message"),
            },
            Ok(Message::Close(_)) => {
                info!(client = %client_id, "client closing connection");
                break;
            }
            Err(e) => {
                error!(client = %client_id, error = %e, "WebSocket error");
                break;
            }
            _ => {}
        }
    }

    state.leave(&room_key, client_id);
    send_task.abort();

    info!(client = %client_id, "connection closed");
    Ok(())
}
