//! Board representation: tiles, the vertex/edge registries, and occupancy.
//!
//! The board registers every vertex and edge midpoint once at construction
//! and never adds or removes positions afterwards. Occupancy is tracked as
//! `Option<PlayerId>` per registered position, so "is this spot registered"
//! and "is this spot taken" stay distinct questions.

use crate::coord::{hex_vertices, CoordKey, GridCoord};
use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::warn;

/// Player identifier: index into the game's player list.
pub type PlayerId = usize;

/// The five collectible resource types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Resource {
    Brick,
    Wood,
    Sheep,
    Wheat,
    Ore,
}

impl Resource {
    /// All resource types, in digit-selection order (1=brick .. 5=ore).
    pub const ALL: [Resource; 5] = [
        Resource::Brick,
        Resource::Wood,
        Resource::Sheep,
        Resource::Wheat,
        Resource::Ore,
    ];

    /// Lowercase display name, as shown in instructions.
    pub fn name(&self) -> &'static str {
        match self {
            Resource::Brick => "brick",
            Resource::Wood => "wood",
            Resource::Sheep => "sheep",
            Resource::Wheat => "wheat",
            Resource::Ore => "ore",
        }
    }
}

/// What a tile is made of: a resource, or the desert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TileKind {
    Brick,
    Wood,
    Sheep,
    Wheat,
    Ore,
    Desert,
}

impl TileKind {
    /// The resource this tile produces, if any.
    pub fn resource(&self) -> Option<Resource> {
        match self {
            TileKind::Brick => Some(Resource::Brick),
            TileKind::Wood => Some(Resource::Wood),
            TileKind::Sheep => Some(Resource::Sheep),
            TileKind::Wheat => Some(Resource::Wheat),
            TileKind::Ore => Some(Resource::Ore),
            TileKind::Desert => None,
        }
    }
}

/// A single hex tile. Serializes in the wire form used by the sync protocol.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Tile {
    /// Center of the hex
    pub coord: GridCoord,
    /// What the tile is made of
    #[serde(rename = "resource")]
    pub kind: TileKind,
    /// Dice number that triggers production (None for the desert)
    pub number: Option<u8>,
}

/// Centers of the 19 land hexes, in number-assignment traversal order:
/// around the outer ring, then the inner ring, then the center.
pub const TILE_CENTERS: [(f64, f64); 19] = [
    (2.0, 0.0),
    (1.0, 1.5),
    (0.0, 3.0),
    (1.0, 4.5),
    (2.0, 6.0),
    (4.0, 6.0),
    (6.0, 6.0),
    (7.0, 4.5),
    (8.0, 3.0),
    (7.0, 1.5),
    (6.0, 0.0),
    (4.0, 0.0),
    (3.0, 1.5),
    (2.0, 3.0),
    (3.0, 4.5),
    (5.0, 4.5),
    (6.0, 3.0),
    (5.0, 1.5),
    (4.0, 3.0),
];

/// Dice numbers assigned to non-desert tiles in traversal order.
pub const NUMBER_SEQUENCE: [u8; 18] = [5, 2, 6, 3, 8, 10, 9, 12, 11, 4, 8, 10, 9, 4, 5, 6, 3, 11];

/// Serialized board state: tile assignments plus occupancy entries.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    pub tile_resources: Vec<Tile>,
    pub occupied_vertexes: Vec<(CoordKey, Option<PlayerId>)>,
    pub occupied_edges: Vec<(CoordKey, Option<PlayerId>)>,
}

/// The complete game board.
#[derive(Debug, Clone)]
pub struct Board {
    /// Tiles indexed by the key of their center
    tiles: HashMap<CoordKey, Tile>,
    /// Settlement/city occupancy per registered vertex
    occupied_vertices: HashMap<CoordKey, Option<PlayerId>>,
    /// Road occupancy per registered edge midpoint
    occupied_edges: HashMap<CoordKey, Option<PlayerId>>,
    /// The two vertices bounding each registered edge
    vertices_by_midpoint: HashMap<CoordKey, [GridCoord; 2]>,
    /// Every registered position, for resolving keys back to coordinates
    registered: HashMap<CoordKey, GridCoord>,
}

impl Board {
    /// Create a board with randomly shuffled tiles.
    pub fn new() -> Self {
        let mut rng = rand::thread_rng();
        Self::new_with_rng(&mut rng)
    }

    /// Create a board with a provided RNG, for deterministic generation.
    pub fn new_with_rng<R: Rng>(rng: &mut R) -> Self {
        let mut board = Self {
            tiles: HashMap::new(),
            occupied_vertices: HashMap::new(),
            occupied_edges: HashMap::new(),
            vertices_by_midpoint: HashMap::new(),
            registered: HashMap::new(),
        };

        // Register every vertex and edge midpoint of every hex. Shared
        // positions hash to the same key, so duplicates collapse.
        for &(cx, cy) in &TILE_CENTERS {
            let center = GridCoord::new(cx, cy);
            let vertices = hex_vertices(center);
            for i in 0..6 {
                let a = vertices[i];
                let b = vertices[(i + 1) % 6];
                let midpoint = GridCoord::centroid(&[a, b]);
                board.registered.insert(midpoint.key(), midpoint);
                board.occupied_edges.insert(midpoint.key(), None);
                board.vertices_by_midpoint.insert(midpoint.key(), [a, b]);

                board.registered.insert(a.key(), a);
                board.occupied_vertices.insert(a.key(), None);
            }
        }

        // 4 wheat, 3 ore, 4 sheep, 4 wood, 3 brick, 1 desert
        let mut stack: Vec<TileKind> = Vec::with_capacity(19);
        stack.extend(std::iter::repeat(TileKind::Wheat).take(4));
        stack.extend(std::iter::repeat(TileKind::Ore).take(3));
        stack.extend(std::iter::repeat(TileKind::Sheep).take(4));
        stack.extend(std::iter::repeat(TileKind::Wood).take(4));
        stack.extend(std::iter::repeat(TileKind::Brick).take(3));
        stack.push(TileKind::Desert);
        stack.shuffle(rng);

        // Deal tiles in traversal order; the desert doesn't consume a number.
        let mut number_idx = 0;
        for &(cx, cy) in &TILE_CENTERS {
            let center = GridCoord::new(cx, cy);
            let kind = stack.pop().expect("tile stack exhausted");
            let number = match kind {
                TileKind::Desert => None,
                _ => {
                    let n = NUMBER_SEQUENCE[number_idx];
                    number_idx += 1;
                    Some(n)
                }
            };
            board.tiles.insert(
                center.key(),
                Tile {
                    coord: center,
                    kind,
                    number,
                },
            );
        }

        board
    }

    /// Whether `coord` is a registered vertex.
    pub fn is_vertex(&self, coord: GridCoord) -> bool {
        self.occupied_vertices.contains_key(&coord.key())
    }

    /// Whether `coord` is a registered edge midpoint.
    pub fn is_edge_midpoint(&self, coord: GridCoord) -> bool {
        self.occupied_edges.contains_key(&coord.key())
    }

    /// The two vertices bounding the edge with the given midpoint.
    pub fn vertices_for_midpoint(&self, midpoint: GridCoord) -> Option<[GridCoord; 2]> {
        self.vertices_by_midpoint.get(&midpoint.key()).copied()
    }

    /// The tiles adjacent to a vertex (up to 3). Candidate centers are the
    /// same six offsets as hex vertices, applied from the vertex.
    pub fn adjacent_tiles(&self, vertex: GridCoord) -> Vec<Tile> {
        hex_vertices(vertex)
            .iter()
            .filter_map(|candidate| self.tiles.get(&candidate.key()).copied())
            .collect()
    }

    /// All tiles on the board.
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.tiles.values()
    }

    /// Whether someone has already built at this position. An explicit
    /// presence check: player 0 occupying a spot counts as occupied.
    pub fn is_occupied(&self, coord: GridCoord) -> bool {
        let key = coord.key();
        self.occupied_vertices
            .get(&key)
            .is_some_and(|occupant| occupant.is_some())
            || self
                .occupied_edges
                .get(&key)
                .is_some_and(|occupant| occupant.is_some())
    }

    /// The player occupying this position, if any.
    pub fn occupant(&self, coord: GridCoord) -> Option<PlayerId> {
        let key = coord.key();
        self.occupied_vertices
            .get(&key)
            .copied()
            .flatten()
            .or_else(|| self.occupied_edges.get(&key).copied().flatten())
    }

    /// Mark a vertex as occupied by a player. Callers check `is_occupied`
    /// first; unknown positions are ignored with a warning.
    pub fn occupy_vertex(&mut self, coord: GridCoord, player: PlayerId) {
        match self.occupied_vertices.get_mut(&coord.key()) {
            Some(entry) => *entry = Some(player),
            None => warn!(?coord, "occupy_vertex at unregistered position"),
        }
    }

    /// Mark an edge midpoint as occupied by a player.
    pub fn occupy_edge(&mut self, coord: GridCoord, player: PlayerId) {
        match self.occupied_edges.get_mut(&coord.key()) {
            Some(entry) => *entry = Some(player),
            None => warn!(?coord, "occupy_edge at unregistered position"),
        }
    }

    /// Resolve a key back to its registered coordinate.
    pub fn coord_for_key(&self, key: CoordKey) -> Option<GridCoord> {
        self.registered.get(&key).copied()
    }

    /// Number of registered vertices.
    pub fn vertex_count(&self) -> usize {
        self.occupied_vertices.len()
    }

    /// Number of registered edges.
    pub fn edge_count(&self) -> usize {
        self.occupied_edges.len()
    }

    /// Serialize the board state for the sync protocol.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            tile_resources: self.tiles.values().copied().collect(),
            occupied_vertexes: self
                .occupied_vertices
                .iter()
                .map(|(&key, &occupant)| (key, occupant))
                .collect(),
            occupied_edges: self
                .occupied_edges
                .iter()
                .map(|(&key, &occupant)| (key, occupant))
                .collect(),
        }
    }

    /// Merge a snapshot into this board. Only positions already registered
    /// are updated; unknown keys are logged and skipped so remote noise
    /// can't grow the registries.
    pub fn apply(&mut self, snapshot: &BoardSnapshot) {
        for tile in &snapshot.tile_resources {
            match self.tiles.get_mut(&tile.coord.key()) {
                Some(local) => {
                    local.kind = tile.kind;
                    local.number = tile.number;
                }
                None => warn!(coord = ?tile.coord, "snapshot tile at unknown center"),
            }
        }
        for &(key, occupant) in &snapshot.occupied_vertexes {
            match self.occupied_vertices.get_mut(&key) {
                Some(entry) => *entry = occupant,
                None => warn!(?key, "snapshot vertex with unknown key"),
            }
        }
        for &(key, occupant) in &snapshot.occupied_edges {
            match self.occupied_edges.get_mut(&key) {
                Some(entry) => *entry = occupant,
                None => warn!(?key, "snapshot edge with unknown key"),
            }
        }
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}
