//! Player state: resources, structures, and development cards.
//!
//! Build methods follow a silent-rejection contract: an invalid attempt
//! returns `false`, logs at debug level, and leaves all state untouched.

use crate::board::{Board, PlayerId, Resource};
use crate::coord::GridCoord;
use crate::devcard::DevCardKind;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Player color for UI rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayerColor {
    Red,
    White,
    Blue,
    Orange,
}

impl PlayerColor {
    /// Default color for a player index.
    pub fn for_player(index: PlayerId) -> Self {
        match index % 4 {
            0 => PlayerColor::Red,
            1 => PlayerColor::White,
            2 => PlayerColor::Blue,
            _ => PlayerColor::Orange,
        }
    }
}

/// What a player can spend resources on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StructureType {
    Settlement,
    City,
    Road,
    DevCard,
}

impl StructureType {
    /// Resource cost of this structure.
    pub fn cost(&self) -> ResourceHand {
        match self {
            StructureType::Settlement => ResourceHand::with_amounts(1, 1, 1, 1, 0),
            StructureType::City => ResourceHand::with_amounts(0, 0, 0, 2, 3),
            StructureType::Road => ResourceHand::with_amounts(1, 1, 0, 0, 0),
            StructureType::DevCard => ResourceHand::with_amounts(0, 0, 1, 1, 1),
        }
    }

    /// Lowercase display name, as shown in instructions.
    pub fn label(&self) -> &'static str {
        match self {
            StructureType::Settlement => "settlement",
            StructureType::City => "city",
            StructureType::Road => "road",
            StructureType::DevCard => "devCard",
        }
    }
}

/// A hand of resources.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceHand {
    pub brick: u32,
    pub wood: u32,
    pub sheep: u32,
    pub wheat: u32,
    pub ore: u32,
}

impl ResourceHand {
    /// Create an empty hand.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a hand with specific amounts.
    pub fn with_amounts(brick: u32, wood: u32, sheep: u32, wheat: u32, ore: u32) -> Self {
        Self {
            brick,
            wood,
            sheep,
            wheat,
            ore,
        }
    }

    /// The hand each player starts with; exactly funds the two settlements
    /// and two roads of initial placement.
    pub fn starting() -> Self {
        Self::with_amounts(4, 4, 2, 2, 0)
    }

    /// Total number of resource cards.
    pub fn total(&self) -> u32 {
        self.brick + self.wood + self.sheep + self.wheat + self.ore
    }

    /// Count of a specific resource.
    pub fn get(&self, resource: Resource) -> u32 {
        match resource {
            Resource::Brick => self.brick,
            Resource::Wood => self.wood,
            Resource::Sheep => self.sheep,
            Resource::Wheat => self.wheat,
            Resource::Ore => self.ore,
        }
    }

    /// Add resources to the hand.
    pub fn add(&mut self, resource: Resource, amount: u32) {
        match resource {
            Resource::Brick => self.brick += amount,
            Resource::Wood => self.wood += amount,
            Resource::Sheep => self.sheep += amount,
            Resource::Wheat => self.wheat += amount,
            Resource::Ore => self.ore += amount,
        }
    }

    /// Remove resources from the hand. Callers check affordability first.
    pub fn remove(&mut self, resource: Resource, amount: u32) {
        debug_assert!(self.get(resource) >= amount, "removing more than held");
        match resource {
            Resource::Brick => self.brick -= amount,
            Resource::Wood => self.wood -= amount,
            Resource::Sheep => self.sheep -= amount,
            Resource::Wheat => self.wheat -= amount,
            Resource::Ore => self.ore -= amount,
        }
    }

    /// Whether this hand covers a cost.
    pub fn can_afford(&self, cost: &ResourceHand) -> bool {
        self.brick >= cost.brick
            && self.wood >= cost.wood
            && self.sheep >= cost.sheep
            && self.wheat >= cost.wheat
            && self.ore >= cost.ore
    }

    /// Subtract a cost. Callers check `can_afford` first.
    pub fn subtract(&mut self, cost: &ResourceHand) {
        debug_assert!(self.can_afford(cost), "subtracting an unaffordable cost");
        self.brick -= cost.brick;
        self.wood -= cost.wood;
        self.sheep -= cost.sheep;
        self.wheat -= cost.wheat;
        self.ore -= cost.ore;
    }
}

/// A settlement, or the city it was upgraded into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Building {
    pub location: GridCoord,
    pub is_city: bool,
}

/// A single player's state.
#[derive(Debug, Clone)]
pub struct Player {
    /// Index into the game's player list
    pub index: PlayerId,
    /// Display name
    pub name: String,
    /// Color for rendering; never transmitted
    pub color: PlayerColor,
    /// Settlements and cities, in placement order
    pub buildings: Vec<Building>,
    /// Roads, stored as edge midpoints
    pub roads: Vec<GridCoord>,
    /// Current resources
    pub resources: ResourceHand,
    /// Playable development cards
    pub dev_cards_unused: Vec<DevCardKind>,
    /// Played cards plus point cards (which score from here)
    pub dev_cards_used: Vec<DevCardKind>,
}

impl Player {
    /// Create a new player with the starting hand.
    pub fn new(index: PlayerId, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
            color: PlayerColor::for_player(index),
            buildings: Vec::new(),
            roads: Vec::new(),
            resources: ResourceHand::starting(),
            dev_cards_unused: Vec::new(),
            dev_cards_used: Vec::new(),
        }
    }

    /// Total victory points: 1 per settlement, 2 per city, plus used point
    /// cards. Longest road and largest army are not scored.
    pub fn victory_points(&self) -> u32 {
        let building_points: u32 = self
            .buildings
            .iter()
            .map(|b| if b.is_city { 2 } else { 1 })
            .sum();
        let card_points: u32 = self.dev_cards_used.iter().map(|c| c.point_value()).sum();
        building_points + card_points
    }

    /// Whether this player can afford a structure.
    pub fn can_build(&self, structure: StructureType) -> bool {
        self.resources.can_afford(&structure.cost())
    }

    /// Pay for a structure.
    pub fn deduct_resources(&mut self, structure: StructureType) {
        self.resources.subtract(&structure.cost());
    }

    /// Place a settlement at a vertex. Fails silently if the spot is taken.
    pub fn build_settlement(&mut self, coord: GridCoord, board: &mut Board) -> bool {
        if board.is_occupied(coord) {
            debug!(player = self.index, ?coord, "settlement spot already taken");
            return false;
        }

        self.deduct_resources(StructureType::Settlement);
        self.buildings.push(Building {
            location: coord,
            is_city: false,
        });
        board.occupy_vertex(coord, self.index);
        true
    }

    /// Upgrade one of this player's settlements to a city. Fails silently
    /// if there is no settlement here or it is already a city.
    pub fn build_city(&mut self, coord: GridCoord) -> bool {
        for building in &mut self.buildings {
            if building.location == coord {
                if building.is_city {
                    debug!(player = self.index, ?coord, "already a city");
                    return false;
                }
                self.resources.subtract(&StructureType::City.cost());
                building.is_city = true;
                return true;
            }
        }
        debug!(player = self.index, ?coord, "no settlement here to upgrade");
        false
    }

    /// Place a road at an edge midpoint. Fails silently if the edge is taken.
    pub fn build_road(&mut self, midpoint: GridCoord, board: &mut Board) -> bool {
        if board.is_occupied(midpoint) {
            debug!(player = self.index, ?midpoint, "road spot already taken");
            return false;
        }

        self.deduct_resources(StructureType::Road);
        self.roads.push(midpoint);
        board.occupy_edge(midpoint, self.index);
        true
    }

    /// Buy a development card with a provided RNG. Point cards land in the
    /// used pile immediately; everything else waits in the unused pile.
    pub fn buy_dev_card_with_rng<R: Rng>(&mut self, rng: &mut R) {
        let card = DevCardKind::random(rng);
        if card.is_usable() {
            self.dev_cards_unused.push(card);
        } else {
            self.dev_cards_used.push(card);
        }
        self.deduct_resources(StructureType::DevCard);
    }

    /// Buy a development card.
    pub fn buy_dev_card(&mut self) {
        let mut rng = rand::thread_rng();
        self.buy_dev_card_with_rng(&mut rng);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_board() -> Board {
        let mut rng = StdRng::seed_from_u64(7);
        Board::new_with_rng(&mut rng)
    }

    #[test]
    fn test_starting_hand() {
        let player = Player::new(0, "Player 1");
        assert_eq!(player.resources, ResourceHand::with_amounts(4, 4, 2, 2, 0));
        // Exactly two settlements and two roads
        let setup_cost = StructureType::Settlement.cost().total() * 2
            + StructureType::Road.cost().total() * 2;
        assert_eq!(player.resources.total(), setup_cost);
    }

    #[test]
    fn test_structure_costs() {
        assert_eq!(StructureType::Settlement.cost().total(), 4);
        assert_eq!(StructureType::City.cost(), ResourceHand::with_amounts(0, 0, 0, 2, 3));
        assert_eq!(StructureType::Road.cost().total(), 2);
        assert_eq!(StructureType::DevCard.cost().total(), 3);
    }

    #[test]
    fn test_build_settlement_occupies_vertex() {
        let mut board = seeded_board();
        let mut player = Player::new(0, "Player 1");
        let vertex = GridCoord::new(4.0, 4.0);

        assert!(player.build_settlement(vertex, &mut board));
        assert_eq!(player.buildings.len(), 1);
        assert_eq!(player.resources, ResourceHand::with_amounts(3, 3, 1, 1, 0));
        assert!(board.is_occupied(vertex));
    }

    #[test]
    fn test_build_settlement_rejects_occupied_spot() {
        let mut board = seeded_board();
        let mut a = Player::new(0, "Player 1");
        let mut b = Player::new(1, "Player 2");
        let vertex = GridCoord::new(4.0, 4.0);

        assert!(a.build_settlement(vertex, &mut board));
        let before = b.resources;
        assert!(!b.build_settlement(vertex, &mut board));
        assert_eq!(b.resources, before);
        assert!(b.buildings.is_empty());
        assert_eq!(board.occupant(vertex), Some(0));
    }

    #[test]
    fn test_build_city_upgrades_in_place() {
        let mut board = seeded_board();
        let mut player = Player::new(0, "Player 1");
        player.resources = ResourceHand::with_amounts(4, 4, 2, 4, 3);
        let vertex = GridCoord::new(4.0, 4.0);

        assert!(player.build_settlement(vertex, &mut board));
        assert!(player.build_city(vertex));
        assert_eq!(player.buildings.len(), 1);
        assert!(player.buildings[0].is_city);
        assert_eq!(player.victory_points(), 2);

        // A second upgrade at the same spot fails
        assert!(!player.build_city(vertex));
    }

    #[test]
    fn test_build_city_requires_settlement() {
        let mut player = Player::new(0, "Player 1");
        player.resources = ResourceHand::with_amounts(0, 0, 0, 2, 3);
        let before = player.resources;

        assert!(!player.build_city(GridCoord::new(4.0, 4.0)));
        assert_eq!(player.resources, before);
    }

    #[test]
    fn test_victory_points_formula() {
        let mut board = seeded_board();
        let mut player = Player::new(0, "Player 1");
        player.resources = ResourceHand::with_amounts(9, 9, 9, 9, 9);

        player.build_settlement(GridCoord::new(4.0, 4.0), &mut board);
        player.build_settlement(GridCoord::new(4.0, 2.0), &mut board);
        player.build_city(GridCoord::new(4.0, 2.0));
        player.dev_cards_used.push(DevCardKind::Point);
        player.dev_cards_used.push(DevCardKind::Knight);

        // settlement + city + point card; played knight is worth nothing
        assert_eq!(player.victory_points(), 1 + 2 + 1);
    }

    #[test]
    fn test_buy_dev_card_point_goes_to_used_pile() {
        let mut player = Player::new(0, "Player 1");
        player.resources = ResourceHand::with_amounts(0, 0, 50, 50, 50);
        let mut rng = StdRng::seed_from_u64(3);

        for _ in 0..50 {
            player.buy_dev_card_with_rng(&mut rng);
        }

        assert!(player.dev_cards_unused.iter().all(|c| c.is_usable()));
        assert!(player
            .dev_cards_used
            .iter()
            .all(|c| matches!(c, DevCardKind::Point)));
        assert_eq!(player.resources.total(), 0);
    }
}
