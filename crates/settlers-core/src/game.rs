//! The game phase state machine.
//!
//! All play flows through two entry points: `handle_click` for board clicks
//! and `handle_command` for key commands. What either one does depends
//! entirely on the current phase. Invalid input is rejected silently: a
//! debug log line, no state change, no error surfaced to the caller.

use crate::board::{Board, Resource};
use crate::coord::GridCoord;
use crate::devcard::DevCardKind;
use crate::player::{Player, StructureType};
use rand::Rng;
use std::fmt;
use tracing::{debug, warn};

/// Prompt shown whenever it's time to choose an action.
pub const ACT_INSTRUCTION: &str = "Take your next action (s,c,r,d,t), or Enter to pass";

/// Digit legend appended to every resource-picking prompt.
pub const RESOURCE_CHOICE_NUMBERS: &str = "1=brick, 2=wood, 3=sheep, 4=wheat, 5=ore";

/// The phases a game moves through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Phase {
    /// Snake-order placement of two settlements and two roads each
    InitialPlacement,
    /// Momentary phase while dice resolve
    Rolling,
    /// Current player chooses an action
    Acting,
    /// Waiting for a click to place a pending structure
    Building,
    /// Waiting for a digit choosing what to trade in
    Trading,
    /// A 7 was rolled or a knight played
    Robber,
    /// Waiting for digit(s) choosing resources to receive
    PickResources,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::InitialPlacement => "initialPlacement",
            Phase::Rolling => "rolling",
            Phase::Acting => "acting",
            Phase::Building => "building",
            Phase::Trading => "trading",
            Phase::Robber => "robber",
            Phase::PickResources => "pickResources",
        })
    }
}

/// A key command from the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// A digit 0-9, or 10-19 with shift held
    Digit(u8),
    /// Pass the turn
    Enter,
    /// Cancel a building or trading phase
    Escape,
    /// `s`: start placing a settlement
    Settlement,
    /// `c`: start upgrading to a city
    City,
    /// `r`: start placing a road
    Road,
    /// `d`: buy a development card
    DevCard,
    /// `f`: pick one free resource
    Freebie,
    /// `t`: start a 3:1 bank trade
    Trade,
}

fn resource_from_digit(n: u8) -> Option<Resource> {
    match n {
        1 => Some(Resource::Brick),
        2 => Some(Resource::Wood),
        3 => Some(Resource::Sheep),
        4 => Some(Resource::Wheat),
        5 => Some(Resource::Ore),
        _ => None,
    }
}

/// The complete state of one game.
#[derive(Debug, Clone)]
pub struct Game {
    pub board: Board,
    pub players: Vec<Player>,
    /// Index of the player whose turn it is
    pub whose_turn: usize,
    /// Banner text telling the current player what to do
    pub instructions: String,
    pub phase: Phase,
    /// The structure a building-phase click will place
    pub pending_build: Option<StructureType>,
    /// Resources still to be picked in the pick-resources phase
    pub cards_to_draw: u32,
}

impl Game {
    /// Create a standard three-player game on a fresh random board.
    pub fn new() -> Self {
        Self::with_board(Board::new(), 3)
    }

    /// Create a game on a given board, e.g. a deterministically generated one.
    pub fn with_board(board: Board, num_players: usize) -> Self {
        let players = (0..num_players)
            .map(|i| Player::new(i, format!("Player {}", i + 1)))
            .collect();

        let mut game = Self {
            board,
            players,
            whose_turn: 0,
            instructions: String::new(),
            phase: Phase::InitialPlacement,
            pending_build: None,
            cards_to_draw: 0,
        };
        game.start_initial_placements();
        game
    }

    /// The player whose turn it is.
    pub fn current_player(&self) -> &Player {
        &self.players[self.whose_turn]
    }

    pub fn set_instructions(&mut self, text: impl Into<String>) {
        self.instructions = text.into();
    }

    fn start_initial_placements(&mut self) {
        self.set_instructions("place your first settlement");
        self.phase = Phase::InitialPlacement;
    }

    /// There is no robber piece; rolling a 7 or playing a knight grants a
    /// replacement resource pick instead of blocking a tile.
    fn start_robber_phase(&mut self, prefix: &str) {
        self.set_instructions(format!(
            "{prefix} Robber is out at sea; pick a resource instead!"
        ));
        self.phase = Phase::Robber;

        self.start_pick_resources_phase(1);
    }

    /// Begin placing a structure, or buy a dev card outright.
    pub fn start_build_phase(&mut self, structure: StructureType) {
        if !self.current_player().can_build(structure) {
            debug!(player = self.whose_turn, ?structure, "no can do'sville, babydoll!");
            self.phase = Phase::Acting;
            self.set_instructions(ACT_INSTRUCTION);
            return;
        }
        if structure == StructureType::DevCard {
            self.players[self.whose_turn].buy_dev_card();
        } else {
            self.set_instructions(format!("click to place your {}", structure.label()));
            self.phase = Phase::Building;
            self.pending_build = Some(structure);
        }
    }

    /// Begin a 3:1 trade with the bank. Requires three of some resource.
    pub fn start_trading_phase(&mut self) {
        let resources = &self.current_player().resources;
        if Resource::ALL.iter().all(|&r| resources.get(r) < 3) {
            debug!(player = self.whose_turn, "need three of something to trade");
            return;
        }

        self.phase = Phase::Trading;
        self.set_instructions(format!(
            "What do you want to trade in? {RESOURCE_CHOICE_NUMBERS}"
        ));
    }

    /// Turn in three of the chosen resource; the return pick follows.
    pub fn handle_trade_in_choice(&mut self, n: u8) {
        let Some(resource) = resource_from_digit(n) else {
            debug!(n, "not a resource digit");
            return;
        };

        if self.current_player().resources.get(resource) < 3 {
            debug!(player = self.whose_turn, resource = resource.name(), "need three to trade in");
            return;
        }

        self.players[self.whose_turn].resources.remove(resource, 3);
        self.set_instructions(format!(
            "Traded in 3 {}. What do you want in return?",
            resource.name()
        ));
        self.start_pick_resources_phase(1);
    }

    /// Enter the pick-resources phase, owing `num_cards` picks.
    pub fn start_pick_resources_phase(&mut self, num_cards: u32) {
        self.phase = Phase::PickResources;
        self.set_instructions(format!("{} {RESOURCE_CHOICE_NUMBERS}", self.instructions));
        self.cards_to_draw = num_cards;
    }

    /// Grant one picked resource and count down the picks owed.
    pub fn handle_resource_choice(&mut self, n: u8) {
        let Some(resource) = resource_from_digit(n) else {
            debug!(n, "not a resource digit");
            return;
        };

        self.players[self.whose_turn].resources.add(resource, 1);
        self.cards_to_draw = self.cards_to_draw.saturating_sub(1);

        let summary = format!("you selected {}. ", resource.name());
        if self.cards_to_draw > 0 {
            let remaining = self.cards_to_draw;
            self.set_instructions(format!("{summary}Select {remaining} more!"));
            self.start_pick_resources_phase(remaining);
        } else {
            self.phase = Phase::Acting;
            self.set_instructions(format!("{summary}{ACT_INSTRUCTION}"));
        }
    }

    /// Snake-order placement: alternate settlement and road per player,
    /// forward through the seats for the first pair, then backward for the
    /// second. Victory points double as the progress counter.
    fn handle_setup_click(&mut self, coord: GridCoord) {
        let whose = self.whose_turn;
        let player = &self.players[whose];

        // Equal counts mean it's time for a settlement, else a road
        if player.buildings.len() == player.roads.len() {
            let snapped = coord.snapped_to_vertex_grid();
            if !self.board.is_vertex(snapped) || !snapped.is_very_close_to(&coord) {
                debug!("did not click a vertex, doing nothing");
                return;
            }

            if !self.players[whose].build_settlement(snapped, &mut self.board) {
                return;
            }

            // The second settlement comes with one resource per adjacent tile
            if self.players[whose].victory_points() >= 2 {
                let grants: Vec<Resource> = self
                    .board
                    .adjacent_tiles(snapped)
                    .iter()
                    .filter_map(|tile| tile.kind.resource())
                    .collect();
                for resource in grants {
                    self.players[whose].resources.add(resource, 1);
                }
            }

            self.set_instructions("place your road");
        } else {
            let snapped = coord.snapped_to_midpoint_grid();
            if !self.board.is_edge_midpoint(snapped) || !snapped.is_very_close_to(&coord) {
                debug!("did not click an edge, doing nothing");
                return;
            }

            if !self.players[whose].build_road(snapped, &mut self.board) {
                return;
            }

            if self.players[0].victory_points() >= 2 {
                // Player 0 placed their second pair last; setup is done
                self.roll_dice(None);
            } else if self.players[whose].victory_points() >= 2 {
                self.whose_turn -= 1;
                self.set_instructions("place your second settlement");
            } else if self.whose_turn == self.players.len() - 1 {
                self.set_instructions("place your second settlement");
            } else {
                self.whose_turn += 1;
                self.set_instructions("place your first settlement");
            }
        }
    }

    /// Place whatever `start_build_phase` armed, if the click lands cleanly.
    fn handle_build_click(&mut self, coord: GridCoord) {
        let whose = self.whose_turn;

        let success = match self.pending_build {
            Some(StructureType::Settlement) => {
                let snapped = coord.snapped_to_vertex_grid();
                if !self.board.is_vertex(snapped) || !snapped.is_very_close_to(&coord) {
                    debug!("did not click a vertex, doing nothing");
                    return;
                }
                self.players[whose].build_settlement(snapped, &mut self.board)
            }
            Some(StructureType::City) => {
                let snapped = coord.snapped_to_vertex_grid();
                if !self.board.is_vertex(snapped) || !snapped.is_very_close_to(&coord) {
                    debug!("did not click a vertex, doing nothing");
                    return;
                }
                self.players[whose].build_city(snapped)
            }
            Some(StructureType::Road) => {
                let snapped = coord.snapped_to_midpoint_grid();
                if !self.board.is_edge_midpoint(snapped) || !snapped.is_very_close_to(&coord) {
                    debug!("did not click an edge, doing nothing");
                    return;
                }
                self.players[whose].build_road(snapped, &mut self.board)
            }
            _ => false,
        };

        if success {
            self.phase = Phase::Acting;
            self.set_instructions(ACT_INSTRUCTION);
        }
    }

    /// Route a board click according to the current phase.
    pub fn handle_click(&mut self, coord: GridCoord) {
        match self.phase {
            Phase::InitialPlacement => self.handle_setup_click(coord),
            Phase::Acting => debug!("action clicks not supported yet"),
            Phase::Building => self.handle_build_click(coord),
            _ => debug!(phase = %self.phase, "clicked during this phase, doing nothing"),
        }
    }

    /// Pass the turn to the next player and roll for them.
    pub fn next_player_turn(&mut self) {
        self.whose_turn = (self.whose_turn + 1) % self.players.len();
        self.roll_dice(None);
    }

    /// Roll two dice (or take a forced total) and resolve production.
    pub fn roll_dice(&mut self, forced: Option<u8>) {
        self.phase = Phase::Rolling;

        let number = forced.unwrap_or_else(|| {
            let mut rng = rand::thread_rng();
            rng.gen_range(1..=6) + rng.gen_range(1..=6)
        });

        if number == 7 {
            self.start_robber_phase("you rolled a 7!");
        } else {
            self.set_instructions(format!("you rolled: {number}. {ACT_INSTRUCTION}"));
            self.collect_resources(number);
            self.phase = Phase::Acting;
        }
    }

    /// Every player collects from every building adjacent to a tile with
    /// the rolled number. Cities collect double.
    fn collect_resources(&mut self, number: u8) {
        for player in &mut self.players {
            let mut grants: Vec<(Resource, u32)> = Vec::new();
            for building in &player.buildings {
                for tile in self.board.adjacent_tiles(building.location) {
                    if tile.number != Some(number) {
                        continue;
                    }
                    if let Some(resource) = tile.kind.resource() {
                        grants.push((resource, if building.is_city { 2 } else { 1 }));
                    }
                }
            }
            for (resource, amount) in grants {
                player.resources.add(resource, amount);
            }
        }
    }

    /// Play the Nth unplayed dev card (1-based, as typed).
    pub fn use_dev_card(&mut self, number_input: u8) {
        if number_input == 0 {
            debug!("0 not an unplayed dev card?");
            return;
        }
        let index = (number_input - 1) as usize;
        if index >= self.current_player().dev_cards_unused.len() {
            debug!(number_input, "not an unplayed dev card?");
            return;
        }

        let card = self.players[self.whose_turn].dev_cards_unused.remove(index);
        self.players[self.whose_turn].dev_cards_used.push(card);

        match card {
            DevCardKind::Knight => self.start_robber_phase("you played a Knight!"),
            DevCardKind::Yop => {
                self.set_instructions("you played a YOP! Pick 2 resources.");
                self.start_pick_resources_phase(2);
            }
            DevCardKind::Monopoly => warn!("haven't programmed monopoly cards yet!"),
            DevCardKind::RoadBuilding => warn!("haven't programmed road building cards yet!"),
            DevCardKind::Point => debug!("point cards don't need to/cannot be used"),
        }
    }

    fn handle_digit(&mut self, n: u8) {
        match self.phase {
            Phase::PickResources if (1..=5).contains(&n) => self.handle_resource_choice(n),
            Phase::Trading if (1..=5).contains(&n) => self.handle_trade_in_choice(n),
            Phase::Acting => self.use_dev_card(n),
            _ => debug!(n, phase = %self.phase, "digit has no meaning in this phase"),
        }
    }

    /// Route a key command according to the current phase.
    pub fn handle_command(&mut self, command: Command) {
        if self.phase == Phase::InitialPlacement {
            debug!("no doing stuff in setup phase!");
            return;
        }

        if let Command::Digit(n) = command {
            self.handle_digit(n);
            return;
        }

        match self.phase {
            Phase::Building | Phase::Trading => match command {
                Command::Escape => {
                    self.set_instructions(format!("canceled {}. {ACT_INSTRUCTION}", self.phase));
                    self.phase = Phase::Acting;
                }
                _ => debug!(?command, phase = %self.phase, "unused command in this phase"),
            },
            Phase::Acting => match command {
                Command::Enter => self.next_player_turn(),
                Command::Escape => self.phase = Phase::Acting,
                Command::Settlement => self.start_build_phase(StructureType::Settlement),
                Command::City => self.start_build_phase(StructureType::City),
                Command::Road => self.start_build_phase(StructureType::Road),
                Command::DevCard => self.start_build_phase(StructureType::DevCard),
                Command::Freebie => {
                    self.set_instructions("pick a freebie!");
                    self.start_pick_resources_phase(1);
                }
                Command::Trade => self.start_trading_phase(),
                Command::Digit(_) => {}
            },
            _ => debug!(?command, phase = %self.phase, "unused command in this phase"),
        }
    }
}

impl Default for Game {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::player::ResourceHand;
    use pretty_assertions::assert_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn seeded_game(num_players: usize) -> Game {
        let mut rng = StdRng::seed_from_u64(7);
        Game::with_board(Board::new_with_rng(&mut rng), num_players)
    }

    #[test]
    fn test_new_game_starts_in_setup() {
        let game = seeded_game(3);
        assert_eq!(game.phase, Phase::InitialPlacement);
        assert_eq!(game.whose_turn, 0);
        assert_eq!(game.instructions, "place your first settlement");
        assert_eq!(game.players.len(), 3);
    }

    #[test]
    fn test_commands_ignored_during_setup() {
        let mut game = seeded_game(3);
        game.handle_command(Command::Enter);
        game.handle_command(Command::Settlement);
        assert_eq!(game.phase, Phase::InitialPlacement);
        assert_eq!(game.whose_turn, 0);
    }

    #[test]
    fn test_setup_click_far_from_vertex_does_nothing() {
        let mut game = seeded_game(3);
        // A hex center is nowhere near a vertex
        game.handle_click(GridCoord::new(4.0, 3.0));
        assert!(game.players[0].buildings.is_empty());
        assert_eq!(game.instructions, "place your first settlement");
    }

    #[test]
    fn test_roll_seven_starts_robber_flow() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.roll_dice(Some(7));

        assert_eq!(game.phase, Phase::PickResources);
        assert_eq!(game.cards_to_draw, 1);
        assert!(game.instructions.contains("you rolled a 7!"));
        assert!(game
            .instructions
            .contains("Robber is out at sea; pick a resource instead!"));
        assert!(game.instructions.contains(RESOURCE_CHOICE_NUMBERS));
    }

    #[test]
    fn test_resource_choice_counts_down() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.set_instructions("you played a YOP! Pick 2 resources.");
        game.start_pick_resources_phase(2);

        let before = game.players[0].resources.sheep;
        game.handle_command(Command::Digit(3));
        assert_eq!(game.phase, Phase::PickResources);
        assert_eq!(game.cards_to_draw, 1);
        assert!(game.instructions.contains("you selected sheep. Select 1 more!"));

        game.handle_command(Command::Digit(3));
        assert_eq!(game.phase, Phase::Acting);
        assert_eq!(game.players[0].resources.sheep, before + 2);
        assert!(game.instructions.ends_with(ACT_INSTRUCTION));
    }

    #[test]
    fn test_trading_requires_three_of_something() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].resources = ResourceHand::with_amounts(2, 2, 2, 2, 2);

        game.handle_command(Command::Trade);
        assert_eq!(game.phase, Phase::Acting);

        game.players[0].resources = ResourceHand::with_amounts(3, 0, 0, 0, 0);
        game.handle_command(Command::Trade);
        assert_eq!(game.phase, Phase::Trading);
        assert!(game.instructions.starts_with("What do you want to trade in?"));
    }

    #[test]
    fn test_trade_in_deducts_three_and_grants_pick() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].resources = ResourceHand::with_amounts(4, 0, 0, 0, 0);

        game.handle_command(Command::Trade);
        game.handle_command(Command::Digit(1));
        assert_eq!(game.players[0].resources.brick, 1);
        assert_eq!(game.phase, Phase::PickResources);
        assert!(game.instructions.contains("Traded in 3 brick."));

        game.handle_command(Command::Digit(5));
        assert_eq!(game.players[0].resources.ore, 1);
        assert_eq!(game.phase, Phase::Acting);
    }

    #[test]
    fn test_trade_in_without_three_is_rejected() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].resources = ResourceHand::with_amounts(3, 2, 0, 0, 0);

        game.handle_command(Command::Trade);
        // Wood was never at three; the choice is refused and the phase stays
        game.handle_command(Command::Digit(2));
        assert_eq!(game.phase, Phase::Trading);
        assert_eq!(game.players[0].resources.wood, 2);
    }

    #[test]
    fn test_escape_cancels_building() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].resources = ResourceHand::with_amounts(5, 5, 5, 5, 5);

        game.handle_command(Command::Road);
        assert_eq!(game.phase, Phase::Building);
        assert_eq!(game.instructions, "click to place your road");

        game.handle_command(Command::Escape);
        assert_eq!(game.phase, Phase::Acting);
        assert!(game.instructions.starts_with("canceled building. "));
    }

    #[test]
    fn test_build_phase_rejected_when_broke() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].resources = ResourceHand::new();

        game.handle_command(Command::Settlement);
        assert_eq!(game.phase, Phase::Acting);
        assert_eq!(game.instructions, ACT_INSTRUCTION);
        assert_eq!(game.pending_build, None);
    }

    #[test]
    fn test_buy_dev_card_stays_in_acting() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].resources = ResourceHand::with_amounts(0, 0, 1, 1, 1);

        game.handle_command(Command::DevCard);
        assert_eq!(game.phase, Phase::Acting);
        assert_eq!(game.players[0].resources.total(), 0);
        let cards = game.players[0].dev_cards_unused.len() + game.players[0].dev_cards_used.len();
        assert_eq!(cards, 1);
    }

    #[test]
    fn test_freebie_grants_one_pick() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;

        game.handle_command(Command::Freebie);
        assert_eq!(game.phase, Phase::PickResources);
        assert_eq!(game.cards_to_draw, 1);
        assert!(game.instructions.starts_with("pick a freebie!"));
    }

    #[test]
    fn test_use_dev_card_knight() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].dev_cards_unused.push(DevCardKind::Knight);

        game.handle_command(Command::Digit(1));
        assert!(game.players[0].dev_cards_unused.is_empty());
        assert_eq!(game.players[0].dev_cards_used, vec![DevCardKind::Knight]);
        assert_eq!(game.phase, Phase::PickResources);
        assert!(game.instructions.contains("you played a Knight!"));
    }

    #[test]
    fn test_use_dev_card_yop_grants_two() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].dev_cards_unused.push(DevCardKind::Yop);

        game.handle_command(Command::Digit(1));
        assert_eq!(game.phase, Phase::PickResources);
        assert_eq!(game.cards_to_draw, 2);
        assert!(game.instructions.contains("you played a YOP! Pick 2 resources."));
    }

    #[test]
    fn test_use_dev_card_bad_index_is_ignored() {
        let mut game = seeded_game(3);
        game.phase = Phase::Acting;
        game.players[0].dev_cards_unused.push(DevCardKind::Yop);

        game.handle_command(Command::Digit(0));
        game.handle_command(Command::Digit(2));
        assert_eq!(game.players[0].dev_cards_unused.len(), 1);
        assert_eq!(game.phase, Phase::Acting);
    }

    #[test]
    fn test_city_doubles_production() {
        let mut game = seeded_game(2);
        game.phase = Phase::Acting;

        // Find a vertex whose adjacent tiles produce on exactly one number
        let vertex = GridCoord::new(4.0, 4.0);
        let tiles = game.board.adjacent_tiles(vertex);
        let (number, resource) = tiles
            .iter()
            .find_map(|t| t.number.map(|n| (n, t.kind.resource().unwrap())))
            .unwrap();
        let multiplicity = tiles
            .iter()
            .filter(|t| t.number == Some(number) && t.kind.resource() == Some(resource))
            .count() as u32;

        game.players[0].resources = ResourceHand::with_amounts(9, 9, 9, 9, 9);
        assert!(game.players[0].build_settlement(vertex, &mut game.board));

        let before = game.players[0].resources.get(resource);
        game.roll_dice(Some(number));
        assert_eq!(
            game.players[0].resources.get(resource),
            before + multiplicity
        );

        assert!(game.players[0].build_city(vertex));
        let before = game.players[0].resources.get(resource);
        game.roll_dice(Some(number));
        assert_eq!(
            game.players[0].resources.get(resource),
            before + 2 * multiplicity
        );
    }
}
