//! The authoritative room state machine.

use std::collections::BTreeMap;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::{Action, Direction, Grid, Interaction, Player, Role, SimError, TileKind, layout};

/// Everything one room synchronizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomState {
    pub width_units: u32,
    pub height_units: u32,
    pub grid: Grid,
    /// Keyed by player id; iteration order carries no meaning.
    pub players: BTreeMap<String, Player>,
}

/// A discrete intent sent by a participant.
///
/// Wire form: `{"kind":"move","dx":1,"dy":0,"direction":"right"}` or
/// `{"kind":"stop"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Command {
    Move {
        dx: i32,
        dy: i32,
        direction: Direction,
    },
    Stop,
}

impl Command {
    /// A single step in `direction`.
    pub fn step(direction: Direction) -> Self {
        let (dx, dy) = direction.delta();
        Self::Move { dx, dy, direction }
    }
}

/// What [`Simulation::apply_move`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Position committed, player now walking.
    Moved,
    /// Destination not walkable; only the direction changed.
    Blocked,
    /// No such player; nothing changed.
    UnknownPlayer,
    /// Delta outside `{-1, 0, 1}`; nothing changed.
    Rejected,
}

/// Owns a [`RoomState`] and is the only writer of player positions.
///
/// Invariant: every player stands on a walkable tile.
#[derive(Debug, Clone)]
pub struct Simulation {
    state: RoomState,
}

impl Simulation {
    /// A room with a freshly generated layout.
    pub fn new(width: u32, height: u32) -> Self {
        Self::from_grid(layout::generate(width, height))
    }

    /// A room whose layout decor is drawn from `rng`.
    pub fn with_rng<R: Rng>(width: u32, height: u32, rng: &mut R) -> Self {
        Self::from_grid(layout::generate_with(width, height, rng))
    }

    /// A room over an existing grid, e.g. a fixed skeleton in tests.
    pub fn from_grid(grid: Grid) -> Self {
        Self {
            state: RoomState {
                width_units: grid.width(),
                height_units: grid.height(),
                grid,
                players: BTreeMap::new(),
            },
        }
    }

    pub fn state(&self) -> &RoomState {
        &self.state
    }

    pub fn grid(&self) -> &Grid {
        &self.state.grid
    }

    pub fn player(&self, id: &str) -> Option<&Player> {
        self.state.players.get(id)
    }

    pub fn player_count(&self) -> usize {
        self.state.players.len()
    }

    /// In bounds, and the tile is floor or a seat.
    pub fn is_walkable(&self, x: i32, y: i32) -> bool {
        self.state
            .grid
            .kind_at(x, y)
            .is_some_and(TileKind::is_walkable)
    }

    /// What `role` gets from the tile at `(x, y)`. Changes nothing.
    pub fn interaction(&self, x: i32, y: i32, role: Role) -> Interaction {
        Interaction::with(self.state.grid.kind_at(x, y), role)
    }

    /// Moves a player one step.
    ///
    /// On a walkable destination the position is committed and the player
    /// starts walking. Otherwise the player turns to `direction` in place
    /// and keeps its current action. Never fails.
    pub fn apply_move(&mut self, id: &str, dx: i32, dy: i32, direction: Direction) -> MoveOutcome {
        if !(-1..=1).contains(&dx) || !(-1..=1).contains(&dy) {
            tracing::debug!(player = id, dx, dy, "rejected oversized move");
            return MoveOutcome::Rejected;
        }
        let Some((x, y)) = self.player(id).map(|p| (p.x + dx, p.y + dy)) else {
            return MoveOutcome::UnknownPlayer;
        };
        let walkable = self.is_walkable(x, y);
        let Some(player) = self.state.players.get_mut(id) else {
            return MoveOutcome::UnknownPlayer;
        };

        player.direction = direction;
        if walkable {
            player.x = x;
            player.y = y;
            player.action = Action::Walk;
            MoveOutcome::Moved
        } else {
            MoveOutcome::Blocked
        }
    }

    /// Sets the player idle. Returns `false` for an unknown id.
    pub fn apply_stop(&mut self, id: &str) -> bool {
        match self.state.players.get_mut(id) {
            Some(player) => {
                player.action = Action::Idle;
                true
            }
            None => false,
        }
    }

    /// Dispatches a decoded command.
    pub fn apply(&mut self, id: &str, command: &Command) {
        match *command {
            Command::Move { dx, dy, direction } => {
                self.apply_move(id, dx, dy, direction);
            }
            Command::Stop => {
                self.apply_stop(id);
            }
        }
    }

    /// Adds a player at `spawn`.
    ///
    /// # Errors
    /// [`SimError::DuplicatePlayer`] if the id is taken,
    /// [`SimError::SpawnNotWalkable`] if the spawn cell cannot hold a player.
    pub fn add_player(
        &mut self,
        id: impl Into<String>,
        color: impl Into<String>,
        spawn: (i32, i32),
    ) -> Result<&Player, SimError> {
        let id = id.into();
        if self.state.players.contains_key(&id) {
            return Err(SimError::DuplicatePlayer(id));
        }
        let (x, y) = spawn;
        if !self.is_walkable(x, y) {
            return Err(SimError::SpawnNotWalkable { x, y });
        }
        let player = Player::new(id.clone(), color, x, y);
        Ok(self.state.players.entry(id).or_insert(player))
    }

    pub fn remove_player(&mut self, id: &str) -> Option<Player> {
        self.state.players.remove(id)
    }

    /// A uniformly random bare-floor cell, `None` if the room has none.
    pub fn random_spawn<R: Rng>(&self, rng: &mut R) -> Option<(i32, i32)> {
        let width = self.state.grid.width() as usize;
        let floors: Vec<usize> = self
            .state
            .grid
            .tiles()
            .iter()
            .enumerate()
            .filter(|(_, t)| t.kind == TileKind::Floor)
            .map(|(i, _)| i)
            .collect();
        if floors.is_empty() {
            return None;
        }
        let index = floors[rng.random_range(0..floors.len())];
        Some(((index % width) as i32, (index / width) as i32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::skeleton;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn room() -> Simulation {
        Simulation::from_grid(skeleton(20, 15))
    }

    #[test]
    fn test_is_walkable_checks_bounds_and_kind() {
        let sim = room();
        assert!(sim.is_walkable(5, 5));
        assert!(!sim.is_walkable(0, 5), "border wall");
        assert!(!sim.is_walkable(5, 2), "counter");
        assert!(!sim.is_walkable(-1, 5));
        assert!(!sim.is_walkable(20, 5));
    }

    #[test]
    fn test_move_onto_floor_commits() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();

        let outcome = sim.apply_move("a", 1, 0, Direction::Right);

        assert_eq!(outcome, MoveOutcome::Moved);
        let a = sim.player("a").unwrap();
        assert_eq!(a.position(), (6, 5));
        assert_eq!(a.action, Action::Walk);
        assert_eq!(a.direction, Direction::Right);
    }

    #[test]
    fn test_blocked_move_turns_in_place() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 3)).unwrap();

        let outcome = sim.apply_move("a", 0, -1, Direction::Up);

        assert_eq!(outcome, MoveOutcome::Blocked);
        let a = sim.player("a").unwrap();
        assert_eq!(a.position(), (5, 3));
        assert_eq!(a.direction, Direction::Up);
        assert_eq!(a.action, Action::Idle, "action unchanged");
    }

    #[test]
    fn test_oversized_move_is_rejected() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();
        let before = sim.player("a").cloned();

        assert_eq!(sim.apply_move("a", 2, 0, Direction::Left), MoveOutcome::Rejected);
        assert_eq!(sim.player("a").cloned(), before);
    }

    #[test]
    fn test_unknown_player_is_ignored() {
        let mut sim = room();
        let before = sim.state().clone();

        assert_eq!(sim.apply_move("ghost", 1, 0, Direction::Right), MoveOutcome::UnknownPlayer);
        assert!(!sim.apply_stop("ghost"));
        assert_eq!(sim.state(), &before);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();
        sim.apply("a", &Command::step(Direction::Down));

        sim.apply("a", &Command::Stop);
        let once = sim.state().clone();
        sim.apply("a", &Command::Stop);

        assert_eq!(sim.state(), &once);
        assert_eq!(sim.player("a").unwrap().action, Action::Idle);
    }

    #[test]
    fn test_players_may_overlap() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();
        sim.add_player("b", "#FF0000", (7, 5)).unwrap();

        sim.apply_move("b", -1, 0, Direction::Left);
        sim.apply_move("a", 1, 0, Direction::Right);

        assert_eq!(sim.player("a").unwrap().position(), (6, 5));
        assert_eq!(sim.player("b").unwrap().position(), (6, 5));
    }

    #[test]
    fn test_add_player_refuses_duplicates_and_walls() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();

        assert_eq!(
            sim.add_player("a", "#0000FF", (6, 5)).unwrap_err(),
            SimError::DuplicatePlayer("a".into())
        );
        assert_eq!(
            sim.add_player("b", "#0000FF", (0, 0)).unwrap_err(),
            SimError::SpawnNotWalkable { x: 0, y: 0 }
        );
        assert_eq!(sim.player_count(), 1);
    }

    #[test]
    fn test_remove_player() {
        let mut sim = room();
        sim.add_player("a", "#0000FF", (5, 5)).unwrap();
        assert_eq!(sim.remove_player("a").map(|p| p.id), Some("a".into()));
        assert!(sim.remove_player("a").is_none());
    }

    #[test]
    fn test_random_spawn_is_always_floor() {
        let mut rng = StdRng::seed_from_u64(3);
        let sim = Simulation::with_rng(20, 15, &mut rng);
        for _ in 0..100 {
            let (x, y) = sim.random_spawn(&mut rng).unwrap();
            assert_eq!(sim.grid().kind_at(x, y), Some(TileKind::Floor));
        }
    }

    #[test]
    fn test_random_spawn_none_without_floor() {
        let sim = Simulation::from_grid(skeleton(2, 2));
        assert!(sim.random_spawn(&mut StdRng::seed_from_u64(0)).is_none());
    }

    #[test]
    fn test_command_wire_form() {
        let json = serde_json::to_value(Command::step(Direction::Right)).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"kind": "move", "dx": 1, "dy": 0, "direction": "right"})
        );
        let stop: Command = serde_json::from_str(r#"{"kind":"stop"}"#).unwrap();
        assert_eq!(stop, Command::Stop);
    }
}
