//! Room simulation for Study Room.
//!
//! Pure logic, no I/O: the procedural [`layout`] of a room, the
//! [`Simulation`] that owns its players, enforces movement rules and answers
//! staff [`Role`] interactions with the service fixtures, and the
//! wire [`schema`] that turns room state into patches.
//!
//! The server runs one `Simulation` per room. Offline harnesses and tests
//! can run the exact same rules:
//!
//! ```rust
//! use studyroom_sim::{Command, Direction, Simulation, layout};
//!
//! let mut sim = Simulation::from_grid(layout::skeleton(20, 15));
//! sim.add_player("a", "#0000FF", (5, 5)).unwrap();
//! sim.apply("a", &Command::step(Direction::Right));
//! assert_eq!(sim.player("a").unwrap().position(), (6, 5));
//! ```

mod error;
mod grid;
mod interact;
pub mod layout;
mod model;
mod player;
pub mod schema;
mod tile;

pub use error::SimError;
pub use grid::Grid;
pub use interact::{Interaction, Role};
pub use model::{Command, MoveOutcome, RoomState, Simulation};
pub use player::{Action, Direction, Player};
pub use tile::{Tile, TileKind};
