//! Authoritative rooms for Study Room.
//!
//! Each room runs as an isolated Tokio task (actor) that owns one
//! [`Simulation`](studyroom_sim::Simulation) and streams every change to its
//! participants as state patches.
//!
//! # Key types
//!
//! - [`RoomManager`]: creates/destroys rooms, routes sessions
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomConfig`]: dimensions, capacity, disposal

mod config;
mod error;
mod manager;
mod room;

pub use config::{MIN_DIMENSION, RoomConfig};
pub use error::RoomError;
pub use manager::RoomManager;
pub use room::{PlayerSender, RoomHandle, RoomInfo};
