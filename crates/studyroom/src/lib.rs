//! # Study Room
//!
//! Authoritative server for a shared, tile-based room.
//!
//! Clients connect over WebSocket, join a room by name and send movement
//! commands. Each room runs as its own actor that owns the simulation and
//! streams every change back as a state patch.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use studyroom::prelude::*;
//!
//! # async fn demo() -> Result<(), StudyRoomError> {
//! studyroom::init_tracing("info");
//! let server = ServerBuilder::new().bind("0.0.0.0:8080").build().await?;
//! server.run().await
//! # }
//! ```

mod error;
mod handler;
mod server;

pub use error::StudyRoomError;
pub use server::{ServerBuilder, StudyRoomServer};

/// Installs a `tracing` subscriber that honours `RUST_LOG`, falling back
/// to `default_filter` (e.g. `"info"` or `"studyroom=debug"`).
///
/// Safe to call more than once; later calls are ignored.
pub fn init_tracing(default_filter: &str) {
    use tracing_subscriber::EnvFilter;

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Common imports for running a server or writing a client against it.
pub mod prelude {
    pub use crate::{ServerBuilder, StudyRoomError, StudyRoomServer};
    pub use studyroom_protocol::{
        Codec, Envelope, JoinOptions, JsonCodec, PROTOCOL_VERSION, Payload, RoomId,
        RoomListEntry, SessionId, StatePatch, SystemMessage,
    };
    pub use studyroom_room::{RoomConfig, RoomError};
    pub use studyroom_sim::{Command, Direction, RoomState, Simulation, TileKind};
}
