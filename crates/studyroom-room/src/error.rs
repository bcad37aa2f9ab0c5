//! Error types for the room layer.

use studyroom_protocol::{ProtocolError, RoomId, SessionId};
use studyroom_sim::SimError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room is full; no more participant slots available.
    #[error("room {0} is full")]
    RoomFull(RoomId),

    /// The participant already holds a seat in a room.
    #[error("session {0} already in room {1}")]
    AlreadyInRoom(SessionId, RoomId),

    /// The participant is not in any room (or not in this one).
    #[error("session {0} is not in a room")]
    NotInRoom(SessionId),

    /// The room has no floor cell left to spawn on.
    #[error("room {0} has no free spawn point")]
    NoSpawnPoint(RoomId),

    /// The room's command channel is full, closed, or did not answer in time.
    #[error("room {0} is unavailable")]
    Unavailable(RoomId),

    /// The simulation refused a lifecycle change.
    #[error(transparent)]
    Simulation(#[from] SimError),

    /// A state patch could not be encoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RoomError {
    /// HTTP-style status reported to the client in `SystemMessage::Error`.
    pub fn code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::NotInRoom(_) | Self::Protocol(_) => 400,
            Self::RoomFull(_)
            | Self::AlreadyInRoom(..)
            | Self::NoSpawnPoint(_)
            | Self::Unavailable(_)
            | Self::Simulation(_) => 409,
        }
    }
}
