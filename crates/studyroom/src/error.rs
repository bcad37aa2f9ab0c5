//! Unified error type for the Study Room server.

use studyroom_protocol::ProtocolError;
use studyroom_room::RoomError;
use studyroom_sim::SimError;
use studyroom_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant lets `?` convert sub-crate
/// errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum StudyRoomError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode, invalid message).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room-level error (full, not found, unavailable).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The simulation refused a change.
    #[error(transparent)]
    Simulation(#[from] SimError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use studyroom_protocol::RoomId;

    #[test]
    fn test_from_transport_error() {
        let err = TransportError::AcceptFailed(std::io::Error::other("gone"));
        let err: StudyRoomError = err.into();
        assert!(matches!(err, StudyRoomError::Transport(_)));
        assert!(err.to_string().contains("gone"));
    }

    #[test]
    fn test_from_protocol_error() {
        let err: StudyRoomError = ProtocolError::InvalidMessage("bad".into()).into();
        assert!(matches!(err, StudyRoomError::Protocol(_)));
    }

    #[test]
    fn test_from_room_error() {
        let err: StudyRoomError = RoomError::NotFound(RoomId(1)).into();
        assert!(matches!(err, StudyRoomError::Room(_)));
        assert_eq!(err.to_string(), "room R-1 not found");
    }

    #[test]
    fn test_from_sim_error() {
        let err: StudyRoomError = SimError::SpawnNotWalkable { x: 0, y: 0 }.into();
        assert!(matches!(err, StudyRoomError::Simulation(_)));
    }
}
