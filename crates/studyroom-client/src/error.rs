//! Error types for the client layer.

use studyroom_protocol::ProtocolError;
use studyroom_transport::TransportError;

/// Errors that can occur while joining or talking to a room.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// The server answered with `SystemMessage::Error`.
    #[error("server refused ({code}): {message}")]
    Server { code: u16, message: String },

    /// The server sent something out of order during the join handshake.
    #[error("unexpected message during {stage}: {got}")]
    Unexpected { stage: &'static str, got: String },

    #[error("timed out waiting for {0}")]
    Timeout(&'static str),

    /// The connection ended, or its background tasks are gone.
    #[error("connection closed")]
    Closed,
}

impl ClientError {
    /// True when the server actively refused, as opposed to a network or
    /// framing problem.
    pub fn is_refusal(&self) -> bool {
        matches!(self, Self::Server { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_error_display() {
        let err = ClientError::Server {
            code: 409,
            message: "room R-1 is full".into(),
        };
        assert_eq!(err.to_string(), "server refused (409): room R-1 is full");
        assert!(err.is_refusal());
    }

    #[test]
    fn test_timeout_is_not_a_refusal() {
        assert!(!ClientError::Timeout("handshake").is_refusal());
    }
}
