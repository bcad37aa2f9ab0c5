//! Core protocol types for the Study Room wire format.
//!
//! Everything in this module is serialized to bytes, sent over the
//! connection, and deserialized on the other side. Room state itself does
//! not live here; it travels as [`StatePatch`] operations over
//! [`Record`](crate::Record)s.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::StatePatch;

/// Version carried in [`SystemMessage::Handshake`]. The server refuses any
/// other value with a 400 error.
pub const PROTOCOL_VERSION: u32 = 1;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// A participant's id within one room.
///
/// Generated by the room when the participant joins and doubles as the key
/// of the participant's player in the `players` collection. Serialized as a
/// plain string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(value: &str) -> Self {
        Self(value.to_owned())
    }
}

/// A unique identifier for a room instance.
///
/// `RoomId(3)` serializes as `3` and displays as `R-3`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub u64);

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "R-{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who a patch produced inside a room should be delivered to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Recipient {
    /// Every participant in the room.
    All,
    /// One participant, e.g. the full-state patch for a new joiner.
    Session(SessionId),
    /// Everyone but one participant.
    AllExcept(SessionId),
}

impl Recipient {
    /// Whether a participant is addressed by this recipient.
    pub fn includes(&self, session_id: &SessionId) -> bool {
        match self {
            Self::All => true,
            Self::Session(target) => target == session_id,
            Self::AllExcept(excluded) => excluded != session_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Room management payloads
// ---------------------------------------------------------------------------

/// Options a client passes when joining a room.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinOptions {
    /// Preferred player color as `#RRGGBB`. The room picks a random color
    /// when this is absent or malformed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl JoinOptions {
    pub fn with_color(color: impl Into<String>) -> Self {
        Self {
            color: Some(color.into()),
        }
    }
}

/// A summary of a room returned in room listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomListEntry {
    pub room_id: RoomId,
    /// The name clients pass to `JoinOrCreate`.
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
}

// ---------------------------------------------------------------------------
// SystemMessage
// ---------------------------------------------------------------------------

/// Framework-level messages: handshake, heartbeat, room management, state
/// patches and errors.
///
/// Internally tagged, so `LeaveRoom` is `{"type":"LeaveRoom"}` and a
/// heartbeat is `{"type":"Heartbeat","client_time":5000}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SystemMessage {
    // -- Connection lifecycle --
    /// Client → Server, first frame on every connection.
    Handshake { version: u32 },

    /// Server → Client, sent when the version matches.
    HandshakeAck { server_time: u64 },

    /// Either direction: "I'm closing this connection."
    Disconnect { reason: String },

    // -- Heartbeat --
    /// Client → Server keep-alive carrying the client's clock.
    Heartbeat { client_time: u64 },

    /// Server → Client echo used for round-trip estimates.
    HeartbeatAck { client_time: u64, server_time: u64 },

    // -- Room management --
    /// Client → Server: join a specific room.
    JoinRoom {
        room_id: RoomId,
        #[serde(default)]
        options: JoinOptions,
    },

    /// Client → Server: join the named room, creating it if needed.
    JoinOrCreate {
        name: String,
        #[serde(default)]
        options: JoinOptions,
    },

    /// Client → Server: leave the current room.
    LeaveRoom,

    /// Client → Server: list open rooms.
    ListRooms,

    /// Server → Client answer to `ListRooms`.
    RoomList { rooms: Vec<RoomListEntry> },

    /// Server → Client: the join succeeded.
    RoomJoined {
        room_id: RoomId,
        session_id: SessionId,
    },

    /// Server → Client: apply these operations to the mirrored state.
    RoomPatch { patch: StatePatch },

    // -- Errors --
    /// Server → Client. `code` follows HTTP conventions: 400 bad request,
    /// 404 room not found, 409 join refused.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Payload / Envelope
// ---------------------------------------------------------------------------

/// The content of a message: a system message or an opaque game payload.
///
/// Adjacently tagged:
///   `{ "type": "System", "data": { "type": "LeaveRoom" } }`
///   `{ "type": "Game", "data": [123, 34, ...] }`
///
/// Game payloads carry encoded room commands; the framework passes them
/// through to the room untouched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum Payload {
    System(SystemMessage),
    Game(Vec<u8>),
}

/// The top-level message wrapper. Every frame on the wire is one envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    /// Per-sender, monotonically increasing sequence number.
    pub seq: u64,

    /// Milliseconds since the sender started.
    pub timestamp: u64,

    pub payload: Payload,
}

impl Envelope {
    /// Wraps a system message.
    pub fn system(seq: u64, timestamp: u64, message: SystemMessage) -> Self {
        Self {
            seq,
            timestamp,
            payload: Payload::System(message),
        }
    }
}
