//! Wire protocol for Study Room.
//!
//! This crate defines what clients and servers say to each other:
//!
//! - **Types** ([`Envelope`], [`SystemMessage`], [`JoinOptions`], ...):
//!   the frames that travel on the connection.
//! - **Schema** ([`Schema`], [`SchemaDescriptor`], [`Record`]): explicit,
//!   checked field layouts for synchronized entities.
//! - **Patches** ([`StatePatch`], [`PatchOp`]): structural updates to a
//!   mirrored room state.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): bytes in, bytes out.
//!
//! The protocol layer knows nothing about sockets or rooms:
//!
//! ```text
//! Transport (bytes) → Protocol (Envelope / StatePatch) → Room / Client
//! ```

mod codec;
mod error;
mod patch;
mod schema;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use patch::{PatchOp, StatePatch};
pub use schema::{
    FieldDescriptor, FieldReader, FieldType, FieldValue, Record, Schema, SchemaDescriptor,
    decode_record, encode_record,
};
pub use types::{
    Envelope, JoinOptions, PROTOCOL_VERSION, Payload, Recipient, RoomId, RoomListEntry, SessionId,
    SystemMessage,
};
