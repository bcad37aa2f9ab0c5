//! The seam between a [`RoomSession`](crate::RoomSession) and the network.
//!
//! A [`Joiner`] performs the join handshake and yields a [`JoinedRoom`]:
//! a [`RoomLink`] for talking back, the full-state patch, and a receiver
//! for every later patch in server order. The WebSocket implementation
//! lives in [`ws`](crate::ws); tests plug in in-memory joiners.

use std::future::Future;

use studyroom_protocol::{JoinOptions, RoomId, SessionId, StatePatch};
use studyroom_sim::Command;
use tokio::sync::mpsc;

use crate::ClientError;

/// An established seat in a room.
pub trait RoomLink: Send + Sync + 'static {
    fn session_id(&self) -> &SessionId;

    fn room_id(&self) -> RoomId;

    /// Queues a command. Fire-and-forget: there is no acknowledgement.
    fn send(&self, command: &Command) -> Result<(), ClientError>;

    /// Leaves the room and closes the link. `consented` is false when the
    /// client is going away without saying goodbye.
    fn leave(&self, consented: bool) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// Performs the join handshake.
pub trait Joiner: Send + Sync + 'static {
    type Link: RoomLink;

    fn join_or_create(
        &self,
        room_name: &str,
        options: JoinOptions,
    ) -> impl Future<Output = Result<JoinedRoom<Self::Link>, ClientError>> + Send;
}

/// What a successful join hands to the session.
pub struct JoinedRoom<L> {
    pub link: L,
    /// The full state, applied before anything from `patches`.
    pub initial: StatePatch,
    /// Every later patch, in order. Closes when the link goes away.
    pub patches: mpsc::UnboundedReceiver<StatePatch>,
}
