//! Client side of Study Room: keep a local, consistent copy of a room.
//!
//! ```text
//! server ──RoomPatch──→ LiveRoomState ──SyncBridge──→ KeyedStore<Option<RoomSnapshot>>
//!                        (mutable)     copy-on-write      (what renderers read)
//! ```
//!
//! # Key types
//!
//! - [`RoomSession`]: connect / disconnect / send commands / read snapshots
//! - [`RoomSnapshot`]: immutable copy; unchanged collections keep their `Arc`
//! - [`KeyedStore`]: single-value observable cell
//! - [`WsJoiner`]: joins rooms over WebSocket
//!
//! ```rust,no_run
//! use studyroom_client::{RoomSession, WsJoiner};
//! use studyroom_protocol::JoinOptions;
//! use studyroom_sim::Direction;
//!
//! # async fn demo() {
//! let session = RoomSession::new(WsJoiner::new("ws://127.0.0.1:8080"));
//! session.connect("study_room", JoinOptions::default()).await;
//! session.move_player(1, 0, Direction::Right);
//! if let Some(snapshot) = session.snapshot() {
//!     println!("{} players", snapshot.players.len());
//! }
//! session.disconnect(true).await;
//! # }
//! ```

mod bridge;
mod config;
mod error;
pub mod link;
mod mirror;
pub mod observe;
mod session;
mod store;
mod ws;

pub use bridge::{RoomSnapshot, SyncBridge};
pub use config::{ClientConfig, MIN_HEARTBEAT_INTERVAL};
pub use error::ClientError;
pub use link::{JoinedRoom, Joiner, RoomLink};
pub use mirror::LiveRoomState;
pub use session::{Phase, RoomSession, Seat};
pub use store::{KeyedStore, Subscription};
pub use ws::{WsJoiner, WsLink};
