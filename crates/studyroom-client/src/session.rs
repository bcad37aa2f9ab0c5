//! The room session façade.
//!
//! A [`RoomSession`] is created by the caller, owns one [`Joiner`], and
//! moves through `Disconnected → Connecting → Connected → Disconnected`.
//! Renderers read it through two stores: the seat (session and room id)
//! and the snapshot. Both hold `None` while disconnected.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use studyroom_protocol::{JoinOptions, RoomId, SessionId, StatePatch};
use studyroom_sim::{Command, Direction};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::link::{JoinedRoom, Joiner, RoomLink};
use crate::{ClientError, KeyedStore, LiveRoomState, RoomSnapshot, Subscription, SyncBridge};

/// Connection phase of a [`RoomSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Disconnected,
    Connecting,
    Connected,
}

/// Who and where this session is, once connected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Seat {
    pub session_id: SessionId,
    pub room_id: RoomId,
}

/// Client-side handle on one room.
pub struct RoomSession<J: Joiner> {
    joiner: J,
    phase: Mutex<Phase>,
    link: Mutex<Option<Arc<J::Link>>>,
    seat: KeyedStore<Option<Seat>>,
    state: KeyedStore<Option<RoomSnapshot>>,
    /// Shared with the pump task. Detaching takes this same lock.
    bridge: Arc<Mutex<Option<SyncBridge>>>,
    pump: Mutex<Option<JoinHandle<()>>>,
    last_error: Mutex<Option<Arc<ClientError>>>,
}

impl<J: Joiner> RoomSession<J> {
    pub fn new(joiner: J) -> Self {
        Self {
            joiner,
            phase: Mutex::new(Phase::Disconnected),
            link: Mutex::new(None),
            seat: KeyedStore::new(None),
            state: KeyedStore::new(None),
            bridge: Arc::new(Mutex::new(None)),
            pump: Mutex::new(None),
            last_error: Mutex::new(None),
        }
    }

    pub fn joiner(&self) -> &J {
        &self.joiner
    }

    /// Joins (or creates) the room called `room_name`.
    ///
    /// Does nothing unless the session is disconnected, so concurrent calls
    /// issue a single handshake. A failed join is logged, kept for
    /// [`last_connect_error`](Self::last_connect_error), and leaves the
    /// session disconnected.
    pub async fn connect(&self, room_name: &str, options: JoinOptions) {
        {
            let mut phase = lock(&self.phase);
            if *phase != Phase::Disconnected {
                tracing::debug!(phase = ?*phase, room = room_name, "connect ignored");
                return;
            }
            *phase = Phase::Connecting;
        }

        tracing::info!(room = room_name, "connecting");
        match self.joiner.join_or_create(room_name, options).await {
            Ok(joined) => self.install(joined),
            Err(e) => {
                tracing::warn!(room = room_name, error = %e, "connect failed");
                *lock(&self.last_error) = Some(Arc::new(e));
                *lock(&self.phase) = Phase::Disconnected;
            }
        }
    }

    fn install(&self, joined: JoinedRoom<J::Link>) {
        let JoinedRoom {
            link,
            initial,
            patches,
        } = joined;
        let seat = Seat {
            session_id: link.session_id().clone(),
            room_id: link.room_id(),
        };

        let mut bridge = SyncBridge::install(LiveRoomState::new(), self.state.clone());
        bridge.apply(&initial);
        let link = Arc::new(link);

        // `disconnect` reads the link under the phase lock, so it sees
        // either none of this or all of it.
        {
            let mut phase = lock(&self.phase);
            *lock(&self.bridge) = Some(bridge);
            *lock(&self.link) = Some(Arc::clone(&link));
            *lock(&self.pump) = Some(tokio::spawn(pump(Arc::clone(&self.bridge), patches)));
            *lock(&self.last_error) = None;
            *phase = Phase::Connected;
        }

        tracing::info!(session_id = %seat.session_id, room_id = %seat.room_id, "connected");
        self.seat.set(Some(seat));
        // A disconnect since the commit may have cleared the seat before we
        // published it.
        if !self.holds(&link) {
            self.seat.set(None);
        }
    }

    fn holds(&self, link: &Arc<J::Link>) -> bool {
        lock(&self.link)
            .as_ref()
            .is_some_and(|current| Arc::ptr_eq(current, link))
    }

    /// Leaves the room. A no-op when there is no link.
    ///
    /// Both stores are cleared before the network leave, and leave errors
    /// are swallowed.
    pub async fn disconnect(&self, consented: bool) {
        let link = {
            let mut phase = lock(&self.phase);
            let Some(link) = lock(&self.link).take() else {
                return;
            };
            *phase = Phase::Disconnected;
            link
        };

        if let Some(pump) = lock(&self.pump).take() {
            pump.abort();
        }
        lock(&self.bridge).take();
        self.seat.set(None);
        self.state.set(None);

        tracing::info!(session_id = %link.session_id(), consented, "disconnecting");
        if let Err(e) = link.leave(consented).await {
            tracing::debug!(error = %e, "leave failed, ignoring");
        }
    }

    /// Sends a command if connected; otherwise does nothing.
    pub fn send_command(&self, command: &Command) {
        let Some(link) = lock(&self.link).clone() else {
            tracing::trace!(?command, "not connected, dropping command");
            return;
        };
        if let Err(e) = link.send(command) {
            tracing::debug!(error = %e, "command not sent");
        }
    }

    pub fn move_player(&self, dx: i32, dy: i32, direction: Direction) {
        self.send_command(&Command::Move { dx, dy, direction });
    }

    pub fn stop_player(&self) {
        self.send_command(&Command::Stop);
    }

    /// The latest snapshot; `None` means "not connected yet".
    pub fn snapshot(&self) -> Option<RoomSnapshot> {
        self.state.get()
    }

    /// Called with every published snapshot, and with `None` on disconnect.
    ///
    /// Callbacks run on the task that applied the patch and must not block.
    pub fn subscribe(
        &self,
        callback: impl Fn(&Option<RoomSnapshot>) + Send + Sync + 'static,
    ) -> Subscription {
        self.state.subscribe(callback)
    }

    /// Called when the seat appears (connect) or goes away (disconnect).
    pub fn subscribe_room(
        &self,
        callback: impl Fn(&Option<Seat>) + Send + Sync + 'static,
    ) -> Subscription {
        self.seat.subscribe(callback)
    }

    pub fn session_id(&self) -> Option<SessionId> {
        self.seat.get().map(|seat| seat.session_id)
    }

    pub fn phase(&self) -> Phase {
        *lock(&self.phase)
    }

    /// Why the most recent connect failed. Cleared by a successful connect.
    pub fn last_connect_error(&self) -> Option<Arc<ClientError>> {
        lock(&self.last_error).clone()
    }
}

impl<J: Joiner> Drop for RoomSession<J> {
    fn drop(&mut self) {
        if let Some(pump) = lock(&self.pump).take() {
            pump.abort();
        }
    }
}

/// Applies patches strictly in order until the stream ends or the bridge
/// is detached.
async fn pump(
    bridge: Arc<Mutex<Option<SyncBridge>>>,
    mut patches: mpsc::UnboundedReceiver<StatePatch>,
) {
    while let Some(patch) = patches.recv().await {
        let mut guard = lock(&bridge);
        let Some(bridge) = guard.as_mut() else {
            break;
        };
        bridge.apply(&patch);
    }
    tracing::debug!("patch stream ended");
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
