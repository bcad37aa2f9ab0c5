//! Room manager: creates, tracks, and routes sessions to rooms.

use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

use studyroom_protocol::{JoinOptions, RoomId, SessionId};
use studyroom_sim::{Command, RoomState};

use crate::room::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle, RoomInfo};

/// Counter for generating unique room IDs.
static NEXT_ROOM_ID: AtomicU64 = AtomicU64::new(1);

/// Manages all active rooms and tracks which session is in which room.
///
/// A session sits in at most one room. Rooms are found by name; when every
/// room under a name is full, `join_or_create` opens another one.
pub struct RoomManager {
    config: RoomConfig,

    /// Active rooms, oldest first.
    rooms: BTreeMap<RoomId, RoomHandle>,

    /// Maps each seated session to its room.
    session_rooms: HashMap<SessionId, RoomId>,
}

impl RoomManager {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            config: config.validated(),
            rooms: BTreeMap::new(),
            session_rooms: HashMap::new(),
        }
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Creates a new room under `name` and returns its ID.
    pub fn create_room(&mut self, name: &str) -> RoomId {
        let room_id = RoomId(NEXT_ROOM_ID.fetch_add(1, Ordering::Relaxed));
        let handle = spawn_room(room_id, name, self.config.clone());
        self.rooms.insert(room_id, handle);
        tracing::info!(%room_id, name, "room created");
        room_id
    }

    /// Seats a new participant in a specific room.
    pub async fn join_room(
        &mut self,
        room_id: RoomId,
        options: JoinOptions,
        sender: PlayerSender,
    ) -> Result<SessionId, RoomError> {
        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let session_id = handle.join(options, sender).await?;
        self.session_rooms.insert(session_id.clone(), room_id);
        Ok(session_id)
    }

    /// Joins the oldest room under `name` that still has a seat, creating a
    /// room when there is none.
    pub async fn join_or_create(
        &mut self,
        name: &str,
        options: JoinOptions,
        sender: PlayerSender,
    ) -> Result<(RoomId, SessionId), RoomError> {
        for handle in self.rooms.values().filter(|h| h.name() == name) {
            // A room can fill between checks; a refused join moves on.
            match handle.join(options.clone(), sender.clone()).await {
                Ok(session_id) => {
                    let room_id = handle.room_id();
                    self.session_rooms.insert(session_id.clone(), room_id);
                    return Ok((room_id, session_id));
                }
                Err(e) => {
                    tracing::debug!(room_id = %handle.room_id(), error = %e, "room refused join");
                }
            }
        }

        let room_id = self.create_room(name);
        let session_id = self.join_room(room_id, options, sender).await?;
        Ok((room_id, session_id))
    }

    /// Removes a session from its room, disposing the room when it empties
    /// and the config asks for it.
    pub async fn leave_room(&mut self, session_id: &SessionId) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .remove(session_id)
            .ok_or_else(|| RoomError::NotInRoom(session_id.clone()))?;

        let handle = self
            .rooms
            .get(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;
        let remaining = handle.leave(session_id).await?;

        if remaining == 0 && self.config.auto_dispose {
            self.destroy_room(room_id).await?;
        }
        Ok(())
    }

    /// Forwards a command to the session's room.
    pub async fn route_command(
        &self,
        session_id: &SessionId,
        command: Command,
    ) -> Result<(), RoomError> {
        let room_id = self
            .session_rooms
            .get(session_id)
            .ok_or_else(|| RoomError::NotInRoom(session_id.clone()))?;
        let handle = self.rooms.get(room_id).ok_or(RoomError::NotFound(*room_id))?;
        handle.send_command(session_id, command).await
    }

    pub async fn get_room_info(&self, room_id: RoomId) -> Result<RoomInfo, RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.get_info().await
    }

    /// A copy of a room's authoritative state.
    pub async fn room_state(&self, room_id: RoomId) -> Result<RoomState, RoomError> {
        let handle = self.rooms.get(&room_id).ok_or(RoomError::NotFound(room_id))?;
        handle.get_state().await
    }

    /// Lists every room that still has a free seat.
    ///
    /// Rooms that fail to respond (e.g. shutting down) are skipped.
    pub async fn list_rooms(&self) -> Vec<RoomInfo> {
        let mut infos = Vec::with_capacity(self.rooms.len());
        for handle in self.rooms.values() {
            if let Ok(info) = handle.get_info().await {
                if info.is_joinable() {
                    infos.push(info);
                }
            }
        }
        infos
    }

    /// Shuts down a room and forgets all of its sessions.
    pub async fn destroy_room(&mut self, room_id: RoomId) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(&room_id)
            .ok_or(RoomError::NotFound(room_id))?;

        let _ = handle.shutdown().await;
        self.session_rooms.retain(|_, rid| *rid != room_id);

        tracing::info!(%room_id, "room destroyed");
        Ok(())
    }

    /// The room a session is in, if any.
    pub fn session_room(&self, session_id: &SessionId) -> Option<RoomId> {
        self.session_rooms.get(session_id).copied()
    }

    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomManager {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
