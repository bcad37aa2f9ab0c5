//! Room actor: an isolated Tokio task that owns one [`Simulation`].
//!
//! Each room runs in its own task and talks to the outside world through
//! an mpsc channel. All simulation mutation happens inside that task, so
//! the room is the single writer of its state. Every change is turned into
//! a [`StatePatch`] and fanned out to the participants' patch channels.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use rand::distr::Alphanumeric;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use studyroom_protocol::{JoinOptions, Recipient, RoomId, SessionId, StatePatch};
use studyroom_sim::{Command, RoomState, Simulation, schema};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomConfig, RoomError};

/// Length of generated session ids.
const SESSION_ID_LEN: usize = 9;

/// Channel a participant's connection handler receives patches on.
pub type PlayerSender = mpsc::UnboundedSender<StatePatch>;

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Seat a new participant. Replies with its session id.
    Join {
        options: JoinOptions,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<SessionId, RoomError>>,
    },

    /// Remove a participant. Replies with the number still seated.
    Leave {
        session_id: SessionId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Apply a participant's movement intent. No reply.
    Command {
        session_id: SessionId,
        command: Command,
    },

    GetInfo {
        reply: oneshot::Sender<RoomInfo>,
    },

    /// A copy of the authoritative state, for tests and diagnostics.
    GetState {
        reply: oneshot::Sender<RoomState>,
    },

    Shutdown,
}

/// Room metadata (not the simulation state itself).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomInfo {
    pub room_id: RoomId,
    pub name: String,
    pub player_count: usize,
    pub max_players: usize,
}

impl RoomInfo {
    pub fn is_joinable(&self) -> bool {
        self.player_count < self.max_players
    }
}

/// Handle to a running room actor.
///
/// Cheap to clone; the [`RoomManager`](crate::RoomManager) holds one per
/// room.
#[derive(Clone)]
pub struct RoomHandle {
    room_id: RoomId,
    name: Arc<str>,
    reply_timeout: Duration,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn room_id(&self) -> RoomId {
        self.room_id
    }

    /// The name the room was created under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Seats a participant; the full state arrives on `sender` first.
    pub async fn join(
        &self,
        options: JoinOptions,
        sender: PlayerSender,
    ) -> Result<SessionId, RoomError> {
        self.request(|reply| RoomCommand::Join {
            options,
            sender,
            reply,
        })
        .await?
    }

    /// Removes a participant and returns how many remain.
    pub async fn leave(&self, session_id: &SessionId) -> Result<usize, RoomError> {
        let session_id = session_id.clone();
        self.request(|reply| RoomCommand::Leave { session_id, reply })
            .await?
    }

    /// Forwards a command (fire-and-forget).
    pub async fn send_command(
        &self,
        session_id: &SessionId,
        command: Command,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Command {
                session_id: session_id.clone(),
                command,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    pub async fn get_info(&self) -> Result<RoomInfo, RoomError> {
        self.request(|reply| RoomCommand::GetInfo { reply }).await
    }

    pub async fn get_state(&self) -> Result<RoomState, RoomError> {
        self.request(|reply| RoomCommand::GetState { reply }).await
    }

    /// Tells the room to stop. Pending commands queued before this one are
    /// still processed.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))
    }

    async fn request<T>(
        &self,
        command: impl FnOnce(oneshot::Sender<T>) -> RoomCommand,
    ) -> Result<T, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(command(reply_tx))
            .await
            .map_err(|_| RoomError::Unavailable(self.room_id))?;
        match tokio::time::timeout(self.reply_timeout, reply_rx).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(_)) | Err(_) => Err(RoomError::Unavailable(self.room_id)),
        }
    }
}

/// The internal room actor state. Runs inside a Tokio task.
struct RoomActor {
    room_id: RoomId,
    name: Arc<str>,
    config: RoomConfig,
    sim: Simulation,
    senders: HashMap<SessionId, PlayerSender>,
    rng: StdRng,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    /// Processes commands until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(room_id = %self.room_id, name = %self.name, "room actor started");

        while let Some(cmd) = self.receiver.recv().await {
            match cmd {
                RoomCommand::Join {
                    options,
                    sender,
                    reply,
                } => {
                    let result = self.handle_join(&options, sender);
                    let _ = reply.send(result);
                }
                RoomCommand::Leave { session_id, reply } => {
                    let result = self.handle_leave(&session_id);
                    let _ = reply.send(result);
                }
                RoomCommand::Command {
                    session_id,
                    command,
                } => {
                    self.handle_command(&session_id, &command);
                }
                RoomCommand::GetInfo { reply } => {
                    let _ = reply.send(self.info());
                }
                RoomCommand::GetState { reply } => {
                    let _ = reply.send(self.sim.state().clone());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_id = %self.room_id, "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_id = %self.room_id, "room actor stopped");
    }

    fn handle_join(
        &mut self,
        options: &JoinOptions,
        sender: PlayerSender,
    ) -> Result<SessionId, RoomError> {
        if self.senders.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.room_id));
        }
        let spawn = self
            .sim
            .random_spawn(&mut self.rng)
            .ok_or(RoomError::NoSpawnPoint(self.room_id))?;

        let session_id = self.new_session_id();
        let color = match options.color.as_deref() {
            Some(color) if is_hex_color(color) => color.to_owned(),
            _ => format!("#{:06X}", self.rng.random_range(0..=0xFF_FFFFu32)),
        };
        let player = self
            .sim
            .add_player(session_id.as_str(), color, spawn)?
            .clone();

        // The joiner gets everything, itself included; the others get one put.
        let full = schema::full_state_patch(self.sim.state());
        let put = schema::player_put(&player);
        let (full, put) = match (full, put) {
            (Ok(full), Ok(put)) => (full, put),
            (Err(e), _) | (_, Err(e)) => {
                self.sim.remove_player(session_id.as_str());
                return Err(e.into());
            }
        };

        self.senders.insert(session_id.clone(), sender);
        self.dispatch(&Recipient::Session(session_id.clone()), &full);
        self.dispatch(&Recipient::AllExcept(session_id.clone()), &put);

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            x = player.x,
            y = player.y,
            players = self.senders.len(),
            "player joined"
        );
        Ok(session_id)
    }

    fn handle_leave(&mut self, session_id: &SessionId) -> Result<usize, RoomError> {
        if self.senders.remove(session_id).is_none() {
            return Err(RoomError::NotInRoom(session_id.clone()));
        }
        self.sim.remove_player(session_id.as_str());
        self.dispatch(&Recipient::All, &schema::player_delete(session_id.as_str()));

        tracing::info!(
            room_id = %self.room_id,
            %session_id,
            players = self.senders.len(),
            "player left"
        );
        Ok(self.senders.len())
    }

    fn handle_command(&mut self, session_id: &SessionId, command: &Command) {
        if !self.senders.contains_key(session_id) {
            tracing::warn!(
                room_id = %self.room_id,
                %session_id,
                "command from non-member, ignoring"
            );
            return;
        }

        let id = session_id.as_str();
        let before = self.sim.player(id).cloned();
        self.sim.apply(id, command);
        let Some(after) = self.sim.player(id) else {
            return;
        };
        if before.as_ref() == Some(after) {
            return;
        }

        match schema::player_put(after) {
            Ok(patch) => self.dispatch(&Recipient::All, &patch),
            Err(e) => {
                tracing::warn!(
                    room_id = %self.room_id,
                    %session_id,
                    error = %e,
                    "patch encode failed"
                );
            }
        }
    }

    /// Sends a patch to every addressed participant. Silently drops for
    /// participants whose handler is gone; their leave is on its way.
    fn dispatch(&self, recipient: &Recipient, patch: &StatePatch) {
        for (session_id, sender) in &self.senders {
            if recipient.includes(session_id) {
                let _ = sender.send(patch.clone());
            }
        }
    }

    fn new_session_id(&mut self) -> SessionId {
        loop {
            let id: String = (&mut self.rng)
                .sample_iter(Alphanumeric)
                .take(SESSION_ID_LEN)
                .map(char::from)
                .collect();
            let id = SessionId(id);
            if !self.senders.contains_key(&id) {
                return id;
            }
        }
    }

    fn info(&self) -> RoomInfo {
        RoomInfo {
            room_id: self.room_id,
            name: self.name.to_string(),
            player_count: self.senders.len(),
            max_players: self.config.max_players,
        }
    }
}

fn is_hex_color(color: &str) -> bool {
    color.len() == 7
        && color.starts_with('#')
        && color[1..].bytes().all(|b| b.is_ascii_hexdigit())
}

/// Spawns a new room actor task and returns a handle to it.
///
/// The layout is generated here, once per room.
pub(crate) fn spawn_room(room_id: RoomId, name: &str, config: RoomConfig) -> RoomHandle {
    let config = config.validated();
    let (tx, rx) = mpsc::channel(config.channel_size);
    let mut rng = StdRng::from_os_rng();
    let name: Arc<str> = Arc::from(name);

    let actor = RoomActor {
        room_id,
        name: Arc::clone(&name),
        sim: Simulation::with_rng(config.width_units, config.height_units, &mut rng),
        senders: HashMap::new(),
        rng,
        receiver: rx,
        config: config.clone(),
    };

    tokio::spawn(actor.run());

    RoomHandle {
        room_id,
        name,
        reply_timeout: config.reply_timeout,
        sender: tx,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_hex_color() {
        assert!(is_hex_color("#A0522D"));
        assert!(is_hex_color("#ff00ff"));
        assert!(!is_hex_color("A0522D"));
        assert!(!is_hex_color("#A0522"));
        assert!(!is_hex_color("#GGGGGG"));
    }

    #[tokio::test]
    async fn test_join_sends_full_state_then_others_get_put() {
        let handle = spawn_room(RoomId(900), "unit", RoomConfig::default());
        let (tx_a, mut rx_a) = mpsc::unbounded_channel();
        let (tx_b, mut rx_b) = mpsc::unbounded_channel();

        let a = handle.join(JoinOptions::default(), tx_a).await.unwrap();
        let first = rx_a.recv().await.unwrap();
        assert_eq!(first.len(), 2 + 2 + 20 * 15 + 1);

        let b = handle
            .join(JoinOptions::with_color("#00FF00"), tx_b)
            .await
            .unwrap();
        assert_ne!(a, b);
        assert_eq!(b.as_str().len(), SESSION_ID_LEN);

        let b_full = rx_b.recv().await.unwrap();
        assert_eq!(b_full.len(), 2 + 2 + 20 * 15 + 2);
        let a_update = rx_a.recv().await.unwrap();
        let state = handle.get_state().await.unwrap();
        assert_eq!(a_update, schema::player_put(&state.players[b.as_str()]).unwrap());

        handle.shutdown().await.unwrap();
    }

    #[tokio::test]
    async fn test_requests_fail_after_shutdown() {
        let handle = spawn_room(RoomId(901), "unit", RoomConfig::default());
        handle.shutdown().await.unwrap();
        tokio::task::yield_now().await;

        let err = handle.get_info().await.unwrap_err();
        assert!(matches!(err, RoomError::Unavailable(RoomId(901))));
    }
}
