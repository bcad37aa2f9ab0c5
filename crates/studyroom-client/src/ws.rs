//! WebSocket [`Joiner`] speaking the Study Room wire protocol.
//!
//! Join sequence:
//!
//! ```text
//! client                               server
//!   │── Handshake{version} ─────────────→│
//!   │←──────────────── HandshakeAck ─────│
//!   │── JoinOrCreate{name, options} ────→│
//!   │←──── RoomJoined{room_id, session} ─│
//!   │←──── RoomPatch{full state} ────────│
//!   │          ... reader / writer tasks ...
//! ```
//!
//! After the join a reader task forwards `RoomPatch`es to the session and
//! a writer task sends commands and heartbeats.

use std::sync::Arc;
use std::time::{Duration, Instant};

use studyroom_protocol::{
    Codec, Envelope, JoinOptions, JsonCodec, PROTOCOL_VERSION, Payload, RoomId, RoomListEntry,
    SessionId, StatePatch, SystemMessage,
};
use studyroom_sim::Command;
use studyroom_transport::{ClientConnection, Connection};
use tokio::sync::{mpsc, oneshot};

use crate::link::{JoinedRoom, Joiner, RoomLink};
use crate::{ClientConfig, ClientError};

/// Joins rooms on a Study Room server at `url` (`ws://host:port`).
#[derive(Debug, Clone)]
pub struct WsJoiner {
    url: String,
    config: ClientConfig,
    codec: JsonCodec,
}

impl WsJoiner {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            config: ClientConfig::default(),
            codec: JsonCodec,
        }
    }

    /// Replaces the timing configuration, clamped into its usable range.
    pub fn with_config(mut self, config: ClientConfig) -> Self {
        self.config = config.validated();
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Asks the server for its joinable rooms on a short-lived connection.
    pub async fn list_rooms(&self) -> Result<Vec<RoomListEntry>, ClientError> {
        tokio::time::timeout(self.config.join_timeout, self.fetch_rooms())
            .await
            .map_err(|_| ClientError::Timeout("room list"))?
    }

    async fn fetch_rooms(&self) -> Result<Vec<RoomListEntry>, ClientError> {
        let mut wire = self.open().await?;
        wire.send_system(SystemMessage::ListRooms).await?;
        let rooms = match wire.recv_system().await? {
            SystemMessage::RoomList { rooms } => rooms,
            other => return Err(unexpected("room list", other)),
        };
        let _ = wire.conn.close().await;
        Ok(rooms)
    }

    /// Connects and completes the version handshake.
    async fn open(&self) -> Result<Wire, ClientError> {
        let conn = studyroom_transport::connect(&self.url).await?;
        let mut wire = Wire {
            conn: Arc::new(conn),
            codec: self.codec,
            seq: 0,
            clock: Instant::now(),
        };
        wire.send_system(SystemMessage::Handshake {
            version: PROTOCOL_VERSION,
        })
        .await?;
        match wire.recv_system().await? {
            SystemMessage::HandshakeAck { server_time } => {
                tracing::debug!(url = %self.url, server_time, "handshake complete");
                Ok(wire)
            }
            other => Err(unexpected("handshake", other)),
        }
    }

    async fn join(
        &self,
        room_name: &str,
        options: JoinOptions,
    ) -> Result<JoinedRoom<WsLink>, ClientError> {
        let mut wire = self.open().await?;

        wire.send_system(SystemMessage::JoinOrCreate {
            name: room_name.to_owned(),
            options,
        })
        .await?;
        let (room_id, session_id) = match wire.recv_system().await? {
            SystemMessage::RoomJoined {
                room_id,
                session_id,
            } => (room_id, session_id),
            other => return Err(unexpected("join", other)),
        };
        let initial = match wire.recv_system().await? {
            SystemMessage::RoomPatch { patch } => patch,
            other => return Err(unexpected("initial state", other)),
        };

        let (patch_tx, patches) = mpsc::unbounded_channel();
        let (outgoing, outgoing_rx) = mpsc::unbounded_channel();
        tokio::spawn(read_loop(Arc::clone(&wire.conn), self.codec, patch_tx));
        tokio::spawn(write_loop(wire, outgoing_rx, self.config.heartbeat_interval));

        Ok(JoinedRoom {
            link: WsLink {
                session_id,
                room_id,
                outgoing,
                leave_timeout: self.config.leave_timeout,
            },
            initial,
            patches,
        })
    }
}

impl Joiner for WsJoiner {
    type Link = WsLink;

    async fn join_or_create(
        &self,
        room_name: &str,
        options: JoinOptions,
    ) -> Result<JoinedRoom<WsLink>, ClientError> {
        tokio::time::timeout(self.config.join_timeout, self.join(room_name, options))
            .await
            .map_err(|_| ClientError::Timeout("join"))?
    }
}

/// A seat held over a WebSocket connection.
pub struct WsLink {
    session_id: SessionId,
    room_id: RoomId,
    outgoing: mpsc::UnboundedSender<Outgoing>,
    leave_timeout: Duration,
}

impl RoomLink for WsLink {
    fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    fn room_id(&self) -> RoomId {
        self.room_id
    }

    fn send(&self, command: &Command) -> Result<(), ClientError> {
        self.outgoing
            .send(Outgoing::Command(*command))
            .map_err(|_| ClientError::Closed)
    }

    async fn leave(&self, consented: bool) -> Result<(), ClientError> {
        let (done, wait) = oneshot::channel();
        self.outgoing
            .send(Outgoing::Leave { consented, done })
            .map_err(|_| ClientError::Closed)?;
        match tokio::time::timeout(self.leave_timeout, wait).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(_)) => Err(ClientError::Closed),
            Err(_) => Err(ClientError::Timeout("leave")),
        }
    }
}

enum Outgoing {
    Command(Command),
    Leave {
        consented: bool,
        done: oneshot::Sender<()>,
    },
}

/// The sending half of a connection plus its framing state.
struct Wire {
    conn: Arc<ClientConnection>,
    codec: JsonCodec,
    seq: u64,
    clock: Instant,
}

impl Wire {
    fn now(&self) -> u64 {
        self.clock.elapsed().as_millis() as u64
    }

    async fn send(&mut self, payload: Payload) -> Result<(), ClientError> {
        self.seq += 1;
        let envelope = Envelope {
            seq: self.seq,
            timestamp: self.now(),
            payload,
        };
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn send_system(&mut self, message: SystemMessage) -> Result<(), ClientError> {
        self.send(Payload::System(message)).await
    }

    /// The next system message, skipping heartbeat acks and game frames.
    async fn recv_system(&self) -> Result<SystemMessage, ClientError> {
        loop {
            let Some(bytes) = self.conn.recv().await? else {
                return Err(ClientError::Closed);
            };
            let envelope: Envelope = self.codec.decode(&bytes)?;
            match envelope.payload {
                Payload::System(SystemMessage::HeartbeatAck { .. }) | Payload::Game(_) => {}
                Payload::System(message) => return Ok(message),
            }
        }
    }
}

fn unexpected(stage: &'static str, message: SystemMessage) -> ClientError {
    match message {
        SystemMessage::Error { code, message } => ClientError::Server { code, message },
        SystemMessage::Disconnect { .. } => ClientError::Closed,
        other => ClientError::Unexpected {
            stage,
            got: format!("{other:?}"),
        },
    }
}

async fn read_loop(
    conn: Arc<ClientConnection>,
    codec: JsonCodec,
    patches: mpsc::UnboundedSender<StatePatch>,
) {
    loop {
        let bytes = match conn.recv().await {
            Ok(Some(bytes)) => bytes,
            Ok(None) => {
                tracing::debug!("server closed the connection");
                break;
            }
            Err(e) => {
                tracing::warn!(error = %e, "receive failed");
                break;
            }
        };
        let envelope: Envelope = match codec.decode(&bytes) {
            Ok(envelope) => envelope,
            Err(e) => {
                tracing::warn!(error = %e, "undecodable frame, skipping");
                continue;
            }
        };

        match envelope.payload {
            Payload::System(SystemMessage::RoomPatch { patch }) => {
                if patches.send(patch).is_err() {
                    break;
                }
            }
            Payload::System(SystemMessage::HeartbeatAck {
                client_time,
                server_time,
            }) => {
                tracing::trace!(client_time, server_time, "heartbeat ack");
            }
            Payload::System(SystemMessage::Disconnect { reason }) => {
                tracing::info!(%reason, "server disconnected us");
                break;
            }
            Payload::System(SystemMessage::Error { code, message }) => {
                tracing::warn!(code, %message, "server error");
            }
            other => {
                tracing::debug!(?other, "ignoring message");
            }
        }
    }
}

async fn write_loop(
    mut wire: Wire,
    mut outgoing: mpsc::UnboundedReceiver<Outgoing>,
    heartbeat_interval: Duration,
) {
    let mut heartbeat = tokio::time::interval(heartbeat_interval);
    // The first tick completes immediately.
    heartbeat.tick().await;

    loop {
        tokio::select! {
            next = outgoing.recv() => match next {
                Some(Outgoing::Command(command)) => {
                    let payload = match wire.codec.encode(&command) {
                        Ok(bytes) => Payload::Game(bytes),
                        Err(e) => {
                            tracing::warn!(error = %e, "command encode failed");
                            continue;
                        }
                    };
                    if let Err(e) = wire.send(payload).await {
                        tracing::warn!(error = %e, "command send failed");
                        break;
                    }
                }
                Some(Outgoing::Leave { consented, done }) => {
                    if consented {
                        let _ = wire.send_system(SystemMessage::LeaveRoom).await;
                    }
                    let _ = wire.conn.close().await;
                    let _ = done.send(());
                    return;
                }
                None => break,
            },
            _ = heartbeat.tick() => {
                let client_time = wire.now();
                if wire.send_system(SystemMessage::Heartbeat { client_time }).await.is_err() {
                    break;
                }
            }
        }
    }
    let _ = wire.conn.close().await;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_heartbeat_is_clamped() {
        let joiner = WsJoiner::new("ws://127.0.0.1:1")
            .with_config(ClientConfig::default().with_heartbeat_interval(Duration::ZERO));

        assert_eq!(joiner.config.heartbeat_interval, crate::MIN_HEARTBEAT_INTERVAL);
        assert_eq!(joiner.url(), "ws://127.0.0.1:1");
    }
}
