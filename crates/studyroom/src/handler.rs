//! Per-connection handler: handshake, room routing and patch streaming.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Receive Handshake → validate version → send HandshakeAck
//!   2. Loop over two sources until either side closes:
//!      - frames from the client → system messages or game commands
//!      - patches from the seated room → `RoomPatch` frames
//!   3. On exit, leave the room (also on panic, via the seat guard)

use std::sync::Arc;
use std::time::{Duration, Instant};

use studyroom_protocol::{
    Codec, Envelope, JoinOptions, PROTOCOL_VERSION, Payload, ProtocolError, RoomId,
    RoomListEntry, SessionId, StatePatch, SystemMessage,
};
use studyroom_room::{PlayerSender, RoomError};
use studyroom_sim::Command;
use studyroom_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::StudyRoomError;
use crate::server::ServerState;

const HANDSHAKE_TIMEOUT: Duration = Duration::from_secs(5);

/// Drop guard that takes a participant out of its room when the handler
/// exits.
///
/// `Drop` is synchronous, so the leave runs in a fire-and-forget task.
struct SeatGuard<C: Codec> {
    seat: Option<(SessionId, RoomId)>,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> SeatGuard<C> {
    fn session_id(&self) -> Option<&SessionId> {
        self.seat.as_ref().map(|(session_id, _)| session_id)
    }
}

impl<C: Codec> Drop for SeatGuard<C> {
    fn drop(&mut self) {
        let Some((session_id, room_id)) = self.seat.take() else {
            return;
        };
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let mut rooms = state.rooms.lock().await;
            if let Err(e) = rooms.leave_room(&session_id).await {
                tracing::debug!(%session_id, %room_id, error = %e, "leave on close failed");
            }
        });
    }
}

/// Outgoing frame numbering for one connection.
struct Outbox<'a, C: Codec> {
    conn: &'a WebSocketConnection,
    codec: &'a C,
    seq: u64,
    start: Instant,
}

impl<C: Codec> Outbox<'_, C> {
    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    async fn send(&mut self, message: SystemMessage) -> Result<(), StudyRoomError> {
        let envelope = Envelope::system(next_seq(&mut self.seq), self.now(), message);
        let bytes = self.codec.encode(&envelope)?;
        self.conn.send(&bytes).await?;
        Ok(())
    }

    async fn send_error(
        &mut self,
        code: u16,
        message: impl Into<String>,
    ) -> Result<(), StudyRoomError> {
        self.send(SystemMessage::Error {
            code,
            message: message.into(),
        })
        .await
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), StudyRoomError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let mut out = Outbox {
        conn: &conn,
        codec: &state.codec,
        seq: 0,
        start: Instant::now(),
    };

    // --- Step 1: Handshake ---
    perform_handshake(&mut out).await?;
    tracing::info!(%conn_id, "client connected");

    // --- Step 2: Message loop ---
    let (patch_tx, mut patch_rx) = mpsc::unbounded_channel::<StatePatch>();
    let mut guard = SeatGuard {
        seat: None,
        state: Arc::clone(&state),
    };

    let idle = tokio::time::sleep(state.idle_timeout);
    tokio::pin!(idle);

    loop {
        tokio::select! {
            received = conn.recv() => {
                let data = match received {
                    Ok(Some(data)) => data,
                    Ok(None) => {
                        tracing::info!(%conn_id, "connection closed cleanly");
                        break;
                    }
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "recv error");
                        break;
                    }
                };
                idle.as_mut().reset(tokio::time::Instant::now() + state.idle_timeout);

                let envelope: Envelope = match state.codec.decode(&data) {
                    Ok(env) => env,
                    Err(e) => {
                        tracing::debug!(%conn_id, error = %e, "failed to decode envelope");
                        continue;
                    }
                };

                match envelope.payload {
                    Payload::System(message) => {
                        let should_close =
                            handle_system_message(&mut out, &state, &mut guard, &patch_tx, message)
                                .await?;
                        if should_close {
                            break;
                        }
                    }
                    Payload::Game(data) => {
                        handle_game_message(&mut out, &state, &guard, &data).await?;
                    }
                }
            }
            Some(patch) = patch_rx.recv() => {
                out.send(SystemMessage::RoomPatch { patch }).await?;
            }
            () = &mut idle => {
                tracing::info!(%conn_id, "connection timed out");
                break;
            }
        }
    }

    // guard drops here → the seat is released.
    Ok(())
}

/// Receives the first frame, which must be a `Handshake` with our version.
async fn perform_handshake<C: Codec>(out: &mut Outbox<'_, C>) -> Result<(), StudyRoomError> {
    let data = match tokio::time::timeout(HANDSHAKE_TIMEOUT, out.conn.recv()).await {
        Ok(Ok(Some(data))) => data,
        Ok(Ok(None)) => {
            return Err(invalid("connection closed before handshake"));
        }
        Ok(Err(e)) => return Err(e.into()),
        Err(_) => {
            return Err(invalid("handshake timed out"));
        }
    };

    let envelope: Envelope = out.codec.decode(&data)?;

    let version = match envelope.payload {
        Payload::System(SystemMessage::Handshake { version }) => version,
        _ => {
            out.send_error(400, "expected Handshake").await?;
            return Err(invalid("first message must be Handshake"));
        }
    };

    if version != PROTOCOL_VERSION {
        out.send_error(
            400,
            format!("version mismatch: expected {PROTOCOL_VERSION}, got {version}"),
        )
        .await?;
        return Err(invalid("protocol version mismatch"));
    }

    let server_time = out.now();
    out.send(SystemMessage::HandshakeAck { server_time }).await
}

/// Handles a system message. Returns `true` if the connection should close.
async fn handle_system_message<C: Codec>(
    out: &mut Outbox<'_, C>,
    state: &Arc<ServerState<C>>,
    guard: &mut SeatGuard<C>,
    patch_tx: &PlayerSender,
    message: SystemMessage,
) -> Result<bool, StudyRoomError> {
    match message {
        SystemMessage::Heartbeat { client_time } => {
            let server_time = out.now();
            out.send(SystemMessage::HeartbeatAck {
                client_time,
                server_time,
            })
            .await?;
        }

        SystemMessage::JoinRoom { room_id, options } => {
            let result = match refuse_if_seated(guard) {
                Err(e) => Err(e),
                Ok(()) => {
                    let mut rooms = state.rooms.lock().await;
                    rooms
                        .join_room(room_id, options, patch_tx.clone())
                        .await
                        .map(|session_id| (room_id, session_id))
                }
            };
            send_join_result(out, guard, result).await?;
        }

        SystemMessage::JoinOrCreate { name, options } => {
            let result = match refuse_if_seated(guard) {
                Err(e) => Err(e),
                Ok(()) => join_or_create(state, &name, options, patch_tx.clone()).await,
            };
            send_join_result(out, guard, result).await?;
        }

        SystemMessage::ListRooms => {
            let infos = state.rooms.lock().await.list_rooms().await;
            let rooms = infos
                .into_iter()
                .map(|info| RoomListEntry {
                    room_id: info.room_id,
                    name: info.name,
                    player_count: info.player_count,
                    max_players: info.max_players,
                })
                .collect();
            out.send(SystemMessage::RoomList { rooms }).await?;
        }

        SystemMessage::LeaveRoom => {
            if let Some((session_id, room_id)) = guard.seat.take() {
                let mut rooms = state.rooms.lock().await;
                if let Err(e) = rooms.leave_room(&session_id).await {
                    tracing::debug!(%session_id, %room_id, error = %e, "leave room failed");
                }
            }
        }

        SystemMessage::Disconnect { reason } => {
            tracing::info!(session_id = ?guard.session_id(), %reason, "client disconnected");
            return Ok(true);
        }

        other => {
            tracing::debug!(message = ?other, "ignoring unexpected system message");
        }
    }

    Ok(false)
}

async fn join_or_create<C: Codec>(
    state: &ServerState<C>,
    name: &str,
    options: JoinOptions,
    sender: PlayerSender,
) -> Result<(RoomId, SessionId), RoomError> {
    let mut rooms = state.rooms.lock().await;
    rooms.join_or_create(name, options, sender).await
}

fn refuse_if_seated<C: Codec>(guard: &SeatGuard<C>) -> Result<(), RoomError> {
    match &guard.seat {
        Some((session_id, room_id)) => {
            Err(RoomError::AlreadyInRoom(session_id.clone(), *room_id))
        }
        None => Ok(()),
    }
}

/// Answers a join with `RoomJoined` or an `Error`, and seats the guard.
///
/// The room already queued the full state on the patch channel, so the
/// client sees `RoomJoined` first and the full state right after.
async fn send_join_result<C: Codec>(
    out: &mut Outbox<'_, C>,
    guard: &mut SeatGuard<C>,
    result: Result<(RoomId, SessionId), RoomError>,
) -> Result<(), StudyRoomError> {
    match result {
        Ok((room_id, session_id)) => {
            tracing::info!(%session_id, %room_id, "seated");
            guard.seat = Some((session_id.clone(), room_id));
            out.send(SystemMessage::RoomJoined {
                room_id,
                session_id,
            })
            .await
        }
        Err(e) => out.send_error(e.code(), e.to_string()).await,
    }
}

/// Decodes a command and routes it to the participant's room.
async fn handle_game_message<C: Codec>(
    out: &mut Outbox<'_, C>,
    state: &Arc<ServerState<C>>,
    guard: &SeatGuard<C>,
    data: &[u8],
) -> Result<(), StudyRoomError> {
    let command: Command = match state.codec.decode(data) {
        Ok(command) => command,
        Err(e) => {
            return out.send_error(400, format!("invalid command: {e}")).await;
        }
    };

    let Some(session_id) = guard.session_id() else {
        return out.send_error(400, "not in a room").await;
    };

    let result = state
        .rooms
        .lock()
        .await
        .route_command(session_id, command)
        .await;

    if let Err(e) = result {
        out.send_error(e.code(), e.to_string()).await?;
    }
    Ok(())
}

fn invalid(reason: &str) -> StudyRoomError {
    ProtocolError::InvalidMessage(reason.into()).into()
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}
