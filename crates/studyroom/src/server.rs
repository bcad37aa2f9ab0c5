//! `StudyRoomServer` builder and accept loop.
//!
//! This is the entry point for running a Study Room server. It ties the
//! layers together: transport → protocol → rooms.

use std::sync::Arc;
use std::time::Duration;

use studyroom_protocol::{Codec, JsonCodec};
use studyroom_room::{RoomConfig, RoomManager};
use studyroom_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::StudyRoomError;
use crate::handler::handle_connection;

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) rooms: Mutex<RoomManager>,
    pub(crate) codec: C,
    /// A connection that sends nothing for this long is dropped.
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a server.
///
/// # Example
///
/// ```rust,no_run
/// use studyroom::prelude::*;
///
/// # async fn demo() -> Result<(), StudyRoomError> {
/// let server = ServerBuilder::new()
///     .bind("0.0.0.0:8080")
///     .room_config(RoomConfig::default().with_max_players(8))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct ServerBuilder {
    bind_addr: String,
    idle_timeout: Duration,
    room_config: RoomConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            idle_timeout: Duration::from_secs(15),
            room_config: RoomConfig::default(),
        }
    }

    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// How long a connection may stay silent. Clients heartbeat well
    /// inside the default 15 s.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.idle_timeout = timeout;
        self
    }

    /// Configuration every new room is created with.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the listener. Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<StudyRoomServer<JsonCodec>, StudyRoomError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            rooms: Mutex::new(RoomManager::new(self.room_config)),
            codec: JsonCodec,
            idle_timeout: self.idle_timeout,
        });

        Ok(StudyRoomServer { transport, state })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Study Room server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct StudyRoomServer<C: Codec = JsonCodec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> StudyRoomServer<C> {
    pub fn builder() -> ServerBuilder {
        ServerBuilder::new()
    }

    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Accepts connections and spawns a handler task for each. Runs until
    /// the process is terminated.
    pub async fn run(mut self) -> Result<(), StudyRoomError> {
        tracing::info!(addr = ?self.transport.local_addr().ok(), "study room server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
