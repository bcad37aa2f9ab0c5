//! A headless participant that joins a room and wanders around it.
//!
//! ```text
//! STUDYROOM_URL=ws://127.0.0.1:8080 STUDYROOM_ROOM=study_room cargo run -p study-room-bot
//! ```

use std::time::Duration;

use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use studyroom_client::{Phase, RoomSession, RoomSnapshot, WsJoiner};
use studyroom_protocol::JoinOptions;
use studyroom_sim::Direction;
use tracing_subscriber::EnvFilter;

const STEP_INTERVAL: Duration = Duration::from_millis(400);

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let url = std::env::var("STUDYROOM_URL").unwrap_or_else(|_| "ws://127.0.0.1:8080".into());
    let room = std::env::var("STUDYROOM_ROOM").unwrap_or_else(|_| "study_room".into());
    let options = match std::env::var("STUDYROOM_COLOR") {
        Ok(color) => JoinOptions::with_color(color),
        Err(_) => JoinOptions::default(),
    };

    let session = RoomSession::new(WsJoiner::new(url));
    let _players = session.subscribe(|snapshot| {
        if let Some(snapshot) = snapshot {
            tracing::debug!(players = snapshot.players.len(), "room changed");
        }
    });

    session.connect(&room, options).await;
    if session.phase() != Phase::Connected {
        let reason = session
            .last_connect_error()
            .map(|e| e.to_string())
            .unwrap_or_else(|| "unknown".into());
        return Err(format!("could not join {room}: {reason}").into());
    }
    let Some(me) = session.session_id() else {
        return Err("joined without a session id".into());
    };
    tracing::info!(%me, %room, "joined");

    let mut rng = StdRng::from_os_rng();
    let mut ticker = tokio::time::interval(STEP_INTERVAL);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let Some(snapshot) = session.snapshot() else {
                    tracing::warn!("lost the room");
                    break;
                };
                match pick_step(&snapshot, me.as_str(), &mut rng) {
                    Some(direction) if rng.random_bool(0.8) => {
                        let (dx, dy) = direction.delta();
                        session.move_player(dx, dy, direction);
                    }
                    _ => session.stop_player(),
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("leaving");
                break;
            }
        }
    }

    session.disconnect(true).await;
    Ok(())
}

/// A random direction whose neighbouring tile is walkable.
fn pick_step(snapshot: &RoomSnapshot, me: &str, rng: &mut StdRng) -> Option<Direction> {
    let player = snapshot.player(me)?;
    let open: Vec<Direction> = Direction::ALL
        .into_iter()
        .filter(|d| {
            let (dx, dy) = d.delta();
            snapshot
                .tile_at(player.x + dx, player.y + dy)
                .is_some_and(|tile| tile.kind.is_walkable())
        })
        .collect();
    open.choose(rng).copied()
}
