use std::time::Duration;

use studyroom::prelude::*;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    studyroom::init_tracing("info,studyroom=debug");

    let bind = std::env::var("STUDYROOM_BIND").unwrap_or_else(|_| "0.0.0.0:8080".into());
    let max_players = match std::env::var("STUDYROOM_MAX_PLAYERS") {
        Ok(value) => value.parse()?,
        Err(_) => 16,
    };

    let server = ServerBuilder::new()
        .bind(&bind)
        .idle_timeout(Duration::from_secs(15))
        .room_config(RoomConfig::default().with_max_players(max_players))
        .build()
        .await?;

    tracing::info!(addr = ?server.local_addr()?, max_players, "starting study room server");
    server.run().await?;
    Ok(())
}
