/// Errors raised by the simulation model.
///
/// Movement never produces one of these: blocked or stale moves are
/// no-ops. Only lifecycle calls and parsing can fail.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SimError {
    /// A player with this id is already in the room.
    #[error("player {0} already exists")]
    DuplicatePlayer(String),

    /// The requested spawn cell cannot hold a player.
    #[error("spawn point ({x}, {y}) is not walkable")]
    SpawnNotWalkable { x: i32, y: i32 },

    /// A string did not name a known variant.
    #[error("unknown {what}: {value:?}")]
    UnknownVariant { what: &'static str, value: String },
}

impl SimError {
    pub(crate) fn unknown(what: &'static str, value: &str) -> Self {
        Self::UnknownVariant {
            what,
            value: value.to_owned(),
        }
    }
}
