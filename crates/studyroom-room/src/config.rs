//! Room configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use studyroom_sim::layout::{DEFAULT_HEIGHT, DEFAULT_WIDTH};

/// Smallest side length a room accepts; below this there is no interior
/// left after walls and fixtures.
pub const MIN_DIMENSION: u32 = 5;

/// Configuration shared by every room a [`RoomManager`](crate::RoomManager)
/// creates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Grid width in tiles.
    pub width_units: u32,

    /// Grid height in tiles.
    pub height_units: u32,

    /// Maximum participants per room. A full room refuses joins and
    /// `JoinOrCreate` opens another room under the same name.
    pub max_players: usize,

    /// Capacity of the room actor's command channel.
    pub channel_size: usize,

    /// Destroy a room as soon as its last participant leaves.
    pub auto_dispose: bool,

    /// How long a caller waits for the room actor to answer.
    pub reply_timeout: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            width_units: DEFAULT_WIDTH,
            height_units: DEFAULT_HEIGHT,
            max_players: 16,
            channel_size: 64,
            auto_dispose: true,
            reply_timeout: Duration::from_secs(5),
        }
    }
}

impl RoomConfig {
    pub fn with_dimensions(mut self, width_units: u32, height_units: u32) -> Self {
        self.width_units = width_units;
        self.height_units = height_units;
        self
    }

    pub fn with_max_players(mut self, max_players: usize) -> Self {
        self.max_players = max_players;
        self
    }

    pub fn with_auto_dispose(mut self, auto_dispose: bool) -> Self {
        self.auto_dispose = auto_dispose;
        self
    }

    /// Clamps every field into its usable range.
    pub fn validated(self) -> Self {
        let clamped = Self {
            width_units: self.width_units.max(MIN_DIMENSION),
            height_units: self.height_units.max(MIN_DIMENSION),
            max_players: self.max_players.max(1),
            channel_size: self.channel_size.max(1),
            ..self.clone()
        };
        if clamped != self {
            tracing::warn!(?self, ?clamped, "room config clamped");
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_config_default() {
        let config = RoomConfig::default();
        assert_eq!((config.width_units, config.height_units), (20, 15));
        assert!(config.auto_dispose);
        assert_eq!(config.channel_size, 64);
    }

    #[test]
    fn test_validated_clamps_small_values() {
        let config = RoomConfig {
            channel_size: 0,
            ..RoomConfig::default()
        }
        .with_dimensions(2, 0)
        .with_max_players(0)
        .validated();

        assert_eq!((config.width_units, config.height_units), (5, 5));
        assert_eq!(config.max_players, 1);
        assert_eq!(config.channel_size, 1);
    }

    #[test]
    fn test_validated_keeps_good_config() {
        let config = RoomConfig::default().with_dimensions(30, 12);
        assert_eq!(config.clone().validated(), config);
    }
}
