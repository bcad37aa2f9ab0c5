//! Client timing configuration.

use std::time::Duration;

/// Shortest heartbeat period a client will run.
pub const MIN_HEARTBEAT_INTERVAL: Duration = Duration::from_millis(100);

/// Timeouts and keep-alive for a WebSocket room client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Upper bound for the whole join: handshake, join and the first patch.
    pub join_timeout: Duration,
    /// How long `leave` waits for the connection to wind down.
    pub leave_timeout: Duration,
    /// Interval between `Heartbeat` frames while connected.
    pub heartbeat_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(10),
            leave_timeout: Duration::from_secs(2),
            heartbeat_interval: Duration::from_secs(5),
        }
    }
}

impl ClientConfig {
    pub fn with_join_timeout(mut self, timeout: Duration) -> Self {
        self.join_timeout = timeout;
        self
    }

    pub fn with_leave_timeout(mut self, timeout: Duration) -> Self {
        self.leave_timeout = timeout;
        self
    }

    pub fn with_heartbeat_interval(mut self, interval: Duration) -> Self {
        self.heartbeat_interval = interval;
        self
    }

    /// Clamps the heartbeat to [`MIN_HEARTBEAT_INTERVAL`].
    pub fn validated(self) -> Self {
        let clamped = Self {
            heartbeat_interval: self.heartbeat_interval.max(MIN_HEARTBEAT_INTERVAL),
            ..self.clone()
        };
        if clamped != self {
            tracing::warn!(?self, ?clamped, "client config clamped");
        }
        clamped
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validated_clamps_zero_heartbeat() {
        let config = ClientConfig::default()
            .with_heartbeat_interval(Duration::ZERO)
            .validated();
        assert_eq!(config.heartbeat_interval, MIN_HEARTBEAT_INTERVAL);
    }

    #[test]
    fn test_validated_keeps_good_config() {
        let config = ClientConfig::default().with_join_timeout(Duration::from_secs(3));
        assert_eq!(config.clone().validated(), config);
    }
}
