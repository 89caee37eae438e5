//! Server configuration.

use std::time::Duration;

use crate::domain::GameRules;

/// WebSocket liveness probing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HeartbeatConfig {
    /// Interval between two pings
    pub interval: Duration,
    /// Consecutive unanswered pings after which a connection is dropped
    pub max_missed: u32,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_missed: 3,
        }
    }
}

/// Everything the server needs besides the vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for `maxPlayers` of a created room
    pub max_room_size: usize,
    pub rules: GameRules,
    /// How long an offline player keeps its seat
    pub reconnect_grace: Duration,
    pub heartbeat: HeartbeatConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            max_room_size: 8,
            rules: GameRules::default(),
            reconnect_grace: Duration::from_secs(60),
            heartbeat: HeartbeatConfig::default(),
        }
    }
}
