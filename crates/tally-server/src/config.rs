//! Server configuration.

use serde::{Deserialize, Serialize};

use tally_core::constants::SESSION_CODE_DEFAULT_LENGTH;

/// Configuration for the tally server.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host to bind (default `"127.0.0.1"`).
    pub host: String,
    /// Port to bind (default `0` for auto-assign).
    pub port: u16,
    /// Length of generated session codes.
    pub code_length: usize,
    /// Capacity of each connection's outbound frame queue.
    pub queue_capacity: usize,
    /// Heartbeat ping interval in seconds.
    pub heartbeat_interval_secs: u64,
    /// Disconnect after this long without a pong.
    pub heartbeat_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 0,
            code_length: SESSION_CODE_DEFAULT_LENGTH,
            queue_capacity: 1024,
            heartbeat_interval_secs: 30,
            heartbeat_timeout_secs: 90,
        }
    }
}
