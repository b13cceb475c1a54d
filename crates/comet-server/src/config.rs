//! Runtime configuration for the comet tier.

use std::time::Duration;

/// Comet server configuration.
#[derive(Debug, Clone)]
pub struct CometConfig {
    /// Identity reported to the logic tier on every connect
    pub server_id: i32,
    /// Registry shard count; fixed for the process lifetime
    pub bucket_count: usize,
    /// Outbound packets queued per connection before pushes are refused
    pub channel_capacity: usize,
    /// Time a new connection has to send its auth frame
    pub handshake_timeout: Duration,
    /// Client (TCP) listen address
    pub client_bind: String,
    /// Control RPC listen address
    pub rpc_bind: String,
    /// Logic tier session RPC address
    pub logic_addr: String,
    /// Interval between liveness pings to the logic tier
    pub logic_ping_interval: Duration,
}

impl Default for CometConfig {
    fn default() -> Self {
        Self {
            server_id: 1,
            bucket_count: 32,
            channel_capacity: 64,
            handshake_timeout: Duration::from_secs(5),
            client_bind: "0.0.0.0:8080".to_string(),
            rpc_bind: "0.0.0.0:8092".to_string(),
            logic_addr: "127.0.0.1:7170".to_string(),
            logic_ping_interval: Duration::from_secs(10),
        }
    }
}

impl CometConfig {
    /// Per-session settings derived from this configuration.
    pub fn session(&self) -> SessionConfig {
        SessionConfig {
            server_id: self.server_id,
            channel_capacity: self.channel_capacity,
            handshake_timeout: self.handshake_timeout,
        }
    }
}

/// Settings a single client session needs.
#[derive(Debug, Clone, Copy)]
pub struct SessionConfig {
    /// Identity reported to the logic tier
    pub server_id: i32,
    /// Outbound queue capacity
    pub channel_capacity: usize,
    /// Deadline for the auth frame
    pub handshake_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        CometConfig::default().session()
    }
}
