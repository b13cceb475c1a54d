//! Runtime configuration for the logic tier.

use std::time::Duration;

/// Logic server configuration.
#[derive(Debug, Clone)]
pub struct LogicConfig {
    /// Session RPC listen address
    pub rpc_bind: String,
    /// Idle interval granted to every session
    pub heartbeat: Duration,
}

impl Default for LogicConfig {
    fn default() -> Self {
        Self { rpc_bind: "0.0.0.0:7170".to_string(), heartbeat: Duration::from_secs(300) }
    }
}
