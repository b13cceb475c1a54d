//! Comet edge server.
//!
//! Holds long-lived client connections and pushes frames to them on behalf
//! of the backend.
//!
//! # Architecture
//!
//! - [`Server`]: the connection registry, sharded into [`Bucket`]s by a
//!   fixed-seed hash of the session key, plus push dispatch over it
//! - [`ControlRpc`]: the control-plane service the backend calls to push
//! - [`run_session`]: one client connection from auth to disconnect
//! - [`LogicClient`]: the session-plane calls a client session makes
//!
//! The registry is constructed once and shared behind an `Arc`. Shard locks
//! are the only serialization points and are never held across a delivery.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod bucket;
pub mod channel;
mod config;
mod error;
mod logic_client;
mod rpc;
mod server;
mod session;
pub mod stats;

use std::sync::Arc;

pub use bucket::{Bucket, Handle};
pub use channel::{Channel, ConnectionHandle, DeliveryError};
pub use config::{CometConfig, SessionConfig};
pub use error::ServerError;
pub use logic_client::LogicClient;
pub use rpc::ControlRpc;
pub use server::{PushError, Server};
pub use session::run_session;
pub use stats::{Stats, StatsSink, StatsSnapshot};
use tokio::net::TcpListener;

/// Accept client connections forever, running a session per connection.
pub async fn serve_clients<L: LogicClient>(
    listener: TcpListener,
    server: Arc<Server>,
    logic: Arc<L>,
    config: SessionConfig,
) {
    loop {
        match listener.accept().await {
            Ok((stream, peer)) => {
                if let Err(error) = stream.set_nodelay(true) {
                    tracing::debug!(%peer, %error, "failed to set TCP_NODELAY");
                }

                let server = Arc::clone(&server);
                let logic = Arc::clone(&logic);
                tokio::spawn(async move {
                    if let Err(error) = run_session(stream, server, logic, config).await {
                        tracing::debug!(%peer, %error, "session ended with error");
                    }
                });
            },
            Err(error) => {
                tracing::error!(%error, "accept error");
            },
        }
    }
}
