//! The comet tier's view of the logic tier.

use std::future::Future;

use comet_rpc::{RpcError, SessionClient, session::ConnReply};

/// Session-plane calls a client session makes.
pub trait LogicClient: Send + Sync + 'static {
    /// Authenticate `token` for a client attached to `server_id`.
    fn connect(
        &self,
        token: &str,
        server_id: i32,
    ) -> impl Future<Output = Result<ConnReply, RpcError>> + Send;

    /// Report that the session under `key` ended. Returns whether the logic
    /// tier still had a route for it.
    fn disconnect(&self, key: &str, room_id: i32)
    -> impl Future<Output = Result<bool, RpcError>> + Send;
}

impl LogicClient for SessionClient {
    async fn connect(&self, token: &str, server_id: i32) -> Result<ConnReply, RpcError> {
        self.connect(token, server_id).await
    }

    async fn disconnect(&self, key: &str, room_id: i32) -> Result<bool, RpcError> {
        self.disconnect(key, room_id).await
    }
}
