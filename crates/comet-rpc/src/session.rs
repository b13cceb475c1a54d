//! Session plane: served by the logic tier, called by comet on connect and
//! disconnect.

use serde::{Deserialize, Serialize};
use tokio::io::{AsyncRead, AsyncWrite};

use crate::{
    error::{RpcError, RpcFault},
    transport::Client,
};

/// Authenticate a client token on behalf of a comet server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnArg {
    /// Opaque token the client sent in its auth frame
    pub token: String,
    /// Comet server the client is attached to
    pub server_id: i32,
}

/// Established session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnReply {
    /// Session key the comet server registers the connection under
    pub key: String,
    /// Room the session joined (`NO_ROOM` for none)
    pub room_id: i32,
    /// Idle interval after which the session is considered dead
    pub heartbeat_secs: u64,
}

/// Tear down a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnArg {
    /// Session key issued by `Connect`
    pub key: String,
    /// Room the session was in
    pub room_id: i32,
}

/// Outcome of a disconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisconnReply {
    /// Whether a route existed for the session
    pub has: bool,
}

/// Session-plane request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionRequest {
    /// Liveness check
    Ping,
    /// Authenticate and record a route
    Connect(Option<ConnArg>),
    /// Remove a route
    Disconnect(Option<DisconnArg>),
}

/// Session-plane success reply.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionReply {
    /// Reply to `Ping`
    Pong,
    /// Reply to `Connect`
    Connected(ConnReply),
    /// Reply to `Disconnect`
    Disconnected(DisconnReply),
}

/// Session-plane response as carried on the wire.
pub type SessionResponse = Result<SessionReply, RpcFault>;

/// Client for the session plane over TCP.
pub type SessionClient = Client<SessionRequest, SessionResponse>;

impl<T> Client<SessionRequest, SessionResponse, T>
where
    T: AsyncRead + AsyncWrite + Unpin,
{
    /// Liveness check.
    pub async fn ping(&self) -> Result<(), RpcError> {
        match self.call(&SessionRequest::Ping).await?? {
            SessionReply::Pong => Ok(()),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Authenticate `token` for a client attached to `server_id`.
    pub async fn connect(
        &self,
        token: impl Into<String>,
        server_id: i32,
    ) -> Result<ConnReply, RpcError> {
        let arg = ConnArg { token: token.into(), server_id };
        match self.call(&SessionRequest::Connect(Some(arg))).await?? {
            SessionReply::Connected(reply) => Ok(reply),
            _ => Err(RpcError::UnexpectedReply),
        }
    }

    /// Remove the route for `key`; returns whether one existed.
    pub async fn disconnect(&self, key: impl Into<String>, room_id: i32) -> Result<bool, RpcError> {
        let arg = DisconnArg { key: key.into(), room_id };
        match self.call(&SessionRequest::Disconnect(Some(arg))).await?? {
            SessionReply::Disconnected(reply) => Ok(reply.has),
            _ => Err(RpcError::UnexpectedReply),
        }
    }
}
