//! Server error types.

use std::fmt;

use comet_proto::ProtocolError;
use comet_rpc::RpcError;

/// Errors that end a client session or prevent startup.
#[derive(Debug)]
pub enum ServerError {
    /// Configuration error (unparsable address, bad limits).
    ///
    /// Fatal at startup. Fix configuration and restart.
    Config(String),

    /// Transport/network error (bind failure, socket I/O).
    Transport(String),

    /// Client sent a frame that violates the wire format.
    ///
    /// Fatal for that connection; the server keeps serving others.
    Protocol(ProtocolError),

    /// Client did not complete the auth handshake (wrong first operation or
    /// timeout).
    Handshake(String),

    /// Call to the logic tier failed.
    Logic(RpcError),
}

impl fmt::Display for ServerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "configuration error: {msg}"),
            Self::Transport(msg) => write!(f, "transport error: {msg}"),
            Self::Protocol(err) => write!(f, "protocol error: {err}"),
            Self::Handshake(msg) => write!(f, "handshake failed: {msg}"),
            Self::Logic(err) => write!(f, "logic tier error: {err}"),
        }
    }
}

impl std::error::Error for ServerError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Protocol(err) => Some(err),
            Self::Logic(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ProtocolError> for ServerError {
    fn from(err: ProtocolError) -> Self {
        Self::Protocol(err)
    }
}

impl From<RpcError> for ServerError {
    fn from(err: RpcError) -> Self {
        Self::Logic(err)
    }
}

impl From<std::io::Error> for ServerError {
    fn from(err: std::io::Error) -> Self {
        Self::Transport(err.to_string())
    }
}
