//! RPC error types.
//!
//! [`RpcFault`] is the application-level failure a service reports; it is
//! serialized and crosses the wire intact. [`RpcError`] is what a caller sees:
//! either a fault from the remote service or a local transport problem.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Failure reported by a remote service.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RpcFault {
    /// Argument structure absent or malformed; nothing was changed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Session key was not produced by the key codec.
    #[error("malformed key: {0}")]
    MalformedKey(String),

    /// A connection refused a frame during a multi-target push.
    ///
    /// `index` is the last target that was delivered to before the failure,
    /// or -1 if none was.
    #[error("delivery failed (last delivered index {index}): {reason}")]
    Delivery {
        /// Last matched target index before the failure
        index: i32,
        /// Why the connection refused the frame
        reason: String,
    },

    /// A downstream collaborator (route store, logic tier) failed.
    #[error("downstream failure: {0}")]
    Downstream(String),

    /// The service could not complete the request for a local reason.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors from issuing or serving an RPC.
#[derive(Error, Debug)]
pub enum RpcError {
    /// Socket-level failure
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Message could not be serialized
    #[error("encode error: {0}")]
    Encode(String),

    /// Message could not be deserialized
    #[error("decode error: {0}")]
    Decode(String),

    /// Peer closed the connection before replying
    #[error("connection closed")]
    Closed,

    /// Reply variant does not match the request
    #[error("unexpected reply")]
    UnexpectedReply,

    /// Remote service reported a failure
    #[error(transparent)]
    Fault(#[from] RpcFault),
}

impl RpcError {
    /// Remote fault, if this error came from the service rather than the
    /// transport.
    pub fn fault(&self) -> Option<&RpcFault> {
        match self {
            Self::Fault(fault) => Some(fault),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fault_display() {
        let fault = RpcFault::Delivery { index: 2, reason: "queue full".to_string() };
        assert_eq!(fault.to_string(), "delivery failed (last delivered index 2): queue full");

        let fault = RpcFault::InvalidArgument("missing PushMsg argument".to_string());
        assert_eq!(fault.to_string(), "invalid argument: missing PushMsg argument");
    }

    #[test]
    fn fault_is_transparent_through_rpc_error() {
        let err = RpcError::from(RpcFault::MalformedKey("abc".to_string()));
        assert_eq!(err.to_string(), "malformed key: abc");
        assert_eq!(err.fault(), Some(&RpcFault::MalformedKey("abc".to_string())));
        assert!(RpcError::Closed.fault().is_none());
    }
}
