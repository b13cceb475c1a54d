//! RPC between the comet (connection) tier and the logic (session) tier.
//!
//! Two planes share one transport:
//!
//! - the **control** plane ([`control`]) is served by every comet server and
//!   lets the backend push frames to connected sessions;
//! - the **session** plane ([`session`]) is served by the logic tier and lets
//!   comet servers authenticate clients and report disconnects.
//!
//! Messages are CBOR-encoded inside length-delimited frames ([`codec`]).
//! Application failures travel as [`RpcFault`] inside the response so the
//! caller can distinguish them from transport errors.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod codec;
pub mod control;
pub mod error;
pub mod session;
pub mod transport;

pub use control::{ControlClient, ControlReply, ControlRequest, ControlResponse};
pub use error::{RpcError, RpcFault};
pub use session::{SessionClient, SessionReply, SessionRequest, SessionResponse};
pub use transport::{Client, Service, serve, serve_connection};
