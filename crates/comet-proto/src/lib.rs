//! Wire format for the comet push protocol.
//!
//! Every message is a fixed 16-byte big-endian header followed by a body of
//! at most 1 KiB. The same frame is carried over a byte stream (TCP, see
//! [`tcp`]) and over message-delimited WebSocket connections (see
//! [`websocket`]).
//!
//! Outbound traffic is modelled as a [`Packet`]: a [`Frame`] that still needs
//! its header, or raw bytes framed upstream. Raw packets let the server write
//! one pre-serialized batch to many peers without re-encoding per peer.
//!
//! # Security
//!
//! Header parsing uses compile-time verified layouts via `zerocopy`. The pack
//! length is bounded before any body allocation, and the header length is
//! re-validated on every frame so protocol drift is caught immediately.
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod frame;
pub mod header;
pub mod operation;
pub mod tcp;
pub mod websocket;

pub use errors::{ProtocolError, Result};
pub use frame::{Frame, Packet};
pub use header::FrameHeader;
pub use websocket::{WsCodec, WsMessage};
