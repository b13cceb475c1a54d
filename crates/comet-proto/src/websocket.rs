//! Message-oriented transport (WebSocket).
//!
//! The transport already delimits messages, so one message carries one
//! logical frame. Two framings exist:
//!
//! - **Binary** (`binary_framing = true`): the message payload is a complete
//!   frame with its 16-byte header.
//! - **Textual** (`binary_framing = false`): the payload is the body alone and
//!   the header fields are dropped. Deprecated; retained for older clients
//!   that negotiate plain JSON text. Raw batches are split into one text
//!   message per sub-frame, each with its header stripped.

use bytes::Bytes;

use crate::{
    Frame, FrameHeader, Packet,
    errors::{ProtocolError, Result},
};

/// One physical WebSocket message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WsMessage {
    /// Text message (payload is not checked for UTF-8)
    Text(Bytes),
    /// Binary message
    Binary(Bytes),
}

impl WsMessage {
    /// Message payload regardless of kind.
    #[must_use]
    pub fn payload(&self) -> &Bytes {
        match self {
            Self::Text(bytes) | Self::Binary(bytes) => bytes,
        }
    }
}

/// Codec for message-delimited transports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WsCodec {
    binary_framing: bool,
}

impl Default for WsCodec {
    fn default() -> Self {
        Self::binary()
    }
}

impl WsCodec {
    /// Codec with the given framing mode.
    #[must_use]
    pub const fn new(binary_framing: bool) -> Self {
        Self { binary_framing }
    }

    /// Full binary-header framing.
    #[must_use]
    pub const fn binary() -> Self {
        Self::new(true)
    }

    /// Header-stripped textual framing.
    ///
    /// Deprecated: version, operation and sequence are lost in both
    /// directions. Only for legacy clients.
    #[must_use]
    pub const fn text() -> Self {
        Self::new(false)
    }

    /// Whether messages carry the binary header.
    #[must_use]
    pub const fn is_binary(&self) -> bool {
        self.binary_framing
    }

    /// Decode one inbound message payload into a frame.
    ///
    /// # Errors
    ///
    /// - Binary mode: any error from [`Frame::decode`]
    /// - Textual mode: `ProtocolError::FrameTooLarge` if the payload exceeds
    ///   the maximum body size
    pub fn decode(&self, payload: &[u8]) -> Result<Frame> {
        if self.binary_framing {
            return Frame::decode(payload);
        }

        if payload.len() > FrameHeader::MAX_BODY_SIZE as usize {
            return Err(ProtocolError::FrameTooLarge {
                pack_len: (payload.len() + FrameHeader::SIZE) as i32,
                max: FrameHeader::MAX_PACK_SIZE,
            });
        }

        Ok(Frame { body: Bytes::copy_from_slice(payload), ..Frame::default() })
    }

    /// Encode an outbound packet into one or more messages.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::MalformedBatch` if a raw batch cannot be split
    ///   (textual mode only)
    pub fn encode(&self, packet: &Packet) -> Result<Vec<WsMessage>> {
        match (self.binary_framing, packet) {
            (true, packet) => Ok(vec![WsMessage::Binary(packet.to_bytes())]),
            (false, Packet::Framed(frame)) => Ok(vec![WsMessage::Text(frame.body.clone())]),
            (false, Packet::Raw(bytes)) => {
                Ok(split_batch(bytes)?.into_iter().map(WsMessage::Text).collect())
            },
        }
    }
}

/// Split a pre-concatenated batch into the bodies of its sub-frames.
///
/// Each sub-frame is located by its `pack_len`; bodies are zero-copy slices
/// of `batch`. A tail shorter than one header is ignored.
///
/// # Errors
///
/// - `ProtocolError::MalformedBatch` if a sub-frame's `pack_len` is smaller
///   than the header or runs past the end of the batch
pub fn split_batch(batch: &Bytes) -> Result<Vec<Bytes>> {
    let mut bodies = Vec::new();
    let mut offset = 0usize;

    while batch.len() - offset >= FrameHeader::SIZE {
        let header = FrameHeader::parse_unchecked(&batch[offset..])?;
        let pack_len = usize::try_from(header.pack_len())
            .map_err(|_| ProtocolError::MalformedBatch { offset })?;

        if pack_len < FrameHeader::SIZE || pack_len > batch.len() - offset {
            return Err(ProtocolError::MalformedBatch { offset });
        }

        bodies.push(batch.slice(offset + FrameHeader::SIZE..offset + pack_len));
        offset += pack_len;
    }

    Ok(bodies)
}
