//! Frame and packet types.
//!
//! A [`Frame`] is one protocol message: header fields plus a body. A
//! [`Packet`] is what the server writes to a connection: either a frame that
//! still needs a header, or raw bytes that were framed upstream and are
//! written verbatim (used to fan one pre-serialized buffer out to many peers).

use bytes::{BufMut, Bytes, BytesMut};
use serde::{Deserialize, Serialize};

use crate::{
    FrameHeader,
    errors::{ProtocolError, Result},
    operation::OP_RAW,
};

/// A single protocol message.
///
/// Layout on the wire: `[FrameHeader: 16 bytes] + [body: pack_len - 16 bytes]`.
///
/// # Invariants
///
/// - Frames produced by [`Frame::decode`] carry at most
///   [`FrameHeader::MAX_BODY_SIZE`] body bytes.
/// - `version`, `operation` and `sequence` are opaque to the codec and are
///   echoed as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Frame {
    /// Protocol version tag
    pub version: i16,
    /// Operation code
    pub operation: i32,
    /// Caller-chosen correlation id
    pub sequence: i32,
    /// Payload bytes (may be empty)
    pub body: Bytes,
}

impl Frame {
    /// Create a frame with version and sequence zeroed.
    #[must_use]
    pub fn new(operation: i32, body: impl Into<Bytes>) -> Self {
        Self { version: 0, operation, sequence: 0, body: body.into() }
    }

    /// Set the correlation id.
    #[must_use]
    pub fn with_sequence(mut self, sequence: i32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Set the protocol version.
    #[must_use]
    pub fn with_version(mut self, version: i16) -> Self {
        self.version = version;
        self
    }

    /// Build a reply that echoes this frame's version and sequence.
    #[must_use]
    pub fn reply(&self, operation: i32, body: impl Into<Bytes>) -> Self {
        Self { version: self.version, operation, sequence: self.sequence, body: body.into() }
    }

    /// Zero every field so the value can be reused.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Header describing this frame.
    #[must_use]
    pub fn header(&self) -> FrameHeader {
        FrameHeader::new(self.version, self.operation, self.sequence, self.body.len())
    }

    /// Number of bytes [`Frame::encode`] writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        FrameHeader::SIZE + self.body.len()
    }

    /// Encode frame into buffer.
    ///
    /// Writes: `[header (16 bytes)] + [body]`. The header is written even when
    /// the body is empty.
    pub fn encode(&self, dst: &mut impl BufMut) {
        dst.put_slice(&self.header().to_bytes());
        dst.put_slice(&self.body);
    }

    /// Encode into a freshly allocated buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.encoded_len());
        self.encode(&mut buf);
        buf.freeze()
    }

    /// Decode one frame from the start of `bytes`.
    ///
    /// Trailing bytes past `pack_len` are ignored.
    ///
    /// # Errors
    ///
    /// - Any header validation error from [`FrameHeader::from_bytes`]
    /// - `ProtocolError::FrameTruncated` if fewer body bytes are present than
    ///   the header claims
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let header = FrameHeader::from_bytes(bytes)?;
        let body_len = header.body_len();

        let body = bytes.get(FrameHeader::SIZE..FrameHeader::SIZE + body_len).ok_or(
            ProtocolError::FrameTruncated {
                expected: body_len,
                actual: bytes.len().saturating_sub(FrameHeader::SIZE),
            },
        )?;

        Ok(Self {
            version: header.version(),
            operation: header.operation(),
            sequence: header.sequence(),
            body: Bytes::copy_from_slice(body),
        })
    }
}

/// What gets written to a connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Packet {
    /// A frame that is encoded with its header
    Framed(Frame),
    /// Pre-framed bytes written without any header
    Raw(Bytes),
}

impl Packet {
    /// Concatenate already-built frames into one raw buffer.
    ///
    /// The result is written to TCP peers verbatim and split back into
    /// individual messages by the textual WebSocket codec.
    #[must_use]
    pub fn batch<'a>(frames: impl IntoIterator<Item = &'a Frame>) -> Self {
        let mut buf = BytesMut::new();
        for frame in frames {
            frame.encode(&mut buf);
        }
        Self::Raw(buf.freeze())
    }

    /// Number of bytes [`Packet::encode`] writes.
    #[must_use]
    pub fn encoded_len(&self) -> usize {
        match self {
            Self::Framed(frame) => frame.encoded_len(),
            Self::Raw(bytes) => bytes.len(),
        }
    }

    /// Encode for a byte-stream transport.
    pub fn encode(&self, dst: &mut impl BufMut) {
        match self {
            Self::Framed(frame) => frame.encode(dst),
            Self::Raw(bytes) => dst.put_slice(bytes),
        }
    }

    /// Encode into a freshly allocated buffer.
    #[must_use]
    pub fn to_bytes(&self) -> Bytes {
        match self {
            Self::Framed(frame) => frame.to_bytes(),
            Self::Raw(bytes) => bytes.clone(),
        }
    }

    /// Whether this packet bypasses header encoding.
    #[must_use]
    pub fn is_raw(&self) -> bool {
        matches!(self, Self::Raw(_))
    }
}

/// Frames tagged with the legacy [`OP_RAW`] code become raw packets.
impl From<Frame> for Packet {
    fn from(frame: Frame) -> Self {
        if frame.operation == OP_RAW { Self::Raw(frame.body) } else { Self::Framed(frame) }
    }
}
