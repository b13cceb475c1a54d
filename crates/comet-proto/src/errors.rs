//! Protocol error types.

use thiserror::Error;

/// Convenience alias used throughout the codec.
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors produced while encoding or decoding frames.
///
/// Header violations (`FrameTooLarge`, `HeaderLengthMismatch`,
/// `PackLengthTooSmall`) leave the stream at an unknown offset, so the
/// connection that produced them cannot be resynchronized.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    /// Buffer is shorter than a frame header
    #[error("frame too short: expected at least {expected} bytes, got {actual}")]
    FrameTooShort {
        /// Minimum number of bytes required
        expected: usize,
        /// Number of bytes available
        actual: usize,
    },

    /// Declared pack length exceeds header + maximum body size
    #[error("pack length {pack_len} exceeds maximum {max}")]
    FrameTooLarge {
        /// Pack length declared by the peer
        pack_len: i32,
        /// Largest acceptable pack length
        max: i32,
    },

    /// Declared header length differs from the protocol constant
    #[error("header length mismatch: expected {expected}, got {actual}")]
    HeaderLengthMismatch {
        /// The only valid header length
        expected: i16,
        /// Header length declared by the peer
        actual: i16,
    },

    /// Declared pack length cannot even hold the header
    #[error("pack length {pack_len} is smaller than header length {header_len}")]
    PackLengthTooSmall {
        /// Pack length declared by the peer
        pack_len: i32,
        /// Header length declared by the peer
        header_len: i16,
    },

    /// Body is shorter than the header claims
    #[error("frame truncated: expected {expected} body bytes, got {actual}")]
    FrameTruncated {
        /// Body length declared by the header
        expected: usize,
        /// Body bytes actually present
        actual: usize,
    },

    /// A pre-concatenated raw batch contains a sub-frame that does not fit
    #[error("malformed raw batch at offset {offset}")]
    MalformedBatch {
        /// Byte offset of the offending sub-frame
        offset: usize,
    },

    /// Peer closed the stream (possibly mid-frame)
    #[error("connection closed")]
    ConnectionClosed,

    /// Underlying transport failed
    #[error("transport error: {0}")]
    Transport(String),
}

impl ProtocolError {
    /// Whether the connection that produced this error must be torn down.
    ///
    /// Only a malformed outbound batch is local to a single push; everything
    /// else means the inbound stream can no longer be trusted.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Self::MalformedBatch { .. })
    }
}

impl From<std::io::Error> for ProtocolError {
    fn from(err: std::io::Error) -> Self {
        if err.kind() == std::io::ErrorKind::UnexpectedEof {
            Self::ConnectionClosed
        } else {
            Self::Transport(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_violations_are_fatal() {
        assert!(ProtocolError::FrameTooLarge { pack_len: 2000, max: 1040 }.is_fatal());
        assert!(ProtocolError::HeaderLengthMismatch { expected: 16, actual: 20 }.is_fatal());
        assert!(ProtocolError::ConnectionClosed.is_fatal());
    }

    #[test]
    fn malformed_batch_is_local() {
        assert!(!ProtocolError::MalformedBatch { offset: 0 }.is_fatal());
    }

    #[test]
    fn eof_maps_to_closed() {
        let err = std::io::Error::new(std::io::ErrorKind::UnexpectedEof, "eof");
        assert_eq!(ProtocolError::from(err), ProtocolError::ConnectionClosed);

        let err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset");
        assert!(matches!(ProtocolError::from(err), ProtocolError::Transport(_)));
    }
}
