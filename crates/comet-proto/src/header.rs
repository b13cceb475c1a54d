//! Frame header implementation with zero-copy parsing.
//!
//! The header is a fixed 16-byte big-endian structure:
//!
//! ```text
//! 0      4        6        8          12         16
//! ├──────┼────────┼────────┼──────────┼──────────┤
//! │ pack │ header │ version│ operation│ sequence │
//! │ i32  │ i16    │ i16    │ i32      │ i32      │
//! └──────┴────────┴────────┴──────────┴──────────┘
//! ```
//!
//! `pack` is the total frame length (header + body). `header` is always 16
//! and is re-validated on every decode.

use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::errors::{ProtocolError, Result};

/// Fixed 16-byte frame header (Big Endian network byte order)
///
/// Fields are stored as raw byte arrays so the struct has alignment 1 and can
/// be cast directly from untrusted network bytes; every 16-byte pattern is a
/// valid `FrameHeader`. Semantic validation happens in [`Self::from_bytes`].
#[repr(C, packed)]
#[derive(Clone, Copy, FromBytes, IntoBytes, KnownLayout, Immutable)]
pub struct FrameHeader {
    pack_len: [u8; 4],   // i32 header + body length
    header_len: [u8; 2], // i16 always 16
    version: [u8; 2],    // i16 protocol version, echoed
    operation: [u8; 4],  // i32 operation code
    sequence: [u8; 4],   // i32 client correlation id
}

impl FrameHeader {
    /// Size of the serialized header (16 bytes)
    pub const SIZE: usize = 16;

    /// Header length value carried in every valid frame
    pub const HEADER_LEN: i16 = 16;

    /// Maximum body size accepted on decode (1 KiB)
    pub const MAX_BODY_SIZE: i32 = 1 << 10;

    /// Maximum pack length accepted on decode (header + max body)
    pub const MAX_PACK_SIZE: i32 = Self::MAX_BODY_SIZE + Self::HEADER_LEN as i32;

    /// Create a header describing a frame with a `body_len`-byte body.
    #[must_use]
    pub fn new(version: i16, operation: i32, sequence: i32, body_len: usize) -> Self {
        let pack_len = (Self::SIZE + body_len) as i32;
        Self {
            pack_len: pack_len.to_be_bytes(),
            header_len: Self::HEADER_LEN.to_be_bytes(),
            version: version.to_be_bytes(),
            operation: operation.to_be_bytes(),
            sequence: sequence.to_be_bytes(),
        }
    }

    /// Parse and validate a header from network bytes (zero-copy).
    ///
    /// Checks run in the same order the peer would violate them: pack length
    /// bound first, then the header length constant, then that the pack
    /// length can hold the header at all.
    ///
    /// # Errors
    ///
    /// - `ProtocolError::FrameTooShort` if fewer than 16 bytes are available
    /// - `ProtocolError::FrameTooLarge` if pack length exceeds
    ///   [`Self::MAX_PACK_SIZE`]
    /// - `ProtocolError::HeaderLengthMismatch` if header length is not 16
    /// - `ProtocolError::PackLengthTooSmall` if pack length is below 16
    pub fn from_bytes(bytes: &[u8]) -> Result<&Self> {
        let header = Self::parse_unchecked(bytes)?;

        let pack_len = header.pack_len();
        if pack_len > Self::MAX_PACK_SIZE {
            return Err(ProtocolError::FrameTooLarge { pack_len, max: Self::MAX_PACK_SIZE });
        }

        let header_len = header.header_len();
        if header_len != Self::HEADER_LEN {
            return Err(ProtocolError::HeaderLengthMismatch {
                expected: Self::HEADER_LEN,
                actual: header_len,
            });
        }

        if pack_len < i32::from(header_len) {
            return Err(ProtocolError::PackLengthTooSmall { pack_len, header_len });
        }

        Ok(header)
    }

    /// Cast the first 16 bytes to a header without semantic validation.
    ///
    /// Used when walking batches the server produced itself, where bodies may
    /// legitimately exceed the inbound size limit.
    pub fn parse_unchecked(bytes: &[u8]) -> Result<&Self> {
        Self::ref_from_prefix(bytes)
            .map(|(header, _)| header)
            .map_err(|_| ProtocolError::FrameTooShort { expected: Self::SIZE, actual: bytes.len() })
    }

    /// Serialize header to bytes (zero-copy)
    #[must_use]
    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut arr = [0u8; Self::SIZE];
        arr.copy_from_slice(IntoBytes::as_bytes(self));
        arr
    }

    /// Total frame length (header + body).
    #[must_use]
    pub fn pack_len(&self) -> i32 {
        i32::from_be_bytes(self.pack_len)
    }

    /// Declared header length.
    #[must_use]
    pub fn header_len(&self) -> i16 {
        i16::from_be_bytes(self.header_len)
    }

    /// Protocol version tag.
    #[must_use]
    pub fn version(&self) -> i16 {
        i16::from_be_bytes(self.version)
    }

    /// Operation code.
    #[must_use]
    pub fn operation(&self) -> i32 {
        i32::from_be_bytes(self.operation)
    }

    /// Client correlation id.
    #[must_use]
    pub fn sequence(&self) -> i32 {
        i32::from_be_bytes(self.sequence)
    }

    /// Body length implied by pack and header lengths (0 if negative).
    #[must_use]
    pub fn body_len(&self) -> usize {
        let body = self.pack_len() - i32::from(self.header_len());
        usize::try_from(body).unwrap_or(0)
    }
}

// Manual Debug implementation (can't derive due to packed repr)
impl std::fmt::Debug for FrameHeader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameHeader")
            .field("pack_len", &self.pack_len())
            .field("header_len", &self.header_len())
            .field("version", &self.version())
            .field("operation", &self.operation())
            .field("sequence", &self.sequence())
            .finish()
    }
}

// Manual PartialEq implementation (can't derive due to packed repr)
impl PartialEq for FrameHeader {
    fn eq(&self, other: &Self) -> bool {
        self.to_bytes() == other.to_bytes()
    }
}

impl Eq for FrameHeader {}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    fn raw_header(pack_len: i32, header_len: i16) -> [u8; 16] {
        let mut buf = [0u8; 16];
        buf[0..4].copy_from_slice(&pack_len.to_be_bytes());
        buf[4..6].copy_from_slice(&header_len.to_be_bytes());
        buf
    }

    #[test]
    fn header_size() {
        assert_eq!(std::mem::size_of::<FrameHeader>(), FrameHeader::SIZE);
        assert_eq!(FrameHeader::MAX_PACK_SIZE, 1040);
    }

    #[test]
    fn header_layout_is_big_endian() {
        let header = FrameHeader::new(1, 0x0102_0304, -1, 4);
        let bytes = header.to_bytes();

        assert_eq!(&bytes[0..4], &[0, 0, 0, 20]);
        assert_eq!(&bytes[4..6], &[0, 16]);
        assert_eq!(&bytes[6..8], &[0, 1]);
        assert_eq!(&bytes[8..12], &[1, 2, 3, 4]);
        assert_eq!(&bytes[12..16], &[0xFF, 0xFF, 0xFF, 0xFF]);
    }

    proptest! {
        #[test]
        fn header_round_trip(
            version in any::<i16>(),
            operation in any::<i32>(),
            sequence in any::<i32>(),
            body_len in 0usize..=1024,
        ) {
            let header = FrameHeader::new(version, operation, sequence, body_len);
            let bytes = header.to_bytes();
            let parsed = FrameHeader::from_bytes(&bytes).expect("should parse");

            prop_assert_eq!(&header, parsed);
            prop_assert_eq!(parsed.body_len(), body_len);
            prop_assert_eq!(parsed.version(), version);
            prop_assert_eq!(parsed.operation(), operation);
            prop_assert_eq!(parsed.sequence(), sequence);
        }
    }

    #[test]
    fn reject_short_buffer() {
        let result = FrameHeader::from_bytes(&[0u8; 10]);
        assert_eq!(result, Err(ProtocolError::FrameTooShort { expected: 16, actual: 10 }));
    }

    #[test]
    fn reject_oversized_pack() {
        let buf = raw_header(2000, 16);
        let result = FrameHeader::from_bytes(&buf);
        assert_eq!(result, Err(ProtocolError::FrameTooLarge { pack_len: 2000, max: 1040 }));
    }

    #[test]
    fn reject_header_length_mismatch() {
        let buf = raw_header(36, 20);
        let result = FrameHeader::from_bytes(&buf);
        assert_eq!(result, Err(ProtocolError::HeaderLengthMismatch { expected: 16, actual: 20 }));
    }

    #[test]
    fn reject_pack_shorter_than_header() {
        let buf = raw_header(8, 16);
        let result = FrameHeader::from_bytes(&buf);
        assert_eq!(result, Err(ProtocolError::PackLengthTooSmall { pack_len: 8, header_len: 16 }));
    }

    #[test]
    fn accept_maximum_pack() {
        let buf = raw_header(1040, 16);
        let header = FrameHeader::from_bytes(&buf).expect("max pack is valid");
        assert_eq!(header.body_len(), 1024);
    }

    #[test]
    fn unchecked_parse_skips_limits() {
        let buf = raw_header(5000, 16);
        let header = FrameHeader::parse_unchecked(&buf).expect("length is enough");
        assert_eq!(header.pack_len(), 5000);
    }
}
