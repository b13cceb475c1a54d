//! Byte-stream transport.
//!
//! Reads suspend the caller until a whole frame is available. The header is
//! validated before the body is read, so an oversized `pack_len` never causes
//! an allocation.

use bytes::BytesMut;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::{Frame, FrameHeader, Packet, errors::Result};

/// Read exactly one frame from `reader`.
///
/// Consumes `pack_len` bytes and nothing more, leaving the stream positioned
/// at the next frame.
///
/// # Errors
///
/// - Header validation errors (connection-fatal)
/// - `ProtocolError::ConnectionClosed` if the stream ends before the frame
///   is complete
/// - `ProtocolError::Transport` for other I/O failures
pub async fn read_frame<R>(reader: &mut R) -> Result<Frame>
where
    R: AsyncRead + Unpin,
{
    let mut head = [0u8; FrameHeader::SIZE];
    reader.read_exact(&mut head).await?;

    let header = FrameHeader::from_bytes(&head)?;
    let body_len = header.body_len();

    let mut body = BytesMut::zeroed(body_len);
    if body_len > 0 {
        reader.read_exact(&mut body).await?;
    }

    Ok(Frame {
        version: header.version(),
        operation: header.operation(),
        sequence: header.sequence(),
        body: body.freeze(),
    })
}

/// Write one packet to `writer`.
///
/// Raw packets are written verbatim. The caller decides when to flush.
pub async fn write_packet<W>(writer: &mut W, packet: &Packet) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match packet {
        Packet::Framed(frame) => {
            writer.write_all(&frame.header().to_bytes()).await?;
            if !frame.body.is_empty() {
                writer.write_all(&frame.body).await?;
            }
        },
        Packet::Raw(bytes) => writer.write_all(bytes).await?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;
    use crate::{
        ProtocolError,
        operation::{OP_HEARTBEAT, OP_SEND_SMS},
    };

    #[tokio::test]
    async fn reads_consecutive_frames() {
        let a = Frame::new(OP_HEARTBEAT, Bytes::new()).with_sequence(1);
        let b = Frame::new(OP_SEND_SMS, "body").with_sequence(2);

        let mut wire = Vec::new();
        write_packet(&mut wire, &Packet::Framed(a.clone())).await.unwrap();
        write_packet(&mut wire, &Packet::Framed(b.clone())).await.unwrap();

        let mut reader = wire.as_slice();
        assert_eq!(read_frame(&mut reader).await.unwrap(), a);
        assert_eq!(read_frame(&mut reader).await.unwrap(), b);
        assert_eq!(read_frame(&mut reader).await, Err(ProtocolError::ConnectionClosed));
    }

    #[tokio::test]
    async fn waits_for_split_writes() {
        let frame = Frame::new(OP_SEND_SMS, vec![7u8; 300]);
        let wire = frame.to_bytes();
        let (mut client, mut server) = tokio::io::duplex(64);

        let writer = tokio::spawn(async move {
            for chunk in wire.chunks(10) {
                client.write_all(chunk).await.unwrap();
                tokio::task::yield_now().await;
            }
        });

        assert_eq!(read_frame(&mut server).await.unwrap(), frame);
        writer.await.unwrap();
    }

    #[tokio::test]
    async fn rejects_oversized_frame_without_reading_body() {
        let mut wire = Vec::new();
        wire.extend_from_slice(&2000i32.to_be_bytes());
        wire.extend_from_slice(&16i16.to_be_bytes());
        wire.extend_from_slice(&[0u8; 10]);

        let mut reader = wire.as_slice();
        let result = read_frame(&mut reader).await;
        assert_eq!(result, Err(ProtocolError::FrameTooLarge { pack_len: 2000, max: 1040 }));
    }

    #[tokio::test]
    async fn mid_body_eof_is_closed() {
        let frame = Frame::new(OP_SEND_SMS, vec![1u8; 50]);
        let wire = frame.to_bytes();

        let mut reader = &wire[..30];
        assert_eq!(read_frame(&mut reader).await, Err(ProtocolError::ConnectionClosed));
    }

    #[tokio::test]
    async fn raw_packet_has_no_header() {
        let mut wire = Vec::new();
        write_packet(&mut wire, &Packet::Raw(Bytes::from_static(b"xyz"))).await.unwrap();
        assert_eq!(wire, b"xyz");
    }
}
