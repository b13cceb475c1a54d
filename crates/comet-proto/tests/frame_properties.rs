//! Property-based tests for frame encoding/decoding
//!
//! These tests verify that frame serialization is correct for ALL valid
//! inputs, across both the stream and the message transports.

use bytes::Bytes;
use comet_proto::{
    Frame, FrameHeader, Packet, ProtocolError, WsCodec,
    operation::{OP_AUTH, OP_HEARTBEAT, OP_RAW, OP_SEND_SMS},
    tcp, websocket,
};
use proptest::prelude::*;

/// Strategy for generating operation codes, biased toward known ones
fn arbitrary_operation() -> impl Strategy<Value = i32> {
    prop_oneof![
        Just(OP_HEARTBEAT),
        Just(OP_SEND_SMS),
        Just(OP_AUTH),
        any::<i32>().prop_filter("raw is not a framed operation", |op| *op != OP_RAW),
    ]
}

/// Strategy for generating frames with bodies up to the maximum size
fn arbitrary_frame() -> impl Strategy<Value = Frame> {
    (
        any::<i16>(),
        arbitrary_operation(),
        any::<i32>(),
        prop::collection::vec(any::<u8>(), 0..=FrameHeader::MAX_BODY_SIZE as usize),
    )
        .prop_map(|(version, operation, sequence, body)| Frame {
            version,
            operation,
            sequence,
            body: Bytes::from(body),
        })
}

#[test]
fn prop_frame_encode_decode_roundtrip() {
    proptest!(|(frame in arbitrary_frame())| {
        let buf = frame.to_bytes();

        // PROPERTY: serialized length is header + body
        prop_assert_eq!(buf.len(), FrameHeader::SIZE + frame.body.len());

        // PROPERTY: round-trip must be identity
        let decoded = Frame::decode(&buf).expect("decode should succeed");
        prop_assert_eq!(decoded, frame);
    });
}

#[test]
fn prop_binary_websocket_roundtrip() {
    let codec = WsCodec::binary();
    proptest!(|(frame in arbitrary_frame())| {
        let messages = codec.encode(&Packet::Framed(frame.clone())).expect("encode");
        prop_assert_eq!(messages.len(), 1);

        let decoded = codec.decode(messages[0].payload()).expect("decode");
        prop_assert_eq!(decoded, frame);
    });
}

#[test]
fn prop_batch_split_recovers_bodies() {
    proptest!(|(frames in prop::collection::vec(arbitrary_frame(), 0..8))| {
        let Packet::Raw(batch) = Packet::batch(&frames) else {
            return Err(TestCaseError::fail("batch must be raw"));
        };

        let bodies = websocket::split_batch(&batch).expect("split");
        let expected: Vec<Bytes> = frames.iter().map(|f| f.body.clone()).collect();
        prop_assert_eq!(bodies, expected);
    });
}

#[test]
fn prop_decode_never_panics_on_garbage() {
    proptest!(|(bytes in prop::collection::vec(any::<u8>(), 0..2048))| {
        let _ = Frame::decode(&bytes);
        let _ = WsCodec::binary().decode(&bytes);
    });
}

#[tokio::test]
async fn stream_of_frames_decodes_in_order() {
    let frames: Vec<Frame> = (0..20)
        .map(|i| Frame::new(OP_SEND_SMS, vec![i as u8; i * 13]).with_sequence(i as i32))
        .collect();

    let mut wire = Vec::new();
    for frame in &frames {
        tcp::write_packet(&mut wire, &Packet::Framed(frame.clone())).await.unwrap();
    }

    let mut reader = wire.as_slice();
    for frame in &frames {
        assert_eq!(&tcp::read_frame(&mut reader).await.unwrap(), frame);
    }
}

#[test]
fn pack_len_2000_is_too_large() {
    let mut buf = [0u8; 16];
    buf[0..4].copy_from_slice(&2000i32.to_be_bytes());
    buf[4..6].copy_from_slice(&16i16.to_be_bytes());

    assert_eq!(
        Frame::decode(&buf),
        Err(ProtocolError::FrameTooLarge { pack_len: 2000, max: FrameHeader::MAX_PACK_SIZE })
    );
}

#[test]
fn header_len_20_is_a_mismatch() {
    let mut buf = [0u8; 16];
    buf[0..4].copy_from_slice(&20i32.to_be_bytes());
    buf[4..6].copy_from_slice(&20i16.to_be_bytes());

    assert_eq!(
        Frame::decode(&buf),
        Err(ProtocolError::HeaderLengthMismatch { expected: 16, actual: 20 })
    );
}
