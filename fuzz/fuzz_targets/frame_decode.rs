//! Fuzz target for Frame::decode and header validation
//!
//! This fuzzer tests frame decoding with arbitrary byte sequences to find:
//! - Parser crashes or panics
//! - Integer overflows in pack/header length arithmetic
//! - Buffer over-reads when the body is shorter than declared
//!
//! # Invariants
//!
//! - NEVER panic; invalid inputs return an error
//! - A decoded frame re-encodes to exactly the bytes it consumed

#![no_main]

use comet_proto::{Frame, FrameHeader};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let Ok(frame) = Frame::decode(data) else {
        return;
    };

    let header = FrameHeader::from_bytes(data).expect("decode accepted the header");
    let consumed = header.pack_len() as usize;
    assert_eq!(frame.to_bytes().as_ref(), &data[..consumed]);
});
