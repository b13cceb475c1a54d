//! Fuzz target for the WebSocket codec
//!
//! # Strategy
//!
//! - Binary: arbitrary payloads through binary-mode decode
//! - Text: arbitrary payloads through the deprecated textual decode
//! - Batch: arbitrary buffers through raw batch demultiplexing
//!
//! # Invariants
//!
//! - NEVER panic on any payload
//! - Every split sub-message is no longer than the batch it came from

#![no_main]

use arbitrary::Arbitrary;
use bytes::Bytes;
use comet_proto::{WsCodec, websocket};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
enum Input {
    Binary(Vec<u8>),
    Text(Vec<u8>),
    Batch(Vec<u8>),
}

fuzz_target!(|input: Input| {
    match input {
        Input::Binary(payload) => {
            let _ = WsCodec::binary().decode(&payload);
        },
        Input::Text(payload) => {
            let _ = WsCodec::text().decode(&payload);
        },
        Input::Batch(buffer) => {
            let batch = Bytes::from(buffer);
            if let Ok(parts) = websocket::split_batch(&batch) {
                let total: usize = parts.iter().map(Bytes::len).sum();
                assert!(total <= batch.len());
            }
        },
    }
});
