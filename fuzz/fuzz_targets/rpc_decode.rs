//! Fuzz target for RPC message decoding
//!
//! Control and session requests arrive as CBOR from other tiers. Malformed
//! or hostile bodies must be rejected, not crash the server.
//!
//! # Invariants
//!
//! - NEVER panic on arbitrary bytes
//! - Huge claimed lengths are rejected rather than allocated

#![no_main]

use comet_rpc::{ControlRequest, SessionRequest, codec};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = codec::decode::<ControlRequest>(data);
    let _ = codec::decode::<SessionRequest>(data);
});
