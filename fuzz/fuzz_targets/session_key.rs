//! Fuzz target for session key decoding
//!
//! # Invariants
//!
//! - NEVER panic on arbitrary strings
//! - Anything that decodes is the canonical encoding of what it decoded to
//! - Decoded subscriber ids are positive and sequences non-negative

#![no_main]

use comet_logic::key;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|input: &str| {
    if let Ok((uid, seq)) = key::decode(input) {
        assert!(uid > 0);
        assert!(seq >= 0);
        assert_eq!(key::encode(uid, seq), input);
    }
});
