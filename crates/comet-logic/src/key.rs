//! Session key codec.
//!
//! A session key names one connection of one subscriber: `"{uid}_{seq}"` in
//! canonical decimal. The format is stable; comet servers and the backend
//! treat keys as opaque strings.
//!
//! Encoding is a bijection between `(uid > 0, seq >= 0)` and the set of
//! canonical keys. Decoding rejects every other string, including
//! non-canonical spellings of a valid pair (`"+1_0"`, `"01_0"`).

use comet_rpc::RpcFault;
use thiserror::Error;

const SEPARATOR: char = '_';

/// String was not produced by [`encode`].
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed session key {0:?}")]
pub struct MalformedKey(pub String);

impl From<MalformedKey> for RpcFault {
    fn from(err: MalformedKey) -> Self {
        Self::MalformedKey(err.0)
    }
}

/// Session key for connection `seq` of subscriber `uid`.
///
/// Only `uid > 0` and `seq >= 0` produce keys that [`decode`] accepts.
pub fn encode(uid: i64, seq: i32) -> String {
    format!("{uid}{SEPARATOR}{seq}")
}

/// Recover `(uid, seq)` from a session key.
pub fn decode(key: &str) -> Result<(i64, i32), MalformedKey> {
    let malformed = || MalformedKey(key.to_string());

    let (uid, seq) = key.split_once(SEPARATOR).ok_or_else(malformed)?;
    let uid: i64 = uid.parse().map_err(|_| malformed())?;
    let seq: i32 = seq.parse().map_err(|_| malformed())?;

    if uid <= 0 || seq < 0 || encode(uid, seq) != key {
        return Err(malformed());
    }
    Ok((uid, seq))
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn known_encoding() {
        assert_eq!(encode(42, 0), "42_0");
        assert_eq!(decode("42_7"), Ok((42, 7)));
    }

    #[test]
    fn foreign_strings_are_malformed() {
        for key in
            ["", "_", "42", "42_", "_7", "0_1", "-3_1", "3_-1", "+3_1", "03_1", "3_01", "a_b", "3_1_2"]
        {
            assert_eq!(decode(key), Err(MalformedKey(key.to_string())), "{key:?}");
        }
    }

    #[test]
    fn overflow_is_malformed() {
        assert!(decode("9223372036854775808_0").is_err());
        assert!(decode("1_2147483648").is_err());
    }

    proptest! {
        #[test]
        fn encode_decode_bijection(uid in 1i64..=i64::MAX, seq in 0i32..=i32::MAX) {
            prop_assert_eq!(decode(&encode(uid, seq)), Ok((uid, seq)));
        }

        #[test]
        fn decode_accepts_only_canonical(key in "\\PC{0,24}") {
            if let Ok((uid, seq)) = decode(&key) {
                prop_assert_eq!(encode(uid, seq), key);
            }
        }
    }
}
