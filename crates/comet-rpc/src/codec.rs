//! Message encoding: CBOR bodies inside length-delimited frames.

use bytes::Bytes;
use serde::{Serialize, de::DeserializeOwned};
use tokio_util::codec::LengthDelimitedCodec;

use crate::error::RpcError;

/// Largest RPC message accepted (4 MiB). Multi-target pushes dominate size.
pub const MAX_MESSAGE_SIZE: usize = 4 * 1024 * 1024;

/// Length-delimited framing used on every RPC connection.
pub fn framing() -> LengthDelimitedCodec {
    LengthDelimitedCodec::builder().max_frame_length(MAX_MESSAGE_SIZE).new_codec()
}

/// Serialize a message to CBOR.
pub fn encode<T: Serialize>(message: &T) -> Result<Bytes, RpcError> {
    let mut bytes = Vec::new();
    ciborium::into_writer(message, &mut bytes).map_err(|e| RpcError::Encode(e.to_string()))?;
    Ok(Bytes::from(bytes))
}

/// Deserialize a message from CBOR.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, RpcError> {
    ciborium::from_reader(bytes).map_err(|e| RpcError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control::{ControlRequest, PushMsgArg};

    #[test]
    fn absent_argument_survives_encoding() {
        let request = ControlRequest::PushMsg(None);
        let bytes = encode(&request).unwrap();
        assert_eq!(decode::<ControlRequest>(&bytes).unwrap(), request);
    }

    #[test]
    fn frame_body_survives_encoding() {
        let frame = comet_proto::Frame::new(4, "hello").with_sequence(9);
        let request =
            ControlRequest::PushMsg(Some(PushMsgArg { key: "1_0".to_string(), frame }));

        let bytes = encode(&request).unwrap();
        assert_eq!(decode::<ControlRequest>(&bytes).unwrap(), request);
    }

    #[test]
    fn garbage_is_a_decode_error() {
        let result = decode::<ControlRequest>(&[0xFF, 0x00, 0x13]);
        assert!(matches!(result, Err(RpcError::Decode(_))));
    }
}
