//! Pluggable byte encoding for transport messages.

use thiserror::Error;

use crate::message::Message;

/// Wire codec failure.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Codec error: {0}")]
    Other(String),
}

/// Reversible byte encoding of a [`Message`].
///
/// The engine does not care how messages become bytes; any self-describing
/// encoding that can round-trip the message structure is acceptable.
pub trait WireCodec {
    /// Encode a message to bytes.
    ///
    /// # Errors
    /// Returns error if the message cannot be encoded.
    fn encode(&self, message: &Message) -> Result<Vec<u8>, CodecError>;

    /// Decode a message from bytes.
    ///
    /// # Errors
    /// Returns error if the payload is not a valid encoding of a message.
    fn decode(&self, payload: &[u8]) -> Result<Message, CodecError>;
}

/// Default codec: UTF-8 JSON text.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

impl WireCodec for JsonCodec {
    fn encode(&self, message: &Message) -> Result<Vec<u8>, CodecError> {
        Ok(serde_json::to_vec(message)?)
    }

    fn decode(&self, payload: &[u8]) -> Result<Message, CodecError> {
        Ok(serde_json::from_slice(payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::WireValue;

    #[test]
    fn test_json_roundtrip() {
        let message = Message::new(WireValue::Text("☃".to_string()));
        let bytes = JsonCodec.encode(&message).unwrap();
        let decoded = JsonCodec.decode(&bytes).unwrap();
        assert_eq!(decoded, message);
    }

    #[test]
    fn test_garbage_rejected() {
        assert!(JsonCodec.decode(b"not json").is_err());
    }
}
