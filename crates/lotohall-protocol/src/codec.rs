//! Codec trait and implementations for serializing snapshots and records.
//!
//! The engine itself never touches bytes. Transports and the file-backed
//! persistence sink go through a [`Codec`] so the format can be swapped
//! without touching callers.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes Rust values to bytes and decodes them back.
///
/// `Send + Sync + 'static` because codecs live inside long-lived engine
/// state shared across Tokio tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    ///
    /// # Errors
    /// Returns `ProtocolError::Encode` if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    ///
    /// # Errors
    /// Returns `ProtocolError::Decode` if the bytes are malformed or don't
    /// match `T`.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

// ---------------------------------------------------------------------------
// JsonCodec
// ---------------------------------------------------------------------------

/// A [`Codec`] backed by `serde_json`.
///
/// ## Example
///
/// ```rust
/// use lotohall_protocol::{Codec, JsonCodec, RoomId, RoomListEntry};
///
/// let codec = JsonCodec;
/// let entry = RoomListEntry {
///     id: RoomId::from("R1"),
///     player_count: 2,
///     running: true,
/// };
///
/// let bytes = codec.encode(&entry).unwrap();
/// let decoded: RoomListEntry = codec.decode(&bytes).unwrap();
/// assert_eq!(entry, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
