//! Error types for the protocol layer.

use crate::ErrorKind;

/// Errors raised while parsing request parameters or encoding records.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization failed (turning a Rust type into bytes).
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// Deserialization failed. Malformed JSON, missing fields, wrong types.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),

    /// A primitive request parameter could not be parsed or is out of
    /// range, e.g. `interval=abc` or `num=91`.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            #[cfg(feature = "json")]
            Self::Encode(_) => ErrorKind::Internal,
            #[cfg(feature = "json")]
            Self::Decode(_) => ErrorKind::InvalidInput,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
        }
    }
}
