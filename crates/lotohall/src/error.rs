//! Unified error type for the Lotohall engine.

use lotohall_protocol::{ErrorKind, ProtocolError};
use lotohall_room::RoomError;
use lotohall_session::SessionError;

use crate::sink::SinkError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `lotohall` facade you deal with this single error type
/// instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum LotoError {
    /// A protocol-level error (encode, decode, bad parameter).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// An admin authorization error.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room-level error (not found, wrong secret, refused by state).
    #[error(transparent)]
    Room(#[from] RoomError),

    /// The persistence sink failed.
    #[error(transparent)]
    Sink(#[from] SinkError),
}

impl LotoError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Protocol(e) => e.kind(),
            Self::Session(e) => e.kind(),
            Self::Room(e) => e.kind(),
            Self::Sink(_) => ErrorKind::Internal,
        }
    }

    /// HTTP-style status code for transports.
    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }
}
