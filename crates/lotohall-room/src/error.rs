//! Error types for the room layer.

use lotohall_protocol::{ErrorKind, ProtocolError, RoomId, Username};
use lotohall_session::SessionError;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist (never created, or already destroyed).
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// A room with this id is already registered.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The room secret presented on join doesn't match.
    #[error("wrong secret for room {0}")]
    Unauthorized(RoomId),

    /// The room's current state refuses this operation.
    #[error("room {room}: {reason}")]
    Forbidden { room: RoomId, reason: &'static str },

    /// Someone else owns this card.
    #[error("card {card} in room {room} is owned by {owner}")]
    CardTaken {
        room: RoomId,
        card: u32,
        owner: Username,
    },

    /// A parameter is missing or out of range.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The admin token check failed.
    #[error(transparent)]
    Admin(#[from] SessionError),

    /// A raw parameter failed to parse.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),
}

impl RoomError {
    pub(crate) fn forbidden(room: &RoomId, reason: &'static str) -> Self {
        Self::Forbidden {
            room: room.clone(),
            reason,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::Forbidden { .. } | Self::CardTaken { .. } => ErrorKind::Forbidden,
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Admin(e) => e.kind(),
            Self::Protocol(e) => e.kind(),
        }
    }
}
