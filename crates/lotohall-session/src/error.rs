//! Error types for the session layer.

use lotohall_protocol::ErrorKind;

/// Errors raised by the admin authorization check.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// No admin secret was configured at startup, so privileged paths are
    /// switched off for the lifetime of the process.
    #[error("admin access is not configured")]
    AdminDisabled,

    /// The presented admin token does not match the configured secret.
    #[error("invalid admin token")]
    InvalidToken,
}

impl SessionError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::AdminDisabled => ErrorKind::Forbidden,
            Self::InvalidToken => ErrorKind::Unauthorized,
        }
    }
}
