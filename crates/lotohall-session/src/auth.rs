//! Admin authorization for privileged operations.
//!
//! Lotohall has exactly one privileged path that is not guarded by a
//! room's own secret: forcing the next drawn number. It is guarded by a
//! process-wide admin secret, loaded once at startup.
//!
//! If no secret is configured the gate is closed for good. An empty token
//! never matches anything.

use crate::SessionError;

/// Checks admin tokens against the process-wide secret.
///
/// ```rust
/// use lotohall_session::{AdminGate, SessionError};
///
/// let gate = AdminGate::new(Some("hunter2".into()));
/// assert!(gate.authorize("hunter2").is_ok());
/// assert!(matches!(gate.authorize("guess"), Err(SessionError::InvalidToken)));
///
/// let closed = AdminGate::disabled();
/// assert!(matches!(closed.authorize("hunter2"), Err(SessionError::AdminDisabled)));
/// ```
#[derive(Clone)]
pub struct AdminGate {
    secret: Option<String>,
}

impl AdminGate {
    /// Creates a gate. `None` or an empty/whitespace secret disables it.
    pub fn new(secret: Option<String>) -> Self {
        let secret = secret.filter(|s| !s.trim().is_empty());
        if secret.is_none() {
            tracing::warn!("admin secret not configured, force-number disabled");
        }
        Self { secret }
    }

    /// A gate that refuses every token.
    pub fn disabled() -> Self {
        Self { secret: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.secret.is_some()
    }

    /// Validates `token` against the configured secret.
    ///
    /// # Errors
    /// - [`SessionError::AdminDisabled`] if no secret is configured
    /// - [`SessionError::InvalidToken`] if the token doesn't match
    pub fn authorize(&self, token: &str) -> Result<(), SessionError> {
        let Some(secret) = &self.secret else {
            return Err(SessionError::AdminDisabled);
        };
        if token.is_empty() || !constant_time_eq(secret.as_bytes(), token.as_bytes()) {
            return Err(SessionError::InvalidToken);
        }
        Ok(())
    }
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}

/// Compares two byte strings without short-circuiting on the first
/// mismatching byte.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
