//! Player presence and admin authorization for Lotohall.
//!
//! 1. **Presence** — [`PresenceTracker`] records when each user of a room
//!    was last seen, and reports who went stale.
//! 2. **Admin authorization** — [`AdminGate`] checks tokens for privileged
//!    operations against a process-wide secret.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room layer (above)     ← one PresenceTracker per room, AdminGate in the registry
//!     ↕
//! Session layer (this crate)
//!     ↕
//! Protocol layer (below) ← Username, ErrorKind
//! ```

mod auth;
mod error;
mod presence;

pub use auth::AdminGate;
pub use error::SessionError;
pub use presence::PresenceTracker;
