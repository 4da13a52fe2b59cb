//! Identity types and the records a transport hands back to clients.
//!
//! Nothing in here is mutable game state. These are the shapes that leave
//! the engine: read-only snapshots of a room, lobby listings, pending
//! bingo claims and join records for the persistence sink.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Highest number in the loto pool. Draws are always in `1..=MAX_NUMBER`.
pub const MAX_NUMBER: u8 = 90;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The identifier of a room, chosen by the user who creates it.
///
/// Newtype over `String` so a room id can't be passed where a username is
/// expected. Serializes as the bare string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomId(pub String);

impl RoomId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the id is empty or only whitespace.
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for RoomId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A player's display name inside a room. Unique per room.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Username(pub String);

impl Username {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Username {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Bingo claims
// ---------------------------------------------------------------------------

/// A pending "bingo!" declaration waiting for the admin's verdict.
///
/// `nums` is kept exactly as the player submitted it (comma-separated),
/// so the admin sees what the player typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BingoClaim {
    pub user: Username,
    pub nums: String,
}

// ---------------------------------------------------------------------------
// Snapshots
// ---------------------------------------------------------------------------

/// A consistent, read-only copy of one room.
///
/// Produced while the registry lock is held, so no field can come from a
/// half-applied mutation. The undrawn pool and the room secret are never
/// part of a snapshot.
///
/// Field names follow the lobby client's JSON conventions (`bingoQueue`,
/// `bingoOK`, ...), hence the explicit renames. Before a game is won,
/// `winner`, `winnerNums` and `approvedAt` are `null`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomSnapshot {
    pub id: RoomId,
    pub admin: Username,
    /// Username → last-seen time, in Unix milliseconds.
    pub users: BTreeMap<Username, u64>,
    /// Drawn numbers, oldest first.
    pub called: Vec<u8>,
    /// Most recent draw, 0 before the first draw of a game.
    pub current: u8,
    /// Seconds between draws.
    pub interval: u32,
    pub running: bool,
    /// `true` while any claim is pending.
    pub paused: bool,
    pub bingo_queue: Vec<BingoClaim>,
    #[serde(rename = "bingoOK")]
    pub bingo_ok: bool,
    pub winner: Option<Username>,
    pub winner_nums: Option<String>,
    /// Unix seconds at which the winning claim was approved.
    pub approved_at: Option<u64>,
    /// Card index → owner.
    pub lotos: BTreeMap<u32, Username>,
}

/// One row of the lobby listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub id: RoomId,
    pub player_count: usize,
    pub running: bool,
}

// ---------------------------------------------------------------------------
// Persistence records
// ---------------------------------------------------------------------------

/// What the persistence sink receives when a room is created or joined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JoinRecord {
    pub room_id: RoomId,
    pub username: Username,
    pub client_ip: String,
    pub user_agent: String,
    /// Unix seconds.
    pub joined_at: u64,
}

// ---------------------------------------------------------------------------
// Error classification
// ---------------------------------------------------------------------------

/// Coarse classification shared by every error in the workspace.
///
/// Transports map a kind to a response; the engine never retries on any of
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Room (or user) does not exist.
    NotFound,
    /// A room with that id is already registered.
    AlreadyExists,
    /// Wrong room secret or admin token.
    Unauthorized,
    /// The request is understood but the current state refuses it.
    Forbidden,
    /// Malformed or out-of-range parameter.
    InvalidInput,
    /// Encoding or I/O failure inside the server.
    Internal,
}

impl ErrorKind {
    /// HTTP-style status code for this kind.
    pub fn status_code(self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::AlreadyExists => 409,
            Self::Unauthorized => 401,
            Self::Forbidden => 403,
            Self::InvalidInput => 400,
            Self::Internal => 500,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotFound => "NotFound",
            Self::AlreadyExists => "AlreadyExists",
            Self::Unauthorized => "Unauthorized",
            Self::Forbidden => "Forbidden",
            Self::InvalidInput => "InvalidInput",
            Self::Internal => "Internal",
        };
        f.write_str(name)
    }
}

// =========================================================================
// Tests
// =========================================================================
