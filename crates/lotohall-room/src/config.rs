//! Room configuration and the game phase state machine.

use std::fmt;
use std::time::Duration;

use lotohall_protocol::Username;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomConfig
// ---------------------------------------------------------------------------

/// Settings shared by every room in a registry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Draw interval a new room starts with, in seconds.
    pub default_interval_secs: u32,

    /// Largest interval `set_interval` accepts, in seconds.
    pub max_interval_secs: u32,

    /// Number of cards on offer. Valid card indices are `0..max_cards`.
    pub max_cards: u32,

    /// Upper bound of the random delay added to a drawer's first tick.
    pub draw_jitter: Duration,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            default_interval_secs: 5,
            max_interval_secs: 3600,
            max_cards: 100,
            draw_jitter: Duration::ZERO,
        }
    }
}

// ---------------------------------------------------------------------------
// CleanerConfig
// ---------------------------------------------------------------------------

/// Settings for the global presence cleaner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanerConfig {
    /// Time between sweeps.
    pub period: Duration,

    /// A user not seen for longer than this is evicted.
    pub stale_after: Duration,
}

impl Default for CleanerConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5),
            stale_after: Duration::from_secs(60),
        }
    }
}

// ---------------------------------------------------------------------------
// GamePhase
// ---------------------------------------------------------------------------

/// The approved winner of a finished game.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Winner {
    pub user: Username,
    pub nums: String,
    /// Unix seconds.
    pub approved_at: u64,
}

/// Things that move a room between phases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GameEvent {
    /// The admin started drawing.
    Start,
    /// A bingo claim entered the queue.
    ClaimQueued,
    /// The last pending claim was rejected.
    QueueEmptied,
    /// The head claim was approved.
    Approve(Winner),
    /// The admin stopped drawing without a winner.
    Stop,
    /// The admin reset a won game.
    Restart,
}

/// Where a room is in its game.
///
/// ```text
/// from                      event          to
/// Idle, Won                 Start          Running
/// Running, AwaitingApproval ClaimQueued    AwaitingApproval
/// AwaitingApproval          QueueEmptied   Running
/// Idle, AwaitingApproval    Approve        Won
/// Running, AwaitingApproval Stop           Idle
/// Won                       Restart        Idle
/// ```
///
/// - **Idle**: created or reset, nothing drawing. Claims may still queue
///   up; starting discards them.
/// - **Running**: the drawer advances once per interval.
/// - **AwaitingApproval**: drawing, but at least one claim is pending, so
///   the drawer skips its ticks.
/// - **Won**: terminal until restarted (or started again).
///
/// `paused` is not stored anywhere. It is derived from the claim queue.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum GamePhase {
    #[default]
    Idle,
    Running,
    AwaitingApproval,
    Won(Winner),
}

impl GamePhase {
    /// `true` while a drawer should stay alive.
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running | Self::AwaitingApproval)
    }

    pub fn is_won(&self) -> bool {
        matches!(self, Self::Won(_))
    }

    pub fn winner(&self) -> Option<&Winner> {
        match self {
            Self::Won(w) => Some(w),
            _ => None,
        }
    }

    /// The transition table. Returns the next phase, or `None` if `event`
    /// is not allowed in this phase.
    pub fn on(&self, event: GameEvent) -> Option<Self> {
        use GameEvent as E;
        match (self, event) {
            (Self::Idle | Self::Won(_), E::Start) => Some(Self::Running),

            (Self::Idle, E::ClaimQueued) => Some(Self::Idle),
            (Self::Running | Self::AwaitingApproval, E::ClaimQueued) => {
                Some(Self::AwaitingApproval)
            }

            (Self::Idle, E::QueueEmptied) => Some(Self::Idle),
            (Self::AwaitingApproval, E::QueueEmptied) => Some(Self::Running),

            (Self::Idle | Self::AwaitingApproval, E::Approve(w)) => Some(Self::Won(w)),

            (Self::Running | Self::AwaitingApproval, E::Stop) => Some(Self::Idle),

            (Self::Won(_), E::Restart) => Some(Self::Idle),

            _ => None,
        }
    }
}

impl fmt::Display for GamePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "Idle"),
            Self::Running => write!(f, "Running"),
            Self::AwaitingApproval => write!(f, "AwaitingApproval"),
            Self::Won(w) => write!(f, "Won({})", w.user),
        }
    }
}
