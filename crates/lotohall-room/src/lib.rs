//! Room engine for Lotohall.
//!
//! Every room lives in one [`RoomRegistry`] behind a single lock. Each
//! running game gets a drawer task that pulls one number per interval,
//! and one [`PresenceCleaner`] task sweeps out users who stopped pinging.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates/destroys rooms and runs every room operation
//! - [`GamePhase`] — the game lifecycle state machine
//! - [`RoomConfig`] — interval bounds and card range shared by all rooms
//! - [`PresenceCleaner`] — the background eviction sweep

mod bingo;
mod cleaner;
mod config;
mod drawer;
mod error;
mod loto;
mod registry;
mod room;

pub use bingo::{ClaimReceipt, Verdict};
pub use cleaner::PresenceCleaner;
pub use config::{CleanerConfig, GameEvent, GamePhase, RoomConfig, Winner};
pub use error::RoomError;
pub use registry::{Departure, Eviction, RoomRegistry};
