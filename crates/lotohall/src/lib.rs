//! # Lotohall
//!
//! Multiplayer bingo/loto hall engine.
//!
//! Players join password-protected rooms, pick numbered cards and watch a
//! drawer pull numbers 1 to 90 at a fixed interval. Anyone can shout
//! "bingo!"; drawing pauses until the room admin approves or rejects the
//! claim. Users who stop pinging are evicted, and a room dies with its
//! admin.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use lotohall::prelude::*;
//!
//! # async fn run() -> Result<(), LotoError> {
//! let engine = LotoEngine::builder()
//!     .config(EngineConfig::from_env())
//!     .build();
//! let _cleaner = engine.spawn_cleaner();
//!
//! let client = ClientInfo::new("127.0.0.1", "demo");
//! engine.create("R1", "alice", "s", &client).await?;
//! engine.join("R1", "bob", "s", &client).await?;
//! engine.start("R1", "s").await?;
//! # Ok(())
//! # }
//! ```

mod config;
mod engine;
mod error;
mod sink;
pub mod telemetry;

pub use config::EngineConfig;
pub use engine::{ClientInfo, LotoEngine, LotoEngineBuilder};
pub use error::LotoError;
pub use sink::{JoinSink, JsonLinesSink, SinkError, TracingSink};

pub mod prelude {
    pub use crate::{
        ClientInfo, EngineConfig, JoinSink, JsonLinesSink, LotoEngine, LotoError, TracingSink,
    };
    pub use lotohall_protocol::{ErrorKind, RoomListEntry, RoomSnapshot};
    pub use lotohall_room::{ClaimReceipt, Departure, Verdict};
}
