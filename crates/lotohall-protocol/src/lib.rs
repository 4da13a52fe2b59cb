//! Shared vocabulary for Lotohall.
//!
//! - **Types** ([`RoomId`], [`Username`], [`RoomSnapshot`], ...): what the
//!   engine hands back to transports and to the persistence sink.
//! - **Input** ([`parse_interval`], [`parse_number`], ...): turning raw
//!   request strings into checked integers.
//! - **Codec** ([`Codec`], [`JsonCodec`]): bytes in, bytes out.
//! - **Errors** ([`ProtocolError`], [`ErrorKind`]).
//!
//! This crate knows nothing about rooms as mutable state. It only
//! describes how they look from outside.

mod codec;
mod error;
mod input;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use input::{check_number, normalize_claim, parse_card, parse_interval, parse_number};
pub use types::{
    BingoClaim, ErrorKind, JoinRecord, MAX_NUMBER, RoomId, RoomListEntry, RoomSnapshot, Username,
};
