//! Parsing of primitive request parameters.
//!
//! Transports receive everything as strings (query parameters, form
//! fields). These helpers turn them into the integers the engine works
//! with, or an [`ProtocolError::InvalidInput`]. Range checks that depend on
//! room configuration (interval ceiling, card count) happen in the room
//! layer.

use crate::{MAX_NUMBER, ProtocolError};

/// Parses a draw interval in whole seconds.
pub fn parse_interval(raw: &str) -> Result<u32, ProtocolError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ProtocolError::InvalidInput(format!("interval {raw:?} is not a number")))
}

/// Parses a card index.
pub fn parse_card(raw: &str) -> Result<u32, ProtocolError> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| ProtocolError::InvalidInput(format!("card {raw:?} is not a number")))
}

/// Parses a loto number and checks it lies in `1..=90`.
pub fn parse_number(raw: &str) -> Result<u8, ProtocolError> {
    let n = raw
        .trim()
        .parse::<u8>()
        .map_err(|_| ProtocolError::InvalidInput(format!("number {raw:?} is not a number")))?;
    check_number(n)
}

/// Checks a loto number lies in `1..=90`.
pub fn check_number(n: u8) -> Result<u8, ProtocolError> {
    if (1..=MAX_NUMBER).contains(&n) {
        Ok(n)
    } else {
        Err(ProtocolError::InvalidInput(format!(
            "number {n} outside 1..={MAX_NUMBER}"
        )))
    }
}

/// Validates the numbers string of a bingo claim and returns it trimmed.
///
/// An empty string is a bare "bingo!" call and is accepted. Otherwise
/// every comma-separated item must be a number in `1..=90`.
pub fn normalize_claim(raw: &str) -> Result<String, ProtocolError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(String::new());
    }
    for item in trimmed.split(',') {
        parse_number(item)?;
    }
    Ok(trimmed.to_string())
}
