//! Per-room presence: who is in the room and when we last heard from them.
//!
//! Clients ping every few seconds while a room page is open. The cleaner
//! evicts anyone whose last ping is older than the staleness threshold.
//!
//! # Concurrency note
//!
//! `PresenceTracker` is a plain map with no locking of its own. It lives
//! inside a room, and every access goes through the registry lock.
//!
//! Timestamps use `tokio::time::Instant` so tests can drive eviction with
//! paused virtual time.

use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use lotohall_protocol::Username;
use tokio::time::Instant;

/// Last-seen timestamps for the users of one room.
#[derive(Debug, Clone, Default)]
pub struct PresenceTracker {
    last_seen: HashMap<Username, Instant>,
}

impl PresenceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `user` as present now, adding them if they weren't.
    pub fn touch(&mut self, user: &Username) {
        self.last_seen.insert(user.clone(), Instant::now());
    }

    /// Refreshes `user`'s timestamp only if they are already present.
    ///
    /// Returns `false` (and changes nothing) for unknown users, so a ping
    /// can never re-admit someone who left or was evicted.
    pub fn refresh(&mut self, user: &Username) -> bool {
        match self.last_seen.get_mut(user) {
            Some(seen) => {
                *seen = Instant::now();
                true
            }
            None => false,
        }
    }

    /// Removes `user`. Returns `true` if they were present.
    pub fn remove(&mut self, user: &Username) -> bool {
        self.last_seen.remove(user).is_some()
    }

    pub fn contains(&self, user: &Username) -> bool {
        self.last_seen.contains_key(user)
    }

    /// When `user` was last seen, if present.
    pub fn last_seen(&self, user: &Username) -> Option<Instant> {
        self.last_seen.get(user).copied()
    }

    /// Users whose last ping is strictly older than `threshold`.
    pub fn stale(&self, threshold: Duration) -> Vec<Username> {
        self.last_seen
            .iter()
            .filter(|(_, seen)| seen.elapsed() > threshold)
            .map(|(user, _)| user.clone())
            .collect()
    }

    /// Last-seen times converted to Unix milliseconds, for snapshots.
    pub fn to_unix_millis(&self) -> BTreeMap<Username, u64> {
        let now_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        self.last_seen
            .iter()
            .map(|(user, seen)| {
                let ago = seen.elapsed().as_millis() as u64;
                (user.clone(), now_ms.saturating_sub(ago))
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.last_seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.last_seen.is_empty()
    }
}
