//! The Room entity: everything one game instance owns.
//!
//! A `Room` is plain data plus synchronous methods. It has no lock of its
//! own and never leaves the registry by reference; every method here runs
//! with the registry lock held.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use lotohall_protocol::{BingoClaim, MAX_NUMBER, RoomId, RoomSnapshot, Username};
use lotohall_session::PresenceTracker;
use rand::seq::SliceRandom;

use crate::{GameEvent, GamePhase, RoomError};

/// Counter for drawer generations. Each `start` takes a fresh value so a
/// drawer can tell its own game apart from a later one in the same room.
static NEXT_GAME: AtomicU64 = AtomicU64::new(1);

/// Returns a fresh undrawn pool: 1..=90 in random order.
pub(crate) fn fresh_pool() -> VecDeque<u8> {
    let mut numbers: Vec<u8> = (1..=MAX_NUMBER).collect();
    numbers.shuffle(&mut rand::rng());
    numbers.into()
}

pub(crate) fn unix_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// One game instance.
#[derive(Debug)]
pub(crate) struct Room {
    pub(crate) id: RoomId,
    pub(crate) admin: Username,
    pub(crate) secret: String,
    pub(crate) presence: PresenceTracker,
    /// Undrawn numbers, consumed from the front.
    pub(crate) pool: VecDeque<u8>,
    /// Drawn numbers, oldest first.
    pub(crate) called: Vec<u8>,
    /// Last draw, 0 before the first draw of a game.
    pub(crate) current: u8,
    pub(crate) interval: u32,
    pub(crate) phase: GamePhase,
    /// Generation of the drawer allowed to advance this room. 0 when no
    /// game is running.
    pub(crate) game: u64,
    pub(crate) bingo_queue: VecDeque<BingoClaim>,
    /// Card index → owner.
    pub(crate) lotos: HashMap<u32, Username>,
    /// Admin-injected number to draw next.
    pub(crate) next_force: Option<u8>,
}

impl Room {
    /// A fresh, not-yet-started room with its admin present.
    pub(crate) fn new(id: RoomId, admin: Username, secret: String, interval: u32) -> Self {
        let mut presence = PresenceTracker::new();
        presence.touch(&admin);
        Self {
            id,
            admin,
            secret,
            presence,
            pool: fresh_pool(),
            called: Vec::new(),
            current: 0,
            interval,
            phase: GamePhase::Idle,
            game: 0,
            bingo_queue: VecDeque::new(),
            lotos: HashMap::new(),
            next_force: None,
        }
    }

    /// Draws are blocked while any claim is pending.
    pub(crate) fn is_paused(&self) -> bool {
        !self.bingo_queue.is_empty()
    }

    pub(crate) fn secret_matches(&self, secret: &str) -> bool {
        self.secret == secret
    }

    /// Applies `event` through the phase transition table.
    pub(crate) fn transition(&mut self, event: GameEvent) -> Result<(), RoomError> {
        match self.phase.on(event) {
            Some(next) => {
                self.phase = next;
                Ok(())
            }
            None => Err(RoomError::forbidden(
                &self.id,
                "operation not allowed in current phase",
            )),
        }
    }

    /// Puts the draw state back to "nothing drawn yet".
    pub(crate) fn reset_draw(&mut self) {
        self.pool = fresh_pool();
        self.called.clear();
        self.current = 0;
        self.bingo_queue.clear();
    }

    /// Starts a new game and returns its drawer generation.
    ///
    /// Refused while a game is running or when `secret` is wrong.
    pub(crate) fn begin_game(&mut self, secret: &str) -> Result<u64, RoomError> {
        if self.phase.is_running() {
            return Err(RoomError::forbidden(&self.id, "game already running"));
        }
        if !self.secret_matches(secret) {
            return Err(RoomError::forbidden(&self.id, "secret mismatch"));
        }
        self.transition(GameEvent::Start)?;
        self.reset_draw();
        self.game = NEXT_GAME.fetch_add(1, Ordering::Relaxed);
        Ok(self.game)
    }

    /// Stops drawing. The drawer notices at its next tick.
    pub(crate) fn end_game(&mut self, secret: &str) -> Result<(), RoomError> {
        if !self.secret_matches(secret) {
            return Err(RoomError::forbidden(&self.id, "secret mismatch"));
        }
        if !self.phase.is_running() {
            return Err(RoomError::forbidden(&self.id, "game not running"));
        }
        self.transition(GameEvent::Stop)?;
        self.game = 0;
        Ok(())
    }

    /// Removes a user from presence and frees their cards.
    ///
    /// Returns the released card indices.
    pub(crate) fn remove_user(&mut self, user: &Username) -> Vec<u32> {
        self.presence.remove(user);
        self.release_cards(user)
    }

    pub(crate) fn snapshot(&self) -> RoomSnapshot {
        let winner = self.phase.winner();
        RoomSnapshot {
            id: self.id.clone(),
            admin: self.admin.clone(),
            users: self.presence.to_unix_millis(),
            called: self.called.clone(),
            current: self.current,
            interval: self.interval,
            running: self.phase.is_running(),
            paused: self.is_paused(),
            bingo_queue: self.bingo_queue.iter().cloned().collect(),
            bingo_ok: self.phase.is_won(),
            winner: winner.map(|w| w.user.clone()),
            winner_nums: winner.map(|w| w.nums.clone()),
            approved_at: winner.map(|w| w.approved_at),
            lotos: self
                .lotos
                .iter()
                .map(|(card, owner)| (*card, owner.clone()))
                .collect(),
        }
    }

    /// Checks the structural invariants of a room.
    ///
    /// - pool and called are disjoint and together hold exactly 1..=90
    /// - `AwaitingApproval` iff running with a non-empty queue
    /// - a running room has a drawer generation
    /// - at most one queued claim per user
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let mut seen = HashSet::with_capacity(MAX_NUMBER as usize);
        for n in self.pool.iter().chain(self.called.iter()) {
            if !(1..=MAX_NUMBER).contains(n) {
                return Err(format!("number {n} out of range"));
            }
            if !seen.insert(*n) {
                return Err(format!("number {n} appears twice"));
            }
        }
        if seen.len() != MAX_NUMBER as usize {
            return Err(format!("pool + called hold {} numbers", seen.len()));
        }
        if self.current != 0 && self.called.last() != Some(&self.current) {
            return Err(format!("current {} is not the last draw", self.current));
        }

        match self.phase {
            GamePhase::Running if self.is_paused() => {
                return Err("running with pending claims".into());
            }
            GamePhase::AwaitingApproval if !self.is_paused() => {
                return Err("awaiting approval with empty queue".into());
            }
            GamePhase::Won(_) if self.is_paused() => {
                return Err("won with pending claims".into());
            }
            _ => {}
        }
        if self.phase.is_running() && self.game == 0 {
            return Err("running without a drawer generation".into());
        }

        let mut claimants = HashSet::new();
        for claim in &self.bingo_queue {
            if !claimants.insert(&claim.user) {
                return Err(format!("{} has two queued claims", claim.user));
            }
        }
        Ok(())
    }
}
