//! The room registry: every room, behind one lock.
//!
//! All room state in the process lives in a single map guarded by a single
//! Tokio mutex. Request handlers, drawers and the presence cleaner all go
//! through it, and each operation holds the lock from its first read to
//! its last write, so no caller ever observes a half-applied change (a draw
//! touches `pool`, `called` and `current` together).
//!
//! Nothing here awaits anything except the lock. Persistence and other
//! I/O belong to the caller, after the operation returns.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use lotohall_protocol::{RoomId, RoomListEntry, RoomSnapshot, Username, check_number};
use lotohall_session::AdminGate;
use tokio::sync::Mutex;

use crate::bingo::{ClaimReceipt, Verdict};
use crate::drawer::{self, DrawStep};
use crate::room::Room;
use crate::{RoomConfig, RoomError};

/// What `leave` did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Departure {
    /// The user left; these cards were freed.
    Left { released: Vec<u32> },
    /// The admin left, so the room is gone.
    RoomClosed,
}

/// Result of one presence sweep.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Eviction {
    /// Every user removed, with their room.
    pub evicted: Vec<(RoomId, Username)>,
    /// Rooms destroyed because their admin went stale.
    pub closed: Vec<RoomId>,
}

impl Eviction {
    pub fn is_empty(&self) -> bool {
        self.evicted.is_empty()
    }
}

/// Owns every room and the lock that guards them.
///
/// Share it as `Arc<RoomRegistry>`; `start` needs the `Arc` to hand a
/// reference to the drawer task it spawns.
pub struct RoomRegistry {
    rooms: Mutex<HashMap<RoomId, Room>>,
    config: RoomConfig,
    admin: AdminGate,
}

impl RoomRegistry {
    /// Creates an empty registry. Force-number stays disabled unless a
    /// gate is supplied with [`with_admin_gate`](Self::with_admin_gate).
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: Mutex::new(HashMap::new()),
            config,
            admin: AdminGate::disabled(),
        }
    }

    pub fn with_admin_gate(mut self, gate: AdminGate) -> Self {
        self.admin = gate;
        self
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    /// Runs `f` on room `id` with the lock held.
    ///
    /// In debug builds the room's invariants are re-checked after every
    /// mutation.
    async fn with_room<T>(
        &self,
        id: &RoomId,
        f: impl FnOnce(&mut Room) -> Result<T, RoomError>,
    ) -> Result<T, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;
        let out = f(room);
        debug_assert_eq!(room.check_invariants(), Ok(()), "room {id} invariant broken");
        out
    }

    // -----------------------------------------------------------------
    // Lifecycle and presence
    // -----------------------------------------------------------------

    /// Registers a new room with `admin` present.
    pub async fn create(
        &self,
        id: &RoomId,
        admin: &Username,
        secret: &str,
    ) -> Result<(), RoomError> {
        if id.is_blank() || admin.is_blank() || secret.is_empty() {
            return Err(RoomError::InvalidInput(
                "room id, user and secret are required".into(),
            ));
        }

        let mut rooms = self.rooms.lock().await;
        if rooms.contains_key(id) {
            return Err(RoomError::AlreadyExists(id.clone()));
        }
        let room = Room::new(
            id.clone(),
            admin.clone(),
            secret.to_string(),
            self.config.default_interval_secs,
        );
        rooms.insert(id.clone(), room);
        drop(rooms);

        tracing::info!(room_id = %id, %admin, "room created");
        Ok(())
    }

    /// A consistent snapshot of room `id`.
    pub async fn snapshot(&self, id: &RoomId) -> Result<RoomSnapshot, RoomError> {
        let rooms = self.rooms.lock().await;
        rooms
            .get(id)
            .map(Room::snapshot)
            .ok_or_else(|| RoomError::NotFound(id.clone()))
    }

    /// Adds `user` to the room (or refreshes them) if `secret` matches.
    pub async fn join(
        &self,
        id: &RoomId,
        user: &Username,
        secret: &str,
    ) -> Result<(), RoomError> {
        if id.is_blank() || user.is_blank() || secret.is_empty() {
            return Err(RoomError::InvalidInput(
                "room id, user and secret are required".into(),
            ));
        }
        self.with_room(id, |room| {
            if !room.secret_matches(secret) {
                return Err(RoomError::Unauthorized(id.clone()));
            }
            room.presence.touch(user);
            Ok(())
        })
        .await?;

        tracing::info!(room_id = %id, %user, "user joined");
        Ok(())
    }

    /// Removes `user` and frees their cards. If `user` is the admin the
    /// room is destroyed, whoever else is still in it.
    pub async fn leave(&self, id: &RoomId, user: &Username) -> Result<Departure, RoomError> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms
            .get_mut(id)
            .ok_or_else(|| RoomError::NotFound(id.clone()))?;

        let released = room.remove_user(user);
        if &room.admin == user {
            rooms.remove(id);
            drop(rooms);
            tracing::info!(room_id = %id, admin = %user, "admin left, room destroyed");
            return Ok(Departure::RoomClosed);
        }
        drop(rooms);

        tracing::info!(room_id = %id, %user, cards = released.len(), "user left");
        Ok(Departure::Left { released })
    }

    /// Refreshes `user`'s presence. Unknown rooms and users are ignored.
    ///
    /// Returns `true` if a timestamp was refreshed.
    pub async fn ping(&self, id: &RoomId, user: &Username) -> bool {
        let mut rooms = self.rooms.lock().await;
        rooms
            .get_mut(id)
            .is_some_and(|room| room.presence.refresh(user))
    }

    /// Lobby view of every room. Order is unspecified.
    pub async fn list(&self) -> Vec<RoomListEntry> {
        let rooms = self.rooms.lock().await;
        rooms
            .values()
            .map(|room| RoomListEntry {
                id: room.id.clone(),
                player_count: room.presence.len(),
                running: room.phase.is_running(),
            })
            .collect()
    }

    /// Removes every user not seen for longer than `stale_after`. A stale
    /// admin takes their room down with them.
    pub async fn evict_stale(&self, stale_after: Duration) -> Eviction {
        let mut report = Eviction::default();
        let mut rooms = self.rooms.lock().await;

        rooms.retain(|id, room| {
            let mut admin_gone = false;
            for user in room.presence.stale(stale_after) {
                room.remove_user(&user);
                admin_gone = user == room.admin;
                report.evicted.push((id.clone(), user));
                // The room goes; nobody else in it is scanned.
                if admin_gone {
                    break;
                }
            }
            if admin_gone {
                report.closed.push(id.clone());
            }
            !admin_gone
        });
        drop(rooms);

        for (room_id, user) in &report.evicted {
            tracing::info!(%room_id, %user, "user evicted (presence timed out)");
        }
        for room_id in &report.closed {
            tracing::info!(%room_id, "admin timed out, room destroyed");
        }
        report
    }

    pub async fn contains(&self, id: &RoomId) -> bool {
        self.rooms.lock().await.contains_key(id)
    }

    pub async fn room_count(&self) -> usize {
        self.rooms.lock().await.len()
    }

    // -----------------------------------------------------------------
    // Drawing
    // -----------------------------------------------------------------

    /// Starts drawing in room `id` and spawns its drawer.
    ///
    /// Refused (`Forbidden`) if the room is already running or `secret`
    /// is wrong. Starting resets the pool, the drawn numbers, the claim
    /// queue and any previous winner.
    pub async fn start(self: &Arc<Self>, id: &RoomId, secret: &str) -> Result<(), RoomError> {
        let (game, interval) = self
            .with_room(id, |room| {
                let game = room.begin_game(secret)?;
                Ok((game, room.interval))
            })
            .await?;

        tracing::info!(room_id = %id, game, interval_secs = interval, "game started");
        drawer::spawn(
            Arc::clone(self),
            id.clone(),
            game,
            Duration::from_secs(u64::from(interval)),
            self.config.draw_jitter,
        );
        Ok(())
    }

    /// Stops drawing. The drawer exits at its next tick.
    pub async fn stop(&self, id: &RoomId, secret: &str) -> Result<(), RoomError> {
        self.with_room(id, |room| room.end_game(secret)).await?;
        tracing::info!(room_id = %id, "game stopped");
        Ok(())
    }

    /// Changes the draw interval. Takes effect after the drawer's current
    /// wait.
    pub async fn set_interval(&self, id: &RoomId, secs: u32) -> Result<(), RoomError> {
        let max = self.config.max_interval_secs;
        if secs == 0 || secs > max {
            return Err(RoomError::InvalidInput(format!(
                "interval {secs} outside 1..={max}"
            )));
        }
        self.with_room(id, |room| {
            room.interval = secs;
            Ok(())
        })
        .await?;
        tracing::info!(room_id = %id, interval_secs = secs, "interval changed");
        Ok(())
    }

    /// Arms a forced number for the room's next draw.
    ///
    /// The admin token is checked before anything else, so a bad token
    /// never reveals whether the room exists.
    pub async fn force_number(&self, id: &RoomId, number: u8, token: &str) -> Result<(), RoomError> {
        self.admin.authorize(token)?;
        let number = check_number(number)?;
        self.with_room(id, |room| {
            room.next_force = Some(number);
            Ok(())
        })
        .await?;
        tracing::info!(room_id = %id, number, "forced number armed");
        Ok(())
    }

    /// One drawer tick, under the lock. `None` if the room no longer exists.
    pub(crate) async fn draw_tick(&self, id: &RoomId, game: u64) -> Option<(DrawStep, u32)> {
        let mut rooms = self.rooms.lock().await;
        let room = rooms.get_mut(id)?;
        let step = room.draw_step(game);
        debug_assert_eq!(room.check_invariants(), Ok(()), "room {id} invariant broken");
        Some((step, room.interval))
    }

    // -----------------------------------------------------------------
    // Bingo workflow
    // -----------------------------------------------------------------

    /// Queues `user`'s claim (or replaces their pending one).
    ///
    /// `nums` is empty or a comma-separated list of numbers in 1..=90.
    pub async fn submit_claim(
        &self,
        id: &RoomId,
        user: &Username,
        nums: &str,
    ) -> Result<ClaimReceipt, RoomError> {
        let nums = lotohall_protocol::normalize_claim(nums)?;
        let receipt = self
            .with_room(id, |room| room.submit_claim(user, nums))
            .await?;
        tracing::info!(room_id = %id, %user, ?receipt, "bingo claim received");
        Ok(receipt)
    }

    /// Approves or rejects the claim at the head of the queue.
    pub async fn resolve_claim(&self, id: &RoomId, approve: bool) -> Result<Verdict, RoomError> {
        let verdict = self
            .with_room(id, |room| room.resolve_claim(approve))
            .await?;
        match &verdict {
            Verdict::Approved(winner) => {
                tracing::info!(room_id = %id, winner = %winner.user, "bingo approved, game over");
            }
            Verdict::Rejected { user, remaining } => {
                tracing::info!(room_id = %id, %user, remaining, "bingo rejected");
            }
        }
        Ok(verdict)
    }

    /// Resets a won room to a fresh, not-yet-started game.
    pub async fn restart(&self, id: &RoomId) -> Result<(), RoomError> {
        self.with_room(id, Room::restart).await?;
        tracing::info!(room_id = %id, "game restarted");
        Ok(())
    }

    // -----------------------------------------------------------------
    // Cards
    // -----------------------------------------------------------------

    fn check_card(&self, card: u32) -> Result<(), RoomError> {
        if card >= self.config.max_cards {
            return Err(RoomError::InvalidInput(format!(
                "card {card} outside 0..{}",
                self.config.max_cards
            )));
        }
        Ok(())
    }

    /// Claims `card` for `user`.
    pub async fn select_card(&self, id: &RoomId, user: &Username, card: u32) -> Result<(), RoomError> {
        self.check_card(card)?;
        let changed = self
            .with_room(id, |room| room.select_card(user, card))
            .await?;
        if changed {
            tracing::info!(room_id = %id, %user, card, "card selected");
        }
        Ok(())
    }

    /// Releases `card` if `user` owns it. Returns `true` if it was freed.
    pub async fn unselect_card(&self, id: &RoomId, user: &Username, card: u32) -> Result<bool, RoomError> {
        self.check_card(card)?;
        let freed = self
            .with_room(id, |room| Ok(room.unselect_card(user, card)))
            .await?;
        if freed {
            tracing::info!(room_id = %id, %user, card, "card released");
        }
        Ok(freed)
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
