//! The number drawer: one Tokio task per running game.
//!
//! The task sleeps one draw interval, takes the registry lock, advances
//! the room by at most one number, and releases the lock. It never holds
//! the lock across a sleep.
//!
//! There is no cancellation channel. The task stops itself at the first
//! tick where its game is no longer current: the room was stopped, won,
//! restarted, started again under a new generation, or destroyed. Stopping
//! a room therefore takes effect within one interval.

use std::sync::Arc;
use std::time::Duration;

use lotohall_protocol::RoomId;
use lotohall_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::task::JoinHandle;

use crate::RoomRegistry;
use crate::room::Room;

/// Result of one drawer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum DrawStep {
    /// The game this drawer belongs to is over. Exit.
    Stop,
    /// Paused by a claim, or nothing left to draw.
    Skip,
    /// Drew the admin's forced number.
    Forced(u8),
    /// Drew the next number from the pool.
    Drawn(u8),
}

impl Room {
    fn record_draw(&mut self, n: u8) {
        self.current = n;
        self.called.push(n);
    }

    /// Advances the room by one tick on behalf of drawer generation `game`.
    pub(crate) fn draw_step(&mut self, game: u64) -> DrawStep {
        if self.game != game || !self.phase.is_running() {
            return DrawStep::Stop;
        }
        if self.is_paused() || self.pool.is_empty() {
            return DrawStep::Skip;
        }

        if let Some(forced) = self.next_force {
            if !self.called.contains(&forced) {
                self.pool.retain(|&n| n != forced);
                self.record_draw(forced);
                return DrawStep::Forced(forced);
            }
            // Already drawn: disarm and fall through to a normal draw.
            self.next_force = None;
        }

        match self.pool.pop_front() {
            Some(n) => {
                self.record_draw(n);
                DrawStep::Drawn(n)
            }
            None => DrawStep::Skip,
        }
    }
}

/// Spawns the drawer task for generation `game` of `room_id`.
pub(crate) fn spawn(
    registry: Arc<RoomRegistry>,
    room_id: RoomId,
    game: u64,
    interval: Duration,
    jitter: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut scheduler = TickScheduler::new(TickConfig {
            period: interval,
            policy: TickPolicy::Skip,
            initial_jitter: jitter,
        });
        tracing::info!(%room_id, game, interval_secs = interval.as_secs(), "drawer started");

        loop {
            let tick = scheduler.wait_for_tick().await;

            let Some((step, interval_secs)) = registry.draw_tick(&room_id, game).await else {
                tracing::debug!(%room_id, game, "room gone, drawer exiting");
                break;
            };

            match step {
                DrawStep::Stop => break,
                DrawStep::Skip => {
                    tracing::trace!(%room_id, tick = tick.tick, "draw skipped");
                }
                DrawStep::Forced(n) => {
                    tracing::info!(%room_id, number = n, "forced number drawn");
                }
                DrawStep::Drawn(n) => {
                    tracing::debug!(%room_id, number = n, "number drawn");
                }
            }

            scheduler.set_period(Duration::from_secs(u64::from(interval_secs)));
        }

        tracing::info!(%room_id, game, ticks = scheduler.tick_count(), "drawer stopped");
    })
}
