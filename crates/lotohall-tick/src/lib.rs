//! Fixed-period tick scheduler for Lotohall's background loops.
//!
//! Two kinds of loops run on it: one number drawer per running room
//! (period = the room's draw interval, seconds) and the global presence
//! cleaner (period = 5 s by default).
//!
//! Unlike a frame-rate scheduler the period here can change between
//! ticks: an admin may speed up or slow down the draw while a game is
//! running. [`TickScheduler::set_period`] re-anchors the next deadline on
//! the last tick, so the new interval applies from the next wait onward.
//!
//! # Integration
//!
//! ```ignore
//! let mut scheduler = TickScheduler::new(TickConfig::every(interval));
//! loop {
//!     let info = scheduler.wait_for_tick().await;
//!     // take the registry lock, do one step, release it
//!     scheduler.set_period(current_interval);
//! }
//! ```

use std::time::Duration;

use rand::Rng;
use tokio::time::{self, Instant};
use tracing::{debug, trace, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// What to do when a tick fires late (the runtime was busy, or the loop
/// body held a contended lock for longer than expected).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TickPolicy {
    /// Forget the missed ticks and schedule the next one a full period
    /// from now. A late draw never causes a burst of draws.
    #[default]
    Skip,
    /// Keep the original cadence: the next tick is due one period after
    /// the missed deadline, even if that is soon.
    Drop,
}

/// Full configuration for a tick scheduler.
#[derive(Debug, Clone)]
pub struct TickConfig {
    /// Time between ticks.
    pub period: Duration,
    /// Overrun handling policy.
    pub policy: TickPolicy,
    /// Upper bound of a random delay added to the *first* tick only, so
    /// rooms started in the same instant don't all draw on the same beat.
    pub initial_jitter: Duration,
}

impl Default for TickConfig {
    fn default() -> Self {
        Self {
            period: Duration::from_secs(5),
            policy: TickPolicy::default(),
            initial_jitter: Duration::ZERO,
        }
    }
}

impl TickConfig {
    /// Shortest period the scheduler accepts.
    pub const MIN_PERIOD: Duration = Duration::from_millis(1);

    /// Config for a given period with default policy and no jitter.
    pub fn every(period: Duration) -> Self {
        Self {
            period,
            ..Default::default()
        }
    }

    /// Clamps out-of-range values so the config is safe to use.
    ///
    /// A zero period would spin the loop; it is raised to [`Self::MIN_PERIOD`].
    pub fn validated(mut self) -> Self {
        if self.period < Self::MIN_PERIOD {
            warn!(period = ?self.period, "tick period below minimum, clamping");
            self.period = Self::MIN_PERIOD;
        }
        self
    }
}

// ---------------------------------------------------------------------------
// Tick info
// ---------------------------------------------------------------------------

/// Information about a fired tick, returned by [`TickScheduler::wait_for_tick`].
#[derive(Debug, Clone)]
pub struct TickInfo {
    /// Monotonically increasing tick number (starts at 1).
    pub tick: u64,
    /// The period in force when this tick was scheduled.
    pub period: Duration,
    /// `true` if the tick fired more than 10% of a period late.
    pub overrun: bool,
    /// Whole periods skipped because of the overrun (0 normally).
    pub ticks_skipped: u64,
}

// ---------------------------------------------------------------------------
// Metrics
// ---------------------------------------------------------------------------

/// Counters kept by the scheduler.
#[derive(Debug, Clone, Default)]
pub struct TickMetrics {
    pub total_ticks: u64,
    pub total_overruns: u64,
    pub total_skipped: u64,
}

// ---------------------------------------------------------------------------
// Scheduler
// ---------------------------------------------------------------------------

/// Fixed-period tick scheduler. One per background loop.
pub struct TickScheduler {
    config: TickConfig,
    tick_count: u64,
    /// When the last tick fired (or when the scheduler was created).
    anchor: Instant,
    /// When the next tick should fire.
    next_tick: Instant,
    metrics: TickMetrics,
}

impl TickScheduler {
    /// Creates a scheduler. The first tick is due one period (plus jitter)
    /// from now.
    pub fn new(config: TickConfig) -> Self {
        let config = config.validated();

        let jitter = if config.initial_jitter > Duration::ZERO {
            let max_us = config.initial_jitter.as_micros() as u64;
            Duration::from_micros(rand::rng().random_range(0..=max_us))
        } else {
            Duration::ZERO
        };
        let anchor = Instant::now();
        let next_tick = anchor + config.period + jitter;

        debug!(
            period_ms = config.period.as_millis() as u64,
            jitter_us = jitter.as_micros() as u64,
            policy = ?config.policy,
            "tick scheduler created"
        );

        Self {
            config,
            tick_count: 0,
            anchor,
            next_tick,
            metrics: TickMetrics::default(),
        }
    }

    /// Creates a scheduler for `period` with default settings.
    pub fn every(period: Duration) -> Self {
        Self::new(TickConfig::every(period))
    }

    /// Waits until the next tick is due.
    pub async fn wait_for_tick(&mut self) -> TickInfo {
        let due = self.next_tick;
        let period = self.config.period;

        time::sleep_until(due).await;

        let now = Instant::now();
        self.tick_count += 1;
        self.anchor = now;

        let late_by = now.saturating_duration_since(due);
        let overrun = late_by > period / 10;
        let mut ticks_skipped = 0u64;

        self.next_tick = match self.config.policy {
            TickPolicy::Skip => {
                if overrun {
                    ticks_skipped = (late_by.as_nanos() / period.as_nanos()) as u64;
                    if ticks_skipped > 0 {
                        warn!(
                            tick = self.tick_count,
                            skipped = ticks_skipped,
                            late_ms = late_by.as_millis() as u64,
                            "tick overrun, skipping ahead"
                        );
                    }
                }
                now + period
            }
            TickPolicy::Drop => {
                if overrun {
                    warn!(
                        tick = self.tick_count,
                        late_ms = late_by.as_millis() as u64,
                        "tick overrun, keeping original cadence"
                    );
                }
                due + period
            }
        };

        if overrun {
            self.metrics.total_overruns += 1;
        }
        self.metrics.total_skipped += ticks_skipped;
        self.metrics.total_ticks += 1;

        trace!(tick = self.tick_count, overrun, "tick fired");

        TickInfo {
            tick: self.tick_count,
            period,
            overrun,
            ticks_skipped,
        }
    }

    /// Changes the period. The next tick is re-anchored on the last one:
    /// it becomes due `period` after the previous tick fired.
    ///
    /// Setting the same period again is a no-op.
    pub fn set_period(&mut self, period: Duration) {
        let period = period.max(TickConfig::MIN_PERIOD);
        if period == self.config.period {
            return;
        }
        debug!(
            tick = self.tick_count,
            from_ms = self.config.period.as_millis() as u64,
            to_ms = period.as_millis() as u64,
            "tick period changed"
        );
        self.config.period = period;
        self.next_tick = self.anchor + period;
    }

    /// The current period.
    pub fn period(&self) -> Duration {
        self.config.period
    }

    /// Number of ticks fired so far.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    /// When the next tick is due.
    pub fn next_deadline(&self) -> Instant {
        self.next_tick
    }

    pub fn metrics(&self) -> &TickMetrics {
        &self.metrics
    }
}
