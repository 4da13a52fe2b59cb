//! The presence cleaner: one background task for the whole process.
//!
//! Every `period` it sweeps all rooms and evicts users whose last ping is
//! older than `stale_after`. A stale admin closes their room.

use std::sync::Arc;

use lotohall_tick::{TickConfig, TickPolicy, TickScheduler};
use tokio::task::JoinHandle;

use crate::{CleanerConfig, RoomRegistry};

/// Spawner for the cleaner task.
pub struct PresenceCleaner;

impl PresenceCleaner {
    /// Spawns the sweep loop. It runs until the returned handle is aborted
    /// or the runtime shuts down.
    pub fn spawn(registry: Arc<RoomRegistry>, config: CleanerConfig) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut scheduler = sweep_schedule(&config);
            tracing::info!(
                period_secs = config.period.as_secs(),
                stale_after_secs = config.stale_after.as_secs(),
                "presence cleaner started"
            );

            loop {
                scheduler.wait_for_tick().await;
                let report = registry.evict_stale(config.stale_after).await;
                if !report.is_empty() {
                    tracing::debug!(
                        evicted = report.evicted.len(),
                        closed = report.closed.len(),
                        "presence sweep done"
                    );
                }
            }
        })
    }
}

/// Missed sweeps are not replayed: after a stall the next sweep is a full
/// period away.
fn sweep_schedule(config: &CleanerConfig) -> TickScheduler {
    TickScheduler::new(TickConfig {
        policy: TickPolicy::Skip,
        ..TickConfig::every(config.period)
    })
}
