//! Engine configuration, loaded from the environment.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use lotohall_room::{CleanerConfig, RoomConfig};

/// Everything the engine needs at startup.
#[derive(Debug, Clone, Default)]
pub struct EngineConfig {
    pub room: RoomConfig,
    pub cleaner: CleanerConfig,
    /// Process-wide secret for force-number. `None` disables it.
    pub admin_secret: Option<String>,
    /// Append join records here as JSON lines. `None` logs them instead.
    pub join_log_path: Option<PathBuf>,
}

impl EngineConfig {
    /// Loads `.env` (if present) and reads:
    ///
    /// | Variable                | Default  |
    /// |-------------------------|----------|
    /// | `ADMIN_SECRET`          | disabled |
    /// | `DRAW_INTERVAL_SECS`    | 5        |
    /// | `CLEANER_PERIOD_SECS`   | 5        |
    /// | `PRESENCE_TIMEOUT_SECS` | 60       |
    /// | `JOIN_LOG_PATH`         | none     |
    ///
    /// Malformed numbers fall back to the default with a warning.
    pub fn from_env() -> Self {
        dotenv::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a config from any key/value source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let mut room = defaults.room;
        let draw_interval = secs_var(
            &lookup,
            "DRAW_INTERVAL_SECS",
            u64::from(room.default_interval_secs),
        );
        room.default_interval_secs = u32::try_from(draw_interval)
            .ok()
            .filter(|secs| (1..=room.max_interval_secs).contains(secs))
            .unwrap_or_else(|| {
                tracing::warn!(
                    value = draw_interval,
                    max = room.max_interval_secs,
                    "DRAW_INTERVAL_SECS out of range, using default"
                );
                room.default_interval_secs
            });

        let cleaner = CleanerConfig {
            period: Duration::from_secs(secs_var(
                &lookup,
                "CLEANER_PERIOD_SECS",
                defaults.cleaner.period.as_secs(),
            )),
            stale_after: Duration::from_secs(secs_var(
                &lookup,
                "PRESENCE_TIMEOUT_SECS",
                defaults.cleaner.stale_after.as_secs(),
            )),
        };

        let admin_secret = lookup("ADMIN_SECRET").filter(|s| !s.trim().is_empty());
        let join_log_path = lookup("JOIN_LOG_PATH")
            .filter(|s| !s.trim().is_empty())
            .map(PathBuf::from);

        Self {
            room,
            cleaner,
            admin_secret,
            join_log_path,
        }
    }
}

/// Reads a positive number of seconds, or `default`.
fn secs_var(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    let Some(raw) = lookup(key) else {
        return default;
    };
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => secs,
        _ => {
            tracing::warn!(key, value = %raw, default, "invalid number of seconds, using default");
            default
        }
    }
}
