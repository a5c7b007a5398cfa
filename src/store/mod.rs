//! Durable key-value persistence for the current mode and the time ledger.
//!
//! Two keys are used: `currentMode` holds `"IDLE" | "FOCUS" | "BREAK"` and
//! `timeStats` holds the serialized [`TimeStats`]. Reads are lenient: any
//! missing or malformed value falls back to its default instead of failing.

mod json_file;
mod memory;
mod migrations;
mod sqlite;

pub use json_file::JsonFileStore;
pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use anyhow::{Context, Result};
use log::warn;

use crate::models::{Mode, TimeStats};

pub const CURRENT_MODE_KEY: &str = "currentMode";
pub const TIME_STATS_KEY: &str = "timeStats";

/// Durable key-value store. Writes are made synchronously on the tracker's
/// runtime thread while its state lock is held, so `set` should return
/// quickly.
pub trait StateStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
}

/// What survives a restart.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PersistedState {
    pub mode: Mode,
    pub stats: TimeStats,
}

/// Reads both keys once at startup. Store errors and bad values degrade to
/// defaults.
pub fn load_state(store: &dyn StateStore) -> PersistedState {
    let mode = match store.get(CURRENT_MODE_KEY) {
        Ok(Some(raw)) => raw.trim().parse::<Mode>().unwrap_or_else(|err| {
            warn!("Ignoring persisted mode: {err}; defaulting to IDLE");
            Mode::Idle
        }),
        Ok(None) => Mode::Idle,
        Err(err) => {
            warn!("Failed to read {CURRENT_MODE_KEY}: {err:?}");
            Mode::Idle
        }
    };

    let stats = match store.get(TIME_STATS_KEY) {
        Ok(Some(raw)) => TimeStats::from_persisted(&raw),
        Ok(None) => TimeStats::default(),
        Err(err) => {
            warn!("Failed to read {TIME_STATS_KEY}: {err:?}");
            TimeStats::default()
        }
    };

    PersistedState { mode, stats }
}

pub fn save_mode(store: &dyn StateStore, mode: Mode) -> Result<()> {
    store
        .set(CURRENT_MODE_KEY, mode.as_str())
        .with_context(|| format!("failed to persist {CURRENT_MODE_KEY}"))
}

pub fn save_stats(store: &dyn StateStore, stats: &TimeStats) -> Result<()> {
    let serialized = serde_json::to_string(stats)?;
    store
        .set(TIME_STATS_KEY, &serialized)
        .with_context(|| format!("failed to persist {TIME_STATS_KEY}"))
}
