use serde::Serialize;

use crate::capture::{GuideRect, OverlayPosition};
use crate::inference::LiveStats;
use crate::models::Mode;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum SensorKind {
    Face,
    Text,
}

/// UI-side callbacks. Implementations must return quickly; they are called
/// from the tracker's tasks.
pub trait Presenter: Send + Sync {
    /// Exactly once per confirmed transition.
    fn on_mode_changed(&self, mode: Mode);

    /// Once per display tick.
    fn on_live_stats(&self, stats: &LiveStats);

    fn on_overlay_moved(&self, _position: OverlayPosition) {}

    fn on_guide_rect_changed(&self, _rect: Option<GuideRect>) {}

    /// A sensor could not be initialized; surfaced once per capture start.
    fn on_sensor_unavailable(&self, _sensor: SensorKind, _reason: &str) {}
}

/// Presenter that only writes to the log. Useful for headless runs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogPresenter;

impl Presenter for LogPresenter {
    fn on_mode_changed(&self, mode: Mode) {
        log::info!("Mode is now {mode} ({})", mode.overlay_asset());
    }

    fn on_live_stats(&self, stats: &LiveStats) {
        log::debug!(
            "{}: focus={}ms break={}ms idle={}ms",
            stats.mode,
            stats.durations.focus_ms,
            stats.durations.break_ms,
            stats.durations.idle_ms
        );
    }

    fn on_sensor_unavailable(&self, sensor: SensorKind, reason: &str) {
        log::warn!("{sensor:?} sensor unavailable: {reason}");
    }
}
