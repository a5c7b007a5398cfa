use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::capture::{PositionSmoother, RoiCapturer};
use crate::config::TrackerConfig;
use crate::inference::ModeEngine;
use crate::models::TimeStats;
use crate::store::PersistedState;

/// One start..stop span of camera capture.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CaptureSession {
    pub id: String,
    /// Increments per capture; results tagged with an older epoch are stale.
    pub epoch: u64,
    pub started_at: DateTime<Utc>,
}

/// All mutable tracker state, guarded by a single lock.
#[derive(Debug)]
pub struct TrackerState {
    pub engine: ModeEngine,
    pub roi: RoiCapturer,
    pub smoother: PositionSmoother,
    /// Result of the most recent successful face poll in this capture.
    pub latest_face: Option<bool>,
    pub capture: Option<CaptureSession>,
    next_epoch: u64,
}

impl TrackerState {
    pub fn new(config: &TrackerConfig, persisted: PersistedState, now_ms: u64) -> Self {
        Self {
            engine: ModeEngine::new(
                config.inference.clone(),
                &config.ledger,
                persisted.mode,
                persisted.stats,
                now_ms,
            ),
            roi: RoiCapturer::new(config.roi.clone()),
            smoother: PositionSmoother::new(config.overlay.smoothing_alpha),
            latest_face: None,
            capture: None,
            next_epoch: 1,
        }
    }

    pub fn begin_capture(&mut self, now_ms: u64, started_at: DateTime<Utc>) -> CaptureSession {
        let session = CaptureSession {
            id: Uuid::new_v4().to_string(),
            epoch: self.next_epoch,
            started_at,
        };
        self.next_epoch += 1;

        self.engine.start_capture(now_ms);
        self.smoother.reset();
        self.latest_face = None;
        self.capture = Some(session.clone());
        session
    }

    /// Returns the finished session and, when the ledger was paused, the
    /// totals to persist.
    pub fn end_capture(&mut self, now_ms: u64) -> Option<(CaptureSession, Option<TimeStats>)> {
        let session = self.capture.take()?;
        let flushed = self.engine.stop_capture(now_ms);
        self.latest_face = None;
        Some((session, flushed))
    }

    pub fn is_current(&self, epoch: u64) -> bool {
        self.capture.as_ref().map(|session| session.epoch) == Some(epoch)
    }

    pub fn current_epoch(&self) -> Option<u64> {
        self.capture.as_ref().map(|session| session.epoch)
    }
}
