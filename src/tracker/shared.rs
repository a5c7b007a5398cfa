use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::Mutex;

use crate::capture::{overlay_anchor, ScaleFactors};
use crate::classifier::KeywordClassifier;
use crate::clock::Clock;
use crate::config::TrackerConfig;
use crate::inference::ConfirmedTransition;
use crate::metrics::{MetricsCollector, TextPollOutcome, TextPollRecord};
use crate::models::{BoundingBox, Candidate, DetectionSample, TimeStats};
use crate::presenter::Presenter;
use crate::sensing::{FaceSensor, FrameSource, TextPoll, TextPoller};
use crate::store::{save_mode, save_stats, StateStore};

use super::state::TrackerState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_error, log_info};

/// Everything the tracker's tasks need, shared behind one `Arc`.
pub(crate) struct Shared {
    pub(crate) state: Mutex<TrackerState>,
    pub(crate) config: TrackerConfig,
    pub(crate) store: Arc<dyn StateStore>,
    pub(crate) presenter: Arc<dyn Presenter>,
    pub(crate) clock: Arc<dyn Clock>,
    pub(crate) classifier: KeywordClassifier,
    pub(crate) face_sensor: Arc<dyn FaceSensor>,
    /// Held by the running `detect` call, including one that timed out.
    pub(crate) face_in_flight: Arc<Mutex<()>>,
    pub(crate) frames: Arc<dyn FrameSource>,
    pub(crate) text: Option<TextPoller>,
    pub(crate) metrics: MetricsCollector,
}

impl Shared {
    /// Applies one face poll: updates presence, moves the overlay and runs
    /// the forced-IDLE rules. Ignored if `epoch` is no longer capturing.
    pub(crate) async fn apply_faces(&self, epoch: u64, frame_size: (u32, u32), faces: &[BoundingBox]) {
        let now_ms = self.clock.now_ms();
        let mut state = self.state.lock().await;
        if !state.is_current(epoch) {
            return;
        }

        let face_present = !faces.is_empty();
        state.latest_face = Some(face_present);

        if let (Some(face), Some(display)) = (faces.first(), state.roi.display()) {
            if let Some(scale) = ScaleFactors::between(frame_size.0, frame_size.1, display) {
                let (raw_x, raw_y) =
                    overlay_anchor(face, &scale, self.config.overlay.forehead_offset);
                let position = state.smoother.update(raw_x, raw_y);
                self.presenter.on_overlay_moved(position);
            }
        }

        if let Some(transition) = state.engine.on_presence(face_present, now_ms) {
            self.commit(&transition);
        }
    }

    /// Classifies recognized text and feeds it to the engine as a full
    /// sample. Returns `None` when the result is stale.
    pub(crate) async fn apply_text(&self, epoch: u64, text: &str) -> Option<Candidate> {
        let now_ms = self.clock.now_ms();
        let mut state = self.state.lock().await;
        if !state.is_current(epoch) {
            log_info!("discarding text result from a capture that has stopped");
            return None;
        }

        let candidate = self.classifier.classify(text);
        let sample = DetectionSample {
            // no successful face poll yet: do not treat missing evidence as absence
            face_present: state.latest_face.unwrap_or(true),
            candidate,
            timestamp_ms: now_ms,
        };

        if let Some(transition) = state.engine.on_detection_sample(sample) {
            self.commit(&transition);
        } else {
            log_debug!(
                "candidate {candidate} streak {}",
                state.engine.counter().streak()
            );
        }
        Some(candidate)
    }

    /// Crops the guide region from the latest frame, runs one text
    /// recognition and applies the result.
    pub(crate) async fn poll_text(&self, epoch: u64) -> Option<Candidate> {
        let poller = self.text.as_ref()?;
        let started = Instant::now();

        let (outcome, candidate) = match self.crop_latest_frame().await {
            None => (TextPollOutcome::NoInput, None),
            Some(crop) => match poller.poll(crop).await {
                TextPoll::Recognized { text, reused } => match self.apply_text(epoch, &text).await {
                    Some(candidate) if reused => (TextPollOutcome::Reused, Some(candidate)),
                    Some(candidate) => (TextPollOutcome::Recognized, Some(candidate)),
                    None => (TextPollOutcome::Stale, None),
                },
                TextPoll::Busy => (TextPollOutcome::Busy, None),
                TextPoll::Failed(_) => (TextPollOutcome::Failed, None),
                TextPoll::TimedOut => (TextPollOutcome::TimedOut, None),
            },
        };

        self.metrics
            .record_text_poll(TextPollRecord {
                timestamp: Utc::now(),
                outcome,
                candidate,
                duration_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            })
            .await;

        candidate
    }

    pub(crate) fn persist_stats(&self, stats: &TimeStats) {
        if let Err(err) = save_stats(self.store.as_ref(), stats) {
            log_error!("{err:?}");
        }
    }

    async fn crop_latest_frame(&self) -> Option<image::GrayImage> {
        let frame = self.frames.latest_frame()?;
        let roi = self.state.lock().await.roi.clone();
        roi.guide()?;

        match tokio::task::spawn_blocking(move || roi.extract(&frame.image)).await {
            Ok(crop) => crop,
            Err(join_err) => {
                log_error!("ROI extraction worker failed: {join_err}");
                None
            }
        }
    }

    /// Persists and announces a confirmed transition. Runs under the state
    /// lock so writes land in transition order. The store write is
    /// synchronous on the runtime thread; at one write per transition that
    /// is a few milliseconds at most for the bundled backends, and a slow
    /// `StateStore` delays every poll waiting on the state lock.
    fn commit(&self, transition: &ConfirmedTransition) {
        log_info!(
            "mode {} -> {} ({:?}) at {}",
            transition.from,
            transition.to,
            transition.reason,
            transition.at_ms
        );

        if let Err(err) = save_mode(self.store.as_ref(), transition.to) {
            log_error!("{err:?}");
        }
        self.persist_stats(&transition.stats);
        self.presenter.on_mode_changed(transition.to);
    }
}
