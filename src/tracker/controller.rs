use std::{
    io::Cursor,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
};

use anyhow::{bail, Context, Result};
use image::ImageFormat;
use log::{info, warn};
use tokio::{sync::Mutex, task::JoinHandle, time};

use crate::capture::{DisplaySize, GuideRect};
use crate::classifier::KeywordClassifier;
use crate::clock::{Clock, SystemClock};
use crate::config::TrackerConfig;
use crate::inference::LiveStats;
use crate::metrics::{MetricsCollector, MetricsSnapshot};
use crate::models::{Candidate, Mode};
use crate::presenter::{Presenter, SensorKind};
use crate::sensing::{FaceSensor, FrameSource, SensingController, TextPoller, TextSensor};
use crate::store::{load_state, StateStore};

use super::shared::Shared;
use super::state::TrackerState;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::log_info;

/// External collaborators the tracker is wired to.
pub struct Collaborators {
    pub store: Arc<dyn StateStore>,
    pub presenter: Arc<dyn Presenter>,
    pub face_sensor: Arc<dyn FaceSensor>,
    pub frames: Arc<dyn FrameSource>,
    pub text_sensor: Option<Arc<dyn TextSensor>>,
    pub clock: Arc<dyn Clock>,
}

impl Collaborators {
    pub fn new(
        store: Arc<dyn StateStore>,
        presenter: Arc<dyn Presenter>,
        face_sensor: Arc<dyn FaceSensor>,
        frames: Arc<dyn FrameSource>,
    ) -> Self {
        Self {
            store,
            presenter,
            face_sensor,
            frames,
            text_sensor: None,
            clock: Arc::new(SystemClock::new()),
        }
    }

    pub fn with_text_sensor(mut self, sensor: Arc<dyn TextSensor>) -> Self {
        self.text_sensor = Some(sensor);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

/// Public handle for the host UI. Cheap to clone; clones drive the same
/// tracker.
#[derive(Clone)]
pub struct TrackerController {
    shared: Arc<Shared>,
    ticker: Arc<Mutex<Option<JoinHandle<()>>>>,
    sensing: Arc<Mutex<SensingController>>,
    text_ready: Arc<AtomicBool>,
    heartbeat_every_ticks: u32,
}

impl TrackerController {
    /// Restores mode and time stats from the store. Capture starts stopped.
    pub fn new(config: TrackerConfig, collaborators: Collaborators) -> Self {
        let persisted = load_state(collaborators.store.as_ref());
        let now_ms = collaborators.clock.now_ms();
        info!(
            "Restored mode {} with {}ms accounted",
            persisted.mode,
            persisted.stats.total_ms()
        );

        let text = collaborators.text_sensor.map(|sensor| {
            TextPoller::new(
                sensor,
                config.ocr_reuse.clone(),
                config.timing.text_timeout(),
            )
        });
        let classifier = KeywordClassifier::new(
            &config.classifier.focus_keywords,
            &config.classifier.break_keywords,
        );
        let heartbeat_every_ticks = if config.debug { 1 } else { 10 };

        let shared = Shared {
            state: Mutex::new(TrackerState::new(&config, persisted, now_ms)),
            config,
            store: collaborators.store,
            presenter: collaborators.presenter,
            clock: collaborators.clock,
            classifier,
            face_sensor: collaborators.face_sensor,
            face_in_flight: Arc::new(Mutex::new(())),
            frames: collaborators.frames,
            text,
            metrics: MetricsCollector::new(),
        };

        Self {
            shared: Arc::new(shared),
            ticker: Arc::new(Mutex::new(None)),
            sensing: Arc::new(Mutex::new(SensingController::new())),
            text_ready: Arc::new(AtomicBool::new(false)),
            heartbeat_every_ticks,
        }
    }

    /// Starts face and text polling plus the display ticker. Returns the
    /// capture session id.
    pub async fn start_capture(&self) -> Result<String> {
        let mut sensing = self.sensing.lock().await;
        if sensing.is_active() {
            bail!("capture already active");
        }

        let session = {
            let mut state = self.shared.state.lock().await;
            if state.capture.is_some() {
                bail!("capture already active");
            }
            state.begin_capture(self.shared.clock.now_ms(), self.shared.clock.now_utc())
        };

        let text_ready = match &self.shared.text {
            Some(poller) => {
                poller.forget_last_recognition();
                match poller.initialize().await {
                    Ok(()) => true,
                    Err(reason) => {
                        warn!("Text sensor unavailable, continuing face-only: {reason}");
                        self.shared
                            .presenter
                            .on_sensor_unavailable(SensorKind::Text, &reason);
                        false
                    }
                }
            }
            None => {
                info!("No text sensor configured; capture is face-only");
                false
            }
        };

        // stop_capture may have run while the text sensor was initializing
        if !self.shared.state.lock().await.is_current(session.epoch) {
            bail!("capture {} was stopped while starting", session.id);
        }
        self.text_ready.store(text_ready, Ordering::SeqCst);

        if let Err(err) = sensing.start_sensing(Arc::clone(&self.shared), session.epoch, text_ready) {
            let now_ms = self.shared.clock.now_ms();
            self.shared.state.lock().await.end_capture(now_ms);
            return Err(err);
        }
        drop(sensing);

        self.spawn_ticker(session.epoch).await;

        info!("Capture {} started (epoch {})", session.id, session.epoch);
        Ok(session.id)
    }

    /// Stops capture. Face polling halts before this returns; an in-flight
    /// text recognition finishes in the background and is discarded.
    pub async fn stop_capture(&self) -> Result<()> {
        let now_ms = self.shared.clock.now_ms();

        let ended = {
            let mut state = self.shared.state.lock().await;
            state.end_capture(now_ms).map(|(session, flushed)| {
                if let Some(stats) = flushed {
                    self.shared.persist_stats(&stats);
                }
                (session, state.engine.live_snapshot(now_ms))
            })
        };

        let Some((session, final_stats)) = ended else {
            info!("stop_capture called with no active capture");
            return Ok(());
        };

        self.cancel_ticker().await;
        self.text_ready.store(false, Ordering::SeqCst);
        self.sensing.lock().await.stop_sensing().await?;

        self.shared.presenter.on_live_stats(&final_stats);
        info!("Capture {} stopped", session.id);
        Ok(())
    }

    /// Records a user interaction (keyboard, pointer) for the idle timeout.
    pub async fn record_interaction(&self) {
        let now_ms = self.shared.clock.now_ms();
        self.shared
            .state
            .lock()
            .await
            .engine
            .record_interaction(now_ms);
    }

    /// Recomputes the guide rectangle for a new display layout. Returns
    /// `None` while the display has no usable size.
    pub async fn set_display_size(&self, width: f64, height: f64) -> Option<GuideRect> {
        let rect = self
            .shared
            .state
            .lock()
            .await
            .roi
            .on_layout_change(DisplaySize::new(width, height));
        self.shared.presenter.on_guide_rect_changed(rect);
        rect
    }

    pub async fn guide_rect(&self) -> Option<GuideRect> {
        self.shared.state.lock().await.roi.guide()
    }

    pub async fn live_stats(&self) -> LiveStats {
        let now_ms = self.shared.clock.now_ms();
        self.shared.state.lock().await.engine.live_snapshot(now_ms)
    }

    pub async fn current_mode(&self) -> Mode {
        self.shared.state.lock().await.engine.current_mode()
    }

    pub async fn is_capturing(&self) -> bool {
        self.shared.state.lock().await.capture.is_some()
    }

    /// Runs one text poll right now, through the same gate and engine path
    /// as the periodic loop. `None` if capture is stopped, the sensor is
    /// unavailable or busy, or recognition failed.
    pub async fn capture_now(&self) -> Option<Candidate> {
        if !self.text_ready.load(Ordering::SeqCst) {
            return None;
        }
        let epoch = self.shared.state.lock().await.current_epoch()?;
        self.shared.poll_text(epoch).await
    }

    /// Latest camera frame encoded as PNG, if a frame is available.
    pub async fn snapshot_png(&self) -> Result<Option<Vec<u8>>> {
        let Some(frame) = self.shared.frames.latest_frame() else {
            return Ok(None);
        };

        let bytes = tokio::task::spawn_blocking(move || -> Result<Vec<u8>> {
            let mut cursor = Cursor::new(Vec::new());
            frame
                .image
                .write_to(&mut cursor, ImageFormat::Png)
                .context("failed to encode frame as PNG")?;
            Ok(cursor.into_inner())
        })
        .await
        .context("snapshot worker failed")??;

        Ok(Some(bytes))
    }

    pub async fn metrics(&self) -> MetricsSnapshot {
        self.shared.metrics.get_snapshot().await
    }

    async fn spawn_ticker(&self, epoch: u64) {
        let mut ticker_guard = self.ticker.lock().await;
        if let Some(handle) = ticker_guard.take() {
            handle.abort();
        }

        let shared = Arc::clone(&self.shared);
        let heartbeat_every = self.heartbeat_every_ticks.max(1);

        let handle = tokio::spawn(async move {
            let mut interval = time::interval(shared.config.timing.display_tick());
            let mut ticks: u32 = 0;
            loop {
                interval.tick().await;

                let (stats, session_id) = {
                    let state = shared.state.lock().await;
                    let Some(session) = state.capture.as_ref().filter(|s| s.epoch == epoch) else {
                        break;
                    };
                    (
                        state.engine.live_snapshot(shared.clock.now_ms()),
                        session.id.clone(),
                    )
                };

                shared.presenter.on_live_stats(&stats);

                ticks = ticks.wrapping_add(1);
                if ticks % heartbeat_every == 0 {
                    log_info!(
                        "heartbeat {session_id}: {} focus={}ms break={}ms idle={}ms",
                        stats.mode,
                        stats.durations.focus_ms,
                        stats.durations.break_ms,
                        stats.durations.idle_ms
                    );
                }
            }
        });

        *ticker_guard = Some(handle);
    }

    async fn cancel_ticker(&self) {
        if let Some(handle) = self.ticker.lock().await.take() {
            handle.abort();
        }
    }
}
