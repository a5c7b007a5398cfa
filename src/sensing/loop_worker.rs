use std::sync::Arc;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::tracker::shared::Shared;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Polls the face sensor at frame cadence until cancelled. Cancellation wins
/// over an in-progress poll, so no sample is delivered after stop. Only one
/// `detect` call runs at a time; ticks that find it busy are skipped.
pub(crate) async fn face_loop(shared: Arc<Shared>, epoch: u64, cancel_token: CancellationToken) {
    let mut ticker = time::interval(shared.config.timing.face_poll_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                tokio::select! {
                    biased;
                    _ = cancel_token.cancelled() => break,
                    _ = poll_face(&shared, epoch) => {}
                }
            }
        }
    }

    log_info!("face poll loop shutting down");
}

/// Polls the text sensor on its own, longer period. A recognition that is
/// already running when capture stops is left to finish; its result is
/// discarded by the epoch check in [`Shared::poll_text`].
pub(crate) async fn text_loop(shared: Arc<Shared>, epoch: u64, cancel_token: CancellationToken) {
    let period = shared.config.timing.text_poll_interval();
    let mut ticker = time::interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                if let Some(candidate) = shared.poll_text(epoch).await {
                    log_debug!("text poll classified as {candidate}");
                }
            }
        }
    }

    log_info!("text poll loop shutting down");
}

async fn poll_face(shared: &Shared, epoch: u64) {
    let Some(frame) = shared.frames.latest_frame() else {
        return;
    };

    let Ok(permit) = Arc::clone(&shared.face_in_flight).try_lock_owned() else {
        shared.metrics.record_face_busy_skip().await;
        log_debug!("face detector still busy with a previous frame; skipping poll");
        return;
    };

    let sensor = Arc::clone(&shared.face_sensor);
    let image = Arc::clone(&frame.image);
    let timestamp_ms = frame.captured_at_ms;
    let timeout = shared.config.timing.face_timeout();

    let worker = tokio::task::spawn_blocking(move || {
        // held until the detector returns, even past the timeout
        let _permit = permit;
        sensor.detect(&image, timestamp_ms)
    });
    match time::timeout(timeout, worker).await {
        Ok(Ok(Ok(faces))) => {
            shared.metrics.record_face_poll(true).await;
            shared
                .apply_faces(epoch, (frame.width(), frame.height()), &faces)
                .await;
        }
        Ok(Ok(Err(err))) => {
            shared.metrics.record_face_poll(false).await;
            log_debug!("face detection failed: {err:#}");
        }
        Ok(Err(join_err)) => {
            shared.metrics.record_face_poll(false).await;
            log_warn!("face detection worker failed: {join_err}");
        }
        Err(_) => {
            shared.metrics.record_face_poll(false).await;
            log_warn!("face detection timeout (> {}ms)", timeout.as_millis());
        }
    }
}
