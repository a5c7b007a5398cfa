use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};
use std::time::Duration;

use image::GrayImage;
use image_hasher::ImageHash;
use tokio::sync::Mutex;

use crate::config::OcrReuseConfig;

use super::phash::{compute_hamming_distance, compute_phash};
use super::TextSensor;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TextPoll {
    Recognized { text: String, reused: bool },
    /// A previous sensor call is still running.
    Busy,
    Failed(String),
    TimedOut,
}

/// Single-flight wrapper around the text sensor.
///
/// At most one sensor call (`initialize` or `recognize`) runs at a time,
/// across captures. A call that outlives its timeout keeps the sensor
/// reserved until it actually returns, and polls issued meanwhile report
/// [`TextPoll::Busy`].
pub struct TextPoller {
    sensor: Arc<dyn TextSensor>,
    in_flight: Arc<Mutex<()>>,
    last_recognition: StdMutex<Option<(ImageHash, String)>>,
    /// Bumped by `forget_last_recognition`; a call started under an older
    /// generation does not refill the cache.
    generation: AtomicU64,
    reuse: OcrReuseConfig,
    timeout: Duration,
}

impl TextPoller {
    pub fn new(sensor: Arc<dyn TextSensor>, reuse: OcrReuseConfig, timeout: Duration) -> Self {
        Self {
            sensor,
            in_flight: Arc::new(Mutex::new(())),
            last_recognition: StdMutex::new(None),
            generation: AtomicU64::new(0),
            reuse,
            timeout,
        }
    }

    /// Runs the sensor's one-time setup. Waits up to the timeout for a call
    /// left over from an earlier capture to finish first.
    pub async fn initialize(&self) -> Result<(), String> {
        let Ok(permit) =
            tokio::time::timeout(self.timeout, Arc::clone(&self.in_flight).lock_owned()).await
        else {
            return Err(format!(
                "text sensor still busy after {}ms",
                self.timeout.as_millis()
            ));
        };

        let sensor = Arc::clone(&self.sensor);
        let worker = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            sensor.initialize()
        });

        match tokio::time::timeout(self.timeout, worker).await {
            Ok(Ok(Ok(()))) => Ok(()),
            Ok(Ok(Err(err))) => Err(format!("{err:#}")),
            Ok(Err(join_err)) => Err(format!("initialization worker failed: {join_err}")),
            Err(_) => Err(format!(
                "initialization timed out after {}ms",
                self.timeout.as_millis()
            )),
        }
    }

    pub async fn poll(&self, image: GrayImage) -> TextPoll {
        let Ok(permit) = Arc::clone(&self.in_flight).try_lock_owned() else {
            log_debug!("text sensor still busy with a previous call; skipping poll");
            return TextPoll::Busy;
        };

        let generation = self.generation.load(Ordering::SeqCst);
        let hash = if self.reuse.enabled {
            let hash = compute_phash(&image);
            if let Some(text) = self.reusable_text(&hash) {
                return TextPoll::Recognized { text, reused: true };
            }
            Some(hash)
        } else {
            None
        };

        let sensor = Arc::clone(&self.sensor);
        let worker = tokio::task::spawn_blocking(move || {
            // released only when the sensor call returns
            let _permit = permit;
            sensor.recognize(&image)
        });

        match tokio::time::timeout(self.timeout, worker).await {
            Ok(Ok(Ok(text))) => {
                if let Some(hash) = hash {
                    let mut cache = self.cache();
                    if self.generation.load(Ordering::SeqCst) == generation {
                        *cache = Some((hash, text.clone()));
                    }
                }
                TextPoll::Recognized {
                    text,
                    reused: false,
                }
            }
            Ok(Ok(Err(err))) => {
                log_warn!("text recognition failed: {err:#}");
                TextPoll::Failed(format!("{err:#}"))
            }
            Ok(Err(join_err)) => {
                log_warn!("text recognition worker failed: {join_err}");
                TextPoll::Failed(join_err.to_string())
            }
            Err(_) => {
                log_warn!(
                    "text recognition timeout (> {}ms)",
                    self.timeout.as_millis()
                );
                TextPoll::TimedOut
            }
        }
    }

    /// Drops the cached recognition so the next poll always calls the sensor.
    /// Recognitions already in flight will not repopulate it.
    pub fn forget_last_recognition(&self) {
        let mut cache = self.cache();
        self.generation.fetch_add(1, Ordering::SeqCst);
        *cache = None;
    }

    fn reusable_text(&self, hash: &ImageHash) -> Option<String> {
        let cache = self.cache();
        let (prev_hash, text) = cache.as_ref()?;
        (compute_hamming_distance(hash, prev_hash) < self.reuse.change_threshold)
            .then(|| text.clone())
    }

    fn cache(&self) -> std::sync::MutexGuard<'_, Option<(ImageHash, String)>> {
        self.last_recognition
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}
