//! Sensor adapter seams and the polling loops that drive them.

pub mod controller;
pub mod loop_worker;
pub mod phash;
pub mod text;

pub use controller::SensingController;
pub use text::{TextPoll, TextPoller};

use anyhow::Result;
use image::{GrayImage, RgbImage};

use crate::models::{BoundingBox, Frame};

/// Face-presence detector. An empty list means nobody is in frame.
pub trait FaceSensor: Send + Sync {
    fn detect(&self, frame: &RgbImage, timestamp_ms: u64) -> Result<Vec<BoundingBox>>;
}

/// Text recognizer. Calls may be slow; they run on the blocking pool and are
/// never issued concurrently on the same instance.
pub trait TextSensor: Send + Sync {
    /// Loads models or warms up the engine. Called once per capture start.
    fn initialize(&self) -> Result<()> {
        Ok(())
    }

    fn recognize(&self, image: &GrayImage) -> Result<String>;
}

/// Latest decoded frame from the capture device, if one is available yet.
pub trait FrameSource: Send + Sync {
    fn latest_frame(&self) -> Option<Frame>;
}
