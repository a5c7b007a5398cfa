use std::sync::Arc;

use image::RgbImage;
use serde::{Deserialize, Serialize};

use super::mode::Candidate;

/// One fused sensor reading. Consumed immediately by the inference engine,
/// never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DetectionSample {
    pub face_present: bool,
    pub candidate: Candidate,
    pub timestamp_ms: u64,
}

/// Face bounding box in source-frame pixel coordinates.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl BoundingBox {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center_x(&self) -> f64 {
        self.x + self.width / 2.0
    }
}

/// A decoded video frame as delivered by the capture device.
#[derive(Debug, Clone)]
pub struct Frame {
    pub image: Arc<RgbImage>,
    pub captured_at_ms: u64,
}

impl Frame {
    pub fn new(image: RgbImage, captured_at_ms: u64) -> Self {
        Self {
            image: Arc::new(image),
            captured_at_ms,
        }
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}
