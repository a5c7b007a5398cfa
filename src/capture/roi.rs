use image::{imageops, imageops::FilterType, GrayImage, RgbImage};
use serde::Serialize;

use crate::config::RoiConfig;

/// Size of the video element as laid out on screen.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct DisplaySize {
    pub width: f64,
    pub height: f64,
}

impl DisplaySize {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }

    pub fn is_valid(&self) -> bool {
        is_positive(self.width) && is_positive(self.height)
    }
}

/// OCR guide rectangle in display coordinates.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct GuideRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Independent per-axis ratios `source / display`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScaleFactors {
    pub x: f64,
    pub y: f64,
}

impl ScaleFactors {
    /// `None` until both the source frame and the display have a real size
    /// (e.g. before the video metadata has loaded).
    pub fn between(source_width: u32, source_height: u32, display: DisplaySize) -> Option<Self> {
        if source_width == 0 || source_height == 0 || !display.is_valid() {
            return None;
        }
        Some(Self {
            x: f64::from(source_width) / display.width,
            y: f64::from(source_height) / display.height,
        })
    }

    pub fn to_source(&self, x: f64, y: f64) -> (f64, f64) {
        (x * self.x, y * self.y)
    }

    pub fn to_display(&self, x: f64, y: f64) -> (f64, f64) {
        (x / self.x, y / self.y)
    }
}

pub fn compute_guide_rect(config: &RoiConfig, display: DisplaySize) -> Option<GuideRect> {
    if !display.is_valid() {
        return None;
    }
    Some(GuideRect {
        x: display.width * config.left_fraction,
        y: display.height * config.top_fraction,
        width: (display.width * config.width_fraction).min(config.max_width),
        height: (display.height * config.height_fraction).min(config.max_height),
    })
}

/// Crops the guide region out of `frame`, upsamples it and returns a
/// high-contrast grayscale image for the text sensor. Only the mapped
/// sub-rectangle is sampled; returns `None` when the geometry is degenerate.
pub fn extract_ocr_input(
    frame: &RgbImage,
    guide: &GuideRect,
    display: DisplaySize,
    config: &RoiConfig,
) -> Option<GrayImage> {
    let scale = ScaleFactors::between(frame.width(), frame.height(), display)?;

    let (left, top) = scale.to_source(guide.x, guide.y);
    let (right, bottom) = scale.to_source(guide.x + guide.width, guide.y + guide.height);

    let x0 = clamp_px(left.floor(), frame.width());
    let y0 = clamp_px(top.floor(), frame.height());
    let x1 = clamp_px(right.ceil(), frame.width());
    let y1 = clamp_px(bottom.ceil(), frame.height());
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    let (crop_width, crop_height) = (x1 - x0, y1 - y0);
    let crop = imageops::crop_imm(frame, x0, y0, crop_width, crop_height).to_image();

    let upscale = if is_positive(config.upscale) {
        config.upscale
    } else {
        1.0
    };
    let target_width = ((f64::from(crop_width) * upscale).round() as u32).max(1);
    let target_height = ((f64::from(crop_height) * upscale).round() as u32).max(1);
    let resized = imageops::resize(&crop, target_width, target_height, FilterType::Triangle);

    let gray = imageops::grayscale(&resized);
    Some(imageops::contrast(&gray, config.contrast))
}

/// Keeps the guide rectangle in sync with the display layout.
#[derive(Debug, Clone)]
pub struct RoiCapturer {
    config: RoiConfig,
    display: Option<DisplaySize>,
    guide: Option<GuideRect>,
}

impl RoiCapturer {
    pub fn new(config: RoiConfig) -> Self {
        Self {
            config,
            display: None,
            guide: None,
        }
    }

    /// Recomputes the guide rectangle for a new layout (resize, video
    /// metadata loaded). Returns the new rectangle.
    pub fn on_layout_change(&mut self, display: DisplaySize) -> Option<GuideRect> {
        self.guide = compute_guide_rect(&self.config, display);
        self.display = self.guide.map(|_| display);
        self.guide
    }

    pub fn guide(&self) -> Option<GuideRect> {
        self.guide
    }

    pub fn display(&self) -> Option<DisplaySize> {
        self.display
    }

    pub fn extract(&self, frame: &RgbImage) -> Option<GrayImage> {
        let (guide, display) = (self.guide?, self.display?);
        extract_ocr_input(frame, &guide, display, &self.config)
    }
}

fn is_positive(value: f64) -> bool {
    value.is_finite() && value > 0.0
}

fn clamp_px(value: f64, limit: u32) -> u32 {
    if value.is_nan() || value <= 0.0 {
        0
    } else {
        (value as u32).min(limit)
    }
}
