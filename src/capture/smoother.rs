use serde::Serialize;

use crate::models::BoundingBox;

use super::roi::ScaleFactors;

/// Overlay position in display coordinates.
#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct OverlayPosition {
    pub x: f64,
    pub y: f64,
}

/// Exponential moving average over overlay positions. The first update after
/// construction or [`PositionSmoother::reset`] seeds directly from the raw
/// position, so the overlay does not sweep in from the origin.
#[derive(Debug, Clone)]
pub struct PositionSmoother {
    alpha: f64,
    smoothed: Option<OverlayPosition>,
}

impl PositionSmoother {
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha: alpha.clamp(0.0, 1.0),
            smoothed: None,
        }
    }

    pub fn update(&mut self, raw_x: f64, raw_y: f64) -> OverlayPosition {
        let next = match self.smoothed {
            None => OverlayPosition { x: raw_x, y: raw_y },
            Some(prev) => OverlayPosition {
                x: prev.x * (1.0 - self.alpha) + raw_x * self.alpha,
                y: prev.y * (1.0 - self.alpha) + raw_y * self.alpha,
            },
        };
        self.smoothed = Some(next);
        next
    }

    pub fn current(&self) -> Option<OverlayPosition> {
        self.smoothed
    }

    pub fn reset(&mut self) {
        self.smoothed = None;
    }
}

/// Raw overlay anchor for a face box: horizontally centred, `forehead_offset`
/// box-heights above the top edge, converted to display coordinates.
pub fn overlay_anchor(face: &BoundingBox, scale: &ScaleFactors, forehead_offset: f64) -> (f64, f64) {
    let source_y = face.y - face.height * forehead_offset;
    scale.to_display(face.center_x(), source_y)
}
