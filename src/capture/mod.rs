pub mod roi;
pub mod smoother;

pub use roi::{compute_guide_rect, extract_ocr_input, DisplaySize, GuideRect, RoiCapturer, ScaleFactors};
pub use smoother::{overlay_anchor, OverlayPosition, PositionSmoother};
