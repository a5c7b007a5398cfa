pub mod detection;
pub mod mode;
pub mod stats;

pub use detection::{BoundingBox, DetectionSample, Frame};
pub use mode::{Candidate, Mode};
pub use stats::TimeStats;
