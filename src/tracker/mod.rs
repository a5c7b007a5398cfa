//! Wires the engine, capture geometry and sensing loops into one controller.

pub mod controller;
pub(crate) mod shared;
pub mod state;

pub use controller::{Collaborators, TrackerController};
pub use state::{CaptureSession, TrackerState};
