pub mod counter;
pub mod engine;

pub use counter::ConfirmationCounter;
pub use engine::{ConfirmedTransition, LiveStats, ModeEngine, TransitionReason};
