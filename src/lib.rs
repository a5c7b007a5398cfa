pub mod capture;
pub mod classifier;
pub mod clock;
pub mod config;
pub mod inference;
pub mod ledger;
pub mod metrics;
pub mod models;
pub mod presenter;
pub mod sensing;
pub mod store;
pub mod tracker;
pub mod utils;

pub use capture::{GuideRect, OverlayPosition};
pub use classifier::{classify, KeywordClassifier};
pub use clock::{Clock, SystemClock};
pub use config::TrackerConfig;
pub use inference::{ConfirmedTransition, LiveStats, ModeEngine, TransitionReason};
pub use ledger::TimeLedger;
pub use metrics::MetricsSnapshot;
pub use models::{BoundingBox, Candidate, DetectionSample, Frame, Mode, TimeStats};
pub use presenter::{LogPresenter, Presenter, SensorKind};
pub use sensing::{FaceSensor, FrameSource, TextSensor};
pub use store::{JsonFileStore, MemoryStore, SqliteStore, StateStore};
pub use tracker::{Collaborators, TrackerController};
pub use utils::init_logging;
