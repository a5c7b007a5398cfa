use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::Candidate;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum TextPollOutcome {
    Recognized,
    Reused,
    Busy,
    Failed,
    TimedOut,
    Stale,
    NoInput,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextPollRecord {
    pub timestamp: DateTime<Utc>,
    pub outcome: TextPollOutcome,
    pub candidate: Option<Candidate>,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricsSnapshot {
    pub face_polls: u64,
    pub face_failures: u64,
    pub face_busy_skips: u64,
    pub text_polls: u64,
    pub text_recognized: u64,
    pub text_reused: u64,
    pub text_busy_skips: u64,
    pub text_failures: u64,
    pub text_timeouts: u64,
    pub stale_discarded: u64,
    pub recent_text_polls: Vec<TextPollRecord>,
}
