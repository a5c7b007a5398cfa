mod types;

pub use types::{MetricsSnapshot, TextPollOutcome, TextPollRecord};

use std::sync::Arc;
use tokio::sync::Mutex;

const MAX_RECENT_TEXT_POLLS: usize = 20;

/// Counters for the sensing loops. Cheap to clone; all clones share state.
#[derive(Clone, Default)]
pub struct MetricsCollector {
    inner: Arc<Mutex<MetricsSnapshot>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn record_face_poll(&self, succeeded: bool) {
        let mut state = self.inner.lock().await;
        state.face_polls += 1;
        if !succeeded {
            state.face_failures += 1;
        }
    }

    /// A face poll was skipped because the previous `detect` has not returned.
    pub async fn record_face_busy_skip(&self) {
        self.inner.lock().await.face_busy_skips += 1;
    }

    pub async fn record_text_poll(&self, record: TextPollRecord) {
        let mut state = self.inner.lock().await;

        state.text_polls += 1;
        match record.outcome {
            TextPollOutcome::Recognized => state.text_recognized += 1,
            TextPollOutcome::Reused => state.text_reused += 1,
            TextPollOutcome::Busy => state.text_busy_skips += 1,
            TextPollOutcome::Failed => state.text_failures += 1,
            TextPollOutcome::TimedOut => state.text_timeouts += 1,
            TextPollOutcome::Stale => state.stale_discarded += 1,
            TextPollOutcome::NoInput => {}
        }

        state.recent_text_polls.push(record);
        if state.recent_text_polls.len() > MAX_RECENT_TEXT_POLLS {
            state.recent_text_polls.remove(0);
        }
    }

    pub async fn get_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().await.clone()
    }

    pub async fn reset(&self) {
        *self.inner.lock().await = MetricsSnapshot::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn record(outcome: TextPollOutcome) -> TextPollRecord {
        TextPollRecord {
            timestamp: Utc::now(),
            outcome,
            candidate: None,
            duration_ms: 1,
        }
    }

    #[tokio::test]
    async fn counts_outcomes_and_caps_history() {
        let metrics = MetricsCollector::new();
        for _ in 0..25 {
            metrics.record_text_poll(record(TextPollOutcome::Recognized)).await;
        }
        metrics.record_text_poll(record(TextPollOutcome::Busy)).await;
        metrics.record_face_poll(true).await;
        metrics.record_face_poll(false).await;
        metrics.record_face_busy_skip().await;

        let snapshot = metrics.get_snapshot().await;
        assert_eq!(snapshot.text_polls, 26);
        assert_eq!(snapshot.text_recognized, 25);
        assert_eq!(snapshot.text_busy_skips, 1);
        assert_eq!(snapshot.face_polls, 2);
        assert_eq!(snapshot.face_failures, 1);
        assert_eq!(snapshot.face_busy_skips, 1);
        assert_eq!(snapshot.recent_text_polls.len(), MAX_RECENT_TEXT_POLLS);
        assert_eq!(
            snapshot.recent_text_polls.last().map(|r| r.outcome),
            Some(TextPollOutcome::Busy)
        );

        metrics.reset().await;
        assert_eq!(metrics.get_snapshot().await.text_polls, 0);
    }
}
