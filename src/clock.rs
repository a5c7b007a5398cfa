use chrono::{DateTime, TimeZone, Utc};
use tokio::time::Instant;

/// Millisecond time source used for samples and ledger accounting.
pub trait Clock: Send + Sync {
    fn now_ms(&self) -> u64;

    fn now_utc(&self) -> DateTime<Utc> {
        let ms = i64::try_from(self.now_ms()).unwrap_or(i64::MAX);
        Utc.timestamp_millis_opt(ms).single().unwrap_or_else(Utc::now)
    }
}

/// Wall-clock time anchored once, then advanced by the runtime's monotonic
/// clock. Never jumps backwards, and follows `tokio::time::pause`/`advance`
/// in tests.
#[derive(Debug, Clone)]
pub struct SystemClock {
    wall_anchor_ms: u64,
    mono_anchor: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            wall_anchor_ms: u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0),
            mono_anchor: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        let elapsed = self.mono_anchor.elapsed().as_millis();
        self.wall_anchor_ms
            .saturating_add(u64::try_from(elapsed).unwrap_or(u64::MAX))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test(start_paused = true)]
    async fn follows_virtual_time() {
        let clock = SystemClock::new();
        let start = clock.now_ms();
        tokio::time::advance(Duration::from_secs(90)).await;
        assert_eq!(clock.now_ms() - start, 90_000);
    }

    #[tokio::test]
    async fn utc_view_matches_millis() {
        let clock = SystemClock::new();
        let utc = clock.now_utc();
        let ms = clock.now_ms() as i64;
        assert!((utc.timestamp_millis() - ms).abs() < 1_000);
    }
}
