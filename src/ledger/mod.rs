use crate::models::{Mode, TimeStats};

/// Per-mode time accounting.
///
/// Stored durations change only through [`TimeLedger::flush`] and
/// [`TimeLedger::pause`]. While running, the time since `last_transition_ms`
/// belongs to whichever mode is current; [`TimeLedger::live_snapshot`] adds it
/// to a copy without writing anything back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeLedger {
    durations: TimeStats,
    last_transition_ms: u64,
    running: bool,
}

impl TimeLedger {
    pub fn new(now_ms: u64) -> Self {
        Self::restore(TimeStats::default(), now_ms)
    }

    /// Rebuilds a ledger from persisted totals. The gap between the last
    /// write and `now_ms` is not attributed to any mode.
    pub fn restore(durations: TimeStats, now_ms: u64) -> Self {
        Self {
            durations,
            last_transition_ms: now_ms,
            running: true,
        }
    }

    /// Adds the time since the last transition to `outgoing` and restarts the
    /// interval at `now_ms`.
    pub fn flush(&mut self, outgoing: Mode, now_ms: u64) {
        if self.running {
            let elapsed = now_ms.saturating_sub(self.last_transition_ms);
            let bucket = self.durations.get_mut(outgoing);
            *bucket = bucket.saturating_add(elapsed);
        }
        self.last_transition_ms = now_ms;
    }

    pub fn live_snapshot(&self, current: Mode, now_ms: u64) -> TimeStats {
        let mut snapshot = self.durations;
        if self.running {
            let elapsed = now_ms.saturating_sub(self.last_transition_ms);
            let bucket = snapshot.get_mut(current);
            *bucket = bucket.saturating_add(elapsed);
        }
        snapshot
    }

    /// Flushes into `current` and stops accruing until [`TimeLedger::resume`].
    pub fn pause(&mut self, current: Mode, now_ms: u64) {
        self.flush(current, now_ms);
        self.running = false;
    }

    pub fn resume(&mut self, now_ms: u64) {
        self.last_transition_ms = now_ms;
        self.running = true;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn durations(&self) -> TimeStats {
        self.durations
    }

    pub fn last_transition_ms(&self) -> u64 {
        self.last_transition_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flush_credits_outgoing_mode() {
        let mut ledger = TimeLedger::new(1_000);
        ledger.flush(Mode::Idle, 4_000);
        ledger.flush(Mode::Focus, 10_000);

        let stored = ledger.durations();
        assert_eq!(stored.idle_ms, 3_000);
        assert_eq!(stored.focus_ms, 6_000);
        assert_eq!(stored.break_ms, 0);
        assert_eq!(ledger.last_transition_ms(), 10_000);
    }

    #[test]
    fn live_snapshot_does_not_mutate() {
        let mut ledger = TimeLedger::new(0);
        ledger.flush(Mode::Idle, 500);
        let before = ledger.clone();

        let first = ledger.live_snapshot(Mode::Focus, 2_500);
        for _ in 0..5 {
            assert_eq!(ledger.live_snapshot(Mode::Focus, 2_500), first);
        }
        assert_eq!(first.focus_ms, 2_000);
        assert_eq!(ledger, before);
    }

    #[test]
    fn flush_then_snapshot_is_continuous() {
        let mut ledger = TimeLedger::new(0);
        ledger.flush(Mode::Idle, 1_000);

        let without_flush = ledger.live_snapshot(Mode::Focus, 7_000);
        ledger.flush(Mode::Focus, 7_000);
        let with_flush = ledger.live_snapshot(Mode::Break, 7_000);

        assert_eq!(without_flush.total_ms(), with_flush.total_ms());
        assert_eq!(with_flush.focus_ms, 6_000);
    }

    #[test]
    fn snapshot_total_tracks_elapsed_time() {
        let created = 250;
        let mut ledger = TimeLedger::new(created);
        let steps = [(Mode::Idle, 900), (Mode::Focus, 4_200), (Mode::Break, 5_000)];
        for (mode, at) in steps {
            ledger.flush(mode, at);
            assert_eq!(ledger.live_snapshot(Mode::Idle, at).total_ms(), at - created);
        }
        assert_eq!(ledger.live_snapshot(Mode::Idle, 9_250).total_ms(), 9_000);
    }

    #[test]
    fn restore_does_not_extrapolate_gap() {
        let persisted = TimeStats {
            focus_ms: 10,
            break_ms: 20,
            idle_ms: 30,
        };
        let ledger = TimeLedger::restore(persisted, 1_000_000);
        assert_eq!(ledger.live_snapshot(Mode::Focus, 1_000_000), persisted);
        assert_eq!(ledger.live_snapshot(Mode::Focus, 1_000_040).focus_ms, 50);
    }

    #[test]
    fn paused_ledger_holds_totals() {
        let mut ledger = TimeLedger::new(0);
        ledger.pause(Mode::Focus, 2_000);
        assert!(!ledger.is_running());
        assert_eq!(ledger.live_snapshot(Mode::Focus, 60_000).focus_ms, 2_000);

        ledger.flush(Mode::Focus, 70_000);
        assert_eq!(ledger.durations().focus_ms, 2_000);

        ledger.resume(100_000);
        assert_eq!(ledger.live_snapshot(Mode::Focus, 101_000).focus_ms, 3_000);
    }

    #[test]
    fn clock_going_backwards_adds_nothing() {
        let mut ledger = TimeLedger::new(5_000);
        assert_eq!(ledger.live_snapshot(Mode::Idle, 4_000).idle_ms, 0);
        ledger.flush(Mode::Idle, 4_000);
        assert_eq!(ledger.durations().idle_ms, 0);
    }
}
