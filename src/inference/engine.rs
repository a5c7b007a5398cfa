use serde::Serialize;

use crate::config::{InferenceConfig, LedgerConfig};
use crate::ledger::TimeLedger;
use crate::models::{DetectionSample, Mode, TimeStats};

use super::counter::ConfirmationCounter;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum TransitionReason {
    /// The face sensor reported nobody in frame.
    NoFace,
    /// No user interaction within the idle timeout.
    InteractionTimeout,
    /// The candidate repeated often enough to pass the debounce.
    Confirmed { streak: u32 },
}

/// Emitted once per accepted mode change. `stats` holds the stored ledger
/// totals right after the flush, ready to be persisted.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedTransition {
    pub from: Mode,
    pub to: Mode,
    pub at_ms: u64,
    pub reason: TransitionReason,
    pub stats: TimeStats,
}

/// Read-only view for the display: stored totals plus the running interval.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct LiveStats {
    pub mode: Mode,
    pub durations: TimeStats,
    pub capture_active: bool,
    pub at_ms: u64,
}

/// The mode state machine. Owns the current mode, the confirmation counter
/// and the time ledger; it is the only code path that writes the ledger.
#[derive(Debug, Clone)]
pub struct ModeEngine {
    config: InferenceConfig,
    pause_while_inactive: bool,
    current: Mode,
    counter: ConfirmationCounter,
    ledger: TimeLedger,
    capture_active: bool,
    last_interaction_ms: u64,
}

impl ModeEngine {
    /// Builds the engine from restored state. Capture starts inactive.
    pub fn new(
        config: InferenceConfig,
        ledger_config: &LedgerConfig,
        mode: Mode,
        durations: TimeStats,
        now_ms: u64,
    ) -> Self {
        let mut ledger = TimeLedger::restore(durations, now_ms);
        if ledger_config.pause_while_inactive {
            ledger.pause(mode, now_ms);
        }

        Self {
            config,
            pause_while_inactive: ledger_config.pause_while_inactive,
            current: mode,
            counter: ConfirmationCounter::new(),
            ledger,
            capture_active: false,
            last_interaction_ms: now_ms,
        }
    }

    pub fn start_capture(&mut self, now_ms: u64) {
        if self.capture_active {
            return;
        }
        self.capture_active = true;
        self.counter.clear();
        self.last_interaction_ms = now_ms;
        if !self.ledger.is_running() {
            self.ledger.resume(now_ms);
        }
    }

    /// Returns the ledger totals when stopping paused (and therefore flushed)
    /// the ledger, so the caller can persist them.
    pub fn stop_capture(&mut self, now_ms: u64) -> Option<TimeStats> {
        if !self.capture_active {
            return None;
        }
        self.capture_active = false;
        self.counter.clear();

        if self.pause_while_inactive {
            self.ledger.pause(self.current, now_ms);
            Some(self.ledger.durations())
        } else {
            None
        }
    }

    pub fn record_interaction(&mut self, now_ms: u64) {
        self.last_interaction_ms = self.last_interaction_ms.max(now_ms);
    }

    /// Presence-only evaluation used by the face poll: applies the forced
    /// IDLE rules without touching the confirmation streak otherwise.
    pub fn on_presence(&mut self, face_present: bool, now_ms: u64) -> Option<ConfirmedTransition> {
        if !self.capture_active {
            return None;
        }
        let reason = self.forced_idle_reason(face_present, now_ms)?;
        self.force_idle(reason, now_ms)
    }

    pub fn on_detection_sample(&mut self, sample: DetectionSample) -> Option<ConfirmedTransition> {
        if !self.capture_active {
            return None;
        }
        let now_ms = sample.timestamp_ms;

        if let Some(reason) = self.forced_idle_reason(sample.face_present, now_ms) {
            return self.force_idle(reason, now_ms);
        }

        let streak = self.counter.observe(sample.candidate);
        let target = sample.candidate.mode()?;
        if streak >= self.config.confirmation_threshold.max(1) && target != self.current {
            return Some(self.transition(target, TransitionReason::Confirmed { streak }, now_ms));
        }
        None
    }

    pub fn live_snapshot(&self, now_ms: u64) -> LiveStats {
        LiveStats {
            mode: self.current,
            durations: self.ledger.live_snapshot(self.current, now_ms),
            capture_active: self.capture_active,
            at_ms: now_ms,
        }
    }

    pub fn current_mode(&self) -> Mode {
        self.current
    }

    pub fn is_capture_active(&self) -> bool {
        self.capture_active
    }

    pub fn counter(&self) -> &ConfirmationCounter {
        &self.counter
    }

    pub fn ledger(&self) -> &TimeLedger {
        &self.ledger
    }

    fn forced_idle_reason(&self, face_present: bool, now_ms: u64) -> Option<TransitionReason> {
        if !face_present {
            Some(TransitionReason::NoFace)
        } else if now_ms.saturating_sub(self.last_interaction_ms) > self.config.idle_timeout_ms {
            Some(TransitionReason::InteractionTimeout)
        } else {
            None
        }
    }

    fn force_idle(&mut self, reason: TransitionReason, now_ms: u64) -> Option<ConfirmedTransition> {
        self.counter.clear();
        if self.current == Mode::Idle {
            return None;
        }
        Some(self.transition(Mode::Idle, reason, now_ms))
    }

    fn transition(&mut self, to: Mode, reason: TransitionReason, now_ms: u64) -> ConfirmedTransition {
        let from = self.current;
        self.ledger.flush(from, now_ms);
        self.current = to;
        self.counter.reset_streak();

        ConfirmedTransition {
            from,
            to,
            at_ms: now_ms,
            reason,
            stats: self.ledger.durations(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Candidate;

    const MINUTE: u64 = 60_000;

    fn engine() -> ModeEngine {
        let mut engine = ModeEngine::new(
            InferenceConfig::default(),
            &LedgerConfig::default(),
            Mode::Idle,
            TimeStats::default(),
            0,
        );
        engine.start_capture(0);
        engine
    }

    fn sample(candidate: impl Into<Candidate>, at: u64) -> DetectionSample {
        DetectionSample {
            face_present: true,
            candidate: candidate.into(),
            timestamp_ms: at,
        }
    }

    #[test]
    fn three_matching_samples_confirm_focus() {
        let mut engine = engine();
        assert_eq!(engine.on_detection_sample(sample(Mode::Focus, 1_000)), None);
        assert_eq!(engine.on_detection_sample(sample(Mode::Focus, 2_000)), None);

        let transition = engine
            .on_detection_sample(sample(Mode::Focus, 3_000))
            .expect("third sample confirms");
        assert_eq!(transition.from, Mode::Idle);
        assert_eq!(transition.to, Mode::Focus);
        assert_eq!(transition.reason, TransitionReason::Confirmed { streak: 3 });
        assert_eq!(transition.stats.idle_ms, 3_000);
        assert_eq!(engine.current_mode(), Mode::Focus);
        assert_eq!(engine.counter().streak(), 0);

        // further repeats are no-ops
        assert_eq!(engine.on_detection_sample(sample(Mode::Focus, 4_000)), None);
    }

    #[test]
    fn intervening_candidate_restarts_streak() {
        let mut engine = engine();
        engine.on_detection_sample(sample(Mode::Break, 1));
        engine.on_detection_sample(sample(Mode::Break, 2));
        engine.on_detection_sample(sample(Candidate::Unclassifiable, 3));
        assert_eq!(engine.on_detection_sample(sample(Mode::Break, 4)), None);
        assert_eq!(engine.on_detection_sample(sample(Mode::Break, 5)), None);
        assert!(engine.on_detection_sample(sample(Mode::Break, 6)).is_some());
        assert_eq!(engine.current_mode(), Mode::Break);
    }

    #[test]
    fn unclassifiable_never_changes_mode() {
        let mut engine = engine();
        for at in 0..10 {
            assert_eq!(engine.on_detection_sample(sample(Candidate::Unclassifiable, at)), None);
        }
        assert_eq!(engine.current_mode(), Mode::Idle);
        assert_eq!(engine.counter().streak(), 10);
    }

    #[test]
    fn missing_face_forces_idle_immediately() {
        let mut engine = engine();
        for at in [1, 2, 3] {
            engine.on_detection_sample(sample(Mode::Focus, at));
        }
        engine.on_detection_sample(sample(Mode::Break, 4));
        assert_eq!(engine.counter().streak(), 1);

        let transition = engine
            .on_detection_sample(DetectionSample {
                face_present: false,
                candidate: Mode::Focus.into(),
                timestamp_ms: 10,
            })
            .expect("no face forces idle");
        assert_eq!(transition.to, Mode::Idle);
        assert_eq!(transition.reason, TransitionReason::NoFace);
        assert_eq!(transition.stats.focus_ms, 7);
        assert_eq!(engine.counter().streak(), 0);
        assert_eq!(engine.counter().last_candidate(), None);
    }

    #[test]
    fn presence_path_forces_idle_and_ignores_present_faces() {
        let mut engine = engine();
        for at in [1, 2, 3] {
            engine.on_detection_sample(sample(Mode::Focus, at));
        }
        engine.on_detection_sample(sample(Mode::Break, 4));

        assert_eq!(engine.on_presence(true, 5), None);
        assert_eq!(engine.counter().streak(), 1);

        let transition = engine.on_presence(false, 6).unwrap();
        assert_eq!(transition.to, Mode::Idle);
        assert_eq!(engine.counter().streak(), 0);

        // already idle: nothing to emit, counter still cleared
        engine.on_detection_sample(sample(Mode::Break, 7));
        assert_eq!(engine.on_presence(false, 8), None);
        assert_eq!(engine.counter().streak(), 0);
    }

    #[test]
    fn interaction_timeout_forces_idle() {
        let mut engine = engine();
        for at in [1, 2, 3] {
            engine.on_detection_sample(sample(Mode::Focus, at));
        }
        engine.record_interaction(MINUTE);

        assert_eq!(engine.on_presence(true, 6 * MINUTE), None);
        let transition = engine.on_presence(true, 6 * MINUTE + 1).unwrap();
        assert_eq!(transition.reason, TransitionReason::InteractionTimeout);
        assert_eq!(engine.current_mode(), Mode::Idle);

        // samples keep being forced while the user stays inactive
        for at in 1..=3 {
            assert_eq!(engine.on_detection_sample(sample(Mode::Focus, 7 * MINUTE + at)), None);
        }
        assert_eq!(engine.current_mode(), Mode::Idle);

        engine.record_interaction(7 * MINUTE + 10);
        for at in 11..=12 {
            assert_eq!(engine.on_detection_sample(sample(Mode::Focus, 7 * MINUTE + at)), None);
        }
        assert!(engine.on_detection_sample(sample(Mode::Focus, 7 * MINUTE + 13)).is_some());
    }

    #[test]
    fn dormant_when_capture_inactive() {
        let mut engine = ModeEngine::new(
            InferenceConfig::default(),
            &LedgerConfig::default(),
            Mode::Focus,
            TimeStats::default(),
            0,
        );
        assert_eq!(engine.on_presence(false, 1), None);
        for at in 0..5 {
            assert_eq!(engine.on_detection_sample(sample(Mode::Break, at)), None);
        }
        assert_eq!(engine.current_mode(), Mode::Focus);
        assert_eq!(engine.counter().streak(), 0);
    }

    #[test]
    fn ledger_pauses_while_capture_is_off() {
        let mut engine = engine();
        for at in [1_000, 2_000, 3_000] {
            engine.on_detection_sample(sample(Mode::Focus, at));
        }
        let stats = engine.stop_capture(10_000).expect("pausing flushes");
        assert_eq!(stats.focus_ms, 7_000);
        assert_eq!(stats.total_ms(), 10_000);

        // an hour with the camera off accrues nothing
        assert_eq!(engine.live_snapshot(3_610_000).durations.total_ms(), 10_000);

        engine.start_capture(3_610_000);
        let live = engine.live_snapshot(3_615_000);
        assert_eq!(live.durations.focus_ms, 12_000);
        assert!(live.capture_active);
    }

    #[test]
    fn ledger_keeps_running_when_configured() {
        let mut engine = ModeEngine::new(
            InferenceConfig::default(),
            &LedgerConfig {
                pause_while_inactive: false,
            },
            Mode::Idle,
            TimeStats::default(),
            0,
        );
        assert_eq!(engine.live_snapshot(5_000).durations.idle_ms, 5_000);
        engine.start_capture(5_000);
        assert_eq!(engine.stop_capture(6_000), None);
        assert_eq!(engine.live_snapshot(8_000).durations.idle_ms, 8_000);
    }

    #[test]
    fn accounting_law_holds_across_transitions() {
        let mut engine = engine();
        let mut at = 0;
        let script = [
            Candidate::from(Mode::Focus),
            Mode::Focus.into(),
            Mode::Focus.into(),
            Candidate::Unclassifiable,
            Mode::Break.into(),
            Mode::Break.into(),
            Mode::Break.into(),
            Mode::Idle.into(),
            Mode::Idle.into(),
            Mode::Idle.into(),
        ];
        for candidate in script {
            at += 1_337;
            engine.on_detection_sample(sample(candidate, at));
            assert_eq!(engine.live_snapshot(at).durations.total_ms(), at);
            assert_eq!(engine.live_snapshot(at + 99).durations.total_ms(), at + 99);
        }
        assert_eq!(engine.current_mode(), Mode::Idle);
    }

    #[test]
    fn threshold_of_one_confirms_on_first_sample() {
        let mut engine = ModeEngine::new(
            InferenceConfig {
                confirmation_threshold: 1,
                ..InferenceConfig::default()
            },
            &LedgerConfig::default(),
            Mode::Idle,
            TimeStats::default(),
            0,
        );
        engine.start_capture(0);
        assert!(engine.on_detection_sample(sample(Mode::Break, 1)).is_some());
        assert!(engine.on_detection_sample(sample(Mode::Focus, 2)).is_some());
    }
}
