use crate::models::Candidate;

/// Tracks how many times in a row the same candidate has been observed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConfirmationCounter {
    last_candidate: Option<Candidate>,
    streak: u32,
}

impl ConfirmationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `candidate` and returns the resulting streak length.
    pub fn observe(&mut self, candidate: Candidate) -> u32 {
        if self.last_candidate == Some(candidate) {
            self.streak = self.streak.saturating_add(1);
        } else {
            self.last_candidate = Some(candidate);
            self.streak = 1;
        }
        self.streak
    }

    /// Zeroes the streak after a confirmed transition. The last candidate is
    /// kept so a repeat of it starts counting from one again.
    pub fn reset_streak(&mut self) {
        self.streak = 0;
    }

    /// Forgets everything, as when capture stops or IDLE is forced.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn streak(&self) -> u32 {
        self.streak
    }

    pub fn last_candidate(&self) -> Option<Candidate> {
        self.last_candidate
    }
}
