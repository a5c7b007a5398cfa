use log::warn;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::mode::Mode;

/// Accumulated milliseconds per mode. Serialized as
/// `{"FOCUS": n, "BREAK": n, "IDLE": n}`.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct TimeStats {
    #[serde(rename = "FOCUS")]
    pub focus_ms: u64,
    #[serde(rename = "BREAK")]
    pub break_ms: u64,
    #[serde(rename = "IDLE")]
    pub idle_ms: u64,
}

impl TimeStats {
    pub fn get(&self, mode: Mode) -> u64 {
        match mode {
            Mode::Idle => self.idle_ms,
            Mode::Focus => self.focus_ms,
            Mode::Break => self.break_ms,
        }
    }

    pub fn get_mut(&mut self, mode: Mode) -> &mut u64 {
        match mode {
            Mode::Idle => &mut self.idle_ms,
            Mode::Focus => &mut self.focus_ms,
            Mode::Break => &mut self.break_ms,
        }
    }

    pub fn total_ms(&self) -> u64 {
        self.focus_ms
            .saturating_add(self.break_ms)
            .saturating_add(self.idle_ms)
    }

    /// Lenient decode of the persisted `timeStats` value. Anything that is not
    /// a finite, non-negative number becomes zero; a payload that is not a JSON
    /// object yields all zeroes.
    pub fn from_persisted(raw: &str) -> Self {
        let value: Value = match serde_json::from_str(raw) {
            Ok(value) => value,
            Err(err) => {
                warn!("Discarding unparsable timeStats payload: {err}");
                return Self::default();
            }
        };

        let Some(object) = value.as_object() else {
            warn!("Discarding timeStats payload that is not an object");
            return Self::default();
        };

        let mut stats = Self::default();
        for mode in Mode::ALL {
            *stats.get_mut(mode) = object
                .get(mode.as_str())
                .map(coerce_duration)
                .unwrap_or(0);
        }
        stats
    }
}

fn coerce_duration(value: &Value) -> u64 {
    match value.as_f64() {
        Some(ms) if ms.is_finite() && ms >= 0.0 => ms.min(u64::MAX as f64) as u64,
        _ => {
            warn!("Coercing invalid duration {value} to 0");
            0
        }
    }
}
