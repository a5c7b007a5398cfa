use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum Mode {
    #[default]
    Idle,
    Focus,
    Break,
}

impl Mode {
    pub const ALL: [Mode; 3] = [Mode::Idle, Mode::Focus, Mode::Break];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Idle => "IDLE",
            Mode::Focus => "FOCUS",
            Mode::Break => "BREAK",
        }
    }

    /// Status icon shown by the overlay for this mode.
    pub fn overlay_asset(&self) -> &'static str {
        match self {
            Mode::Idle => "assets/idle.png",
            Mode::Focus => "assets/focus.png",
            Mode::Break => "assets/break.png",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self> {
        match value {
            "IDLE" => Ok(Mode::Idle),
            "FOCUS" => Ok(Mode::Focus),
            "BREAK" => Ok(Mode::Break),
            other => Err(anyhow!("unknown mode '{other}'")),
        }
    }
}

/// Output of the keyword classifier: either a concrete mode or text that
/// matched no keyword set.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum Candidate {
    Mode(Mode),
    Unclassifiable,
}

impl Candidate {
    pub fn mode(&self) -> Option<Mode> {
        match self {
            Candidate::Mode(mode) => Some(*mode),
            Candidate::Unclassifiable => None,
        }
    }
}

impl From<Mode> for Candidate {
    fn from(mode: Mode) -> Self {
        Candidate::Mode(mode)
    }
}

impl fmt::Display for Candidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Candidate::Mode(mode) => fmt::Display::fmt(mode, f),
            Candidate::Unclassifiable => f.write_str("UNCLASSIFIABLE"),
        }
    }
}
