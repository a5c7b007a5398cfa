use anyhow::{Context, Result};
use log::warn;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path, time::Duration};

/// Debounce and timeout thresholds for the inference engine.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InferenceConfig {
    /// Consecutive identical candidates needed before a mode change is accepted
    pub confirmation_threshold: u32,
    /// Time without user interaction after which IDLE is forced
    pub idle_timeout_ms: u64,
}

impl Default for InferenceConfig {
    fn default() -> Self {
        Self {
            confirmation_threshold: 3,
            idle_timeout_ms: 5 * 60 * 1000,
        }
    }
}

/// Geometry of the OCR guide rectangle and preprocessing of the crop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoiConfig {
    pub width_fraction: f64,
    pub max_width: f64,
    pub height_fraction: f64,
    pub max_height: f64,
    pub left_fraction: f64,
    pub top_fraction: f64,
    /// Upsampling factor applied to the crop before recognition
    pub upscale: f64,
    /// Contrast adjustment passed to `image::imageops::contrast`
    pub contrast: f32,
}

impl Default for RoiConfig {
    fn default() -> Self {
        Self {
            width_fraction: 0.8,
            max_width: 280.0,
            height_fraction: 0.3,
            max_height: 120.0,
            left_fraction: 0.1,
            top_fraction: 0.6,
            upscale: 1.5,
            contrast: 40.0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OverlayConfig {
    /// EMA weight given to the newest raw position
    pub smoothing_alpha: f64,
    /// Fraction of the face box height the overlay sits above its top edge
    pub forehead_offset: f64,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            smoothing_alpha: 0.2,
            forehead_offset: 0.35,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TimingConfig {
    pub face_poll_interval_ms: u64,
    pub text_poll_interval_ms: u64,
    pub display_tick_ms: u64,
    pub face_timeout_ms: u64,
    pub text_timeout_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            face_poll_interval_ms: 33,
            text_poll_interval_ms: 20_000,
            display_tick_ms: 1_000,
            face_timeout_ms: 1_000,
            text_timeout_ms: 10_000,
        }
    }
}

impl TimingConfig {
    pub fn face_poll_interval(&self) -> Duration {
        Duration::from_millis(self.face_poll_interval_ms.max(1))
    }

    pub fn text_poll_interval(&self) -> Duration {
        Duration::from_millis(self.text_poll_interval_ms.max(1))
    }

    pub fn display_tick(&self) -> Duration {
        Duration::from_millis(self.display_tick_ms.max(1))
    }

    pub fn face_timeout(&self) -> Duration {
        Duration::from_millis(self.face_timeout_ms)
    }

    pub fn text_timeout(&self) -> Duration {
        Duration::from_millis(self.text_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LedgerConfig {
    /// Stop accruing time in any mode while capture is off
    pub pause_while_inactive: bool,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            pause_while_inactive: true,
        }
    }
}

/// Keyword sets for the text classifier, matched case-insensitively.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ClassifierConfig {
    pub focus_keywords: Vec<String>,
    pub break_keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            focus_keywords: vec!["focus".into(), "study".into(), "work".into()],
            break_keywords: vec!["break".into(), "rest".into(), "pause".into()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct OcrReuseConfig {
    pub enabled: bool,
    /// Hash distance below which the crop counts as unchanged
    pub change_threshold: u32,
}

impl Default for OcrReuseConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            change_threshold: 8,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TrackerConfig {
    pub inference: InferenceConfig,
    pub roi: RoiConfig,
    pub overlay: OverlayConfig,
    pub timing: TimingConfig,
    pub ledger: LedgerConfig,
    pub ocr_reuse: OcrReuseConfig,
    pub classifier: ClassifierConfig,
    #[serde(skip)]
    pub debug: bool,
}

impl TrackerConfig {
    /// Reads the config file at `path`. A missing file yields defaults; a file
    /// that does not parse is logged and replaced by defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let mut config = if path.exists() {
            let contents = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                warn!(
                    "Ignoring malformed config at {}: {err}; using defaults",
                    path.display()
                );
                Self::default()
            })
        } else {
            Self::default()
        };

        config.debug = debug_from_env();
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)
            .with_context(|| format!("Failed to write config to {}", path.display()))
    }
}

fn debug_from_env() -> bool {
    std::env::var("MODEWATCH_DEBUG")
        .map(|value| value == "1" || value.eq_ignore_ascii_case("true"))
        .unwrap_or(false)
}
