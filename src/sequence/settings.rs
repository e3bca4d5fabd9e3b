use serde::{Deserialize, Serialize};

use crate::sequence::error::SequenceError;

/// Runtime-editable recorder settings. Held in memory only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Duration of a menu-inserted sleep step
    pub default_sleep_ms: u64,
    pub screenshot_dir: String,
    /// Pause between replayed steps
    pub playback_interval_ms: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            default_sleep_ms: 1000,
            screenshot_dir: "screenshots".to_string(),
            playback_interval_ms: 500,
        }
    }
}

/// Settings form fields; omitted fields keep their value.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SettingsPatch {
    pub default_sleep_ms: Option<u64>,
    pub screenshot_dir: Option<String>,
    pub playback_interval_ms: Option<u64>,
}

impl Settings {
    /// Validate the whole patch before touching anything.
    pub fn apply(&mut self, patch: SettingsPatch) -> Result<(), SequenceError> {
        if patch.default_sleep_ms == Some(0) {
            return Err(SequenceError::InvalidRequest("defaultSleepMs must be positive".into()));
        }
        if patch.screenshot_dir.as_deref().is_some_and(|d| d.trim().is_empty()) {
            return Err(SequenceError::InvalidRequest("screenshotDir must not be empty".into()));
        }
        if let Some(ms) = patch.default_sleep_ms {
            self.default_sleep_ms = ms;
        }
        if let Some(dir) = patch.screenshot_dir {
            self.screenshot_dir = dir;
        }
        if let Some(ms) = patch.playback_interval_ms {
            self.playback_interval_ms = ms;
        }
        Ok(())
    }
}
