//! Persisted user settings.
//!
//! A single boolean (whether note-name labels are shown on the keys) is
//! stored as JSON at a fixed path. Missing or unreadable files fall back to
//! the defaults, so a corrupt settings file never prevents startup.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Default path for the settings file, relative to the working directory.
pub const DEFAULT_SETTINGS_PATH: &str = ".pianotui.json";

fn default_show_notes() -> bool {
    true
}

/// User-facing settings, persisted across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    /// Whether note-name labels are drawn on the piano keys.
    /// Defaults to visible when the field is absent.
    #[serde(default = "default_show_notes")]
    pub show_notes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self { show_notes: true }
    }
}

impl Settings {
    /// Loads settings from a file, falling back to defaults if the file is
    /// missing or cannot be parsed.
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => match serde_json::from_str(&contents) {
                Ok(settings) => settings,
                Err(e) => {
                    tracing::warn!("ignoring malformed settings file {}: {}", path.display(), e);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }

    /// Saves settings to a file as JSON.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("Failed to serialize settings")?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write settings to {}", path.display()))?;
        Ok(())
    }
}
