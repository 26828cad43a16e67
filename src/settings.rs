use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{fs, path::PathBuf, sync::RwLock, time::Duration};

use crate::models::MAX_DISPLAY_SECONDS;

const MIN_POLL_INTERVAL_MS: u64 = 20;
const MAX_POLL_INTERVAL_MS: u64 = 10_000;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", default)]
pub struct PlaybackSettings {
    /// How often the play head is sampled while a video plays.
    pub poll_interval_ms: u64,
    /// Width of the forward-looking window in which a pause point fires.
    pub trigger_window_ms: u64,
    /// Dwell for images and embedded videos that carry no duration.
    pub default_display_secs: u64,
    /// How long a video may sit stuck before the rotation moves on.
    pub stall_advance_secs: u64,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 100,
            trigger_window_ms: 500,
            default_display_secs: 10,
            stall_advance_secs: 15,
        }
    }
}

impl PlaybackSettings {
    /// Clamps values into a usable range. The trigger window must outlast one
    /// poll interval or a pause point can slip between two samples.
    pub fn normalized(self) -> Self {
        let defaults = Self::default();
        let poll_interval_ms = self
            .poll_interval_ms
            .clamp(MIN_POLL_INTERVAL_MS, MAX_POLL_INTERVAL_MS);
        let trigger_window_ms = self
            .trigger_window_ms
            .clamp(poll_interval_ms * 2, MAX_DISPLAY_SECONDS * 1000);
        Self {
            poll_interval_ms,
            trigger_window_ms,
            default_display_secs: non_zero_or(self.default_display_secs, defaults.default_display_secs)
                .min(MAX_DISPLAY_SECONDS),
            stall_advance_secs: non_zero_or(self.stall_advance_secs, defaults.stall_advance_secs)
                .min(MAX_DISPLAY_SECONDS),
        }
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn trigger_window(&self) -> Duration {
        Duration::from_millis(self.trigger_window_ms)
    }

    pub fn default_display(&self) -> Duration {
        Duration::from_secs(self.default_display_secs)
    }

    pub fn stall_advance(&self) -> Duration {
        Duration::from_secs(self.stall_advance_secs)
    }
}

fn non_zero_or(value: u64, fallback: u64) -> u64 {
    if value == 0 {
        fallback
    } else {
        value
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct UserSettings {
    playback: PlaybackSettings,
}

pub struct SettingsStore {
    path: PathBuf,
    data: RwLock<UserSettings>,
}

impl SettingsStore {
    pub fn new(path: PathBuf) -> Result<Self> {
        let data = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?;
            serde_json::from_str(&contents).unwrap_or_else(|err| {
                log::warn!("Ignoring unreadable settings file {}: {err}", path.display());
                UserSettings::default()
            })
        } else {
            UserSettings::default()
        };

        Ok(Self {
            path,
            data: RwLock::new(data),
        })
    }

    pub fn playback(&self) -> PlaybackSettings {
        self.read().playback.normalized()
    }

    /// Stores the normalized form and returns it.
    pub fn update_playback(&self, settings: PlaybackSettings) -> Result<PlaybackSettings> {
        let normalized = settings.normalized();
        let mut guard = match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.playback = normalized;
        self.persist(&guard)?;
        Ok(normalized)
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, UserSettings> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn persist(&self, data: &UserSettings) -> Result<()> {
        let serialized = serde_json::to_string_pretty(data)?;
        fs::write(&self.path, serialized)
            .with_context(|| format!("Failed to write settings to {}", self.path.display()))
    }
}
