//! Auto-save preferences.
//!
//! # Invariants
//! - Stored under the fixed local key `autoSaveSettings`, independent of the
//!   workspace storage key.
//! - A missing or malformed record yields the defaults.

use crate::cache::LocalCache;
use log::warn;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Local cache key holding the persisted settings.
pub const AUTO_SAVE_SETTINGS_KEY: &str = "autoSaveSettings";

const DEFAULT_DELAY_SECONDS: u64 = 60;

/// User-controlled remote auto-save preferences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutoSaveSettings {
    pub enabled: bool,
    /// Debounce window in whole seconds. Serialized as `delay`.
    #[serde(rename = "delay")]
    pub delay_seconds: u64,
}

impl Default for AutoSaveSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            delay_seconds: DEFAULT_DELAY_SECONDS,
        }
    }
}

impl AutoSaveSettings {
    pub fn new(enabled: bool, delay_seconds: u64) -> Self {
        Self {
            enabled,
            delay_seconds,
        }
    }

    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    /// Reads persisted settings, falling back to defaults.
    pub fn load(cache: &dyn LocalCache) -> Self {
        let Some(raw) = cache.load(AUTO_SAVE_SETTINGS_KEY) else {
            return Self::default();
        };
        if raw.is_null() {
            return Self::default();
        }
        match serde_json::from_value(raw) {
            Ok(settings) => settings,
            Err(err) => {
                warn!(
                    "event=settings_load module=settings status=error error_code=malformed_settings error={}",
                    err
                );
                Self::default()
            }
        }
    }

    pub fn save(&self, cache: &dyn LocalCache) {
        match serde_json::to_value(self) {
            Ok(value) => cache.save(AUTO_SAVE_SETTINGS_KEY, &value),
            Err(err) => warn!("event=settings_save module=settings status=error error={err}"),
        }
    }
}
