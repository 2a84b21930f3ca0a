//! Runtime configuration for the logbook engine.
//!
//! Loaded from an optional JSON file. Every field has a default, so a
//! partial or missing file is fine.

use std::path::Path;

use chrono::Locale;
use serde::{Deserialize, Serialize};

use crate::errors::CoreError;

/// Engine tunables: reminder thresholds, location timeouts, presentation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogbookConfig {
    /// POSIX locale used for month names (e.g. "sk_SK", "en_US")
    #[serde(default = "default_locale")]
    pub locale: String,

    /// A distance reminder is due when at most this many km remain
    #[serde(default = "default_distance_warning_km")]
    pub distance_warning_km: f64,

    /// A date reminder is due when at most this many days remain
    #[serde(default = "default_date_warning_days")]
    pub date_warning_days: i64,

    /// High-accuracy location attempt timeout
    #[serde(default = "default_gps_timeout_secs")]
    pub gps_timeout_secs: u64,

    /// Low-accuracy retry timeout, used after the first attempt times out
    #[serde(default = "default_gps_fallback_timeout_secs")]
    pub gps_fallback_timeout_secs: u64,

    /// Icon reference attached to reminder notifications
    #[serde(default = "default_notification_icon")]
    pub notification_icon: String,
}

impl Default for LogbookConfig {
    fn default() -> Self {
        Self {
            locale: default_locale(),
            distance_warning_km: default_distance_warning_km(),
            date_warning_days: default_date_warning_days(),
            gps_timeout_secs: default_gps_timeout_secs(),
            gps_fallback_timeout_secs: default_gps_fallback_timeout_secs(),
            notification_icon: default_notification_icon(),
        }
    }
}

fn default_locale() -> String {
    "sk_SK".to_string()
}

fn default_distance_warning_km() -> f64 {
    1000.0
}

fn default_date_warning_days() -> i64 {
    14
}

fn default_gps_timeout_secs() -> u64 {
    8
}

fn default_gps_fallback_timeout_secs() -> u64 {
    15
}

fn default_notification_icon() -> String {
    "https://cdn-icons-png.flaticon.com/512/2555/2555013.png".to_string()
}

impl LogbookConfig {
    /// Load from a JSON file, or return defaults when the file does not exist.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default(path: &Path) -> Result<Self, CoreError> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| CoreError::Config(format!("{}: {e}", path.display())))
    }

    /// Write this config as pretty JSON, creating parent directories.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self, path: &Path) -> Result<(), CoreError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| CoreError::Serialization(format!("Failed to serialize config: {e}")))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Parsed month-name locale. Unknown names fall back to `en_US`.
    #[must_use]
    pub fn chrono_locale(&self) -> Locale {
        Locale::try_from(self.locale.as_str()).unwrap_or_else(|_| {
            tracing::warn!(locale = %self.locale, "unknown locale, falling back to en_US");
            Locale::en_US
        })
    }
}
