//! Player preferences
//!
//! Persisted in LocalStorage on the web, defaults everywhere else.

use serde::{Deserialize, Serialize};

use crate::audio::DEFAULT_VOLUME;
use crate::tuning::DeviceProfile;

/// Player preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Master volume (0.0 - 1.0)
    pub volume: f32,
    /// Mute music and sound effects
    pub muted: bool,
    /// Show the fireworks on the victory screen
    pub fireworks: bool,
    /// Force a device profile instead of sniffing the user agent
    pub profile: Option<DeviceProfile>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            volume: DEFAULT_VOLUME,
            muted: false,
            fireworks: true,
            profile: None,
        }
    }
}

impl Settings {
    /// LocalStorage key
    const STORAGE_KEY: &'static str = "lane_racer_settings";

    /// Slider position (0 - 100) to volume
    pub fn set_volume_percent(&mut self, percent: f32) {
        if percent.is_finite() {
            self.volume = (percent / 100.0).clamp(0.0, 1.0);
        }
    }

    pub fn toggle_mute(&mut self) -> bool {
        self.muted = !self.muted;
        self.muted
    }

    /// Saved override, or whatever the user agent says
    pub fn resolve_profile(&self, user_agent: &str) -> DeviceProfile {
        self.profile
            .unwrap_or_else(|| DeviceProfile::from_user_agent(user_agent))
    }

    /// Parse stored JSON; anything unreadable gives defaults
    pub fn from_json(json: &str) -> Self {
        match serde_json::from_str::<Settings>(json) {
            Ok(mut settings) => {
                settings.volume = if settings.volume.is_finite() {
                    settings.volume.clamp(0.0, 1.0)
                } else {
                    DEFAULT_VOLUME
                };
                settings
            }
            Err(e) => {
                log::warn!("Ignoring unreadable settings: {e}");
                Self::default()
            }
        }
    }

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(Some(json)) = storage.get_item(Self::STORAGE_KEY) {
                log::info!("Loaded settings from LocalStorage");
                return Self::from_json(&json);
            }
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let storage = web_sys::window()
            .and_then(|w| w.local_storage().ok())
            .flatten();

        if let Some(storage) = storage {
            if let Ok(json) = serde_json::to_string(self) {
                let _ = storage.set_item(Self::STORAGE_KEY, &json);
                log::debug!("Settings saved");
            }
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        log::debug!("No storage for {}; using defaults", Self::STORAGE_KEY);
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
