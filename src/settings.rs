//! Host preferences
//!
//! Persisted separately from game saves in LocalStorage.

use serde::{Deserialize, Serialize};

/// Game settings/preferences
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Pause automatically when the window loses focus or the tab is hidden
    pub pause_on_blur: bool,
    /// Largest frame delta fed to the simulation. Longer gaps (tab
    /// switches, debugger stops) are treated as this long.
    pub max_frame_delta_ms: f32,
    /// Save to the configured store whenever a new level starts
    pub autosave_on_level_start: bool,

    // === HUD ===
    /// Show FPS counter
    pub show_fps: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            pause_on_blur: true,
            max_frame_delta_ms: 100.0,
            autosave_on_level_start: true,
            show_fps: false,
        }
    }
}

impl Settings {
    /// Clamp a raw frame delta into `[0, max_frame_delta_ms]`
    pub fn clamp_frame_delta(&self, delta_ms: f64) -> f32 {
        if !delta_ms.is_finite() {
            return 0.0;
        }
        (delta_ms.max(0.0) as f32).min(self.max_frame_delta_ms.max(0.0))
    }

    /// LocalStorage key
    #[allow(dead_code)]
    const STORAGE_KEY: &'static str = "debug_defender_settings";

    /// Load settings from LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn load() -> Self {
        match crate::platform::storage::read(Self::STORAGE_KEY) {
            Ok(Some(json)) => match serde_json::from_str(&json) {
                Ok(settings) => {
                    log::info!("Loaded settings from LocalStorage");
                    return settings;
                }
                Err(e) => log::warn!("Ignoring unreadable settings: {}", e),
            },
            Ok(None) => {}
            Err(e) => log::warn!("Settings unavailable: {}", e),
        }

        log::info!("Using default settings");
        Self::default()
    }

    /// Save settings to LocalStorage (WASM only)
    #[cfg(target_arch = "wasm32")]
    pub fn save(&self) {
        let result = serde_json::to_string(self)
            .map_err(crate::error::PersistenceError::from)
            .and_then(|json| crate::platform::storage::write(Self::STORAGE_KEY, &json));
        match result {
            Ok(()) => log::info!("Settings saved"),
            Err(e) => log::warn!("Failed to save settings: {}", e),
        }
    }

    /// Native stubs
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load() -> Self {
        Self::default()
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn save(&self) {
        // No-op for native
    }
}
