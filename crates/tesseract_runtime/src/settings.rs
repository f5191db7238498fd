//! Per-browser user settings persisted under the `settings` preference key.

use leptos::logging;
use platform_host::api::types::{ListingType, SortType};
use platform_host::{load_pref_with, save_pref_with, PrefsStore};
use serde::{Deserialize, Serialize};

/// Preference key holding [`UserSettings`].
pub const SETTINGS_KEY: &str = "settings";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// User side of the image proxy switch.
pub struct ProxyMediaSettings {
    /// Route images through the proxy when the deployment allows it.
    pub enabled: bool,
    /// Ask the proxy to redirect to the source when it cannot fetch an image.
    pub fallback: bool,
}

impl Default for ProxyMediaSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            fallback: false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UiState {
    /// Page size for profile listings; `None` uses the loader default.
    pub posts_per_page: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
/// Feed ordering used when a page URL does not specify one.
pub struct DefaultSort {
    pub sort: SortType,
    pub feed: ListingType,
}

impl Default for DefaultSort {
    fn default() -> Self {
        Self {
            sort: SortType::Active,
            feed: ListingType::Local,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
/// Settings chosen by the user; unknown or missing fields fall back to defaults.
pub struct UserSettings {
    pub proxy_media: ProxyMediaSettings,
    pub ui_state: UiState,
    pub default_sort: DefaultSort,
    /// Emit verbose session traces to the console.
    pub debug_info: bool,
}

/// Loads user settings, falling back to defaults when absent or unreadable.
pub fn load_user_settings(prefs: &dyn PrefsStore) -> UserSettings {
    match load_pref_with::<_, UserSettings>(prefs, SETTINGS_KEY) {
        Ok(settings) => settings.unwrap_or_default(),
        Err(err) => {
            logging::warn!("user settings load failed, using defaults: {err}");
            UserSettings::default()
        }
    }
}

/// Persists user settings.
///
/// # Errors
///
/// Returns an error when serialization or the store write fails.
pub fn save_user_settings(prefs: &dyn PrefsStore, settings: &UserSettings) -> Result<(), String> {
    save_pref_with(prefs, SETTINGS_KEY, settings)
}
