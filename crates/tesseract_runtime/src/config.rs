//! Deploy-time instance configuration.
//!
//! Values come from `instance.toml`, overridden by `PUBLIC_*` environment variables when the crate
//! is built, and are embedded as JSON by `build.rs`.

use leptos::logging;
use serde::{Deserialize, Serialize};

mod generated {
    include!(concat!(env!("OUT_DIR"), "/instance_config_generated.rs"));
}

pub use generated::INSTANCE_CONFIG_JSON;

/// Instance used when no configuration is available.
pub const FALLBACK_INSTANCE: &str = "lemmy.world";

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
/// Alternative YouTube front-ends whose links can be embedded, listed by host.
pub struct YtFrontends {
    /// Invidious hosts.
    #[serde(default)]
    pub invidious: Vec<String>,
    /// Piped hosts.
    #[serde(default)]
    pub piped: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
/// Options fixed when the client is deployed.
pub struct InstanceConfig {
    /// Instance guests browse when they have not picked one.
    pub default_instance: String,
    /// Master switch for the image proxy.
    pub enable_media_proxy: bool,
    /// Whether images hosted on the current instance are proxied too.
    pub enable_media_proxy_local: bool,
    /// URL substrings that are never proxied, checked in order.
    #[serde(default)]
    pub media_proxy_blacklist: Vec<String>,
    /// Only proxy pict-rs images served by Lemmy instances.
    pub media_proxy_lemmy_only: bool,
    /// Embeddable video front-ends.
    #[serde(default)]
    pub yt_frontends: YtFrontends,
}

impl Default for InstanceConfig {
    fn default() -> Self {
        Self {
            default_instance: FALLBACK_INSTANCE.to_string(),
            enable_media_proxy: false,
            enable_media_proxy_local: true,
            media_proxy_blacklist: Vec::new(),
            media_proxy_lemmy_only: false,
            yt_frontends: YtFrontends::default(),
        }
    }
}

impl InstanceConfig {
    /// Returns the configuration embedded at build time.
    pub fn builtin() -> Self {
        match serde_json::from_str(INSTANCE_CONFIG_JSON) {
            Ok(config) => config,
            Err(err) => {
                logging::warn!("embedded instance config is invalid, using defaults: {err}");
                Self::default()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_config_decodes_to_a_bare_host() {
        let config: InstanceConfig =
            serde_json::from_str(INSTANCE_CONFIG_JSON).expect("embedded config decodes");
        assert!(!config.default_instance.is_empty());
        assert!(!config.default_instance.contains('/'));
        assert_eq!(config.default_instance, config.default_instance.to_lowercase());
        assert_eq!(InstanceConfig::builtin(), config);
    }

    #[test]
    fn missing_lists_default_to_empty() {
        let config: InstanceConfig = serde_json::from_str(
            r#"{
                "default_instance": "lemmy.ml",
                "enable_media_proxy": true,
                "enable_media_proxy_local": false,
                "media_proxy_lemmy_only": true
            }"#,
        )
        .expect("decode");
        assert!(config.media_proxy_blacklist.is_empty());
        assert_eq!(config.yt_frontends, YtFrontends::default());
    }
}
