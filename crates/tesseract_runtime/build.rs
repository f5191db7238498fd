use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct YtFrontends {
    #[serde(default)]
    invidious: Vec<String>,
    #[serde(default)]
    piped: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct InstanceConfig {
    default_instance: String,
    enable_media_proxy: bool,
    enable_media_proxy_local: bool,
    #[serde(default)]
    media_proxy_blacklist: Vec<String>,
    media_proxy_lemmy_only: bool,
    #[serde(default)]
    yt_frontends: YtFrontends,
}

fn env_override(name: &str) -> Option<String> {
    println!("cargo:rerun-if-env-changed={name}");
    std::env::var(name)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
}

fn parse_flag(name: &str, raw: &str) -> bool {
    match raw.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => true,
        "false" | "0" | "no" => false,
        other => panic!("{name}: expected a boolean, found `{other}`"),
    }
}

fn parse_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

fn apply_env_overrides(config: &mut InstanceConfig) {
    if let Some(raw) = env_override("PUBLIC_INSTANCE_URL") {
        config.default_instance = raw;
    }
    if let Some(raw) = env_override("PUBLIC_ENABLE_MEDIA_PROXY") {
        config.enable_media_proxy = parse_flag("PUBLIC_ENABLE_MEDIA_PROXY", &raw);
    }
    if let Some(raw) = env_override("PUBLIC_ENABLE_MEDIA_PROXY_LOCAL") {
        config.enable_media_proxy_local = parse_flag("PUBLIC_ENABLE_MEDIA_PROXY_LOCAL", &raw);
    }
    if let Some(raw) = env_override("PUBLIC_MEDIA_PROXY_BLACKLIST") {
        config.media_proxy_blacklist = parse_list(&raw);
    }
    if let Some(raw) = env_override("PUBLIC_MEDIA_PROXY_LEMMY_ONLY") {
        config.media_proxy_lemmy_only = parse_flag("PUBLIC_MEDIA_PROXY_LEMMY_ONLY", &raw);
    }
    if let Some(raw) = env_override("PUBLIC_INVIDIOUS_LIST") {
        config.yt_frontends.invidious = parse_list(&raw);
    }
    if let Some(raw) = env_override("PUBLIC_PIPED_LIST") {
        config.yt_frontends.piped = parse_list(&raw);
    }
}

fn main() {
    let crate_root = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").expect("manifest dir"));
    let path = crate_root.join("instance.toml");
    println!("cargo:rerun-if-changed={}", path.display());

    let raw = fs::read_to_string(&path)
        .unwrap_or_else(|err| panic!("failed to read {}: {err}", path.display()));
    let mut config: InstanceConfig = toml::from_str(&raw)
        .unwrap_or_else(|err| panic!("failed to parse {}: {err}", path.display()));
    apply_env_overrides(&mut config);

    config.default_instance = config.default_instance.trim().to_lowercase();
    if config.default_instance.is_empty() {
        panic!("default_instance must not be empty");
    }
    if config.default_instance.contains("://") || config.default_instance.contains('/') {
        panic!(
            "default_instance must be a bare host, found `{}`",
            config.default_instance
        );
    }

    let json = serde_json::to_string_pretty(&config).expect("serialize instance config");
    let generated = format!(
        "/// Build-time generated instance configuration JSON.\n\
pub const INSTANCE_CONFIG_JSON: &str = r##\"{}\"##;\n",
        json
    );

    let out_dir = PathBuf::from(std::env::var("OUT_DIR").expect("OUT_DIR"));
    let out_file = out_dir.join("instance_config_generated.rs");
    fs::write(&out_file, generated)
        .unwrap_or_else(|err| panic!("failed to write {}: {err}", out_file.display()));
}
