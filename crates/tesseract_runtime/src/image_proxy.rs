//! Rewrites remote image URLs so they are fetched through the client's `/image_proxy/` endpoint.

use url::{form_urlencoded, Url};

use crate::config::InstanceConfig;
use crate::settings::ProxyMediaSettings;

/// Path prefix served by the proxy endpoint.
pub const IMAGE_PROXY_PATH: &str = "/image_proxy/";
const PICTRS_MARKER: &str = "/pictrs/image";

#[derive(Debug, Clone, Copy)]
/// Everything the rewrite depends on besides the URL itself.
pub struct ProxyContext<'a> {
    /// Origin of the page, e.g. `https://tesseract.example`.
    pub origin: &'a str,
    /// Instance the active session browses.
    pub current_instance: &'a str,
    pub config: &'a InstanceConfig,
    pub settings: &'a ProxyMediaSettings,
}

impl ProxyContext<'_> {
    fn proxy_prefix(&self) -> String {
        format!("{}{IMAGE_PROXY_PATH}", self.origin)
    }

    fn keeps_original(&self, url: &str) -> bool {
        let config = self.config;
        if !config.enable_media_proxy || !self.settings.enabled {
            return true;
        }
        if config
            .media_proxy_blacklist
            .iter()
            .any(|entry| !entry.is_empty() && url.contains(entry.as_str()))
        {
            return true;
        }
        if config.media_proxy_lemmy_only && !url.contains(PICTRS_MARKER) {
            return true;
        }
        if !config.enable_media_proxy_local
            && !self.current_instance.is_empty()
            && url.contains(self.current_instance)
        {
            return true;
        }
        url.starts_with("blob:") || url.starts_with("data:") || url.contains(&self.proxy_prefix())
    }
}

/// Returns the proxied form of `url`, or `url` unchanged when policy says not to proxy it or it
/// cannot be parsed.
///
/// `size` and `format` become `thumbnail`/`format` query parameters, and only for pict-rs images.
/// Rewriting an already proxied URL returns it as is.
pub fn image_proxy_url(
    url: &str,
    size: Option<u32>,
    format: Option<&str>,
    ctx: &ProxyContext<'_>,
) -> String {
    if ctx.keeps_original(url) {
        return url.to_string();
    }
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    let Some(host) = parsed.host_str() else {
        return url.to_string();
    };

    let mut params: Vec<(String, String)> = parsed
        .query_pairs()
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();
    if ctx.settings.fallback {
        params.push(("fallback".to_string(), "true".to_string()));
    }
    if url.contains(PICTRS_MARKER) {
        if let Some(size) = size.filter(|size| *size > 0) {
            set_param(&mut params, "thumbnail", &size.to_string());
        }
        if let Some(format) = format.filter(|format| !format.is_empty()) {
            set_param(&mut params, "format", format);
        }
    }

    let authority = match parsed.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    };
    let mut proxied = format!("{}{authority}{}", ctx.proxy_prefix(), parsed.path());
    if !params.is_empty() {
        let query = form_urlencoded::Serializer::new(String::new())
            .extend_pairs(params.iter())
            .finish();
        proxied.push('?');
        proxied.push_str(&query);
    }
    proxied
}

/// [`image_proxy_url`] for optional URLs.
pub fn image_proxy_url_opt(
    url: Option<&str>,
    size: Option<u32>,
    format: Option<&str>,
    ctx: &ProxyContext<'_>,
) -> Option<String> {
    url.map(|url| image_proxy_url(url, size, format, ctx))
}

/// Replaces every `key` entry with a single one at the position of the first.
fn set_param(params: &mut Vec<(String, String)>, key: &str, value: &str) {
    match params.iter().position(|(existing, _)| existing == key) {
        Some(index) => {
            params[index].1 = value.to_string();
            let mut seen = false;
            params.retain(|(existing, _)| {
                if existing != key {
                    return true;
                }
                let keep = !seen;
                seen = true;
                keep
            });
        }
        None => params.push((key.to_string(), value.to_string())),
    }
}
