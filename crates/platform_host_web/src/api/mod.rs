//! Remote API adapters.

pub mod http;

pub use http::{instance_base_url, HttpLemmyApi, API_PATH};
