//! Browser (`wasm32`) implementations of [`platform_host`] service contracts.
//!
//! This crate is the concrete browser-side wiring layer: `localStorage` preferences, toast events
//! dispatched on `window`, the `reqwest` HTTP client for Lemmy instances, and page-origin lookup.
//! Native builds get headless fallbacks so the runtime and its tests compile everywhere.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

/// Compile-time host-strategy selection and adapter factories for runtime wiring.
pub mod adapters;
pub mod api;
pub mod notifications;
pub mod origin;
pub mod storage;

pub use adapters::{
    build_host_services, lemmy_api, notification_service, prefs_store, selected_host_strategy,
};
pub use api::HttpLemmyApi;
pub use notifications::{WebNotificationService, TOAST_EVENT};
pub use origin::page_origin;
pub use storage::local_prefs::WebPrefsStore;
