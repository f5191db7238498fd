//! Typed host-domain contracts and shared models used across the client runtime and browser
//! adapters.
//!
//! This crate is the API-first boundary for platform services. It exposes the preference store
//! used for local persistence, the toast notification service, and the remote Lemmy API contract
//! with its wire models. Concrete browser adapters live in `platform_host_web`.

#![warn(missing_docs, rustdoc::broken_intra_doc_links)]

pub mod api;
pub mod host;
pub mod notifications;
pub mod storage;

pub use api::{
    ApiCall, ApiError, ApiTarget, LemmyApi, LemmyApiFuture, MemoryLemmyApi, NoopLemmyApi,
};
pub use host::{HostServices, HostStrategy};
pub use notifications::{
    MemoryNotificationService, NoopNotificationService, NotificationService, Toast, ToastAction,
    ToastLevel,
};
pub use storage::prefs::{
    load_pref_with, save_pref_with, MemoryPrefsStore, NoopPrefsStore, PrefsStore,
};
