//! Shared host-bundle model for browser and headless runtime composition.

use std::rc::Rc;

use crate::{
    LemmyApi, NoopLemmyApi, NoopNotificationService, NoopPrefsStore, NotificationService,
    PrefsStore,
};

/// Stable host strategy selected for the current build/runtime composition path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostStrategy {
    /// Browser-backed composition (`localStorage`, fetch, page origin).
    Browser,
    /// Composition without browser services: tests, native tools, server-side prerendering.
    Headless,
}

impl HostStrategy {
    /// Returns a stable string token for diagnostics and runtime inspection.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Browser => "browser",
            Self::Headless => "headless",
        }
    }
}

/// Runtime-selected host service bundle injected into the client runtime.
///
/// All environment-specific service selection happens before this bundle crosses into
/// `tesseract_runtime`, which keeps the runtime decoupled from browser adapter details.
#[derive(Clone)]
pub struct HostServices {
    /// Key/value JSON store backing the profile collection and user settings.
    pub prefs: Rc<dyn PrefsStore>,
    /// Toast delivery service.
    pub notifications: Rc<dyn NotificationService>,
    /// Remote Lemmy API.
    pub api: Rc<dyn LemmyApi>,
    /// Origin the client is served from (e.g. `https://tesseract.example`), used to build
    /// image-proxy URLs. Empty when unknown.
    pub origin: String,
    /// Stable strategy identifier for diagnostics.
    pub host_strategy: HostStrategy,
}

impl HostServices {
    /// Bundle with no storage, no notifications, and no network.
    pub fn headless() -> Self {
        Self {
            prefs: Rc::new(NoopPrefsStore),
            notifications: Rc::new(NoopNotificationService),
            api: Rc::new(NoopLemmyApi),
            origin: String::new(),
            host_strategy: HostStrategy::Headless,
        }
    }

    /// Replaces the prefs store.
    pub fn with_prefs(mut self, prefs: Rc<dyn PrefsStore>) -> Self {
        self.prefs = prefs;
        self
    }

    /// Replaces the notification service.
    pub fn with_notifications(mut self, notifications: Rc<dyn NotificationService>) -> Self {
        self.notifications = notifications;
        self
    }

    /// Replaces the remote API.
    pub fn with_api(mut self, api: Rc<dyn LemmyApi>) -> Self {
        self.api = api;
        self
    }

    /// Sets the page origin.
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }
}

impl std::fmt::Debug for HostServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostServices")
            .field("origin", &self.origin)
            .field("host_strategy", &self.host_strategy)
            .finish_non_exhaustive()
    }
}
