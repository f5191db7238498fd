use std::rc::Rc;

use platform_host::{
    HostServices, HostStrategy, LemmyApi, NoopNotificationService, NoopPrefsStore,
    NotificationService, PrefsStore,
};

use crate::{origin::page_origin, HttpLemmyApi, WebNotificationService, WebPrefsStore};

/// Returns the compile-time selected host strategy for the active build.
pub const fn selected_host_strategy() -> HostStrategy {
    #[cfg(target_arch = "wasm32")]
    {
        HostStrategy::Browser
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        HostStrategy::Headless
    }
}

/// Builds the preferences store for the selected host strategy.
pub fn prefs_store() -> Rc<dyn PrefsStore> {
    match selected_host_strategy() {
        HostStrategy::Browser => Rc::new(WebPrefsStore),
        HostStrategy::Headless => Rc::new(NoopPrefsStore),
    }
}

/// Builds the notification service for the selected host strategy.
pub fn notification_service() -> Rc<dyn NotificationService> {
    match selected_host_strategy() {
        HostStrategy::Browser => Rc::new(WebNotificationService),
        HostStrategy::Headless => Rc::new(NoopNotificationService),
    }
}

/// Builds the remote API client. HTTP works on both strategies.
pub fn lemmy_api() -> Rc<dyn LemmyApi> {
    Rc::new(HttpLemmyApi::new())
}

/// Builds the complete host bundle handed to `tesseract_runtime`.
pub fn build_host_services() -> HostServices {
    HostServices {
        prefs: prefs_store(),
        notifications: notification_service(),
        api: lemmy_api(),
        origin: page_origin().unwrap_or_default(),
        host_strategy: selected_host_strategy(),
    }
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;

    #[test]
    fn native_builds_select_headless_adapters() {
        let host = build_host_services();
        assert_eq!(host.host_strategy, HostStrategy::Headless);
        assert!(host.origin.is_empty());
        assert_eq!(host.prefs.load_pref("profileData").expect("load"), None);
    }
}
