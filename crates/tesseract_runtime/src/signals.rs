//! Leptos bridge: mirrors [`SessionController`] state into signals and provides it as context.

use leptos::*;
use platform_host::HostServices;

use crate::config::InstanceConfig;
use crate::controller::SessionController;
use crate::model::{ActiveSession, ProfileId, ProfileRecord, SiteSnapshot};
use crate::profiles::Direction;
use crate::reducer::SessionEvent;
use crate::settings::UserSettings;

#[derive(Clone, Copy)]
/// Reactive view of the session for components.
pub struct SessionContext {
    pub controller: StoredValue<SessionController>,
    pub session: RwSignal<ActiveSession>,
    pub profiles: RwSignal<Vec<ProfileRecord>>,
    pub site: RwSignal<Option<SiteSnapshot>>,
    pub settings: RwSignal<UserSettings>,
}

impl SessionContext {
    /// Creates the signals and keeps them in sync through a controller subscription.
    pub fn new(controller: SessionController) -> Self {
        let context = Self {
            session: create_rw_signal(controller.session()),
            profiles: create_rw_signal(controller.profiles()),
            site: create_rw_signal(controller.site()),
            settings: create_rw_signal(controller.settings()),
            controller: store_value(controller.clone()),
        };
        controller.subscribe(move |event| context.apply(event));
        context
    }

    fn apply(&self, event: &SessionEvent) {
        let Some(controller) = self.controller.try_get_value() else {
            return;
        };
        match event {
            SessionEvent::ProfilesChanged => self.profiles.set(controller.profiles()),
            SessionEvent::ProfileChanged { .. }
            | SessionEvent::SessionResolved { .. }
            | SessionEvent::SessionExpired { .. } => self.session.set(controller.session()),
            SessionEvent::SiteChanged { .. } => self.site.set(controller.site()),
        }
    }

    /// Edits and persists user settings, then refreshes the settings signal.
    pub fn update_settings(&self, edit: impl FnOnce(&mut UserSettings)) {
        self.controller.with_value(|controller| {
            controller.update_settings(edit);
            self.settings.set(controller.settings());
        });
    }

    pub fn select_profile(&self, id: ProfileId) {
        let controller = self.controller.get_value();
        spawn_local(async move { controller.select_profile(id).await });
    }

    pub fn reset_to_guest(&self) {
        let controller = self.controller.get_value();
        spawn_local(async move { controller.reset_to_guest().await });
    }

    pub fn delete_profile(&self, id: ProfileId) {
        let controller = self.controller.get_value();
        spawn_local(async move { controller.delete_profile(id).await });
    }

    pub fn move_profile(&self, id: ProfileId, direction: Direction) {
        let controller = self.controller.get_value();
        spawn_local(async move { controller.move_profile(id, direction).await });
    }

    /// Rewrites an image URL through the media proxy for the current session.
    pub fn proxy_image(&self, url: &str, size: Option<u32>, format: Option<&str>) -> String {
        self.controller
            .with_value(|controller| controller.proxy_image(url, size, format))
    }
}

/// Creates a [`SessionContext`] for `controller` and provides it to descendants.
pub fn provide_session_context(controller: SessionController) -> SessionContext {
    let context = SessionContext::new(controller);
    provide_context(context);
    context
}

/// Returns the nearest provided [`SessionContext`], if any.
pub fn use_session_context() -> Option<SessionContext> {
    use_context::<SessionContext>()
}

#[component]
/// Builds the session controller from the host bundle, provides [`SessionContext`], and restores
/// the saved session.
pub fn SessionProvider(
    /// Host bundle; defaults to the browser adapters.
    #[prop(optional)]
    host_services: Option<HostServices>,
    children: Children,
) -> impl IntoView {
    let host_services = host_services.unwrap_or_else(platform_host_web::build_host_services);
    let controller = SessionController::new(host_services, InstanceConfig::builtin());
    provide_session_context(controller.clone());
    spawn_local(async move { controller.boot().await });
    children()
}
