//! Session controller: owns [`SessionState`], runs reducer effects, and notifies observers.
//!
//! Shared state sits behind `RefCell`s that are only borrowed between awaits, so interleaved
//! operations on the single-threaded executor never observe a half-applied transition.

use std::{
    cell::{Cell, RefCell},
    collections::VecDeque,
    rc::Rc,
};

use leptos::logging;
use platform_host::{ApiTarget, HostServices, LemmyApi, Toast, ToastLevel};
use rand::Rng;

use crate::config::InstanceConfig;
use crate::image_proxy::{image_proxy_url, image_proxy_url_opt, ProxyContext};
use crate::model::{
    normalize_instance, ActiveSession, PersonData, ProfileId, ProfileRecord, SessionPhase,
    SiteSnapshot,
};
use crate::profiles::{Direction, ProfileStore};
use crate::reducer::{
    reduce_session, ProfilePatch, SessionAction, SessionEffect, SessionError, SessionEvent,
    SessionState, USER_FETCH_FAILED,
};
use crate::resolver;
use crate::settings::{load_user_settings, save_user_settings, UserSettings};

/// Upper bound (exclusive) for generated profile ids.
pub const PROFILE_ID_SPACE: ProfileId = 100_000;

/// Handle returned by [`SessionController::subscribe`].
pub type SubscriptionId = u64;

type Observer = Rc<dyn Fn(&SessionEvent)>;
type IdSource = Box<dyn FnMut() -> ProfileId>;

struct ControllerInner {
    host: HostServices,
    config: InstanceConfig,
    settings: RefCell<UserSettings>,
    state: RefCell<SessionState>,
    observers: RefCell<Vec<(SubscriptionId, Observer)>>,
    next_subscription: Cell<SubscriptionId>,
    id_source: RefCell<IdSource>,
}

#[derive(Clone)]
/// Single owner of the active session. Clones share the same state.
pub struct SessionController {
    inner: Rc<ControllerInner>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("state", &self.inner.state)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Hydrates saved profiles and settings from `host.prefs`. The session starts as the guest;
    /// call [`SessionController::boot`] to restore the saved active profile.
    pub fn new(host: HostServices, config: InstanceConfig) -> Self {
        let profiles = ProfileStore::load(Rc::clone(&host.prefs));
        let settings = load_user_settings(host.prefs.as_ref());
        let state = SessionState::new(profiles, config.default_instance.clone());
        Self {
            inner: Rc::new(ControllerInner {
                host,
                config,
                settings: RefCell::new(settings),
                state: RefCell::new(state),
                observers: RefCell::new(Vec::new()),
                next_subscription: Cell::new(1),
                id_source: RefCell::new(Box::new(|| {
                    rand::thread_rng().gen_range(0..PROFILE_ID_SPACE)
                })),
            }),
        }
    }

    /// Replaces the generator used for new profile ids.
    pub fn with_id_source(self, source: impl FnMut() -> ProfileId + 'static) -> Self {
        *self.inner.id_source.borrow_mut() = Box::new(source);
        self
    }

    pub fn host(&self) -> &HostServices {
        &self.inner.host
    }

    pub fn config(&self) -> &InstanceConfig {
        &self.inner.config
    }

    pub fn api(&self) -> Rc<dyn LemmyApi> {
        Rc::clone(&self.inner.host.api)
    }

    pub fn session(&self) -> ActiveSession {
        self.inner.state.borrow().session.clone()
    }

    pub fn phase(&self) -> SessionPhase {
        self.inner.state.borrow().session.phase
    }

    pub fn active_id(&self) -> ProfileId {
        self.inner.state.borrow().session.id()
    }

    /// Saved profiles in display order.
    pub fn profiles(&self) -> Vec<ProfileRecord> {
        self.inner.state.borrow().profiles.profiles().to_vec()
    }

    pub fn site(&self) -> Option<SiteSnapshot> {
        self.inner.state.borrow().site.clone()
    }

    /// Instance the active session browses.
    pub fn current_instance(&self) -> String {
        self.inner.state.borrow().session.instance().to_string()
    }

    pub fn guest_instance(&self) -> String {
        self.inner.state.borrow().guest_instance()
    }

    pub fn settings(&self) -> UserSettings {
        self.inner.settings.borrow().clone()
    }

    /// Edits and persists the user settings.
    pub fn update_settings(&self, edit: impl FnOnce(&mut UserSettings)) {
        let settings = {
            let mut settings = self.inner.settings.borrow_mut();
            edit(&mut settings);
            settings.clone()
        };
        if let Err(err) = save_user_settings(self.inner.host.prefs.as_ref(), &settings) {
            logging::warn!("user settings save failed: {err}");
        }
    }

    /// Registers an observer called synchronously, in subscription order, after every committed
    /// transition.
    pub fn subscribe(&self, observer: impl Fn(&SessionEvent) + 'static) -> SubscriptionId {
        let id = self.inner.next_subscription.get();
        self.inner.next_subscription.set(id + 1);
        self.inner
            .observers
            .borrow_mut()
            .push((id, Rc::new(observer)));
        id
    }

    /// Removes an observer. Returns `false` for unknown ids.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.inner.observers.borrow_mut();
        let before = observers.len();
        observers.retain(|(existing, _)| *existing != id);
        observers.len() != before
    }

    /// Restores the saved active profile (or the guest) and resolves it.
    pub async fn boot(&self) {
        let id = self.inner.state.borrow().profiles.active_id();
        self.trace(|| format!("booting with profile {id}"));
        self.dispatch_logged(SessionAction::SelectProfile { id }).await;
    }

    /// Makes `id` active. Selecting the already authenticated profile makes no remote call.
    pub async fn select_profile(&self, id: ProfileId) {
        self.dispatch_logged(SessionAction::SelectProfile { id }).await;
    }

    pub async fn reset_to_guest(&self) {
        self.dispatch_logged(SessionAction::ResetToGuest).await;
    }

    pub async fn delete_profile(&self, id: ProfileId) {
        self.dispatch_logged(SessionAction::DeleteProfile { id }).await;
    }

    pub async fn move_profile(&self, id: ProfileId, direction: Direction) {
        self.dispatch_logged(SessionAction::MoveProfile { id, direction })
            .await;
    }

    /// Saves edits to the active profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::NoActiveProfile`] while the guest is active.
    pub async fn update_active_profile(&self, patch: ProfilePatch) -> Result<(), SessionError> {
        self.dispatch(SessionAction::UpdateActiveProfile(patch))
            .await
    }

    /// Replaces the cached site with one fetched by a page loader for the current instance.
    pub async fn apply_site(&self, site: SiteSnapshot) {
        self.dispatch_logged(SessionAction::SiteLoaded(site)).await;
    }

    /// Logs in: resolves `jwt` on `instance`, then updates the matching saved account or appends a
    /// new one, and makes it active.
    ///
    /// Returns the id of the now active profile.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::LoginFailed`] (after showing an error toast) when the token cannot
    /// be resolved, and [`SessionError::InvalidInstance`] for an empty instance.
    pub async fn add_account(&self, jwt: &str, instance: &str) -> Result<ProfileId, SessionError> {
        let instance = normalize_instance(instance);
        if instance.is_empty() {
            return Err(SessionError::InvalidInstance);
        }

        self.trace(|| format!("resolving new login on {instance}"));
        let api = self.api();
        let resolved = match resolver::resolve(api.as_ref(), &instance, jwt).await {
            Ok(resolved) => resolved,
            Err(err) => {
                self.notify(&Toast::new(ToastLevel::Error, "Auth Error", USER_FETCH_FAILED));
                return Err(SessionError::LoginFailed(err));
            }
        };

        let new_id = self.next_profile_id();
        self.dispatch(SessionAction::AccountAdded {
            jwt: jwt.to_string(),
            instance,
            resolved,
            new_id,
        })
        .await?;
        Ok(self.active_id())
    }

    /// Verifies `instance` answers, then makes it the guest default and switches to the guest.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::GuestInstanceUnreachable`] when the site cannot be fetched; the
    /// session is left untouched.
    pub async fn set_guest_instance(&self, instance: &str) -> Result<(), SessionError> {
        let instance = normalize_instance(instance);
        if instance.is_empty() {
            return Err(SessionError::InvalidInstance);
        }

        let api = self.api();
        let target = ApiTarget::guest(instance.clone());
        let response = api.get_site(&target).await.map_err(|err| {
            logging::warn!("guest instance {instance} unreachable: {err}");
            SessionError::GuestInstanceUnreachable {
                instance: instance.clone(),
                message: err.to_string(),
            }
        })?;
        let (site, _) = SiteSnapshot::from_response(&instance, response);
        self.dispatch(SessionAction::GuestInstanceSet { instance, site })
            .await
    }

    /// Rewrites an image URL through the media proxy according to deployment and user settings.
    pub fn proxy_image(&self, url: &str, size: Option<u32>, format: Option<&str>) -> String {
        let settings = self.settings();
        let instance = self.current_instance();
        image_proxy_url(url, size, format, &self.proxy_context(&instance, &settings))
    }

    /// Proxied avatar of the active profile: the resolved user's avatar, else the saved one.
    pub fn active_avatar(&self, size: Option<u32>) -> Option<String> {
        let session = self.session();
        let avatar = session
            .profile
            .user
            .as_ref()
            .and_then(PersonData::avatar)
            .or(session.profile.avatar.as_deref());
        let settings = self.settings();
        let instance = self.current_instance();
        image_proxy_url_opt(avatar, size, None, &self.proxy_context(&instance, &settings))
    }

    fn proxy_context<'a>(
        &'a self,
        instance: &'a str,
        settings: &'a UserSettings,
    ) -> ProxyContext<'a> {
        ProxyContext {
            origin: &self.inner.host.origin,
            current_instance: instance,
            config: &self.inner.config,
            settings: &settings.proxy_media,
        }
    }

    /// Applies `action` and runs every resulting effect in order, feeding async completions back
    /// through the reducer until the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns the first [`SessionError`] raised by the reducer.
    pub async fn dispatch(&self, action: SessionAction) -> Result<(), SessionError> {
        let mut queue: VecDeque<SessionEffect> = self.reduce(action)?.into();
        while let Some(effect) = queue.pop_front() {
            match effect {
                SessionEffect::Emit(event) => self.emit(&event),
                SessionEffect::Notify(toast) => self.notify(&toast),
                SessionEffect::ResolveSession {
                    ticket,
                    instance,
                    jwt,
                } => {
                    self.trace(|| format!("resolving profile {} on {instance}", ticket.profile_id));
                    let api = self.api();
                    let result = resolver::resolve(api.as_ref(), &instance, &jwt).await;
                    queue.extend(self.reduce(SessionAction::SessionResolved { ticket, result })?);
                }
                SessionEffect::FetchSite { ticket } => {
                    self.trace(|| format!("fetching site for {}", ticket.instance));
                    let api = self.api();
                    let target = ApiTarget::guest(ticket.instance.clone());
                    let result = api.get_site(&target).await;
                    queue.extend(self.reduce(SessionAction::SiteFetched { ticket, result })?);
                }
            }
        }
        Ok(())
    }

    async fn dispatch_logged(&self, action: SessionAction) {
        if let Err(err) = self.dispatch(action).await {
            logging::warn!("session action failed: {err}");
        }
    }

    fn reduce(&self, action: SessionAction) -> Result<Vec<SessionEffect>, SessionError> {
        let mut state = self.inner.state.borrow_mut();
        reduce_session(&mut state, action)
    }

    fn emit(&self, event: &SessionEvent) {
        let observers: Vec<Observer> = self
            .inner
            .observers
            .borrow()
            .iter()
            .map(|(_, observer)| Rc::clone(observer))
            .collect();
        for observer in observers {
            observer(event);
        }
    }

    fn notify(&self, toast: &Toast) {
        if let Err(err) = self.inner.host.notifications.notify(toast) {
            logging::warn!("toast delivery failed: {err}");
        }
    }

    fn next_profile_id(&self) -> ProfileId {
        let state = self.inner.state.borrow();
        let mut source = self.inner.id_source.borrow_mut();
        loop {
            let id = (*source)();
            if id >= 0 && !state.profiles.contains(id) {
                return id;
            }
        }
    }

    fn trace(&self, message: impl FnOnce() -> String) {
        if self.inner.settings.borrow().debug_info {
            logging::log!("session: {}", message());
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use futures::channel::oneshot;
    use futures::executor::{block_on, LocalPool};
    use futures::task::LocalSpawnExt;
    use platform_host::api::types::{
        GetCommunity, GetCommunityResponse, GetPersonDetails, GetPersonDetailsResponse, GetPosts,
        GetPostsResponse, GetSiteResponse, LocalUserView, MyUserInfo, Person, ResolveObject,
        ResolveObjectResponse, Search, SearchResponse,
    };
    use platform_host::{
        ApiCall, ApiError, LemmyApiFuture, MemoryLemmyApi, MemoryNotificationService,
        MemoryPrefsStore, PrefsStore,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{ProfileCollection, GUEST_PROFILE_ID, PROFILE_DATA_KEY};

    fn user(name: &str) -> MyUserInfo {
        MyUserInfo {
            local_user_view: LocalUserView {
                person: Person {
                    name: name.to_string(),
                    ..Person::default()
                },
                ..LocalUserView::default()
            },
            ..MyUserInfo::default()
        }
    }

    fn site(name: &str) -> GetSiteResponse {
        let mut site = GetSiteResponse::default();
        site.site_view.site.name = name.to_string();
        site
    }

    fn memory_api() -> MemoryLemmyApi {
        MemoryLemmyApi::default()
            .with_site("lemmy.world", site("World"))
            .with_site("lemmy.ml", site("Lemmy"))
            .with_site("beehaw.org", site("Beehaw"))
            .with_user("lemmy.ml", "jwt-alice", user("alice"))
            .with_user("beehaw.org", "jwt-bob", user("bob"))
    }

    fn saved(id: ProfileId, username: &str, instance: &str, jwt: &str) -> ProfileRecord {
        let mut record = ProfileRecord::new(id, instance);
        record.username = Some(username.to_string());
        record.jwt = Some(jwt.to_string());
        record
    }

    fn seed(prefs: &MemoryPrefsStore, profiles: Vec<ProfileRecord>, active_id: ProfileId) {
        let collection = ProfileCollection {
            profiles,
            active_id,
            default_instance: None,
        };
        prefs
            .save_pref(
                PROFILE_DATA_KEY,
                &serde_json::to_string(&collection).expect("encode"),
            )
            .expect("seed");
    }

    struct Harness {
        controller: SessionController,
        prefs: MemoryPrefsStore,
        toasts: MemoryNotificationService,
    }

    fn harness(api: Rc<dyn LemmyApi>, prefs: MemoryPrefsStore) -> Harness {
        let toasts = MemoryNotificationService::default();
        let host = HostServices::headless()
            .with_prefs(Rc::new(prefs.clone()))
            .with_notifications(Rc::new(toasts.clone()))
            .with_api(api)
            .with_origin("https://tesseract.example");
        let config = InstanceConfig {
            default_instance: "lemmy.world".to_string(),
            ..InstanceConfig::default()
        };
        Harness {
            controller: SessionController::new(host, config),
            prefs,
            toasts,
        }
    }

    fn stored(prefs: &MemoryPrefsStore) -> ProfileCollection {
        serde_json::from_str(&prefs.raw(PROFILE_DATA_KEY).expect("stored")).expect("decode")
    }

    #[test]
    fn boot_restores_and_resolves_the_saved_profile() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(5, "alice", "lemmy.ml", "jwt-alice")], 5);
        let h = harness(Rc::new(api.clone()), prefs);

        block_on(h.controller.boot());

        let session = h.controller.session();
        assert_eq!(session.phase, SessionPhase::Authenticated);
        assert_eq!(session.username(), Some("alice"));
        assert_eq!(
            h.controller.site().map(|s| s.site.site_view.site.name),
            Some("Lemmy".to_string())
        );
        assert_eq!(
            api.calls(),
            vec![ApiCall::GetSite(ApiTarget::authenticated("lemmy.ml", "jwt-alice"))]
        );
    }

    #[test]
    fn boot_heals_a_dangling_active_id_to_guest() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(5, "alice", "lemmy.ml", "jwt-alice")], 77);
        let h = harness(Rc::new(api.clone()), prefs);

        block_on(h.controller.boot());

        assert_eq!(h.controller.active_id(), GUEST_PROFILE_ID);
        assert_eq!(h.controller.phase(), SessionPhase::Guest);
        assert_eq!(stored(&h.prefs).active_id, GUEST_PROFILE_ID);
        assert_eq!(
            h.controller.site().map(|s| s.instance),
            Some("lemmy.world".to_string())
        );
    }

    #[test]
    fn selecting_the_authenticated_profile_twice_makes_no_extra_calls() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(5, "alice", "lemmy.ml", "jwt-alice")], GUEST_PROFILE_ID);
        let h = harness(Rc::new(api.clone()), prefs);

        block_on(h.controller.select_profile(5));
        let calls = api.call_count();
        block_on(h.controller.select_profile(5));

        assert_eq!(api.call_count(), calls);
        assert_eq!(h.controller.phase(), SessionPhase::Authenticated);
    }

    #[test]
    fn deleting_active_profile_42_resets_to_guest_and_refetches_site() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(42, "alice", "lemmy.ml", "jwt-alice")], 42);
        let h = harness(Rc::new(api.clone()), prefs);
        block_on(h.controller.boot());

        block_on(h.controller.delete_profile(42));

        assert_eq!(h.controller.phase(), SessionPhase::Guest);
        assert_eq!(h.controller.active_id(), GUEST_PROFILE_ID);
        assert_eq!(stored(&h.prefs).active_id, GUEST_PROFILE_ID);
        assert!(h.controller.profiles().is_empty());
        assert_eq!(
            api.calls().last(),
            Some(&ApiCall::GetSite(ApiTarget::guest("lemmy.world")))
        );
        assert_eq!(
            h.controller.site().map(|s| s.site.site_view.site.name),
            Some("World".to_string())
        );
    }

    #[test]
    fn expired_token_shows_relogin_toast() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(5, "alice", "lemmy.ml", "revoked")], GUEST_PROFILE_ID);
        let h = harness(Rc::new(api), prefs);

        block_on(h.controller.select_profile(5));

        assert_eq!(h.controller.phase(), SessionPhase::Expired);
        let toasts = h.toasts.sent();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].title, "Login Expired");
        assert_eq!(
            h.controller.site().map(|s| s.instance),
            Some("lemmy.ml".to_string())
        );
    }

    #[test]
    fn login_appends_profile_with_rerolled_id() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(7, "alice", "lemmy.ml", "jwt-alice")], GUEST_PROFILE_ID);
        let mut ids = vec![-1, 7, 8].into_iter();
        let h = harness(Rc::new(api), prefs);
        let controller = h
            .controller
            .clone()
            .with_id_source(move || ids.next().unwrap_or(99));

        let id = block_on(controller.add_account("jwt-bob", "Beehaw.org")).expect("login");

        assert_eq!(id, 8);
        assert_eq!(controller.phase(), SessionPhase::Authenticated);
        assert_eq!(controller.current_instance(), "beehaw.org");
        let stored = stored(&h.prefs);
        assert_eq!(stored.active_id, 8);
        assert_eq!(
            stored
                .profiles
                .iter()
                .map(|profile| profile.id)
                .collect::<Vec<_>>(),
            vec![7, 8]
        );
    }

    #[test]
    fn login_refreshes_an_existing_identity() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(7, "alice", "lemmy.ml", "old")], GUEST_PROFILE_ID);
        let h = harness(Rc::new(api), prefs);

        let id = block_on(h.controller.add_account("jwt-alice", "lemmy.ml")).expect("login");

        assert_eq!(id, 7);
        assert_eq!(h.controller.profiles().len(), 1);
        assert_eq!(stored(&h.prefs).profiles[0].jwt.as_deref(), Some("jwt-alice"));
    }

    #[test]
    fn failed_login_toasts_and_returns_the_error() {
        let api = memory_api();
        let h = harness(Rc::new(api), MemoryPrefsStore::default());

        let err = block_on(h.controller.add_account("nope", "lemmy.ml")).expect_err("rejected");

        assert_eq!(
            err,
            SessionError::LoginFailed(resolver::ResolveError::InvalidToken)
        );
        let toasts = h.toasts.sent();
        assert_eq!(toasts.len(), 1);
        assert_eq!(toasts[0].level, ToastLevel::Error);
        assert_eq!(toasts[0].content, USER_FETCH_FAILED);
        assert!(h.controller.profiles().is_empty());
    }

    #[test]
    fn guest_instance_is_verified_before_it_is_saved() {
        let api = memory_api();
        api.set_unreachable("down.example", true);
        let h = harness(Rc::new(api), MemoryPrefsStore::default());

        let err = block_on(h.controller.set_guest_instance("down.example")).expect_err("down");
        assert!(matches!(err, SessionError::GuestInstanceUnreachable { .. }));
        assert_eq!(h.controller.guest_instance(), "lemmy.world");

        block_on(h.controller.set_guest_instance("  BEEHAW.org ")).expect("reachable");
        assert_eq!(h.controller.current_instance(), "beehaw.org");
        assert_eq!(stored(&h.prefs).default_instance.as_deref(), Some("beehaw.org"));
        assert_eq!(
            h.controller.site().map(|s| s.site.site_view.site.name),
            Some("Beehaw".to_string())
        );
    }

    #[test]
    fn observers_run_in_subscription_order_until_unsubscribed() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(5, "alice", "lemmy.ml", "jwt-alice")], GUEST_PROFILE_ID);
        let h = harness(Rc::new(api), prefs);

        let seen = Rc::new(RefCell::new(Vec::<(u8, SessionEvent)>::new()));
        let first = {
            let seen = Rc::clone(&seen);
            h.controller
                .subscribe(move |event| seen.borrow_mut().push((1, event.clone())))
        };
        {
            let seen = Rc::clone(&seen);
            h.controller
                .subscribe(move |event| seen.borrow_mut().push((2, event.clone())));
        }

        block_on(h.controller.select_profile(5));
        assert_eq!(
            seen.borrow().clone(),
            vec![
                (1, SessionEvent::ProfileChanged { id: 5 }),
                (2, SessionEvent::ProfileChanged { id: 5 }),
                (1, SessionEvent::SessionResolved { id: 5 }),
                (2, SessionEvent::SessionResolved { id: 5 }),
                (
                    1,
                    SessionEvent::SiteChanged {
                        instance: "lemmy.ml".to_string()
                    }
                ),
                (
                    2,
                    SessionEvent::SiteChanged {
                        instance: "lemmy.ml".to_string()
                    }
                ),
            ]
        );

        assert!(h.controller.unsubscribe(first));
        assert!(!h.controller.unsubscribe(first));
        seen.borrow_mut().clear();
        block_on(h.controller.move_profile(5, Direction::Up));
        block_on(h.controller.update_active_profile(ProfilePatch {
            color: Some("#123456".to_string()),
            ..ProfilePatch::default()
        }))
        .expect("edit");
        assert!(seen.borrow().iter().all(|(observer, _)| *observer == 2));
        assert!(seen
            .borrow()
            .contains(&(2, SessionEvent::ProfileChanged { id: 5 })));
    }

    #[test]
    fn observers_can_read_the_committed_state() {
        let api = memory_api();
        let prefs = MemoryPrefsStore::default();
        seed(&prefs, vec![saved(5, "alice", "lemmy.ml", "jwt-alice")], GUEST_PROFILE_ID);
        let h = harness(Rc::new(api), prefs);

        let phases = Rc::new(RefCell::new(Vec::new()));
        {
            let phases = Rc::clone(&phases);
            let reader = h.controller.clone();
            h.controller.subscribe(move |event| {
                if let SessionEvent::SessionResolved { .. } = event {
                    phases.borrow_mut().push(reader.phase());
                }
            });
        }

        block_on(h.controller.select_profile(5));
        assert_eq!(phases.borrow().clone(), vec![SessionPhase::Authenticated]);
    }

    /// Delegates to [`MemoryLemmyApi`] but holds `get_site` calls for gated tokens until released.
    struct GatedApi {
        inner: MemoryLemmyApi,
        gates: RefCell<HashMap<String, oneshot::Receiver<()>>>,
    }

    impl GatedApi {
        fn new(inner: MemoryLemmyApi) -> Self {
            Self {
                inner,
                gates: RefCell::new(HashMap::new()),
            }
        }

        fn gate(&self, jwt: &str) -> oneshot::Sender<()> {
            let (release, gate) = oneshot::channel();
            self.gates.borrow_mut().insert(jwt.to_string(), gate);
            release
        }
    }

    impl LemmyApi for GatedApi {
        fn get_site<'a>(
            &'a self,
            target: &'a ApiTarget,
        ) -> LemmyApiFuture<'a, Result<GetSiteResponse, ApiError>> {
            Box::pin(async move {
                let gate = target
                    .auth
                    .as_ref()
                    .and_then(|jwt| self.gates.borrow_mut().remove(jwt));
                if let Some(gate) = gate {
                    let _ = gate.await;
                }
                self.inner.get_site(target).await
            })
        }

        fn get_posts<'a>(
            &'a self,
            target: &'a ApiTarget,
            form: &'a GetPosts,
        ) -> LemmyApiFuture<'a, Result<GetPostsResponse, ApiError>> {
            self.inner.get_posts(target, form)
        }

        fn get_person_details<'a>(
            &'a self,
            target: &'a ApiTarget,
            form: &'a GetPersonDetails,
        ) -> LemmyApiFuture<'a, Result<GetPersonDetailsResponse, ApiError>> {
            self.inner.get_person_details(target, form)
        }

        fn get_community<'a>(
            &'a self,
            target: &'a ApiTarget,
            form: &'a GetCommunity,
        ) -> LemmyApiFuture<'a, Result<GetCommunityResponse, ApiError>> {
            self.inner.get_community(target, form)
        }

        fn search<'a>(
            &'a self,
            target: &'a ApiTarget,
            form: &'a Search,
        ) -> LemmyApiFuture<'a, Result<SearchResponse, ApiError>> {
            self.inner.search(target, form)
        }

        fn resolve_object<'a>(
            &'a self,
            target: &'a ApiTarget,
            form: &'a ResolveObject,
        ) -> LemmyApiFuture<'a, Result<ResolveObjectResponse, ApiError>> {
            self.inner.resolve_object(target, form)
        }
    }

    #[test]
    fn slow_resolution_of_a_previous_switch_is_discarded() {
        let api = Rc::new(GatedApi::new(memory_api()));
        let release_alice = api.gate("jwt-alice");
        let prefs = MemoryPrefsStore::default();
        seed(
            &prefs,
            vec![
                saved(1, "alice", "lemmy.ml", "jwt-alice"),
                saved(2, "bob", "beehaw.org", "jwt-bob"),
            ],
            GUEST_PROFILE_ID,
        );
        let h = harness(api, prefs);
        let mut pool = LocalPool::new();
        let spawner = pool.spawner();

        let first = h.controller.clone();
        spawner
            .spawn_local(async move { first.select_profile(1).await })
            .expect("spawn first switch");
        pool.run_until_stalled();
        assert_eq!(h.controller.active_id(), 1);
        assert_eq!(h.controller.phase(), SessionPhase::Pending);

        let second = h.controller.clone();
        spawner
            .spawn_local(async move { second.select_profile(2).await })
            .expect("spawn second switch");
        pool.run_until_stalled();
        assert_eq!(h.controller.active_id(), 2);
        assert_eq!(h.controller.phase(), SessionPhase::Authenticated);

        release_alice.send(()).expect("release");
        pool.run_until_stalled();

        let session = h.controller.session();
        assert_eq!(session.id(), 2);
        assert_eq!(session.phase, SessionPhase::Authenticated);
        assert_eq!(session.username(), Some("bob"));
        assert_eq!(
            h.controller.site().map(|s| s.instance),
            Some("beehaw.org".to_string())
        );
        assert_eq!(stored(&h.prefs).active_id, 2);
    }

    #[test]
    fn settings_updates_are_persisted() {
        let h = harness(Rc::new(memory_api()), MemoryPrefsStore::default());
        h.controller.update_settings(|settings| settings.debug_info = true);
        assert!(h.controller.settings().debug_info);
        assert!(h
            .prefs
            .raw(crate::settings::SETTINGS_KEY)
            .expect("stored")
            .contains("\"debugInfo\":true"));
    }

    #[test]
    fn proxy_image_uses_the_host_origin() {
        let h = harness(Rc::new(memory_api()), MemoryPrefsStore::default());
        assert_eq!(
            h.controller
                .proxy_image("https://files.example.com/pictrs/image/abc.png", None, None),
            "https://files.example.com/pictrs/image/abc.png"
        );
    }

    #[test]
    fn active_avatar_is_proxied_and_absent_for_guests() {
        let prefs = MemoryPrefsStore::default();
        let mut alice = saved(5, "alice", "lemmy.ml", "jwt-alice");
        alice.avatar = Some("https://cdn.example/alice.png".to_string());
        seed(&prefs, vec![alice], 5);
        let host = HostServices::headless()
            .with_prefs(Rc::new(prefs))
            .with_api(Rc::new(memory_api()))
            .with_origin("https://tesseract.example");
        let config = InstanceConfig {
            default_instance: "lemmy.world".to_string(),
            enable_media_proxy: true,
            ..InstanceConfig::default()
        };
        let controller = SessionController::new(host, config);

        block_on(controller.boot());
        assert_eq!(
            controller.active_avatar(Some(64)),
            Some("https://tesseract.example/image_proxy/cdn.example/alice.png".to_string())
        );

        block_on(controller.reset_to_guest());
        assert_eq!(controller.active_avatar(Some(64)), None);
    }
}
