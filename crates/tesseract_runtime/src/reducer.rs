//! Reducer actions, side-effect intents, and transition logic for the active session.
//!
//! [`reduce_session`] is the only place the active profile, its phase, and the cached site change.
//! Anything asynchronous (token resolution, site fetches) leaves as a [`SessionEffect`] carrying a
//! ticket; its result comes back as another action and is dropped when the ticket no longer
//! matches.

use leptos::logging;
use platform_host::api::types::{Community, GetSiteResponse};
use platform_host::{ApiError, Toast, ToastAction, ToastLevel};
use thiserror::Error;

use crate::model::{
    normalize_instance, ActiveSession, CommunityGroup, ProfileId, ProfileRecord, SessionPhase,
    SiteSnapshot, GUEST_PROFILE_ID,
};
use crate::profiles::{Direction, ProfileStore};
use crate::resolver::{ResolveError, ResolvedSession};

/// How long the expired-login toast stays up.
pub const LOGIN_EXPIRED_TOAST_MS: u32 = 30_000;
/// Message shown when an account cannot be resolved.
pub const USER_FETCH_FAILED: &str = "Failed to fetch your user. Is your instance down?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// Identifies the session a token resolution was issued for.
pub struct SessionTicket {
    pub profile_id: ProfileId,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Identifies the site fetch currently expected.
pub struct SiteTicket {
    pub instance: String,
    pub generation: u64,
}

#[derive(Debug, Clone, PartialEq, Default)]
/// Edits applied to the active profile and saved back to the collection. `None` leaves a field
/// untouched.
pub struct ProfilePatch {
    pub favorites: Option<Vec<Community>>,
    pub groups: Option<Vec<CommunityGroup>>,
    pub color: Option<String>,
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
/// Actions accepted by [`reduce_session`].
pub enum SessionAction {
    /// Make a saved profile active (or the guest, for [`GUEST_PROFILE_ID`]).
    SelectProfile { id: ProfileId },
    /// Drop back to anonymous browsing.
    ResetToGuest,
    /// Delete a saved profile.
    DeleteProfile { id: ProfileId },
    /// Move a saved profile one slot.
    MoveProfile { id: ProfileId, direction: Direction },
    /// A login resolved; store (or refresh) the account and make it active.
    AccountAdded {
        jwt: String,
        instance: String,
        resolved: ResolvedSession,
        /// Id used if no saved record matches the resolved identity.
        new_id: ProfileId,
    },
    /// The guest instance was verified and should become the guest default.
    GuestInstanceSet { instance: String, site: SiteSnapshot },
    /// Save edits to the active profile.
    UpdateActiveProfile(ProfilePatch),
    /// Completion of a [`SessionEffect::ResolveSession`].
    SessionResolved {
        ticket: SessionTicket,
        result: Result<ResolvedSession, ResolveError>,
    },
    /// Completion of a [`SessionEffect::FetchSite`].
    SiteFetched {
        ticket: SiteTicket,
        result: Result<GetSiteResponse, ApiError>,
    },
    /// Site metadata fetched by a page loader.
    SiteLoaded(SiteSnapshot),
}

#[derive(Debug, Clone, PartialEq, Eq)]
/// Notifications delivered to session observers after a committed transition.
pub enum SessionEvent {
    /// The saved profile list, order, or guest default changed.
    ProfilesChanged,
    /// A different profile (or the guest, `-1`) became active, or the active one was edited.
    ProfileChanged { id: ProfileId },
    /// The active profile is authenticated.
    SessionResolved { id: ProfileId },
    /// The instance rejected the active profile's token.
    SessionExpired { id: ProfileId },
    /// The cached site snapshot was replaced.
    SiteChanged { instance: String },
}

#[derive(Debug, Clone, PartialEq)]
/// Side-effect intents emitted by [`reduce_session`] for the controller to execute in order.
pub enum SessionEffect {
    /// Resolve `jwt` against `instance` and report back with `ticket`.
    ResolveSession {
        ticket: SessionTicket,
        instance: String,
        jwt: String,
    },
    /// Fetch the public site for `ticket.instance`.
    FetchSite { ticket: SiteTicket },
    /// Show a toast.
    Notify(Toast),
    /// Deliver an event to observers.
    Emit(SessionEvent),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Errors surfaced by session operations.
pub enum SessionError {
    /// The instance name is empty.
    #[error("instance name is empty")]
    InvalidInstance,
    /// The guest instance did not answer.
    #[error("unable to contact guest instance {instance}: {message}")]
    GuestInstanceUnreachable { instance: String, message: String },
    /// A login could not be resolved.
    #[error("login failed: {0}")]
    LoginFailed(ResolveError),
    /// The generated profile id is reserved or already taken.
    #[error("profile id {0} is not available")]
    ProfileIdUnavailable(ProfileId),
    /// The action needs a saved profile but the guest is active.
    #[error("no saved profile is active")]
    NoActiveProfile,
}

/// State owned by the session controller.
#[derive(Debug)]
pub struct SessionState {
    pub profiles: ProfileStore,
    pub session: ActiveSession,
    pub site: Option<SiteSnapshot>,
    /// Instance guests browse when no guest default is saved.
    pub fallback_instance: String,
    generation: u64,
    site_generation: u64,
}

impl SessionState {
    /// Starts as the guest; dispatch a [`SessionAction::SelectProfile`] for the stored active id to
    /// restore the saved session.
    pub fn new(profiles: ProfileStore, fallback_instance: impl Into<String>) -> Self {
        let fallback_instance = normalize_instance(&fallback_instance.into());
        let guest_instance = profiles
            .default_instance()
            .map(normalize_instance)
            .unwrap_or_else(|| fallback_instance.clone());
        Self {
            profiles,
            session: ActiveSession::guest(guest_instance),
            site: None,
            fallback_instance,
            generation: 0,
            site_generation: 0,
        }
    }

    /// Instance the guest profile browses.
    pub fn guest_instance(&self) -> String {
        self.profiles
            .default_instance()
            .map(normalize_instance)
            .unwrap_or_else(|| self.fallback_instance.clone())
    }

    /// Ticket any in-flight resolution must present to be applied.
    pub fn current_ticket(&self) -> SessionTicket {
        SessionTicket {
            profile_id: self.session.id(),
            generation: self.generation,
        }
    }
}

/// Applies a [`SessionAction`] to the session state and collects resulting side effects.
///
/// Profile-store mutations are written to storage before this returns.
///
/// # Errors
///
/// Returns [`SessionError::ProfileIdUnavailable`] for an [`SessionAction::AccountAdded`] whose id
/// is taken, [`SessionError::NoActiveProfile`] for edits while the guest is active, and
/// [`SessionError::InvalidInstance`] for an empty guest instance.
pub fn reduce_session(
    state: &mut SessionState,
    action: SessionAction,
) -> Result<Vec<SessionEffect>, SessionError> {
    let mut effects = Vec::new();
    match action {
        SessionAction::SelectProfile { id } => select_profile(state, id, &mut effects),
        SessionAction::ResetToGuest => become_guest(state, &mut effects),
        SessionAction::DeleteProfile { id } => {
            if state.profiles.remove(id).is_none() {
                return Ok(effects);
            }
            effects.push(SessionEffect::Emit(SessionEvent::ProfilesChanged));
            if state.session.id() == id {
                become_guest(state, &mut effects);
            }
        }
        SessionAction::MoveProfile { id, direction } => {
            if state.profiles.reorder(id, direction) {
                effects.push(SessionEffect::Emit(SessionEvent::ProfilesChanged));
            }
        }
        SessionAction::AccountAdded {
            jwt,
            instance,
            resolved,
            new_id,
        } => add_account(state, jwt, instance, resolved, new_id, &mut effects)?,
        SessionAction::GuestInstanceSet { instance, site } => {
            let instance = normalize_instance(&instance);
            if instance.is_empty() {
                return Err(SessionError::InvalidInstance);
            }
            state.profiles.set_default_instance(Some(instance.clone()));
            state.profiles.set_active(GUEST_PROFILE_ID);
            state.generation += 1;
            state.session = ActiveSession::guest(instance);
            effects.push(SessionEffect::Emit(SessionEvent::ProfilesChanged));
            effects.push(SessionEffect::Emit(SessionEvent::ProfileChanged {
                id: GUEST_PROFILE_ID,
            }));
            replace_site(state, site, &mut effects);
        }
        SessionAction::UpdateActiveProfile(patch) => {
            if state.session.profile.is_guest() {
                return Err(SessionError::NoActiveProfile);
            }
            let profile = &mut state.session.profile;
            if let Some(favorites) = patch.favorites {
                profile.favorites = Some(favorites);
            }
            if let Some(groups) = patch.groups {
                profile.groups = Some(groups);
            }
            if let Some(color) = patch.color {
                profile.color = Some(color);
            }
            if let Some(avatar) = patch.avatar {
                profile.avatar = Some(avatar);
            }
            if !state.profiles.replace(state.session.profile.clone()) {
                return Err(SessionError::NoActiveProfile);
            }
            effects.push(SessionEffect::Emit(SessionEvent::ProfilesChanged));
            effects.push(SessionEffect::Emit(SessionEvent::ProfileChanged {
                id: state.session.id(),
            }));
        }
        SessionAction::SessionResolved { ticket, result } => {
            if ticket != state.current_ticket() {
                logging::warn!(
                    "discarding stale session resolution for profile {} (generation {})",
                    ticket.profile_id,
                    ticket.generation
                );
                return Ok(effects);
            }
            apply_resolution(state, result, &mut effects);
        }
        SessionAction::SiteFetched { ticket, result } => {
            if ticket.generation != state.site_generation {
                logging::warn!("discarding stale site fetch for {}", ticket.instance);
                return Ok(effects);
            }
            match result {
                Ok(response) => {
                    let (site, _) = SiteSnapshot::from_response(&ticket.instance, response);
                    replace_site(state, site, &mut effects);
                }
                Err(err) => {
                    logging::warn!("site fetch for {} failed: {err}", ticket.instance);
                }
            }
        }
        SessionAction::SiteLoaded(site) => {
            if site.instance != state.session.instance() {
                logging::warn!(
                    "ignoring site for {} while browsing {}",
                    site.instance,
                    state.session.instance()
                );
                return Ok(effects);
            }
            replace_site(state, site, &mut effects);
        }
    }
    Ok(effects)
}

fn select_profile(state: &mut SessionState, id: ProfileId, effects: &mut Vec<SessionEffect>) {
    if id == GUEST_PROFILE_ID {
        become_guest(state, effects);
        return;
    }

    let Some(record) = state.profiles.get(id).cloned() else {
        become_guest(state, effects);
        return;
    };
    let Some(jwt) = record.jwt.clone() else {
        become_guest(state, effects);
        return;
    };

    if state.session.id() == id && state.session.is_authenticated() {
        return;
    }

    state.profiles.set_active(id);
    state.generation += 1;
    let mut profile = record.without_user();
    profile.instance = normalize_instance(&profile.instance);
    let instance = profile.instance.clone();
    state.session = ActiveSession {
        profile,
        phase: SessionPhase::Pending,
    };

    effects.push(SessionEffect::Emit(SessionEvent::ProfileChanged { id }));
    effects.push(SessionEffect::ResolveSession {
        ticket: state.current_ticket(),
        instance,
        jwt,
    });
}

fn become_guest(state: &mut SessionState, effects: &mut Vec<SessionEffect>) {
    state.profiles.set_active(GUEST_PROFILE_ID);
    state.generation += 1;
    let instance = state.guest_instance();
    state.session = ActiveSession::guest(instance.clone());
    effects.push(SessionEffect::Emit(SessionEvent::ProfileChanged {
        id: GUEST_PROFILE_ID,
    }));
    request_site(state, instance, effects);
}

fn add_account(
    state: &mut SessionState,
    jwt: String,
    instance: String,
    resolved: ResolvedSession,
    new_id: ProfileId,
    effects: &mut Vec<SessionEffect>,
) -> Result<(), SessionError> {
    let instance = normalize_instance(&instance);
    if instance.is_empty() {
        return Err(SessionError::InvalidInstance);
    }
    let username = resolved.user.username().to_string();
    let avatar = resolved.user.avatar().map(str::to_string);

    let record = match state.profiles.find_by_identity(&username, &instance).cloned() {
        Some(mut existing) => {
            existing.jwt = Some(jwt);
            existing.username = Some(username);
            existing.avatar = avatar;
            existing.instance = instance;
            state.profiles.replace(existing.clone());
            existing
        }
        None => {
            if new_id < 0 || state.profiles.contains(new_id) {
                return Err(SessionError::ProfileIdUnavailable(new_id));
            }
            let mut record = ProfileRecord::new(new_id, instance);
            record.jwt = Some(jwt);
            record.username = Some(username);
            record.avatar = avatar;
            record.favorites = Some(Vec::new());
            record.groups = Some(Vec::new());
            state.profiles.add(record.clone());
            record
        }
    };

    let id = record.id;
    state.profiles.set_active(id);
    state.generation += 1;
    let mut profile = record;
    profile.user = Some(resolved.user);
    state.session = ActiveSession {
        profile,
        phase: SessionPhase::Authenticated,
    };

    effects.push(SessionEffect::Emit(SessionEvent::ProfilesChanged));
    effects.push(SessionEffect::Emit(SessionEvent::ProfileChanged { id }));
    effects.push(SessionEffect::Emit(SessionEvent::SessionResolved { id }));
    replace_site(state, resolved.site, effects);
    Ok(())
}

fn apply_resolution(
    state: &mut SessionState,
    result: Result<ResolvedSession, ResolveError>,
    effects: &mut Vec<SessionEffect>,
) {
    let id = state.session.id();
    match result {
        Ok(resolved) => {
            let username = resolved.user.username().to_string();
            let renamed = state.session.profile.username.as_deref() != Some(username.as_str());
            state.session.profile.username = Some(username);
            state.session.profile.user = Some(resolved.user);
            if renamed && state.profiles.replace(state.session.profile.clone()) {
                effects.push(SessionEffect::Emit(SessionEvent::ProfilesChanged));
            }
            state.session.phase = SessionPhase::Authenticated;
            effects.push(SessionEffect::Emit(SessionEvent::SessionResolved { id }));
            replace_site(state, resolved.site, effects);
        }
        Err(ResolveError::InvalidToken) => {
            state.session.profile.user = None;
            state.session.phase = SessionPhase::Expired;
            let instance = state.session.instance().to_string();
            effects.push(SessionEffect::Notify(
                Toast::new(
                    ToastLevel::Warning,
                    "Login Expired",
                    "Your login session is expired. Please log in again",
                )
                .with_duration_ms(LOGIN_EXPIRED_TOAST_MS)
                .with_action(ToastAction::Navigate(format!("/login/{instance}"))),
            ));
            effects.push(SessionEffect::Emit(SessionEvent::SessionExpired { id }));
            refresh_stale_site(state, effects);
        }
        Err(ResolveError::Unreachable(message)) => {
            logging::warn!("profile {id} stays pending: {message}");
            effects.push(SessionEffect::Notify(Toast::new(
                ToastLevel::Error,
                "Auth Error",
                USER_FETCH_FAILED,
            )));
            refresh_stale_site(state, effects);
        }
    }
}

/// Requests the current instance's site unless the cached snapshot already describes it.
fn refresh_stale_site(state: &mut SessionState, effects: &mut Vec<SessionEffect>) {
    let instance = state.session.instance().to_string();
    let site_is_current = state
        .site
        .as_ref()
        .is_some_and(|site| site.instance == instance);
    if !site_is_current {
        request_site(state, instance, effects);
    }
}

fn request_site(state: &mut SessionState, instance: String, effects: &mut Vec<SessionEffect>) {
    state.site_generation += 1;
    effects.push(SessionEffect::FetchSite {
        ticket: SiteTicket {
            instance,
            generation: state.site_generation,
        },
    });
}

fn replace_site(state: &mut SessionState, site: SiteSnapshot, effects: &mut Vec<SessionEffect>) {
    // Supersedes any site fetch still in flight.
    state.site_generation += 1;
    let instance = site.instance.clone();
    state.site = Some(site);
    effects.push(SessionEffect::Emit(SessionEvent::SiteChanged { instance }));
}
