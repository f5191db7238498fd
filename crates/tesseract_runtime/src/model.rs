use platform_host::api::types::{Community, GetSiteResponse, MyUserInfo, SortType};
use serde::{Deserialize, Serialize};

/// Numeric profile id. Ids are assigned locally and never sent to an instance.
pub type ProfileId = i64;

/// Reserved id of the anonymous guest profile. Never stored in the profile list.
pub const GUEST_PROFILE_ID: ProfileId = -1;

/// Preference key holding the [`ProfileCollection`].
pub const PROFILE_DATA_KEY: &str = "profileData";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// User-defined bundle of communities shown together.
pub struct CommunityGroup {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub communities: Vec<Community>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Resolved account data for the active session: the instance's view of the user plus pending
/// counters.
pub struct PersonData {
    #[serde(flatten)]
    pub info: MyUserInfo,
    #[serde(default)]
    pub unreads: i64,
    #[serde(default)]
    pub reports: i64,
    #[serde(default)]
    pub registration_applications: i64,
}

impl PersonData {
    /// Wraps a freshly fetched user with all counters at zero.
    pub fn from_user(info: MyUserInfo) -> Self {
        Self {
            info,
            unreads: 0,
            reports: 0,
            registration_applications: 0,
        }
    }

    pub fn username(&self) -> &str {
        &self.info.local_user_view.person.name
    }

    pub fn avatar(&self) -> Option<&str> {
        self.info.local_user_view.person.avatar.as_deref()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// A saved account binding.
///
/// `user` is session data and is never serialized; everything else round-trips through the
/// `profileData` document.
pub struct ProfileRecord {
    pub id: ProfileId,
    pub instance: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jwt: Option<String>,
    #[serde(skip)]
    pub user: Option<PersonData>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub favorites: Option<Vec<Community>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<CommunityGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

impl ProfileRecord {
    /// Record with only an id and instance set.
    pub fn new(id: ProfileId, instance: impl Into<String>) -> Self {
        Self {
            id,
            instance: instance.into(),
            jwt: None,
            user: None,
            avatar: None,
            username: None,
            favorites: None,
            groups: None,
            color: None,
        }
    }

    /// The anonymous profile browsing `instance`.
    pub fn guest(instance: impl Into<String>) -> Self {
        Self::new(GUEST_PROFILE_ID, instance)
    }

    pub fn is_guest(&self) -> bool {
        self.id == GUEST_PROFILE_ID
    }

    /// Returns `true` when this record is the account `username` on `instance`.
    pub fn matches_identity(&self, username: &str, instance: &str) -> bool {
        self.username.as_deref() == Some(username) && self.instance.eq_ignore_ascii_case(instance)
    }

    /// Copy without the session-only `user` payload.
    pub fn without_user(&self) -> Self {
        Self {
            user: None,
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
/// Everything persisted about saved accounts.
pub struct ProfileCollection {
    #[serde(default)]
    pub profiles: Vec<ProfileRecord>,
    /// Active profile id; [`GUEST_PROFILE_ID`] or the id of an entry in `profiles`.
    #[serde(rename = "profile", default = "guest_profile_id")]
    pub active_id: ProfileId,
    /// Instance chosen for guest browsing.
    #[serde(
        rename = "defaultInstance",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub default_instance: Option<String>,
}

fn guest_profile_id() -> ProfileId {
    GUEST_PROFILE_ID
}

impl Default for ProfileCollection {
    fn default() -> Self {
        Self {
            profiles: Vec::new(),
            active_id: GUEST_PROFILE_ID,
            default_instance: None,
        }
    }
}

impl ProfileCollection {
    pub fn position(&self, id: ProfileId) -> Option<usize> {
        self.profiles.iter().position(|profile| profile.id == id)
    }

    pub fn contains(&self, id: ProfileId) -> bool {
        self.position(id).is_some()
    }

    pub fn get(&self, id: ProfileId) -> Option<&ProfileRecord> {
        self.profiles.iter().find(|profile| profile.id == id)
    }

    /// Restores the collection invariants after reading untrusted data: guest entries are dropped
    /// from the list and a dangling active id falls back to the guest.
    ///
    /// Returns `true` when anything changed.
    pub fn heal(&mut self) -> bool {
        let before = self.profiles.len();
        self.profiles.retain(|profile| !profile.is_guest());
        let mut changed = self.profiles.len() != before;
        if self.active_id != GUEST_PROFILE_ID && !self.contains(self.active_id) {
            self.active_id = GUEST_PROFILE_ID;
            changed = true;
        }
        changed
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
/// Authentication state of the active profile.
pub enum SessionPhase {
    /// Anonymous browsing.
    Guest,
    /// Token present, user not resolved yet (or the instance was unreachable).
    Pending,
    /// Token resolved to a user.
    Authenticated,
    /// The instance rejected the token.
    Expired,
}

impl SessionPhase {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Pending => "pending",
            Self::Authenticated => "authenticated",
            Self::Expired => "expired",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// In-memory view of the active profile. Never persisted as a whole.
pub struct ActiveSession {
    /// The active record; `profile.user` holds the resolved user once authenticated.
    pub profile: ProfileRecord,
    pub phase: SessionPhase,
}

impl ActiveSession {
    pub fn guest(instance: impl Into<String>) -> Self {
        Self {
            profile: ProfileRecord::guest(instance),
            phase: SessionPhase::Guest,
        }
    }

    pub fn id(&self) -> ProfileId {
        self.profile.id
    }

    /// Instance every request of this session goes to.
    pub fn instance(&self) -> &str {
        &self.profile.instance
    }

    /// Bearer token, only while the token has not been rejected.
    pub fn jwt(&self) -> Option<&str> {
        match self.phase {
            SessionPhase::Pending | SessionPhase::Authenticated => self.profile.jwt.as_deref(),
            SessionPhase::Guest | SessionPhase::Expired => None,
        }
    }

    pub fn user(&self) -> Option<&PersonData> {
        self.profile.user.as_ref()
    }

    pub fn username(&self) -> Option<&str> {
        self.user()
            .map(PersonData::username)
            .or(self.profile.username.as_deref())
    }

    pub fn is_authenticated(&self) -> bool {
        self.phase == SessionPhase::Authenticated && self.profile.user.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
/// Public metadata of the instance the session is browsing.
///
/// Always built through [`SiteSnapshot::from_response`], so it never carries `my_user`.
pub struct SiteSnapshot {
    pub instance: String,
    pub site: GetSiteResponse,
}

impl SiteSnapshot {
    /// Splits a `GET /site` response into the cacheable snapshot and the embedded current user.
    pub fn from_response(instance: &str, mut response: GetSiteResponse) -> (Self, Option<MyUserInfo>) {
        let my_user = response.my_user.take();
        (
            Self {
                instance: instance.to_string(),
                site: response,
            },
            my_user,
        )
    }
}

/// Lowercases and trims an instance host as typed by a user.
pub fn normalize_instance(instance: &str) -> String {
    instance.trim().trim_end_matches('/').to_lowercase()
}

#[cfg(test)]
mod tests {
    use platform_host::api::types::{LocalUserView, Person};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    use super::*;

    #[test]
    fn collection_uses_the_stored_document_shape() {
        let mut record = ProfileRecord::new(42, "lemmy.ml");
        record.jwt = Some("token".to_string());
        record.username = Some("alice".to_string());
        record.user = Some(PersonData::default());
        let collection = ProfileCollection {
            profiles: vec![record],
            active_id: 42,
            default_instance: Some("beehaw.org".to_string()),
        };

        let encoded = serde_json::to_value(&collection).expect("encode");
        assert_eq!(
            encoded,
            json!({
                "profiles": [{ "id": 42, "instance": "lemmy.ml", "jwt": "token", "username": "alice" }],
                "profile": 42,
                "defaultInstance": "beehaw.org"
            })
        );
    }

    #[test]
    fn heal_drops_guest_entries_and_dangling_active_id() {
        let mut collection: ProfileCollection = serde_json::from_value(json!({
            "profiles": [
                { "id": -1, "instance": "lemmy.ml" },
                { "id": 7, "instance": "lemmy.ml" }
            ],
            "profile": 99
        }))
        .expect("decode");

        assert!(collection.heal());
        assert_eq!(collection.active_id, GUEST_PROFILE_ID);
        assert_eq!(collection.profiles.len(), 1);
        assert!(!collection.heal());
    }

    #[test]
    fn missing_active_id_defaults_to_guest() {
        let collection: ProfileCollection =
            serde_json::from_value(json!({ "profiles": [] })).expect("decode");
        assert_eq!(collection.active_id, GUEST_PROFILE_ID);
    }

    #[test]
    fn person_data_flattens_user_info_and_defaults_counters() {
        let data: PersonData = serde_json::from_value(json!({
            "local_user_view": { "person": { "id": 3, "name": "alice", "avatar": "https://a/b.png" } },
            "unreads": 4
        }))
        .expect("decode");
        assert_eq!(data.username(), "alice");
        assert_eq!(data.avatar(), Some("https://a/b.png"));
        assert_eq!((data.unreads, data.reports, data.registration_applications), (4, 0, 0));
    }

    #[test]
    fn site_snapshot_strips_the_current_user() {
        let response = GetSiteResponse {
            version: "0.19.3".to_string(),
            my_user: Some(MyUserInfo {
                local_user_view: LocalUserView {
                    person: Person {
                        name: "alice".to_string(),
                        ..Person::default()
                    },
                    ..LocalUserView::default()
                },
                ..MyUserInfo::default()
            }),
            ..GetSiteResponse::default()
        };

        let (snapshot, user) = SiteSnapshot::from_response("lemmy.ml", response);
        assert_eq!(snapshot.instance, "lemmy.ml");
        assert!(snapshot.site.my_user.is_none());
        assert_eq!(snapshot.site.version, "0.19.3");
        assert_eq!(
            user.map(|user| user.local_user_view.person.name),
            Some("alice".to_string())
        );
    }

    #[test]
    fn expired_sessions_do_not_expose_their_token() {
        let mut session = ActiveSession::guest("lemmy.ml");
        session.profile = ProfileRecord::new(5, "lemmy.ml");
        session.profile.jwt = Some("token".to_string());
        session.phase = SessionPhase::Pending;
        assert_eq!(session.jwt(), Some("token"));
        session.phase = SessionPhase::Expired;
        assert_eq!(session.jwt(), None);
    }

    #[test]
    fn instances_are_normalized() {
        assert_eq!(normalize_instance("  Lemmy.ML/ "), "lemmy.ml");
    }
}
