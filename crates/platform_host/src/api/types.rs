//! Wire models for the Lemmy v3 JSON API.
//!
//! Only the fields the client reads are modeled. Everything is `#[serde(default)]`-tolerant so
//! that older and newer instances (which add, drop, or rename optional fields) still decode.
#![allow(missing_docs)]

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Numeric person id.
pub type PersonId = i64;
/// Numeric community id.
pub type CommunityId = i64;
/// Numeric post id.
pub type PostId = i64;
/// Numeric comment id.
pub type CommentId = i64;

macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident { $($(#[$vmeta:meta])* $variant:ident),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        pub enum $name {
            $($(#[$vmeta])* $variant),+
        }

        impl $name {
            /// Returns the token used on the wire and in page query strings.
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => stringify!($variant)),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = String;

            fn from_str(raw: &str) -> Result<Self, Self::Err> {
                match raw {
                    $(stringify!($variant) => Ok(Self::$variant),)+
                    other => Err(format!(concat!("unknown ", stringify!($name), " `{}`"), other)),
                }
            }
        }
    };
}

wire_enum! {
    /// Ordering for post and comment listings.
    SortType {
        /// Trending with recent activity.
        Active,
        /// Trending.
        Hot,
        /// Newest first.
        New,
        /// Oldest first.
        Old,
        /// Top of the last day.
        TopDay,
        /// Top of the last week.
        TopWeek,
        /// Top of the last month.
        TopMonth,
        /// Top of the last year.
        TopYear,
        /// Top of all time.
        TopAll,
        /// Most commented.
        MostComments,
        /// Newest comment activity.
        NewComments,
        /// Top of the last hour.
        TopHour,
        /// Top of the last six hours.
        TopSixHour,
        /// Top of the last twelve hours.
        TopTwelveHour,
        /// Top of the last three months.
        TopThreeMonths,
        /// Top of the last six months.
        TopSixMonths,
        /// Top of the last nine months.
        TopNineMonths,
        /// Most disputed.
        Controversial,
        /// Hot, scaled by community size.
        Scaled,
    }
}

impl SortType {
    /// Returns `true` for every `Top*` ordering.
    pub fn is_top(self) -> bool {
        self.as_str().starts_with("Top")
    }
}

wire_enum! {
    /// Which federation scope a feed covers.
    ListingType {
        /// Every known community.
        All,
        /// Communities hosted on the instance.
        Local,
        /// Communities the user follows.
        Subscribed,
        /// Communities the user moderates.
        ModeratorView,
    }
}

wire_enum! {
    /// Entity filter for search.
    SearchType {
        /// Every entity kind.
        All,
        /// Comments only.
        Comments,
        /// Posts only.
        Posts,
        /// Communities only.
        Communities,
        /// Users only.
        Users,
        /// Posts matched by URL.
        Url,
    }
}

wire_enum! {
    /// A user's subscription status for a community.
    SubscribedType {
        /// Following.
        Subscribed,
        /// Not following.
        NotSubscribed,
        /// Follow request pending on a remote instance.
        Pending,
    }
}

impl Default for SubscribedType {
    fn default() -> Self {
        Self::NotSubscribed
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// A user account, local or federated.
pub struct Person {
    pub id: PersonId,
    pub name: String,
    pub display_name: Option<String>,
    pub avatar: Option<String>,
    pub banner: Option<String>,
    pub actor_id: String,
    pub local: bool,
    pub admin: bool,
    pub bot_account: bool,
    pub deleted: bool,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// A community (group) hosted on some instance.
pub struct Community {
    pub id: CommunityId,
    pub name: String,
    pub title: String,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub actor_id: String,
    pub local: bool,
    pub nsfw: bool,
    pub removed: bool,
    pub deleted: bool,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// A post.
pub struct Post {
    pub id: PostId,
    pub name: String,
    pub url: Option<String>,
    pub body: Option<String>,
    pub creator_id: PersonId,
    pub community_id: CommunityId,
    pub thumbnail_url: Option<String>,
    pub nsfw: bool,
    pub local: bool,
    pub removed: bool,
    pub deleted: bool,
    pub ap_id: String,
    pub published: String,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// A comment.
pub struct Comment {
    pub id: CommentId,
    pub creator_id: PersonId,
    pub post_id: PostId,
    pub content: String,
    pub path: String,
    pub local: bool,
    pub removed: bool,
    pub deleted: bool,
    pub ap_id: String,
    pub published: String,
    pub updated: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Vote and activity counters for a post or comment.
pub struct VoteCounts {
    pub score: i64,
    pub upvotes: i64,
    pub downvotes: i64,
    pub comments: i64,
    pub child_count: i64,
}

impl VoteCounts {
    /// Upvotes minus downvotes.
    pub fn net(&self) -> i64 {
        self.upvotes - self.downvotes
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Activity counters for a person.
pub struct PersonCounts {
    pub post_count: i64,
    pub comment_count: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Activity counters for a community.
pub struct CommunityCounts {
    pub subscribers: i64,
    pub posts: i64,
    pub comments: i64,
    pub users_active_month: i64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PostView {
    pub post: Post,
    pub creator: Person,
    pub community: Community,
    pub counts: VoteCounts,
    pub subscribed: SubscribedType,
    pub saved: bool,
    pub read: bool,
    pub my_vote: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommentView {
    pub comment: Comment,
    pub creator: Person,
    pub post: Post,
    pub community: Community,
    pub counts: VoteCounts,
    pub saved: bool,
    pub my_vote: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PersonView {
    pub person: Person,
    pub counts: PersonCounts,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityView {
    pub community: Community,
    pub counts: CommunityCounts,
    pub subscribed: SubscribedType,
    pub blocked: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityModeratorView {
    pub community: Community,
    pub moderator: Person,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CommunityFollowerView {
    pub community: Community,
    pub follower: Person,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Per-account settings stored on the instance.
pub struct LocalUser {
    pub id: i64,
    pub person_id: PersonId,
    pub show_nsfw: bool,
    pub default_sort_type: Option<SortType>,
    pub default_listing_type: Option<ListingType>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LocalUserView {
    pub local_user: LocalUser,
    pub person: Person,
    pub counts: PersonCounts,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// The authenticated user's view of themselves, returned inside [`GetSiteResponse`].
pub struct MyUserInfo {
    pub local_user_view: LocalUserView,
    pub follows: Vec<CommunityFollowerView>,
    pub moderates: Vec<CommunityModeratorView>,
    pub community_blocks: Vec<Value>,
    pub person_blocks: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Public instance metadata.
pub struct Site {
    pub id: i64,
    pub name: String,
    pub sidebar: Option<String>,
    pub description: Option<String>,
    pub icon: Option<String>,
    pub banner: Option<String>,
    pub actor_id: String,
    pub published: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteView {
    pub site: Site,
    pub local_site: Value,
    pub counts: Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// Response of `GET /site`.
///
/// `my_user` is only present when the request carried a valid bearer token. Fields the client does
/// not model are kept in `extra` so a cached snapshot loses nothing.
pub struct GetSiteResponse {
    pub site_view: SiteView,
    pub admins: Vec<PersonView>,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub my_user: Option<MyUserInfo>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Query for `GET /post/list`. Credentials travel in the `Authorization` header only.
pub struct GetPosts {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<CommunityId>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetPostsResponse {
    pub posts: Vec<PostView>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Query for `GET /user`.
pub struct GetPersonDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub person_id: Option<PersonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<CommunityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub saved_only: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetPersonDetailsResponse {
    pub person_view: PersonView,
    pub comments: Vec<CommentView>,
    pub posts: Vec<PostView>,
    pub moderates: Vec<CommunityModeratorView>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Query for `GET /community`.
pub struct GetCommunity {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<CommunityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GetCommunityResponse {
    pub community_view: CommunityView,
    pub moderators: Vec<CommunityModeratorView>,
    pub discussion_languages: Vec<i64>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Query for `GET /search`.
pub struct Search {
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_id: Option<CommunityId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub community_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creator_id: Option<PersonId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub type_: Option<SearchType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sort: Option<SortType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub listing_type: Option<ListingType>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub page: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchResponse {
    pub type_: SearchType,
    pub comments: Vec<CommentView>,
    pub posts: Vec<PostView>,
    pub communities: Vec<CommunityView>,
    pub users: Vec<PersonView>,
}

impl Default for SearchResponse {
    fn default() -> Self {
        Self {
            type_: SearchType::All,
            comments: Vec::new(),
            posts: Vec::new(),
            communities: Vec::new(),
            users: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
/// Query for `GET /resolve_object`.
pub struct ResolveObject {
    pub q: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
/// At most one field is set, depending on what the federated identifier pointed at.
pub struct ResolveObjectResponse {
    pub comment: Option<CommentView>,
    pub post: Option<PostView>,
    pub community: Option<CommunityView>,
    pub person: Option<PersonView>,
}
