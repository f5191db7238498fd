//! The signed-in user's own profile: posts and comments in one listing.

use std::str::FromStr;

use platform_host::api::types::{CommunityModeratorView, GetPersonDetails, PersonView, SortType};
use url::Url;

use super::{
    enum_param, number_param, remote_failure, sort_by_score, sort_newest_first, sort_oldest_first,
    FeedItem, LoadContext, LoadError,
};

const DEFAULT_LIMIT: i64 = 20;
const PROFILE_FAILED: &str = "Failed to load profile.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
/// Which items the profile page shows.
pub enum ProfileItemType {
    Comments,
    Posts,
    #[default]
    All,
}

impl ProfileItemType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Comments => "comments",
            Self::Posts => "posts",
            Self::All => "all",
        }
    }
}

impl FromStr for ProfileItemType {
    type Err = String;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "comments" => Ok(Self::Comments),
            "posts" => Ok(Self::Posts),
            "all" => Ok(Self::All),
            other => Err(format!("unknown profile item type `{other}`")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProfilePage {
    pub limit: i64,
    pub item_type: ProfileItemType,
    pub page: i64,
    pub sort: SortType,
    pub person_view: PersonView,
    /// Posts and comments merged and ordered by `sort`.
    pub items: Vec<FeedItem>,
    pub moderates: Vec<CommunityModeratorView>,
}

/// Loads the active user's posts and comments.
///
/// `limit` defaults to the user's posts-per-page setting, then 20. `Top*` sorts order by net
/// score, `New`/`Old` by publication time; other sorts keep posts before comments.
///
/// # Errors
///
/// Returns a 401 [`LoadError`] without an active username and a 500 one when the request fails.
pub async fn load_profile(ctx: &LoadContext, url: &Url) -> Result<ProfilePage, LoadError> {
    let page = number_param(url, "page").unwrap_or(1);
    let item_type = enum_param(url, "type").unwrap_or_default();
    let sort = enum_param(url, "sort").unwrap_or(SortType::New);
    let limit = number_param(url, "limit")
        .or(ctx.settings.ui_state.posts_per_page.filter(|limit| *limit > 0))
        .unwrap_or(DEFAULT_LIMIT);

    let Some(username) = ctx.username.clone() else {
        return Err(LoadError {
            status: 401,
            message: PROFILE_FAILED.to_string(),
        });
    };

    let form = GetPersonDetails {
        username: Some(username),
        sort: Some(sort),
        page: Some(page),
        limit: Some(limit),
        ..GetPersonDetails::default()
    };
    let details = ctx
        .api
        .get_person_details(&ctx.target(), &form)
        .await
        .map_err(|err| remote_failure("profile", PROFILE_FAILED, &err))?;

    let mut items: Vec<FeedItem> = details
        .posts
        .into_iter()
        .map(FeedItem::Post)
        .chain(details.comments.into_iter().map(FeedItem::Comment))
        .collect();
    if sort.is_top() {
        sort_by_score(&mut items);
    } else if sort == SortType::New {
        sort_newest_first(&mut items);
    } else if sort == SortType::Old {
        sort_oldest_first(&mut items);
    }

    Ok(ProfilePage {
        limit,
        item_type,
        page,
        sort,
        person_view: details.person_view,
        items,
        moderates: details.moderates,
    })
}
