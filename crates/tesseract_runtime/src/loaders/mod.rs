//! Route data loaders.
//!
//! Each loader reads its page URL's query string, calls the remote API with the active session's
//! credentials, and reshapes the answer for rendering. Remote failures become a single
//! user-facing [`LoadError`]; nothing is retried.

pub mod comment;
pub mod home;
pub mod legal;
pub mod profile;
pub mod search;

use std::rc::Rc;
use std::str::FromStr;

use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use leptos::logging;
use platform_host::api::types::{CommentView, CommunityView, PersonView, PostView};
use platform_host::{ApiError, ApiTarget, LemmyApi};
use thiserror::Error;
use url::Url;

use crate::controller::SessionController;
use crate::settings::UserSettings;

pub use comment::{comment_redirect, Redirect, COMMENT_REDIRECT_STATUS};
pub use home::{load_home, HomePage, HOME_PAGE_LIMIT};
pub use legal::{load_legal, LegalPage};
pub use profile::{load_profile, ProfileItemType, ProfilePage};
pub use search::{load_search, SearchCounts, SearchFilters, SearchPage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{message}")]
/// User-facing page load failure.
pub struct LoadError {
    /// HTTP-style status shown by the error page.
    pub status: u16,
    pub message: String,
}

impl LoadError {
    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: 500,
            message: message.into(),
        }
    }
}

/// Logs `err` and wraps it in the loader's generic message.
pub(crate) fn remote_failure(route: &str, message: &str, err: &ApiError) -> LoadError {
    logging::warn!("{route} loader failed: {err}");
    LoadError::internal(message)
}

#[derive(Clone)]
/// Session-derived inputs shared by every loader.
pub struct LoadContext {
    pub api: Rc<dyn LemmyApi>,
    /// Instance the active session browses.
    pub instance: String,
    pub jwt: Option<String>,
    /// Username of the active profile.
    pub username: Option<String>,
    pub settings: UserSettings,
    /// Deployment default instance.
    pub default_instance: String,
    /// Controller to feed fetched site metadata back into, when loading inside the app.
    pub session: Option<SessionController>,
}

impl std::fmt::Debug for LoadContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadContext")
            .field("instance", &self.instance)
            .field("username", &self.username)
            .field("authenticated", &self.jwt.is_some())
            .finish_non_exhaustive()
    }
}

impl LoadContext {
    /// Snapshot of the controller's current session.
    pub fn from_controller(controller: &SessionController) -> Self {
        let session = controller.session();
        Self {
            api: controller.api(),
            instance: session.instance().to_string(),
            jwt: session.jwt().map(str::to_string),
            username: session.username().map(str::to_string),
            settings: controller.settings(),
            default_instance: controller.config().default_instance.clone(),
            session: Some(controller.clone()),
        }
    }

    /// Request target carrying the active token, if any.
    pub fn target(&self) -> ApiTarget {
        ApiTarget {
            instance: self.instance.clone(),
            auth: self.jwt.clone(),
        }
    }

    pub fn guest_target(&self) -> ApiTarget {
        ApiTarget::guest(self.instance.clone())
    }
}

/// First non-empty value of query parameter `name`.
pub fn query_param(url: &Url, name: &str) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

/// Numeric query parameter. Missing, zero, and non-numeric values yield `None`.
pub fn number_param(url: &Url, name: &str) -> Option<i64> {
    query_param(url, name)
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .filter(|value| *value != 0)
}

/// Parsed query parameter. Unknown values are logged and treated as absent.
pub fn enum_param<T: FromStr>(url: &Url, name: &str) -> Option<T> {
    let raw = query_param(url, name)?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            logging::warn!("ignoring unknown `{name}` value `{raw}`");
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One entry of a mixed listing.
pub enum FeedItem {
    Post(PostView),
    Comment(CommentView),
    User(PersonView),
    Community(CommunityView),
}

impl FeedItem {
    /// Raw publication timestamp as sent by the instance.
    pub fn published(&self) -> &str {
        match self {
            Self::Post(view) => &view.post.published,
            Self::Comment(view) => &view.comment.published,
            Self::User(view) => &view.person.published,
            Self::Community(view) => &view.community.published,
        }
    }

    /// Publication time. Instances omit the zone on older versions; those are read as UTC.
    pub fn published_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(self.published())
    }

    /// Upvotes minus downvotes; zero for users and communities.
    pub fn net_score(&self) -> i64 {
        match self {
            Self::Post(view) => view.counts.net(),
            Self::Comment(view) => view.counts.net(),
            Self::User(_) | Self::Community(_) => 0,
        }
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| Utc.from_utc_datetime(&naive))
}

/// Newest first; undated items go last.
pub fn sort_newest_first(items: &mut [FeedItem]) {
    items.sort_by_key(|item| (item.published_at().is_none(), std::cmp::Reverse(item.published_at())));
}

/// Oldest first; undated items go last.
pub fn sort_oldest_first(items: &mut [FeedItem]) {
    items.sort_by_key(|item| (item.published_at().is_none(), item.published_at()));
}

/// Highest net score first; ties keep their order.
pub fn sort_by_score(items: &mut [FeedItem]) {
    items.sort_by_key(|item| std::cmp::Reverse(item.net_score()));
}


#[cfg(test)]
mod tests {
    use platform_host::api::types::SortType;
    use pretty_assertions::assert_eq;

    use super::test_support::{comment, page, post};
    use super::*;

    fn ids(items: &[FeedItem]) -> Vec<i64> {
        items
            .iter()
            .map(|item| match item {
                FeedItem::Post(view) => view.post.id,
                FeedItem::Comment(view) => view.comment.id,
                FeedItem::User(view) => view.person.id,
                FeedItem::Community(view) => view.community.id,
            })
            .collect()
    }

    #[test]
    fn query_helpers_treat_empty_zero_and_garbage_as_absent() {
        let url = page("page=0&limit=abc&q=&sort=TopDay&type=Nonsense&community_id=12");
        assert_eq!(number_param(&url, "page"), None);
        assert_eq!(number_param(&url, "limit"), None);
        assert_eq!(number_param(&url, "community_id"), Some(12));
        assert_eq!(query_param(&url, "q"), None);
        assert_eq!(enum_param::<SortType>(&url, "sort"), Some(SortType::TopDay));
        assert_eq!(enum_param::<SortType>(&url, "type"), None);
    }

    #[test]
    fn timestamps_with_and_without_zone_parse() {
        let zoned = FeedItem::Post(post(1, "2023-07-01T12:00:00Z", 0, 0));
        let naive = FeedItem::Post(post(2, "2023-07-01T12:00:00.123456", 0, 0));
        let junk = FeedItem::Post(post(3, "yesterday", 0, 0));
        assert!(zoned.published_at().is_some());
        assert!(naive.published_at() > zoned.published_at());
        assert_eq!(junk.published_at(), None);
    }

    #[test]
    fn orderings() {
        let items = vec![
            FeedItem::Post(post(1, "2023-01-02T00:00:00Z", 5, 0)),
            FeedItem::Comment(comment(2, "2023-01-03T00:00:00Z", 9)),
            FeedItem::Post(post(3, "", 1, 4)),
            FeedItem::Comment(comment(4, "2023-01-01T00:00:00Z", 5)),
        ];

        let mut newest = items.clone();
        sort_newest_first(&mut newest);
        assert_eq!(ids(&newest), vec![2, 1, 4, 3]);

        let mut oldest = items.clone();
        sort_oldest_first(&mut oldest);
        assert_eq!(ids(&oldest), vec![4, 1, 2, 3]);

        let mut top = items;
        sort_by_score(&mut top);
        assert_eq!(ids(&top), vec![2, 1, 4, 3]);
    }
}
