//! Search page: filters, mixed results, and federated object lookup.

use leptos::logging;
use platform_host::api::types::{
    CommunityId, GetCommunity, GetCommunityResponse, GetPersonDetails, GetPersonDetailsResponse,
    ListingType, PersonId, ResolveObject, ResolveObjectResponse, Search, SearchType, SortType,
};
use url::Url;

use super::{
    enum_param, number_param, query_param, remote_failure, sort_newest_first, FeedItem,
    LoadContext, LoadError,
};

const DEFAULT_LIMIT: i64 = 50;
const SEARCH_FAILED: &str = "Failed to fetch search results.";
/// Query prefixes that look like a federated identifier worth resolving.
const RESOLVABLE_PREFIXES: [&str; 3] = ["!", "@", "https://"];

#[derive(Debug, Clone, PartialEq, Default)]
/// Details of the community/person the search is restricted to.
pub struct SearchFilters {
    pub community: Option<GetCommunityResponse>,
    pub person: Option<GetPersonDetailsResponse>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct SearchCounts {
    pub posts: usize,
    pub comments: usize,
    pub users: usize,
    pub communities: usize,
    pub total: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SearchPage {
    pub page: i64,
    pub sort: SortType,
    pub search_type: SearchType,
    pub community_id: Option<CommunityId>,
    pub person_id: Option<PersonId>,
    /// Empty when no search ran.
    pub query: String,
    pub limit: i64,
    pub counts: SearchCounts,
    pub filters: SearchFilters,
    pub results: Vec<FeedItem>,
    /// Object the query resolved to, for signed-in users searching by federated identifier.
    pub resolved: Option<ResolveObjectResponse>,
}

fn wants_resolution(ctx: &LoadContext, query: &str) -> bool {
    ctx.jwt.is_some()
        && RESOLVABLE_PREFIXES
            .iter()
            .any(|prefix| query.starts_with(prefix))
}

/// Runs a search described by the page URL.
///
/// A community or person filter without `q` searches for `" "`. Without either the page keeps
/// its empty shape and no search request is sent. `New` results are ordered newest first; other
/// sorts keep the server's order (posts, comments, users, communities).
///
/// # Errors
///
/// Returns a 500 [`LoadError`] when a filter lookup or the search fails. A failed object
/// resolution is only logged.
pub async fn load_search(ctx: &LoadContext, url: &Url) -> Result<SearchPage, LoadError> {
    let community_id = number_param(url, "community_id");
    let person_id = number_param(url, "person_id");
    let page = number_param(url, "page").unwrap_or(1);
    let sort = enum_param(url, "sort").unwrap_or(SortType::New);
    let search_type = enum_param(url, "type").unwrap_or(SearchType::All);
    let limit = number_param(url, "limit").unwrap_or(DEFAULT_LIMIT);
    let query = query_param(url, "q").or_else(|| {
        (community_id.is_some() || person_id.is_some()).then(|| " ".to_string())
    });

    let target = ctx.target();
    let mut filters = SearchFilters::default();
    if let Some(id) = community_id {
        let form = GetCommunity {
            id: Some(id),
            name: None,
        };
        filters.community = Some(
            ctx.api
                .get_community(&target, &form)
                .await
                .map_err(|err| remote_failure("search", SEARCH_FAILED, &err))?,
        );
    }
    if let Some(id) = person_id {
        let form = GetPersonDetails {
            person_id: Some(id),
            limit: Some(1),
            ..GetPersonDetails::default()
        };
        filters.person = Some(
            ctx.api
                .get_person_details(&target, &form)
                .await
                .map_err(|err| remote_failure("search", SEARCH_FAILED, &err))?,
        );
    }

    let Some(query) = query else {
        return Ok(SearchPage {
            page: 1,
            sort,
            search_type,
            community_id,
            person_id,
            query: String::new(),
            limit,
            counts: SearchCounts::default(),
            filters,
            results: Vec::new(),
            resolved: None,
        });
    };

    let form = Search {
        q: query.clone(),
        community_id,
        community_name: None,
        creator_id: person_id,
        type_: Some(search_type),
        sort: Some(sort),
        listing_type: Some(ListingType::All),
        page: Some(page),
        limit: Some(limit),
    };
    let response = ctx
        .api
        .search(&target, &form)
        .await
        .map_err(|err| remote_failure("search", SEARCH_FAILED, &err))?;

    let mut counts = SearchCounts {
        posts: response.posts.len(),
        comments: response.comments.len(),
        users: response.users.len(),
        communities: response.communities.len(),
        total: 0,
    };
    let mut results: Vec<FeedItem> = response
        .posts
        .into_iter()
        .map(FeedItem::Post)
        .chain(response.comments.into_iter().map(FeedItem::Comment))
        .chain(response.users.into_iter().map(FeedItem::User))
        .chain(response.communities.into_iter().map(FeedItem::Community))
        .collect();
    counts.total = results.len();
    if sort == SortType::New {
        sort_newest_first(&mut results);
    }

    let resolved = if wants_resolution(ctx, &query) {
        let form = ResolveObject { q: query.clone() };
        match ctx.api.resolve_object(&target, &form).await {
            Ok(object) => Some(object),
            Err(err) => {
                logging::warn!("could not resolve `{query}`: {err}");
                None
            }
        }
    } else {
        None
    };

    Ok(SearchPage {
        page,
        sort,
        search_type,
        community_id,
        person_id,
        query,
        limit,
        counts,
        filters,
        results,
        resolved,
    })
}
