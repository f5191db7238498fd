//! Front page feed.

use platform_host::api::types::{GetPosts, GetPostsResponse, GetSiteResponse, ListingType, SortType};
use url::Url;

use super::{enum_param, number_param, remote_failure, LoadContext, LoadError};
use crate::model::SiteSnapshot;

/// Posts requested per feed page.
pub const HOME_PAGE_LIMIT: i64 = 20;
const HOME_FAILED: &str = "Failed to fetch homepage.";

#[derive(Debug, Clone, PartialEq)]
pub struct HomePage {
    pub sort: SortType,
    pub listing_type: ListingType,
    pub page: i64,
    pub posts: GetPostsResponse,
    /// Site metadata without `my_user`.
    pub site: GetSiteResponse,
}

/// Loads one feed page plus the site metadata, and hands the site to the session controller.
///
/// `sort` and `type` fall back to the user's default feed ordering.
///
/// # Errors
///
/// Returns a 500 [`LoadError`] when either request fails.
pub async fn load_home(ctx: &LoadContext, url: &Url) -> Result<HomePage, LoadError> {
    let page = number_param(url, "page").unwrap_or(1);
    let sort = enum_param(url, "sort").unwrap_or(ctx.settings.default_sort.sort);
    let listing_type = enum_param(url, "type").unwrap_or(ctx.settings.default_sort.feed);

    let form = GetPosts {
        type_: Some(listing_type),
        sort: Some(sort),
        page: Some(page),
        limit: Some(HOME_PAGE_LIMIT),
        community_id: None,
    };
    let posts_target = ctx.target();
    let site_target = ctx.guest_target();
    let (posts, site) = futures::try_join!(
        ctx.api.get_posts(&posts_target, &form),
        ctx.api.get_site(&site_target)
    )
    .map_err(|err| remote_failure("home", HOME_FAILED, &err))?;

    let (snapshot, _) = SiteSnapshot::from_response(&ctx.instance, site);
    if let Some(controller) = &ctx.session {
        controller.apply_site(snapshot.clone()).await;
    }

    Ok(HomePage {
        sort,
        listing_type,
        page,
        posts,
        site: snapshot.site,
    })
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use futures::executor::block_on;
    use platform_host::api::types::GetSiteResponse;
    use platform_host::{ApiCall, ApiTarget, HostServices, MemoryLemmyApi};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::config::InstanceConfig;
    use crate::controller::SessionController;
    use crate::loaders::test_support::{page, post};
    use crate::settings::UserSettings;

    fn context(api: &MemoryLemmyApi, jwt: Option<&str>) -> LoadContext {
        LoadContext {
            api: Rc::new(api.clone()),
            instance: "lemmy.ml".to_string(),
            jwt: jwt.map(str::to_string),
            username: None,
            settings: UserSettings::default(),
            default_instance: "lemmy.world".to_string(),
            session: None,
        }
    }

    fn named_site(name: &str) -> GetSiteResponse {
        let mut site = GetSiteResponse::default();
        site.site_view.site.name = name.to_string();
        site
    }

    #[test]
    fn defaults_come_from_user_settings() {
        let api = MemoryLemmyApi::default()
            .with_site("lemmy.ml", named_site("Lemmy"))
            .with_posts(vec![post(1, "2023-01-01T00:00:00Z", 1, 0)]);

        let home = block_on(load_home(&context(&api, Some("tok")), &page(""))).expect("home");

        assert_eq!(home.page, 1);
        assert_eq!(home.sort, SortType::Active);
        assert_eq!(home.listing_type, ListingType::Local);
        assert_eq!(home.posts.posts.len(), 1);
        assert_eq!(home.site.site_view.site.name, "Lemmy");
        assert_eq!(
            api.calls()[0],
            ApiCall::GetPosts(
                ApiTarget::authenticated("lemmy.ml", "tok"),
                GetPosts {
                    type_: Some(ListingType::Local),
                    sort: Some(SortType::Active),
                    page: Some(1),
                    limit: Some(HOME_PAGE_LIMIT),
                    community_id: None,
                }
            )
        );
    }

    #[test]
    fn query_overrides_defaults() {
        let api = MemoryLemmyApi::default().with_site("lemmy.ml", GetSiteResponse::default());
        let home = block_on(load_home(
            &context(&api, None),
            &page("page=3&sort=TopWeek&type=All"),
        ))
        .expect("home");
        assert_eq!(
            (home.page, home.sort, home.listing_type),
            (3, SortType::TopWeek, ListingType::All)
        );
    }

    #[test]
    fn remote_failure_becomes_generic_error() {
        let api = MemoryLemmyApi::default().with_site("lemmy.ml", GetSiteResponse::default());
        api.set_unreachable("lemmy.ml", true);
        assert_eq!(
            block_on(load_home(&context(&api, None), &page(""))),
            Err(LoadError::internal("Failed to fetch homepage."))
        );
    }

    #[test]
    fn fetched_site_replaces_the_session_snapshot() {
        let api = MemoryLemmyApi::default().with_site("lemmy.world", named_site("Fresh"));
        let host = HostServices::headless().with_api(Rc::new(api.clone()));
        let controller = SessionController::new(host, InstanceConfig::default());
        let ctx = LoadContext::from_controller(&controller);
        assert_eq!(ctx.instance, "lemmy.world");
        assert!(controller.site().is_none());

        block_on(load_home(&ctx, &page(""))).expect("home");

        assert_eq!(
            controller.site().map(|site| site.site.site_view.site.name),
            Some("Fresh".to_string())
        );
    }
}
