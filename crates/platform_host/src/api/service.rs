//! Remote Lemmy API service contract and in-process adapters.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    future::Future,
    pin::Pin,
    rc::Rc,
};

use super::types::{
    CommunityId, GetCommunity, GetCommunityResponse, GetPersonDetails, GetPersonDetailsResponse,
    GetPosts, GetPostsResponse, GetSiteResponse, ResolveObject, ResolveObjectResponse, Search,
    SearchResponse,
};

/// Object-safe boxed future used by [`LemmyApi`] async methods.
pub type LemmyApiFuture<'a, T> = Pin<Box<dyn Future<Output = T> + 'a>>;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
/// Instance and optional bearer credential a request is sent with.
pub struct ApiTarget {
    /// Instance host, e.g. `lemmy.ml`.
    pub instance: String,
    /// Bearer token (JWT) of the acting account.
    pub auth: Option<String>,
}

impl ApiTarget {
    /// Anonymous request against `instance`.
    pub fn guest(instance: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            auth: None,
        }
    }

    /// Request against `instance` carrying `jwt` as bearer credential.
    pub fn authenticated(instance: impl Into<String>, jwt: impl Into<String>) -> Self {
        Self {
            instance: instance.into(),
            auth: Some(jwt.into()),
        }
    }
}

/// Failure of a remote API call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    /// No remote API is wired for this host.
    Unavailable,
    /// The request never produced an HTTP response.
    Network(String),
    /// The instance answered with a non-success status.
    Status {
        /// HTTP status code.
        status: u16,
        /// Error token or body returned by the instance.
        message: String,
    },
    /// The response body did not match the expected shape.
    Decode(String),
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Unavailable => write!(f, "remote api unavailable"),
            Self::Network(message) => write!(f, "network error: {message}"),
            Self::Status { status, message } => write!(f, "instance returned {status}: {message}"),
            Self::Decode(message) => write!(f, "malformed response: {message}"),
        }
    }
}

impl std::error::Error for ApiError {}

/// Host service for the subset of the Lemmy HTTP API the client consumes.
pub trait LemmyApi {
    /// `GET /site`: instance metadata, plus `my_user` when `target.auth` is a valid token.
    fn get_site<'a>(
        &'a self,
        target: &'a ApiTarget,
    ) -> LemmyApiFuture<'a, Result<GetSiteResponse, ApiError>>;

    /// `GET /post/list`: one page of a feed.
    fn get_posts<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetPosts,
    ) -> LemmyApiFuture<'a, Result<GetPostsResponse, ApiError>>;

    /// `GET /user`: a person with their posts, comments, and moderated communities.
    fn get_person_details<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetPersonDetails,
    ) -> LemmyApiFuture<'a, Result<GetPersonDetailsResponse, ApiError>>;

    /// `GET /community`: a community with its moderators.
    fn get_community<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetCommunity,
    ) -> LemmyApiFuture<'a, Result<GetCommunityResponse, ApiError>>;

    /// `GET /search`: multi-entity search.
    fn search<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a Search,
    ) -> LemmyApiFuture<'a, Result<SearchResponse, ApiError>>;

    /// `GET /resolve_object`: fetch a federated object by identifier or URL.
    fn resolve_object<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a ResolveObject,
    ) -> LemmyApiFuture<'a, Result<ResolveObjectResponse, ApiError>>;
}

#[derive(Debug, Clone, Copy, Default)]
/// API adapter for hosts with no network access; every call fails with [`ApiError::Unavailable`].
pub struct NoopLemmyApi;

impl LemmyApi for NoopLemmyApi {
    fn get_site<'a>(
        &'a self,
        _target: &'a ApiTarget,
    ) -> LemmyApiFuture<'a, Result<GetSiteResponse, ApiError>> {
        Box::pin(async { Err(ApiError::Unavailable) })
    }

    fn get_posts<'a>(
        &'a self,
        _target: &'a ApiTarget,
        _form: &'a GetPosts,
    ) -> LemmyApiFuture<'a, Result<GetPostsResponse, ApiError>> {
        Box::pin(async { Err(ApiError::Unavailable) })
    }

    fn get_person_details<'a>(
        &'a self,
        _target: &'a ApiTarget,
        _form: &'a GetPersonDetails,
    ) -> LemmyApiFuture<'a, Result<GetPersonDetailsResponse, ApiError>> {
        Box::pin(async { Err(ApiError::Unavailable) })
    }

    fn get_community<'a>(
        &'a self,
        _target: &'a ApiTarget,
        _form: &'a GetCommunity,
    ) -> LemmyApiFuture<'a, Result<GetCommunityResponse, ApiError>> {
        Box::pin(async { Err(ApiError::Unavailable) })
    }

    fn search<'a>(
        &'a self,
        _target: &'a ApiTarget,
        _form: &'a Search,
    ) -> LemmyApiFuture<'a, Result<SearchResponse, ApiError>> {
        Box::pin(async { Err(ApiError::Unavailable) })
    }

    fn resolve_object<'a>(
        &'a self,
        _target: &'a ApiTarget,
        _form: &'a ResolveObject,
    ) -> LemmyApiFuture<'a, Result<ResolveObjectResponse, ApiError>> {
        Box::pin(async { Err(ApiError::Unavailable) })
    }
}

#[derive(Debug, Clone, PartialEq)]
/// One request observed by [`MemoryLemmyApi`].
pub enum ApiCall {
    /// `get_site`.
    GetSite(ApiTarget),
    /// `get_posts`.
    GetPosts(ApiTarget, GetPosts),
    /// `get_person_details`.
    GetPersonDetails(ApiTarget, GetPersonDetails),
    /// `get_community`.
    GetCommunity(ApiTarget, GetCommunity),
    /// `search`.
    Search(ApiTarget, Search),
    /// `resolve_object`.
    ResolveObject(ApiTarget, ResolveObject),
}

impl ApiCall {
    /// Target the call was sent to.
    pub fn target(&self) -> &ApiTarget {
        match self {
            Self::GetSite(target)
            | Self::GetPosts(target, _)
            | Self::GetPersonDetails(target, _)
            | Self::GetCommunity(target, _)
            | Self::Search(target, _)
            | Self::ResolveObject(target, _) => target,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryApiState {
    sites: HashMap<String, GetSiteResponse>,
    users_by_token: HashMap<(String, String), super::types::MyUserInfo>,
    posts: Vec<super::types::PostView>,
    people: Vec<GetPersonDetailsResponse>,
    communities: HashMap<CommunityId, GetCommunityResponse>,
    search: Option<SearchResponse>,
    resolved: Option<ResolveObjectResponse>,
    unreachable: HashSet<String>,
    rejected_tokens: HashSet<(String, String)>,
    calls: Vec<ApiCall>,
}

#[derive(Debug, Clone, Default)]
/// In-memory Lemmy API with canned per-instance data and a call log.
///
/// `get_site` returns the instance's registered site and attaches `my_user` only when the
/// request's token was registered with [`MemoryLemmyApi::with_user`]; an unknown token behaves like
/// an expired login (site without `my_user`). Instances marked unreachable fail every call with
/// [`ApiError::Network`].
pub struct MemoryLemmyApi {
    inner: Rc<RefCell<MemoryApiState>>,
}

impl MemoryLemmyApi {
    /// Registers the public site response for `instance`.
    pub fn with_site(self, instance: &str, site: GetSiteResponse) -> Self {
        self.inner
            .borrow_mut()
            .sites
            .insert(instance.to_string(), site);
        self
    }

    /// Registers `jwt` as a valid token on `instance` resolving to `user`.
    pub fn with_user(self, instance: &str, jwt: &str, user: super::types::MyUserInfo) -> Self {
        self.inner
            .borrow_mut()
            .users_by_token
            .insert((instance.to_string(), jwt.to_string()), user);
        self
    }

    /// Makes `get_site` on `instance` answer `401 incorrect_login` for `jwt`.
    pub fn with_rejected_token(self, instance: &str, jwt: &str) -> Self {
        self.inner
            .borrow_mut()
            .rejected_tokens
            .insert((instance.to_string(), jwt.to_string()));
        self
    }

    /// Sets the posts returned by every `get_posts` call.
    pub fn with_posts(self, posts: Vec<super::types::PostView>) -> Self {
        self.inner.borrow_mut().posts = posts;
        self
    }

    /// Registers a person, found by either username or id.
    pub fn with_person(self, details: GetPersonDetailsResponse) -> Self {
        self.inner.borrow_mut().people.push(details);
        self
    }

    /// Registers a community, found by id.
    pub fn with_community(self, community: GetCommunityResponse) -> Self {
        let id = community.community_view.community.id;
        self.inner.borrow_mut().communities.insert(id, community);
        self
    }

    /// Sets the response of every `search` call.
    pub fn with_search(self, response: SearchResponse) -> Self {
        self.inner.borrow_mut().search = Some(response);
        self
    }

    /// Sets the response of every `resolve_object` call.
    pub fn with_resolved(self, response: ResolveObjectResponse) -> Self {
        self.inner.borrow_mut().resolved = Some(response);
        self
    }

    /// Makes every call to `instance` fail with a network error.
    pub fn set_unreachable(&self, instance: &str, unreachable: bool) {
        let mut state = self.inner.borrow_mut();
        if unreachable {
            state.unreachable.insert(instance.to_string());
        } else {
            state.unreachable.remove(instance);
        }
    }

    /// Returns every call made so far, in order.
    pub fn calls(&self) -> Vec<ApiCall> {
        self.inner.borrow().calls.clone()
    }

    /// Number of calls made so far.
    pub fn call_count(&self) -> usize {
        self.inner.borrow().calls.len()
    }

    fn record(&self, call: ApiCall) -> Result<(), ApiError> {
        let mut state = self.inner.borrow_mut();
        let instance = call.target().instance.clone();
        state.calls.push(call);
        if state.unreachable.contains(&instance) {
            return Err(ApiError::Network(format!("{instance} is unreachable")));
        }
        Ok(())
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            message: format!("couldnt_find_{what}"),
        }
    }
}

impl LemmyApi for MemoryLemmyApi {
    fn get_site<'a>(
        &'a self,
        target: &'a ApiTarget,
    ) -> LemmyApiFuture<'a, Result<GetSiteResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiCall::GetSite(target.clone()))?;
            let state = self.inner.borrow();
            if let Some(jwt) = &target.auth {
                if state
                    .rejected_tokens
                    .contains(&(target.instance.clone(), jwt.clone()))
                {
                    return Err(ApiError::Status {
                        status: 401,
                        message: "incorrect_login".to_string(),
                    });
                }
            }
            let mut site = state
                .sites
                .get(&target.instance)
                .cloned()
                .ok_or_else(|| Self::not_found("site"))?;
            site.my_user = target.auth.as_ref().and_then(|jwt| {
                state
                    .users_by_token
                    .get(&(target.instance.clone(), jwt.clone()))
                    .cloned()
            });
            Ok(site)
        })
    }

    fn get_posts<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetPosts,
    ) -> LemmyApiFuture<'a, Result<GetPostsResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiCall::GetPosts(target.clone(), form.clone()))?;
            Ok(GetPostsResponse {
                posts: self.inner.borrow().posts.clone(),
            })
        })
    }

    fn get_person_details<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetPersonDetails,
    ) -> LemmyApiFuture<'a, Result<GetPersonDetailsResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiCall::GetPersonDetails(target.clone(), form.clone()))?;
            self.inner
                .borrow()
                .people
                .iter()
                .find(|details| {
                    let person = &details.person_view.person;
                    form.person_id == Some(person.id)
                        || form.username.as_deref() == Some(person.name.as_str())
                })
                .cloned()
                .ok_or_else(|| Self::not_found("person"))
        })
    }

    fn get_community<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetCommunity,
    ) -> LemmyApiFuture<'a, Result<GetCommunityResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiCall::GetCommunity(target.clone(), form.clone()))?;
            let state = self.inner.borrow();
            form.id
                .and_then(|id| state.communities.get(&id))
                .cloned()
                .ok_or_else(|| Self::not_found("community"))
        })
    }

    fn search<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a Search,
    ) -> LemmyApiFuture<'a, Result<SearchResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiCall::Search(target.clone(), form.clone()))?;
            Ok(self.inner.borrow().search.clone().unwrap_or_default())
        })
    }

    fn resolve_object<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a ResolveObject,
    ) -> LemmyApiFuture<'a, Result<ResolveObjectResponse, ApiError>> {
        Box::pin(async move {
            self.record(ApiCall::ResolveObject(target.clone(), form.clone()))?;
            self.inner
                .borrow()
                .resolved
                .clone()
                .ok_or_else(|| Self::not_found("object"))
        })
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::api::types::{LocalUserView, MyUserInfo, Person};

    fn me(name: &str) -> MyUserInfo {
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

    #[test]
    fn memory_api_attaches_user_only_for_registered_token() {
        let api = MemoryLemmyApi::default()
            .with_site("lemmy.ml", GetSiteResponse::default())
            .with_user("lemmy.ml", "good", me("alice"));
        let api_obj: &dyn LemmyApi = &api;

        let with_user = block_on(api_obj.get_site(&ApiTarget::authenticated("lemmy.ml", "good")))
            .expect("site");
        assert_eq!(
            with_user.my_user.expect("my_user").local_user_view.person.name,
            "alice"
        );

        let stale = block_on(api_obj.get_site(&ApiTarget::authenticated("lemmy.ml", "stale")))
            .expect("site");
        assert!(stale.my_user.is_none());
        assert_eq!(api.call_count(), 2);
    }

    #[test]
    fn memory_api_fails_unreachable_instances_but_logs_the_call() {
        let api = MemoryLemmyApi::default().with_site("lemmy.ml", GetSiteResponse::default());
        api.set_unreachable("lemmy.ml", true);

        let err = block_on(api.get_site(&ApiTarget::guest("lemmy.ml"))).expect_err("unreachable");
        assert!(matches!(err, ApiError::Network(_)));
        assert_eq!(api.calls(), vec![ApiCall::GetSite(ApiTarget::guest("lemmy.ml"))]);

        api.set_unreachable("lemmy.ml", false);
        block_on(api.get_site(&ApiTarget::guest("lemmy.ml"))).expect("reachable again");
    }

    #[test]
    fn memory_api_rejects_registered_bad_tokens() {
        let api = MemoryLemmyApi::default()
            .with_site("lemmy.ml", GetSiteResponse::default())
            .with_rejected_token("lemmy.ml", "revoked");

        let err = block_on(api.get_site(&ApiTarget::authenticated("lemmy.ml", "revoked")))
            .expect_err("rejected");
        assert_eq!(
            err,
            ApiError::Status {
                status: 401,
                message: "incorrect_login".to_string()
            }
        );
        block_on(api.get_site(&ApiTarget::guest("lemmy.ml"))).expect("guest still served");
    }

    #[test]
    fn memory_api_reports_unknown_site_as_not_found() {
        let api = MemoryLemmyApi::default();
        let err = block_on(api.get_site(&ApiTarget::guest("nowhere.example"))).expect_err("404");
        assert_eq!(
            err,
            ApiError::Status {
                status: 404,
                message: "couldnt_find_site".to_string()
            }
        );
    }

    #[test]
    fn noop_api_is_unavailable() {
        let err = block_on(NoopLemmyApi.get_site(&ApiTarget::guest("lemmy.ml"))).expect_err("noop");
        assert_eq!(err, ApiError::Unavailable);
        assert_eq!(err.to_string(), "remote api unavailable");
    }
}
