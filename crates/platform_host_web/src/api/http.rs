//! `reqwest`-backed implementation of [`LemmyApi`].
//!
//! Works in the browser (fetch) and natively. Tokens are sent as `Authorization: Bearer` headers.

use platform_host::api::types::{
    GetCommunity, GetCommunityResponse, GetPersonDetails, GetPersonDetailsResponse, GetPosts,
    GetPostsResponse, GetSiteResponse, ResolveObject, ResolveObjectResponse, Search,
    SearchResponse,
};
use platform_host::{ApiError, ApiTarget, LemmyApi, LemmyApiFuture};
use reqwest::{header::AUTHORIZATION, Client};
use serde::{de::DeserializeOwned, Serialize};

/// Path prefix of the HTTP API on every instance.
pub const API_PATH: &str = "/api/v3";

const NO_QUERY: &[(&str, &str)] = &[];

#[derive(Debug, Clone, Default)]
/// HTTP client for Lemmy instances.
pub struct HttpLemmyApi {
    client: Client,
}

impl HttpLemmyApi {
    /// Creates a client with default `reqwest` settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a client around a preconfigured `reqwest::Client`.
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn get_json<Q, R>(&self, target: &ApiTarget, path: &str, query: &Q) -> Result<R, ApiError>
    where
        Q: Serialize + ?Sized,
        R: DeserializeOwned,
    {
        let url = format!("{}{API_PATH}{path}", instance_base_url(&target.instance));
        let mut request = self.client.get(url).query(query);
        if let Some(jwt) = &target.auth {
            request = request.header(AUTHORIZATION, format!("Bearer {jwt}"));
        }

        let response = request
            .send()
            .await
            .map_err(|err| ApiError::Network(err.to_string()))?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(&body),
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|err| ApiError::Decode(err.to_string()))
    }
}

impl LemmyApi for HttpLemmyApi {
    fn get_site<'a>(
        &'a self,
        target: &'a ApiTarget,
    ) -> LemmyApiFuture<'a, Result<GetSiteResponse, ApiError>> {
        Box::pin(self.get_json(target, "/site", NO_QUERY))
    }

    fn get_posts<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetPosts,
    ) -> LemmyApiFuture<'a, Result<GetPostsResponse, ApiError>> {
        Box::pin(self.get_json(target, "/post/list", form))
    }

    fn get_person_details<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetPersonDetails,
    ) -> LemmyApiFuture<'a, Result<GetPersonDetailsResponse, ApiError>> {
        Box::pin(self.get_json(target, "/user", form))
    }

    fn get_community<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a GetCommunity,
    ) -> LemmyApiFuture<'a, Result<GetCommunityResponse, ApiError>> {
        Box::pin(self.get_json(target, "/community", form))
    }

    fn search<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a Search,
    ) -> LemmyApiFuture<'a, Result<SearchResponse, ApiError>> {
        Box::pin(self.get_json(target, "/search", form))
    }

    fn resolve_object<'a>(
        &'a self,
        target: &'a ApiTarget,
        form: &'a ResolveObject,
    ) -> LemmyApiFuture<'a, Result<ResolveObjectResponse, ApiError>> {
        Box::pin(self.get_json(target, "/resolve_object", form))
    }
}

/// Returns the scheme + host base for an instance.
///
/// Bare hosts (`lemmy.ml`) are served over HTTPS; an explicit `http://` or `https://` prefix is
/// kept so local development instances work.
pub fn instance_base_url(instance: &str) -> String {
    let trimmed = instance.trim().trim_end_matches('/');
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{trimmed}")
    }
}

/// Extracts the error token from a Lemmy error body (`{"error": "not_logged_in"}`), falling back to
/// the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| value.get("error")?.as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bare_hosts_default_to_https() {
        assert_eq!(instance_base_url("lemmy.ml"), "https://lemmy.ml");
        assert_eq!(instance_base_url(" lemmy.ml/ "), "https://lemmy.ml");
        assert_eq!(
            instance_base_url("http://localhost:8536/"),
            "http://localhost:8536"
        );
    }

    #[test]
    fn error_bodies_reduce_to_their_token() {
        assert_eq!(error_message(r#"{"error":"not_logged_in"}"#), "not_logged_in");
        assert_eq!(error_message("Bad Gateway\n"), "Bad Gateway");
        assert_eq!(error_message(r#"{"message":"x"}"#), r#"{"message":"x"}"#);
    }
}
