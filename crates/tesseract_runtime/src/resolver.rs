//! Session resolution: turns an instance + token into a user and a site snapshot.

use leptos::logging;
use platform_host::{ApiError, ApiTarget, LemmyApi};
use thiserror::Error;

use crate::model::{PersonData, SiteSnapshot};

#[derive(Debug, Clone, PartialEq)]
/// Successful resolution.
pub struct ResolvedSession {
    pub user: PersonData,
    /// Site metadata fetched in the same request, without `my_user`.
    pub site: SiteSnapshot,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
/// Why a token could not be resolved.
pub enum ResolveError {
    /// The instance could not be reached or answered with something unreadable.
    #[error("instance unreachable: {0}")]
    Unreachable(String),
    /// The instance answered but did not recognise the token.
    #[error("token was not accepted by the instance")]
    InvalidToken,
}

/// Fetches `GET /site` on `instance` with `jwt` as bearer credential.
///
/// # Errors
///
/// Returns [`ResolveError::InvalidToken`] when the response has no `my_user` or the instance
/// refuses the token with 401/403, and [`ResolveError::Unreachable`] for any other transport,
/// status, or decoding failure.
pub async fn resolve(
    api: &dyn LemmyApi,
    instance: &str,
    jwt: &str,
) -> Result<ResolvedSession, ResolveError> {
    let target = ApiTarget::authenticated(instance, jwt);
    let response = match api.get_site(&target).await {
        Ok(response) => response,
        Err(ApiError::Status {
            status: 401 | 403,
            message,
        }) => {
            logging::warn!("{instance} rejected the session token: {message}");
            return Err(ResolveError::InvalidToken);
        }
        Err(err) => {
            logging::warn!("session resolution against {instance} failed: {err}");
            return Err(ResolveError::Unreachable(err.to_string()));
        }
    };

    let (site, my_user) = SiteSnapshot::from_response(instance, response);
    let user = my_user.ok_or(ResolveError::InvalidToken)?;
    Ok(ResolvedSession {
        user: PersonData::from_user(user),
        site,
    })
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;
    use platform_host::api::types::{GetSiteResponse, LocalUserView, MyUserInfo, Person};
    use platform_host::MemoryLemmyApi;
    use pretty_assertions::assert_eq;

    use super::*;

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

    fn api() -> MemoryLemmyApi {
        MemoryLemmyApi::default()
            .with_site("lemmy.ml", GetSiteResponse::default())
            .with_user("lemmy.ml", "good", user("alice"))
    }

    #[test]
    fn valid_token_resolves_user_with_zeroed_counters() {
        let resolved = block_on(resolve(&api(), "lemmy.ml", "good")).expect("resolved");
        assert_eq!(resolved.user.username(), "alice");
        assert_eq!(resolved.user.unreads, 0);
        assert_eq!(resolved.user.reports, 0);
        assert_eq!(resolved.user.registration_applications, 0);
        assert_eq!(resolved.site.instance, "lemmy.ml");
        assert!(resolved.site.site.my_user.is_none());
    }

    #[test]
    fn missing_user_is_an_invalid_token() {
        assert_eq!(
            block_on(resolve(&api(), "lemmy.ml", "stale")),
            Err(ResolveError::InvalidToken)
        );
    }

    #[test]
    fn refused_token_is_an_invalid_token() {
        let api = api().with_rejected_token("lemmy.ml", "revoked");
        assert_eq!(
            block_on(resolve(&api, "lemmy.ml", "revoked")),
            Err(ResolveError::InvalidToken)
        );
    }

    #[test]
    fn transport_failures_are_unreachable() {
        let api = api();
        api.set_unreachable("lemmy.ml", true);
        assert!(matches!(
            block_on(resolve(&api, "lemmy.ml", "good")),
            Err(ResolveError::Unreachable(_))
        ));
        assert!(matches!(
            block_on(resolve(&api, "unknown.example", "good")),
            Err(ResolveError::Unreachable(_))
        ));
    }

    #[test]
    fn token_is_sent_as_bearer_credential() {
        let api = api();
        let _ = block_on(resolve(&api, "lemmy.ml", "good"));
        assert_eq!(
            api.calls()[0].target(),
            &ApiTarget::authenticated("lemmy.ml", "good")
        );
    }
}
