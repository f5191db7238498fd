//! `/comment/{id}` links without an instance segment redirect to the browsing instance.

use super::LoadContext;

/// Status used for the comment redirect.
pub const COMMENT_REDIRECT_STATUS: u16 = 300;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub status: u16,
    pub location: String,
}

/// Builds the redirect to `/comment/{instance}/{comment_id}`, using the active session's instance
/// or the deployment default.
pub fn comment_redirect(ctx: &LoadContext, comment_id: &str) -> Redirect {
    let instance = if ctx.instance.is_empty() {
        ctx.default_instance.as_str()
    } else {
        ctx.instance.as_str()
    };
    Redirect {
        status: COMMENT_REDIRECT_STATUS,
        location: format!("/comment/{instance}/{comment_id}"),
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use platform_host::NoopLemmyApi;
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::settings::UserSettings;

    fn context(instance: &str) -> LoadContext {
        LoadContext {
            api: Rc::new(NoopLemmyApi),
            instance: instance.to_string(),
            jwt: None,
            username: None,
            settings: UserSettings::default(),
            default_instance: "lemmy.world".to_string(),
            session: None,
        }
    }

    #[test]
    fn redirects_to_the_browsing_instance() {
        assert_eq!(
            comment_redirect(&context("beehaw.org"), "123456"),
            Redirect {
                status: 300,
                location: "/comment/beehaw.org/123456".to_string(),
            }
        );
        assert_eq!(
            comment_redirect(&context(""), "9").location,
            "/comment/lemmy.world/9"
        );
    }
}
