//! Legal page: the instance's site record, which carries its legal text.

use platform_host::api::types::GetSiteResponse;

use super::{remote_failure, LoadContext, LoadError};
use crate::model::SiteSnapshot;

#[derive(Debug, Clone, PartialEq)]
pub struct LegalPage {
    pub site: GetSiteResponse,
}

/// # Errors
///
/// Returns a 500 [`LoadError`] when the site cannot be fetched.
pub async fn load_legal(ctx: &LoadContext) -> Result<LegalPage, LoadError> {
    let response = ctx
        .api
        .get_site(&ctx.guest_target())
        .await
        .map_err(|err| remote_failure("legal", "Failed to fetch legal page.", &err))?;
    let (snapshot, _) = SiteSnapshot::from_response(&ctx.instance, response);
    Ok(LegalPage {
        site: snapshot.site,
    })
}
