//! Authority URL helpers.

/// Microsoft identity platform login host.
pub const DEFAULT_LOGIN_HOST: &str = "https://login.microsoftonline.com";

/// Authority segment used when no tenant has been chosen yet.
pub const COMMON_TENANT: &str = "common";

/// Build the authority URL for `tenant` on `login_host`.
///
/// An empty tenant falls back to [`COMMON_TENANT`].
pub fn authority_url(login_host: &str, tenant: &str) -> String {
    let tenant = if tenant.is_empty() { COMMON_TENANT } else { tenant };
    format!("{}/{}", login_host.trim_end_matches('/'), tenant)
}

/// Extract the tenant segment from an authority URL or bare tenant id.
pub fn tenant_segment(authority: &str) -> &str {
    authority
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|s| !s.is_empty())
        .unwrap_or(COMMON_TENANT)
}
