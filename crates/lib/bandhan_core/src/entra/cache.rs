//! Session-scoped token cache.
//!
//! Access tokens are keyed by tenant and scope set; refresh tokens by tenant.
//! Lives only as long as the process.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;

/// Tokens expiring sooner than this are treated as expired.
const EXPIRY_SKEW_SECS: i64 = 300;

#[derive(Clone)]
pub struct CachedToken {
    pub access_token: String,
    pub expires_at: DateTime<Utc>,
}

impl CachedToken {
    pub fn is_fresh(&self) -> bool {
        Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) < self.expires_at
    }
}

impl std::fmt::Debug for CachedToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CachedToken")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[derive(Default)]
pub struct TokenCache {
    access: DashMap<String, CachedToken>,
    refresh: DashMap<String, String>,
}

impl TokenCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn access_key(tenant: &str, scopes: &[String]) -> String {
        let mut scopes: Vec<String> = scopes.iter().map(|s| s.to_ascii_lowercase()).collect();
        scopes.sort();
        scopes.dedup();
        format!("{}:{}", tenant.to_ascii_lowercase(), scopes.join(" "))
    }

    /// A cached access token that is not about to expire.
    pub fn access_token(&self, tenant: &str, scopes: &[String]) -> Option<CachedToken> {
        self.access
            .get(&Self::access_key(tenant, scopes))
            .filter(|entry| entry.is_fresh())
            .map(|entry| entry.clone())
    }

    pub fn store_access_token(&self, tenant: &str, scopes: &[String], token: CachedToken) {
        self.access.insert(Self::access_key(tenant, scopes), token);
    }

    pub fn refresh_token(&self, tenant: &str) -> Option<String> {
        self.refresh
            .get(&tenant.to_ascii_lowercase())
            .map(|entry| entry.clone())
    }

    pub fn store_refresh_token(&self, tenant: &str, refresh_token: impl Into<String>) {
        self.refresh
            .insert(tenant.to_ascii_lowercase(), refresh_token.into());
    }

    pub fn forget_refresh_token(&self, tenant: &str) {
        self.refresh.remove(&tenant.to_ascii_lowercase());
    }

    pub fn clear(&self) {
        self.access.clear();
        self.refresh.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.access.is_empty() && self.refresh.is_empty()
    }
}
