// @awa-component: AZ-ManagementClient
//
//! Azure Resource Manager directory listing.
//!
//! Lists the tenants visible to the signed-in account and the subscriptions
//! of the tenant a token was issued for.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::{ApiError, read_json};

/// Resource Manager API version for tenant and subscription listing.
pub const MANAGEMENT_API_VERSION: &str = "2020-01-01";

/// Default Resource Manager endpoint.
pub const DEFAULT_MANAGEMENT_URL: &str = "https://management.azure.com";

/// A tenant the user can pick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TenantOption {
    pub tenant_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// A subscription inside the selected tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionOption {
    pub subscription_id: String,
    #[serde(default)]
    pub display_name: String,
}

/// Resource Manager list envelope.
#[derive(Debug, Deserialize)]
struct ListResponse<T> {
    #[serde(default = "Vec::new")]
    value: Vec<T>,
}

/// Directory operations needed by the selector.
#[async_trait]
pub trait DirectoryApi: Send + Sync {
    async fn list_tenants(&self, access_token: &str) -> Result<Vec<TenantOption>, ApiError>;

    /// Subscriptions of the tenant `access_token` was issued for.
    async fn list_subscriptions(
        &self,
        access_token: &str,
    ) -> Result<Vec<SubscriptionOption>, ApiError>;
}

/// Resource Manager client.
#[derive(Debug, Clone)]
pub struct ManagementClient {
    http: Client,
    base_url: String,
}

impl ManagementClient {
    pub fn new(http: Client, base_url: impl Into<String>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    async fn list<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        access_token: &str,
    ) -> Result<Vec<T>, ApiError> {
        let url = format!("{}/{path}", self.base_url);
        debug!(%url, "listing");
        let resp = self
            .http
            .get(&url)
            .query(&[("api-version", MANAGEMENT_API_VERSION)])
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| ApiError::Transport(format!("GET {path} failed: {e}")))?;

        let body: ListResponse<T> = read_json(resp).await?;
        Ok(body.value)
    }
}

#[async_trait]
impl DirectoryApi for ManagementClient {
    async fn list_tenants(&self, access_token: &str) -> Result<Vec<TenantOption>, ApiError> {
        self.list("tenants", access_token).await
    }

    async fn list_subscriptions(
        &self,
        access_token: &str,
    ) -> Result<Vec<SubscriptionOption>, ApiError> {
        self.list("subscriptions", access_token).await
    }
}
